//! Estimator weights, spans and windows.
//!
//! [`Params`] is the raw, freely editable parameter record. [`configure`]
//! validates it once and wraps it in an immutable [`Config`] that every stage
//! reads but none can mutate.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ops::Deref;

use crate::errors::{SigmaError, SigmaResult};
use crate::logging::{log, obj, v_num, v_str, Domain, Level};

/// Largest |hurst - 0.5| the clipped Hurst column can produce.
const MAX_HURST_DEVIATION: f64 = 0.49;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Complexity modulation of return shock (alpha_eff)
    pub kappa: f64,
    /// Complexity modulation of volume imbalance (beta_eff)
    pub lambda: f64,
    /// Entropy damping coefficient
    pub z: f64,
    /// Additive weight of transformation in systemic stress
    pub eta: f64,
    /// Exponent weight of transformation in core stability
    pub mu: f64,
    /// Additive weight of entropy in systemic stress
    pub gamma_ent: f64,
    /// Additive weight of resolution in the final adjustment
    pub gamma: f64,
    /// Exponent weight of resolution in the final adjustment
    pub rho: f64,
    pub trans_span: usize,
    pub res_span: usize,
    pub ent_span: usize,
    pub hurst_span: usize,
    pub hurst_window: usize,
    pub short_vol_window: usize,
    pub long_vol_window: usize,
    /// Tail quantile for expected shortfall (0.05 = 95% VaR)
    pub es_quantile: f64,
    /// Numerical floor for divisions
    pub epsilon: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            kappa: 1.0,
            lambda: 1.0,
            z: 0.8,
            eta: 1.0,
            mu: 0.5,
            gamma_ent: 1.0,
            gamma: 0.5,
            rho: 1.0,
            trans_span: 5,
            res_span: 10,
            ent_span: 20,
            hurst_span: 40,
            hurst_window: 60,
            short_vol_window: 10,
            long_vol_window: 60,
            es_quantile: 0.05,
            epsilon: 1e-8,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Params {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            kappa: env_or("SIGMA_KAPPA", d.kappa),
            lambda: env_or("SIGMA_LAMBDA", d.lambda),
            z: env_or("SIGMA_Z", d.z),
            eta: env_or("SIGMA_ETA", d.eta),
            mu: env_or("SIGMA_MU", d.mu),
            gamma_ent: env_or("SIGMA_GAMMA_ENT", d.gamma_ent),
            gamma: env_or("SIGMA_GAMMA", d.gamma),
            rho: env_or("SIGMA_RHO", d.rho),
            trans_span: env_or("SIGMA_TRANS_SPAN", d.trans_span),
            res_span: env_or("SIGMA_RES_SPAN", d.res_span),
            ent_span: env_or("SIGMA_ENT_SPAN", d.ent_span),
            hurst_span: env_or("SIGMA_HURST_SPAN", d.hurst_span),
            hurst_window: env_or("SIGMA_HURST_WINDOW", d.hurst_window),
            short_vol_window: env_or("SIGMA_SHORT_VOL_WINDOW", d.short_vol_window),
            long_vol_window: env_or("SIGMA_LONG_VOL_WINDOW", d.long_vol_window),
            es_quantile: env_or("SIGMA_ES_QUANTILE", d.es_quantile),
            epsilon: env_or("SIGMA_EPSILON", d.epsilon),
        }
    }

    fn weights(&self) -> [(&'static str, f64); 8] {
        [
            ("kappa", self.kappa),
            ("lambda", self.lambda),
            ("z", self.z),
            ("eta", self.eta),
            ("mu", self.mu),
            ("gamma_ent", self.gamma_ent),
            ("gamma", self.gamma),
            ("rho", self.rho),
        ]
    }

    fn lengths(&self) -> [(&'static str, usize); 7] {
        [
            ("trans_span", self.trans_span),
            ("res_span", self.res_span),
            ("ent_span", self.ent_span),
            ("hurst_span", self.hurst_span),
            ("hurst_window", self.hurst_window),
            ("short_vol_window", self.short_vol_window),
            ("long_vol_window", self.long_vol_window),
        ]
    }

    fn validate(&self) -> SigmaResult<()> {
        for (name, value) in self.weights() {
            if !value.is_finite() || value < 0.0 {
                return Err(SigmaError::config(name, format!("must be finite and >= 0, got {value}")));
            }
        }
        for (name, value) in self.lengths() {
            if value == 0 {
                return Err(SigmaError::config(name, "must be a positive integer, got 0"));
            }
        }
        if !(self.es_quantile > 0.0 && self.es_quantile < 1.0) {
            return Err(SigmaError::config(
                "es_quantile",
                format!("must lie in (0, 1), got {}", self.es_quantile),
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(SigmaError::config(
                "epsilon",
                format!("must be finite and > 0, got {}", self.epsilon),
            ));
        }
        Ok(())
    }
}

/// Validated, immutable parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct Config(Params);

impl Deref for Config {
    type Target = Params;

    fn deref(&self) -> &Params {
        &self.0
    }
}

impl Default for Config {
    fn default() -> Self {
        Config(Params::default())
    }
}

impl Config {
    /// True when the weights allow `alpha_eff` or `beta_eff` to go negative,
    /// which lets systemic stress drop below 1 on large shocks.
    pub fn admits_negative_coefficients(&self) -> bool {
        let damped = 1.0_f64.max((1.0 - self.z).abs());
        let reach = MAX_HURST_DEVIATION * damped;
        self.kappa * reach > 1.0 || self.lambda * reach > 1.0
    }

    /// Stable sha256 hex over the canonical JSON form of the parameters.
    pub fn params_hash(&self) -> String {
        let canonical = serde_json::to_string(&self.0).unwrap_or_default();
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }
}

/// Validate a parameter set and freeze it.
pub fn configure(params: Params) -> SigmaResult<Config> {
    if let Err(err) = params.validate() {
        log(
            Level::Error,
            Domain::Config,
            "config_rejected",
            obj(&[("msg", v_str(&err.to_string()))]),
        );
        return Err(err);
    }
    let cfg = Config(params);
    if cfg.admits_negative_coefficients() {
        log(
            Level::Warn,
            Domain::Config,
            "negative_coefficients_possible",
            obj(&[
                ("kappa", v_num(cfg.kappa)),
                ("lambda", v_num(cfg.lambda)),
                ("z", v_num(cfg.z)),
            ]),
        );
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let cfg = configure(Params::default()).unwrap();
        assert_eq!(cfg.hurst_window, 60);
        assert_eq!(cfg.long_vol_window, 60);
        assert_eq!(cfg.es_quantile, 0.05);
        assert!(!cfg.admits_negative_coefficients());
    }

    #[test]
    fn test_rejects_negative_weight() {
        let params = Params { gamma_ent: -0.1, ..Params::default() };
        match configure(params) {
            Err(SigmaError::InvalidConfiguration { param, .. }) => assert_eq!(param, "gamma_ent"),
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_nan_weight() {
        let params = Params { mu: f64::NAN, ..Params::default() };
        assert!(configure(params).is_err());
    }

    #[test]
    fn test_rejects_quantile_bounds() {
        for q in [0.0, 1.0, -0.2, 1.5] {
            let params = Params { es_quantile: q, ..Params::default() };
            match configure(params) {
                Err(SigmaError::InvalidConfiguration { param, .. }) => assert_eq!(param, "es_quantile"),
                other => panic!("q={} expected rejection, got {:?}", q, other),
            }
        }
    }

    #[test]
    fn test_rejects_zero_window() {
        let params = Params { hurst_window: 0, ..Params::default() };
        match configure(params) {
            Err(SigmaError::InvalidConfiguration { param, .. }) => assert_eq!(param, "hurst_window"),
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_nonpositive_epsilon() {
        let params = Params { epsilon: 0.0, ..Params::default() };
        assert!(configure(params).is_err());
    }

    #[test]
    fn test_large_kappa_flags_negative_coefficients() {
        let cfg = configure(Params { kappa: 5.0, ..Params::default() }).unwrap();
        assert!(cfg.admits_negative_coefficients());
    }

    #[test]
    fn test_env_override_falls_back_when_unparsable() {
        let key = "SIGMA_TEST_ENV_OR_FALLBACK";
        std::env::set_var(key, "not-a-number");
        assert_eq!(env_or(key, 0.8_f64), 0.8);
        assert_eq!(env_or(key, 60_usize), 60);
        std::env::set_var(key, "1.25");
        assert_eq!(env_or(key, 0.8_f64), 1.25);
        // a float is not a valid window length
        assert_eq!(env_or(key, 60_usize), 60);
        std::env::remove_var(key);
        assert_eq!(env_or(key, 0.8_f64), 0.8);
    }

    #[test]
    fn test_params_hash_tracks_values() {
        let a = configure(Params::default()).unwrap();
        let b = configure(Params::default()).unwrap();
        let c = configure(Params { rho: 2.0, ..Params::default() }).unwrap();
        assert_eq!(a.params_hash(), b.params_hash());
        assert_ne!(a.params_hash(), c.params_hash());
        assert_eq!(a.params_hash().len(), 64);
    }
}
