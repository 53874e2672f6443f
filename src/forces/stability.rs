//! Systemic stress, core stability and the resolution-adjusted score.
//!
//! ```text
//! D       = 1 + alpha_eff r^2 + beta_eff v^2 + eta trans + gamma_ent ent
//! sigma_C = clip((1/D)^(1 + mu trans), 1e-12, 1)
//! sigma_R = clip((1 / (1/(sigma_C + eps) + gamma res))^(1 + rho res), 1e-12, 1)
//! ```
//!
//! The final clip always runs, so both scores stay in (0, 1]. A non-positive
//! or non-finite D has no real power; such rows are counted, logged and
//! pinned to the floor instead of being passed through.

use crate::config::Config;
use crate::logging::{log, obj, v_num, Domain, Level};
use crate::table::FeatureTable;
use serde_json::json;

pub const SIGMA_FLOOR: f64 = 1e-12;
pub const SIGMA_CEIL: f64 = 1.0;

/// Tolerance above 1 before a raw score counts as clipped.
const CEIL_SLACK: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipCounts {
    pub stress_nonpositive: usize,
    pub sigma_c_clipped: usize,
    pub sigma_r_clipped: usize,
}

fn out_of_range(raw: f64) -> bool {
    !raw.is_finite() || raw < SIGMA_FLOOR || raw > SIGMA_CEIL + CEIL_SLACK
}

/// Clip into [1e-12, 1]; NaN maps to the floor.
pub fn clip_score(raw: f64) -> f64 {
    if raw.is_nan() {
        SIGMA_FLOOR
    } else {
        raw.clamp(SIGMA_FLOOR, SIGMA_CEIL)
    }
}

pub fn core_stability(stress: f64, trans_sm: f64, mu: f64) -> Option<f64> {
    if !stress.is_finite() || stress <= 0.0 {
        return None;
    }
    Some((1.0 / stress).powf(1.0 + mu * trans_sm))
}

pub fn resolution_adjusted(sigma_c: f64, res_sm: f64, cfg: &Config) -> f64 {
    let inv = 1.0 / (sigma_c + cfg.epsilon) + cfg.gamma * res_sm;
    (1.0 / inv).powf(1.0 + cfg.rho * res_sm)
}

/// Writes `D`, `sigma_C`, `sigma_R`. Reads every earlier column.
pub fn apply(cfg: &Config, table: &mut FeatureTable) -> ClipCounts {
    let n = table.len();
    let mut counts = ClipCounts::default();
    let mut first_bad: Option<usize> = None;
    let mut stress = Vec::with_capacity(n);
    let mut sigma_c = Vec::with_capacity(n);
    let mut sigma_r = Vec::with_capacity(n);

    for t in 0..n {
        let r = table.returns[t];
        let v = table.vol_imbalance[t];
        let trans = table.trans_sm[t];
        let d = 1.0
            + table.alpha_eff[t] * r * r
            + table.beta_eff[t] * v * v
            + cfg.eta * trans
            + cfg.gamma_ent * table.ent_sm[t];

        let sc = match core_stability(d, trans, cfg.mu) {
            Some(raw) => {
                if out_of_range(raw) {
                    counts.sigma_c_clipped += 1;
                }
                clip_score(raw)
            }
            None => {
                counts.stress_nonpositive += 1;
                first_bad.get_or_insert(t);
                SIGMA_FLOOR
            }
        };

        let raw_r = resolution_adjusted(sc, table.res_sm[t], cfg);
        if out_of_range(raw_r) {
            counts.sigma_r_clipped += 1;
        }

        stress.push(d);
        sigma_c.push(sc);
        sigma_r.push(clip_score(raw_r));
    }

    if let Some(t) = first_bad {
        log(
            Level::Warn,
            Domain::Stability,
            "stress_nonpositive",
            obj(&[
                ("rows", json!(counts.stress_nonpositive)),
                ("first_index", json!(t)),
                ("first_ts", json!(table.ts[t])),
                ("first_stress", v_num(stress[t])),
                ("kappa", v_num(cfg.kappa)),
                ("lambda", v_num(cfg.lambda)),
            ]),
        );
    }
    if counts.sigma_c_clipped + counts.sigma_r_clipped > 0 {
        log(
            Level::Debug,
            Domain::Stability,
            "scores_clipped",
            obj(&[
                ("sigma_c", json!(counts.sigma_c_clipped)),
                ("sigma_r", json!(counts.sigma_r_clipped)),
            ]),
        );
    }

    table.stress = stress;
    table.sigma_c = sigma_c;
    table.sigma_r = sigma_r;
    counts
}
