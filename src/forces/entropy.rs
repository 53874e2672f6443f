//! Disorder measured as one minus the absolute lag-1 autocorrelation.

use crate::config::Config;
use crate::indicators::{ewma, lag1_autocorr};
use crate::parallel::map_indices;
use crate::table::FeatureTable;

/// Autocorrelation window, fixed independently of the configuration.
pub const AUTOCORR_WINDOW: usize = 20;

/// Rolling lag-1 autocorrelation; 0 where the window is short or flat.
pub fn rolling_rho1(returns: &[f64]) -> Vec<Option<f64>> {
    map_indices(returns.len(), |t| {
        if t + 1 < AUTOCORR_WINDOW {
            None
        } else {
            lag1_autocorr(&returns[t + 1 - AUTOCORR_WINDOW..=t])
        }
    })
}

/// Writes `ent_raw` and `ent_sm` (clipped to [0, 1]).
pub fn apply(cfg: &Config, table: &mut FeatureTable) -> usize {
    let rho1 = rolling_rho1(&table.returns);
    let degenerate = rho1.iter().filter(|r| r.is_none()).count();
    table.ent_raw = rho1.into_iter().map(|r| 1.0 - r.unwrap_or(0.0).abs()).collect();
    table.ent_sm = ewma(&table.ent_raw, cfg.ent_span)
        .into_iter()
        .map(|e| e.clamp(0.0, 1.0))
        .collect();
    degenerate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_short_history_is_max_disorder() {
        let cfg = Config::default();
        let mut table = FeatureTable::keyed(&(0..10).collect::<Vec<i64>>());
        table.returns = (0..10).map(|i| i as f64 * 0.01).collect();
        let degenerate = apply(&cfg, &mut table);
        assert_eq!(degenerate, 10);
        assert!(table.ent_raw.iter().all(|&e| e == 1.0));
    }

    #[test]
    fn test_alternating_returns_are_ordered() {
        let cfg = Config::default();
        let n = 60;
        let mut table = FeatureTable::keyed(&(0..n as i64).collect::<Vec<i64>>());
        table.returns = (0..n).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect();
        apply(&cfg, &mut table);
        assert!(table.ent_raw[n - 1].abs() < 1e-9);
        assert!(table.ent_sm[n - 1] < table.ent_sm[AUTOCORR_WINDOW - 1]);
        assert!(table.ent_sm.iter().all(|&e| (0.0..=1.0).contains(&e)));
    }
}
