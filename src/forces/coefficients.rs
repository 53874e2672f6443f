//! Effective shock coefficients modulated by persistence and order.
//!
//! Not clipped: values above 1 amplify the squared shocks in systemic stress,
//! values below 1 damp them.

use crate::config::Config;
use crate::table::FeatureTable;

/// Writes `alpha_eff` and `beta_eff`. Reads `hurst`, `ent_sm`.
pub fn apply(cfg: &Config, table: &mut FeatureTable) {
    let modulation: Vec<f64> = table
        .hurst
        .iter()
        .zip(&table.ent_sm)
        .map(|(h, e)| (h - 0.5) * (1.0 - cfg.z * e))
        .collect();
    table.alpha_eff = modulation.iter().map(|m| 1.0 + cfg.kappa * m).collect();
    table.beta_eff = modulation.iter().map(|m| 1.0 + cfg.lambda * m).collect();
}
