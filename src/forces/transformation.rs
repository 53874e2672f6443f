//! Volatility regime shift: relative gap between short and long realized vol.

use crate::config::Config;
use crate::indicators::{compress, ewma};
use crate::table::FeatureTable;

pub const TRANS_CLIP: f64 = 10.0;

/// Writes `trans_raw` and `trans_sm`. Reads `sigma_short`, `sigma_long`.
pub fn apply(cfg: &Config, table: &mut FeatureTable) {
    // sigma_long is already floored at epsilon
    table.trans_raw = table
        .sigma_short
        .iter()
        .zip(&table.sigma_long)
        .map(|(s, l)| (s - l) / l)
        .collect();
    let compressed: Vec<f64> = table.trans_raw.iter().map(|x| compress(x.abs(), TRANS_CLIP)).collect();
    table.trans_sm = ewma(&compressed, cfg.trans_span);
}
