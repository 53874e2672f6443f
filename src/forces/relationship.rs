//! Volume imbalance against its rolling mean.

use crate::config::Config;
use crate::indicators::rolling_mean;
use crate::table::FeatureTable;

pub const VOLUME_WINDOW: usize = 20;
pub const IMBALANCE_CLIP: f64 = 5.0;

/// Writes `vol_imbalance`; identically 0 without a volume series.
/// Returns the number of rows whose rolling mean was undefined.
pub fn apply(volumes: Option<&[f64]>, cfg: &Config, table: &mut FeatureTable) -> usize {
    let n = table.len();
    let Some(volumes) = volumes else {
        table.vol_imbalance = vec![0.0; n];
        return 0;
    };
    let means = rolling_mean(volumes, VOLUME_WINDOW);
    let undefined = means.iter().filter(|m| m.is_none()).count();
    table.vol_imbalance = volumes
        .iter()
        .zip(means)
        .map(|(v, m)| match m {
            Some(m) => ((v - m) / (m + cfg.epsilon)).clamp(-IMBALANCE_CLIP, IMBALANCE_CLIP),
            None => 0.0,
        })
        .collect();
    undefined
}
