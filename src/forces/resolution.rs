//! Tail risk: expected shortfall over the trailing long-vol window,
//! normalized by long-run volatility.
//!
//! Same windowing as the Hurst stage: row `t` uses the `long_vol_window`
//! returns ending at `t`, and rows with `t < long_vol_window` emit 0.

use crate::config::Config;
use crate::indicators::{compress, ewma, quantile_sorted};
use crate::parallel::map_indices;
use crate::table::FeatureTable;

pub const RES_CLIP: f64 = 10.0;

/// `|mean(returns <= VaR_q)|`, `None` when the tail is empty.
pub fn expected_shortfall(window: &[f64], quantile: f64) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let mut sorted = window.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let var = quantile_sorted(&sorted, quantile);
    let tail: Vec<f64> = sorted.into_iter().take_while(|&r| r <= var).collect();
    if tail.is_empty() {
        return None;
    }
    let es = (tail.iter().sum::<f64>() / tail.len() as f64).abs();
    es.is_finite().then_some(es)
}

/// Writes `es`, `res_raw` and `res_sm`. Reads `returns`, `sigma_long`.
pub fn apply(cfg: &Config, table: &mut FeatureTable) -> usize {
    let window = cfg.long_vol_window;
    let returns = &table.returns;
    let es: Vec<Option<f64>> = map_indices(returns.len(), |t| {
        if t < window {
            None
        } else {
            expected_shortfall(&returns[t + 1 - window..=t], cfg.es_quantile)
        }
    });
    let degenerate = es.iter().filter(|e| e.is_none()).count();
    table.es = es.into_iter().map(|e| e.unwrap_or(0.0)).collect();
    table.res_raw = table
        .es
        .iter()
        .zip(&table.sigma_long)
        .map(|(es, sl)| es / (sl + cfg.epsilon))
        .collect();
    let compressed: Vec<f64> = table.res_raw.iter().map(|&x| compress(x, RES_CLIP)).collect();
    table.res_sm = ewma(&compressed, cfg.res_span);
    degenerate
}
