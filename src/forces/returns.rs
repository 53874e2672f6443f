//! Log returns and realized volatility.

use crate::config::Config;
use crate::indicators::rolling_std;
use crate::table::FeatureTable;

/// `ln(P[t] / P[t-1])` with `returns[0] = 0`.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(prices.len());
    if prices.is_empty() {
        return out;
    }
    out.push(0.0);
    out.extend(prices.windows(2).map(|w| (w[1] / w[0]).ln()));
    out
}

/// Writes `returns`, `sigma_short` and `sigma_long` (floored at epsilon).
pub fn apply(prices: &[f64], cfg: &Config, table: &mut FeatureTable) {
    let returns = log_returns(prices);
    table.sigma_short = rolling_std(&returns, cfg.short_vol_window);
    table.sigma_long = rolling_std(&returns, cfg.long_vol_window)
        .into_iter()
        .map(|s| s.max(cfg.epsilon))
        .collect();
    table.returns = returns;
}
