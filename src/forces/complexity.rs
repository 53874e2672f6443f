//! Hurst exponent by rescaled-range analysis.
//!
//! Each row looks at the trailing `hurst_window` returns ending at that row.
//! Rows with `t < hurst_window` and degenerate windows (zero range or zero
//! deviation) emit the neutral 0.5.

use crate::config::Config;
use crate::indicators::{ewma, mean, sample_std};
use crate::parallel::map_indices;
use crate::table::FeatureTable;

pub const NEUTRAL_HURST: f64 = 0.5;
pub const HURST_MIN: f64 = 0.01;
pub const HURST_MAX: f64 = 0.99;

/// R/S estimate `ln(R/S) / ln(n/2)` for one window, `None` if degenerate.
pub fn rescaled_range_hurst(window: &[f64]) -> Option<f64> {
    let n = window.len();
    let scale = (n as f64 / 2.0).ln();
    if n < 2 || scale <= 0.0 {
        return None;
    }
    let m = mean(window);
    let mut cum = 0.0;
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for x in window {
        cum += x - m;
        lo = lo.min(cum);
        hi = hi.max(cum);
    }
    let range = hi - lo;
    let dev = sample_std(window);
    if range <= 0.0 || dev <= 0.0 {
        return None;
    }
    let h = (range / dev).ln() / scale;
    if h.is_finite() {
        Some(h.clamp(HURST_MIN, HURST_MAX))
    } else {
        None
    }
}

/// Writes `hurst_raw` and smoothed, clipped `hurst`.
pub fn apply(cfg: &Config, table: &mut FeatureTable) -> usize {
    let window = cfg.hurst_window;
    let returns = &table.returns;
    let raw: Vec<Option<f64>> = map_indices(returns.len(), |t| {
        if t < window {
            None
        } else {
            rescaled_range_hurst(&returns[t + 1 - window..=t])
        }
    });
    let degenerate = raw.iter().filter(|h| h.is_none()).count();
    let raw: Vec<f64> = raw.into_iter().map(|h| h.unwrap_or(NEUTRAL_HURST)).collect();
    table.hurst = ewma(&raw, cfg.hurst_span)
        .into_iter()
        .map(|h| h.clamp(HURST_MIN, HURST_MAX))
        .collect();
    table.hurst_raw = raw;
    degenerate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{configure, Params};

    #[test]
    fn test_constant_window_is_degenerate() {
        assert_eq!(rescaled_range_hurst(&[0.0; 60]), None);
        assert_eq!(rescaled_range_hurst(&[0.01; 60]), None);
    }

    #[test]
    fn test_window_of_two_is_degenerate() {
        // ln(2/2) = 0
        assert_eq!(rescaled_range_hurst(&[0.1, -0.1]), None);
    }

    #[test]
    fn test_trending_window_is_persistent() {
        // Monotone drift in the increments: cumulative deviation spans a wide range
        let xs: Vec<f64> = (0..60).map(|i| i as f64 * 0.001).collect();
        let h = rescaled_range_hurst(&xs).unwrap();
        assert!(h > 0.5, "h = {}", h);
    }

    #[test]
    fn test_alternating_window_is_anti_persistent() {
        let xs: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect();
        let h = rescaled_range_hurst(&xs).unwrap();
        assert!(h < 0.5, "h = {}", h);
        assert!(h >= HURST_MIN);
    }

    #[test]
    fn test_neutral_before_window_fills() {
        let cfg = configure(Params { hurst_window: 8, ..Params::default() }).unwrap();
        let mut table = FeatureTable::keyed(&(0..12).collect::<Vec<i64>>());
        table.returns = (0..12).map(|i| ((i * 7 % 5) as f64 - 2.0) * 0.01).collect();
        apply(&cfg, &mut table);
        assert!(table.hurst_raw[..8].iter().all(|&h| h == NEUTRAL_HURST));
        assert!(table.hurst.iter().all(|&h| (HURST_MIN..=HURST_MAX).contains(&h)));
    }
}
