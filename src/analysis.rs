//! Summary statistics over a computed feature table.

use serde::{Deserialize, Serialize};

use crate::indicators::{mean, sample_std};
use crate::table::{Column, FeatureTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnStats {
    pub fn of(xs: &[f64]) -> Option<Self> {
        if xs.is_empty() {
            return None;
        }
        Some(Self {
            mean: mean(xs),
            std: sample_std(xs),
            min: xs.iter().copied().fold(f64::INFINITY, f64::min),
            max: xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilitySummary {
    pub rows: usize,
    pub sigma_c: ColumnStats,
    pub sigma_r: ColumnStats,
}

pub fn summarize(table: &FeatureTable) -> Option<StabilitySummary> {
    Some(StabilitySummary {
        rows: table.len(),
        sigma_c: ColumnStats::of(table.column(Column::SigmaC))?,
        sigma_r: ColumnStats::of(table.column(Column::SigmaR))?,
    })
}

/// Stability over a closed timestamp window, e.g. a crisis period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub start_ts: i64,
    pub end_ts: i64,
    pub rows: usize,
    pub min_sigma_r: f64,
    pub min_sigma_r_ts: i64,
    pub mean_sigma_r: f64,
}

pub fn episode(table: &FeatureTable, start_ts: i64, end_ts: i64) -> Option<EpisodeStats> {
    let ts = table.timestamps();
    let lo = ts.partition_point(|&t| t < start_ts);
    let hi = ts.partition_point(|&t| t <= end_ts);
    if lo >= hi {
        return None;
    }
    let window = &table.column(Column::SigmaR)[lo..hi];
    let (offset, min) = window
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, v)| if v < best.1 { (i, v) } else { best });
    Some(EpisodeStats {
        start_ts,
        end_ts,
        rows: hi - lo,
        min_sigma_r: min,
        min_sigma_r_ts: ts[lo + offset],
        mean_sigma_r: mean(window),
    })
}
