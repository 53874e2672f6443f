use serde::{Deserialize, Serialize};

use crate::errors::{SigmaError, SigmaResult};

/// Price series with optional index-aligned volume, owned by the caller.
///
/// Timestamps are epoch seconds and must be strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSeries {
    pub timestamps: Vec<i64>,
    pub prices: Vec<f64>,
    pub volumes: Option<Vec<f64>>,
}

impl InputSeries {
    pub fn new(timestamps: Vec<i64>, prices: Vec<f64>, volumes: Option<Vec<f64>>) -> Self {
        Self { timestamps, prices, volumes }
    }

    /// Prices indexed 0..n with no volume.
    pub fn from_prices(prices: &[f64]) -> Self {
        Self {
            timestamps: (0..prices.len() as i64).collect(),
            prices: prices.to_vec(),
            volumes: None,
        }
    }

    pub fn with_volumes(mut self, volumes: &[f64]) -> Self {
        self.volumes = Some(volumes.to_vec());
        self
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn validate(&self) -> SigmaResult<()> {
        if self.prices.is_empty() {
            return Err(SigmaError::input("prices is empty"));
        }
        if self.timestamps.len() != self.prices.len() {
            return Err(SigmaError::input(format!(
                "timestamps length {} does not match prices length {}",
                self.timestamps.len(),
                self.prices.len()
            )));
        }
        if let Some((i, p)) = self
            .prices
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(SigmaError::input(format!("price at index {i} must be finite and > 0, got {p}")));
        }
        if let Some(i) = self.timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SigmaError::input(format!(
                "timestamps not strictly increasing at index {}",
                i + 1
            )));
        }
        if let Some(volumes) = &self.volumes {
            if volumes.len() != self.prices.len() {
                return Err(SigmaError::input(format!(
                    "volumes length {} does not match prices length {}",
                    volumes.len(),
                    self.prices.len()
                )));
            }
            if let Some((i, v)) = volumes
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(SigmaError::input(format!("volume at index {i} must be finite and >= 0, got {v}")));
            }
        }
        Ok(())
    }
}
