//! Last-row projection into named feature groups for visual-mapping
//! consumers. Field names follow the consumer's camelCase schema.

use serde::{Deserialize, Serialize};

use crate::errors::{SigmaError, SigmaResult};
use crate::table::{FeatureRow, FeatureTable};

/// Display scale for return/volatility magnitudes.
const DISPLAY_SCALE: f64 = 1000.0;

fn unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn signed_unit(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// returns x 1000, unclipped
    pub fundamental_freq: f64,
    /// |returns| in [0, 1]
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// 1 - vol_imbalance in [0, 1]
    pub consonance: f64,
    /// hurst in [0, 1]
    pub complexity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complexity {
    /// hurst in [0, 1]
    pub brightness: f64,
    /// sigma_long x 1000, unclipped
    pub centroid: f64,
    /// sigma_short x 1000, unclipped
    pub bandwidth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    /// trans_sm in [0, 1]
    pub flux: f64,
    /// trans_raw in [-1, 1]
    pub velocity: f64,
    /// change in velocity over the last step, in [-1, 1]
    pub acceleration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// 1 - ent_sm in [0, 1]
    pub coherence: f64,
    /// sigma_C in [0, 1]
    pub stability: f64,
    /// sigma_R in [0, 1]
    pub synchrony: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Potential {
    /// ent_sm in [0, 1]
    pub entropy: f64,
    /// res_sm in [0, 1]
    pub unpredictability: f64,
    /// 1 - sigma_R in [0, 1]
    pub freedom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    #[serde(rename = "sigma_C")]
    pub sigma_c: f64,
    #[serde(rename = "sigma_R")]
    pub sigma_r: f64,
    /// res_sm, unclipped
    pub res_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub ts: i64,
    pub identity: Identity,
    pub relationship: Relationship,
    pub complexity: Complexity,
    pub transformation: Transformation,
    pub alignment: Alignment,
    pub potential: Potential,
    pub resolution: Resolution,
}

impl FeatureSnapshot {
    pub fn from_row(row: &FeatureRow, prev: Option<&FeatureRow>) -> Self {
        let velocity = signed_unit(row.trans_raw);
        let acceleration = prev
            .map(|p| signed_unit(velocity - signed_unit(p.trans_raw)))
            .unwrap_or(0.0);
        Self {
            ts: row.ts,
            identity: Identity {
                fundamental_freq: row.returns * DISPLAY_SCALE,
                strength: unit(row.returns.abs()),
            },
            relationship: Relationship {
                consonance: unit(1.0 - row.vol_imbalance),
                complexity: unit(row.hurst),
            },
            complexity: Complexity {
                brightness: unit(row.hurst),
                centroid: row.sigma_long * DISPLAY_SCALE,
                bandwidth: row.sigma_short * DISPLAY_SCALE,
            },
            transformation: Transformation {
                flux: unit(row.trans_sm),
                velocity,
                acceleration,
            },
            alignment: Alignment {
                coherence: unit(1.0 - row.ent_sm),
                stability: unit(row.sigma_c),
                synchrony: unit(row.sigma_r),
            },
            potential: Potential {
                entropy: unit(row.ent_sm),
                unpredictability: unit(row.res_sm),
                freedom: unit(1.0 - row.sigma_r),
            },
            resolution: Resolution {
                sigma_c: row.sigma_c,
                sigma_r: row.sigma_r,
                res_ratio: row.res_sm,
            },
        }
    }
}

/// Project the last row of `table` into feature groups.
pub fn latest_snapshot(table: &FeatureTable) -> SigmaResult<FeatureSnapshot> {
    let last = table
        .last_row()
        .ok_or_else(|| SigmaError::input("feature table is empty"))?;
    let prev = table.len().checked_sub(2).and_then(|i| table.row(i));
    Ok(FeatureSnapshot::from_row(&last, prev.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(trans_raw: f64) -> FeatureRow {
        FeatureRow {
            ts: 7,
            returns: -0.02,
            sigma_short: 0.03,
            sigma_long: 0.01,
            trans_raw,
            trans_sm: 1.7,
            hurst_raw: 0.6,
            hurst: 0.62,
            ent_raw: 0.9,
            ent_sm: 0.8,
            vol_imbalance: -2.0,
            es: 0.03,
            res_raw: 3.0,
            res_sm: 1.39,
            alpha_eff: 1.0,
            beta_eff: 1.0,
            stress: 3.0,
            sigma_c: 0.2,
            sigma_r: 0.05,
        }
    }

    #[test]
    fn test_group_mapping_and_clips() {
        let snap = FeatureSnapshot::from_row(&row(2.0), None);
        assert!((snap.identity.fundamental_freq + 20.0).abs() < 1e-9);
        assert!((snap.identity.strength - 0.02).abs() < 1e-12);
        assert_eq!(snap.relationship.consonance, 1.0);
        assert_eq!(snap.relationship.complexity, 0.62);
        assert_eq!(snap.complexity.brightness, 0.62);
        assert!((snap.complexity.centroid - 10.0).abs() < 1e-9);
        assert!((snap.complexity.bandwidth - 30.0).abs() < 1e-9);
        assert_eq!(snap.transformation.flux, 1.0);
        assert_eq!(snap.transformation.velocity, 1.0);
        assert_eq!(snap.transformation.acceleration, 0.0);
        assert!((snap.alignment.coherence - 0.2).abs() < 1e-12);
        assert_eq!(snap.alignment.stability, 0.2);
        assert_eq!(snap.alignment.synchrony, 0.05);
        assert_eq!(snap.potential.entropy, 0.8);
        assert_eq!(snap.potential.unpredictability, 1.0);
        assert!((snap.potential.freedom - 0.95).abs() < 1e-12);
        assert_eq!(snap.resolution.res_ratio, 1.39);
    }

    #[test]
    fn test_acceleration_uses_previous_row() {
        let snap = FeatureSnapshot::from_row(&row(0.5), Some(&row(-0.25)));
        assert!((snap.transformation.acceleration - 0.75).abs() < 1e-12);
        let snap = FeatureSnapshot::from_row(&row(-3.0), Some(&row(3.0)));
        assert_eq!(snap.transformation.acceleration, -1.0);
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_value(FeatureSnapshot::from_row(&row(0.0), None)).unwrap();
        assert!(json["identity"]["fundamentalFreq"].is_number());
        assert!(json["resolution"]["sigma_R"].is_number());
        assert!(json["potential"]["unpredictability"].is_number());
    }

    #[test]
    fn test_empty_table_is_rejected() {
        assert!(latest_snapshot(&FeatureTable::default()).is_err());
    }
}
