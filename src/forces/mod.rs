//! The six forces and their two aggregates, run in dependency order.
//!
//! | Stage | Force | Writes |
//! |---|---|---|
//! | `returns` | identity | returns, sigma_short, sigma_long |
//! | `complexity` | memory | hurst_raw, hurst |
//! | `transformation` | regime shift | trans_raw, trans_sm |
//! | `entropy` | disorder | ent_raw, ent_sm |
//! | `relationship` | volume | vol_imbalance |
//! | `resolution` | tail risk | es, res_raw, res_sm |
//! | `coefficients` | modulation | alpha_eff, beta_eff |
//! | `stability` | aggregate | D, sigma_C, sigma_R |

pub mod coefficients;
pub mod complexity;
pub mod entropy;
pub mod relationship;
pub mod resolution;
pub mod returns;
pub mod stability;
pub mod transformation;

use crate::config::Config;
use crate::logging::{log_stage, ProfileScope};
use crate::series::InputSeries;
use crate::table::FeatureTable;
use serde_json::json;

/// Run every stage over a series that has already been validated.
pub fn run(series: &InputSeries, cfg: &Config) -> FeatureTable {
    let _profile = ProfileScope::with_context("forces", &[("rows", json!(series.len()))]);
    let mut table = FeatureTable::keyed(&series.timestamps);
    let n = table.len();

    returns::apply(&series.prices, cfg, &mut table);
    log_stage("returns", n, 0);

    let hurst_degenerate = complexity::apply(cfg, &mut table);
    log_stage("complexity", n, hurst_degenerate);

    transformation::apply(cfg, &mut table);
    log_stage("transformation", n, 0);

    let entropy_degenerate = entropy::apply(cfg, &mut table);
    log_stage("entropy", n, entropy_degenerate);

    let volume_undefined = relationship::apply(series.volumes.as_deref(), cfg, &mut table);
    log_stage("relationship", n, volume_undefined);

    let es_degenerate = resolution::apply(cfg, &mut table);
    log_stage("resolution", n, es_degenerate);

    coefficients::apply(cfg, &mut table);
    log_stage("coefficients", n, 0);

    let clips = stability::apply(cfg, &mut table);
    log_stage("stability", n, clips.stress_nonpositive);

    table.diagnostics.hurst_degenerate = hurst_degenerate;
    table.diagnostics.entropy_degenerate = entropy_degenerate;
    table.diagnostics.volume_undefined = volume_undefined;
    table.diagnostics.es_degenerate = es_degenerate;
    table.diagnostics.stress_nonpositive = clips.stress_nonpositive;
    table.diagnostics.sigma_c_clipped = clips.sigma_c_clipped;
    table.diagnostics.sigma_r_clipped = clips.sigma_r_clipped;
    table
}
