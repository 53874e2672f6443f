//! Resolution-adjusted stability from a price (and optional volume) series.
//!
//! Six forces are estimated over the time axis (return shock, volume
//! imbalance, Hurst persistence, volatility regime shift, autocorrelation
//! disorder, expected-shortfall tail risk) and folded into two bounded
//! scores: core stability `sigma_C` and the final `sigma_R`, both in (0, 1].
//!
//! ```no_run
//! use sigmar::{compute, configure, latest_snapshot, InputSeries, Params};
//!
//! let cfg = configure(Params::default())?;
//! let series = InputSeries::from_prices(&[150.0, 151.5, 148.47, 150.0]);
//! let table = compute(&series, &cfg)?;
//! let snap = latest_snapshot(&table)?;
//! println!("{}", snap.resolution.sigma_r);
//! # Ok::<(), sigmar::SigmaError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod errors;
pub mod forces;
pub mod indicators;
pub mod logging;
pub mod parallel;
pub mod series;
pub mod snapshot;
pub mod storage;
pub mod synthetic;
pub mod table;

pub use config::{configure, Config, Params};
pub use errors::{SigmaError, SigmaResult};
pub use series::InputSeries;
pub use snapshot::{latest_snapshot, FeatureSnapshot};
pub use table::{Column, FeatureRow, FeatureTable};

use logging::{log, log_audit, obj, v_str, Domain, Level};
use serde_json::json;

/// Validate `series` and run the full pipeline. Deterministic: the same
/// series and config always give a bit-identical table.
pub fn compute(series: &InputSeries, config: &Config) -> SigmaResult<FeatureTable> {
    if let Err(err) = series.validate() {
        log(
            Level::Error,
            Domain::Input,
            "input_rejected",
            obj(&[("msg", v_str(&err.to_string()))]),
        );
        return Err(err);
    }
    log(
        Level::Debug,
        Domain::Input,
        "input_accepted",
        obj(&[
            ("rows", json!(series.len())),
            ("has_volume", json!(series.volumes.is_some())),
        ]),
    );
    let table = forces::run(series, config);
    log_audit(&config.params_hash(), table.len(), &table.fingerprint());
    Ok(table)
}

/// [`compute`] over bare slices, timestamps taken as row indices.
pub fn compute_prices(prices: &[f64], volumes: Option<&[f64]>, config: &Config) -> SigmaResult<FeatureTable> {
    let mut series = InputSeries::from_prices(prices);
    series.volumes = volumes.map(<[f64]>::to_vec);
    compute(&series, config)
}
