use anyhow::{anyhow, Result};
use serde_json::json;
use std::path::PathBuf;

use sigmar::analysis::{episode, summarize};
use sigmar::data::load_csv;
use sigmar::logging::{log, obj, v_num, v_str, Domain, Level, ProfileScope};
use sigmar::storage::FeatureStore;
use sigmar::synthetic::{epoch_seconds, generate, SyntheticSpec};
use sigmar::{compute, configure, latest_snapshot, InputSeries, Params};

/// Named stress windows reported after every run: (name, first day, last day).
const EPISODES: [(&str, (i32, u32, u32), (i32, u32, u32)); 2] = [
    ("crisis_2008", (2008, 9, 1), (2009, 3, 31)),
    ("covid_2020", (2020, 2, 1), (2020, 4, 30)),
];

fn day_ts((y, m, d): (i32, u32, u32)) -> Result<i64> {
    chrono::NaiveDate::from_ymd_opt(y, m, d)
        .map(epoch_seconds)
        .ok_or_else(|| anyhow!("bad date {}-{}-{}", y, m, d))
}

fn load_input() -> Result<(InputSeries, String)> {
    let path = std::env::args().nth(1).or_else(|| std::env::var("SIGMA_INPUT").ok());
    match path {
        Some(path) => {
            let (series, report) = load_csv(PathBuf::from(&path).as_path())?;
            log(
                Level::Info,
                Domain::Input,
                "loaded",
                obj(&[
                    ("path", v_str(&report.path)),
                    ("sha256", v_str(&report.hash_sha256)),
                    ("rows", json!(report.rows)),
                    ("bad_rows", json!(report.bad_rows)),
                    ("has_volume", json!(report.has_volume)),
                ]),
            );
            Ok((series, path))
        }
        None => {
            let seed = std::env::var("SIGMA_SEED").ok().and_then(|v| v.parse().ok()).unwrap_or(42);
            let series = generate(&SyntheticSpec::with_seed(seed));
            log(
                Level::Info,
                Domain::Input,
                "synthetic",
                obj(&[("seed", json!(seed)), ("rows", json!(series.len()))]),
            );
            Ok((series, format!("synthetic-{}", seed)))
        }
    }
}

fn main() -> Result<()> {
    let _profile = ProfileScope::new("run");
    let cfg = configure(Params::from_env())?;
    let (series, label) = load_input()?;

    let table = compute(&series, &cfg)?;

    if let Some(summary) = summarize(&table) {
        log(
            Level::Info,
            Domain::System,
            "summary",
            obj(&[
                ("rows", json!(summary.rows)),
                ("sigma_c", json!(summary.sigma_c)),
                ("sigma_r", json!(summary.sigma_r)),
                ("diagnostics", json!(table.diagnostics())),
            ]),
        );
    }

    for (name, start, end) in EPISODES {
        if let Some(ep) = episode(&table, day_ts(start)?, day_ts(end)?) {
            log(
                Level::Info,
                Domain::System,
                "episode",
                obj(&[
                    ("name", v_str(name)),
                    ("rows", json!(ep.rows)),
                    ("min_sigma_r", v_num(ep.min_sigma_r)),
                    ("min_sigma_r_ts", json!(ep.min_sigma_r_ts)),
                    ("mean_sigma_r", v_num(ep.mean_sigma_r)),
                ]),
            );
        }
    }

    let out = PathBuf::from(std::env::var("OUT_CSV").unwrap_or_else(|_| "sigma_r_features.csv".to_string()));
    table.write_csv(&out)?;
    log(
        Level::Info,
        Domain::Export,
        "csv_written",
        obj(&[("path", v_str(&out.display().to_string())), ("rows", json!(table.len()))]),
    );

    if let Ok(db) = std::env::var("SQLITE_PATH") {
        let mut store = FeatureStore::new(&db)?;
        store.init()?;
        store.persist(&label, &cfg.params_hash(), &table)?;
    }

    let snapshot = latest_snapshot(&table)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
