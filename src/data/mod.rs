//! Loading price/volume series from CSV.
//!
//! The header decides the layout: a time column (`ts`, `timestamp` or `date`),
//! a price column (`close`, `adj_close` or `price`) and optionally `volume`.
//! Time values are epoch seconds or `YYYY-MM-DD` (anything after the first
//! ten characters, e.g. a time-of-day, is ignored).

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::series::InputSeries;
use crate::synthetic::epoch_seconds;

const TS_NAMES: [&str; 3] = ["ts", "timestamp", "date"];
const PRICE_NAMES: [&str; 3] = ["close", "adj_close", "price"];
const VOLUME_NAMES: [&str; 1] = ["volume"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub path: String,
    pub hash_sha256: String,
    pub rows: u64,
    pub bad_rows: u64,
    pub has_volume: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    ts: usize,
    price: usize,
    volume: Option<usize>,
}

fn find_column(header: &[String], names: &[&str]) -> Option<usize> {
    header.iter().position(|h| names.contains(&h.as_str()))
}

fn parse_layout(line: &str) -> Result<Layout> {
    let header: Vec<String> = line
        .split(',')
        .map(|s| s.trim().trim_matches('"').to_lowercase().replace(' ', "_"))
        .collect();
    let ts = find_column(&header, &TS_NAMES).ok_or_else(|| anyhow!("no time column in header {:?}", header))?;
    let price = find_column(&header, &PRICE_NAMES).ok_or_else(|| anyhow!("no price column in header {:?}", header))?;
    Ok(Layout { ts, price, volume: find_column(&header, &VOLUME_NAMES) })
}

pub fn parse_ts_field(field: &str) -> Result<i64> {
    let field = field.trim().trim_matches('"');
    if let Ok(ts) = field.parse::<i64>() {
        return Ok(ts);
    }
    let day = field.get(..10).unwrap_or(field);
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").with_context(|| format!("bad timestamp {:?}", field))?;
    Ok(epoch_seconds(date))
}

fn parse_row(line: &str, layout: Layout) -> Result<(i64, f64, Option<f64>)> {
    let parts: Vec<&str> = line.split(',').collect();
    let field = |i: usize| {
        parts
            .get(i)
            .map(|s| s.trim())
            .ok_or_else(|| anyhow!("expected column {}, got {} columns", i, parts.len()))
    };
    let ts = parse_ts_field(field(layout.ts)?)?;
    let price: f64 = field(layout.price)?.parse()?;
    let volume = match layout.volume {
        Some(i) => Some(field(i)?.parse::<f64>()?),
        None => None,
    };
    Ok((ts, price, volume))
}

/// Parse CSV text into a series. Unparsable and out-of-order rows are
/// skipped and reported.
pub fn parse_series(content: &str) -> Result<(InputSeries, u64, Vec<String>)> {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'));
    let header = lines.next().ok_or_else(|| anyhow!("empty csv"))?;
    let layout = parse_layout(header)?;

    let mut timestamps = Vec::new();
    let mut prices = Vec::new();
    let mut volumes = Vec::new();
    let mut bad_rows = 0u64;
    let mut warnings = Vec::new();

    for line in lines {
        match parse_row(line, layout) {
            Ok((ts, price, volume)) => {
                if let Some(&prev) = timestamps.last() {
                    if ts <= prev {
                        bad_rows += 1;
                        warnings.push(format!("non_monotonic_ts: prev={} current={}", prev, ts));
                        continue;
                    }
                }
                timestamps.push(ts);
                prices.push(price);
                if let Some(v) = volume {
                    volumes.push(v);
                }
            }
            Err(err) => {
                bad_rows += 1;
                warnings.push(format!("bad_row: {}", err));
            }
        }
    }

    if timestamps.is_empty() {
        bail!("no parsable rows");
    }
    let volumes = layout.volume.map(|_| volumes);
    Ok((InputSeries::new(timestamps, prices, volumes), bad_rows, warnings))
}

pub fn load_csv(path: &Path) -> Result<(InputSeries, LoadReport)> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let (series, bad_rows, warnings) = parse_series(&content).with_context(|| format!("parsing {}", path.display()))?;
    let report = LoadReport {
        path: path.display().to_string(),
        hash_sha256: file_sha256(path)?,
        rows: series.len() as u64,
        bad_rows,
        has_volume: series.volumes.is_some(),
        warnings,
    };
    if report.bad_rows > 0 {
        log(
            Level::Warn,
            Domain::Input,
            "bad_rows",
            obj(&[
                ("path", v_str(&report.path)),
                ("bad_rows", serde_json::json!(report.bad_rows)),
            ]),
        );
    }
    Ok((series, report))
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
