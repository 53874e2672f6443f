//! Seeded synthetic daily price/volume series with crisis regimes.
//!
//! Stands in for a market-data download. The same spec and seed always give
//! the same series.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use crate::series::InputSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct Regime {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Daily return volatility inside the regime
    pub vol: f64,
    /// Daily return drift inside the regime
    pub drift: f64,
}

impl Regime {
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_price: f64,
    pub base_vol: f64,
    pub regimes: Vec<Regime>,
    pub seed: u64,
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            start: ymd(2007, 1, 1),
            end: ymd(2024, 12, 31),
            start_price: 150.0,
            base_vol: 0.01,
            regimes: vec![
                Regime {
                    name: "crisis_2008".into(),
                    start: ymd(2008, 10, 1),
                    end: ymd(2009, 3, 31),
                    vol: 0.03,
                    drift: -0.002,
                },
                Regime {
                    name: "covid_2020".into(),
                    start: ymd(2020, 2, 1),
                    end: ymd(2020, 4, 30),
                    vol: 0.035,
                    drift: -0.001,
                },
            ],
            seed: 42,
        }
    }
}

impl SyntheticSpec {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, ..Self::default() }
    }
}

/// Midnight UTC of `day` as epoch seconds.
pub fn epoch_seconds(day: NaiveDate) -> i64 {
    day.signed_duration_since(ymd(1970, 1, 1)).num_days() * 86_400
}

/// Monday..Friday between `start` and `end`, inclusive.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

pub fn generate(spec: &SyntheticSpec) -> InputSeries {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let days = business_days(spec.start, spec.end);

    let mut timestamps = Vec::with_capacity(days.len());
    let mut prices = Vec::with_capacity(days.len());
    let mut volumes = Vec::with_capacity(days.len());
    let mut log_level = spec.start_price.ln();

    for day in days {
        let (vol, drift) = spec
            .regimes
            .iter()
            .find(|r| r.contains(day))
            .map(|r| (r.vol, r.drift))
            .unwrap_or((spec.base_vol, 0.0));
        let z: f64 = StandardNormal.sample(&mut rng);
        let r = z * vol + drift;
        log_level += r;

        let noise: f64 = StandardNormal.sample(&mut rng);
        let volume = r.abs() * 1e8 + 5e7 + noise * 1e7;
        timestamps.push(epoch_seconds(day));
        prices.push(log_level.exp());
        volumes.push(volume.max(1e6));
    }

    InputSeries::new(timestamps, prices, Some(volumes))
}
