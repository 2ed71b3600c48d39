//! Terminal fallback that fabricates plausible market data.
//!
//! A quote and a 31-day history are derived from one base price drawn in
//! [50, 250). The generator has no failure mode; it is what makes the
//! provider chain total.

use crate::market_data::{Quote, TimeSeries, TimeSeriesPoint};
use chrono::{Days, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Days of history before today; the series holds this many plus one points.
pub const HISTORY_DAYS: u64 = 30;
/// Lowest value a synthetic close can take.
pub const MIN_SYNTHETIC_PRICE: f64 = 10.0;

const KNOWN_COMPANIES: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("GOOGL", "Alphabet Inc."),
    ("MSFT", "Microsoft Corp."),
    ("TSLA", "Tesla Inc."),
    ("AMZN", "Amazon.com Inc."),
    ("NVDA", "NVIDIA Corp."),
];

/// Display name for a ticker, `"<SYMBOL> Inc."` when unknown.
pub fn company_name(symbol: &str) -> String {
    KNOWN_COMPANIES
        .iter()
        .find(|(ticker, _)| ticker.eq_ignore_ascii_case(symbol))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("{} Inc.", symbol))
}

/// Quote and history generated from the same base price.
#[derive(Debug, Clone)]
pub struct SyntheticSnapshot {
    pub quote: Quote,
    pub series: TimeSeries,
}

/// Generate a snapshot ending at `today`.
pub fn generate_snapshot<R: Rng + ?Sized>(
    symbol: &str,
    today: NaiveDate,
    rng: &mut R,
) -> SyntheticSnapshot {
    let base_price: f64 = rng.random_range(50.0..250.0);
    let change: f64 = rng.random_range(-5.0..5.0);
    let change_percent = change / base_price * 100.0;

    let points = (0..=HISTORY_DAYS)
        .rev()
        .filter_map(|days_back| {
            let variation: f64 = rng.random_range(-10.0..10.0);
            today
                .checked_sub_days(Days::new(days_back))
                .map(|date| TimeSeriesPoint::new(date, (base_price + variation).max(MIN_SYNTHETIC_PRICE)))
        })
        .collect();

    let volume = rng.random_range(0..10_000_000u64);
    let market_cap = rng.random_range(0.0..1e12f64).floor();

    SyntheticSnapshot {
        quote: Quote {
            symbol: symbol.to_string(),
            name: company_name(symbol),
            price: base_price,
            change,
            change_percent,
            volume,
            market_cap: Some(market_cap),
        },
        series: TimeSeries::from_points(points, None),
    }
}

/// Fallback generator. Each call uses its own random source, seeded when a
/// seed was configured.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    seed: Option<u64>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self { seed: None }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn name(&self) -> &'static str {
        "synthetic"
    }

    pub fn quote(&self, symbol: &str) -> Quote {
        self.snapshot(symbol).quote
    }

    pub fn series(&self, symbol: &str) -> TimeSeries {
        self.snapshot(symbol).series
    }

    pub fn snapshot(&self, symbol: &str) -> SyntheticSnapshot {
        let today = Local::now().date_naive();
        generate_snapshot(symbol, today, &mut self.rng())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
