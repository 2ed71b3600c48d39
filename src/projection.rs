//! Forward projection of a daily close series.
//!
//! Extends the last observed day-over-day change with a linear decay and
//! bounded noise, one point per calendar day after the last known date.

use crate::market_data::{TimeSeries, TimeSeriesPoint};
use chrono::Days;
use rand::Rng;

/// Number of future days produced by [`project`].
pub const DEFAULT_HORIZON_DAYS: u32 = 7;

const TREND_DECAY_PER_DAY: f64 = 0.1;
const NOISE_AMPLITUDE: f64 = 2.5;
const FLOOR_FRACTION: f64 = 0.5;

/// Seven-day projection using the thread-local random source.
pub fn project(series: &TimeSeries) -> TimeSeries {
    project_with_rng(series, &mut rand::rng())
}

/// Seven-day projection with an injected random source.
pub fn project_with_rng<R: Rng + ?Sized>(series: &TimeSeries, rng: &mut R) -> TimeSeries {
    project_horizon(series, DEFAULT_HORIZON_DAYS, rng)
}

/// Project `days` points past the end of `series`.
///
/// Each step draws one noise sample in [-2.5, 2.5) and is floored at half the
/// last observed close. An empty series projects to an empty series.
pub fn project_horizon<R: Rng + ?Sized>(series: &TimeSeries, days: u32, rng: &mut R) -> TimeSeries {
    let points = series.points();
    let Some(last) = points.last() else {
        return TimeSeries::new();
    };

    let trend = match points.len() {
        n if n >= 2 => last.value - points[n - 2].value,
        _ => 0.0,
    };

    let mut projected = Vec::with_capacity(days as usize);
    for offset in 1..=days {
        let Some(date) = last.time.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };

        let noise: f64 = rng.random_range(-NOISE_AMPLITUDE..NOISE_AMPLITUDE);
        let trend_decay = trend * (1.0 - f64::from(offset) * TREND_DECAY_PER_DAY);
        let predicted = last.value + trend_decay + noise;

        projected.push(TimeSeriesPoint::new(
            date,
            predicted.max(last.value * FLOOR_FRACTION),
        ));
    }

    TimeSeries::from_points(projected, None)
}
