use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical ticker form: surrounding whitespace removed, upper-cased.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Snapshot of a symbol's current trading price and daily change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

impl Quote {
    /// Percent change implied by an absolute change against the previous close
    /// (`price - change`). Returns 0 when the previous close is not positive.
    pub fn implied_change_percent(price: f64, change: f64) -> f64 {
        let previous_close = price - change;
        if previous_close > 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        }
    }
}

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time: NaiveDate,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time: NaiveDate, value: f64) -> Self {
        Self { time, value }
    }
}

/// Daily closing-price history, strictly ascending by date with no duplicate
/// dates and only positive, finite values.
///
/// Deserialization goes through [`TimeSeries::from_points`], so the invariant
/// holds for decoded series too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TimeSeriesPoint>", into = "Vec<TimeSeriesPoint>")]
pub struct TimeSeries {
    points: Vec<TimeSeriesPoint>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Build a series from raw provider points.
    ///
    /// Non-positive and non-finite values are dropped, points are sorted by
    /// date, and a repeated date keeps the value that arrived last. When
    /// `max_points` is given only the most recent points are kept.
    pub fn from_points(mut points: Vec<TimeSeriesPoint>, max_points: Option<usize>) -> Self {
        points.retain(|p| p.value.is_finite() && p.value > 0.0);

        // Stable sort so the later duplicate stays after the earlier one
        points.sort_by_key(|p| p.time);

        let mut deduped: Vec<TimeSeriesPoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.time == point.time => *last = point,
                _ => deduped.push(point),
            }
        }

        if let Some(max) = max_points {
            if deduped.len() > max {
                let excess = deduped.len() - max;
                deduped.drain(0..excess);
            }
        }

        Self { points: deduped }
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<TimeSeriesPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TimeSeriesPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TimeSeriesPoint> {
        self.points.last()
    }

    /// Closing values oldest to newest, the input shape for the forecast.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeSeriesPoint> {
        self.points.iter()
    }
}

impl From<Vec<TimeSeriesPoint>> for TimeSeries {
    fn from(points: Vec<TimeSeriesPoint>) -> Self {
        TimeSeries::from_points(points, None)
    }
}

impl From<TimeSeries> for Vec<TimeSeriesPoint> {
    fn from(series: TimeSeries) -> Self {
        series.points
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a TimeSeriesPoint;
    type IntoIter = std::slice::Iter<'a, TimeSeriesPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
