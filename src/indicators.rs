//! Price indicators used by the forecast engine
//!
//! Every function here is pure and total: it accepts any slice of prices
//! (oldest first), including an empty one, and always returns a number.

use log::debug;
use statrs::statistics::Statistics;

/// Window used by the support and resistance levels.
pub const LEVEL_LOOKBACK: usize = 20;
/// Number of extreme values averaged into a support or resistance level.
pub const LEVEL_EXTREMES: usize = 3;
/// Window for the weekly seasonality deviation.
pub const SEASONALITY_WINDOW: usize = 7;
/// Volatility reported when there are not enough prices for a return.
pub const DEFAULT_VOLATILITY: f64 = 0.1;

/// Average of the most recent `period` prices
///
/// # Arguments
/// * `prices` - Historical prices, oldest first
/// * `period` - Lookback; clipped to the number of prices available
///
/// # Returns
/// * `f64` - Mean of the last `min(period, len)` prices, or the last price
///   (0 when empty) if the window is empty
pub fn moving_average(prices: &[f64], period: usize) -> f64 {
    let window = period.min(prices.len());
    if window == 0 {
        return prices.last().copied().unwrap_or(0.0);
    }

    let recent = &prices[prices.len() - window..];
    recent.iter().sum::<f64>() / window as f64
}

/// Relative change across the last three prices
///
/// # Returns
/// * `f64` - `(last - first) / first` over the trailing slice of up to three
///   prices, 0 for fewer than two prices or a zero starting price
pub fn momentum(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let recent = &prices[prices.len().saturating_sub(3)..];
    let first = recent[0];
    let last = recent[recent.len() - 1];

    if first == 0.0 {
        return 0.0;
    }

    (last - first) / first
}

/// Standard deviation of consecutive log returns
///
/// Uses the population form (divide by n). Returns that cannot be computed
/// (non-positive prices) are skipped.
///
/// # Returns
/// * `f64` - Dispersion of log returns, [`DEFAULT_VOLATILITY`] when fewer than
///   two prices are available
pub fn volatility(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return DEFAULT_VOLATILITY;
    }

    let returns: Vec<f64> = prices
        .windows(2)
        .map(|w| (w[1] / w[0]).ln())
        .filter(|r| r.is_finite())
        .collect();

    if returns.is_empty() {
        debug!("No finite log returns in {} prices, using default volatility", prices.len());
        return DEFAULT_VOLATILITY;
    }

    returns.iter().population_std_dev()
}

/// Deviation of the latest price from its weekly average, scaled by 0.1
///
/// Returns 0 when fewer than seven prices are available.
pub fn seasonality(prices: &[f64]) -> f64 {
    if prices.len() < SEASONALITY_WINDOW {
        return 0.0;
    }

    let weekly = &prices[prices.len() - SEASONALITY_WINDOW..];
    let weekly_avg = weekly.iter().sum::<f64>() / SEASONALITY_WINDOW as f64;
    let last = prices[prices.len() - 1];

    (last - weekly_avg) * 0.1
}

/// Proxy price floor: mean of the three lowest of the last 20 prices
///
/// With fewer than five prices the plain minimum is used; an empty slice
/// yields 0.
pub fn support_level(prices: &[f64]) -> f64 {
    if prices.len() < 5 {
        return prices.iter().copied().reduce(f64::min).unwrap_or(0.0);
    }

    let mut recent = recent_window(prices);
    recent.sort_by(|a, b| a.total_cmp(b));
    mean_of_extremes(&recent)
}

/// Proxy price ceiling: mean of the three highest of the last 20 prices
///
/// With fewer than five prices the plain maximum is used; an empty slice
/// yields 0.
pub fn resistance_level(prices: &[f64]) -> f64 {
    if prices.len() < 5 {
        return prices.iter().copied().reduce(f64::max).unwrap_or(0.0);
    }

    let mut recent = recent_window(prices);
    recent.sort_by(|a, b| b.total_cmp(a));
    mean_of_extremes(&recent)
}

fn recent_window(prices: &[f64]) -> Vec<f64> {
    prices[prices.len().saturating_sub(LEVEL_LOOKBACK)..].to_vec()
}

fn mean_of_extremes(sorted: &[f64]) -> f64 {
    let take = LEVEL_EXTREMES.min(sorted.len());
    sorted[..take].iter().sum::<f64>() / take as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_moving_average() {
        let prices = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_approx(moving_average(&prices, 2), 4.5);
        assert_approx(moving_average(&prices, 5), 3.0);
        // Period longer than history averages everything available
        assert_approx(moving_average(&prices, 50), 3.0);
        assert_approx(moving_average(&prices, 0), 5.0);
        assert_approx(moving_average(&[], 5), 0.0);
    }

    #[test]
    fn test_momentum_uses_last_three() {
        let prices = vec![50.0, 100.0, 105.0, 110.0];
        assert_approx(momentum(&prices), 0.10);
        assert_approx(momentum(&[100.0, 90.0]), -0.10);
        assert_approx(momentum(&[100.0]), 0.0);
        assert_approx(momentum(&[0.0, 0.0, 5.0]), 0.0);
    }

    #[test]
    fn test_volatility() {
        assert_approx(volatility(&[]), DEFAULT_VOLATILITY);
        assert_approx(volatility(&[42.0]), DEFAULT_VOLATILITY);

        // Constant growth has identical returns, so no dispersion
        let geometric: Vec<f64> = (0..10).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        assert!(volatility(&geometric) < 1e-12);

        // Two returns of +ln2 and -ln2 have population std dev ln2
        assert_approx(volatility(&[1.0, 2.0, 1.0]), 2.0f64.ln());
    }

    #[test]
    fn test_volatility_skips_non_positive_prices() {
        assert_approx(volatility(&[0.0, -1.0, 0.0]), DEFAULT_VOLATILITY);
        assert!(volatility(&[100.0, 0.0, 100.0, 101.0]).is_finite());
    }

    #[test]
    fn test_seasonality() {
        assert_approx(seasonality(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), 0.0);
        let prices = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        // mean 4, last 7
        assert_approx(seasonality(&prices), 0.3);
    }

    #[test]
    fn test_support_and_resistance_levels() {
        let prices = vec![10.0, 50.0, 20.0, 40.0, 30.0, 60.0];
        assert_approx(support_level(&prices), 20.0);
        assert_approx(resistance_level(&prices), 50.0);
    }

    #[test]
    fn test_levels_only_look_at_last_twenty() {
        let mut prices = vec![1.0, 1000.0];
        prices.extend((0..20).map(|i| 100.0 + i as f64));
        assert_approx(support_level(&prices), 101.0);
        assert_approx(resistance_level(&prices), 118.0);
    }

    #[test]
    fn test_levels_short_history() {
        assert_approx(support_level(&[5.0, 3.0, 4.0]), 3.0);
        assert_approx(resistance_level(&[5.0, 3.0, 4.0]), 5.0);
        assert_approx(support_level(&[]), 0.0);
        assert_approx(resistance_level(&[]), 0.0);
    }
}
