//! Next-price forecast from a close-price history
//!
//! Two tiers: a moving-average heuristic for short histories (5 to 9 closes)
//! and a composite of volatility, seasonality and support/resistance for
//! longer ones. Fewer than five closes produce a neutral, low-confidence
//! result. All outputs are clamped so callers never see a negative or
//! collapsed price.

use crate::indicators;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Minimum history for the short-series heuristic.
pub const MIN_SHORT_SERIES: usize = 5;
/// Minimum history for the composite path.
pub const MIN_COMPOSITE_SERIES: usize = 10;
/// Confidence reported for degenerate input.
pub const DEGENERATE_CONFIDENCE: f64 = 0.1;

const SHORT_FLOOR: f64 = 0.5;
const COMPOSITE_FLOOR: f64 = 0.7;
const TREND_THRESHOLD: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Trend {
    /// Classify a signed ratio against a symmetric band.
    fn from_ratio(value: f64, band: f64) -> Self {
        if value > band {
            Trend::Bullish
        } else if value < -band {
            Trend::Bearish
        } else {
            Trend::Neutral
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
            Trend::Neutral => "neutral",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub next_price: f64,
    /// Heuristic certainty in [0, 1], not a probability.
    pub confidence: f64,
    pub trend: Trend,
}

impl PredictionResult {
    fn degenerate(prices: &[f64]) -> Self {
        Self {
            next_price: prices.last().copied().unwrap_or(0.0),
            confidence: DEGENERATE_CONFIDENCE,
            trend: Trend::Neutral,
        }
    }
}

/// Forecast the next close using the thread-local random source.
pub fn forecast(prices: &[f64]) -> PredictionResult {
    forecast_with_rng(prices, &mut rand::rng())
}

/// Forecast the next close with an injected random source.
///
/// Only the composite path draws from `rng` (exactly one sample), so a seeded
/// generator gives reproducible results.
pub fn forecast_with_rng<R: Rng + ?Sized>(prices: &[f64], rng: &mut R) -> PredictionResult {
    match prices.len() {
        n if n < MIN_SHORT_SERIES => PredictionResult::degenerate(prices),
        n if n < MIN_COMPOSITE_SERIES => short_series_forecast(prices),
        _ => composite_forecast(prices, rng),
    }
}

/// Moving-average crossover plus momentum, for histories of at least five
/// closes. Shorter input is treated as degenerate.
pub fn short_series_forecast(prices: &[f64]) -> PredictionResult {
    if prices.len() < MIN_SHORT_SERIES {
        return PredictionResult::degenerate(prices);
    }

    let n = prices.len();
    let last_price = prices[n - 1];

    let short_ma = indicators::moving_average(&prices[n - 5..], 5);
    let long_window = &prices[n.saturating_sub(10)..];
    let long_ma = indicators::moving_average(long_window, long_window.len().min(10));

    let trend_strength = if long_ma != 0.0 && long_ma.is_finite() {
        (short_ma - long_ma) / long_ma
    } else {
        0.0
    };
    let momentum_factor = indicators::momentum(prices) * 0.1;

    let raw = last_price * (1.0 + trend_strength + momentum_factor);
    let next_price = floor_at(raw, last_price, SHORT_FLOOR);

    let confidence = clamp_confidence((trend_strength.abs() * 5.0 + 0.3).min(0.9));
    let trend = Trend::from_ratio(trend_strength, TREND_THRESHOLD);

    debug!(
        "Short-series forecast: short_ma={:.4}, long_ma={:.4}, strength={:.4}, momentum={:.4} -> {:.4}",
        short_ma, long_ma, trend_strength, momentum_factor, next_price
    );

    PredictionResult {
        next_price,
        confidence,
        trend,
    }
}

fn composite_forecast<R: Rng + ?Sized>(prices: &[f64], rng: &mut R) -> PredictionResult {
    let n = prices.len();
    let last_price = prices[n - 1];

    let vol = indicators::volatility(prices);
    let seas = indicators::seasonality(prices);
    let support = indicators::support_level(prices);
    let resistance = indicators::resistance_level(prices);

    let base = last_price + seas * 0.3 + (support + resistance) / 2.0 * 0.1;
    let noise: f64 = rng.random_range(-0.5..0.5);
    let raw = base * (1.0 + noise * vol * 0.1);
    let next_price = floor_at(raw, last_price, COMPOSITE_FLOOR);

    let recent = &prices[n - 5..];
    let direction = recent[recent.len() - 1] - recent[0];
    let trend = Trend::from_ratio(direction, last_price.abs() * TREND_THRESHOLD);

    let confidence = clamp_confidence((0.4 + (1.0 - vol) * 0.4).min(0.85));

    debug!(
        "Composite forecast: vol={:.4}, seasonality={:.4}, support={:.4}, resistance={:.4}, noise={:.4} -> {:.4}",
        vol, seas, support, resistance, noise, next_price
    );

    PredictionResult {
        next_price,
        confidence,
        trend,
    }
}

/// Apply the `last_price * fraction` floor; a non-finite estimate collapses
/// to the last price.
fn floor_at(estimate: f64, last_price: f64, fraction: f64) -> f64 {
    if !estimate.is_finite() {
        return last_price;
    }
    estimate.max(last_price * fraction)
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        DEGENERATE_CONFIDENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_degenerate_short_input() {
        let result = forecast(&[100.0, 101.0, 99.0, 98.0]);
        assert_eq!(result.next_price, 98.0);
        assert_eq!(result.confidence, 0.1);
        assert_eq!(result.trend, Trend::Neutral);

        let empty = forecast(&[]);
        assert_eq!(empty.next_price, 0.0);
        assert_eq!(empty.confidence, 0.1);
        assert_eq!(empty.trend, Trend::Neutral);
    }

    #[test]
    fn test_short_series_heuristic() {
        let prices = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let result = forecast(&prices);

        // short_ma = 13, long_ma = 12.5, strength = 0.04, momentum = 2/13
        let strength = 0.04;
        let momentum = (15.0 - 13.0) / 13.0 * 0.1;
        let expected = 15.0 * (1.0 + strength + momentum);
        assert!((result.next_price - expected).abs() < 1e-9);
        assert!((result.confidence - 0.5).abs() < 1e-9);
        assert_eq!(result.trend, Trend::Bullish);
    }

    #[test]
    fn test_short_series_floor() {
        // Short average far below the long one drags the estimate under half the last price
        let prices = vec![1000.0, 1000.0, 1000.0, 1000.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let result = short_series_forecast(&prices);
        assert_eq!(result.next_price, 0.5);
        assert_eq!(result.trend, Trend::Bearish);
        assert!((result.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_short_series_flat_is_neutral() {
        let result = short_series_forecast(&[50.0; 7]);
        assert_eq!(result.trend, Trend::Neutral);
        assert!((result.next_price - 50.0).abs() < 1e-9);
        assert!((result.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_composite_is_reproducible_with_seed() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();

        let a = forecast_with_rng(&prices, &mut StdRng::seed_from_u64(7));
        let b = forecast_with_rng(&prices, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let mut rng = StdRng::seed_from_u64(7);
        let noise: f64 = rng.random_range(-0.5..0.5);
        let last = prices[prices.len() - 1];
        let vol = indicators::volatility(&prices);
        let base = last
            + indicators::seasonality(&prices) * 0.3
            + (indicators::support_level(&prices) + indicators::resistance_level(&prices)) / 2.0
                * 0.1;
        let expected = (base * (1.0 + noise * vol * 0.1)).max(last * 0.7);
        assert!((a.next_price - expected).abs() < 1e-9);
    }

    #[test]
    fn test_composite_trend_labels() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 2.0).collect();
        assert_eq!(forecast(&rising).trend, Trend::Bullish);

        let falling: Vec<f64> = (0..30).map(|i| 200.0 - i as f64 * 2.0).collect();
        assert_eq!(forecast(&falling).trend, Trend::Bearish);

        let flat = vec![100.0; 12];
        assert_eq!(forecast(&flat).trend, Trend::Neutral);
    }

    #[test]
    fn test_composite_confidence_bounds() {
        let calm = vec![100.0; 20];
        let result = forecast(&calm);
        // Zero volatility gives the highest reachable confidence
        assert!((result.confidence - 0.8).abs() < 1e-9);

        let wild: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { 1000.0 }).collect();
        let result = forecast(&wild);
        assert!(result.confidence >= 0.0 && result.confidence <= 1.0);
        assert_eq!(result.confidence, 0.0);
        assert!(result.next_price >= wild[19] * 0.7);
    }

    #[test]
    fn test_trend_display_and_serde() {
        assert_eq!(Trend::Bullish.to_string(), "bullish");
        let json = serde_json::to_string(&PredictionResult {
            next_price: 1.0,
            confidence: 0.5,
            trend: Trend::Bearish,
        })
        .unwrap();
        assert_eq!(json, r#"{"nextPrice":1.0,"confidence":0.5,"trend":"bearish"}"#);
    }
}
