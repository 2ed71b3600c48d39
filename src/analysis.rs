//! Full analysis of one symbol: quote, history, forecast and projection.

use crate::config::{AppConfig, ForecastConfig};
use crate::forecast::{self, PredictionResult};
use crate::market_data::{Quote, TimeSeries, normalize_symbol};
use crate::projection;
use crate::providers::ProviderChain;
use anyhow::Result;
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAnalysis {
    pub symbol: String,
    pub quote: Quote,
    pub history: TimeSeries,
    pub prediction: PredictionResult,
    /// Forecast next price minus the current quote price.
    pub prediction_change: f64,
    pub projection: TimeSeries,
}

impl StockAnalysis {
    /// Confidence as a whole percentage, e.g. `73`.
    pub fn confidence_percent(&self) -> u32 {
        (self.prediction.confidence * 100.0).round() as u32
    }
}

pub struct Analyzer {
    chain: ProviderChain,
    forecast_config: ForecastConfig,
}

impl Analyzer {
    pub fn new(chain: ProviderChain, forecast_config: ForecastConfig) -> Self {
        Self {
            chain,
            forecast_config,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let chain = ProviderChain::from_config(config)?;
        Ok(Self::new(chain, config.forecast_config.clone()))
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Analyze `symbol`. Never fails; unreachable providers are replaced by
    /// synthetic data.
    pub async fn analyze(&self, symbol: &str) -> StockAnalysis {
        let symbol = normalize_symbol(symbol);
        let (quote, history) = tokio::join!(
            self.chain.fetch_quote(&symbol),
            self.chain.fetch_time_series(&symbol)
        );
        self.assemble(symbol, quote, history)
    }

    /// Analyze `symbol`, returning `None` if `cancel` fires before both
    /// fetches complete. Nothing fetched so far is kept.
    pub async fn analyze_cancellable(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Option<StockAnalysis> {
        let symbol = normalize_symbol(symbol);
        let (quote, history) = tokio::join!(
            self.chain.fetch_quote_cancellable(&symbol, cancel),
            self.chain.fetch_time_series_cancellable(&symbol, cancel)
        );

        if cancel.is_cancelled() {
            info!("Analysis of {} cancelled", symbol);
            return None;
        }
        Some(self.assemble(symbol, quote?, history?))
    }

    fn assemble(&self, symbol: String, quote: Quote, history: TimeSeries) -> StockAnalysis {
        let mut rng = match self.forecast_config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let prediction = forecast::forecast_with_rng(&history.closes(), &mut rng);
        let projection =
            projection::project_horizon(&history, self.forecast_config.projection_days, &mut rng);
        let prediction_change = prediction.next_price - quote.price;

        debug!(
            "{}: {} closes, next {:.2} ({:+.2}), {} projected",
            symbol,
            history.len(),
            prediction.next_price,
            prediction_change,
            projection.len()
        );

        StockAnalysis {
            symbol,
            quote,
            history,
            prediction,
            prediction_change,
            projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SyntheticProvider;
    use std::time::Duration;

    fn seeded_analyzer(seed: u64) -> Analyzer {
        let chain = ProviderChain::new(SyntheticProvider::with_seed(seed), Duration::from_secs(1), 30);
        Analyzer::new(
            chain,
            ForecastConfig {
                projection_days: 5,
                seed: Some(seed),
            },
        )
    }

    #[tokio::test]
    async fn test_synthetic_only_analysis() {
        let analysis = seeded_analyzer(4).analyze("tsla").await;

        assert_eq!(analysis.symbol, "TSLA");
        assert_eq!(analysis.quote.name, "Tesla Inc.");
        assert_eq!(analysis.history.len(), 31);
        assert_eq!(analysis.projection.len(), 5);
        assert!((analysis.prediction_change - (analysis.prediction.next_price - analysis.quote.price)).abs() < 1e-12);
        assert!(analysis.confidence_percent() <= 100);
    }

    #[tokio::test]
    async fn test_seeded_analysis_is_repeatable() {
        let a = seeded_analyzer(9).analyze("NVDA").await;
        let b = seeded_analyzer(9).analyze("NVDA").await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_cancelled_analysis_is_discarded() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(seeded_analyzer(1).analyze_cancellable("AAPL", &cancel).await.is_none());
    }

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(StockAnalysis {
            symbol: "AAPL".into(),
            quote: SyntheticProvider::with_seed(2).quote("AAPL"),
            history: TimeSeries::new(),
            prediction: forecast::forecast(&[]),
            prediction_change: 0.0,
            projection: TimeSeries::new(),
        })
        .unwrap();
        assert!(value.get("predictionChange").is_some());
        assert_eq!(value["prediction"]["trend"], "neutral");
    }
}
