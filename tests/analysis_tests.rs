use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use stockforecast::analysis::Analyzer;
use stockforecast::config::{AppConfig, ForecastConfig};
use stockforecast::forecast::Trend;
use stockforecast::market_data::{Quote, TimeSeriesPoint};
use stockforecast::providers::{
    ProviderChain, ProviderOutcome, QuoteProvider, SeriesProvider, SyntheticProvider,
};
use tokio_util::sync::CancellationToken;

/// In-memory market with a steadily rising month of closes.
struct RisingMarket {
    start: NaiveDate,
}

impl RisingMarket {
    fn close(day: u64) -> f64 {
        100.0 + day as f64 * 2.0
    }
}

#[async_trait]
impl QuoteProvider for RisingMarket {
    fn name(&self) -> &'static str {
        "rising"
    }

    async fn fetch_quote(&self, symbol: &str) -> ProviderOutcome<Quote> {
        Ok(Quote {
            symbol: symbol.to_string(),
            name: "Rising Corp.".to_string(),
            price: Self::close(29),
            change: 2.0,
            change_percent: 2.0 / Self::close(28) * 100.0,
            volume: 1_000_000,
            market_cap: Some(5e10),
        })
    }
}

#[async_trait]
impl SeriesProvider for RisingMarket {
    fn name(&self) -> &'static str {
        "rising"
    }

    async fn fetch_series(&self, _symbol: &str) -> ProviderOutcome<Vec<TimeSeriesPoint>> {
        Ok((0..30)
            .map(|day| TimeSeriesPoint::new(self.start + Days::new(day), Self::close(day)))
            .collect())
    }
}

fn analyzer(seed: Option<u64>) -> Analyzer {
    let market = Arc::new(RisingMarket {
        start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    });
    let chain = ProviderChain::new(SyntheticProvider::new(), Duration::from_secs(1), 30)
        .with_quote_provider(market.clone())
        .with_series_provider(market);
    Analyzer::new(
        chain,
        ForecastConfig {
            projection_days: 7,
            seed,
        },
    )
}

#[cfg(test)]
mod analysis_tests {
    use super::*;

    #[tokio::test]
    async fn test_analysis_combines_quote_history_and_forecast() {
        let analysis = analyzer(Some(17)).analyze(" abc ").await;

        assert_eq!(analysis.symbol, "ABC");
        assert_eq!(analysis.quote.price, 158.0);
        assert_eq!(analysis.history.len(), 30);
        assert_eq!(analysis.prediction.trend, Trend::Bullish);
        assert!(analysis.prediction.next_price >= 158.0 * 0.7);
        assert!(
            (analysis.prediction_change - (analysis.prediction.next_price - 158.0)).abs() < 1e-9
        );

        let last_day = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(analysis.projection.len(), 7);
        assert_eq!(analysis.projection.first().map(|p| p.time), Some(last_day + Days::new(1)));
        assert_eq!(analysis.projection.last().map(|p| p.time), Some(last_day + Days::new(7)));
    }

    #[tokio::test]
    async fn test_seed_makes_analysis_reproducible() {
        let a = analyzer(Some(5)).analyze("ABC").await;
        let b = analyzer(Some(5)).analyze("ABC").await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_uncancelled_request_completes() {
        let cancel = CancellationToken::new();
        let analysis = analyzer(None).analyze_cancellable("ABC", &cancel).await;
        assert!(analysis.is_some());
    }

    #[tokio::test]
    async fn test_analysis_serializes_for_display() -> anyhow::Result<()> {
        let analysis = analyzer(Some(1)).analyze("ABC").await;
        let json = serde_json::to_value(&analysis)?;

        assert_eq!(json["quote"]["changePercent"], serde_json::json!(analysis.quote.change_percent));
        assert_eq!(json["prediction"]["trend"], "bullish");
        assert_eq!(json["history"][0]["time"], "2024-06-01");
        assert!(json["predictionChange"].is_number());
        Ok(())
    }

    #[tokio::test]
    async fn test_default_config_builds_analyzer() -> anyhow::Result<()> {
        let analyzer = Analyzer::from_config(&AppConfig::default())?;
        assert_eq!(analyzer.chain().quote_provider_names(), vec!["alpha_vantage", "yahoo"]);
        assert_eq!(analyzer.chain().series_provider_names(), vec!["yahoo"]);
        Ok(())
    }
}
