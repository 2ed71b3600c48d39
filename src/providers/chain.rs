use super::synthetic::SyntheticProvider;
use super::{
    AlphaVantageProvider, ProviderError, ProviderOutcome, QuoteProvider, SeriesProvider,
    YahooProvider, bounded,
};
use crate::config::{AppConfig, ProviderKind};
use crate::market_data::{Quote, TimeSeries, normalize_symbol};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Ordered provider fallback for quotes and daily closes.
///
/// External providers are tried one at a time in the order they were added,
/// each bounded by the attempt timeout. The first usable answer wins; when
/// every provider has failed the synthetic generator answers instead, so the
/// plain `fetch_*` methods always produce a value.
pub struct ProviderChain {
    quote_providers: Vec<Arc<dyn QuoteProvider>>,
    series_providers: Vec<Arc<dyn SeriesProvider>>,
    synthetic: SyntheticProvider,
    attempt_timeout: Duration,
    max_points: usize,
}

impl ProviderChain {
    /// Empty chain that always answers from `synthetic`.
    pub fn new(synthetic: SyntheticProvider, attempt_timeout: Duration, max_points: usize) -> Self {
        Self {
            quote_providers: Vec::new(),
            series_providers: Vec::new(),
            synthetic,
            attempt_timeout,
            max_points,
        }
    }

    pub fn with_quote_provider(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        self.quote_providers.push(provider);
        self
    }

    pub fn with_series_provider(mut self, provider: Arc<dyn SeriesProvider>) -> Self {
        self.series_providers.push(provider);
        self
    }

    /// Build the chain described by `config`, sharing one HTTP client
    /// between all providers.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let providers = &config.provider_config;

        let client = reqwest::Client::builder()
            .user_agent(providers.yahoo.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;

        let alpha_vantage = Arc::new(AlphaVantageProvider::new(
            client.clone(),
            &providers.alpha_vantage,
        ));
        let yahoo = Arc::new(YahooProvider::new(
            client,
            &providers.yahoo,
            &config.series_config,
        ));

        let synthetic = match config.forecast_config.seed {
            Some(seed) => SyntheticProvider::with_seed(seed),
            None => SyntheticProvider::new(),
        };

        let mut chain = Self::new(
            synthetic,
            Duration::from_millis(providers.timeout_ms),
            config.series_config.max_points,
        );

        for kind in &providers.quote_providers {
            chain = match kind {
                ProviderKind::AlphaVantage => chain.with_quote_provider(alpha_vantage.clone()),
                ProviderKind::Yahoo => chain.with_quote_provider(yahoo.clone()),
            };
        }
        for kind in &providers.series_providers {
            chain = match kind {
                ProviderKind::AlphaVantage => chain.with_series_provider(alpha_vantage.clone()),
                ProviderKind::Yahoo => chain.with_series_provider(yahoo.clone()),
            };
        }

        info!(
            "Provider chain: quotes [{}], series [{}], timeout {}ms",
            chain.quote_provider_names().join(", "),
            chain.series_provider_names().join(", "),
            providers.timeout_ms
        );

        Ok(chain)
    }

    pub fn quote_providers(&self) -> &[Arc<dyn QuoteProvider>] {
        &self.quote_providers
    }

    pub fn series_providers(&self) -> &[Arc<dyn SeriesProvider>] {
        &self.series_providers
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    pub fn quote_provider_names(&self) -> Vec<&'static str> {
        self.quote_providers.iter().map(|p| p.name()).collect()
    }

    pub fn series_provider_names(&self) -> Vec<&'static str> {
        self.series_providers.iter().map(|p| p.name()).collect()
    }

    /// Current quote for `symbol`. Never fails.
    pub async fn fetch_quote(&self, symbol: &str) -> Quote {
        let never = CancellationToken::new();
        match self.fetch_quote_cancellable(symbol, &never).await {
            Some(quote) => quote,
            None => self.synthetic.quote(&normalize_symbol(symbol)),
        }
    }

    /// Daily closes for `symbol`, oldest first. Never fails.
    pub async fn fetch_time_series(&self, symbol: &str) -> TimeSeries {
        let never = CancellationToken::new();
        match self.fetch_time_series_cancellable(symbol, &never).await {
            Some(series) => series,
            None => self.synthetic.series(&normalize_symbol(symbol)),
        }
    }

    /// Like [`fetch_quote`](Self::fetch_quote), but returns `None` as soon as
    /// `cancel` fires. The in-flight provider call is dropped.
    pub async fn fetch_quote_cancellable(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Option<Quote> {
        let symbol = normalize_symbol(symbol);
        if cancel.is_cancelled() {
            return None;
        }
        if symbol.is_empty() {
            warn!("Blank symbol, using synthetic quote");
            return Some(self.synthetic.quote(&symbol));
        }

        for provider in &self.quote_providers {
            let outcome = self.attempt(provider.fetch_quote(&symbol), cancel).await?;
            match outcome {
                Ok(quote) if quote.price.is_finite() && quote.price > 0.0 => {
                    info!("Quote for {} from {}: {:.2}", symbol, provider.name(), quote.price);
                    return Some(quote);
                }
                Ok(quote) => warn!(
                    "{} returned unusable price {} for {}",
                    provider.name(),
                    quote.price,
                    symbol
                ),
                Err(e) => warn!("{} quote for {} failed: {}", provider.name(), symbol, e),
            }
        }

        warn!("All quote providers failed for {}, using synthetic data", symbol);
        Some(self.synthetic.quote(&symbol))
    }

    /// Like [`fetch_time_series`](Self::fetch_time_series), but returns `None`
    /// as soon as `cancel` fires.
    pub async fn fetch_time_series_cancellable(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Option<TimeSeries> {
        let symbol = normalize_symbol(symbol);
        if cancel.is_cancelled() {
            return None;
        }
        if symbol.is_empty() {
            warn!("Blank symbol, using synthetic series");
            return Some(self.synthetic.series(&symbol));
        }

        for provider in &self.series_providers {
            let outcome = self.attempt(provider.fetch_series(&symbol), cancel).await?;
            let result = outcome.and_then(|points| {
                let raw = points.len();
                let series = TimeSeries::from_points(points, Some(self.max_points));
                debug!("{} delivered {} points, kept {}", provider.name(), raw, series.len());
                if series.is_empty() {
                    Err(ProviderError::no_data(&symbol))
                } else {
                    Ok(series)
                }
            });

            match result {
                Ok(series) => {
                    info!("Series for {} from {}: {} points", symbol, provider.name(), series.len());
                    return Some(series);
                }
                Err(e) => warn!("{} series for {} failed: {}", provider.name(), symbol, e),
            }
        }

        warn!("All series providers failed for {}, using synthetic data", symbol);
        Some(self.synthetic.series(&symbol))
    }

    /// Run one provider call under the attempt timeout. `None` means the
    /// request was cancelled.
    async fn attempt<T, F>(&self, call: F, cancel: &CancellationToken) -> Option<ProviderOutcome<T>>
    where
        F: Future<Output = ProviderOutcome<T>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Provider call cancelled");
                None
            }
            outcome = bounded(self.attempt_timeout, call) => Some(outcome),
        }
    }
}
