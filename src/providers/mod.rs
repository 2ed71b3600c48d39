//! Quote and price-history acquisition
//!
//! External sources implement [`QuoteProvider`] or [`SeriesProvider`]. The
//! [`ProviderChain`] tries them in priority order under a per-attempt timeout
//! and falls back to the [`SyntheticProvider`], so acquisition never fails
//! from the caller's point of view. Errors in this module never leave the
//! chain.

pub mod alpha_vantage;
pub mod chain;
pub mod synthetic;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageProvider;
pub use chain::ProviderChain;
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;

use crate::market_data::{Quote, TimeSeriesPoint};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Why a single provider attempt failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no data for symbol '{symbol}'")]
    NoData { symbol: String },

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    pub fn no_data(symbol: &str) -> Self {
        ProviderError::NoData {
            symbol: symbol.to_string(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Result of one provider attempt.
pub type ProviderOutcome<T> = Result<T, ProviderError>;

/// A source of current quotes.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the current quote for an upper-case ticker.
    async fn fetch_quote(&self, symbol: &str) -> ProviderOutcome<Quote>;
}

/// A source of daily closing prices.
///
/// Providers return the points as delivered; the chain filters, orders and
/// truncates them.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetch roughly a month of daily closes for an upper-case ticker.
    async fn fetch_series(&self, symbol: &str) -> ProviderOutcome<Vec<TimeSeriesPoint>>;
}

/// Run one provider call, turning an overrun of `timeout` into
/// [`ProviderError::Timeout`].
pub async fn bounded<T, F>(timeout: Duration, call: F) -> ProviderOutcome<T>
where
    F: Future<Output = ProviderOutcome<T>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(ProviderError::Timeout(timeout)))
}

/// Issue a GET and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> ProviderOutcome<T> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    decode_response(status, &body)
}

/// Classify an HTTP response.
///
/// HTTP 429 maps to [`ProviderError::RateLimited`], any other non-success
/// status to [`ProviderError::Network`], and an undecodable body to
/// [`ProviderError::MalformedResponse`].
pub(crate) fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> ProviderOutcome<T> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited(format!("HTTP {status}")));
    }
    if !status.is_success() {
        return Err(ProviderError::Network(format!("HTTP {status}")));
    }

    serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}

/// Parse a numeric field that providers deliver as text, e.g. `"1.25%"`.
pub(crate) fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.map(|s| s.trim().trim_end_matches('%'))
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
