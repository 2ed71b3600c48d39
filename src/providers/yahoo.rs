//! Yahoo Finance chart API provider.
//!
//! One endpoint serves both needs: the `meta` block carries the current
//! price and previous close, and the parallel `timestamp` / `close` arrays
//! carry the daily history. Yahoo has no official API and changes its format
//! without notice, so every field is optional on the way in.

use super::synthetic::company_name;
use super::{ProviderError, ProviderOutcome, QuoteProvider, SeriesProvider, get_json};
use crate::config::{SeriesConfig, YahooConfig};
use crate::market_data::{Quote, TimeSeriesPoint};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Unwrap the first chart result, translating Yahoo's error block.
fn first_result(symbol: &str, response: ChartResponse) -> ProviderOutcome<ChartData> {
    let results = match (response.chart.result, response.chart.error) {
        (_, Some(err)) if err.code == "Not Found" => return Err(ProviderError::no_data(symbol)),
        (_, Some(err)) => {
            return Err(ProviderError::MalformedResponse(format!(
                "{}: {}",
                err.code,
                err.description.unwrap_or_default()
            )));
        }
        (Some(results), None) => results,
        (None, None) => {
            return Err(ProviderError::MalformedResponse(
                "empty result with no error".into(),
            ));
        }
    };

    results
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::no_data(symbol))
}

fn parse_quote(symbol: &str, response: ChartResponse) -> ProviderOutcome<Quote> {
    let meta = first_result(symbol, response)?.meta;

    let price = meta
        .regular_market_price
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| ProviderError::no_data(symbol))?;

    // Daily change is taken against Yahoo's own previous close
    let change = meta
        .previous_close
        .or(meta.chart_previous_close)
        .filter(|prev| prev.is_finite() && *prev > 0.0)
        .map(|prev| price - prev)
        .unwrap_or(0.0);

    let volume = meta
        .regular_market_volume
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
        .unwrap_or(0);

    let symbol = meta
        .symbol
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| symbol.to_string());

    Ok(Quote {
        name: company_name(&symbol),
        symbol,
        price,
        change,
        change_percent: Quote::implied_change_percent(price, change),
        volume,
        market_cap: None,
    })
}

fn parse_series(symbol: &str, response: ChartResponse) -> ProviderOutcome<Vec<TimeSeriesPoint>> {
    let data = first_result(symbol, response)?;

    let timestamps = data
        .timestamp
        .ok_or_else(|| ProviderError::no_data(symbol))?;
    let closes = data
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .map(|q| q.close)
        .ok_or_else(|| ProviderError::MalformedResponse("no quote indicators".into()))?;

    let mut points = Vec::with_capacity(timestamps.len());
    for (&ts, close) in timestamps.iter().zip(closes) {
        // Holidays and the in-progress session come back as null
        let Some(close) = close else {
            continue;
        };
        let date = DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ProviderError::MalformedResponse(format!("invalid timestamp: {ts}")))?;
        points.push(TimeSeriesPoint::new(date, close));
    }

    if points.is_empty() {
        return Err(ProviderError::no_data(symbol));
    }
    Ok(points)
}

pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
    range: String,
    interval: String,
}

impl YahooProvider {
    pub fn new(client: reqwest::Client, config: &YahooConfig, series: &SeriesConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            range: series.range.clone(),
            interval: series.interval.clone(),
        }
    }

    async fn chart(&self, symbol: &str) -> ProviderOutcome<ChartResponse> {
        let url = format!("{}/{}", self.base_url, symbol);
        let request = self.client.get(url).query(&[
            ("range", self.range.as_str()),
            ("interval", self.interval.as_str()),
        ]);
        get_json(request).await
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_quote(&self, symbol: &str) -> ProviderOutcome<Quote> {
        let response = self.chart(symbol).await?;
        parse_quote(symbol, response)
    }
}

#[async_trait]
impl SeriesProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_series(&self, symbol: &str) -> ProviderOutcome<Vec<TimeSeriesPoint>> {
        let response = self.chart(symbol).await?;
        parse_series(symbol, response)
    }
}
