//! Alpha Vantage quote and daily-series provider.
//!
//! Every numeric field arrives as a string keyed by a numbered label
//! (`"05. price"`). Throttling and bad symbols are reported inside a
//! successful HTTP response through `"Note"`, `"Information"` or
//! `"Error Message"`, so the body is checked before the payload.

use super::synthetic::company_name;
use super::{
    ProviderError, ProviderOutcome, QuoteProvider, SeriesProvider, get_json, parse_number,
};
use crate::config::AlphaVantageConfig;
use crate::market_data::{Quote, TimeSeriesPoint};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Status markers Alpha Vantage places next to (or instead of) the payload.
#[derive(Debug, Default, Deserialize)]
struct ApiStatus {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

impl ApiStatus {
    fn check(&self, symbol: &str) -> ProviderOutcome<()> {
        if let Some(note) = self.note.as_ref().or(self.information.as_ref()) {
            return Err(ProviderError::RateLimited(note.clone()));
        }
        if let Some(message) = &self.error_message {
            debug!("Alpha Vantage rejected {}: {}", symbol, message);
            return Err(ProviderError::no_data(symbol));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(flatten)]
    status: ApiStatus,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailySeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<String, DailyBar>>,
    #[serde(flatten)]
    status: ApiStatus,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: Option<String>,
}

fn parse_quote(symbol: &str, response: GlobalQuoteResponse) -> ProviderOutcome<Quote> {
    response.status.check(symbol)?;

    let quote = response
        .global_quote
        .ok_or_else(|| ProviderError::no_data(symbol))?;

    let price = parse_number(quote.price.as_deref())
        .filter(|p| *p > 0.0)
        .ok_or_else(|| ProviderError::no_data(symbol))?;

    let change = parse_number(quote.change.as_deref()).unwrap_or(0.0);
    let change_percent = parse_number(quote.change_percent.as_deref())
        .unwrap_or_else(|| Quote::implied_change_percent(price, change));
    let volume = parse_number(quote.volume.as_deref())
        .filter(|v| *v >= 0.0)
        .map(|v| v as u64)
        .unwrap_or(0);

    let symbol = quote
        .symbol
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| symbol.to_string());

    Ok(Quote {
        name: company_name(&symbol),
        symbol,
        price,
        change,
        change_percent,
        volume,
        market_cap: None,
    })
}

fn parse_daily_series(
    symbol: &str,
    response: DailySeriesResponse,
) -> ProviderOutcome<Vec<TimeSeriesPoint>> {
    response.status.check(symbol)?;

    let series = response
        .series
        .ok_or_else(|| ProviderError::no_data(symbol))?;

    let mut points = Vec::with_capacity(series.len());
    for (date, bar) in series {
        let time = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
            ProviderError::MalformedResponse(format!("bad date '{}': {}", date, e))
        })?;
        match parse_number(bar.close.as_deref()) {
            Some(close) => points.push(TimeSeriesPoint::new(time, close)),
            None => debug!("Skipping unparseable close for {} on {}", symbol, date),
        }
    }

    if points.is_empty() {
        return Err(ProviderError::no_data(symbol));
    }
    Ok(points)
}

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(client: reqwest::Client, config: &AlphaVantageConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, function: &str, symbol: &str) -> reqwest::RequestBuilder {
        self.client.get(&self.base_url).query(&[
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ])
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fetch_quote(&self, symbol: &str) -> ProviderOutcome<Quote> {
        let response = get_json(self.request("GLOBAL_QUOTE", symbol)).await?;
        parse_quote(symbol, response)
    }
}

#[async_trait]
impl SeriesProvider for AlphaVantageProvider {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fetch_series(&self, symbol: &str) -> ProviderOutcome<Vec<TimeSeriesPoint>> {
        let request = self
            .request("TIME_SERIES_DAILY", symbol)
            .query(&[("outputsize", "compact")]);
        let response = get_json(request).await?;
        parse_daily_series(symbol, response)
    }
}
