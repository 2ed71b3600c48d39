use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable that overrides the configured Alpha Vantage key.
pub const ALPHA_VANTAGE_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider_config: ProviderConfig,
    #[serde(default)]
    pub series_config: SeriesConfig,
    #[serde(default)]
    pub forecast_config: ForecastConfig,
}

/// External data sources that can appear in a provider chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    AlphaVantage,
    Yahoo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub alpha_vantage: AlphaVantageConfig,
    #[serde(default)]
    pub yahoo: YahooConfig,
    /// Upper bound for a single provider attempt.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Quote providers in priority order; the synthetic generator always follows.
    #[serde(default = "default_quote_providers")]
    pub quote_providers: Vec<ProviderKind>,
    /// Series providers in priority order; the synthetic generator always follows.
    #[serde(default = "default_series_providers")]
    pub series_providers: Vec<ProviderKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaVantageConfig {
    #[serde(default = "default_alpha_vantage_url")]
    pub base_url: String,
    #[serde(default = "default_alpha_vantage_key")]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahooConfig {
    #[serde(default = "default_yahoo_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Most recent closes kept after filtering.
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(default = "default_interval")]
    pub interval: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_projection_days")]
    pub projection_days: u32,
    /// Fixes every random draw (forecast noise, projection noise, synthetic
    /// data) when set.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            alpha_vantage: AlphaVantageConfig::default(),
            yahoo: YahooConfig::default(),
            timeout_ms: default_timeout_ms(),
            quote_providers: default_quote_providers(),
            series_providers: default_series_providers(),
        }
    }
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            base_url: default_alpha_vantage_url(),
            api_key: default_alpha_vantage_key(),
        }
    }
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: default_yahoo_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            range: default_range(),
            interval: default_interval(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            projection_days: default_projection_days(),
            seed: None,
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_quote_providers() -> Vec<ProviderKind> {
    vec![ProviderKind::AlphaVantage, ProviderKind::Yahoo]
}

fn default_series_providers() -> Vec<ProviderKind> {
    vec![ProviderKind::Yahoo]
}

fn default_alpha_vantage_url() -> String {
    "https://www.alphavantage.co/query".to_string()
}

fn default_alpha_vantage_key() -> String {
    "demo".to_string()
}

fn default_yahoo_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_max_points() -> usize {
    30
}

fn default_range() -> String {
    "1mo".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

fn default_projection_days() -> u32 {
    7
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from_file("config.json")
    }

    /// Read a JSON config, using defaults when the file does not exist.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let config_str = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str::<AppConfig>(&config_str)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        } else {
            info!("No config file at {}, using defaults", path.display());
            AppConfig::default()
        };

        config.apply_env_overrides();
        config.validate();

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(ALPHA_VANTAGE_KEY_ENV) {
            if !key.trim().is_empty() {
                info!("Using Alpha Vantage API key from {}", ALPHA_VANTAGE_KEY_ENV);
                self.provider_config.alpha_vantage.api_key = key.trim().to_string();
            }
        }
    }

    /// Replace values that would break the pipeline with their defaults.
    fn validate(&mut self) {
        let providers = &mut self.provider_config;
        if providers.timeout_ms == 0 {
            warn!("timeout_ms must be positive, using {}ms", default_timeout_ms());
            providers.timeout_ms = default_timeout_ms();
        }
        if self.series_config.max_points == 0 {
            warn!("max_points must be positive, using {}", default_max_points());
            self.series_config.max_points = default_max_points();
        }
    }
}
