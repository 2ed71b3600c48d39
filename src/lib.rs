pub mod analysis;
pub mod config;
pub mod forecast;
pub mod indicators;
pub mod logging;
pub mod market_data;
pub mod projection;
pub mod providers;
