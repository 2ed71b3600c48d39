use stockforecast::analysis::Analyzer;
use stockforecast::config::AppConfig;
use stockforecast::logging::init_logger;
use stockforecast::market_data::normalize_symbol;

use anyhow::{Context, Result, bail};
use log::{error, info, warn};
use std::env;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let args: Vec<String> = env::args().collect();
    let Some(symbol) = args.get(1) else {
        bail!("usage: {} <SYMBOL> [CONFIG]", args.first().map(String::as_str).unwrap_or("stockforecast"));
    };
    let config_file = args.get(2).map(String::as_str).unwrap_or("config.json");

    info!("Loading configuration from: {}", config_file);
    let config = AppConfig::load_from_file(config_file)?;
    let analyzer = Analyzer::from_config(&config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupted, cancelling request");
                ctrl_c.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    info!("Analyzing {}", normalize_symbol(symbol));
    let Some(analysis) = analyzer.analyze_cancellable(symbol, &cancel).await else {
        info!("Request cancelled, nothing to report");
        return Ok(());
    };

    let json = serde_json::to_string_pretty(&analysis).context("Failed to serialize analysis")?;
    println!("{}", json);

    info!(
        "Analysis complete for {}: {:.2} -> {:.2} ({:+.2}), {} ({}% confidence)",
        analysis.symbol,
        analysis.quote.price,
        analysis.prediction.next_price,
        analysis.prediction_change,
        analysis.prediction.trend,
        analysis.confidence_percent()
    );

    Ok(())
}
