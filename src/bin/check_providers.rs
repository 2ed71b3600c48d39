use stockforecast::config::AppConfig;
use stockforecast::logging::init_logger;
use stockforecast::market_data::{TimeSeries, normalize_symbol};
use stockforecast::providers::{ProviderChain, bounded};

use anyhow::{Result, bail};
use futures::future::join_all;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let args: Vec<String> = env::args().collect();
    let Some(symbol) = args.get(1).map(|s| normalize_symbol(s)).filter(|s| !s.is_empty()) else {
        bail!("usage: check_providers <SYMBOL> [CONFIG]");
    };
    let config = AppConfig::load_from_file(args.get(2).map(String::as_str).unwrap_or("config.json"))?;
    let chain = ProviderChain::from_config(&config)?;
    let timeout = chain.attempt_timeout();

    println!("Probing providers for {} (timeout {:?}):", symbol, timeout);

    let quotes = join_all(chain.quote_providers().iter().map(|provider| {
        let symbol = symbol.as_str();
        async move { (provider.name(), bounded(timeout, provider.fetch_quote(symbol)).await) }
    }))
    .await;

    for (name, outcome) in quotes {
        match outcome {
            Ok(quote) => println!(
                "  quote  {:<14} OK     price={:.2} change={:+.2} ({:+.2}%) volume={}",
                name, quote.price, quote.change, quote.change_percent, quote.volume
            ),
            Err(e) => println!("  quote  {:<14} FAILED {}", name, e),
        }
    }

    let series = join_all(chain.series_providers().iter().map(|provider| {
        let symbol = symbol.as_str();
        async move { (provider.name(), bounded(timeout, provider.fetch_series(symbol)).await) }
    }))
    .await;

    for (name, outcome) in series {
        match outcome {
            Ok(points) => {
                let raw = points.len();
                let series = TimeSeries::from_points(points, Some(chain.max_points()));
                match (series.first(), series.last()) {
                    (Some(first), Some(last)) => println!(
                        "  series {:<14} OK     {} raw, {} kept, {} .. {} last={:.2}",
                        name,
                        raw,
                        series.len(),
                        first.time,
                        last.time,
                        last.value
                    ),
                    _ => println!("  series {:<14} FAILED no usable points in {} raw", name, raw),
                }
            }
            Err(e) => println!("  series {:<14} FAILED {}", name, e),
        }
    }

    Ok(())
}
