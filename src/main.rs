use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tradesim::prelude::{
    Backtest, BacktestConfig, BollingerStrategy, MacdStrategy, RsiStrategy, TrendHunterStrategy, load_candles, load_json,
};

/// Runs a backtest over a JSON file of klines.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to a JSON array of klines
    #[arg(short, long)]
    data: PathBuf,

    /// Path to a JSON backtest configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured symbol
    #[arg(short, long)]
    symbol: Option<String>,

    /// Prints the full report as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();

    let args = Args::parse();

    let mut config: BacktestConfig = match &args.config {
        Some(path) => load_json(path).with_context(|| format!("reading config {}", path.display()))?,
        None => BacktestConfig::default(),
    };
    if let Some(symbol) = args.symbol {
        config.symbol = symbol;
    }
    if config.strategies.is_empty() {
        info!("no strategy configured, combining the default ones");
        config.strategies = vec![
            RsiStrategy::default().into(),
            BollingerStrategy::default().into(),
            MacdStrategy::default().into(),
            TrendHunterStrategy::default().into(),
        ];
    }

    let candles = load_candles(&args.data).with_context(|| format!("reading candles {}", args.data.display()))?;
    info!(candles = candles.len(), path = %args.data.display(), "candles loaded");

    let result = Backtest::new(config)?.run(&candles)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{result}");
    }

    Ok(())
}
