mod utils;

use std::sync::Arc;
use std::time::Duration;

use tradesim::prelude::*;

use utils::{generate_sample_candles, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    // replay a generated series through an in-memory feed, one candle per second
    let mut history = generate_sample_candles(400, 3, 30_000.0).into_iter();
    let feed = MemoryFeed::new();
    feed.set_candles("BTCUSDT", history.by_ref().take(100).collect());

    let config = PaperTradingConfig {
        symbols: vec!["BTCUSDT".into()],
        strategies: vec![RsiStrategy::default().into(), MacdStrategy::default().into()],
        weight_by_confidence: false,
        min_confidence: 70.0,
        price_refresh_secs: 1,
        evaluation_secs: 2,
        ..Default::default()
    };
    let simulation = SimulationConfig {
        stop_loss_pct: 3.0,
        take_profit_pct: 6.0,
        ..Default::default()
    };
    let mut trader = PaperTrader::new(config, simulation, Arc::new(feed.clone()))?;
    trader.start()?;

    for (i, candle) in history.take(20).enumerate() {
        feed.push_candle("BTCUSDT", candle);
        // one failing poll every five seconds
        feed.set_failing("BTCUSDT", i % 5 == 4);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    trader.stop().await?;

    let wallet = trader.wallet().await;
    println!("=== Paper Trading ===");
    println!("Total balance: {:.2}", wallet.total_balance());
    println!("Available: {:.2}, locked: {:.2}", wallet.available_balance(), wallet.locked_balance());
    println!("Open positions: {}", wallet.open_positions().count());
    println!("Closed positions: {}", wallet.closed_positions().count());
    println!("Fees paid: {:.2}", wallet.total_fees());

    Ok(())
}
