mod utils;

use tradesim::prelude::*;

use utils::{example_candles, init_logging};

fn main() -> anyhow::Result<()> {
    init_logging();
    let candles = example_candles();

    let config = BacktestConfig {
        symbol: "BTCUSDT".into(),
        lookback: 30,
        strategies: vec![RsiStrategy::default().into()],
        simulation: SimulationConfig {
            default_order_size_pct: 25.0,
            ..Default::default()
        },
        ..Default::default()
    };

    let result = Backtest::new(config)?.run(&candles)?;
    println!("{result}");

    for trade in &result.trades {
        println!(
            "#{:<4} {} {:>10.4} @ {:>8.2} -> {:>8.2} ({:?}) pnl {:>8.2}",
            trade.id(),
            trade.side(),
            trade.quantity(),
            trade.entry_price(),
            trade.exit_price().unwrap_or_default(),
            trade.exit_reason(),
            trade.pnl(),
        );
    }

    Ok(())
}
