mod utils;

use tradesim::prelude::*;

use utils::{generate_sample_candles, init_logging};

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = BacktestConfig {
        symbol: "ETHUSDT".into(),
        lookback: 60,
        strategies: vec![
            RsiStrategy::default().into(),
            BollingerStrategy::default().into(),
            MacdStrategy::default().into(),
            TrendHunterStrategy::default().into(),
        ],
        // uniform votes: two agreeing strategies out of four are not enough
        weight_by_confidence: false,
        simulation: SimulationConfig {
            enable_margin_trading: true,
            default_leverage_margin: 3.0,
            stop_loss_pct: 6.0,
            take_profit_pct: 12.0,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut backtest = Backtest::new(config)?;
    for seed in [1, 7, 42] {
        let candles = generate_sample_candles(2000, seed, 2500.0);
        let result = backtest.run(&candles)?;
        println!("--- seed {seed} ---");
        println!("{result}\n");
    }

    let by_reason = backtest
        .simulator()
        .closed_positions()
        .fold(std::collections::BTreeMap::new(), |mut acc, p| {
            if let Some(reason) = p.exit_reason() {
                *acc.entry(reason.to_string()).or_insert(0) += 1;
            }
            acc
        });
    println!("last run exits: {by_reason:?}");

    Ok(())
}
