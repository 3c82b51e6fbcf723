mod utils;

use chrono::{Duration, Utc};
use tradesim::prelude::*;

use utils::init_logging;

fn main() -> anyhow::Result<()> {
    init_logging();

    let mut simulator = Simulator::new(SimulationConfig {
        enable_margin_trading: true,
        ..Default::default()
    })?;
    let start = Utc::now();
    let at = |minutes: i64| start + Duration::minutes(minutes);

    simulator.deposit(5_000.0, at(0))?;
    simulator.update_price("BTCUSDT", 60_000.0, at(0))?;
    simulator.update_price("ETHUSDT", 3_000.0, at(0))?;

    let long = simulator.create_market_order(
        MarketOrderRequest::new("BTCUSDT", OrderSide::Buy, OrderSize::PercentOfBalance(20.0))
            .stop_loss_pct(5.0)
            .take_profit_pct(10.0),
        at(1),
    )?;
    let short = simulator.create_market_order(
        MarketOrderRequest::new("ETHUSDT", OrderSide::Sell, OrderSize::Quantity(1.0)).leverage(2.0),
        at(1),
    )?;

    // an order larger than the available balance is rejected without side effects
    let too_big = MarketOrderRequest::new("BTCUSDT", OrderSide::Buy, OrderSize::Quantity(10.0));
    if let Err(err) = simulator.create_market_order(too_big, at(2)) {
        println!("rejected: {err}");
    }

    for (minute, btc, eth) in [(3, 61_500.0, 2_950.0), (4, 63_000.0, 2_900.0), (5, 66_100.0, 2_980.0)] {
        simulator.update_price("BTCUSDT", btc, at(minute))?;
        simulator.update_price("ETHUSDT", eth, at(minute))?;
        for order in simulator.check_exits(at(minute))? {
            println!("exit rule closed position {:?} @ {:.2}", order.linked_position_id(), order.price());
        }
        println!(
            "t+{minute}m total {:.2} available {:.2} locked {:.2} unrealized {:.2}",
            simulator.total_balance(),
            simulator.available_balance(),
            simulator.locked_balance(),
            simulator.unrealized_pnl()
        );
    }

    if let Some(id) = short.linked_position_id() {
        simulator.close_position(id, None, CloseReason::Manual, at(6))?;
    }
    if let Some(id) = long.linked_position_id()
        && let Err(err) = simulator.close_position(id, None, CloseReason::Manual, at(6))
    {
        println!("long already closed: {err}");
    }
    simulator.withdraw(1_000.0, at(7))?;

    println!("\n=== Ledger ===");
    for tx in simulator.transactions() {
        let kind = format!("{:?}", tx.kind());
        println!("{:>3} {kind:<10} {:>12.4} {}", tx.id(), tx.amount(), tx.description());
    }
    println!("fees {:.2}, cumulative pnl {:.2}", simulator.total_fees(), simulator.cumulative_pnl());
    println!("consistent: {}", simulator.is_consistent());

    Ok(())
}
