use chrono::{DateTime, Duration, Utc};
use tradesim::prelude::*;

fn now() -> DateTime<Utc> {
    DateTime::default()
}

fn candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            CandleBuilder::builder()
                .time(now() + Duration::hours(i as i64))
                .open(*close)
                .high(close * 1.002)
                .low(close * 0.998)
                .close(*close)
                .volume(10.0)
                .build()
                .unwrap()
        })
        .collect()
}

fn simulator(config: SimulationConfig) -> Simulator {
    let mut simulator = Simulator::new(config).unwrap();
    simulator.update_price("BTCUSDT", 100.0, now()).unwrap();
    simulator
}

fn buy(quantity: f64) -> MarketOrderRequest {
    MarketOrderRequest::new("BTCUSDT", OrderSide::Buy, OrderSize::Quantity(quantity))
}

#[test]
fn long_round_trip_with_entry_fee() {
    let mut simulator = simulator(SimulationConfig::default());
    let order = simulator.create_market_order(buy(10.0), now()).unwrap();
    assert_eq!(simulator.available_balance(), 10_000.0 - 1000.0 - 1.0);

    // no fee on exit
    simulator.update_config(ConfigUpdate { fee_pct: Some(0.0), ..Default::default() }).unwrap();
    let id = order.linked_position_id().unwrap();
    simulator.close_position(id, Some(110.0), CloseReason::Manual, now()).unwrap();

    let position = simulator.position(id).unwrap();
    assert_eq!(position.pnl(), 100.0);
    assert_eq!(position.pnl_pct(), 10.0);
    assert_eq!(simulator.available_balance(), 8999.0 + 1000.0 + 100.0);
    assert_eq!(simulator.total_fees(), 1.0);
    assert_eq!(simulator.locked_balance(), 0.0);
    assert!((simulator.ledger_total() - (simulator.total_balance() - 10_000.0)).abs() < 1e-9);
}

#[test]
fn fee_free_round_trip_is_neutral() {
    let mut simulator = simulator(SimulationConfig { fee_pct: 0.0, ..Default::default() });
    let id = simulator.create_market_order(buy(7.5), now()).unwrap().linked_position_id().unwrap();
    simulator.close_position(id, None, CloseReason::Manual, now()).unwrap();

    assert_eq!(simulator.available_balance(), 10_000.0);
    assert_eq!(simulator.total_fees(), 0.0);
    // open and close trades only, no fee entries
    assert_eq!(simulator.transactions().len(), 2);
    assert!(simulator.transactions().iter().all(|tx| tx.kind() == TransactionType::Trade));
}

#[test]
fn stop_loss_fires_at_five_percent_loss() {
    let config = SimulationConfig { stop_loss_pct: 5.0, take_profit_pct: 5.0, ..Default::default() };
    let mut simulator = simulator(config);
    let id = simulator.create_market_order(buy(10.0), now()).unwrap().linked_position_id().unwrap();

    simulator.update_price("BTCUSDT", 95.0, now()).unwrap();
    simulator.check_exits(now()).unwrap();

    let position = simulator.position(id).unwrap();
    assert_eq!(position.exit_reason(), Some(CloseReason::StopLoss));
    assert_eq!(position.exit_price(), Some(95.0));
    assert!(!position.is_open());
}

#[test]
fn per_order_exit_rules_override_defaults() {
    let config = SimulationConfig { stop_loss_pct: 50.0, ..Default::default() };
    let mut simulator = simulator(config);
    let request = buy(10.0).stop_loss_pct(2.0).take_profit_pct(4.0);
    let id = simulator.create_market_order(request, now()).unwrap().linked_position_id().unwrap();

    simulator.update_price("BTCUSDT", 104.0, now()).unwrap();
    simulator.check_exits(now()).unwrap();
    assert_eq!(simulator.position(id).unwrap().exit_reason(), Some(CloseReason::TakeProfit));
}

#[test]
fn closing_twice_never_credits_twice() {
    let mut simulator = simulator(SimulationConfig::default());
    let id = simulator.create_market_order(buy(10.0), now()).unwrap().linked_position_id().unwrap();
    simulator.close_position(id, Some(120.0), CloseReason::Manual, now()).unwrap();
    let balance = simulator.available_balance();

    assert!(matches!(
        simulator.close_position(id, Some(120.0), CloseReason::Manual, now()),
        Err(Error::PositionClosed(_))
    ));
    assert_eq!(simulator.available_balance(), balance);
}

#[test]
fn withdraw_more_than_available_is_rejected() {
    let mut simulator = simulator(SimulationConfig::default());
    simulator.create_market_order(buy(50.0), now()).unwrap();

    // locked margin cannot be withdrawn
    let result = simulator.withdraw(9000.0, now());
    assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
    assert_eq!(simulator.locked_balance(), 5000.0);
    assert!(simulator.is_consistent());
}

#[test]
fn single_confident_buy_survives_combination() {
    let buy = Signal::neutral("BTCUSDT", 100.0, now(), "RSI").with_decision(SignalType::Buy, 90.0);
    let combined = combine_signals(&[buy], CombineOptions::default());
    assert_eq!(combined.kind, SignalType::Buy);
    assert_eq!(combined.confidence, 90.0);
}

#[test]
fn backtest_without_strategies() {
    let closes = (0..120).map(|i| 100.0 + (i as f64 / 5.0).sin() * 10.0).collect::<Vec<_>>();
    let result = Backtest::new(BacktestConfig::default()).unwrap().run(&candles(&closes)).unwrap();

    assert_eq!(result.metrics.total_trades, 0);
    assert_eq!(result.metrics.profit_loss, 0.0);
    assert_eq!(result.metrics.max_drawdown, 0.0);
    assert_eq!(result.metrics.sharpe_ratio, 0.0);
    assert_eq!(result.equity_curve.len(), 120);
}

#[test]
fn backtest_closes_everything_at_the_end() {
    let closes = (0..300)
        .map(|i| 100.0 + (i as f64 / 8.0).sin() * 15.0 + i as f64 * 0.05)
        .collect::<Vec<_>>();
    let config = BacktestConfig {
        lookback: 40,
        strategies: vec![
            RsiStrategy::default().into(),
            BollingerStrategy::default().into(),
            MacdStrategy::default().into(),
        ],
        weight_by_confidence: false,
        simulation: SimulationConfig {
            enable_margin_trading: true,
            default_leverage_margin: 2.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut backtest = Backtest::new(config).unwrap();
    let result = backtest.run(&candles(&closes)).unwrap();

    assert!(result.trades.iter().all(|p| !p.is_open()));
    assert_eq!(backtest.simulator().locked_balance(), 0.0);
    assert!(backtest.simulator().is_consistent());
    assert_eq!(result.metrics.winning_trades + result.metrics.losing_trades, result.metrics.total_trades);
    let last = result.equity_curve.last().unwrap();
    assert!((last.equity - result.metrics.final_balance).abs() < 1e-9);
    assert!(result.metrics.max_drawdown >= 0.0 && result.metrics.max_drawdown <= 100.0);
}

#[tokio::test]
async fn backtest_through_a_feed() {
    let feed = MemoryFeed::new();
    let closes = (0..200).map(|i| 50.0 + (i as f64 / 6.0).cos() * 5.0).collect::<Vec<_>>();
    feed.set_candles("ETHUSDT", candles(&closes));

    let config = BacktestConfig {
        symbol: "ETHUSDT".into(),
        limit: 150,
        strategies: vec![RsiStrategy::default().into()],
        ..Default::default()
    };
    let result = run_backtest(&feed, config.clone()).await.unwrap();
    // the feed returns the most recent `limit` candles
    assert_eq!(result.equity_curve.len(), 150);
    assert_eq!(result.equity_curve[0].time, now() + Duration::hours(50));

    feed.set_failing("ETHUSDT", true);
    assert!(matches!(run_backtest(&feed, config).await, Err(Error::Feed(_))));
}
