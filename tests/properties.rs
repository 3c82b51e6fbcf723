use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use proptest::strategy::Strategy;
use tradesim::indicators::{bollinger, ema, macd, rsi, sma};
use tradesim::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Price(f64),
    Open { long: bool, pct: f64, leverage: f64 },
    Close(usize),
    Deposit(f64),
    Withdraw(f64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (50.0f64..150.0).prop_map(Op::Price),
        2 => (any::<bool>(), 1.0f64..100.0, 1.0f64..10.0).prop_map(|(long, pct, leverage)| Op::Open { long, pct, leverage }),
        1 => (0usize..8).prop_map(Op::Close),
        1 => (1.0f64..5000.0).prop_map(Op::Deposit),
        1 => (1.0f64..20_000.0).prop_map(Op::Withdraw),
    ]
}

fn assert_wallet_invariants(simulator: &Simulator) {
    let expected = simulator.available_balance() + simulator.locked_balance() + simulator.unrealized_pnl();
    assert!((simulator.total_balance() - expected).abs() < 1e-6);
    assert!(simulator.available_balance() >= -1e-9);
    assert!(simulator.is_consistent());
    let locked = simulator.open_positions().map(Position::margin).sum::<f64>();
    assert!((simulator.locked_balance() - locked).abs() < 1e-6);
}

proptest! {
    #[test]
    fn moving_average_lengths(values in prop::collection::vec(1.0f64..1000.0, 0..120), period in 1usize..40) {
        let sma = sma(&values, period);
        let ema = ema(&values, period);
        let expected = (values.len() + 1).saturating_sub(period);

        prop_assert_eq!(sma.len(), expected);
        prop_assert_eq!(ema.len(), expected);
        if let (Some(s), Some(e)) = (sma.first(), ema.first()) {
            prop_assert!((s - e).abs() < 1e-9);
        }
    }

    #[test]
    fn rsi_is_bounded(values in prop::collection::vec(1.0f64..1000.0, 0..120), period in 1usize..30) {
        let output = rsi(&values, period);
        prop_assert_eq!(output.len(), values.len().saturating_sub(period));
        prop_assert!(output.iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn rsi_of_rising_series_is_100(start in 1.0f64..100.0, steps in prop::collection::vec(0.01f64..5.0, 20..60)) {
        let values = steps
            .iter()
            .scan(start, |price, step| {
                *price += step;
                Some(*price)
            })
            .collect::<Vec<_>>();
        prop_assert_eq!(rsi(&values, 14).last().copied(), Some(100.0));
    }

    #[test]
    fn bollinger_bands_are_ordered(values in prop::collection::vec(1.0f64..1000.0, 0..100)) {
        let bands = bollinger(&values, 20, 2.0);
        prop_assert_eq!(bands.len(), (values.len() + 1).saturating_sub(20));
        for i in 0..bands.len() {
            prop_assert!(bands.lower[i] <= bands.middle[i] + 1e-9);
            prop_assert!(bands.middle[i] <= bands.upper[i] + 1e-9);
        }
    }

    #[test]
    fn macd_histogram_is_line_minus_signal(values in prop::collection::vec(1.0f64..1000.0, 0..100)) {
        let output = macd(&values, 12, 26, 9);
        let offset = output.macd.len() - output.signal.len();
        for (i, histogram) in output.histogram.iter().enumerate() {
            prop_assert!((histogram - (output.macd[i + offset] - output.signal[i])).abs() < 1e-9);
        }
    }

    #[test]
    fn wallet_invariants_hold(ops in prop::collection::vec(op(), 1..60), margin in any::<bool>()) {
        let config = SimulationConfig {
            enable_margin_trading: margin,
            stop_loss_pct: 20.0,
            take_profit_pct: 30.0,
            ..Default::default()
        };
        let mut simulator = Simulator::new(config).unwrap();
        let start = DateTime::<Utc>::default();
        simulator.update_price("BTCUSDT", 100.0, start).unwrap();

        for (i, op) in ops.into_iter().enumerate() {
            let time = start + Duration::minutes(i as i64);
            // rejected operations are part of the property: they must not break anything
            let _ = match op {
                Op::Price(price) => simulator
                    .update_price("BTCUSDT", price, time)
                    .and_then(|_| simulator.check_exits(time).map(|_| ())),
                Op::Open { long, pct, leverage } => {
                    let side = if long { OrderSide::Buy } else { OrderSide::Sell };
                    let request = MarketOrderRequest::new("BTCUSDT", side, OrderSize::PercentOfBalance(pct)).leverage(leverage);
                    simulator.create_market_order(request, time).map(|_| ())
                }
                Op::Close(n) => match simulator.positions().get(n).map(Position::id) {
                    Some(id) => simulator.close_position(id, None, CloseReason::Manual, time).map(|_| ()),
                    None => Ok(()),
                },
                Op::Deposit(amount) => simulator.deposit(amount, time),
                Op::Withdraw(amount) => simulator.withdraw(amount, time),
            };
            assert_wallet_invariants(&simulator);
        }

        simulator.close_all(CloseReason::EndOfTest, start + Duration::days(1)).unwrap();
        assert_wallet_invariants(&simulator);
        prop_assert_eq!(simulator.locked_balance(), 0.0);
        prop_assert!((simulator.ledger_total() - (simulator.total_balance() - 10_000.0)).abs() < 1e-6);
    }
}
