use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::PercentCalculus;
use crate::config::{ConfigUpdate, SimulationConfig};
use crate::engine::{
    BALANCE_EPSILON, CloseReason, MarketOrderRequest, Order, OrderSide, OrderSize, Position, PositionEntry, PositionSide, Transaction,
    TransactionType, Wallet,
};
use crate::errors::{Error, Result};
use crate::strategy::{Signal, SignalType};

/// The only mutator of a [`Wallet`].
///
/// Every operation validates its inputs first, then applies all balance, position,
/// order and ledger changes together. A failed operation leaves the wallet untouched.
///
/// Operations take the simulated `time` explicitly so that backtests stamp
/// records with candle times and paper trading with the wall clock.
///
/// ### Example
/// ```rust
/// use chrono::Utc;
/// use tradesim::prelude::*;
///
/// let mut simulator = Simulator::new(SimulationConfig::default()).unwrap();
/// let now = Utc::now();
///
/// simulator.update_price("BTCUSDT", 100.0, now).unwrap();
/// let order = simulator
///     .create_market_order(MarketOrderRequest::new("BTCUSDT", OrderSide::Buy, OrderSize::Quantity(10.0)), now)
///     .unwrap();
///
/// let position = order.linked_position_id().unwrap();
/// simulator.close_position(position, Some(110.0), CloseReason::Manual, now).unwrap();
/// assert!(simulator.wallet().available_balance() > 10_000.0);
/// ```
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulationConfig,
    wallet: Wallet,
    prices: BTreeMap<String, f64>,
}

impl std::ops::Deref for Simulator {
    type Target = Wallet;

    fn deref(&self) -> &Self::Target {
        &self.wallet
    }
}

impl Simulator {
    /// Creates a simulator with a fresh wallet holding `config.initial_capital`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let wallet = Wallet::new(config.initial_capital)?;
        Ok(Self {
            config,
            wallet,
            prices: BTreeMap::new(),
        })
    }

    /// Resumes from a persisted wallet.
    ///
    /// Open positions keep their last marked price as the known market price.
    pub fn restore(config: SimulationConfig, wallet: Wallet) -> Result<Self> {
        config.validate()?;
        if !wallet.is_consistent() {
            return Err(Error::InvalidConfig("wallet snapshot does not reconcile with its ledger".into()));
        }
        let prices = wallet
            .open_positions()
            .map(|p| (p.symbol().to_string(), p.current_price()))
            .collect();
        Ok(Self { config, wallet, prices })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns the wallet.
    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Returns an owned copy of the wallet, e.g. for persistence or display.
    pub fn snapshot(&self) -> Wallet {
        self.wallet.clone()
    }

    /// Returns the last price seen for `symbol`.
    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    /// Returns the open position of `symbol` on `side`, if any.
    pub fn open_position(&self, symbol: &str, side: PositionSide) -> Option<&Position> {
        self.wallet.open_positions().find(|p| p.symbol() == symbol && p.side() == side)
    }

    /// Adds funds to the available balance.
    pub fn deposit(&mut self, amount: f64, time: DateTime<Utc>) -> Result<()> {
        self.wallet.credit(amount)?;
        let id = self.wallet.next_id();
        self.wallet.push_transaction(Transaction::new(
            id,
            TransactionType::Deposit,
            amount,
            time,
            format!("Deposit {amount:.2}"),
        ));
        info!(amount, available = self.wallet.available_balance(), "deposit");
        Ok(())
    }

    /// Withdraws funds from the available balance. Locked margin cannot be withdrawn.
    pub fn withdraw(&mut self, amount: f64, time: DateTime<Utc>) -> Result<()> {
        if let Err(err) = self.wallet.debit(amount) {
            warn!(amount, %err, "withdrawal rejected");
            return Err(err);
        }
        let id = self.wallet.next_id();
        self.wallet.push_transaction(Transaction::new(
            id,
            TransactionType::Withdrawal,
            -amount,
            time,
            format!("Withdrawal {amount:.2}"),
        ));
        info!(amount, available = self.wallet.available_balance(), "withdrawal");
        Ok(())
    }

    /// Records the market price of `symbol` and marks its open positions to it.
    pub fn update_price(&mut self, symbol: &str, price: f64, time: DateTime<Utc>) -> Result<()> {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::InvalidPrice(price));
        }
        self.prices.insert(symbol.to_string(), price);
        for position in self.wallet.open_positions_mut().filter(|p| p.symbol() == symbol) {
            position.mark(price);
            debug!(id = position.id(), symbol, price, pnl = position.pnl(), %time, "position marked");
        }
        Ok(())
    }

    /// Opens a position with a market order filled at the last known price.
    ///
    /// ### Arguments
    /// * `request` - Symbol, side, size and optional leverage / exit rules.
    ///   Missing exit rules fall back to the configuration.
    /// * `time` - Execution time.
    ///
    /// ### Returns
    /// The filled order, linked to the new position. Fails without touching the wallet
    /// when no price is known, the size is invalid, a short is requested without margin
    /// trading, or `margin + entry fee` exceeds the available balance.
    pub fn create_market_order(&mut self, request: MarketOrderRequest, time: DateTime<Utc>) -> Result<Order> {
        let price = self
            .last_price(&request.symbol)
            .ok_or_else(|| Error::NoPrice(request.symbol.clone()))?;
        let side = match request.side {
            OrderSide::Buy => PositionSide::Long,
            OrderSide::Sell if self.config.enable_margin_trading => PositionSide::Short,
            OrderSide::Sell => return Err(Error::ShortSellingDisabled),
        };
        let leverage = self.config.effective_leverage(request.leverage)?;
        let fee_rate = self.config.fee_rate();

        let quantity = match request.size {
            OrderSize::Quantity(quantity) => quantity,
            OrderSize::PercentOfBalance(pct) if pct > 0.0 && pct <= 100.0 => {
                // the fee is paid on top of the margin, so leave room for it
                self.wallet.available_balance().how_many(pct) / (price * (1.0 + fee_rate))
            }
            OrderSize::PercentOfBalance(pct) => return Err(Error::InvalidQuantity(pct)),
        };
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(Error::InvalidQuantity(quantity));
        }

        let margin = quantity * price;
        let entry_fee = margin * fee_rate;
        let available = self.wallet.available_balance();
        if margin + entry_fee > available + BALANCE_EPSILON {
            warn!(symbol = %request.symbol, margin, entry_fee, available, "order rejected");
            return Err(Error::InsufficientBalance {
                required: margin + entry_fee,
                available,
            });
        }

        self.wallet.lock(margin, entry_fee)?;

        let order_id = self.wallet.next_id();
        let position_id = self.wallet.next_id();
        let mut order = Order::new(order_id, &request.symbol, request.side, quantity, price, time)
            .with_strategy(request.strategy_name.clone());
        order.fill(position_id, time)?;

        let position = Position::open(PositionEntry {
            id: position_id,
            symbol: request.symbol.clone(),
            side,
            entry_price: price,
            quantity,
            leverage,
            stop_loss_pct: request.stop_loss_pct.or(Some(self.config.stop_loss_pct)),
            take_profit_pct: request.take_profit_pct.or(Some(self.config.take_profit_pct)),
            entry_fee,
            time,
            strategy_name: request.strategy_name,
        });

        self.record_trade(&order, position_id, 0.0, entry_fee, time, format!("Open {side} {quantity} {} @ {price}", order.symbol()));
        info!(
            id = position_id,
            symbol = %order.symbol(),
            %side,
            quantity,
            price,
            leverage,
            fee = entry_fee,
            available = self.wallet.available_balance(),
            "position opened"
        );

        self.wallet.push_position(position);
        self.wallet.push_order(order.clone());
        Ok(order)
    }

    /// Closes an open position with an opposite market order.
    ///
    /// ### Arguments
    /// * `id` - The position to close.
    /// * `price` - Exit price; defaults to the last known price of the symbol, then to
    ///   the position's last mark.
    /// * `reason` - Recorded on the position.
    /// * `time` - Exit time.
    ///
    /// ### Returns
    /// The filled closing order. Unknown or already closed positions are rejected
    /// without any change, so a position can never be credited twice.
    pub fn close_position(
        &mut self,
        id: u64,
        price: Option<f64>,
        reason: CloseReason,
        time: DateTime<Utc>,
    ) -> Result<Order> {
        let position = self.wallet.position(id).ok_or(Error::PositionNotFound(id))?;
        if !position.is_open() {
            warn!(id, "close rejected: position already closed");
            return Err(Error::PositionClosed(id));
        }

        let exit_price = price
            .or_else(|| self.last_price(position.symbol()))
            .unwrap_or(position.current_price());
        if !exit_price.is_finite() || exit_price <= 0.0 {
            return Err(Error::InvalidPrice(exit_price));
        }

        let margin = position.margin();
        // losses cannot exceed the margin, and fees cannot exceed what is left of it
        let realized_pnl = position.estimate_pnl(exit_price).max(-margin);
        let exit_fee = (position.quantity() * exit_price * self.config.fee_rate()).min(margin + realized_pnl);
        let symbol = position.symbol().to_string();
        let side = match position.side() {
            PositionSide::Long => OrderSide::Sell,
            PositionSide::Short => OrderSide::Buy,
        };
        let quantity = position.quantity();
        let strategy_name = position.strategy_name().map(str::to_string);

        self.wallet.release(margin, realized_pnl, exit_fee)?;

        let order_id = self.wallet.next_id();
        let mut order = Order::new(order_id, &symbol, side, quantity, exit_price, time).with_strategy(strategy_name);
        order.fill(id, time)?;
        if let Some(position) = self.wallet.position_mut(id) {
            position.close(exit_price, realized_pnl, exit_fee, reason, time)?;
        }

        self.record_trade(
            &order,
            id,
            realized_pnl,
            exit_fee,
            time,
            format!("Close {quantity} {symbol} @ {exit_price} ({reason})"),
        );
        info!(
            id,
            %symbol,
            exit_price,
            pnl = realized_pnl,
            fee = exit_fee,
            %reason,
            available = self.wallet.available_balance(),
            "position closed"
        );

        self.wallet.push_order(order.clone());
        Ok(order)
    }

    /// Closes every open position whose stop-loss, take-profit or liquidation level is
    /// breached at its current mark. Stop-loss is checked first.
    pub fn check_exits(&mut self, time: DateTime<Utc>) -> Result<Vec<Order>> {
        let triggered = self
            .wallet
            .open_positions()
            .filter_map(|p| p.exit_trigger().map(|reason| (p.id(), p.current_price(), reason)))
            .collect::<Vec<_>>();

        triggered
            .into_iter()
            .map(|(id, price, reason)| self.close_position(id, Some(price), reason, time))
            .collect()
    }

    /// Closes every open position at its last known price.
    pub fn close_all(&mut self, reason: CloseReason, time: DateTime<Utc>) -> Result<Vec<Order>> {
        let ids = self.wallet.open_positions().map(Position::id).collect::<Vec<_>>();
        ids.into_iter().map(|id| self.close_position(id, None, reason, time)).collect()
    }

    /// Acts on a strategy signal with the default order size.
    ///
    /// BUY closes open shorts of the symbol and opens a long unless one is already open.
    /// SELL closes open longs and, with margin trading enabled, opens a short unless one
    /// is already open. NEUTRAL does nothing. A new position that cannot be afforded is
    /// skipped with a warning; the closing orders are still returned.
    pub fn execute_signal(&mut self, signal: &Signal, time: DateTime<Utc>) -> Result<Vec<Order>> {
        let (opening, closing) = match signal.kind {
            SignalType::Buy => (PositionSide::Long, PositionSide::Short),
            SignalType::Sell => (PositionSide::Short, PositionSide::Long),
            SignalType::Neutral => return Ok(Vec::new()),
        };
        if self.last_price(&signal.symbol).is_none() {
            self.update_price(&signal.symbol, signal.price, time)?;
        }

        let to_close = self
            .wallet
            .open_positions()
            .filter(|p| p.symbol() == signal.symbol && p.side() == closing)
            .map(Position::id)
            .collect::<Vec<_>>();
        let mut orders = to_close
            .into_iter()
            .map(|id| self.close_position(id, None, CloseReason::Signal, time))
            .collect::<Result<Vec<_>>>()?;

        let can_open = opening == PositionSide::Long || self.config.enable_margin_trading;
        if !can_open || self.open_position(&signal.symbol, opening).is_some() {
            debug!(symbol = %signal.symbol, %opening, "no new position for signal");
            return Ok(orders);
        }

        let side = match opening {
            PositionSide::Long => OrderSide::Buy,
            PositionSide::Short => OrderSide::Sell,
        };
        let request = MarketOrderRequest::new(
            &signal.symbol,
            side,
            OrderSize::PercentOfBalance(self.config.default_order_size_pct),
        )
        .strategy_name(&signal.strategy_name);

        match self.create_market_order(request, time) {
            Ok(order) => orders.push(order),
            Err(err) if err.is_recoverable() || matches!(err, Error::InvalidQuantity(_)) => {
                warn!(symbol = %signal.symbol, %err, "signal not acted on");
            }
            Err(err) => return Err(err),
        }
        Ok(orders)
    }

    /// Applies a partial configuration update once the merged result is valid.
    ///
    /// Changes apply to future operations; open positions keep their leverage and
    /// exit rules. A new `initial_capital` takes effect on [`Simulator::reset_wallet`].
    pub fn update_config(&mut self, update: ConfigUpdate) -> Result<()> {
        let merged = update.merge(&self.config);
        merged.validate()?;
        info!(?update, "configuration updated");
        self.config = merged;
        Ok(())
    }

    /// Discards every position, order and transaction and starts over with
    /// `initial_capital`.
    pub fn reset_wallet(&mut self) -> Result<()> {
        self.wallet.reset(self.config.initial_capital)?;
        info!(capital = self.config.initial_capital, "wallet reset");
        Ok(())
    }

    fn record_trade(
        &mut self,
        order: &Order,
        position_id: u64,
        pnl: f64,
        fee: f64,
        time: DateTime<Utc>,
        description: String,
    ) {
        let id = self.wallet.next_id();
        self.wallet.push_transaction(
            Transaction::new(id, TransactionType::Trade, pnl, time, description)
                .for_trade(order.symbol(), order.id(), position_id),
        );
        if fee > 0.0 {
            let id = self.wallet.next_id();
            self.wallet.push_transaction(
                Transaction::new(id, TransactionType::Fee, -fee, time, format!("Fee {fee:.8}"))
                    .for_trade(order.symbol(), order.id(), position_id),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{OrderStatus, PositionStatus};

    fn now() -> DateTime<Utc> {
        DateTime::default()
    }

    fn simulator(config: SimulationConfig) -> Simulator {
        let mut simulator = Simulator::new(config).unwrap();
        simulator.update_price("BTCUSDT", 100.0, now()).unwrap();
        simulator
    }

    fn buy(quantity: f64) -> MarketOrderRequest {
        MarketOrderRequest::new("BTCUSDT", OrderSide::Buy, OrderSize::Quantity(quantity))
    }

    fn assert_balanced(simulator: &Simulator) {
        let wallet = simulator.wallet();
        let expected = wallet.available_balance() + wallet.locked_balance() + wallet.unrealized_pnl();
        assert!((wallet.total_balance() - expected).abs() < 1e-9);
        assert!(wallet.available_balance() >= 0.0);
        assert!(wallet.is_consistent());
    }

    #[test]
    fn open_locks_margin_and_charges_fee() {
        let mut simulator = simulator(SimulationConfig::default());
        let order = simulator.create_market_order(buy(10.0), now()).unwrap();

        assert_eq!(order.status(), OrderStatus::Filled);
        assert_eq!(order.price(), 100.0);
        let wallet = simulator.wallet();
        assert_eq!(wallet.available_balance(), 8999.0);
        assert_eq!(wallet.locked_balance(), 1000.0);
        assert_eq!(wallet.total_fees(), 1.0);
        assert_eq!(wallet.transactions().len(), 2);
        assert_eq!(wallet.transactions()[1].amount(), -1.0);
        assert_eq!(wallet.position(order.linked_position_id().unwrap()).unwrap().margin(), 1000.0);
        assert_balanced(&simulator);
    }

    #[test]
    fn close_releases_margin_with_pnl() {
        let mut simulator = simulator(SimulationConfig::default());
        let order = simulator.create_market_order(buy(10.0), now()).unwrap();
        let id = order.linked_position_id().unwrap();
        simulator.update_config(ConfigUpdate { fee_pct: Some(0.0), ..Default::default() }).unwrap();

        let close = simulator.close_position(id, Some(110.0), CloseReason::Manual, now()).unwrap();
        assert_eq!(close.side(), OrderSide::Sell);
        assert_eq!(close.linked_position_id(), Some(id));

        let wallet = simulator.wallet();
        assert_eq!(wallet.available_balance(), 8999.0 + 1000.0 + 100.0);
        assert_eq!(wallet.locked_balance(), 0.0);
        assert_eq!(wallet.total_fees(), 1.0);
        assert_eq!(wallet.cumulative_pnl(), 100.0);
        let position = wallet.position(id).unwrap();
        assert_eq!(position.status(), PositionStatus::Closed);
        assert_eq!(position.exit_price(), Some(110.0));
        assert_eq!(position.pnl(), 100.0);
        assert_balanced(&simulator);
    }

    #[test]
    fn double_close_is_rejected() {
        let mut simulator = simulator(SimulationConfig::default());
        let id = simulator.create_market_order(buy(1.0), now()).unwrap().linked_position_id().unwrap();
        simulator.close_position(id, None, CloseReason::Manual, now()).unwrap();

        let before = simulator.snapshot();
        let result = simulator.close_position(id, Some(500.0), CloseReason::Manual, now());
        assert!(matches!(result, Err(Error::PositionClosed(_))));
        assert_eq!(simulator.available_balance(), before.available_balance());
        assert_eq!(simulator.transactions().len(), before.transactions().len());

        let result = simulator.close_position(999, None, CloseReason::Manual, now());
        assert!(matches!(result, Err(Error::PositionNotFound(999))));
    }

    #[test]
    fn rejected_order_leaves_wallet_untouched() {
        let mut simulator = simulator(SimulationConfig::default());
        let before = simulator.snapshot();

        let result = simulator.create_market_order(buy(100.0), now());
        assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
        assert!(matches!(simulator.create_market_order(buy(-1.0), now()), Err(Error::InvalidQuantity(_))));
        let unknown = MarketOrderRequest::new("ETHUSDT", OrderSide::Buy, OrderSize::Quantity(1.0));
        assert!(matches!(simulator.create_market_order(unknown, now()), Err(Error::NoPrice(_))));
        let short = MarketOrderRequest::new("BTCUSDT", OrderSide::Sell, OrderSize::Quantity(1.0));
        assert!(matches!(simulator.create_market_order(short, now()), Err(Error::ShortSellingDisabled)));

        assert_eq!(simulator.available_balance(), before.available_balance());
        assert_eq!(simulator.locked_balance(), 0.0);
        assert!(simulator.orders().is_empty());
        assert!(simulator.transactions().is_empty());

        // refused requests never show up as orders, only fills do
        simulator.create_market_order(buy(1.0), now()).unwrap();
        assert!(simulator.create_market_order(buy(1000.0), now()).is_err());
        assert_eq!(simulator.orders().len(), 1);
        assert!(simulator.orders().iter().all(|o| o.status() == OrderStatus::Filled));
    }

    #[test]
    fn full_balance_order_reserves_fee() {
        let mut simulator = simulator(SimulationConfig::default());
        let request = MarketOrderRequest::new("BTCUSDT", OrderSide::Buy, OrderSize::PercentOfBalance(100.0));
        simulator.create_market_order(request, now()).unwrap();

        assert!(simulator.available_balance() >= 0.0);
        assert!(simulator.available_balance() < 1e-6);
        assert_balanced(&simulator);
    }

    #[test]
    fn stop_loss_closes_on_tick() {
        let config = SimulationConfig { stop_loss_pct: 5.0, take_profit_pct: 10.0, ..Default::default() };
        let mut simulator = simulator(config);
        let id = simulator.create_market_order(buy(10.0), now()).unwrap().linked_position_id().unwrap();

        simulator.update_price("BTCUSDT", 96.0, now()).unwrap();
        assert!(simulator.check_exits(now()).unwrap().is_empty());
        assert_balanced(&simulator);

        simulator.update_price("BTCUSDT", 95.0, now()).unwrap();
        let orders = simulator.check_exits(now()).unwrap();
        assert_eq!(orders.len(), 1);
        let position = simulator.position(id).unwrap();
        assert_eq!(position.exit_reason(), Some(CloseReason::StopLoss));
        assert_eq!(position.exit_price(), Some(95.0));
        assert_balanced(&simulator);
    }

    #[test]
    fn leveraged_short_and_liquidation() {
        let config = SimulationConfig {
            enable_margin_trading: true,
            default_leverage_margin: 10.0,
            fee_pct: 0.0,
            ..Default::default()
        };
        let mut simulator = simulator(config);
        let short = MarketOrderRequest::new("BTCUSDT", OrderSide::Sell, OrderSize::Quantity(10.0));
        let id = simulator.create_market_order(short, now()).unwrap().linked_position_id().unwrap();
        assert_eq!(simulator.position(id).unwrap().side(), PositionSide::Short);

        simulator.update_price("BTCUSDT", 95.0, now()).unwrap();
        assert_eq!(simulator.unrealized_pnl(), 500.0);
        assert_balanced(&simulator);

        simulator.update_price("BTCUSDT", 111.0, now()).unwrap();
        simulator.check_exits(now()).unwrap();
        let position = simulator.position(id).unwrap();
        assert_eq!(position.exit_reason(), Some(CloseReason::Liquidation));
        assert_eq!(position.pnl(), -1000.0);
        assert_eq!(simulator.available_balance(), 9000.0);
        assert_balanced(&simulator);
    }

    #[test]
    fn deposit_and_withdraw() {
        let mut simulator = simulator(SimulationConfig::default());
        simulator.deposit(500.0, now()).unwrap();
        simulator.withdraw(200.0, now()).unwrap();
        assert_eq!(simulator.available_balance(), 10_300.0);
        assert_eq!(simulator.ledger_total(), 300.0);

        assert!(matches!(simulator.withdraw(20_000.0, now()), Err(Error::InsufficientBalance { .. })));
        assert!(matches!(simulator.deposit(0.0, now()), Err(Error::InvalidAmount(_))));
        assert_eq!(simulator.transactions().len(), 2);
        assert_balanced(&simulator);
    }

    #[test]
    fn signal_flow() {
        let config = SimulationConfig { fee_pct: 0.0, ..Default::default() };
        let mut simulator = simulator(config);
        let buy = Signal::neutral("BTCUSDT", 100.0, now(), "RSI").with_decision(SignalType::Buy, 80.0);

        assert_eq!(simulator.execute_signal(&buy, now()).unwrap().len(), 1);
        // already long
        assert!(simulator.execute_signal(&buy, now()).unwrap().is_empty());
        assert_eq!(simulator.open_positions().count(), 1);
        assert_eq!(simulator.locked_balance(), 1000.0);

        let sell = Signal::neutral("BTCUSDT", 100.0, now(), "RSI").with_decision(SignalType::Sell, 80.0);
        let orders = simulator.execute_signal(&sell, now()).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(simulator.open_positions().count(), 0);
        assert_eq!(simulator.positions()[0].exit_reason(), Some(CloseReason::Signal));
        assert_eq!(simulator.available_balance(), 10_000.0);
    }

    #[test]
    fn invalid_config_update_is_rejected() {
        let mut simulator = simulator(SimulationConfig::default());
        let result = simulator.update_config(ConfigUpdate { fee_pct: Some(-1.0), stop_loss_pct: Some(3.0), ..Default::default() });
        assert!(result.is_err());
        assert_eq!(simulator.config(), &SimulationConfig::default());
    }

    #[test]
    fn reset_and_restore() {
        let mut simulator = simulator(SimulationConfig::default());
        simulator.create_market_order(buy(5.0), now()).unwrap();

        let restored = Simulator::restore(simulator.config().clone(), simulator.snapshot()).unwrap();
        assert_eq!(restored.last_price("BTCUSDT"), Some(100.0));
        assert_eq!(restored.open_positions().count(), 1);

        simulator.update_config(ConfigUpdate { initial_capital: Some(500.0), ..Default::default() }).unwrap();
        simulator.reset_wallet().unwrap();
        assert_eq!(simulator.available_balance(), 500.0);
        assert!(simulator.positions().is_empty());
        assert!(simulator.transactions().is_empty());
    }
}
