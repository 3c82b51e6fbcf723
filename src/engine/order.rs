use std::fmt;

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Represents the side of an order (buy or sell).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderSide {
    /// Opens a long or closes a short.
    Buy,
    /// Opens a short or closes a long.
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Execution type of an order. The simulator only fills at market.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderKind {
    /// Filled immediately at the last known price.
    #[default]
    Market,
}

/// Lifecycle of an order. `Filled`, `Canceled` and `Rejected` are terminal.
///
/// Market orders fill atomically, so the simulator only ever records `Filled` orders.
/// A request it refuses is returned as an [`Error`] and never recorded; `Canceled`
/// and `Rejected` exist for orders restored from or exchanged with other systems.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// Created, not yet filled.
    New,
    /// Executed at its price.
    Filled,
    /// Withdrawn before execution.
    Canceled,
    /// Refused before execution.
    Rejected,
}

impl OrderStatus {
    /// Returns true when no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::New)
    }
}

/// How much to trade when opening a position.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderSize {
    /// A fixed quantity of the base asset.
    Quantity(f64),
    /// A percentage (0-100] of the available balance, entry fee included.
    PercentOfBalance(f64),
}

/// Parameters of a market order that opens a position.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketOrderRequest {
    /// Traded symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// `Buy` opens a long, `Sell` a short.
    pub side: OrderSide,
    /// Quantity or share of the available balance.
    pub size: OrderSize,
    /// Requested leverage; `None` uses the configured default.
    pub leverage: Option<f64>,
    /// Stop-loss as a loss percentage of the margin; `None` uses the configured default.
    pub stop_loss_pct: Option<f64>,
    /// Take-profit as a gain percentage of the margin; `None` uses the configured default.
    pub take_profit_pct: Option<f64>,
    /// Strategy that produced the order, if any.
    pub strategy_name: Option<String>,
}

impl MarketOrderRequest {
    /// Creates a request using the configured leverage and exit rules.
    pub fn new(symbol: impl Into<String>, side: OrderSide, size: OrderSize) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            leverage: None,
            stop_loss_pct: None,
            take_profit_pct: None,
            strategy_name: None,
        }
    }

    /// Sets the leverage.
    pub fn leverage(mut self, leverage: f64) -> Self {
        self.leverage = Some(leverage);
        self
    }

    /// Sets the stop-loss percentage.
    pub fn stop_loss_pct(mut self, pct: f64) -> Self {
        self.stop_loss_pct = Some(pct);
        self
    }

    /// Sets the take-profit percentage.
    pub fn take_profit_pct(mut self, pct: f64) -> Self {
        self.take_profit_pct = Some(pct);
        self
    }

    /// Tags the order with the strategy that produced it.
    pub fn strategy_name(mut self, name: impl Into<String>) -> Self {
        self.strategy_name = Some(name.into());
        self
    }
}

/// A market order recorded in the wallet.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Order {
    id: u64,
    symbol: String,
    side: OrderSide,
    kind: OrderKind,
    quantity: f64,
    price: f64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    linked_position_id: Option<u64>,
    strategy_name: Option<String>,
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Order {
    pub(crate) fn new(
        id: u64,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: f64,
        price: f64,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            side,
            kind: OrderKind::Market,
            quantity,
            price,
            status: OrderStatus::New,
            created_at: time,
            updated_at: time,
            linked_position_id: None,
            strategy_name: None,
        }
    }

    pub(crate) fn with_strategy(mut self, strategy_name: Option<String>) -> Self {
        self.strategy_name = strategy_name;
        self
    }

    /// Moves the order to `status`. Terminal orders cannot change anymore.
    pub(crate) fn transition(&mut self, status: OrderStatus, time: DateTime<Utc>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::OrderFinalized(self.id));
        }
        self.status = status;
        self.updated_at = time;
        Ok(())
    }

    /// Fills the order and links it to the position it opened or closed.
    pub(crate) fn fill(&mut self, position_id: u64, time: DateTime<Utc>) -> Result<()> {
        self.transition(OrderStatus::Filled, time)?;
        self.linked_position_id = Some(position_id);
        Ok(())
    }

    /// Returns the order id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the traded symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the side.
    pub fn side(&self) -> OrderSide {
        self.side
    }

    /// Returns the execution type.
    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    /// Returns the quantity.
    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Returns the execution price.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Returns the quantity multiplied by the execution price.
    pub fn value(&self) -> f64 {
        self.quantity * self.price
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the time of the last status change.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the position this order opened or closed.
    pub fn linked_position_id(&self) -> Option<u64> {
        self.linked_position_id
    }

    /// Returns the strategy that requested the order, if any.
    pub fn strategy_name(&self) -> Option<&str> {
        self.strategy_name.as_deref()
    }
}

#[cfg(test)]
#[test]
fn create_simple_order() {
    let order = Order::new(1, "BTCUSDT", OrderSide::Buy, 2.0, 100.0, DateTime::default());

    assert_eq!(order.price(), 100.0);
    assert_eq!(order.quantity(), 2.0);
    assert_eq!(order.value(), 200.0);
    assert_eq!(order.status(), OrderStatus::New);
    assert_eq!(order.kind(), OrderKind::Market);
    assert!(order.linked_position_id().is_none());
}

#[cfg(test)]
#[test]
fn fill_is_terminal() {
    let mut order = Order::new(1, "BTCUSDT", OrderSide::Sell, 1.0, 100.0, DateTime::default());
    order.fill(7, DateTime::default()).unwrap();

    assert_eq!(order.status(), OrderStatus::Filled);
    assert_eq!(order.linked_position_id(), Some(7));
    assert!(order.transition(OrderStatus::Canceled, DateTime::default()).is_err());
    assert!(order.fill(8, DateTime::default()).is_err());
    assert_eq!(order.linked_position_id(), Some(7));
}

#[cfg(test)]
#[test]
fn order_equality() {
    let order1 = Order::new(1, "BTCUSDT", OrderSide::Buy, 1.0, 100.0, DateTime::default());
    let order2 = Order::new(2, "BTCUSDT", OrderSide::Buy, 1.0, 100.0, DateTime::default());
    assert_ne!(order1, order2);
    assert_eq!(order1, order1.clone());
}

#[cfg(test)]
#[test]
fn request_builder() {
    let request = MarketOrderRequest::new("ETHUSDT", OrderSide::Sell, OrderSize::PercentOfBalance(25.0))
        .leverage(3.0)
        .stop_loss_pct(5.0)
        .take_profit_pct(10.0)
        .strategy_name("MACD");

    assert_eq!(request.leverage, Some(3.0));
    assert_eq!(request.stop_loss_pct, Some(5.0));
    assert_eq!(request.take_profit_pct, Some(10.0));
    assert_eq!(request.strategy_name.as_deref(), Some("MACD"));
    assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
}
