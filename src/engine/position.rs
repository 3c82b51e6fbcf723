use std::fmt;

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::PercentCalculus;
use crate::errors::{Error, Result};

/// Direction of the exposure.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionSide {
    /// Profits when the price rises.
    Long,
    /// Profits when the price falls.
    Short,
}

impl PositionSide {
    /// Returns `1.0` for long and `-1.0` for short.
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// `Open -> Closed`; closing is terminal.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    /// Marked to market on every price update.
    Open,
    /// Exit price, time and reason are set.
    Closed,
}

/// Why a position was closed.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// Loss reached the stop-loss percentage.
    StopLoss,
    /// Gain reached the take-profit percentage.
    TakeProfit,
    /// An opposing signal.
    Signal,
    /// Explicit close request.
    Manual,
    /// Forced close on the last candle of a backtest.
    EndOfTest,
    /// Loss reached the whole margin.
    Liquidation,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StopLoss => "STOP_LOSS",
            Self::TakeProfit => "TAKE_PROFIT",
            Self::Signal => "SIGNAL",
            Self::Manual => "MANUAL",
            Self::EndOfTest => "END_OF_TEST",
            Self::Liquidation => "LIQUIDATION",
        };
        write!(f, "{label}")
    }
}

/// A simulated market exposure owned by the wallet.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Position {
    id: u64,
    symbol: String,
    side: PositionSide,
    entry_price: f64,
    current_price: f64,
    quantity: f64,
    leverage: f64,
    margin: f64,
    stop_loss_pct: Option<f64>,
    take_profit_pct: Option<f64>,
    pnl: f64,
    pnl_pct: f64,
    status: PositionStatus,
    entry_time: DateTime<Utc>,
    exit_time: Option<DateTime<Utc>>,
    exit_price: Option<f64>,
    exit_reason: Option<CloseReason>,
    fees: f64,
    strategy_name: Option<String>,
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Opening parameters, grouped to keep [`Position::open`] readable.
#[derive(Debug, Clone)]
pub(crate) struct PositionEntry {
    pub id: u64,
    pub symbol: String,
    pub side: PositionSide,
    pub entry_price: f64,
    pub quantity: f64,
    pub leverage: f64,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub entry_fee: f64,
    pub time: DateTime<Utc>,
    pub strategy_name: Option<String>,
}

impl Position {
    pub(crate) fn open(entry: PositionEntry) -> Self {
        Self {
            id: entry.id,
            symbol: entry.symbol,
            side: entry.side,
            entry_price: entry.entry_price,
            current_price: entry.entry_price,
            quantity: entry.quantity,
            leverage: entry.leverage,
            margin: entry.quantity * entry.entry_price,
            stop_loss_pct: entry.stop_loss_pct.filter(|pct| *pct > 0.0),
            take_profit_pct: entry.take_profit_pct.filter(|pct| *pct > 0.0),
            pnl: 0.0,
            pnl_pct: 0.0,
            status: PositionStatus::Open,
            entry_time: entry.time,
            exit_time: None,
            exit_price: None,
            exit_reason: None,
            fees: entry.entry_fee,
            strategy_name: entry.strategy_name,
        }
    }

    /// Profit or loss if the position were closed at `price`, before exit fees.
    pub fn estimate_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity * self.leverage * self.side.sign()
    }

    /// Marks the position to `price`. Closed positions are left untouched.
    pub(crate) fn mark(&mut self, price: f64) {
        if self.status == PositionStatus::Closed {
            return;
        }
        self.current_price = price;
        self.pnl = self.estimate_pnl(price);
        self.pnl_pct = self.pnl.percent_of(self.margin);
    }

    /// Returns the exit rule breached at the current mark, stop-loss first.
    pub fn exit_trigger(&self) -> Option<CloseReason> {
        if self.status == PositionStatus::Closed {
            return None;
        }
        if let Some(stop_loss) = self.stop_loss_pct
            && self.pnl_pct <= -stop_loss
        {
            return Some(CloseReason::StopLoss);
        }
        if let Some(take_profit) = self.take_profit_pct
            && self.pnl_pct >= take_profit
        {
            return Some(CloseReason::TakeProfit);
        }
        if self.pnl <= -self.margin {
            return Some(CloseReason::Liquidation);
        }
        None
    }

    /// Closes the position exactly once.
    pub(crate) fn close(
        &mut self,
        exit_price: f64,
        realized_pnl: f64,
        exit_fee: f64,
        reason: CloseReason,
        time: DateTime<Utc>,
    ) -> Result<()> {
        if self.status == PositionStatus::Closed {
            return Err(Error::PositionClosed(self.id));
        }
        self.status = PositionStatus::Closed;
        self.current_price = exit_price;
        self.exit_price = Some(exit_price);
        self.exit_time = Some(time);
        self.exit_reason = Some(reason);
        self.pnl = realized_pnl;
        self.pnl_pct = realized_pnl.percent_of(self.margin);
        self.fees += exit_fee;
        Ok(())
    }

    /// Unrealized profit or loss; zero once closed.
    pub fn unrealized_pnl(&self) -> f64 {
        match self.status {
            PositionStatus::Open => self.pnl,
            PositionStatus::Closed => 0.0,
        }
    }

    /// Realized profit net of entry and exit fees; `None` while open.
    pub fn net_pnl(&self) -> Option<f64> {
        match self.status {
            PositionStatus::Open => None,
            PositionStatus::Closed => Some(self.pnl - self.fees),
        }
    }

    /// Returns true while the position is open.
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Returns the position id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the side.
    pub fn side(&self) -> PositionSide {
        self.side
    }

    /// Returns the entry price.
    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    /// Returns the last marked price (the exit price once closed).
    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    /// Returns the quantity.
    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Returns the leverage.
    pub fn leverage(&self) -> f64 {
        self.leverage
    }

    /// Returns the capital locked against the position.
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Returns the stop-loss percentage, if any.
    pub fn stop_loss_pct(&self) -> Option<f64> {
        self.stop_loss_pct
    }

    /// Returns the take-profit percentage, if any.
    pub fn take_profit_pct(&self) -> Option<f64> {
        self.take_profit_pct
    }

    /// Returns the profit or loss, unrealized while open and realized once closed.
    pub fn pnl(&self) -> f64 {
        self.pnl
    }

    /// Returns the profit or loss as a percentage of the margin.
    pub fn pnl_pct(&self) -> f64 {
        self.pnl_pct
    }

    /// Returns the status.
    pub fn status(&self) -> PositionStatus {
        self.status
    }

    /// Returns the entry time.
    pub fn entry_time(&self) -> DateTime<Utc> {
        self.entry_time
    }

    /// Returns the exit time.
    pub fn exit_time(&self) -> Option<DateTime<Utc>> {
        self.exit_time
    }

    /// Returns the exit price.
    pub fn exit_price(&self) -> Option<f64> {
        self.exit_price
    }

    /// Returns why the position was closed.
    pub fn exit_reason(&self) -> Option<CloseReason> {
        self.exit_reason
    }

    /// Returns the fees paid on entry and exit.
    pub fn fees(&self) -> f64 {
        self.fees
    }

    /// Returns the strategy that opened the position, if any.
    pub fn strategy_name(&self) -> Option<&str> {
        self.strategy_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(side: PositionSide, leverage: f64, stop_loss: Option<f64>, take_profit: Option<f64>) -> Position {
        Position::open(PositionEntry {
            id: 1,
            symbol: "BTCUSDT".into(),
            side,
            entry_price: 100.0,
            quantity: 10.0,
            leverage,
            stop_loss_pct: stop_loss,
            take_profit_pct: take_profit,
            entry_fee: 1.0,
            time: DateTime::default(),
            strategy_name: None,
        })
    }

    #[test]
    fn long_and_short_pnl() {
        let long = position(PositionSide::Long, 1.0, None, None);
        assert_eq!(long.margin(), 1000.0);
        assert_eq!(long.estimate_pnl(110.0), 100.0);
        assert_eq!(long.estimate_pnl(90.0), -100.0);

        let short = position(PositionSide::Short, 2.0, None, None);
        assert_eq!(short.estimate_pnl(90.0), 200.0);
        assert_eq!(short.estimate_pnl(110.0), -200.0);
    }

    #[test]
    fn mark_updates_pnl_pct() {
        let mut long = position(PositionSide::Long, 1.0, None, None);
        long.mark(105.0);
        assert_eq!(long.current_price(), 105.0);
        assert_eq!(long.pnl(), 50.0);
        assert_eq!(long.pnl_pct(), 5.0);
        assert_eq!(long.unrealized_pnl(), 50.0);
    }

    #[test]
    fn stop_loss_wins_over_take_profit() {
        // a negative take-profit makes both rules true at once
        let mut long = position(PositionSide::Long, 1.0, Some(5.0), Some(5.0));
        long.take_profit_pct = Some(-10.0);
        long.mark(95.0);
        assert_eq!(long.exit_trigger(), Some(CloseReason::StopLoss));
    }

    #[test]
    fn exit_triggers() {
        let mut long = position(PositionSide::Long, 1.0, Some(5.0), Some(10.0));
        long.mark(96.0);
        assert_eq!(long.exit_trigger(), None);
        long.mark(95.0);
        assert_eq!(long.exit_trigger(), Some(CloseReason::StopLoss));
        long.mark(110.0);
        assert_eq!(long.exit_trigger(), Some(CloseReason::TakeProfit));

        let mut leveraged = position(PositionSide::Long, 10.0, None, None);
        leveraged.mark(90.0);
        assert_eq!(leveraged.exit_trigger(), Some(CloseReason::Liquidation));
    }

    #[test]
    fn close_once() {
        let mut long = position(PositionSide::Long, 1.0, None, None);
        long.close(110.0, 100.0, 1.1, CloseReason::Manual, DateTime::default()).unwrap();

        assert!(!long.is_open());
        assert_eq!(long.exit_price(), Some(110.0));
        assert_eq!(long.exit_reason(), Some(CloseReason::Manual));
        assert_eq!(long.fees(), 2.1);
        assert_eq!(long.unrealized_pnl(), 0.0);
        assert_eq!(long.net_pnl(), Some(97.9));

        let result = long.close(120.0, 200.0, 0.0, CloseReason::Manual, DateTime::default());
        assert!(matches!(result, Err(Error::PositionClosed(1))));
        assert_eq!(long.exit_price(), Some(110.0));
        assert_eq!(long.exit_trigger(), None);
    }
}
