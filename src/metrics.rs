//! Performance metrics for backtesting.
//!
//! This module provides tools to calculate:
//! - Max drawdown of the equity curve
//! - Annualized Sharpe ratio from daily returns
//! - Profit factor
//! - Win rate, average win and average loss
//!
//! Trades are closed [`Position`]s and are judged on their P&L net of fees.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::PercentCalculus;
use crate::engine::Position;

/// Trading days per year used to annualize the Sharpe ratio.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One sample of the equity curve.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    /// Sample time.
    pub time: DateTime<Utc>,
    /// Total balance, open positions marked to market.
    pub equity: f64,
}

/// Computes the largest peak-to-trough decline of `curve` as a percentage.
///
/// The peak starts at `initial_balance`.
pub fn max_drawdown(curve: &[EquityPoint], initial_balance: f64) -> f64 {
    let mut peak = initial_balance;
    let mut max_drawdown = 0.0_f64;

    for point in curve {
        peak = peak.max(point.equity);
        if peak > 0.0 {
            max_drawdown = max_drawdown.max((peak - point.equity) / peak);
        }
    }

    max_drawdown * 100.0
}

/// Computes the annualized Sharpe ratio (risk-free rate 0) of `curve`.
///
/// Samples are bucketed by UTC day, keeping the last equity of each day. Returns are
/// taken between consecutive day closes, the first one against `initial_balance`.
/// Yields `0.0` with fewer than two returns or zero volatility.
pub fn sharpe_ratio(curve: &[EquityPoint], initial_balance: f64) -> f64 {
    let mut closes: Vec<(NaiveDate, f64)> = Vec::new();
    for point in curve {
        let day = point.time.date_naive();
        match closes.last_mut() {
            Some((last_day, equity)) if *last_day == day => *equity = point.equity,
            _ => closes.push((day, point.equity)),
        }
    }

    let mut previous = initial_balance;
    let mut returns = Vec::with_capacity(closes.len());
    for (_, equity) in closes {
        if previous > 0.0 {
            returns.push((equity - previous) / previous);
        }
        previous = equity;
    }

    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let std_dev = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }

    mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Computes gross profits over gross losses.
///
/// Infinite when there are profits and no losses, `0.0` without profits.
pub fn profit_factor(trades: &[Position]) -> f64 {
    let (gains, losses) = trades
        .iter()
        .filter_map(Position::net_pnl)
        .fold((0.0, 0.0), |(gains, losses), pnl| {
            if pnl > 0.0 { (gains + pnl, losses) } else { (gains, losses - pnl) }
        });

    if losses == 0.0 {
        return if gains > 0.0 { f64::INFINITY } else { 0.0 };
    }
    gains / losses
}

/// Computes the percentage of winning trades.
pub fn win_rate(trades: &[Position]) -> f64 {
    let pnls = trades.iter().filter_map(Position::net_pnl).collect::<Vec<_>>();
    if pnls.is_empty() {
        return 0.0;
    }
    pnls.iter().filter(|pnl| **pnl > 0.0).count() as f64 / pnls.len() as f64 * 100.0
}

/// Summary statistics of a backtest.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Capital at the start of the run.
    pub initial_balance: f64,
    /// Total balance at the end of the run.
    pub final_balance: f64,
    /// `final_balance - initial_balance`.
    pub profit_loss: f64,
    /// Profit or loss as a percentage of the initial balance.
    pub return_pct: f64,
    /// Fees paid over the run.
    pub total_fees: f64,
    /// Number of closed positions.
    pub total_trades: usize,
    /// Trades with a positive net P&L.
    pub winning_trades: usize,
    /// Trades with a zero or negative net P&L.
    pub losing_trades: usize,
    /// Winning trades as a percentage of all trades.
    pub win_rate: f64,
    /// Mean net P&L of winning trades.
    pub average_win: f64,
    /// Mean net P&L of losing trades (zero or negative).
    pub average_loss: f64,
    /// Gross profits over gross losses.
    pub profit_factor: f64,
    /// Largest peak-to-trough decline of the equity curve, in percent.
    pub max_drawdown: f64,
    /// Annualized Sharpe ratio of daily returns.
    pub sharpe_ratio: f64,
}

impl Metrics {
    /// Computes the statistics of a finished run.
    pub fn new(
        initial_balance: f64,
        final_balance: f64,
        total_fees: f64,
        trades: &[Position],
        equity_curve: &[EquityPoint],
    ) -> Self {
        let pnls = trades.iter().filter_map(Position::net_pnl).collect::<Vec<_>>();
        let (wins, losses): (Vec<f64>, Vec<f64>) = pnls.iter().partition(|pnl| **pnl > 0.0);
        let mean = |values: &[f64]| {
            if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 }
        };
        let profit_loss = final_balance - initial_balance;

        Self {
            initial_balance,
            final_balance,
            profit_loss,
            return_pct: initial_balance.change(final_balance),
            total_fees,
            total_trades: pnls.len(),
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate: win_rate(trades),
            average_win: mean(&wins),
            average_loss: mean(&losses),
            profit_factor: profit_factor(trades),
            max_drawdown: max_drawdown(equity_curve, initial_balance),
            sharpe_ratio: sharpe_ratio(equity_curve, initial_balance),
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Backtest Metrics ===")?;
        writeln!(f, "Initial Balance: {:.2}", self.initial_balance)?;
        writeln!(f, "Final Balance: {:.2}", self.final_balance)?;
        writeln!(f, "Profit & Loss (P&L): {:.2} ({:.2}%)", self.profit_loss, self.return_pct)?;
        writeln!(f, "Fees paid: {:.2}", self.total_fees)?;
        #[allow(clippy::writeln_empty_string)]
        writeln!(f, "")?;
        writeln!(
            f,
            "Trades: {} ({} won, {} lost)",
            self.total_trades, self.winning_trades, self.losing_trades
        )?;
        writeln!(f, "Win Rate: {:.2}%", self.win_rate)?;
        writeln!(f, "Average Win / Loss: {:.2} / {:.2}", self.average_win, self.average_loss)?;
        writeln!(f, "Profit Factor: {:.2}", self.profit_factor)?;
        writeln!(f, "Max Drawdown: {:.2}%", self.max_drawdown)?;
        write!(f, "Sharpe Ratio (risk-free rate = 0.0): {:.2}", self.sharpe_ratio)
    }
}

#[cfg(test)]
fn curve(equities: &[f64], hours_apart: i64) -> Vec<EquityPoint> {
    equities
        .iter()
        .enumerate()
        .map(|(i, equity)| EquityPoint {
            time: DateTime::<Utc>::default() + chrono::Duration::hours(i as i64 * hours_apart),
            equity: *equity,
        })
        .collect()
}

#[cfg(test)]
// Closes a one-unit long opened at 100 with the given net result and no fees.
fn closed_trade(pnl: f64) -> Position {
    use crate::prelude::*;

    let mut simulator = Simulator::new(SimulationConfig { fee_pct: 0.0, ..Default::default() }).unwrap();
    let now = DateTime::default();
    simulator.update_price("BTCUSDT", 100.0, now).unwrap();
    let order = simulator
        .create_market_order(MarketOrderRequest::new("BTCUSDT", OrderSide::Buy, OrderSize::Quantity(1.0)), now)
        .unwrap();
    let id = order.linked_position_id().unwrap();
    simulator.close_position(id, Some(100.0 + pnl), CloseReason::Manual, now).unwrap();
    simulator.position(id).unwrap().clone()
}

#[cfg(test)]
#[test]
fn max_drawdown_from_peak() {
    let curve = curve(&[10000.0, 12000.0, 9000.0, 11000.0], 1);
    assert_eq!(max_drawdown(&curve, 10000.0), 25.0); // (12000 - 9000) / 12000 = 25%
}

#[cfg(test)]
#[test]
fn max_drawdown_no_samples() {
    assert_eq!(max_drawdown(&[], 10000.0), 0.0);
}

#[cfg(test)]
#[test]
fn profit_factor_and_win_rate() {
    let trades = vec![closed_trade(20.0), closed_trade(-10.0)];
    assert_eq!(profit_factor(&trades), 2.0); // 20 / 10 = 2.0
    assert_eq!(win_rate(&trades), 50.0);

    let trades = vec![closed_trade(20.0)];
    assert_eq!(profit_factor(&trades), f64::INFINITY);
    assert_eq!(win_rate(&trades), 100.0);

    assert_eq!(profit_factor(&[]), 0.0);
    assert_eq!(win_rate(&[]), 0.0);
}

#[cfg(test)]
#[test]
fn sharpe_ratio_daily_buckets() {
    // intraday samples are collapsed to one close per day
    let curve = curve(&[10000.0, 10100.0, 10500.0, 10200.0, 10300.0, 10700.0], 12);
    let sharpe = sharpe_ratio(&curve, 10000.0);

    let returns: [f64; 3] = [10100.0 / 10000.0 - 1.0, 10200.0 / 10100.0 - 1.0, 10700.0 / 10200.0 - 1.0];
    let mean = returns.iter().sum::<f64>() / 3.0;
    let std = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 2.0).sqrt();
    assert!((sharpe - mean / std * 252.0_f64.sqrt()).abs() < 1e-9);
}

#[cfg(test)]
#[test]
fn sharpe_ratio_degenerate() {
    assert_eq!(sharpe_ratio(&[], 10000.0), 0.0);
    // one day only
    assert_eq!(sharpe_ratio(&curve(&[10000.0, 10500.0], 1), 10000.0), 0.0);
    // flat equity has no volatility
    assert_eq!(sharpe_ratio(&curve(&[10000.0; 5], 24), 10000.0), 0.0);
}

#[cfg(test)]
#[test]
fn metrics_report() {
    let trades = vec![closed_trade(20.0), closed_trade(-10.0)];
    let metrics = Metrics::new(10000.0, 10010.0, 0.0, &trades, &curve(&[10000.0, 10010.0], 1));

    assert_eq!(metrics.total_trades, 2);
    assert_eq!(metrics.winning_trades, 1);
    assert_eq!(metrics.average_win, 20.0);
    assert_eq!(metrics.average_loss, -10.0);
    assert_eq!(metrics.profit_loss, 10.0);
    assert!(metrics.to_string().starts_with("=== Backtest Metrics ==="));
}
