//! # tradesim: simulated crypto trading
//!
//! **tradesim** computes technical indicators over OHLCV candles, turns them into trading
//! signals with pluggable strategies, and replays or live-simulates those signals against a
//! virtual wallet with fees, leverage, stop-loss and take-profit.
//!
//! ## Core Components
//! | Component   | Description                                                                   |
//! |-------------|-------------------------------------------------------------------------------|
//! | **`indicators`** | Pure functions: SMA, EMA, RSI, Bollinger, MACD, ADX/DI, Stochastic, crossovers, candle patterns. |
//! | **`Strategy`** | RSI, Bollinger, MACD and TrendHunter strategies emitting a [`strategy::Signal`]. |
//! | **`combine_signals`** | Merges several signals into one with a confidence-weighted vote. |
//! | **`Simulator`** | The only mutator of a [`engine::Wallet`]: orders, positions, fees and ledger. |
//! | **`Backtest`** | Replays a candle window once and produces a [`backtest::BacktestResult`]. |
//! | **`PaperTrader`** | Applies live prices and signals from a [`feed::MarketFeed`] on two periodic tasks. |
//! | **`Metrics`** | Win rate, average win/loss, max drawdown, Sharpe ratio and profit factor. |
//!
//! ## Accounting
//! | Quantity | Formula |
//! |----------|---------|
//! | Margin | `quantity × entry price` |
//! | Entry fee | `margin × fee_pct / 100` |
//! | P&L | `(price − entry) × quantity × leverage`, negated for shorts |
//! | P&L % | `pnl / margin × 100` |
//! | Total balance | `available + locked + unrealized P&L` |
//!
//! Leverage above 1 and short selling require `enable_margin_trading`. A leveraged position
//! whose loss reaches its margin is liquidated, so the available balance never goes negative.
//!
//! ## Getting Started
//! ```rust
//! use chrono::{DateTime, Duration, Utc};
//! use tradesim::prelude::*;
//!
//! // a steady fall followed by a bounce
//! let mut closes = (0..20).map(|i| 200.0 - i as f64 * 5.0).collect::<Vec<_>>();
//! closes.extend([106.0, 110.0, 115.0]);
//!
//! let candles = closes
//!     .iter()
//!     .enumerate()
//!     .map(|(i, close)| {
//!         CandleBuilder::builder()
//!             .time(DateTime::<Utc>::default() + Duration::hours(i as i64))
//!             .open(*close)
//!             .high(close * 1.01)
//!             .low(close * 0.99)
//!             .close(*close)
//!             .build()
//!     })
//!     .collect::<Result<Vec<_>>>()
//!     .unwrap();
//!
//! let config = BacktestConfig {
//!     lookback: 16,
//!     strategies: vec![RsiStrategy::default().into()],
//!     ..Default::default()
//! };
//! let result = Backtest::new(config).unwrap().run(&candles).unwrap();
//!
//! assert_eq!(result.metrics.total_trades, 1);
//! println!("{result}");
//! ```
//!
//! ### Output:
//! ```bash
//! Symbol: BTCUSDT
//! Candles: 23, signals acted on: ...
//! === Backtest Metrics ===
//! Initial Balance: 10000.00
//! ...
//! ```
//!
//! ## Error Handling
//! Rejected operations return an [`errors::Error`] and leave the wallet untouched:
//! - Insufficient balance.
//! - Unknown or already closed positions.
//! - Invalid prices, quantities, leverage or configuration.
//!
//! Upstream feed failures are logged with `tracing` and retried on the next tick.
#![warn(missing_docs)]

/// Backtest mode.
pub mod backtest;

/// Simulation, backtest and paper trading settings.
pub mod config;

/// Core trading engine components: candles, orders, positions, wallet and simulator.
pub mod engine;

/// Error types for the library.
pub mod errors;

/// Market data boundary.
pub mod feed;

/// Technical indicators.
pub mod indicators;

/// Performance metrics: drawdown, Sharpe ratio, win rate, etc.
pub mod metrics;

/// Paper trading mode.
pub mod paper;

/// Trading strategies and signal combination.
pub mod strategy;

/// JSON loading and wallet persistence.
#[cfg(feature = "serde")]
pub mod utils;

/// Re-exports of commonly used types and traits for convenience.
pub mod prelude {
    pub use super::*;
    pub use crate::backtest::*;
    pub use crate::config::*;
    pub use crate::engine::*;
    pub use crate::errors::*;
    pub use crate::feed::*;
    pub use crate::metrics::*;
    pub use crate::paper::*;
    pub use crate::strategy::*;

    #[cfg(feature = "serde")]
    pub use crate::utils::*;
}

/// Percentage helpers for balances and prices. Percentages are in percent (`10.0` is 10%).
pub trait PercentCalculus {
    /// Returns `percent` % of the value.
    ///
    /// ### Example
    /// ```rust
    /// use tradesim::PercentCalculus;
    ///
    /// assert_eq!(10_000.0_f64.how_many(10.0), 1000.0);
    /// ```
    fn how_many(self, percent: Self) -> Self;

    /// Expresses the value as a percentage of `whole`; `0` when `whole` is zero.
    fn percent_of(self, whole: Self) -> Self;

    /// Returns the percentage change from the value to `new`; `0` from zero.
    fn change(self, new: Self) -> Self;
}

impl PercentCalculus for f64 {
    fn how_many(self, percent: Self) -> Self {
        self * percent / 100.0
    }

    fn percent_of(self, whole: Self) -> Self {
        if whole == 0.0 { 0.0 } else { self * 100.0 / whole }
    }

    fn change(self, new: Self) -> Self {
        (new - self).percent_of(self)
    }
}
