//! Backtest mode: replays a historical candle window once against a fresh wallet.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::BacktestConfig;
use crate::engine::{Candle, CloseReason, Position, Simulator};
use crate::errors::{Error, Result};
use crate::feed::MarketFeed;
use crate::metrics::{EquityPoint, Metrics};
use crate::strategy::{AnalyzeOptions, CombineOptions, Signal, evaluate_strategies};

/// Report of one backtest run.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct BacktestResult {
    /// Traded symbol.
    pub symbol: String,
    /// Every position of the run, all closed.
    pub trades: Vec<Position>,
    /// Total balance sampled after every candle.
    pub equity_curve: Vec<EquityPoint>,
    /// Signals that passed the confidence filter and were handed to the simulator.
    pub signals: Vec<Signal>,
    /// Derived statistics.
    pub metrics: Metrics,
}

impl fmt::Display for BacktestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Symbol: {}", self.symbol)?;
        writeln!(f, "Candles: {}, signals acted on: {}", self.equity_curve.len(), self.signals.len())?;
        write!(f, "{}", self.metrics)
    }
}

/// Replays candles through the configured strategies and a [`Simulator`].
///
/// At every candle the backtest:
/// 1. marks open positions to the close price,
/// 2. closes positions breaching their stop-loss, take-profit or liquidation level,
/// 3. once `lookback` candles are available, evaluates every strategy over the history
///    so far and acts on the resulting signal if it is confident enough (except on the
///    last candle),
/// 4. samples the equity curve.
///
/// Open positions are closed at the last candle with [`CloseReason::EndOfTest`].
#[derive(Debug)]
pub struct Backtest {
    config: BacktestConfig,
    simulator: Simulator,
}

impl Backtest {
    /// Creates a backtest with a fresh wallet of `config.simulation.initial_capital`.
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        let simulator = Simulator::new(config.simulation.clone())?;
        Ok(Self { config, simulator })
    }

    /// Returns the run settings.
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Returns the simulator, e.g. to inspect the ledger after a run.
    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Runs the backtest over `candles`, oldest first.
    ///
    /// Each call starts over from the initial capital.
    ///
    /// ### Arguments
    /// * `candles` - The historical window.
    ///
    /// ### Returns
    /// The run report, or [`Error::CandleDataEmpty`] when `candles` is empty.
    ///
    /// ### Example
    /// ```rust
    /// use chrono::{DateTime, Duration, Utc};
    /// use tradesim::prelude::*;
    ///
    /// let candles = (0..10)
    ///     .map(|i| {
    ///         CandleBuilder::builder()
    ///             .time(DateTime::<Utc>::default() + Duration::hours(i))
    ///             .open(100.0)
    ///             .high(101.0)
    ///             .low(99.0)
    ///             .close(100.0)
    ///             .volume(1.0)
    ///             .build()
    ///             .unwrap()
    ///     })
    ///     .collect::<Vec<_>>();
    ///
    /// let mut backtest = Backtest::new(BacktestConfig::default()).unwrap();
    /// let result = backtest.run(&candles).unwrap();
    /// assert_eq!(result.metrics.total_trades, 0);
    /// assert_eq!(result.metrics.profit_loss, 0.0);
    /// ```
    pub fn run(&mut self, candles: &[Candle]) -> Result<BacktestResult> {
        if candles.is_empty() {
            return Err(Error::CandleDataEmpty);
        }
        self.simulator.reset_wallet()?;

        let symbol = self.config.symbol.clone();
        let options = AnalyzeOptions::new(&symbol);
        let combine = CombineOptions {
            weight_by_confidence: self.config.weight_by_confidence,
        };
        let mut equity_curve = Vec::with_capacity(candles.len());
        let mut signals = Vec::new();

        info!(
            %symbol,
            candles = candles.len(),
            strategies = self.config.strategies.len(),
            lookback = self.config.lookback,
            "backtest started"
        );

        for (i, candle) in candles.iter().enumerate() {
            let time = candle.time();
            let is_last = i + 1 == candles.len();
            self.simulator.update_price(&symbol, candle.close(), time)?;
            self.simulator.check_exits(time)?;

            // a position opened on the last candle would only pay two fees
            if !is_last
                && i + 1 >= self.config.lookback
                && let Some(signal) = evaluate_strategies(
                    &self.config.strategies,
                    &candles[..=i],
                    &options,
                    combine,
                    self.config.min_confidence,
                )
            {
                self.simulator.execute_signal(&signal, time)?;
                signals.push(signal);
            }

            if is_last {
                self.simulator.close_all(CloseReason::EndOfTest, time)?;
            }

            equity_curve.push(EquityPoint {
                time,
                equity: self.simulator.total_balance(),
            });
        }

        let wallet = self.simulator.wallet();
        let trades = wallet.positions().to_vec();
        let metrics = Metrics::new(
            wallet.initial_balance(),
            wallet.total_balance(),
            wallet.total_fees(),
            &trades,
            &equity_curve,
        );
        info!(
            %symbol,
            trades = metrics.total_trades,
            profit_loss = metrics.profit_loss,
            max_drawdown = metrics.max_drawdown,
            "backtest finished"
        );

        Ok(BacktestResult {
            symbol,
            trades,
            equity_curve,
            signals,
            metrics,
        })
    }
}

/// Fetches the configured window from `feed` and runs a [`Backtest`] over it.
pub async fn run_backtest(feed: &dyn MarketFeed, config: BacktestConfig) -> Result<BacktestResult> {
    config.validate()?;
    let candles = feed
        .get_klines(&config.symbol, &config.interval, config.limit, config.start_time, config.end_time)
        .await?;
    Backtest::new(config)?.run(&candles)
}
