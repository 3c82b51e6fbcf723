use std::time::Duration;

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::strategy::Strategy;

/// Simulation settings shared by backtests, paper trading and manual trading.
///
/// Percentages are expressed in percent (`0.1` means 0.1%).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Capital of a fresh wallet.
    pub initial_capital: f64,
    /// Fee charged on the traded value, on entry and on exit.
    pub fee_pct: f64,
    /// Share of the available balance committed by signal-driven orders.
    pub default_order_size_pct: f64,
    /// Leverage applied when margin trading is enabled and the order requests none.
    pub default_leverage_margin: f64,
    /// Allows leverage above 1 and short positions.
    pub enable_margin_trading: bool,
    /// Default stop-loss; `0` disables it.
    pub stop_loss_pct: f64,
    /// Default take-profit; `0` disables it.
    pub take_profit_pct: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            fee_pct: 0.1,
            default_order_size_pct: 10.0,
            default_leverage_margin: 1.0,
            enable_margin_trading: false,
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
        }
    }
}

impl SimulationConfig {
    /// Checks every option is within its accepted range.
    pub fn validate(&self) -> Result<()> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(Error::NegZeroBalance(self.initial_capital));
        }
        if !(0.0..100.0).contains(&self.fee_pct) {
            return Err(Error::InvalidConfig(format!("fee_pct must be in [0, 100), got {}", self.fee_pct)));
        }
        if !(self.default_order_size_pct > 0.0 && self.default_order_size_pct <= 100.0) {
            return Err(Error::InvalidConfig(format!(
                "default_order_size_pct must be in (0, 100], got {}",
                self.default_order_size_pct
            )));
        }
        if !self.default_leverage_margin.is_finite() || self.default_leverage_margin < 1.0 {
            return Err(Error::InvalidLeverage(self.default_leverage_margin));
        }
        for (name, value) in [("stop_loss_pct", self.stop_loss_pct), ("take_profit_pct", self.take_profit_pct)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must be >= 0, got {value}")));
            }
        }
        Ok(())
    }

    /// Resolves the leverage of a new position.
    ///
    /// Without margin trading every position runs at leverage 1 whatever was requested.
    pub fn effective_leverage(&self, requested: Option<f64>) -> Result<f64> {
        if !self.enable_margin_trading {
            return Ok(1.0);
        }
        let leverage = requested.unwrap_or(self.default_leverage_margin);
        if !leverage.is_finite() || leverage < 1.0 {
            return Err(Error::InvalidLeverage(leverage));
        }
        Ok(leverage)
    }

    /// Returns the fee rate as a fraction.
    pub fn fee_rate(&self) -> f64 {
        self.fee_pct / 100.0
    }
}

/// Partial update of a [`SimulationConfig`]; `None` fields are left untouched.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(missing_docs)]
pub struct ConfigUpdate {
    pub initial_capital: Option<f64>,
    pub fee_pct: Option<f64>,
    pub default_order_size_pct: Option<f64>,
    pub default_leverage_margin: Option<f64>,
    pub enable_margin_trading: Option<bool>,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
}

impl ConfigUpdate {
    /// Returns `base` with the provided fields overridden.
    pub fn merge(&self, base: &SimulationConfig) -> SimulationConfig {
        SimulationConfig {
            initial_capital: self.initial_capital.unwrap_or(base.initial_capital),
            fee_pct: self.fee_pct.unwrap_or(base.fee_pct),
            default_order_size_pct: self.default_order_size_pct.unwrap_or(base.default_order_size_pct),
            default_leverage_margin: self.default_leverage_margin.unwrap_or(base.default_leverage_margin),
            enable_margin_trading: self.enable_margin_trading.unwrap_or(base.enable_margin_trading),
            stop_loss_pct: self.stop_loss_pct.unwrap_or(base.stop_loss_pct),
            take_profit_pct: self.take_profit_pct.unwrap_or(base.take_profit_pct),
        }
    }
}

/// Settings of one backtest run.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Traded symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Candle interval label understood by the feed (`1m`, `1h`, `1d`...).
    pub interval: String,
    /// First candle time requested from the feed.
    pub start_time: Option<DateTime<Utc>>,
    /// Last candle time requested from the feed.
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of candles fetched from the feed.
    pub limit: usize,
    /// Candles required before strategies are evaluated.
    pub lookback: usize,
    /// Strategies evaluated on every candle once `lookback` is reached.
    pub strategies: Vec<Strategy>,
    /// Weights each vote by its confidence when combining signals.
    pub weight_by_confidence: bool,
    /// Combined signals below this confidence are not traded.
    pub min_confidence: f64,
    /// Wallet and order settings.
    pub simulation: SimulationConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: "1h".to_string(),
            start_time: None,
            end_time: None,
            limit: 500,
            lookback: 50,
            strategies: Vec::new(),
            weight_by_confidence: true,
            min_confidence: 0.0,
            simulation: SimulationConfig::default(),
        }
    }
}

impl BacktestConfig {
    /// Validates the run settings and the embedded simulation config.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(Error::InvalidConfig("symbol must not be empty".into()));
        }
        if self.lookback == 0 || self.limit == 0 {
            return Err(Error::InvalidConfig("lookback and limit must be > 0".into()));
        }
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(Error::InvalidConfig(format!(
                "min_confidence must be in [0, 100], got {}",
                self.min_confidence
            )));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time)
            && start > end
        {
            return Err(Error::InvalidConfig("start_time is after end_time".into()));
        }
        self.simulation.validate()
    }
}

/// Settings of a paper trading session.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct PaperTradingConfig {
    /// Symbols watched and traded.
    pub symbols: Vec<String>,
    /// Candle interval fetched for strategy evaluation.
    pub interval: String,
    /// Number of candles fetched per evaluation.
    pub lookback: usize,
    /// Strategies combined on every evaluation tick.
    pub strategies: Vec<Strategy>,
    /// Weights each vote by its confidence when combining signals.
    pub weight_by_confidence: bool,
    /// Signals below this confidence are ignored.
    pub min_confidence: f64,
    /// Cadence of the price refresh task, in seconds.
    pub price_refresh_secs: u64,
    /// Cadence of the evaluation task, in seconds.
    pub evaluation_secs: u64,
}

impl Default for PaperTradingConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string()],
            interval: "1m".to_string(),
            lookback: 100,
            strategies: Vec::new(),
            weight_by_confidence: true,
            min_confidence: 70.0,
            price_refresh_secs: 10,
            evaluation_secs: 60,
        }
    }
}

impl PaperTradingConfig {
    /// Validates the session settings.
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() || self.symbols.iter().any(String::is_empty) {
            return Err(Error::InvalidConfig("at least one non-empty symbol is required".into()));
        }
        if self.lookback == 0 {
            return Err(Error::InvalidConfig("lookback must be > 0".into()));
        }
        if self.price_refresh_secs == 0 || self.evaluation_secs == 0 {
            return Err(Error::InvalidConfig("task intervals must be > 0".into()));
        }
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(Error::InvalidConfig(format!(
                "min_confidence must be in [0, 100], got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }

    /// Returns the cadence of the price refresh task.
    pub fn price_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.price_refresh_secs)
    }

    /// Returns the cadence of the evaluation task.
    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs(self.evaluation_secs)
    }
}
