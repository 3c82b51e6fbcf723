//! Strategy engine: turns a candle history into a directional [`Signal`].
//!
//! The set of strategies is closed and modeled as the [`Strategy`] enum. Each
//! variant checks it has enough history, computes its indicators over the whole
//! window and decides on the last two computed points. Confidence starts at
//! [`BASE_CONFIDENCE`] and grows with the strength of the trigger, capped at
//! `BASE_CONFIDENCE + MAX_CONFIDENCE_BONUS`.
//!
//! Several signals are merged with [`combine_signals`].

mod bollinger;
mod combine;
mod macd;
mod rsi;
mod trend_hunter;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::Candle;

pub use bollinger::*;
pub use combine::*;
pub use macd::*;
pub use rsi::*;
pub use trend_hunter::*;

/// Confidence of any triggered signal before its strength bonus.
pub const BASE_CONFIDENCE: f64 = 50.0;
/// Largest bonus added to [`BASE_CONFIDENCE`].
pub const MAX_CONFIDENCE_BONUS: f64 = 40.0;

/// Maps a non-negative trigger strength to a confidence in `[50, 90]`.
pub(crate) fn scaled_confidence(strength: f64, scale: f64) -> f64 {
    BASE_CONFIDENCE + (strength * scale).clamp(0.0, MAX_CONFIDENCE_BONUS)
}

/// Direction of a signal.
#[allow(missing_docs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignalType {
    Buy,
    Sell,
    #[default]
    Neutral,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// A strategy's recommendation for `symbol` at the last candle of its window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// BUY, SELL or NEUTRAL.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: SignalType,
    /// Evaluated symbol.
    pub symbol: String,
    /// Close of the last candle.
    pub price: f64,
    /// Time of the last candle.
    pub time: DateTime<Utc>,
    /// Name of the producing strategy, `Combined` for merged signals.
    pub strategy_name: String,
    /// In `[0, 100]`; `0` for neutral signals.
    pub confidence: f64,
    /// Indicator values behind the decision, for reports.
    pub metadata: BTreeMap<String, f64>,
}

impl Signal {
    /// Creates a neutral signal with zero confidence.
    pub fn neutral(symbol: impl Into<String>, price: f64, time: DateTime<Utc>, strategy_name: impl Into<String>) -> Self {
        Self {
            kind: SignalType::Neutral,
            symbol: symbol.into(),
            price,
            time,
            strategy_name: strategy_name.into(),
            confidence: 0.0,
            metadata: BTreeMap::new(),
        }
    }

    /// Neutral signal located at the last candle of `candles`, if any.
    pub(crate) fn neutral_at(candles: &[Candle], options: &AnalyzeOptions, strategy_name: &str) -> Self {
        let (price, time) = candles.last().map(|c| (c.close(), c.time())).unwrap_or_default();
        Self::neutral(&options.symbol, price, time, strategy_name)
    }

    /// Sets the direction and confidence.
    pub fn with_decision(mut self, kind: SignalType, confidence: f64) -> Self {
        self.kind = kind;
        self.confidence = if kind == SignalType::Neutral { 0.0 } else { confidence.clamp(0.0, 100.0) };
        self
    }

    /// Adds a metadata entry.
    pub fn with_meta(mut self, key: &str, value: f64) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Returns true for BUY and SELL signals.
    pub fn is_actionable(&self) -> bool {
        self.kind != SignalType::Neutral
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {:.2} ({:.1}%)",
            self.strategy_name, self.kind, self.symbol, self.price, self.confidence
        )
    }
}

/// Per-call options of [`Strategy::analyze`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzeOptions {
    /// Symbol reported in the produced signal.
    pub symbol: String,
}

impl AnalyzeOptions {
    /// Creates options for `symbol`.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into() }
    }
}

/// The available strategies.
///
/// ### Example
/// ```rust
/// use tradesim::prelude::*;
///
/// let strategy = Strategy::Rsi(RsiStrategy::default());
/// let signal = strategy.analyze(&[], &AnalyzeOptions::new("BTCUSDT"));
/// assert_eq!(signal.kind, SignalType::Neutral);
/// assert_eq!(signal.confidence, 0.0);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(tag = "type", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// RSI oversold/overbought reversal.
    Rsi(RsiStrategy),
    /// Bollinger band breach.
    Bollinger(BollingerStrategy),
    /// MACD histogram zero cross.
    Macd(MacdStrategy),
    /// EMA slope confirmed by a rising ADX.
    TrendHunter(TrendHunterStrategy),
}

impl Strategy {
    /// Evaluates the strategy over `candles`, oldest first.
    pub fn analyze(&self, candles: &[Candle], options: &AnalyzeOptions) -> Signal {
        if candles.len() < self.min_candles() {
            return Signal::neutral_at(candles, options, self.name());
        }
        let signal = match self {
            Self::Rsi(s) => s.analyze(candles, options),
            Self::Bollinger(s) => s.analyze(candles, options),
            Self::Macd(s) => s.analyze(candles, options),
            Self::TrendHunter(s) => s.analyze(candles, options),
        };
        tracing::debug!(strategy = self.name(), symbol = %signal.symbol, kind = %signal.kind, confidence = signal.confidence, "strategy evaluated");
        signal
    }

    /// Returns the strategy name reported in signals.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rsi(_) => RsiStrategy::NAME,
            Self::Bollinger(_) => BollingerStrategy::NAME,
            Self::Macd(_) => MacdStrategy::NAME,
            Self::TrendHunter(_) => TrendHunterStrategy::NAME,
        }
    }

    /// Returns the shortest history producing a decision.
    pub fn min_candles(&self) -> usize {
        match self {
            Self::Rsi(s) => s.min_candles(),
            Self::Bollinger(s) => s.min_candles(),
            Self::Macd(s) => s.min_candles(),
            Self::TrendHunter(s) => s.min_candles(),
        }
    }
}

impl From<RsiStrategy> for Strategy {
    fn from(value: RsiStrategy) -> Self {
        Self::Rsi(value)
    }
}

impl From<BollingerStrategy> for Strategy {
    fn from(value: BollingerStrategy) -> Self {
        Self::Bollinger(value)
    }
}

impl From<MacdStrategy> for Strategy {
    fn from(value: MacdStrategy) -> Self {
        Self::Macd(value)
    }
}

impl From<TrendHunterStrategy> for Strategy {
    fn from(value: TrendHunterStrategy) -> Self {
        Self::TrendHunter(value)
    }
}
