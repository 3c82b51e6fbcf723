#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{AnalyzeOptions, Signal, SignalType, Strategy};
use crate::engine::Candle;

/// A winning score must be strictly above this to produce BUY or SELL.
pub const COMBINE_THRESHOLD: f64 = 60.0;

/// Name of merged signals.
pub const COMBINED_STRATEGY_NAME: &str = "Combined";

/// Options of [`combine_signals`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombineOptions {
    /// Weights each vote by its confidence instead of counting votes.
    pub weight_by_confidence: bool,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            weight_by_confidence: true,
        }
    }
}

/// Merges several strategy signals into one.
///
/// With `n` signals, the weighted buy score is `sum(confidence of BUY) / n` and the
/// uniform one `count(BUY) / n * 100`; the sell score is computed the same way.
/// The result is BUY (resp. SELL) with the winning score as confidence only when that
/// score is strictly greater than the other one and than [`COMBINE_THRESHOLD`].
/// Anything else, ties included, is NEUTRAL. Both scores are kept in the metadata.
///
/// ### Example
/// ```rust
/// use chrono::Utc;
/// use tradesim::prelude::*;
///
/// let buy = Signal::neutral("BTCUSDT", 100.0, Utc::now(), "RSI").with_decision(SignalType::Buy, 90.0);
/// let combined = combine_signals(&[buy], CombineOptions::default());
/// assert_eq!(combined.kind, SignalType::Buy);
/// assert_eq!(combined.confidence, 90.0);
/// ```
pub fn combine_signals(signals: &[Signal], options: CombineOptions) -> Signal {
    let Some(first) = signals.first() else {
        return Signal::neutral("", 0.0, Default::default(), COMBINED_STRATEGY_NAME);
    };
    let time = signals.iter().map(|s| s.time).max().unwrap_or(first.time);
    let combined = Signal::neutral(&first.symbol, first.price, time, COMBINED_STRATEGY_NAME);

    let n = signals.len() as f64;
    let score = |kind: SignalType| {
        let votes = signals.iter().filter(|s| s.kind == kind);
        if options.weight_by_confidence {
            votes.map(|s| s.confidence).sum::<f64>() / n
        } else {
            votes.count() as f64 / n * 100.0
        }
    };
    let (buy_score, sell_score) = (score(SignalType::Buy), score(SignalType::Sell));

    let combined = combined
        .with_meta("buy_score", buy_score)
        .with_meta("sell_score", sell_score)
        .with_meta("signals", n);

    if buy_score > sell_score && buy_score > COMBINE_THRESHOLD {
        combined.with_decision(SignalType::Buy, buy_score)
    } else if sell_score > buy_score && sell_score > COMBINE_THRESHOLD {
        combined.with_decision(SignalType::Sell, sell_score)
    } else {
        combined
    }
}

/// Evaluates `strategies` over `candles` and returns the signal to act on, if any.
///
/// A single strategy is used as is, several are merged with [`combine_signals`].
/// NEUTRAL results and signals under `min_confidence` yield `None`.
pub fn evaluate_strategies(
    strategies: &[Strategy],
    candles: &[Candle],
    options: &AnalyzeOptions,
    combine: CombineOptions,
    min_confidence: f64,
) -> Option<Signal> {
    let signal = match strategies {
        [] => return None,
        [strategy] => strategy.analyze(candles, options),
        strategies => {
            let signals = strategies.iter().map(|s| s.analyze(candles, options)).collect::<Vec<_>>();
            combine_signals(&signals, combine)
        }
    };

    if !signal.is_actionable() {
        return None;
    }
    if signal.confidence < min_confidence {
        tracing::debug!(%signal, min_confidence, "signal below confidence threshold");
        return None;
    }
    Some(signal)
}
