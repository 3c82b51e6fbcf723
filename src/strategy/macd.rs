#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{AnalyzeOptions, Signal, SignalType, scaled_confidence};
use crate::engine::Candle;
use crate::indicators::{closes, macd};

/// Confidence points per percent of price separating the MACD and signal lines.
pub const MACD_CONFIDENCE_SCALE: f64 = 100.0;

/// Trades the MACD histogram crossing zero.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct MacdStrategy {
    /// Fast EMA period.
    pub fast: usize,
    /// Slow EMA period.
    pub slow: usize,
    /// Signal line EMA period.
    pub signal: usize,
}

impl Default for MacdStrategy {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl MacdStrategy {
    /// Name reported in signals.
    pub const NAME: &'static str = "MACD";

    /// Two histogram points are needed.
    pub fn min_candles(&self) -> usize {
        self.slow + self.signal
    }

    pub(crate) fn analyze(&self, candles: &[Candle], options: &AnalyzeOptions) -> Signal {
        let signal = Signal::neutral_at(candles, options, Self::NAME);
        let output = macd(&closes(candles), self.fast, self.slow, self.signal);
        let (&[.., prev_hist, curr_hist], Some(&line), Some(&signal_line)) =
            (&output.histogram[..], output.macd.last(), output.signal.last())
        else {
            return signal;
        };

        let signal = signal
            .with_meta("macd", line)
            .with_meta("signal", signal_line)
            .with_meta("histogram", curr_hist);
        let strength = if signal.price > 0.0 { (line - signal_line).abs() / signal.price * 100.0 } else { 0.0 };

        if prev_hist <= 0.0 && curr_hist > 0.0 {
            signal.with_decision(SignalType::Buy, scaled_confidence(strength, MACD_CONFIDENCE_SCALE))
        } else if prev_hist >= 0.0 && curr_hist < 0.0 {
            signal.with_decision(SignalType::Sell, scaled_confidence(strength, MACD_CONFIDENCE_SCALE))
        } else {
            signal
        }
    }
}
