#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{AnalyzeOptions, Signal, SignalType, scaled_confidence};
use crate::engine::Candle;
use crate::indicators::{bollinger, closes};

/// Confidence points per percent of band width the close moved past the band.
pub const BOLLINGER_CONFIDENCE_SCALE: f64 = 1.0;

/// Buys a close crossing below the lower band, sells a close crossing above the upper band.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerStrategy {
    /// Moving average period.
    pub period: usize,
    /// Band width in standard deviations.
    pub std_dev: f64,
}

impl Default for BollingerStrategy {
    fn default() -> Self {
        Self { period: 20, std_dev: 2.0 }
    }
}

impl BollingerStrategy {
    /// Name reported in signals.
    pub const NAME: &'static str = "Bollinger";

    /// Two band points are needed.
    pub fn min_candles(&self) -> usize {
        self.period + 1
    }

    pub(crate) fn analyze(&self, candles: &[Candle], options: &AnalyzeOptions) -> Signal {
        let signal = Signal::neutral_at(candles, options, Self::NAME);
        let closes = closes(candles);
        let bands = bollinger(&closes, self.period, self.std_dev);
        let (&[.., prev_close, curr_close], true) = (&closes[..], bands.len() >= 2) else {
            return signal;
        };
        let last = bands.len() - 1;
        let (upper, middle, lower) = (bands.upper[last], bands.middle[last], bands.lower[last]);
        let (prev_upper, prev_lower) = (bands.upper[last - 1], bands.lower[last - 1]);
        let width = upper - lower;

        let signal = signal
            .with_meta("upper", upper)
            .with_meta("middle", middle)
            .with_meta("lower", lower);

        let penetration = |distance: f64| if width > 0.0 { distance / width * 100.0 } else { 0.0 };

        if prev_close > prev_lower && curr_close <= lower {
            let confidence = scaled_confidence(penetration(lower - curr_close), BOLLINGER_CONFIDENCE_SCALE);
            signal.with_decision(SignalType::Buy, confidence)
        } else if prev_close < prev_upper && curr_close >= upper {
            let confidence = scaled_confidence(penetration(curr_close - upper), BOLLINGER_CONFIDENCE_SCALE);
            signal.with_decision(SignalType::Sell, confidence)
        } else {
            signal
        }
    }
}
