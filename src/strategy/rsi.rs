#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{AnalyzeOptions, Signal, SignalType, scaled_confidence};
use crate::engine::Candle;
use crate::indicators::{closes, rsi};

/// Confidence points per RSI point beyond the threshold.
pub const RSI_CONFIDENCE_SCALE: f64 = 2.0;

/// Buys an oversold RSI turning up, sells an overbought RSI turning down.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct RsiStrategy {
    /// RSI period.
    pub period: usize,
    /// RSI level under which the market is oversold.
    pub oversold: f64,
    /// RSI level above which the market is overbought.
    pub overbought: f64,
}

impl Default for RsiStrategy {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl RsiStrategy {
    /// Name reported in signals.
    pub const NAME: &'static str = "RSI";

    /// Two RSI points are needed.
    pub fn min_candles(&self) -> usize {
        self.period + 2
    }

    pub(crate) fn analyze(&self, candles: &[Candle], options: &AnalyzeOptions) -> Signal {
        let signal = Signal::neutral_at(candles, options, Self::NAME);
        let values = rsi(&closes(candles), self.period);
        let [.., prev, curr] = values[..] else {
            return signal;
        };
        let signal = signal.with_meta("rsi", curr).with_meta("prev_rsi", prev);

        if curr < self.oversold && curr > prev {
            let confidence = scaled_confidence(self.oversold - curr, RSI_CONFIDENCE_SCALE);
            signal.with_decision(SignalType::Buy, confidence)
        } else if curr > self.overbought && curr < prev {
            let confidence = scaled_confidence(curr - self.overbought, RSI_CONFIDENCE_SCALE);
            signal.with_decision(SignalType::Sell, confidence)
        } else {
            signal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{Strategy, fixtures::candles};

    fn options() -> AnalyzeOptions {
        AnalyzeOptions::new("BTCUSDT")
    }

    #[test]
    fn buy_on_oversold_bounce() {
        let mut closes = (0..20).map(|i| 200.0 - i as f64 * 5.0).collect::<Vec<_>>();
        closes.push(106.0);
        let signal = Strategy::from(RsiStrategy::default()).analyze(&candles(&closes), &options());

        assert_eq!(signal.kind, SignalType::Buy);
        assert!(signal.confidence > 50.0 && signal.confidence <= 90.0);
        assert!(signal.metadata["rsi"] < 30.0);
        assert_eq!(signal.price, 106.0);
    }

    #[test]
    fn sell_on_overbought_pullback() {
        let mut closes = (0..20).map(|i| 100.0 + i as f64 * 5.0).collect::<Vec<_>>();
        closes.push(190.0);
        let signal = Strategy::from(RsiStrategy::default()).analyze(&candles(&closes), &options());

        assert_eq!(signal.kind, SignalType::Sell);
        assert!(signal.confidence > 50.0);
    }

    #[test]
    fn falling_without_bounce_is_neutral() {
        let closes = (0..25).map(|i| 200.0 - i as f64 * 5.0).collect::<Vec<_>>();
        let signal = Strategy::from(RsiStrategy::default()).analyze(&candles(&closes), &options());
        assert_eq!(signal.kind, SignalType::Neutral);
        assert_eq!(signal.confidence, 0.0);
    }

    #[test]
    fn deeper_oversold_is_more_confident() {
        let strategy = RsiStrategy { oversold: 12.0, ..Default::default() };
        let mut mild = (0..20).map(|i| 200.0 - i as f64 * 5.0).collect::<Vec<_>>();
        mild.push(110.0);
        let mut deep = (0..20).map(|i| 200.0 - i as f64 * 5.0).collect::<Vec<_>>();
        deep.push(106.0);

        let mild = strategy.analyze(&candles(&mild), &options());
        let deep = strategy.analyze(&candles(&deep), &options());
        assert_eq!(mild.kind, SignalType::Buy);
        assert_eq!(deep.kind, SignalType::Buy);
        assert!(deep.metadata["rsi"] < mild.metadata["rsi"]);
        assert!(deep.confidence > mild.confidence);
    }
}
