#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{AnalyzeOptions, Signal, SignalType, scaled_confidence};
use crate::engine::Candle;
use crate::indicators::{adx, closes, ema};

/// Confidence points per ADX point above the threshold.
pub const TREND_CONFIDENCE_SCALE: f64 = 2.0;

/// Follows the EMA slope when ADX confirms a strong, strengthening trend.
///
/// BUY needs a rising EMA, a close above it, `+DI > -DI` and an ADX at or
/// above the threshold that is not falling. SELL mirrors it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct TrendHunterStrategy {
    /// Trend EMA period.
    pub ema_period: usize,
    /// ADX period.
    pub adx_period: usize,
    /// Minimum ADX for a trend.
    pub adx_threshold: f64,
}

impl Default for TrendHunterStrategy {
    fn default() -> Self {
        Self {
            ema_period: 20,
            adx_period: 14,
            adx_threshold: 25.0,
        }
    }
}

impl TrendHunterStrategy {
    /// Name reported in signals.
    pub const NAME: &'static str = "TrendHunter";

    /// Two EMA and two ADX points are needed.
    pub fn min_candles(&self) -> usize {
        (self.ema_period + 1).max(2 * self.adx_period + 1)
    }

    pub(crate) fn analyze(&self, candles: &[Candle], options: &AnalyzeOptions) -> Signal {
        let signal = Signal::neutral_at(candles, options, Self::NAME);
        let trend = ema(&closes(candles), self.ema_period);
        let strength = adx(candles, self.adx_period);
        let (&[.., prev_ema, curr_ema], &[.., prev_adx, curr_adx], Some(&plus_di), Some(&minus_di)) =
            (&trend[..], &strength.adx[..], strength.plus_di.last(), strength.minus_di.last())
        else {
            return signal;
        };

        let close = signal.price;
        let signal = signal
            .with_meta("ema", curr_ema)
            .with_meta("adx", curr_adx)
            .with_meta("plus_di", plus_di)
            .with_meta("minus_di", minus_di);

        let trending = curr_adx >= self.adx_threshold && curr_adx >= prev_adx;
        if !trending {
            return signal;
        }
        let confidence = scaled_confidence(curr_adx - self.adx_threshold, TREND_CONFIDENCE_SCALE);

        if curr_ema > prev_ema && close > curr_ema && plus_di > minus_di {
            signal.with_decision(SignalType::Buy, confidence)
        } else if curr_ema < prev_ema && close < curr_ema && minus_di > plus_di {
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

    fn ranging() -> Vec<f64> {
        (0..30).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect()
    }

    #[test]
    fn buy_in_confirmed_uptrend() {
        let mut closes = ranging();
        closes.extend((1..=30).map(|i| 101.0 + i as f64 * 2.0));
        let signal = Strategy::from(TrendHunterStrategy::default())
            .analyze(&candles(&closes), &AnalyzeOptions::new("SOLUSDT"));

        assert_eq!(signal.kind, SignalType::Buy);
        assert!(signal.metadata["adx"] >= 25.0);
        assert!(signal.confidence > 50.0 && signal.confidence <= 90.0);
    }

    #[test]
    fn sell_in_confirmed_downtrend() {
        let mut closes = ranging();
        closes.extend((1..=30).map(|i| 100.0 - i as f64 * 2.0));
        let signal = Strategy::from(TrendHunterStrategy::default())
            .analyze(&candles(&closes), &AnalyzeOptions::new("SOLUSDT"));

        assert_eq!(signal.kind, SignalType::Sell);
        assert!(signal.metadata["minus_di"] > signal.metadata["plus_di"]);
    }

    #[test]
    fn ranging_market_is_neutral() {
        let signal = Strategy::from(TrendHunterStrategy::default())
            .analyze(&candles(&ranging()), &AnalyzeOptions::new("SOLUSDT"));
        assert_eq!(signal.kind, SignalType::Neutral);
        assert!(signal.metadata["adx"] < 25.0);
    }
}
