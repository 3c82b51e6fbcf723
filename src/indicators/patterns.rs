use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::Candle;

/// Body no larger than this share of the range is a doji.
pub const DOJI_BODY_RATIO: f64 = 0.1;
/// Minimum wick to body ratio for hammers and shooting stars.
pub const LONG_WICK_RATIO: f64 = 2.0;

/// Recognized candle patterns.
#[allow(missing_docs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandlePattern {
    Doji,
    Hammer,
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Doji => "doji",
            Self::Hammer => "hammer",
            Self::ShootingStar => "shooting star",
            Self::BullishEngulfing => "bullish engulfing",
            Self::BearishEngulfing => "bearish engulfing",
        };
        write!(f, "{label}")
    }
}

/// A pattern found at `index` in the candle slice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    /// Index of the (last) candle of the pattern.
    pub index: usize,
    /// The recognized pattern.
    pub pattern: CandlePattern,
}

/// Classifies a single candle from its body and wick ratios.
///
/// Doji takes precedence over hammer and shooting star.
pub fn classify_candle(candle: &Candle) -> Option<CandlePattern> {
    let range = candle.range();
    if range <= 0.0 {
        return None;
    }
    let body = candle.body();
    if body <= DOJI_BODY_RATIO * range {
        return Some(CandlePattern::Doji);
    }

    let (upper, lower) = (candle.upper_wick(), candle.lower_wick());
    if lower >= LONG_WICK_RATIO * body && upper <= body {
        Some(CandlePattern::Hammer)
    } else if upper >= LONG_WICK_RATIO * body && lower <= body {
        Some(CandlePattern::ShootingStar)
    } else {
        None
    }
}

/// Detects a two-candle engulfing pattern ending at `curr`.
pub fn engulfing(prev: &Candle, curr: &Candle) -> Option<CandlePattern> {
    if curr.body() <= prev.body() {
        return None;
    }
    if prev.is_bearish() && curr.is_bullish() && curr.open() <= prev.close() && curr.close() >= prev.open() {
        Some(CandlePattern::BullishEngulfing)
    } else if prev.is_bullish() && curr.is_bearish() && curr.open() >= prev.close() && curr.close() <= prev.open() {
        Some(CandlePattern::BearishEngulfing)
    } else {
        None
    }
}

/// Scans `candles` and returns every pattern found, ordered by index.
pub fn detect_patterns(candles: &[Candle]) -> Vec<PatternMatch> {
    let mut matches = Vec::new();
    for (index, candle) in candles.iter().enumerate() {
        if let Some(pattern) = classify_candle(candle) {
            matches.push(PatternMatch { index, pattern });
        }
        if index > 0
            && let Some(pattern) = engulfing(&candles[index - 1], candle)
        {
            matches.push(PatternMatch { index, pattern });
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CandleBuilder;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        CandleBuilder::builder().open(open).high(high).low(low).close(close).build().unwrap()
    }

    #[test]
    fn single_candle_patterns() {
        assert_eq!(classify_candle(&candle(100.0, 105.0, 95.0, 100.5)), Some(CandlePattern::Doji));
        assert_eq!(classify_candle(&candle(100.0, 102.5, 90.0, 102.0)), Some(CandlePattern::Hammer));
        assert_eq!(classify_candle(&candle(100.0, 110.0, 97.5, 98.0)), Some(CandlePattern::ShootingStar));
        assert_eq!(classify_candle(&candle(100.0, 110.0, 90.0, 108.0)), None);
        assert_eq!(classify_candle(&candle(100.0, 100.0, 100.0, 100.0)), None);
    }

    #[test]
    fn engulfing_patterns() {
        let bearish = candle(105.0, 106.0, 99.0, 100.0);
        let bullish = candle(99.0, 108.0, 98.0, 107.0);
        assert_eq!(engulfing(&bearish, &bullish), Some(CandlePattern::BullishEngulfing));

        let bullish = candle(100.0, 106.0, 99.0, 105.0);
        let bearish = candle(106.0, 107.0, 97.0, 98.0);
        assert_eq!(engulfing(&bullish, &bearish), Some(CandlePattern::BearishEngulfing));
        assert_eq!(engulfing(&bearish, &bullish), None);
    }

    #[test]
    fn detection_is_reproducible() {
        let candles = vec![
            candle(105.0, 106.0, 99.0, 100.0),
            candle(99.0, 108.0, 98.0, 107.0),
            candle(107.0, 110.0, 104.0, 107.2),
        ];
        let found = detect_patterns(&candles);
        assert_eq!(
            found,
            vec![
                PatternMatch { index: 1, pattern: CandlePattern::BullishEngulfing },
                PatternMatch { index: 2, pattern: CandlePattern::Doji },
            ]
        );
        assert_eq!(found, detect_patterns(&candles));
    }
}
