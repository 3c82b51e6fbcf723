use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// One OHLCV bar for a fixed period, opened at `time`.
///
/// Candles are immutable once built; use [`CandleBuilder`] to construct a validated one.
/// Deserialization goes through the same checks.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(try_from = "CandleFields"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Candle {
    /// Returns the period start time.
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Returns the open price.
    pub fn open(&self) -> f64 {
        self.open
    }

    /// Returns the highest price of the period.
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Returns the lowest price of the period.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Returns the close price.
    pub fn close(&self) -> f64 {
        self.close
    }

    /// Returns the traded volume.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Returns the absolute size of the candle body.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Returns the full high-low range.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Returns the wick above the body.
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Returns the wick below the body.
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Returns true if the candle closed above its open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Returns true if the candle closed below its open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct CandleFields {
    time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<CandleFields> for Candle {
    type Error = Error;

    fn try_from(fields: CandleFields) -> Result<Self> {
        CandleBuilder::builder()
            .time(fields.time)
            .open(fields.open)
            .high(fields.high)
            .low(fields.low)
            .close(fields.close)
            .volume(fields.volume)
            .build()
    }
}

/// Builder for [`Candle`] that validates the OHLC relationship on `build`.
#[derive(Debug, Default)]
pub struct CandleBuilder {
    time: Option<DateTime<Utc>>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

impl CandleBuilder {
    /// Starts a new builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Sets the period start time.
    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Sets the open price.
    pub fn open(mut self, open: f64) -> Self {
        self.open = Some(open);
        self
    }

    /// Sets the high price.
    pub fn high(mut self, high: f64) -> Self {
        self.high = Some(high);
        self
    }

    /// Sets the low price.
    pub fn low(mut self, low: f64) -> Self {
        self.low = Some(low);
        self
    }

    /// Sets the close price.
    pub fn close(mut self, close: f64) -> Self {
        self.close = Some(close);
        self
    }

    /// Sets the volume. Defaults to zero.
    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Builds the candle.
    ///
    /// ### Returns
    /// The candle, or [`Error::InvalidCandle`] when a price is missing, not finite,
    /// or when open/close fall outside the high-low range.
    pub fn build(self) -> Result<Candle> {
        let open = self.open.ok_or_else(|| Error::InvalidCandle("missing open".into()))?;
        let high = self.high.ok_or_else(|| Error::InvalidCandle("missing high".into()))?;
        let low = self.low.ok_or_else(|| Error::InvalidCandle("missing low".into()))?;
        let close = self.close.ok_or_else(|| Error::InvalidCandle("missing close".into()))?;
        let volume = self.volume.unwrap_or(0.0);

        if [open, high, low, close, volume].iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidCandle("non-finite value".into()));
        }
        if low <= 0.0 {
            return Err(Error::InvalidCandle(format!("low must be positive (got {low})")));
        }
        if high < low {
            return Err(Error::InvalidCandle(format!("high {high} < low {low}")));
        }
        if open > high || open < low || close > high || close < low {
            return Err(Error::InvalidCandle(format!(
                "open {open} / close {close} outside range [{low}, {high}]"
            )));
        }
        if volume < 0.0 {
            return Err(Error::InvalidCandle(format!("negative volume {volume}")));
        }

        Ok(Candle {
            time: self.time.unwrap_or_default(),
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

#[cfg(test)]
#[test]
fn build_valid_candle() {
    let candle = CandleBuilder::builder()
        .open(100.0)
        .high(110.0)
        .low(95.0)
        .close(105.0)
        .volume(3.0)
        .build()
        .unwrap();

    assert_eq!(candle.body(), 5.0);
    assert_eq!(candle.range(), 15.0);
    assert_eq!(candle.upper_wick(), 5.0);
    assert_eq!(candle.lower_wick(), 5.0);
    assert!(candle.is_bullish());
    assert_eq!(candle.time(), DateTime::<Utc>::default());
}

#[cfg(test)]
#[test]
fn reject_inconsistent_candle() {
    let result = CandleBuilder::builder().open(100.0).high(90.0).low(95.0).close(92.0).build();
    assert!(matches!(result, Err(Error::InvalidCandle(_))));

    let result = CandleBuilder::builder().open(120.0).high(110.0).low(95.0).close(100.0).build();
    assert!(matches!(result, Err(Error::InvalidCandle(_))));

    let result = CandleBuilder::builder().open(f64::NAN).high(110.0).low(95.0).close(100.0).build();
    assert!(matches!(result, Err(Error::InvalidCandle(_))));

    let result = CandleBuilder::builder().high(110.0).low(95.0).close(100.0).build();
    assert!(matches!(result, Err(Error::InvalidCandle(_))));
}

#[cfg(all(test, feature = "serde"))]
#[test]
fn deserialize_validates_candle() {
    let valid = r#"{"time":"2024-01-01T00:00:00Z","open":100.0,"high":110.0,"low":95.0,"close":105.0,"volume":3.0}"#;
    let candle: Candle = serde_json::from_str(valid).unwrap();
    assert_eq!(candle.close(), 105.0);
    assert_eq!(serde_json::from_str::<Candle>(&serde_json::to_string(&candle).unwrap()).unwrap(), candle);

    let inverted = r#"{"time":"2024-01-01T00:00:00Z","open":100.0,"high":90.0,"low":95.0,"close":92.0}"#;
    let err = serde_json::from_str::<Candle>(inverted).unwrap_err();
    assert!(err.to_string().contains("high 90 < low 95"));
}
