#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::tail;
use crate::engine::Candle;

/// Average directional index with its directional indicators, all aligned.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adx {
    /// Wilder-smoothed DX.
    pub adx: Vec<f64>,
    /// Positive directional indicator (+DI).
    pub plus_di: Vec<f64>,
    /// Negative directional indicator (-DI).
    pub minus_di: Vec<f64>,
}

impl Adx {
    /// Returns the number of points.
    pub fn len(&self) -> usize {
        self.adx.len()
    }

    /// Returns true when the input was too short.
    pub fn is_empty(&self) -> bool {
        self.adx.is_empty()
    }
}

/// ADX and +DI/-DI with Wilder smoothing over `period` candles.
///
/// Needs at least `2 * period` candles. Flat windows, where true range or
/// `+DI + -DI` is zero, produce 0 instead of dividing by zero.
pub fn adx(candles: &[Candle], period: usize) -> Adx {
    if period == 0 || candles.len() < 2 * period {
        return Adx::default();
    }

    let mut true_range = Vec::with_capacity(candles.len() - 1);
    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);

    for w in candles.windows(2) {
        let (prev, curr) = (&w[0], &w[1]);
        true_range.push(
            curr.range()
                .max((curr.high() - prev.close()).abs())
                .max((curr.low() - prev.close()).abs()),
        );

        let up = curr.high() - prev.high();
        let down = prev.low() - curr.low();
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
    }

    let smoothed_tr = wilder_sum(&true_range, period);
    let smoothed_plus = wilder_sum(&plus_dm, period);
    let smoothed_minus = wilder_sum(&minus_dm, period);

    let mut plus_di = Vec::with_capacity(smoothed_tr.len());
    let mut minus_di = Vec::with_capacity(smoothed_tr.len());
    let mut dx = Vec::with_capacity(smoothed_tr.len());

    for ((tr, plus), minus) in smoothed_tr.iter().zip(&smoothed_plus).zip(&smoothed_minus) {
        let (p, m) = if *tr > 0.0 {
            (100.0 * plus / tr, 100.0 * minus / tr)
        } else {
            (0.0, 0.0)
        };
        plus_di.push(p);
        minus_di.push(m);
        dx.push(if p + m > 0.0 { 100.0 * (p - m).abs() / (p + m) } else { 0.0 });
    }

    let period_f = period as f64;
    let mut prev = dx[..period].iter().sum::<f64>() / period_f;
    let mut adx = Vec::with_capacity(dx.len() - period + 1);
    adx.push(prev);
    for value in &dx[period..] {
        prev = (prev * (period_f - 1.0) + value) / period_f;
        adx.push(prev);
    }

    Adx {
        plus_di: tail(&plus_di, adx.len()).to_vec(),
        minus_di: tail(&minus_di, adx.len()).to_vec(),
        adx,
    }
}

// Running Wilder sum: first value is the plain sum of `period` items.
fn wilder_sum(values: &[f64], period: usize) -> Vec<f64> {
    let mut sum = values[..period].iter().sum::<f64>();
    let mut output = Vec::with_capacity(values.len() - period + 1);
    output.push(sum);
    for value in &values[period..] {
        sum = sum - sum / period as f64 + value;
        output.push(sum);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CandleBuilder;

    fn candle(high: f64, low: f64, close: f64) -> Candle {
        CandleBuilder::builder()
            .open(close)
            .high(high)
            .low(low)
            .close(close)
            .volume(1.0)
            .build()
            .unwrap()
    }

    #[test]
    fn uptrend_has_strong_plus_di() {
        let candles = (0..40)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                candle(base + 1.0, base - 1.0, base + 0.5)
            })
            .collect::<Vec<_>>();
        let output = adx(&candles, 14);

        assert_eq!(output.len(), 40 - 28 + 1);
        assert_eq!(output.plus_di.len(), output.len());
        assert_eq!(output.minus_di.len(), output.len());
        assert!(output.plus_di.iter().all(|v| *v > 0.0));
        assert!(output.minus_di.iter().all(|v| *v == 0.0));
        assert!(output.adx.iter().all(|v| (v - 100.0).abs() < 1e-9));
    }

    #[test]
    fn flat_market_does_not_divide_by_zero() {
        let candles = vec![candle(10.0, 10.0, 10.0); 30];
        let output = adx(&candles, 14);
        assert_eq!(output.len(), 3);
        assert!(output.adx.iter().chain(&output.plus_di).all(|v| *v == 0.0));
    }

    #[test]
    fn short_input_is_empty() {
        let candles = vec![candle(11.0, 9.0, 10.0); 27];
        assert!(adx(&candles, 14).is_empty());
    }
}
