#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::sma;
use crate::engine::Candle;

/// Stochastic oscillator; `d` shares its tail with `k`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stochastic {
    /// %K, close location within the highest high / lowest low range.
    pub k: Vec<f64>,
    /// %D, simple moving average of %K.
    pub d: Vec<f64>,
}

/// Stochastic oscillator over `k_period` candles smoothed over `d_period`.
///
/// A window with no range reports %K = 50.
pub fn stochastic(candles: &[Candle], k_period: usize, d_period: usize) -> Stochastic {
    if k_period == 0 || d_period == 0 || candles.len() + 1 < k_period + d_period {
        return Stochastic::default();
    }

    let k = candles
        .windows(k_period)
        .map(|window| {
            let highest = window.iter().map(Candle::high).fold(f64::MIN, f64::max);
            let lowest = window.iter().map(Candle::low).fold(f64::MAX, f64::min);
            let close = window[window.len() - 1].close();
            if highest > lowest {
                (close - lowest) / (highest - lowest) * 100.0
            } else {
                50.0
            }
        })
        .collect::<Vec<_>>();
    let d = sma(&k, d_period);

    Stochastic { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CandleBuilder;
    use crate::indicators::assert_close;

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
    fn k_and_d() {
        let candles = vec![
            candle(10.0, 5.0, 6.0),
            candle(12.0, 6.0, 11.0),
            candle(11.0, 7.0, 9.0),
            candle(13.0, 8.0, 13.0),
        ];
        let output = stochastic(&candles, 2, 2);
        assert_eq!(output.k.len(), 3);
        assert_close(output.k[0], (11.0 - 5.0) / (12.0 - 5.0) * 100.0);
        assert_close(output.k[1], (9.0 - 6.0) / (12.0 - 6.0) * 100.0);
        assert_close(output.k[2], 100.0);
        assert_eq!(output.d.len(), 2);
        assert_close(output.d[1], (output.k[1] + output.k[2]) / 2.0);
    }

    #[test]
    fn flat_window_is_fifty() {
        let output = stochastic(&vec![candle(5.0, 5.0, 5.0); 5], 3, 3);
        assert_eq!(output.k, vec![50.0; 3]);
        assert_eq!(output.d, vec![50.0]);
    }

    #[test]
    fn short_input_is_empty() {
        assert_eq!(stochastic(&vec![candle(5.0, 4.0, 4.5); 15], 14, 3), Stochastic::default());
    }
}
