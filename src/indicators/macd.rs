#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ema, tail};

/// MACD line, signal line and histogram.
///
/// `signal` and `histogram` have the same length and share their tail with `macd`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Macd {
    /// `EMA(fast) - EMA(slow)`.
    pub macd: Vec<f64>,
    /// `EMA(macd, signal)`.
    pub signal: Vec<f64>,
    /// `macd - signal`.
    pub histogram: Vec<f64>,
}

/// Moving average convergence divergence.
///
/// Returns an empty [`Macd`] unless `fast < slow` and there are at least
/// `slow + signal - 1` values.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    if fast == 0 || signal == 0 || fast >= slow || values.len() + 1 < slow + signal {
        return Macd::default();
    }

    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let macd_line = tail(&fast_ema, slow_ema.len())
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect::<Vec<_>>();

    let signal_line = ema(&macd_line, signal);
    let histogram = tail(&macd_line, signal_line.len())
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    Macd {
        macd: macd_line,
        signal: signal_line,
        histogram,
    }
}
