//! Technical indicators computed over price series and candles.
//!
//! Every function is pure and aligns its output to the *tail* of the input:
//! an indicator needing `period` points drops the first `period - 1` inputs, so
//! `output[i]` matches `input[i + input.len() - output.len()]`. When the input is
//! shorter than required the result is empty.
//!
//! | Indicator | Function | Output length |
//! |-----------|----------|---------------|
//! | Simple moving average | [`sma`] | `n - period + 1` |
//! | Exponential moving average | [`ema`] | `n - period + 1` |
//! | Relative strength index | [`rsi`] | `n - period` |
//! | Bollinger bands | [`bollinger`] | `n - period + 1` |
//! | MACD | [`macd`] | `n - slow + 1` (line), `n - slow - signal + 2` (signal, histogram) |
//! | ADX / DI | [`adx`] | `n - 2 * period + 1` |
//! | Stochastic | [`stochastic`] | `n - k + 1` (%K), `n - k - d + 2` (%D) |

mod adx;
mod bollinger;
mod crossover;
mod macd;
mod moving_average;
mod patterns;
mod rsi;
mod stochastic;

pub use adx::*;
pub use bollinger::*;
pub use crossover::*;
pub use macd::*;
pub use moving_average::*;
pub use patterns::*;
pub use rsi::*;
pub use stochastic::*;

/// Returns the close prices of `candles`.
pub fn closes(candles: &[crate::engine::Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close()).collect()
}

/// Keeps the last `len` items of `values`.
pub(crate) fn tail(values: &[f64], len: usize) -> &[f64] {
    &values[values.len().saturating_sub(len)..]
}

#[cfg(test)]
pub(crate) fn assert_close(left: f64, right: f64) {
    assert!((left - right).abs() < 1e-9, "{left} != {right}");
}
