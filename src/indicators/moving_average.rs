/// Simple moving average.
///
/// Uses a rolling sum, so the cost is linear in the input length.
///
/// ### Example
/// ```rust
/// use tradesim::indicators::sma;
///
/// assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0], 2), vec![1.5, 2.5, 3.5]);
/// assert!(sma(&[1.0], 2).is_empty());
/// ```
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let period_f = period as f64;
    let mut sum = values[..period].iter().sum::<f64>();
    let mut output = Vec::with_capacity(values.len() - period + 1);
    output.push(sum / period_f);

    for i in period..values.len() {
        sum += values[i] - values[i - period];
        output.push(sum / period_f);
    }
    output
}

/// Exponential moving average seeded with the SMA of the first `period` values.
///
/// `ema[i] = value[i] * k + ema[i - 1] * (1 - k)` with `k = 2 / (period + 1)`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let mut output = Vec::with_capacity(values.len() - period + 1);
    output.push(seed);

    let mut prev = seed;
    for value in &values[period..] {
        prev = value * k + prev * (1.0 - k);
        output.push(prev);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_close;

    use ta::{Next, indicators::SimpleMovingAverage};

    #[test]
    fn sma_matches_ta() {
        let values = (0..60).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect::<Vec<_>>();
        let output = sma(&values, 14);
        assert_eq!(output.len(), values.len() - 14 + 1);

        let mut reference = SimpleMovingAverage::new(14).unwrap();
        let expected = values.iter().map(|v| reference.next(*v)).skip(13).collect::<Vec<_>>();
        for (a, b) in output.iter().zip(expected) {
            assert_close(*a, b);
        }
    }

    #[test]
    fn ema_seed_and_recurrence() {
        let values = [2.0, 4.0, 6.0, 8.0, 10.0];
        let output = ema(&values, 3);
        assert_eq!(output.len(), 3);
        assert_close(output[0], 4.0);
        assert_close(output[1], 8.0 * 0.5 + 4.0 * 0.5);
        assert_close(output[2], 10.0 * 0.5 + 6.0 * 0.5);
    }

    #[test]
    fn short_input_is_empty() {
        assert!(sma(&[], 3).is_empty());
        assert!(ema(&[1.0, 2.0], 3).is_empty());
        assert!(sma(&[1.0, 2.0], 0).is_empty());
    }
}
