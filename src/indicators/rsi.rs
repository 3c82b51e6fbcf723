/// Relative strength index with Wilder smoothing.
///
/// The first value uses the plain average gain and loss of the first `period`
/// changes, so the output has `n - period` points. A window without losses
/// saturates at 100.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() <= period {
        return Vec::new();
    }

    let period_f = period as f64;
    let (mut avg_gain, mut avg_loss) = values[..=period]
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(gain, loss), change| {
            (gain + change.max(0.0), loss + (-change).max(0.0))
        });
    avg_gain /= period_f;
    avg_loss /= period_f;

    let mut output = Vec::with_capacity(values.len() - period);
    output.push(rsi_value(avg_gain, avg_loss));

    for w in values[period..].windows(2) {
        let change = w[1] - w[0];
        avg_gain = (avg_gain * (period_f - 1.0) + change.max(0.0)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + (-change).max(0.0)) / period_f;
        output.push(rsi_value(avg_gain, avg_loss));
    }
    output
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}
