#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::sma;

/// Bollinger bands, all three series aligned with each other.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerBands {
    /// `middle + mult * stddev`.
    pub upper: Vec<f64>,
    /// Simple moving average.
    pub middle: Vec<f64>,
    /// `middle - mult * stddev`.
    pub lower: Vec<f64>,
}

impl BollingerBands {
    /// Returns the number of points.
    pub fn len(&self) -> usize {
        self.middle.len()
    }

    /// Returns true when the input was too short.
    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }
}

/// Bollinger bands over `period` values with `mult` population standard deviations.
pub fn bollinger(values: &[f64], period: usize, mult: f64) -> BollingerBands {
    let middle = sma(values, period);
    if middle.is_empty() {
        return BollingerBands::default();
    }

    let (upper, lower) = values
        .windows(period)
        .zip(&middle)
        .map(|(window, mean)| {
            let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
            let width = mult * variance.sqrt();
            (mean + width, mean - width)
        })
        .unzip();

    BollingerBands { upper, middle, lower }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_close;

    use ta::{Next, indicators::BollingerBands as TaBollinger};

    #[test]
    fn population_stddev() {
        let bands = bollinger(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8, 2.0);
        assert_eq!(bands.len(), 1);
        assert_close(bands.middle[0], 5.0);
        assert_close(bands.upper[0], 9.0);
        assert_close(bands.lower[0], 1.0);
    }

    #[test]
    fn middle_matches_ta() {
        let values = (0..40).map(|i| 50.0 + (i as f64 * 0.3).cos() * 3.0).collect::<Vec<_>>();
        let bands = bollinger(&values, 20, 2.0);
        assert_eq!(bands.len(), 21);

        let mut reference = TaBollinger::new(20, 2.0).unwrap();
        let expected = values.iter().map(|v| reference.next(*v).average).skip(19);
        for (a, b) in bands.middle.iter().zip(expected) {
            assert_close(*a, b);
        }
        assert!(bands.upper.iter().zip(&bands.lower).all(|(u, l)| u >= l));
    }

    #[test]
    fn short_input_is_empty() {
        assert!(bollinger(&[1.0, 2.0], 20, 2.0).is_empty());
    }
}
