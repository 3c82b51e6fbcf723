#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Direction of a crossover of series A over series B.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossoverKind {
    /// A moved from `<= B` to `> B`.
    Bullish,
    /// A moved from `>= B` to `< B`.
    Bearish,
}

/// A crossover event.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossover {
    /// Index of the first point past the cross.
    pub index: usize,
    /// Direction of the cross.
    pub kind: CrossoverKind,
}

/// Scans adjacent pairs of two index-aligned series for crossovers.
///
/// Only the common prefix (`min(a.len(), b.len())`) is scanned.
pub fn crossovers(a: &[f64], b: &[f64]) -> Vec<Crossover> {
    let len = a.len().min(b.len());
    (1..len)
        .filter_map(|i| {
            let kind = if a[i - 1] <= b[i - 1] && a[i] > b[i] {
                CrossoverKind::Bullish
            } else if a[i - 1] >= b[i - 1] && a[i] < b[i] {
                CrossoverKind::Bearish
            } else {
                return None;
            };
            Some(Crossover { index: i, kind })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_both_directions() {
        let a = [1.0, 2.0, 3.0, 2.0, 1.0];
        let b = [2.0, 2.0, 2.0, 2.0, 2.0];
        assert_eq!(
            crossovers(&a, &b),
            vec![
                Crossover { index: 2, kind: CrossoverKind::Bullish },
                Crossover { index: 4, kind: CrossoverKind::Bearish },
            ]
        );
    }

    #[test]
    fn leaving_from_a_touch_is_a_cross() {
        assert_eq!(
            crossovers(&[1.0, 2.0, 1.0], &[2.0, 2.0, 2.0]),
            vec![Crossover { index: 2, kind: CrossoverKind::Bearish }]
        );
    }

    #[test]
    fn touching_is_not_a_cross() {
        assert!(crossovers(&[1.0, 2.0, 1.5], &[2.0, 2.0, 1.5]).is_empty());
        assert!(crossovers(&[1.0], &[0.0]).is_empty());
    }
}
