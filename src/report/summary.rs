//! Distribution of per-unit scores.

use ndarray::ArrayView1;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    /// Units scored, NaN included.
    pub units: usize,
    /// Units with a defined score.
    pub defined: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl ScoreSummary {
    /// Statistics over the non-NaN scores. All NaN when none are defined.
    pub fn from_scores(scores: ArrayView1<f64>) -> Self {
        let mut defined: Vec<f64> = scores.iter().copied().filter(|s| !s.is_nan()).collect();
        defined.sort_by(|a, b| a.total_cmp(b));
        let n = defined.len();
        if n == 0 {
            return Self {
                units: scores.len(),
                defined: 0,
                mean: f64::NAN,
                median: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
            };
        }
        let median = if n % 2 == 1 {
            defined[n / 2]
        } else {
            (defined[n / 2 - 1] + defined[n / 2]) / 2.0
        };
        Self {
            units: scores.len(),
            defined: n,
            mean: defined.iter().sum::<f64>() / n as f64,
            median,
            min: defined[0],
            max: defined[n - 1],
        }
    }
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean {:.3}  median {:.3}  min {:.3}  max {:.3}  ({} of {} units defined)",
            self.mean, self.median, self.min, self.max, self.defined, self.units
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn ignores_nan() {
        let s = ScoreSummary::from_scores(array![0.5, f64::NAN, 1.0, 0.7].view());
        assert_eq!(s.units, 4);
        assert_eq!(s.defined, 3);
        assert_eq!(s.median, 0.7);
        assert_eq!(s.min, 0.5);
        assert_eq!(s.max, 1.0);
    }

    #[test]
    fn even_count_median_averages() {
        let s = ScoreSummary::from_scores(array![4.0, 1.0, 3.0, 2.0].view());
        assert_eq!(s.median, 2.5);
        assert_eq!(s.mean, 2.5);
    }

    #[test]
    fn all_undefined() {
        let s = ScoreSummary::from_scores(array![f64::NAN, f64::NAN].view());
        assert_eq!(s.defined, 0);
        assert!(s.mean.is_nan());
    }
}
