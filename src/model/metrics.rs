//! Per-unit scores.

use ndarray::ArrayView1;

/// Fraction of equal labels; NaN for empty input.
pub fn accuracy(predicted: ArrayView1<u8>, truth: ArrayView1<u8>) -> f64 {
    if truth.is_empty() {
        return f64::NAN;
    }
    let hits = predicted
        .iter()
        .zip(truth.iter())
        .filter(|(p, t)| p == t)
        .count();
    hits as f64 / truth.len() as f64
}

/// Pearson correlation; NaN when either side is constant.
pub fn pearson(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let n = a.len();
    if n < 2 || b.len() != n {
        return f64::NAN;
    }
    let mean_a = a.sum() / n as f64;
    let mean_b = b.sum() / n as f64;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b.iter()) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    if denom <= f64::EPSILON {
        f64::NAN
    } else {
        cov / denom
    }
}

/// Coefficient of determination of `predicted` against `truth`.
pub fn r2(predicted: ArrayView1<f64>, truth: ArrayView1<f64>) -> f64 {
    let n = truth.len();
    if n == 0 {
        return f64::NAN;
    }
    let mean = truth.sum() / n as f64;
    let ss_res: f64 = predicted
        .iter()
        .zip(truth.iter())
        .map(|(p, t)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot <= f64::EPSILON {
        f64::NAN
    } else {
        1.0 - ss_res / ss_tot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn accuracy_counts_matches() {
        let p = array![1u8, 0, 1, 1];
        let t = array![1u8, 1, 1, 0];
        assert_eq!(accuracy(p.view(), t.view()), 0.5);
    }

    #[test]
    fn pearson_detects_perfect_and_inverse_relation() {
        let a = array![1.0, 2.0, 3.0, 4.0];
        let b = array![2.0, 4.0, 6.0, 8.0];
        assert_abs_diff_eq!(pearson(a.view(), b.view()), 1.0, epsilon = 1e-12);
        let c = array![4.0, 3.0, 2.0, 1.0];
        assert_abs_diff_eq!(pearson(a.view(), c.view()), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn pearson_of_constant_is_nan() {
        let a = array![1.0, 1.0, 1.0];
        let b = array![1.0, 2.0, 3.0];
        assert!(pearson(a.view(), b.view()).is_nan());
    }

    #[test]
    fn r2_of_exact_prediction_is_one() {
        let t = array![1.0, 2.0, 4.0];
        assert_abs_diff_eq!(r2(t.view(), t.view()), 1.0, epsilon = 1e-12);
        let mean = array![7.0 / 3.0, 7.0 / 3.0, 7.0 / 3.0];
        assert_abs_diff_eq!(r2(mean.view(), t.view()), 0.0, epsilon = 1e-12);
    }
}
