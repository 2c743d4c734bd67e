//! Univariate feature selection: two-class ANOVA F statistic, top k kept.

use ndarray::{ArrayView1, ArrayView2};

/// F statistic of every column against binary labels. A column with no
/// within-class variance scores infinity if its class means differ and
/// `NaN` otherwise.
pub fn anova_f(x: ArrayView2<f64>, y: ArrayView1<u8>) -> Vec<f64> {
    let n = x.nrows();
    let n1 = y.iter().filter(|&&l| l == 1).count();
    let n0 = n - n1;
    if n0 == 0 || n1 == 0 || n < 3 {
        return vec![f64::NAN; x.ncols()];
    }

    x.columns()
        .into_iter()
        .map(|column| {
            let (mut sum0, mut sum1, mut sq) = (0.0, 0.0, 0.0);
            for (value, label) in column.iter().zip(y.iter()) {
                if *label == 1 {
                    sum1 += value;
                } else {
                    sum0 += value;
                }
                sq += value * value;
            }
            let mean0 = sum0 / n0 as f64;
            let mean1 = sum1 / n1 as f64;
            let mean = (sum0 + sum1) / n as f64;
            let between = n0 as f64 * (mean0 - mean).powi(2) + n1 as f64 * (mean1 - mean).powi(2);
            let within = sq - n0 as f64 * mean0 * mean0 - n1 as f64 * mean1 * mean1;
            let scale = f64::EPSILON * sq.max(1.0);
            if within <= scale {
                // perfect separation ranks first, a constant column last
                if between > scale {
                    f64::INFINITY
                } else {
                    f64::NAN
                }
            } else {
                between / (within / (n - 2) as f64)
            }
        })
        .collect()
}

/// Indices of the `k` highest scores, ascending. Ties keep the lower index.
/// `k == 0` or `k >= scores.len()` keeps everything.
pub fn select_k_best(scores: &[f64], k: usize) -> Vec<usize> {
    if k == 0 || k >= scores.len() {
        return (0..scores.len()).collect();
    }
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        let sa = if scores[a].is_nan() { f64::NEG_INFINITY } else { scores[a] };
        let sb = if scores[b].is_nan() { f64::NEG_INFINITY } else { scores[b] };
        sb.total_cmp(&sa).then(a.cmp(&b))
    });
    let mut selected = order[..k].to_vec();
    selected.sort_unstable();
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn informative_column_scores_highest() {
        let x = array![
            [0.1, 5.0, 1.0],
            [0.2, 5.2, 0.0],
            [0.9, 4.9, 1.0],
            [1.1, 5.1, 0.0],
        ];
        let y = array![0u8, 0, 1, 1];
        let f = anova_f(x.view(), y.view());
        assert!(f[0] > f[1]);
        assert!(f[0] > f[2]);
        assert_eq!(select_k_best(&f, 1), vec![0]);
    }

    #[test]
    fn nan_scores_rank_last() {
        let scores = [f64::NAN, 1.0, 3.0, 2.0];
        assert_eq!(select_k_best(&scores, 2), vec![2, 3]);
        assert_eq!(select_k_best(&scores, 0), vec![0, 1, 2, 3]);
        assert_eq!(select_k_best(&scores, 10), vec![0, 1, 2, 3]);
    }

    #[test]
    fn separating_column_ranks_first() {
        let x = array![[-1.0, 0.3], [-1.0, 0.1], [1.0, 0.9], [1.0, 0.8]];
        let y = array![0u8, 0, 1, 1];
        let f = anova_f(x.view(), y.view());
        assert!(f[0].is_infinite());
        assert_eq!(select_k_best(&f, 1), vec![0]);
    }

    #[test]
    fn single_class_gives_nan() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1u8, 1, 1];
        assert!(anova_f(x.view(), y.view())[0].is_nan());
    }
}
