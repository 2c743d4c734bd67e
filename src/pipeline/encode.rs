//! Encoding: one ridge regression per voxel, stimulus pixels as features.

use super::cache::nan_safe;
use super::decode::mean_defined;
use super::{folds, trial_ids, unit_scores, TestEvaluation};
use crate::config::{EncodingMetric, VisreconConfig};
use crate::dataset::{Dataset, Split};
use crate::error::Result;
use crate::model::metrics::{pearson, r2};
use crate::model::{LinearModel, RidgeSolver};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeReport {
    pub metric: EncodingMetric,
    /// Dataset ids of the training trials, row order of `predictions`.
    pub train_trials: Vec<usize>,
    /// Held-out score, voxels × folds.
    #[serde(with = "nan_safe")]
    pub fold_scores: Array2<f64>,
    /// Cross-validated activity prediction, training trials × voxels.
    pub predictions: Array2<f64>,
    pub test: Option<TestEvaluation<f64>>,
}

impl EncodeReport {
    /// Mean held-out score per voxel.
    pub fn voxel_scores(&self) -> Array1<f64> {
        unit_scores(&self.fold_scores)
    }
}

fn score(metric: EncodingMetric, predicted: ArrayView1<f64>, truth: ArrayView1<f64>) -> f64 {
    match metric {
        EncodingMetric::Correlation => pearson(predicted, truth),
        EncodingMetric::R2 => r2(predicted, truth),
    }
}

/// Fit every voxel on `x_train` and predict `x_test`.
///
/// Returns test predictions (rows × voxels) or `None` when the shared system
/// could not be solved; the caller then falls back to the training mean.
fn fit_voxels(
    x_train: ArrayView2<f64>,
    y_train: ArrayView2<f64>,
    x_test: ArrayView2<f64>,
    alpha: f64,
) -> Option<Array2<f64>> {
    let models: Vec<LinearModel> = match RidgeSolver::new(x_train, alpha)
        .and_then(|solver| solver.fit_columns(y_train))
    {
        Ok(models) => models,
        Err(err) => {
            tracing::warn!(error = %err, "ridge solve failed, voxel scores undefined");
            return None;
        }
    };
    let mut predicted = Array2::<f64>::zeros((x_test.nrows(), models.len()));
    for (mut column, model) in predicted.columns_mut().into_iter().zip(&models) {
        column.assign(&model.predict(x_test));
    }
    Some(predicted)
}

fn training_mean(y_train: ArrayView2<f64>, rows: usize) -> Array2<f64> {
    let mean = y_train
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(y_train.ncols()));
    let mut out = Array2::<f64>::zeros((rows, y_train.ncols()));
    out.rows_mut().into_iter().for_each(|mut row| row.assign(&mean));
    out
}

/// Cross-validated encoding of every voxel, plus the optional test split.
pub fn run(dataset: &Dataset, config: &VisreconConfig) -> Result<EncodeReport> {
    let train = dataset.indices(Split::Train);
    let folds = folds(&config.validation, train.len())?;
    let metric = config.encoding.metric;
    let voxels = dataset.voxels();
    tracing::info!(
        alpha = config.encoding.alpha,
        ?metric,
        trials = train.len(),
        voxels,
        folds = folds.len(),
        "encoding voxels"
    );

    let mut fold_scores = Array2::<f64>::zeros((voxels, folds.len()));
    let mut predictions = Array2::<f64>::zeros((train.len(), voxels));

    for (k, fold) in folds.iter().enumerate() {
        let train_ids = trial_ids(&train, &fold.train);
        let test_ids = trial_ids(&train, &fold.test);
        let x_train = dataset.image_rows(&train_ids);
        let x_test = dataset.image_rows(&test_ids);
        let y_train = dataset.activity_rows(&train_ids);
        let y_test = dataset.activity_rows(&test_ids);

        let predicted = match fit_voxels(x_train.view(), y_train.view(), x_test.view(), config.encoding.alpha) {
            Some(predicted) => {
                for voxel in 0..voxels {
                    fold_scores[[voxel, k]] = score(metric, predicted.column(voxel), y_test.column(voxel));
                }
                predicted
            }
            None => {
                fold_scores.column_mut(k).fill(f64::NAN);
                training_mean(y_train.view(), test_ids.len())
            }
        };
        for (row, &position) in predicted.outer_iter().zip(&fold.test) {
            predictions.row_mut(position).assign(&row);
        }
        tracing::info!(
            fold = k + 1,
            of = folds.len(),
            mean_score = mean_defined(fold_scores.column(k)),
            "fold encoded"
        );
    }

    let test = if config.validation.evaluate_test_split {
        evaluate_test(dataset, &train, config)
    } else {
        None
    };

    Ok(EncodeReport {
        metric,
        train_trials: train,
        fold_scores,
        predictions,
        test,
    })
}

fn evaluate_test(
    dataset: &Dataset,
    train: &[usize],
    config: &VisreconConfig,
) -> Option<TestEvaluation<f64>> {
    let test = dataset.indices(Split::Test);
    if test.is_empty() {
        return None;
    }
    let x_train = dataset.image_rows(train);
    let y_train = dataset.activity_rows(train);
    let x_test = dataset.image_rows(&test);
    let y_test = dataset.activity_rows(&test);

    let (predictions, scores) = match fit_voxels(x_train.view(), y_train.view(), x_test.view(), config.encoding.alpha) {
        Some(predicted) => {
            let scores = (0..dataset.voxels())
                .map(|v| score(config.encoding.metric, predicted.column(v), y_test.column(v)))
                .collect::<Array1<f64>>();
            (predicted, scores)
        }
        None => (
            training_mean(y_train.view(), test.len()),
            Array1::from_elem(dataset.voxels(), f64::NAN),
        ),
    };
    tracing::info!(
        trials = test.len(),
        mean_score = mean_defined(scores.view()),
        "test split encoded"
    );

    Some(TestEvaluation {
        trials: test,
        predictions,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn voxel_predictions_follow_features() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [2.0, 1.0]];
        let y = Array2::from_shape_fn((5, 2), |(i, v)| if v == 0 { 3.0 * x[[i, 0]] } else { -x[[i, 1]] + 1.0 });
        let predicted = fit_voxels(x.view(), y.view(), x.view(), 1e-9).unwrap();
        for (p, t) in predicted.iter().zip(y.iter()) {
            assert_abs_diff_eq!(*p, *t, epsilon = 1e-6);
        }
    }

    #[test]
    fn training_mean_repeats_column_means() {
        let y = array![[1.0, 4.0], [3.0, 8.0]];
        let filled = training_mean(y.view(), 3);
        assert_eq!(filled.shape(), &[3, 2]);
        assert!(filled.rows().into_iter().all(|row| row == array![2.0, 6.0]));
    }

    #[test]
    fn metric_selects_score() {
        let p = array![1.0, 2.0, 3.0];
        let t = array![2.0, 4.0, 6.0];
        assert_abs_diff_eq!(score(EncodingMetric::Correlation, p.view(), t.view()), 1.0, epsilon = 1e-12);
        assert!(score(EncodingMetric::R2, p.view(), t.view()) < 1.0);
    }
}
