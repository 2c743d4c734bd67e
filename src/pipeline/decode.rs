//! Decoding: one binary classifier per pixel, voxels as features.

use super::cache::nan_safe;
use super::{folds, trial_ids, unit_scores, TestEvaluation};
use crate::config::{DecodingConfig, VisreconConfig};
use crate::dataset::{Dataset, Split, PIXELS};
use crate::error::{Error, ModelError, Result};
use crate::model::metrics::accuracy;
use crate::model::selection::{anova_f, select_k_best};
use crate::model::{build_classifier, constant_label, majority_label, Classifier, LinearModel};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeReport {
    pub classifier: String,
    /// Dataset ids of the training trials, row order of `predictions`.
    pub train_trials: Vec<usize>,
    /// Held-out accuracy, pixels × folds.
    #[serde(with = "nan_safe")]
    pub fold_scores: Array2<f64>,
    /// Cross-validated reconstruction, training trials × pixels.
    pub predictions: Array2<u8>,
    pub test: Option<TestEvaluation<u8>>,
}

impl DecodeReport {
    /// Mean held-out accuracy per pixel.
    pub fn pixel_scores(&self) -> Array1<f64> {
        unit_scores(&self.fold_scores)
    }
}

/// A classifier fitted on a subset of voxels.
#[derive(Debug, Clone)]
pub struct PixelModel {
    /// Voxel columns the model reads; `None` means all.
    pub selected: Option<Vec<usize>>,
    pub model: LinearModel,
}

impl PixelModel {
    pub fn predict(&self, x: ArrayView2<f64>) -> Array1<u8> {
        match &self.selected {
            Some(columns) => self.model.predict_labels(x.select(Axis(1), columns).view()),
            None => self.model.predict_labels(x),
        }
    }

    /// Weights expanded back to one entry per voxel.
    pub fn voxel_weights(&self, voxels: usize) -> Array1<f64> {
        match &self.selected {
            Some(columns) => {
                let mut weights = Array1::zeros(voxels);
                for (w, &c) in self.model.weights.iter().zip(columns) {
                    weights[c] = *w;
                }
                weights
            }
            None => self.model.weights.clone(),
        }
    }
}

/// Fit one pixel. A constant target yields a constant classifier.
pub fn fit_pixel(
    classifier: &dyn Classifier,
    x: ArrayView2<f64>,
    y: ArrayView1<u8>,
    select_k: usize,
) -> Result<PixelModel, ModelError> {
    if let Some(label) = constant_label(y) {
        return Ok(PixelModel {
            selected: None,
            model: LinearModel::constant_label(x.ncols(), label),
        });
    }
    if select_k == 0 || select_k >= x.ncols() {
        return Ok(PixelModel {
            selected: None,
            model: classifier.fit(x, y)?,
        });
    }
    let columns = select_k_best(&anova_f(x, y), select_k);
    let model = classifier.fit(x.select(Axis(1), &columns).view(), y)?;
    Ok(PixelModel {
        selected: Some(columns),
        model,
    })
}

/// Cross-validated decoding of every pixel, plus the optional test split.
pub fn run(dataset: &Dataset, config: &VisreconConfig) -> Result<DecodeReport> {
    let train = dataset.indices(Split::Train);
    let folds = folds(&config.validation, train.len())?;
    let classifier = build_classifier(&config.decoding, config.validation.seed);
    tracing::info!(
        classifier = classifier.name(),
        trials = train.len(),
        voxels = dataset.voxels(),
        folds = folds.len(),
        "decoding pixels"
    );

    let images = dataset.images();
    let mut fold_scores = Array2::<f64>::zeros((PIXELS, folds.len()));
    let mut predictions = Array2::<u8>::zeros((train.len(), PIXELS));

    for (k, fold) in folds.iter().enumerate() {
        let train_ids = trial_ids(&train, &fold.train);
        let test_ids = trial_ids(&train, &fold.test);
        let x_train = dataset.activity_rows(&train_ids);
        let x_test = dataset.activity_rows(&test_ids);
        let y_train_all = images.select(Axis(0), &train_ids);
        let y_test_all = images.select(Axis(0), &test_ids);

        for pixel in 0..PIXELS {
            let y_train = y_train_all.column(pixel);
            let y_test = y_test_all.column(pixel);

            if constant_label(y_train).is_some() {
                tracing::debug!(pixel, fold = k, "constant pixel, using constant classifier");
            }
            let predicted = match fit_pixel(
                classifier.as_ref(),
                x_train.view(),
                y_train,
                config.decoding.select_k,
            ) {
                Ok(model) => {
                    let predicted = model.predict(x_test.view());
                    fold_scores[[pixel, k]] = accuracy(predicted.view(), y_test);
                    predicted
                }
                Err(err) => {
                    tracing::warn!(pixel, fold = k, error = %err, "pixel fit failed, score undefined");
                    fold_scores[[pixel, k]] = f64::NAN;
                    Array1::from_elem(test_ids.len(), majority_label(y_train))
                }
            };
            for (&position, label) in fold.test.iter().zip(predicted.iter()) {
                predictions[[position, pixel]] = *label;
            }
        }
        tracing::info!(
            fold = k + 1,
            of = folds.len(),
            mean_accuracy = mean_defined(fold_scores.column(k)),
            "fold decoded"
        );
    }

    let test = if config.validation.evaluate_test_split {
        evaluate_test(dataset, &train, classifier.as_ref(), &config.decoding)
    } else {
        None
    };

    Ok(DecodeReport {
        classifier: classifier.name().to_string(),
        train_trials: train,
        fold_scores,
        predictions,
        test,
    })
}

/// Refit every pixel on all training trials and reconstruct the test trials.
fn evaluate_test(
    dataset: &Dataset,
    train: &[usize],
    classifier: &dyn Classifier,
    config: &DecodingConfig,
) -> Option<TestEvaluation<u8>> {
    let test = dataset.indices(Split::Test);
    if test.is_empty() {
        return None;
    }
    let x_train = dataset.activity_rows(train);
    let x_test = dataset.activity_rows(&test);
    let images = dataset.images();
    let y_train_all = images.select(Axis(0), train);
    let y_test_all = images.select(Axis(0), &test);

    let mut predictions = Array2::<u8>::zeros((test.len(), PIXELS));
    let mut scores = Array1::<f64>::zeros(PIXELS);
    for pixel in 0..PIXELS {
        let y_train = y_train_all.column(pixel);
        let predicted = match fit_pixel(classifier, x_train.view(), y_train, config.select_k) {
            Ok(model) => {
                let predicted = model.predict(x_test.view());
                scores[pixel] = accuracy(predicted.view(), y_test_all.column(pixel));
                predicted
            }
            Err(err) => {
                tracing::warn!(pixel, error = %err, "test refit failed, score undefined");
                scores[pixel] = f64::NAN;
                Array1::from_elem(test.len(), majority_label(y_train))
            }
        };
        predictions.slice_mut(s![.., pixel]).assign(&predicted);
    }
    tracing::info!(
        trials = test.len(),
        mean_accuracy = mean_defined(scores.view()),
        "test split reconstructed"
    );

    Some(TestEvaluation {
        trials: test,
        predictions,
        scores,
    })
}

/// Voxel-space weights of one pixel's classifier fitted on all training trials.
pub fn pixel_weights(dataset: &Dataset, config: &VisreconConfig, pixel: usize) -> Result<Array1<f64>> {
    if pixel >= PIXELS {
        return Err(Error::InvalidPixel(pixel));
    }
    let train = dataset.indices(Split::Train);
    let classifier = build_classifier(&config.decoding, config.validation.seed);
    let x = dataset.activity_rows(&train);
    let y = dataset.images().select(Axis(0), &train).column(pixel).to_owned();
    let model = fit_pixel(classifier.as_ref(), x.view(), y.view(), config.decoding.select_k)?;
    Ok(model.voxel_weights(dataset.voxels()))
}

pub(crate) fn mean_defined(values: ArrayView1<f64>) -> f64 {
    let defined: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if defined.is_empty() {
        f64::NAN
    } else {
        defined.iter().sum::<f64>() / defined.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearSvc;
    use ndarray::array;

    #[test]
    fn constant_pixel_gets_constant_classifier() {
        let x = array![[1.0, 2.0], [3.0, -1.0], [0.0, 0.5]];
        let y = array![1u8, 1, 1];
        let model = fit_pixel(&LinearSvc::default(), x.view(), y.view(), 1).unwrap();
        assert!(model.model.is_constant());
        let unseen = array![[-9.0, 4.0], [2.0, 2.0]];
        assert_eq!(model.predict(unseen.view()), array![1u8, 1]);
    }

    #[test]
    fn selection_restricts_columns() {
        let x = array![
            [0.0, 5.0, 0.3],
            [0.1, 5.1, -0.2],
            [1.0, 4.9, 0.1],
            [1.1, 5.0, 0.0],
        ];
        let y = array![0u8, 0, 1, 1];
        let model = fit_pixel(&LinearSvc::default(), x.view(), y.view(), 1).unwrap();
        assert_eq!(model.selected, Some(vec![0]));
        assert_eq!(model.predict(x.view()), y);
        let weights = model.voxel_weights(3);
        assert!(weights[0] > 0.0);
        assert_eq!(weights[1], 0.0);
        assert_eq!(weights[2], 0.0);
    }

    #[test]
    fn mean_defined_skips_nan() {
        assert_eq!(mean_defined(array![1.0, f64::NAN, 0.0].view()), 0.5);
        assert!(mean_defined(array![f64::NAN].view()).is_nan());
    }
}
