//! Linear models fitted per pixel or per voxel.
//!
//! Every estimator produces a [`LinearModel`]. Classifiers are trained on
//! binary labels and predict label 1 wherever the decision value is positive.

pub mod cv;
pub mod logistic;
pub mod metrics;
pub mod ridge;
pub mod selection;
pub mod sparse;
pub mod svc;

use crate::config::{ClassifierKind, DecodingConfig};
use crate::error::ModelError;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

pub use cv::{Fold, KFold};
pub use logistic::LogisticRegression;
pub use ridge::{LeastSquaresClassifier, RidgeSolver};
pub use svc::LinearSvc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Array1<f64>,
    pub intercept: f64,
}

impl LinearModel {
    /// A model ignoring its input and always returning `value`.
    pub fn constant(features: usize, value: f64) -> Self {
        Self {
            weights: Array1::zeros(features),
            intercept: value,
        }
    }

    /// Classifier that always predicts `label`.
    pub fn constant_label(features: usize, label: u8) -> Self {
        Self::constant(features, if label == 1 { 1.0 } else { -1.0 })
    }

    pub fn decision(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.dot(&self.weights) + self.intercept
    }

    /// Regression output; identical to the decision value.
    pub fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        self.decision(x)
    }

    pub fn predict_labels(&self, x: ArrayView2<f64>) -> Array1<u8> {
        self.decision(x).mapv(|d| u8::from(d > 0.0))
    }

    pub fn is_constant(&self) -> bool {
        self.weights.iter().all(|w| *w == 0.0)
    }
}

/// Binary classifier over real-valued features.
pub trait Classifier {
    /// Short name used in logs and file names.
    fn name(&self) -> &'static str;

    /// Fit on labels in {0, 1}. Both classes must be present.
    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<u8>) -> Result<LinearModel, ModelError>;
}

/// The single label of `y`, if it has only one.
pub fn constant_label(y: ArrayView1<u8>) -> Option<u8> {
    let first = *y.first()?;
    y.iter().all(|&l| l == first).then_some(first)
}

/// Most frequent label, ties going to 1.
pub fn majority_label(y: ArrayView1<u8>) -> u8 {
    let ones = y.iter().filter(|&&l| l == 1).count();
    u8::from(2 * ones >= y.len())
}

pub(crate) fn check_shape(x: ArrayView2<f64>, targets: usize) -> Result<(), ModelError> {
    if x.nrows() != targets {
        return Err(ModelError::ShapeMismatch {
            rows: x.nrows(),
            targets,
        });
    }
    Ok(())
}

pub fn build_classifier(config: &DecodingConfig, seed: u64) -> Box<dyn Classifier> {
    match config.classifier {
        ClassifierKind::Svc => Box::new(LinearSvc {
            penalty: config.penalty,
            c: config.c(),
            tol: config.tol,
            max_iter: config.max_iter,
            seed,
        }),
        ClassifierKind::Logistic => Box::new(LogisticRegression {
            penalty: config.penalty,
            c: config.c(),
            tol: config.tol,
            max_iter: config.max_iter,
        }),
        ClassifierKind::LeastSquares => Box::new(LeastSquaresClassifier {
            alpha: config.alpha,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn constant_label_model_predicts_label() {
        let x = array![[1.0, -3.0], [0.0, 9.0]];
        assert_eq!(
            LinearModel::constant_label(2, 1).predict_labels(x.view()),
            array![1u8, 1]
        );
        assert_eq!(
            LinearModel::constant_label(2, 0).predict_labels(x.view()),
            array![0u8, 0]
        );
    }

    #[test]
    fn constant_and_majority_labels() {
        assert_eq!(constant_label(array![1u8, 1, 1].view()), Some(1));
        assert_eq!(constant_label(array![1u8, 0].view()), None);
        assert_eq!(majority_label(array![0u8, 0, 1].view()), 0);
        assert_eq!(majority_label(array![0u8, 1].view()), 1);
    }
}
