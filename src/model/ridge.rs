//! Ridge regression with an unpenalised intercept.
//!
//! The penalised normal equations depend only on the features, so a
//! [`RidgeSolver`] factorises them once and then fits any number of targets.
//! Each target still gets its own independent [`LinearModel`].

use super::{check_shape, Classifier, LinearModel};
use crate::error::ModelError;
use nalgebra::{linalg::Cholesky, DMatrix, DVector, Dyn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

pub struct RidgeSolver {
    factor: Cholesky<f64, Dyn>,
    centred_t: Array2<f64>,
    x_mean: Array1<f64>,
}

impl RidgeSolver {
    /// Factorise `XcᵀXc + alpha I` for centred features `Xc`.
    pub fn new(x: ArrayView2<f64>, alpha: f64) -> Result<Self, ModelError> {
        let x_mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let centred = &x - &x_mean;
        let mut gram = centred.t().dot(&centred);
        gram.diag_mut().mapv_inplace(|d| d + alpha);
        let size = gram.nrows();
        let factor = DMatrix::from_fn(size, size, |i, j| gram[[i, j]])
            .cholesky()
            .ok_or(ModelError::Singular { size })?;
        Ok(Self {
            factor,
            centred_t: centred.reversed_axes(),
            x_mean,
        })
    }

    pub fn samples(&self) -> usize {
        self.centred_t.ncols()
    }

    pub fn fit(&self, y: ArrayView1<f64>) -> Result<LinearModel, ModelError> {
        if y.len() != self.samples() {
            return Err(ModelError::ShapeMismatch {
                rows: self.samples(),
                targets: y.len(),
            });
        }
        let y_mean = y.mean().unwrap_or(0.0);
        let rhs = self.centred_t.dot(&y.mapv(|v| v - y_mean));
        let solved = self.factor.solve(&DVector::from_iterator(rhs.len(), rhs.iter().copied()));
        let weights = Array1::from_iter(solved.iter().copied());
        let intercept = y_mean - self.x_mean.dot(&weights);
        Ok(LinearModel { weights, intercept })
    }

    /// Fit every column of `y` as its own target.
    pub fn fit_columns(&self, y: ArrayView2<f64>) -> Result<Vec<LinearModel>, ModelError> {
        check_shape(self.centred_t.t(), y.nrows())?;
        y.columns().into_iter().map(|column| self.fit(column)).collect()
    }
}

/// Ridge regression on ±1 targets, thresholded at zero.
pub struct LeastSquaresClassifier {
    pub alpha: f64,
}

impl Classifier for LeastSquaresClassifier {
    fn name(&self) -> &'static str {
        "least_squares"
    }

    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<u8>) -> Result<LinearModel, ModelError> {
        check_shape(x, y.len())?;
        let targets = y.mapv(|l| if l == 1 { 1.0 } else { -1.0 });
        RidgeSolver::new(x, self.alpha)?.fit(targets.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn recovers_linear_relation_with_small_penalty() {
        let x = Array2::from_shape_fn((20, 2), |(i, j)| ((i * (j + 2)) % 7) as f64);
        let y = x.dot(&array![2.0, -1.0]) + 3.0;
        let model = RidgeSolver::new(x.view(), 1e-9).unwrap().fit(y.view()).unwrap();
        assert_abs_diff_eq!(model.weights[0], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(model.weights[1], -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(model.intercept, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn columns_match_individual_fits() {
        let x = Array2::from_shape_fn((12, 3), |(i, j)| ((i + 2 * j) % 5) as f64);
        let y = Array2::from_shape_fn((12, 2), |(i, j)| (i as f64) * (j as f64 + 1.0));
        let solver = RidgeSolver::new(x.view(), 0.5).unwrap();
        let models = solver.fit_columns(y.view()).unwrap();
        let single = solver.fit(y.column(1)).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[1], single);
    }

    #[test]
    fn constant_target_gives_flat_model() {
        let x = Array2::from_shape_fn((6, 2), |(i, j)| (i + j) as f64);
        let y = Array1::from_elem(6, 4.0);
        let model = RidgeSolver::new(x.view(), 1.0).unwrap().fit(y.view()).unwrap();
        assert!(model.weights.iter().all(|w| w.abs() < 1e-12));
        assert_abs_diff_eq!(model.intercept, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn unpenalised_zero_column_is_singular() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [4.0, 0.0]];
        assert!(matches!(
            RidgeSolver::new(x.view(), 0.0),
            Err(ModelError::Singular { size: 2 })
        ));
        assert!(RidgeSolver::new(x.view(), 0.1).is_ok());
    }

    #[test]
    fn thresholded_classifier_separates_classes() {
        let x = array![[0.0], [0.2], [1.0], [1.2]];
        let y = array![0u8, 0, 1, 1];
        let model = LeastSquaresClassifier { alpha: 1e-3 }
            .fit(x.view(), y.view())
            .unwrap();
        assert_eq!(model.predict_labels(x.view()), y);
    }
}
