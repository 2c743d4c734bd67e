//! L1-penalised linear classifiers fitted by accelerated proximal gradient
//! (FISTA with backtracking on the step size).
//!
//! Objective: `|w|₁ + C Σ loss(yᵢ (w·xᵢ + b))`, `yᵢ ∈ {-1, 1}`. The
//! intercept is not penalised. Soft thresholding sets weights exactly to
//! zero, so the fitted models are sparse.

use super::{check_shape, LinearModel};
use crate::error::ModelError;
use ndarray::{s, Array1, ArrayView1, ArrayView2, ArrayViewMut1};

/// Smooth loss of a signed margin `m = y (w·x + b)`.
pub trait MarginLoss {
    fn value(&self, margin: f64) -> f64;

    fn derivative(&self, margin: f64) -> f64;

    /// Upper bound on the second derivative.
    fn curvature_bound(&self) -> f64;
}

/// `ln(1 + e^-m)`
pub struct Logistic;

impl MarginLoss for Logistic {
    fn value(&self, margin: f64) -> f64 {
        super::logistic::log1p_exp(-margin)
    }

    fn derivative(&self, margin: f64) -> f64 {
        -super::logistic::sigmoid(-margin)
    }

    fn curvature_bound(&self) -> f64 {
        0.25
    }
}

/// `max(0, 1 - m)²`
pub struct SquaredHinge;

impl MarginLoss for SquaredHinge {
    fn value(&self, margin: f64) -> f64 {
        (1.0 - margin).max(0.0).powi(2)
    }

    fn derivative(&self, margin: f64) -> f64 {
        -2.0 * (1.0 - margin).max(0.0)
    }

    fn curvature_bound(&self) -> f64 {
        2.0
    }
}

const POWER_STEPS: usize = 20;
const MAX_BACKTRACK: usize = 60;

/// Data term of the objective and its gradient over packed `[w.., b]`.
struct Smooth<'a, L> {
    x: ArrayView2<'a, f64>,
    signs: Array1<f64>,
    c: f64,
    loss: &'a L,
}

impl<L: MarginLoss> Smooth<'_, L> {
    fn decision(&self, params: &Array1<f64>) -> Array1<f64> {
        let p = self.x.ncols();
        self.x.dot(&params.slice(s![..p])) + params[p]
    }

    fn value(&self, params: &Array1<f64>) -> f64 {
        let z = self.decision(params);
        let total: f64 = z
            .iter()
            .zip(self.signs.iter())
            .map(|(&z, &y)| self.loss.value(y * z))
            .sum();
        self.c * total
    }

    fn gradient(&self, params: &Array1<f64>) -> Array1<f64> {
        let p = self.x.ncols();
        let z = self.decision(params);
        let d: Array1<f64> = z
            .iter()
            .zip(self.signs.iter())
            .map(|(&z, &y)| self.c * y * self.loss.derivative(y * z))
            .collect();
        let mut grad = Array1::<f64>::zeros(p + 1);
        grad.slice_mut(s![..p]).assign(&self.x.t().dot(&d));
        grad[p] = d.sum();
        grad
    }

    /// Power-iteration estimate of the gradient's Lipschitz constant.
    /// Backtracking corrects it when it comes out low.
    fn lipschitz_estimate(&self) -> f64 {
        let p = self.x.ncols();
        let mut v = Array1::<f64>::from_elem(p + 1, 1.0 / ((p + 1) as f64).sqrt());
        let mut squared_norm = 0.0;
        for _ in 0..POWER_STEPS {
            let u = self.x.dot(&v.slice(s![..p])) + v[p];
            let mut w = Array1::<f64>::zeros(p + 1);
            w.slice_mut(s![..p]).assign(&self.x.t().dot(&u));
            w[p] = u.sum();
            squared_norm = norm(&w);
            if squared_norm <= 0.0 || !squared_norm.is_finite() {
                break;
            }
            v = w / squared_norm;
        }
        (self.c * self.loss.curvature_bound() * squared_norm).max(f64::MIN_POSITIVE)
    }
}

/// Fit an L1-penalised model. Stops once the gradient mapping norm falls
/// below `tol` times the initial gradient norm.
pub fn fit_l1<'a, L: MarginLoss>(
    loss: &'a L,
    solver: &'static str,
    x: ArrayView2<'a, f64>,
    y: ArrayView1<u8>,
    c: f64,
    tol: f64,
    max_iter: usize,
) -> Result<LinearModel, ModelError> {
    check_shape(x, y.len())?;
    let p = x.ncols();
    let smooth = Smooth {
        x,
        signs: y.mapv(|l| if l == 1 { 1.0 } else { -1.0 }),
        c,
        loss,
    };
    let mut lipschitz = smooth.lipschitz_estimate();

    let mut current = Array1::<f64>::zeros(p + 1);
    let mut previous = current.clone();
    let initial = norm(&smooth.gradient(&current)).max(f64::MIN_POSITIVE);

    for iteration in 0..max_iter {
        let momentum = iteration as f64 / (iteration as f64 + 3.0);
        let extrapolated = &current + &((&current - &previous) * momentum);
        let grad = smooth.gradient(&extrapolated);
        let base = smooth.value(&extrapolated);

        let mut next = extrapolated.clone();
        for _ in 0..MAX_BACKTRACK {
            let step = 1.0 / lipschitz;
            next = &extrapolated - &(&grad * step);
            soft_threshold(next.slice_mut(s![..p]), step);
            let delta = &next - &extrapolated;
            let bound = base + grad.dot(&delta) + 0.5 * lipschitz * delta.dot(&delta);
            if smooth.value(&next) <= bound + 1e-12 * bound.abs() {
                break;
            }
            lipschitz *= 2.0;
        }
        let mapping = norm(&(&extrapolated - &next)) * lipschitz;
        previous = std::mem::replace(&mut current, next);

        if mapping <= tol * initial {
            tracing::trace!(solver, iterations = iteration + 1, "l1 fit converged");
            return Ok(LinearModel {
                weights: current.slice(s![..p]).to_owned(),
                intercept: current[p],
            });
        }
    }

    Err(ModelError::NotConverged {
        solver,
        iterations: max_iter,
    })
}

fn soft_threshold(mut values: ArrayViewMut1<f64>, threshold: f64) {
    values.mapv_inplace(|v| v.signum() * (v.abs() - threshold).max(0.0));
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // Column 0 carries the label; column 1 is too weak to pay its L1 cost.
    fn one_informative_column() -> (ndarray::Array2<f64>, Array1<u8>) {
        let x = array![
            [-2.0, 0.1],
            [-1.0, -0.1],
            [-0.5, 0.1],
            [0.5, -0.1],
            [-0.2, -0.1],
            [1.0, 0.1],
            [2.0, -0.1],
            [0.3, 0.1],
        ];
        (x, array![0u8, 0, 0, 1, 1, 1, 1, 0])
    }

    #[test]
    fn soft_threshold_shrinks_towards_zero() {
        let mut v = array![3.0, -0.5, 0.2, -2.0];
        soft_threshold(v.view_mut(), 1.0);
        assert_eq!(v, array![2.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn logistic_keeps_only_informative_column() {
        let (x, y) = one_informative_column();
        let model = fit_l1(&Logistic, "logistic", x.view(), y.view(), 1.0, 1e-4, 5000).unwrap();
        assert!(model.weights[0] > 0.0);
        assert_eq!(model.weights[1], 0.0);
    }

    #[test]
    fn squared_hinge_keeps_only_informative_column() {
        let (x, y) = one_informative_column();
        let model =
            fit_l1(&SquaredHinge, "svc", x.view(), y.view(), 0.1, 1e-4, 5000).unwrap();
        assert!(model.weights[0] > 0.0);
        assert_eq!(model.weights[1], 0.0);
    }

    #[test]
    fn small_c_zeroes_every_weight() {
        let (x, y) = one_informative_column();
        let model = fit_l1(&Logistic, "logistic", x.view(), y.view(), 0.01, 1e-4, 5000).unwrap();
        assert!(model.is_constant());
    }

    #[test]
    fn exhausted_iterations_report_non_convergence() {
        let (x, y) = one_informative_column();
        assert_eq!(
            fit_l1(&SquaredHinge, "svc", x.view(), y.view(), 1.0, 0.0, 1),
            Err(ModelError::NotConverged {
                solver: "svc",
                iterations: 1
            })
        );
    }
}
