//! Logistic regression with an unpenalised intercept.
//!
//! With the L2 penalty the objective is
//! `0.5 |w|² + C Σ log(1 + exp(-yᵢ (w·xᵢ + b)))`, `yᵢ ∈ {-1, 1}`, fitted by
//! truncated Newton (conjugate gradient inner solve, Armijo backtracking).
//! The L1 penalty goes through [`super::sparse`].

use super::sparse::{fit_l1, Logistic};
use super::{check_shape, Classifier, LinearModel};
use crate::config::Penalty;
use crate::error::ModelError;
use ndarray::{s, Array1, ArrayView1, ArrayView2};

const MAX_CG_STEPS: usize = 50;
const MAX_LINE_SEARCH: usize = 30;
/// Keeps the Hessian definite along the bias direction.
const BIAS_DAMPING: f64 = 1e-8;

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    pub penalty: Penalty,
    pub c: f64,
    /// Stop once the gradient norm falls below `tol` times its initial value.
    pub tol: f64,
    pub max_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            penalty: Penalty::L2,
            c: 1.0,
            tol: 1e-4,
            max_iter: 100,
        }
    }
}

/// Objective pieces over a packed parameter vector `[w.., b]`.
struct Problem<'a> {
    x: ArrayView2<'a, f64>,
    signs: Array1<f64>,
    c: f64,
}

impl Problem<'_> {
    fn margins(&self, params: &Array1<f64>) -> Array1<f64> {
        let p = self.x.ncols();
        let z = self.x.dot(&params.slice(s![..p])) + params[p];
        z * &self.signs
    }

    fn loss(&self, params: &Array1<f64>) -> f64 {
        let p = self.x.ncols();
        let penalty = 0.5 * params.slice(s![..p]).dot(&params.slice(s![..p]));
        let data: f64 = self.margins(params).iter().map(|&m| log1p_exp(-m)).sum();
        penalty + self.c * data
    }

    /// Gradient and per-sample Hessian weights `σ(z)(1 - σ(z))`.
    fn gradient(&self, params: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let p = self.x.ncols();
        let margins = self.margins(params);
        // d loss / d z_i = -y_i σ(-m_i)
        let residual: Array1<f64> = margins
            .iter()
            .zip(self.signs.iter())
            .map(|(&m, &y)| -y * sigmoid(-m))
            .collect();
        let curvature = margins.mapv(|m| {
            let s = sigmoid(m);
            s * (1.0 - s)
        });

        let mut grad = Array1::<f64>::zeros(p + 1);
        grad.slice_mut(s![..p])
            .assign(&(&params.slice(s![..p]) + &(self.x.t().dot(&residual) * self.c)));
        grad[p] = self.c * residual.sum();
        (grad, curvature)
    }

    fn hessian_dot(&self, curvature: &Array1<f64>, v: &Array1<f64>) -> Array1<f64> {
        let p = self.x.ncols();
        let xv = self.x.dot(&v.slice(s![..p])) + v[p];
        let weighted = xv * curvature * self.c;
        let mut out = Array1::<f64>::zeros(p + 1);
        out.slice_mut(s![..p])
            .assign(&(&v.slice(s![..p]) + &self.x.t().dot(&weighted)));
        out[p] = weighted.sum() + BIAS_DAMPING * v[p];
        out
    }

    /// Approximately solve `H d = -g` by conjugate gradient.
    fn newton_direction(&self, grad: &Array1<f64>, curvature: &Array1<f64>) -> Array1<f64> {
        let grad_norm = grad.dot(grad).sqrt();
        let tolerance = grad_norm.sqrt().min(0.5) * grad_norm;
        let mut d = Array1::<f64>::zeros(grad.len());
        let mut r = -grad;
        let mut direction = r.clone();
        let mut rr = r.dot(&r);
        for _ in 0..MAX_CG_STEPS {
            if rr.sqrt() <= tolerance {
                break;
            }
            let hd = self.hessian_dot(curvature, &direction);
            let curvature_along = direction.dot(&hd);
            if curvature_along <= 0.0 {
                break;
            }
            let step = rr / curvature_along;
            d.scaled_add(step, &direction);
            r.scaled_add(-step, &hd);
            let rr_next = r.dot(&r);
            direction = &r + &(direction * (rr_next / rr));
            rr = rr_next;
        }
        if d.iter().all(|v| *v == 0.0) {
            -grad
        } else {
            d
        }
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        match self.penalty {
            Penalty::L1 => "logistic_l1",
            Penalty::L2 => "logistic_l2",
        }
    }

    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<u8>) -> Result<LinearModel, ModelError> {
        if self.penalty == Penalty::L1 {
            return fit_l1(&Logistic, "logistic", x, y, self.c, self.tol, self.max_iter);
        }
        check_shape(x, y.len())?;
        let problem = Problem {
            x,
            signs: y.mapv(|l| if l == 1 { 1.0 } else { -1.0 }),
            c: self.c,
        };
        let p = x.ncols();
        let mut params = Array1::<f64>::zeros(p + 1);
        let mut loss = problem.loss(&params);
        let (mut grad, mut curvature) = problem.gradient(&params);
        let initial_norm = grad.dot(&grad).sqrt();

        for iteration in 0..self.max_iter {
            let norm = grad.dot(&grad).sqrt();
            if norm <= self.tol * initial_norm.max(f64::MIN_POSITIVE) {
                tracing::trace!(iterations = iteration, "logistic converged");
                return Ok(LinearModel {
                    weights: params.slice(s![..p]).to_owned(),
                    intercept: params[p],
                });
            }

            let direction = problem.newton_direction(&grad, &curvature);
            let slope = grad.dot(&direction);
            let mut step = 1.0;
            let mut accepted = false;
            for _ in 0..MAX_LINE_SEARCH {
                let candidate = &params + &(&direction * step);
                let candidate_loss = problem.loss(&candidate);
                if candidate_loss <= loss + 1e-4 * step * slope {
                    params = candidate;
                    loss = candidate_loss;
                    accepted = true;
                    break;
                }
                step *= 0.5;
            }
            if !accepted {
                break;
            }
            (grad, curvature) = problem.gradient(&params);
        }

        Err(ModelError::NotConverged {
            solver: "logistic",
            iterations: self.max_iter,
        })
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow.
pub(crate) fn log1p_exp(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn stable_helpers() {
        assert_abs_diff_eq!(sigmoid(0.0), 0.5);
        assert_abs_diff_eq!(log1p_exp(0.0), 2f64.ln(), epsilon = 1e-12);
        assert!(log1p_exp(800.0).is_finite());
        assert_abs_diff_eq!(sigmoid(-800.0), 0.0);
    }

    #[test]
    fn fits_overlapping_classes() {
        let x = array![[-2.0], [-1.0], [-0.5], [0.5], [-0.2], [1.0], [2.0], [0.3]];
        let y = array![0u8, 0, 0, 1, 1, 1, 1, 0];
        let model = LogisticRegression::default().fit(x.view(), y.view()).unwrap();
        assert!(model.weights[0] > 0.0);
        let predicted = model.predict_labels(array![[-3.0], [3.0]].view());
        assert_eq!(predicted, array![0u8, 1]);
    }

    #[test]
    fn gradient_vanishes_at_solution() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [2.0, 1.0]];
        let y = array![0u8, 1, 1, 0, 0];
        let model = LogisticRegression {
            penalty: Penalty::L2,
            c: 0.5,
            tol: 1e-6,
            max_iter: 100,
        }
        .fit(x.view(), y.view())
        .unwrap();

        let problem = Problem {
            x: x.view(),
            signs: y.mapv(|l| if l == 1 { 1.0 } else { -1.0 }),
            c: 0.5,
        };
        let mut params = Array1::<f64>::zeros(3);
        params.slice_mut(s![..2]).assign(&model.weights);
        params[2] = model.intercept;
        let (grad, _) = problem.gradient(&params);
        assert!(grad.iter().all(|g| g.abs() < 1e-4));
    }
}
