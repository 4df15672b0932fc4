//! # Weighted Ridge-Penalized Logistic Loss
//!
//! `L(b) = -sum_i w_i [y_i log h_i + (1 - y_i) log(1 - h_i)] / sum(w) + (alpha / 2) sum_j b_j^2`
//!
//! with `h = sigmoid(X b + offset)`. The sum in the penalty runs over every
//! coefficient except the intercept, which is always the last column.
//!
//! The penalty enters the gradient multiplicatively by default: each
//! non-intercept component of the data gradient is scaled by `(1 + alpha)`
//! rather than receiving the textbook `alpha * b_j`. Fitted scorecards depend on
//! that form, so it is kept as the default and `RidgeGradient::Additive` is an
//! explicit opt-in.

use crate::design::DesignMatrix;
use crate::scorecard::ScorecardError;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ALPHA: f64 = 0.001;

/// How the ridge penalty contributes to the analytic gradient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RidgeGradient {
    /// `grad_j += alpha * grad_j`
    #[default]
    Multiplicative,
    /// `grad_j += alpha * b_j`, the exact gradient of the penalized loss.
    Additive,
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// `log(1 + e^z)` without overflow; `-log(sigmoid(z)) == softplus(-z)`.
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

/// Loss and gradient over a fixed design matrix, outcome and offset.
pub struct LogisticObjective<'a> {
    x: &'a DesignMatrix,
    y: ArrayView1<'a, f64>,
    w: ArrayView1<'a, f64>,
    offset: Array1<f64>,
    alpha: f64,
    ridge_gradient: RidgeGradient,
    total_weight: f64,
}

impl<'a> LogisticObjective<'a> {
    /// A missing offset is treated as all zeros.
    pub fn new(
        x: &'a DesignMatrix,
        y: ArrayView1<'a, f64>,
        w: ArrayView1<'a, f64>,
        offset: Option<ArrayView1<f64>>,
        alpha: f64,
    ) -> Result<Self, ScorecardError> {
        let n = x.nrows();
        for (what, found) in [("labels", y.len()), ("weights", w.len())] {
            if found != n {
                return Err(ScorecardError::DimensionMismatch {
                    what,
                    expected: n,
                    found,
                });
            }
        }
        let offset = match offset {
            Some(o) if o.len() != n => {
                return Err(ScorecardError::DimensionMismatch {
                    what: "offset",
                    expected: n,
                    found: o.len(),
                });
            }
            Some(o) => {
                if let Some((row, &value)) = o.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                    return Err(ScorecardError::NonFiniteOffset { row, value });
                }
                o.to_owned()
            }
            None => Array1::zeros(n),
        };
        Ok(Self {
            x,
            y,
            w,
            offset,
            alpha,
            ridge_gradient: RidgeGradient::default(),
            total_weight: w.sum(),
        })
    }

    pub fn with_ridge_gradient(mut self, ridge_gradient: RidgeGradient) -> Self {
        self.ridge_gradient = ridge_gradient;
        self
    }

    pub fn num_coeffs(&self) -> usize {
        self.x.ncols()
    }

    fn linear_predictor(&self, beta: &Array1<f64>) -> Array1<f64> {
        self.x.matrix_vector_multiply(beta.view()) + &self.offset
    }

    fn penalty(&self, beta: &Array1<f64>) -> f64 {
        let p = beta.len();
        let sum_sq: f64 = beta.iter().take(p.saturating_sub(1)).map(|b| b * b).sum();
        0.5 * self.alpha * sum_sq
    }

    fn loss_from_eta(&self, eta: &Array1<f64>, beta: &Array1<f64>) -> f64 {
        let nll: f64 = eta
            .iter()
            .zip(self.y.iter())
            .zip(self.w.iter())
            .map(|((&z, &y), &w)| w * (y * softplus(-z) + (1.0 - y) * softplus(z)))
            .sum();
        nll / self.total_weight + self.penalty(beta)
    }

    fn gradient_from_eta(&self, eta: &Array1<f64>, beta: &Array1<f64>) -> Array1<f64> {
        let residual: Array1<f64> = eta
            .iter()
            .zip(self.y.iter())
            .zip(self.w.iter())
            .map(|((&z, &y), &w)| w * (sigmoid(z) - y))
            .collect();
        let mut grad = self.x.transpose_vector_multiply(residual.view()) / self.total_weight;

        // The intercept (last entry) is never penalized.
        let p = grad.len();
        for j in 0..p.saturating_sub(1) {
            grad[j] += match self.ridge_gradient {
                RidgeGradient::Multiplicative => self.alpha * grad[j],
                RidgeGradient::Additive => self.alpha * beta[j],
            };
        }
        grad
    }

    pub fn loss(&self, beta: &Array1<f64>) -> f64 {
        let eta = self.linear_predictor(beta);
        self.loss_from_eta(&eta, beta)
    }

    pub fn gradient(&self, beta: &Array1<f64>) -> Array1<f64> {
        let eta = self.linear_predictor(beta);
        self.gradient_from_eta(&eta, beta)
    }

    /// Loss and gradient sharing one pass over `X b`.
    pub fn loss_and_gradient(&self, beta: &Array1<f64>) -> (f64, Array1<f64>) {
        let eta = self.linear_predictor(beta);
        (
            self.loss_from_eta(&eta, beta),
            self.gradient_from_eta(&eta, beta),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    struct Problem {
        x: DesignMatrix,
        y: Array1<f64>,
        w: Array1<f64>,
        beta: Array1<f64>,
    }

    fn random_problem(seed: u64, n: usize, p: usize) -> Problem {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut dense = Array2::<f64>::zeros((n, p));
        for i in 0..n {
            for j in 0..p - 1 {
                dense[[i, j]] = rng.sample(StandardNormal);
            }
            dense[[i, p - 1]] = 1.0;
        }
        let y = Array1::from_shape_fn(n, |_| if rng.gen_bool(0.4) { 1.0 } else { 0.0 });
        let w = Array1::from_shape_fn(n, |_| rng.gen_range(0.2..3.0));
        let beta = Array1::from_shape_fn(p, |_| 0.5 * rng.sample::<f64, _>(StandardNormal));
        Problem {
            x: DesignMatrix::from_dense(&dense).unwrap(),
            y,
            w,
            beta,
        }
    }

    fn finite_difference(objective: &LogisticObjective, beta: &Array1<f64>) -> Array1<f64> {
        let h = 1e-6;
        Array1::from_shape_fn(beta.len(), |j| {
            let mut plus = beta.clone();
            let mut minus = beta.clone();
            plus[j] += h;
            minus[j] -= h;
            (objective.loss(&plus) - objective.loss(&minus)) / (2.0 * h)
        })
    }

    #[test]
    fn analytic_gradient_matches_finite_differences_without_penalty() {
        for seed in 0..5 {
            let problem = random_problem(seed, 60, 5);
            let objective =
                LogisticObjective::new(&problem.x, problem.y.view(), problem.w.view(), None, 0.0)
                    .unwrap();
            let numeric = finite_difference(&objective, &problem.beta);
            let analytic = objective.gradient(&problem.beta);
            for (a, n) in analytic.iter().zip(numeric.iter()) {
                assert_abs_diff_eq!(a, n, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn additive_ridge_gradient_is_the_exact_gradient() {
        let problem = random_problem(11, 80, 6);
        let objective =
            LogisticObjective::new(&problem.x, problem.y.view(), problem.w.view(), None, 0.3)
                .unwrap()
                .with_ridge_gradient(RidgeGradient::Additive);
        let numeric = finite_difference(&objective, &problem.beta);
        let analytic = objective.gradient(&problem.beta);
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert_abs_diff_eq!(a, n, epsilon = 1e-6);
        }
    }

    #[test]
    fn multiplicative_ridge_gradient_scales_non_intercept_components() {
        let problem = random_problem(3, 50, 4);
        let alpha = 0.25;
        let plain =
            LogisticObjective::new(&problem.x, problem.y.view(), problem.w.view(), None, 0.0)
                .unwrap();
        let penalized =
            LogisticObjective::new(&problem.x, problem.y.view(), problem.w.view(), None, alpha)
                .unwrap();
        let g0 = plain.gradient(&problem.beta);
        let g = penalized.gradient(&problem.beta);
        for j in 0..3 {
            assert_abs_diff_eq!(g[j], (1.0 + alpha) * g0[j], epsilon = 1e-12);
        }
        assert_abs_diff_eq!(g[3], g0[3], epsilon = 1e-12);
    }

    #[test]
    fn unit_weights_reduce_to_mean_negative_log_likelihood() {
        let problem = random_problem(7, 40, 3);
        let ones = Array1::ones(40);
        let objective =
            LogisticObjective::new(&problem.x, problem.y.view(), ones.view(), None, 0.0).unwrap();

        let eta = problem.x.to_dense().dot(&problem.beta);
        let mean_nll = eta
            .iter()
            .zip(problem.y.iter())
            .map(|(&z, &y)| {
                let h = sigmoid(z);
                -(y * h.ln() + (1.0 - y) * (1.0 - h).ln())
            })
            .sum::<f64>()
            / 40.0;
        assert_abs_diff_eq!(objective.loss(&problem.beta), mean_nll, epsilon = 1e-10);
    }

    #[test]
    fn penalty_skips_the_intercept() {
        let problem = random_problem(5, 30, 4);
        let alpha = 0.5;
        let plain =
            LogisticObjective::new(&problem.x, problem.y.view(), problem.w.view(), None, 0.0)
                .unwrap();
        let penalized =
            LogisticObjective::new(&problem.x, problem.y.view(), problem.w.view(), None, alpha)
                .unwrap();
        let beta = array![1.0, -2.0, 0.5, 40.0];
        let expected_penalty = 0.5 * alpha * (1.0 + 4.0 + 0.25);
        assert_abs_diff_eq!(
            penalized.loss(&beta) - plain.loss(&beta),
            expected_penalty,
            epsilon = 1e-10
        );
    }

    #[test]
    fn constant_offset_acts_like_an_intercept_shift() {
        let problem = random_problem(9, 30, 3);
        let offset = Array1::from_elem(30, 0.7);
        let with_offset = LogisticObjective::new(
            &problem.x,
            problem.y.view(),
            problem.w.view(),
            Some(offset.view()),
            0.0,
        )
        .unwrap();
        let without =
            LogisticObjective::new(&problem.x, problem.y.view(), problem.w.view(), None, 0.0)
                .unwrap();
        let mut shifted = problem.beta.clone();
        shifted[2] += 0.7;
        assert_abs_diff_eq!(
            with_offset.loss(&problem.beta),
            without.loss(&shifted),
            epsilon = 1e-12
        );
    }

    #[test]
    fn mismatched_offset_is_rejected() {
        let problem = random_problem(1, 10, 2);
        let offset = Array1::zeros(9);
        let err = LogisticObjective::new(
            &problem.x,
            problem.y.view(),
            problem.w.view(),
            Some(offset.view()),
            0.0,
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            ScorecardError::DimensionMismatch {
                what: "offset",
                expected: 10,
                found: 9
            }
        ));
    }

    #[test]
    fn non_finite_offset_is_rejected() {
        let problem = random_problem(2, 4, 2);
        let offset = array![0.0, f64::NAN, 1.0, f64::INFINITY];
        let err = LogisticObjective::new(
            &problem.x,
            problem.y.view(),
            problem.w.view(),
            Some(offset.view()),
            0.0,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ScorecardError::NonFiniteOffset { row: 1, .. }));
    }

    #[test]
    fn extreme_linear_predictors_stay_finite() {
        let x = DesignMatrix::from_dense(&array![[1.0], [1.0]]).unwrap();
        let y = array![1.0, 0.0];
        let w = array![1.0, 1.0];
        let objective = LogisticObjective::new(&x, y.view(), w.view(), None, 0.0).unwrap();
        let loss = objective.loss(&array![800.0]);
        assert!(loss.is_finite());
        assert_abs_diff_eq!(loss, 400.0, epsilon = 1e-9);
    }
}
