//! # Constrained Minimization
//!
//! Minimizes the logistic objective subject to the compiled shape constraints
//! with an augmented-Lagrangian scheme:
//!
//! 1.  **Inner loop (BFGS):** for fixed multipliers and penalty, minimize the
//!     augmented Lagrangian with `wolfe_bfgs`, warm-started from the previous
//!     solution.
//!
//! 2.  **Outer loop:** update the multipliers from the constraint residuals and
//!     grow the penalty whenever the worst violation fails to shrink fast enough.
//!
//! For an equality `c(x) = 0` the augmented term is `-l c + (mu / 2) c^2`; for an
//! inequality `c(x) >= 0` it is `(max(0, v - mu c)^2 - v^2) / (2 mu)`.
//!
//! Non-convergence is reported in `FitDiagnostics`, never raised. The caller
//! decides whether to accept the coefficients.

use wolfe_bfgs::{Bfgs, BfgsError, BfgsSolution};

use crate::constraints::{SolverConstraint, max_violation};
use crate::objective::LogisticObjective;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Value handed to BFGS in place of a non-finite cost.
const NON_FINITE_COST: f64 = 1e10;
/// Required shrink factor of the worst violation between outer iterations
/// before the penalty is increased.
const VIOLATION_SHRINK: f64 = 0.25;

/// Iteration and tolerance limits for the constrained minimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Gradient-norm tolerance of each inner BFGS solve.
    pub tolerance: f64,
    /// Iteration cap of each inner BFGS solve.
    pub max_iterations: usize,
    pub max_outer_iterations: usize,
    /// Largest constraint violation accepted as feasible.
    pub constraint_tolerance: f64,
    pub initial_penalty: f64,
    pub penalty_growth: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 500,
            max_outer_iterations: 30,
            constraint_tolerance: 1e-6,
            initial_penalty: 10.0,
            penalty_growth: 10.0,
        }
    }
}

/// Outcome of a fit, as seen by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FitStatus {
    /// Gradient tolerance met at a feasible point.
    Converged,
    /// Line search could make no further progress; the best point found is kept.
    Stalled,
    /// BFGS hit its iteration cap.
    MaxIterationsReached,
    /// The outer loop ran out before the constraints were satisfied.
    Infeasible,
    /// BFGS aborted; the last accepted point is kept.
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub status: FitStatus,
    /// BFGS iterations summed over all inner solves.
    pub iterations: usize,
    pub outer_iterations: usize,
    /// Objective value (without augmented terms) at the returned coefficients.
    pub objective: f64,
    pub max_violation: f64,
}

impl FitDiagnostics {
    pub fn converged(&self) -> bool {
        self.status == FitStatus::Converged
    }
}

pub struct SolverOutcome {
    pub coefficients: Array1<f64>,
    pub diagnostics: FitDiagnostics,
}

/// Augmented Lagrangian for fixed multipliers and penalty.
struct AugmentedLagrangian<'a, 'o> {
    objective: &'a LogisticObjective<'o>,
    constraints: &'a [SolverConstraint],
    multipliers: &'a Array1<f64>,
    penalty: f64,
}

impl AugmentedLagrangian<'_, '_> {
    fn cost_and_grad(&self, beta: &Array1<f64>) -> (f64, Array1<f64>) {
        let (mut cost, mut grad) = self.objective.loss_and_gradient(beta);
        let mu = self.penalty;
        for (constraint, &lambda) in self.constraints.iter().zip(self.multipliers.iter()) {
            let c = constraint.evaluate(beta);
            if constraint.is_equality() {
                cost += -lambda * c + 0.5 * mu * c * c;
                constraint.accumulate_gradient(-lambda + mu * c, &mut grad);
            } else {
                let shifted = (lambda - mu * c).max(0.0);
                cost += (shifted * shifted - lambda * lambda) / (2.0 * mu);
                constraint.accumulate_gradient(-shifted, &mut grad);
            }
        }

        if !cost.is_finite() || grad.iter().any(|g| !g.is_finite()) {
            log::warn!(
                "Non-finite augmented cost encountered: {}, returning large finite value",
                cost
            );
            return (NON_FINITE_COST, Array1::zeros(beta.len()));
        }
        (cost, grad)
    }

    fn update_multipliers(&self, beta: &Array1<f64>) -> Array1<f64> {
        let mu = self.penalty;
        self.constraints
            .iter()
            .zip(self.multipliers.iter())
            .map(|(constraint, &lambda)| {
                let c = constraint.evaluate(beta);
                if constraint.is_equality() {
                    lambda - mu * c
                } else {
                    (lambda - mu * c).max(0.0)
                }
            })
            .collect()
    }
}

struct InnerSolve {
    point: Array1<f64>,
    iterations: usize,
    status: FitStatus,
}

fn run_bfgs(
    problem: &AugmentedLagrangian<'_, '_>,
    start: Array1<f64>,
    config: &SolverConfig,
) -> InnerSolve {
    let fallback = start.clone();
    let solver = Bfgs::new(start, |beta: &Array1<f64>| problem.cost_and_grad(beta))
        .with_tolerance(config.tolerance)
        .with_max_iterations(config.max_iterations);

    let (solution, status): (BfgsSolution, FitStatus) = match solver.run() {
        Ok(solution) => (solution, FitStatus::Converged),
        Err(BfgsError::LineSearchFailed { last_solution, .. }) => {
            log::debug!("Line search stopped early; using best-so-far coefficients.");
            (*last_solution, FitStatus::Stalled)
        }
        Err(BfgsError::MaxIterationsReached { last_solution }) => {
            log::warn!("BFGS hit the iteration cap; using best-so-far coefficients.");
            (*last_solution, FitStatus::MaxIterationsReached)
        }
        Err(e) => {
            log::warn!("BFGS aborted: {e:?}");
            return InnerSolve {
                point: fallback,
                iterations: 0,
                status: FitStatus::Failed(format!("{e:?}")),
            };
        }
    };

    InnerSolve {
        point: solution.final_point,
        iterations: solution.iterations,
        status,
    }
}

/// Minimizes `objective` from `initial` subject to `constraints`.
pub fn minimize(
    objective: &LogisticObjective<'_>,
    initial: Array1<f64>,
    constraints: &[SolverConstraint],
    config: &SolverConfig,
) -> SolverOutcome {
    let mut beta = initial;
    let mut multipliers = Array1::<f64>::zeros(constraints.len());
    let mut penalty = config.initial_penalty;
    let mut previous_violation = f64::INFINITY;
    let mut iterations = 0;
    let mut outer_iterations = 0;
    let mut status = FitStatus::Infeasible;

    for outer in 1..=config.max_outer_iterations.max(1) {
        outer_iterations = outer;
        let problem = AugmentedLagrangian {
            objective,
            constraints,
            multipliers: &multipliers,
            penalty,
        };
        let inner = run_bfgs(&problem, beta, config);
        beta = inner.point;
        iterations += inner.iterations;

        let violation = max_violation(constraints, &beta);
        log::debug!(
            "Outer iteration {}: {} BFGS iterations, penalty {:.1e}, max violation {:.3e}, status {:?}",
            outer,
            inner.iterations,
            penalty,
            violation,
            inner.status
        );

        if matches!(inner.status, FitStatus::Failed(_)) || violation <= config.constraint_tolerance
        {
            status = inner.status;
            break;
        }

        multipliers = problem.update_multipliers(&beta);
        if violation > VIOLATION_SHRINK * previous_violation {
            penalty *= config.penalty_growth;
        }
        previous_violation = violation;
    }

    let final_objective = objective.loss(&beta);
    if !final_objective.is_finite() {
        status = FitStatus::Failed(format!("non-finite objective {final_objective}"));
    }
    let diagnostics = FitDiagnostics {
        status,
        iterations,
        outer_iterations,
        objective: final_objective,
        max_violation: max_violation(constraints, &beta),
    };
    if !diagnostics.converged() {
        log::warn!(
            "Optimizer did not converge: {:?} after {} iterations (max violation {:.3e})",
            diagnostics.status,
            diagnostics.iterations,
            diagnostics.max_violation
        );
    }

    SolverOutcome {
        coefficients: beta,
        diagnostics,
    }
}
