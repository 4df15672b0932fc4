//! # Shape Constraint Compilation
//!
//! Converts every included variable's local constraint descriptors into
//! constraints over global coefficient indices.
//!
//! The running offset advances by each variable's block width in exactly the
//! order and under exactly the step filter that `design::build_design_matrix`
//! uses. If the two walks ever disagree, every constraint silently lands on the
//! wrong coefficients, so both iterate the same ordered `VariableSet` with the
//! same `StepFilter`.

use crate::design::StepFilter;
use crate::variable::{ConstraintKind, VariableSet};
use ndarray::Array1;

/// A linear constraint over global coefficient indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverConstraint {
    /// `x[index] == 0`
    ZeroEquality { index: usize },
    /// `x[base] - x[target] == 0`
    PairEquality { base: usize, target: usize },
    /// `x[base] - x[target] >= 0`
    PairInequality { base: usize, target: usize },
}

impl SolverConstraint {
    pub fn is_equality(&self) -> bool {
        !matches!(self, SolverConstraint::PairInequality { .. })
    }

    /// Constraint function value `c(x)`; feasible when `c(x) == 0` for
    /// equalities and `c(x) >= 0` for inequalities.
    pub fn evaluate(&self, x: &Array1<f64>) -> f64 {
        match *self {
            SolverConstraint::ZeroEquality { index } => x[index],
            SolverConstraint::PairEquality { base, target }
            | SolverConstraint::PairInequality { base, target } => x[base] - x[target],
        }
    }

    /// Adds `scale * grad c(x)` into `grad`. The constraints are linear, so the
    /// gradient does not depend on `x`.
    pub fn accumulate_gradient(&self, scale: f64, grad: &mut Array1<f64>) {
        match *self {
            SolverConstraint::ZeroEquality { index } => grad[index] += scale,
            SolverConstraint::PairEquality { base, target }
            | SolverConstraint::PairInequality { base, target } => {
                grad[base] += scale;
                grad[target] -= scale;
            }
        }
    }

    /// How far `x` is from satisfying the constraint; zero when feasible.
    pub fn violation(&self, x: &Array1<f64>) -> f64 {
        let c = self.evaluate(x);
        if self.is_equality() {
            c.abs()
        } else {
            (-c).max(0.0)
        }
    }
}

/// Largest violation over a constraint set; zero for an empty set.
pub fn max_violation(constraints: &[SolverConstraint], x: &Array1<f64>) -> f64 {
    constraints
        .iter()
        .map(|c| c.violation(x))
        .fold(0.0, f64::max)
}

pub fn compile_constraints(variables: &VariableSet, steps: &StepFilter) -> Vec<SolverConstraint> {
    let mut offset = 0;
    let mut compiled = Vec::new();

    for variable in variables.values().filter(|v| steps.contains(&v.step())) {
        let (width, descriptors) = variable.get_constraints();
        for descriptor in descriptors {
            let base = descriptor.base_offset + offset;
            let target = descriptor.target_offset + offset;
            compiled.push(match descriptor.kind {
                ConstraintKind::ZeroEquality => SolverConstraint::ZeroEquality { index: base },
                ConstraintKind::PairEquality => SolverConstraint::PairEquality { base, target },
                ConstraintKind::PairInequality => SolverConstraint::PairInequality { base, target },
            });
        }
        offset += width;
    }

    log::debug!(
        "Compiled {} constraints over {} variable columns",
        compiled.len(),
        offset
    );
    compiled
}
