//! # Scorecard
//!
//! The aggregate that owns the live variable set, the optional cached training
//! data and outcome, held-out evaluation sets, and the model history.
//!
//! A fit builds the design matrix and the constraint set from the *same*
//! variables and step filter, minimizes the penalized logistic loss from a zero
//! start, and appends the result as a new model carrying a deep copy of the
//! variables. Loading a historical model restores both the current model and a
//! fresh copy of its variables.
//!
//! None of the mutating operations are atomic. Callers sharing one `Scorecard`
//! across threads must serialize access themselves.

use crate::constraints::{SolverConstraint, compile_constraints};
use crate::data::DataError;
use crate::design::{
    DesignMatrix, StepFilter, build_design_matrix, default_steps, variable_column,
};
use crate::model::{Model, ModelHistory, ModelId};
use crate::objective::{DEFAULT_ALPHA, LogisticObjective, RidgeGradient};
use crate::optimizer::{SolverConfig, minimize};
use crate::performance::{Performance, PerformanceError};
use crate::variable::{BinRow, Variable, VariableError, VariableSet, VariableSummary};
use ndarray::{Array1, ArrayView1};
use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScorecardError {
    #[error(
        "Data and outcome must be provided together, or both must be cached on the scorecard."
    )]
    MissingInput,
    #[error("No model has been fit yet.")]
    NoModelFitted,
    #[error("No model found with name '{0}'.")]
    ModelNotFound(String),
    #[error("Invalid model index {index}; the history holds {len} models.")]
    InvalidModelIndex { index: usize, len: usize },
    #[error("Variable '{0}' has no matching column in the supplied data.")]
    SchemaMismatch(String),
    #[error("Unknown variable '{0}'.")]
    UnknownVariable(String),
    #[error("Variable '{0}' is defined more than once.")]
    DuplicateVariable(String),
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}.")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Offset {value} at row {row} is not finite.")]
    NonFiniteOffset { row: usize, value: f64 },
    #[error("Failed to assemble sparse matrix: {0}")]
    SparseAssembly(String),
    #[error(transparent)]
    Variable(#[from] VariableError),
    #[error(transparent)]
    Performance(#[from] PerformanceError),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Options of a single fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Ridge strength on every non-intercept coefficient.
    pub alpha: f64,
    /// Variables whose step is in this set take part in the fit.
    pub steps: StepFilter,
    pub ridge_gradient: RidgeGradient,
    pub solver: SolverConfig,
    /// Fixed per-row addition to the linear predictor, e.g. a baseline score.
    #[serde(skip)]
    pub offset: Option<Array1<f64>>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            steps: default_steps(),
            ridge_gradient: RidgeGradient::default(),
            solver: SolverConfig::default(),
            offset: None,
        }
    }
}

/// Bin table of one variable over one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDisplay {
    /// `"fit"` for the training data, `"eval_<i>"` for evaluation sets.
    pub sample: String,
    pub rows: Vec<BinRow>,
}

pub type EvalSet = (DataFrame, Performance);

pub struct Scorecard {
    variables: VariableSet,
    data: Option<DataFrame>,
    perf: Option<Performance>,
    eval_sets: Option<Vec<EvalSet>>,
    history: ModelHistory,
}

impl Scorecard {
    /// Creates a scorecard from discretized variables. Their order becomes the
    /// column order of every design matrix.
    pub fn new(variables: impl IntoIterator<Item = Variable>) -> Result<Self, ScorecardError> {
        let mut set = VariableSet::new();
        for variable in variables {
            let name = variable.name().to_string();
            if set.contains_key(&name) {
                return Err(ScorecardError::DuplicateVariable(name));
            }
            set.insert(name, variable);
        }
        Ok(Self {
            variables: set,
            data: None,
            perf: None,
            eval_sets: None,
            history: ModelHistory::new(),
        })
    }

    /// Caches training data and outcome for later calls that omit them.
    pub fn with_data(mut self, data: DataFrame, perf: Performance) -> Result<Self, ScorecardError> {
        check_rows(&data, &perf)?;
        self.data = Some(data);
        self.perf = Some(perf);
        Ok(self)
    }

    pub fn data(&self) -> Option<&DataFrame> {
        self.data.as_ref()
    }

    pub fn performance(&self) -> Option<&Performance> {
        self.perf.as_ref()
    }

    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Result<&Variable, ScorecardError> {
        self.variables
            .get(name)
            .ok_or_else(|| ScorecardError::UnknownVariable(name.to_string()))
    }

    /// Mutable access to a live variable, e.g. to re-bin it. Models already in
    /// the history keep their own copies.
    pub fn variable_mut(&mut self, name: &str) -> Result<&mut Variable, ScorecardError> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| ScorecardError::UnknownVariable(name.to_string()))
    }

    pub fn eval_sets(&self) -> Option<&[EvalSet]> {
        self.eval_sets.as_deref()
    }

    pub fn set_eval_sets(&mut self, eval_sets: Option<Vec<EvalSet>>) -> Result<(), ScorecardError> {
        if let Some(sets) = &eval_sets {
            for (data, perf) in sets {
                check_rows(data, perf)?;
            }
        }
        self.eval_sets = eval_sets;
        Ok(())
    }

    /// The current model, if any model has been fit or loaded.
    pub fn model(&self) -> Option<&Model> {
        self.history.current()
    }

    /// Names of all fitted models, oldest first.
    pub fn models(&self) -> Vec<&str> {
        self.history.names()
    }

    pub fn history(&self) -> &ModelHistory {
        &self.history
    }

    /// Explicit arguments win; otherwise the cached pair is used. A partial
    /// cache or a single argument is not enough.
    fn resolve_inputs<'a>(
        &'a self,
        data: Option<&'a DataFrame>,
        perf: Option<&'a Performance>,
    ) -> Result<(&'a DataFrame, &'a Performance), ScorecardError> {
        match (data, perf) {
            (Some(data), Some(perf)) => Ok((data, perf)),
            _ => match (&self.data, &self.perf) {
                (Some(data), Some(perf)) => Ok((data, perf)),
                _ => Err(ScorecardError::MissingInput),
            },
        }
    }

    fn resolve_data<'a>(
        &'a self,
        data: Option<&'a DataFrame>,
    ) -> Result<&'a DataFrame, ScorecardError> {
        data.or(self.data.as_ref()).ok_or(ScorecardError::MissingInput)
    }

    /// Design matrix of the live variables over `data` (or the cached data).
    pub fn to_sparse(
        &self,
        data: Option<&DataFrame>,
        steps: &StepFilter,
    ) -> Result<DesignMatrix, ScorecardError> {
        let data = self.resolve_data(data)?;
        Ok(build_design_matrix(data, &self.variables, steps)?.0)
    }

    /// Solver constraints of the live variables, aligned with `to_sparse`.
    pub fn get_constraints(&self, steps: &StepFilter) -> Vec<SolverConstraint> {
        compile_constraints(&self.variables, steps)
    }

    /// Fits a new model, appends it to the history and makes it current.
    ///
    /// Solver non-convergence does not fail the fit; inspect
    /// `model.diagnostics()` instead.
    pub fn fit(
        &mut self,
        data: Option<&DataFrame>,
        perf: Option<&Performance>,
        options: &FitOptions,
    ) -> Result<&Model, ScorecardError> {
        let model = {
            let (data, perf) = self.resolve_inputs(data, perf)?;
            check_rows(data, perf)?;

            let (x, layout) = build_design_matrix(data, &self.variables, &options.steps)?;
            let constraints = compile_constraints(&self.variables, &options.steps);
            let name = self.history.next_name();
            log::info!(
                "Fitting {} on {} rows: {} coefficients, {} constraints, alpha {}",
                name,
                x.nrows(),
                x.ncols(),
                constraints.len(),
                options.alpha
            );

            let objective = LogisticObjective::new(
                &x,
                perf.labels(),
                perf.weights(),
                options.offset.as_ref().map(|o| o.view()),
                options.alpha,
            )?
            .with_ridge_gradient(options.ridge_gradient);
            let outcome = minimize(
                &objective,
                Array1::zeros(x.ncols()),
                &constraints,
                &options.solver,
            );
            log::info!(
                "{} finished with status {:?} after {} iterations; objective {:.6}",
                name,
                outcome.diagnostics.status,
                outcome.diagnostics.iterations,
                outcome.diagnostics.objective
            );

            Model::new(
                name,
                outcome.coefficients,
                outcome.diagnostics,
                self.variables.clone(),
                layout,
                options.steps.clone(),
                options.alpha,
            )
        };
        Ok(self.history.save(model))
    }

    /// Appends an externally obtained model and makes it current. The live
    /// variables are left alone.
    pub fn save_model(&mut self, model: Model) -> &Model {
        self.history.save(model)
    }

    /// Makes a historical model current and replaces the live variables with a
    /// copy of the variables it was fit on.
    pub fn load_model(&mut self, id: impl Into<ModelId>) -> Result<&Model, ScorecardError> {
        let model = self.history.load(&id.into())?;
        self.variables = model.variables().clone();
        log::info!("Loaded {}", model.name());
        Ok(model)
    }

    /// Linear scores `X b` of the current model over `data` (or the cached data).
    ///
    /// The design matrix is built from the live variables with the current
    /// model's step filter. Keeping the live variables consistent with the
    /// current model is up to the caller.
    pub fn predict(&self, data: Option<&DataFrame>) -> Result<Array1<f64>, ScorecardError> {
        let model = self.model().ok_or(ScorecardError::NoModelFitted)?;
        let data = self.resolve_data(data)?;
        let (x, _) = build_design_matrix(data, &self.variables, model.steps())?;
        if x.ncols() != model.coefficients().len() {
            return Err(ScorecardError::DimensionMismatch {
                what: "design matrix columns",
                expected: model.coefficients().len(),
                found: x.ncols(),
            });
        }
        Ok(x.matrix_vector_multiply(model.coefficients()))
    }

    /// One summary per live variable, in variable order.
    pub fn summary(
        &self,
        data: Option<&DataFrame>,
        perf: Option<&Performance>,
    ) -> Result<Vec<VariableSummary>, ScorecardError> {
        let (data, perf) = self.resolve_inputs(data, perf)?;
        check_rows(data, perf)?;
        let variables: Vec<&Variable> = self.variables.values().collect();
        variables
            .par_iter()
            .map(|v| -> Result<VariableSummary, ScorecardError> {
                let column = variable_column(data, v)?;
                Ok(v.summary(column.view(), perf)?)
            })
            .collect()
    }

    /// Bin table of one variable over the fit data, followed by one table per
    /// evaluation set when `include_eval_sets` is set.
    pub fn display_variable(
        &self,
        name: &str,
        data: Option<&DataFrame>,
        perf: Option<&Performance>,
        include_eval_sets: bool,
    ) -> Result<Vec<VariableDisplay>, ScorecardError> {
        let (data, perf) = self.resolve_inputs(data, perf)?;
        let variable = self.variable(name)?;

        let mut samples: Vec<(String, &DataFrame, &Performance)> =
            vec![("fit".to_string(), data, perf)];
        if include_eval_sets {
            if let Some(sets) = &self.eval_sets {
                samples.extend(
                    sets.iter()
                        .enumerate()
                        .map(|(i, (d, p))| (format!("eval_{i}"), d, p)),
                );
            }
        }

        samples
            .into_iter()
            .map(|(sample, data, perf)| -> Result<VariableDisplay, ScorecardError> {
                let column = variable_column(data, variable)?;
                Ok(VariableDisplay {
                    sample,
                    rows: variable.display(column.view(), perf)?,
                })
            })
            .collect()
    }
}

fn check_rows(data: &DataFrame, perf: &Performance) -> Result<(), ScorecardError> {
    if data.height() != perf.len() {
        return Err(ScorecardError::DimensionMismatch {
            what: "outcome rows",
            expected: data.height(),
            found: perf.len(),
        });
    }
    Ok(())
}

/// Scores as probabilities, `sigmoid(X b)`.
pub fn scores_to_probabilities(scores: ArrayView1<f64>) -> Array1<f64> {
    scores.mapv(crate::objective::sigmoid)
}
