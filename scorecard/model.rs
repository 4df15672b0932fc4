//! # Fitted Models and Version History
//!
//! A `Model` is an immutable snapshot: coefficients, solver diagnostics and a
//! deep copy of the variable set exactly as it was when the model was fit. The
//! `ModelHistory` is an append-only list of models plus the index of the
//! current one, so the whole store is a plain value that can be cloned,
//! compared or serialized.

use crate::design::{DesignLayout, StepFilter};
use crate::optimizer::FitDiagnostics;
use crate::scorecard::ScorecardError;
use crate::variable::VariableSet;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    name: String,
    coefficients: Array1<f64>,
    diagnostics: FitDiagnostics,
    variables: VariableSet,
    layout: DesignLayout,
    steps: StepFilter,
    alpha: f64,
}

impl Model {
    pub(crate) fn new(
        name: String,
        coefficients: Array1<f64>,
        diagnostics: FitDiagnostics,
        variables: VariableSet,
        layout: DesignLayout,
        steps: StepFilter,
        alpha: f64,
    ) -> Self {
        Self {
            name,
            coefficients,
            diagnostics,
            variables,
            layout,
            steps,
            alpha,
        }
    }

    /// Same model under another name, e.g. to save a copy into another history.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.coefficients.view()
    }

    pub fn diagnostics(&self) -> &FitDiagnostics {
        &self.diagnostics
    }

    /// The variable set as it existed when this model was fit.
    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    pub fn layout(&self) -> &DesignLayout {
        &self.layout
    }

    pub fn steps(&self) -> &StepFilter {
        &self.steps
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Coefficients of one variable's bins, in bin order.
    pub fn coefficients_for(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.layout
            .block(name)
            .map(|block| self.coefficients.slice(ndarray::s![block.col_range.clone()]))
    }

    pub fn intercept(&self) -> f64 {
        self.coefficients[self.layout.intercept_col]
    }
}

/// Selects a model in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelId {
    Name(String),
    Index(usize),
}

impl From<&str> for ModelId {
    fn from(name: &str) -> Self {
        ModelId::Name(name.to_string())
    }
}

impl From<String> for ModelId {
    fn from(name: String) -> Self {
        ModelId::Name(name)
    }
}

impl From<usize> for ModelId {
    fn from(index: usize) -> Self {
        ModelId::Index(index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelHistory {
    models: Vec<Model>,
    current: Option<usize>,
}

impl ModelHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic name for the next fitted model: `model_00`, `model_01`, ...
    pub fn next_name(&self) -> String {
        format!("model_{:02}", self.models.len())
    }

    /// Appends `model` and makes it current.
    pub fn save(&mut self, model: Model) -> &Model {
        self.models.push(model);
        let index = self.models.len() - 1;
        self.current = Some(index);
        &self.models[index]
    }

    /// Makes a historical model current and returns it.
    ///
    /// By name, the last model carrying that name wins. By index, only
    /// `0 < index < len - 1` is accepted: the oldest and the newest entries are
    /// both rejected. That bound is kept as found in production scorecards and
    /// is pending confirmation.
    pub fn load(&mut self, id: &ModelId) -> Result<&Model, ScorecardError> {
        let index = match id {
            ModelId::Name(name) => self
                .models
                .iter()
                .rposition(|m| m.name == *name)
                .ok_or_else(|| ScorecardError::ModelNotFound(name.clone()))?,
            ModelId::Index(index) => {
                let len = self.models.len();
                if *index > 0 && *index + 1 < len {
                    *index
                } else {
                    return Err(ScorecardError::InvalidModelIndex { index: *index, len });
                }
            }
        };
        self.current = Some(index);
        Ok(&self.models[index])
    }

    pub fn current(&self) -> Option<&Model> {
        self.current.map(|i| &self.models[i])
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Model names, oldest first.
    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn get(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
