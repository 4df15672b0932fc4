//! Outcome container: binary labels plus non-negative observation weights,
//! row-aligned with the data they describe.

use ndarray::{Array1, ArrayView1};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerformanceError {
    #[error("Outcome has {labels} labels but {weights} weights.")]
    LengthMismatch { labels: usize, weights: usize },
    #[error("Label {value} at row {row} is not binary. Labels must be 0 or 1.")]
    NonBinaryLabel { row: usize, value: f64 },
    #[error("Weight {value} at row {row} is invalid. Weights must be finite and non-negative.")]
    InvalidWeight { row: usize, value: f64 },
    #[error("Observation weights sum to zero; at least one row must carry weight.")]
    ZeroTotalWeight,
    #[error("Outcome has no rows.")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    labels: Array1<f64>,
    weights: Array1<f64>,
}

impl Performance {
    /// Unweighted outcome: every row carries weight 1.
    pub fn new(labels: Array1<f64>) -> Result<Self, PerformanceError> {
        let weights = Array1::ones(labels.len());
        Self::with_weights(labels, weights)
    }

    pub fn with_weights(
        labels: Array1<f64>,
        weights: Array1<f64>,
    ) -> Result<Self, PerformanceError> {
        if labels.is_empty() {
            return Err(PerformanceError::Empty);
        }
        if labels.len() != weights.len() {
            return Err(PerformanceError::LengthMismatch {
                labels: labels.len(),
                weights: weights.len(),
            });
        }
        if let Some((row, &value)) = labels
            .iter()
            .enumerate()
            .find(|(_, y)| **y != 0.0 && **y != 1.0)
        {
            return Err(PerformanceError::NonBinaryLabel { row, value });
        }
        if let Some((row, &value)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(PerformanceError::InvalidWeight { row, value });
        }
        if weights.sum() <= 0.0 {
            return Err(PerformanceError::ZeroTotalWeight);
        }
        Ok(Self { labels, weights })
    }

    pub fn labels(&self) -> ArrayView1<'_, f64> {
        self.labels.view()
    }

    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.sum()
    }
}
