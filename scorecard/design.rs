//! # Design Matrix Assembly
//!
//! Concatenates the indicator blocks of every included variable, in the
//! insertion order of the variable set, and appends a constant intercept column.
//!
//! Column identity is purely positional. `constraints::compile_constraints`
//! walks the same variable set with the same step filter and must land on the
//! same offsets; the `DesignLayout` returned here records those offsets so they
//! can be checked and so fitted coefficients can be mapped back to bins.

use crate::data::{DataError, numeric_column};
use crate::scorecard::ScorecardError;
use crate::variable::{Variable, VariableSet};
use faer::sparse::{SparseColMat, Triplet};
use ndarray::{Array1, Array2, ArrayView1};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;

/// The set of variable steps included in a fit.
pub type StepFilter = BTreeSet<i32>;

pub fn default_steps() -> StepFilter {
    BTreeSet::from([1])
}

/// Column range occupied by one variable's bins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableBlock {
    pub name: String,
    pub col_range: Range<usize>,
}

/// Positional layout of the design matrix: variable blocks in order, then the
/// intercept as the last column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignLayout {
    pub blocks: Vec<VariableBlock>,
    pub intercept_col: usize,
}

impl DesignLayout {
    pub fn total_coeffs(&self) -> usize {
        self.intercept_col + 1
    }

    /// Width of each variable block, in column order.
    pub fn column_counts(&self) -> Vec<usize> {
        self.blocks.iter().map(|b| b.col_range.len()).collect()
    }

    pub fn block(&self, name: &str) -> Option<&VariableBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }
}

/// Sparse (CSC) design matrix.
#[derive(Clone, Debug)]
pub struct DesignMatrix {
    matrix: SparseColMat<usize, f64>,
}

impl DesignMatrix {
    pub fn from_dense(dense: &Array2<f64>) -> Result<Self, ScorecardError> {
        let mut triplets = Vec::new();
        for ((row, col), &value) in dense.indexed_iter() {
            if value != 0.0 {
                triplets.push(Triplet::new(row, col, value));
            }
        }
        let matrix = SparseColMat::try_new_from_triplets(dense.nrows(), dense.ncols(), &triplets)
            .map_err(|_| ScorecardError::SparseAssembly("dense design matrix".to_string()))?;
        Ok(Self { matrix })
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn as_sparse(&self) -> &SparseColMat<usize, f64> {
        &self.matrix
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let dense = self.matrix.as_ref().to_dense();
        Array2::from_shape_fn((dense.nrows(), dense.ncols()), |(i, j)| dense[(i, j)])
    }

    /// `X v`
    pub fn matrix_vector_multiply(&self, vector: ArrayView1<f64>) -> Array1<f64> {
        let mut output = Array1::<f64>::zeros(self.matrix.nrows());
        let (symbolic, values) = self.matrix.parts();
        let col_ptr = symbolic.col_ptr();
        let row_idx = symbolic.row_idx();
        for col in 0..self.matrix.ncols() {
            let x = vector[col];
            if x == 0.0 {
                continue;
            }
            for idx in col_ptr[col]..col_ptr[col + 1] {
                output[row_idx[idx]] += values[idx] * x;
            }
        }
        output
    }

    /// `X^T v`
    pub fn transpose_vector_multiply(&self, vector: ArrayView1<f64>) -> Array1<f64> {
        let mut output = Array1::<f64>::zeros(self.matrix.ncols());
        let (symbolic, values) = self.matrix.parts();
        let col_ptr = symbolic.col_ptr();
        let row_idx = symbolic.row_idx();
        for col in 0..self.matrix.ncols() {
            let mut acc = 0.0;
            for idx in col_ptr[col]..col_ptr[col + 1] {
                acc += values[idx] * vector[row_idx[idx]];
            }
            output[col] = acc;
        }
        output
    }
}

/// A variable's source column as `f64`, with a missing column reported as a
/// schema mismatch.
pub(crate) fn variable_column(
    data: &DataFrame,
    variable: &Variable,
) -> Result<Array1<f64>, ScorecardError> {
    match numeric_column(data, variable.name()) {
        Ok(column) => Ok(column),
        Err(DataError::ColumnNotFound(name)) => Err(ScorecardError::SchemaMismatch(name)),
        Err(e) => Err(e.into()),
    }
}

/// Builds the design matrix for every variable whose step is in `steps`.
///
/// Never mutates `data` or `variables`. Fails with `SchemaMismatch` when an
/// included variable has no column of the same name in `data`.
pub fn build_design_matrix(
    data: &DataFrame,
    variables: &VariableSet,
    steps: &StepFilter,
) -> Result<(DesignMatrix, DesignLayout), ScorecardError> {
    let nrows = data.height();
    let mut blocks = Vec::new();
    let mut layout_blocks = Vec::new();
    let mut current_col = 0;

    for variable in variables.values().filter(|v| steps.contains(&v.step())) {
        let column = variable_column(data, variable)?;
        let block = variable.to_sparse(column.view())?;
        let col_range = current_col..current_col + block.ncols();
        current_col = col_range.end;
        layout_blocks.push(VariableBlock {
            name: variable.name().to_string(),
            col_range,
        });
        blocks.push(block);
    }

    let intercept_col = current_col;
    // One indicator per row per block, plus the intercept.
    let mut triplets = Vec::with_capacity(nrows * (blocks.len() + 1));
    for (block, layout_block) in blocks.iter().zip(&layout_blocks) {
        let offset = layout_block.col_range.start;
        let (symbolic, values) = block.parts();
        let col_ptr = symbolic.col_ptr();
        let row_idx = symbolic.row_idx();
        for col in 0..block.ncols() {
            for idx in col_ptr[col]..col_ptr[col + 1] {
                triplets.push(Triplet::new(row_idx[idx], offset + col, values[idx]));
            }
        }
    }
    for row in 0..nrows {
        triplets.push(Triplet::new(row, intercept_col, 1.0));
    }

    let matrix = SparseColMat::try_new_from_triplets(nrows, intercept_col + 1, &triplets)
        .map_err(|_| ScorecardError::SparseAssembly("design matrix".to_string()))?;

    log::debug!(
        "Built design matrix: {} rows, {} variable blocks, {} columns",
        nrows,
        layout_blocks.len(),
        intercept_col + 1
    );

    Ok((
        DesignMatrix { matrix },
        DesignLayout {
            blocks: layout_blocks,
            intercept_col,
        },
    ))
}
