//! # Tabular Input
//!
//! Everything that turns user files into the in-memory objects the fitting core
//! consumes: tab-separated data into a `polars` `DataFrame`, label and weight
//! columns into a `Performance`, and a TOML bin specification into variables.
//!
//! Predictor columns are cast to `Float64`. Nulls become NaN so that they land
//! in a variable's missing bin; label and weight columns must be complete.

use crate::performance::{Performance, PerformanceError};
use crate::variable::{Variable, VariableError, VariableSpec};
use ndarray::Array1;
use polars::prelude::*;
use serde::Deserialize;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(
        "The required column '{0}' was not found in the input data. Please check spelling and case."
    )]
    ColumnNotFound(String),
    #[error(
        "The column '{column_name}' could not be converted to f64. It contains non-numeric data. (Found type: {found_type})"
    )]
    ColumnWrongType {
        column_name: String,
        found_type: String,
    },
    #[error(
        "Missing or non-finite values were found in the column '{0}'. Outcome and weight columns must be complete."
    )]
    MissingValuesFound(String),
    #[error("Invalid outcome: {0}")]
    Performance(#[from] PerformanceError),
    #[error("Failed to parse TOML bin specification: {0}")]
    BinSpecParse(#[from] toml::de::Error),
    #[error("Invalid variable in bin specification: {0}")]
    Variable(#[from] VariableError),
}

#[derive(Debug, Deserialize)]
struct BinSpecFile {
    variables: Vec<VariableSpec>,
}

/// Reads a tab-separated file with a header row.
pub fn load_frame(path: &Path) -> Result<DataFrame, DataError> {
    log::info!("Loading data from '{}'", path.display());
    let df = CsvReader::new(File::open(path)?)
        .with_options(
            CsvReadOptions::default()
                .with_has_header(true)
                .with_parse_options(CsvParseOptions::default().with_separator(b'\t')),
        )
        .finish()?;
    log::info!(
        "Loaded {} rows and {} columns from '{}'",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Extracts a column as `f64`, mapping nulls to NaN.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Array1<f64>, DataError> {
    let column = df
        .column(name)
        .map_err(|_| DataError::ColumnNotFound(name.to_string()))?;
    let wrong_type = || DataError::ColumnWrongType {
        column_name: name.to_string(),
        found_type: format!("{:?}", column.dtype()),
    };

    let casted = column.cast(&DataType::Float64).map_err(|_| wrong_type())?;
    // A non-strict cast turns unparseable entries into extra nulls.
    if casted.null_count() > column.null_count() {
        return Err(wrong_type());
    }

    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Builds the outcome from a label column and an optional weight column.
pub fn performance_from_frame(
    df: &DataFrame,
    label_column: &str,
    weight_column: Option<&str>,
) -> Result<Performance, DataError> {
    let complete_column = |name: &str| -> Result<Array1<f64>, DataError> {
        let values = numeric_column(df, name)?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DataError::MissingValuesFound(name.to_string()));
        }
        Ok(values)
    };

    let labels = complete_column(label_column)?;
    let perf = match weight_column {
        Some(weight_column) => Performance::with_weights(labels, complete_column(weight_column)?)?,
        None => Performance::new(labels)?,
    };
    Ok(perf)
}

/// Parses a TOML bin specification (`[[variables]]` tables) into variables, in
/// file order.
pub fn parse_bin_spec(text: &str) -> Result<Vec<Variable>, DataError> {
    let spec: BinSpecFile = toml::from_str(text)?;
    spec.variables
        .into_iter()
        .map(|entry| entry.into_variable().map_err(DataError::from))
        .collect()
}

pub fn load_bin_spec(path: &Path) -> Result<Vec<Variable>, DataError> {
    let text = fs::read_to_string(path)?;
    parse_bin_spec(&text)
}
