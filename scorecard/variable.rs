//! # Binned Predictors
//!
//! A `Variable` is one predictor after discretization: an ordered list of bins,
//! each of which becomes a single indicator column of the design matrix. The
//! variable also carries the shape constraints that relate its own bin
//! coefficients to each other. Offsets in a `ConstraintDescriptor` are always
//! local to the variable's column block; turning them into global coefficient
//! indices is the job of `constraints::compile_constraints`.
//!
//! The discretization algorithm itself lives outside this crate. Bins are
//! supplied by the caller, either directly or through a `VariableSpec` read from
//! a TOML bin specification.

use crate::performance::Performance;
use faer::sparse::{SparseColMat, Triplet};
use indexmap::IndexMap;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The live set of variables, keyed by name. Insertion order is the column order
/// of the design matrix, so an unordered map must never stand in for it.
pub type VariableSet = IndexMap<String, Variable>;

/// Pseudo-count added to each bin when computing weight of evidence, so that
/// pure bins produce a finite value.
const WOE_SMOOTHING: f64 = 0.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VariableError {
    #[error("Variable '{0}' must have at least one bin.")]
    NoBins(String),
    #[error("Variable '{0}' declares more than one missing-value bin.")]
    DuplicateMissingBin(String),
    #[error("Variable '{variable}' declares the exception value {value} more than once.")]
    DuplicateException { variable: String, value: f64 },
    #[error(
        "Variable '{variable}' has an invalid interval ({lower}, {upper}]. Bounds must be ordered, non-NaN and must not overlap the previous interval."
    )]
    InvalidInterval {
        variable: String,
        lower: f64,
        upper: f64,
    },
    #[error("Variable '{variable}' refers to bin {bin}, but it only has {num_bins} bins.")]
    BinOutOfRange {
        variable: String,
        bin: usize,
        num_bins: usize,
    },
    #[error("Value {value} at row {row} of variable '{variable}' does not fall in any bin.")]
    UnbinnedValue {
        variable: String,
        row: usize,
        value: f64,
    },
    #[error(
        "Variable '{variable}' received a column of {found} rows, but the outcome has {expected} rows."
    )]
    LengthMismatch {
        variable: String,
        expected: usize,
        found: usize,
    },
    #[error("Failed to assemble the sparse indicator block for variable '{0}'.")]
    SparseAssembly(String),
}

/// A single bin of a discretized predictor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Bin {
    /// Captures NaN (and null) values.
    Missing,
    /// Captures exactly one special value, e.g. a sentinel code.
    Exception { value: f64 },
    /// Captures values in the half-open interval `(lower, upper]`.
    Interval { lower: f64, upper: f64 },
}

impl Bin {
    /// Human-readable label, as printed in bin tables.
    pub fn label(&self) -> String {
        match self {
            Bin::Missing => "Missing".to_string(),
            Bin::Exception { value } => format!("== {value}"),
            Bin::Interval { lower, upper } => format!("({lower}, {upper}]"),
        }
    }
}

/// The monotonic relationship imposed between consecutive interval bins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Free,
    /// Each interval bin's coefficient is at least the previous one's.
    Ascending,
    /// Each interval bin's coefficient is at most the previous one's.
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// `x[base] == 0`
    ZeroEquality,
    /// `x[base] - x[target] == 0`
    PairEquality,
    /// `x[base] - x[target] >= 0`
    PairInequality,
}

/// A shape constraint expressed in offsets local to the owning variable's block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintDescriptor {
    pub kind: ConstraintKind,
    pub base_offset: usize,
    pub target_offset: usize,
}

/// Per-variable summary over one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub step: i32,
    pub bins: usize,
    pub count: f64,
    pub event_rate: f64,
    pub information_value: f64,
}

/// One row of a variable's bin table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinRow {
    pub bin: String,
    pub count: f64,
    pub events: f64,
    pub event_rate: f64,
    pub woe: f64,
    pub iv: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVariable")]
pub struct Variable {
    name: String,
    step: i32,
    bins: Vec<Bin>,
    shape: Shape,
    ties: Vec<(usize, usize)>,
    neutral: Vec<usize>,
}

/// Unchecked serialized form; deserialization validates it like the builders do.
#[derive(Deserialize)]
struct RawVariable {
    name: String,
    step: i32,
    bins: Vec<Bin>,
    shape: Shape,
    ties: Vec<(usize, usize)>,
    neutral: Vec<usize>,
}

impl TryFrom<RawVariable> for Variable {
    type Error = VariableError;

    fn try_from(raw: RawVariable) -> Result<Self, Self::Error> {
        let mut variable = Variable::new(raw.name, raw.bins)?
            .with_step(raw.step)
            .with_shape(raw.shape);
        for (a, b) in raw.ties {
            variable = variable.with_tie(a, b)?;
        }
        for bin in raw.neutral {
            variable = variable.with_neutral(bin)?;
        }
        Ok(variable)
    }
}

impl Variable {
    /// Creates a free-shaped variable in step 1 from an explicit list of bins.
    pub fn new(name: impl Into<String>, bins: Vec<Bin>) -> Result<Self, VariableError> {
        let name = name.into();
        validate_bins(&name, &bins)?;
        Ok(Self {
            name,
            step: 1,
            bins,
            shape: Shape::Free,
            ties: Vec::new(),
            neutral: Vec::new(),
        })
    }

    /// Builds the bins `(-inf, c0], (c0, c1], ..., (c_last, inf)` from sorted cut
    /// points, followed by one bin per exception value and, if requested, a
    /// trailing missing-value bin.
    pub fn from_cuts(
        name: impl Into<String>,
        cuts: &[f64],
        exceptions: &[f64],
        missing: bool,
    ) -> Result<Self, VariableError> {
        Self::new(name, bins_from_cuts(cuts, exceptions, missing))
    }

    pub fn with_step(mut self, step: i32) -> Self {
        self.step = step;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Ties two bins to a common coefficient, as if they had been merged.
    pub fn with_tie(mut self, a: usize, b: usize) -> Result<Self, VariableError> {
        self.check_bin(a)?;
        self.check_bin(b)?;
        self.ties.push((a, b));
        Ok(self)
    }

    /// Pins a bin's coefficient to zero.
    pub fn with_neutral(mut self, bin: usize) -> Result<Self, VariableError> {
        self.check_bin(bin)?;
        self.neutral.push(bin);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    pub fn set_step(&mut self, step: i32) {
        self.step = step;
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Replaces the bin definitions, e.g. after re-discretizing. Ties and neutral
    /// bins refer to the old bin positions and are dropped.
    pub fn rebin(&mut self, bins: Vec<Bin>) -> Result<(), VariableError> {
        validate_bins(&self.name, &bins)?;
        self.bins = bins;
        self.ties.clear();
        self.neutral.clear();
        Ok(())
    }

    /// Index of the bin that captures `value`. NaN goes to the missing bin;
    /// exception bins take precedence over intervals. An interval opening at
    /// `-inf` also captures `-inf` itself.
    pub fn locate(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return self.bins.iter().position(|b| matches!(b, Bin::Missing));
        }
        self.bins
            .iter()
            .position(|b| matches!(b, Bin::Exception { value: v } if *v == value))
            .or_else(|| {
                self.bins.iter().position(|b| match b {
                    Bin::Interval { lower, upper } => {
                        (value > *lower || *lower == f64::NEG_INFINITY) && value <= *upper
                    }
                    _ => false,
                })
            })
    }

    /// Encodes a data column as an `n x num_bins` block of 0/1 indicators with
    /// exactly one non-zero per row.
    pub fn to_sparse(
        &self,
        column: ArrayView1<f64>,
    ) -> Result<SparseColMat<usize, f64>, VariableError> {
        let mut triplets = Vec::with_capacity(column.len());
        for (row, &value) in column.iter().enumerate() {
            let bin = self
                .locate(value)
                .ok_or_else(|| VariableError::UnbinnedValue {
                    variable: self.name.clone(),
                    row,
                    value,
                })?;
            triplets.push(Triplet::new(row, bin, 1.0));
        }
        SparseColMat::try_new_from_triplets(column.len(), self.bins.len(), &triplets)
            .map_err(|_| VariableError::SparseAssembly(self.name.clone()))
    }

    /// Returns the block width together with the variable's shape constraints,
    /// in offsets local to that block.
    pub fn get_constraints(&self) -> (usize, Vec<ConstraintDescriptor>) {
        let mut descriptors = Vec::new();

        let intervals: Vec<usize> = self
            .bins
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b, Bin::Interval { .. }))
            .map(|(i, _)| i)
            .collect();
        for pair in intervals.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let (base_offset, target_offset) = match self.shape {
                Shape::Free => continue,
                Shape::Ascending => (next, prev),
                Shape::Descending => (prev, next),
            };
            descriptors.push(ConstraintDescriptor {
                kind: ConstraintKind::PairInequality,
                base_offset,
                target_offset,
            });
        }

        for &(a, b) in &self.ties {
            descriptors.push(ConstraintDescriptor {
                kind: ConstraintKind::PairEquality,
                base_offset: a,
                target_offset: b,
            });
        }

        for &bin in &self.neutral {
            descriptors.push(ConstraintDescriptor {
                kind: ConstraintKind::ZeroEquality,
                base_offset: bin,
                target_offset: bin,
            });
        }

        (self.bins.len(), descriptors)
    }

    pub fn summary(
        &self,
        column: ArrayView1<f64>,
        perf: &Performance,
    ) -> Result<VariableSummary, VariableError> {
        let rows = self.display(column, perf)?;
        let count: f64 = rows.iter().map(|r| r.count).sum();
        let events: f64 = rows.iter().map(|r| r.events).sum();
        Ok(VariableSummary {
            name: self.name.clone(),
            step: self.step,
            bins: self.bins.len(),
            count,
            event_rate: if count > 0.0 { events / count } else { f64::NAN },
            information_value: rows.iter().map(|r| r.iv).sum(),
        })
    }

    /// Weighted bin table: counts, events, event rate, weight of evidence and
    /// information value contribution per bin.
    pub fn display(
        &self,
        column: ArrayView1<f64>,
        perf: &Performance,
    ) -> Result<Vec<BinRow>, VariableError> {
        if column.len() != perf.len() {
            return Err(VariableError::LengthMismatch {
                variable: self.name.clone(),
                expected: perf.len(),
                found: column.len(),
            });
        }

        let k = self.bins.len();
        let mut counts = vec![0.0; k];
        let mut events = vec![0.0; k];
        for (row, ((&value, &y), &w)) in column
            .iter()
            .zip(perf.labels().iter())
            .zip(perf.weights().iter())
            .enumerate()
        {
            let bin = self
                .locate(value)
                .ok_or_else(|| VariableError::UnbinnedValue {
                    variable: self.name.clone(),
                    row,
                    value,
                })?;
            counts[bin] += w;
            events[bin] += w * y;
        }

        let total_events: f64 = events.iter().sum();
        let total_non_events: f64 = counts.iter().sum::<f64>() - total_events;
        let smoothing_total = WOE_SMOOTHING * k as f64;

        Ok(self
            .bins
            .iter()
            .enumerate()
            .map(|(i, bin)| {
                let non_events = counts[i] - events[i];
                let dist_events = (events[i] + WOE_SMOOTHING) / (total_events + smoothing_total);
                let dist_non_events =
                    (non_events + WOE_SMOOTHING) / (total_non_events + smoothing_total);
                let woe = (dist_events / dist_non_events).ln();
                BinRow {
                    bin: bin.label(),
                    count: counts[i],
                    events: events[i],
                    event_rate: if counts[i] > 0.0 {
                        events[i] / counts[i]
                    } else {
                        f64::NAN
                    },
                    woe,
                    iv: (dist_events - dist_non_events) * woe,
                }
            })
            .collect())
    }

    fn check_bin(&self, bin: usize) -> Result<(), VariableError> {
        if bin >= self.bins.len() {
            return Err(VariableError::BinOutOfRange {
                variable: self.name.clone(),
                bin,
                num_bins: self.bins.len(),
            });
        }
        Ok(())
    }
}

fn default_step() -> i32 {
    1
}

/// One entry of a TOML bin specification.
///
/// ```toml
/// [[variables]]
/// name = "utilization"
/// cuts = [0.1, 0.3, 0.7]
/// missing = true
/// shape = "ascending"
/// ```
///
/// Bin indices used by `ties` and `neutral` follow the order produced by
/// `Variable::from_cuts`: intervals, then exceptions, then the missing bin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(default = "default_step")]
    pub step: i32,
    pub cuts: Vec<f64>,
    #[serde(default)]
    pub exceptions: Vec<f64>,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub shape: Shape,
    #[serde(default)]
    pub ties: Vec<(usize, usize)>,
    #[serde(default)]
    pub neutral: Vec<usize>,
}

impl VariableSpec {
    pub fn into_variable(self) -> Result<Variable, VariableError> {
        let mut variable = Variable::from_cuts(self.name, &self.cuts, &self.exceptions, self.missing)?
            .with_step(self.step)
            .with_shape(self.shape);
        for (a, b) in self.ties {
            variable = variable.with_tie(a, b)?;
        }
        for bin in self.neutral {
            variable = variable.with_neutral(bin)?;
        }
        Ok(variable)
    }
}

fn bins_from_cuts(cuts: &[f64], exceptions: &[f64], missing: bool) -> Vec<Bin> {
    let mut bins = Vec::with_capacity(cuts.len() + exceptions.len() + 2);
    let mut lower = f64::NEG_INFINITY;
    for &cut in cuts {
        bins.push(Bin::Interval { lower, upper: cut });
        lower = cut;
    }
    bins.push(Bin::Interval {
        lower,
        upper: f64::INFINITY,
    });
    bins.extend(exceptions.iter().map(|&value| Bin::Exception { value }));
    if missing {
        bins.push(Bin::Missing);
    }
    bins
}

fn validate_bins(name: &str, bins: &[Bin]) -> Result<(), VariableError> {
    if bins.is_empty() {
        return Err(VariableError::NoBins(name.to_string()));
    }

    let mut seen_missing = false;
    let mut exceptions: Vec<f64> = Vec::new();
    let mut previous_upper = f64::NEG_INFINITY;
    for bin in bins {
        match *bin {
            Bin::Missing => {
                if seen_missing {
                    return Err(VariableError::DuplicateMissingBin(name.to_string()));
                }
                seen_missing = true;
            }
            Bin::Exception { value } => {
                if value.is_nan() || exceptions.contains(&value) {
                    return Err(VariableError::DuplicateException {
                        variable: name.to_string(),
                        value,
                    });
                }
                exceptions.push(value);
            }
            Bin::Interval { lower, upper } => {
                if lower.is_nan() || upper.is_nan() || lower >= upper || lower < previous_upper {
                    return Err(VariableError::InvalidInterval {
                        variable: name.to_string(),
                        lower,
                        upper,
                    });
                }
                previous_upper = upper;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn age() -> Variable {
        Variable::from_cuts("age", &[25.0, 40.0], &[-1.0], true).unwrap()
    }

    #[test]
    fn from_cuts_orders_intervals_exceptions_then_missing() {
        let v = age();
        assert_eq!(v.num_bins(), 5);
        assert_eq!(v.bins()[0].label(), "(-inf, 25]");
        assert_eq!(v.bins()[2].label(), "(40, inf]");
        assert_eq!(v.bins()[3], Bin::Exception { value: -1.0 });
        assert_eq!(v.bins()[4], Bin::Missing);
        assert_eq!(v.step(), 1);
    }

    #[test]
    fn locate_prefers_exceptions_and_routes_nan_to_missing() {
        let v = age();
        assert_eq!(v.locate(25.0), Some(0));
        assert_eq!(v.locate(25.5), Some(1));
        assert_eq!(v.locate(99.0), Some(2));
        assert_eq!(v.locate(-1.0), Some(3));
        assert_eq!(v.locate(-2.0), Some(0));
        assert_eq!(v.locate(f64::NAN), Some(4));
    }

    #[test]
    fn to_sparse_has_one_indicator_per_row() {
        let v = age();
        let block = v.to_sparse(array![10.0, 30.0, f64::NAN, -1.0].view()).unwrap();
        assert_eq!(block.nrows(), 4);
        assert_eq!(block.ncols(), 5);
        let dense = block.as_ref().to_dense();
        let expected = [0, 1, 4, 3];
        for (row, &col) in expected.iter().enumerate() {
            for j in 0..5 {
                let want = if j == col { 1.0 } else { 0.0 };
                assert_eq!(dense[(row, j)], want, "row {row}, col {j}");
            }
        }
    }

    #[test]
    fn infinite_values_land_in_the_outer_intervals() {
        let v = Variable::from_cuts("x", &[1.0], &[], false).unwrap();
        assert_eq!(v.locate(f64::NEG_INFINITY), Some(0));
        assert_eq!(v.locate(f64::INFINITY), Some(1));
        let block = v
            .to_sparse(array![f64::NEG_INFINITY, 1.0, f64::INFINITY].view())
            .unwrap();
        let dense = block.as_ref().to_dense();
        assert_eq!(dense[(0, 0)], 1.0);
        assert_eq!(dense[(1, 0)], 1.0);
        assert_eq!(dense[(2, 1)], 1.0);
    }

    #[test]
    fn unbinned_value_is_reported_with_its_row() {
        let v = Variable::from_cuts("score", &[0.5], &[], false).unwrap();
        let err = v.to_sparse(array![0.1, f64::NAN].view()).unwrap_err();
        match err {
            VariableError::UnbinnedValue { row, .. } => assert_eq!(row, 1),
            other => panic!("Expected UnbinnedValue, got {other:?}"),
        }
    }

    #[test]
    fn invalid_bins_are_rejected() {
        assert!(matches!(
            Variable::new("x", vec![]),
            Err(VariableError::NoBins(_))
        ));
        assert!(matches!(
            Variable::new("x", vec![Bin::Missing, Bin::Missing]),
            Err(VariableError::DuplicateMissingBin(_))
        ));
        let overlapping = vec![
            Bin::Interval {
                lower: 0.0,
                upper: 2.0,
            },
            Bin::Interval {
                lower: 1.0,
                upper: 3.0,
            },
        ];
        assert!(matches!(
            Variable::new("x", overlapping),
            Err(VariableError::InvalidInterval { .. })
        ));
        assert!(matches!(
            age().with_tie(0, 9),
            Err(VariableError::BinOutOfRange { bin: 9, .. })
        ));
    }

    #[test]
    fn ascending_shape_orders_consecutive_interval_bins() {
        let v = age().with_shape(Shape::Ascending);
        let (n, constraints) = v.get_constraints();
        assert_eq!(n, 5);
        assert_eq!(
            constraints,
            vec![
                ConstraintDescriptor {
                    kind: ConstraintKind::PairInequality,
                    base_offset: 1,
                    target_offset: 0,
                },
                ConstraintDescriptor {
                    kind: ConstraintKind::PairInequality,
                    base_offset: 2,
                    target_offset: 1,
                },
            ]
        );
    }

    #[test]
    fn descending_ties_and_neutral_bins_emit_descriptors() {
        let v = age()
            .with_shape(Shape::Descending)
            .with_tie(3, 4)
            .unwrap()
            .with_neutral(4)
            .unwrap();
        let (_, constraints) = v.get_constraints();
        assert_eq!(constraints.len(), 4);
        assert_eq!(constraints[0].base_offset, 0);
        assert_eq!(constraints[0].target_offset, 1);
        assert_eq!(constraints[2].kind, ConstraintKind::PairEquality);
        assert_eq!(constraints[3].kind, ConstraintKind::ZeroEquality);
        assert_eq!(constraints[3].base_offset, 4);
    }

    #[test]
    fn rebin_drops_ties_that_no_longer_apply() {
        let mut v = age().with_tie(0, 1).unwrap();
        v.rebin(bins_from_cuts(&[30.0], &[], false)).unwrap();
        assert_eq!(v.num_bins(), 2);
        assert!(v.get_constraints().1.is_empty());
    }

    #[test]
    fn display_reports_weighted_counts_and_signed_woe() {
        let v = Variable::from_cuts("x", &[0.5], &[], false).unwrap();
        let perf = Performance::with_weights(
            array![0.0, 0.0, 1.0, 1.0, 1.0, 0.0],
            array![1.0, 1.0, 1.0, 2.0, 1.0, 1.0],
        )
        .unwrap();
        let rows = v
            .display(array![0.1, 0.2, 0.3, 0.9, 0.8, 0.7].view(), &perf)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_abs_diff_eq!(rows[0].count, 3.0);
        assert_abs_diff_eq!(rows[0].events, 1.0);
        assert_abs_diff_eq!(rows[1].count, 4.0);
        assert_abs_diff_eq!(rows[1].events, 3.0);
        assert!(rows[0].woe < 0.0);
        assert!(rows[1].woe > 0.0);
        assert!(rows.iter().all(|r| r.iv >= 0.0));

        let summary = v
            .summary(array![0.1, 0.2, 0.3, 0.9, 0.8, 0.7].view(), &perf)
            .unwrap();
        assert_abs_diff_eq!(summary.count, 7.0);
        assert_abs_diff_eq!(summary.event_rate, 4.0 / 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            summary.information_value,
            rows[0].iv + rows[1].iv,
            epsilon = 1e-12
        );
    }

    #[test]
    fn deserialization_validates_constraint_offsets() {
        let v = age().with_tie(0, 1).unwrap().with_neutral(4).unwrap();
        let text = toml::to_string(&v).unwrap();
        assert_eq!(toml::from_str::<Variable>(&text).unwrap(), v);

        let out_of_range = r#"
            name = "x"
            step = 1
            shape = "free"
            ties = [[0, 5]]
            neutral = []

            [[bins]]
            kind = "interval"
            lower = -inf
            upper = 1.0

            [[bins]]
            kind = "interval"
            lower = 1.0
            upper = inf
        "#;
        let err = toml::from_str::<Variable>(out_of_range).unwrap_err();
        assert!(err.to_string().contains("refers to bin 5"), "{err}");

        let no_bins = r#"
            name = "x"
            step = 1
            shape = "free"
            ties = []
            neutral = []
            bins = []
        "#;
        assert!(toml::from_str::<Variable>(no_bins).is_err());
    }

    #[test]
    fn toml_entries_build_constrained_variables() {
        let spec: VariableSpec = toml::from_str(
            r#"
            name = "utilization"
            step = 2
            cuts = [0.3, 0.7]
            missing = true
            shape = "descending"
            ties = [[0, 1]]
            "#,
        )
        .unwrap();
        let v = spec.into_variable().unwrap();
        assert_eq!(v.name(), "utilization");
        assert_eq!(v.step(), 2);
        assert_eq!(v.num_bins(), 4);
        assert_eq!(v.shape(), Shape::Descending);
        assert_eq!(v.get_constraints().1.len(), 3);
    }
}
