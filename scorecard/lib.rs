#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod constraints;
pub mod data;
pub mod design;
pub mod model;
pub mod objective;
pub mod optimizer;
pub mod performance;
pub mod scorecard;
pub mod variable;

pub use crate::model::{Model, ModelHistory, ModelId};
pub use crate::performance::Performance;
pub use crate::scorecard::{FitOptions, Scorecard, ScorecardError};
pub use crate::variable::{Bin, Shape, Variable};
