//! Reduces completed runs to objective and constraint vectors.

pub mod error;
pub mod evaluate;
pub mod metric;
pub mod objective;

pub use error::{EvalError, EvalResult};
pub use evaluate::{Evaluation, evaluate};
pub use metric::{Metric, Reduction};
pub use objective::{Bound, Constraint, ConstraintVector, Objective, ObjectiveVector, Sense};
