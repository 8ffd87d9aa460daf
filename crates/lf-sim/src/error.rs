//! Error types for simulation operations.

use lf_core::{CoreError, NaiveDate};
use thiserror::Error;

/// Errors that abort a daily simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Physical inconsistency on {date}: {what} = {value}")]
    PhysicalInconsistency {
        date: NaiveDate,
        what: &'static str,
        value: f64,
    },

    #[error("Mass balance violation on {date}: {what} = {value}")]
    MassBalanceViolation {
        date: NaiveDate,
        what: &'static str,
        value: f64,
    },

    #[error("Missing series: {name}")]
    MissingSeries { name: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<CoreError> for SimError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MissingSeries { name } => SimError::MissingSeries { name },
            other => SimError::Backend {
                message: other.to_string(),
            },
        }
    }
}
