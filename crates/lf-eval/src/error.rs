use lf_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Missing series: {name}")]
    MissingSeries { name: String },

    #[error("Series {name} has no values")]
    EmptySeries { name: String },

    #[error("Series {a} and {b} differ in length")]
    LengthMismatch { a: String, b: String },

    #[error("{name} evaluated to a non-finite value ({value})")]
    NonFinite { name: String, value: f64 },

    #[error("Invalid metric: {what}")]
    InvalidMetric { what: &'static str },
}

pub type EvalResult<T> = Result<T, EvalError>;

impl From<CoreError> for EvalError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MissingSeries { name } => EvalError::MissingSeries { name },
            _ => EvalError::InvalidMetric {
                what: "series lookup failed",
            },
        }
    }
}
