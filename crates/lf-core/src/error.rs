use chrono::NaiveDate;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Missing series: {name}")]
    MissingSeries { name: String },

    #[error("Duplicate series: {name}")]
    DuplicateSeries { name: String },

    #[error("Series {name} is not contiguous at {date}")]
    NonContiguous { name: String, date: NaiveDate },

    #[error("Series {name} does not cover {start}..={end}")]
    NotCovering {
        name: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Missing parameter: {name}")]
    MissingParameter { name: String },
}
