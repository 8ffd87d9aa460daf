//! lf-results: run cache, daily series and Pareto set storage.

pub mod hash;
pub mod records;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use records::{records_from_series, series_from_records};
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Run {run_id} has no Pareto set")]
    NoParetoSet { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Corrupt series data: {message}")]
    CorruptSeries { message: String },
}
