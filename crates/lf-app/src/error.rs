//! Error types for the lf-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates' errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write project file: {path}")]
    ProjectFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Configuration compilation failed: {0}")]
    Compile(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Optimization error: {0}")]
    Optimization(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for lf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<lf_project::ProjectError> for AppError {
    fn from(err: lf_project::ProjectError) -> Self {
        match err {
            lf_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<lf_sim::SimError> for AppError {
    fn from(err: lf_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<lf_core::CoreError> for AppError {
    fn from(err: lf_core::CoreError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<lf_eval::EvalError> for AppError {
    fn from(err: lf_eval::EvalError) -> Self {
        AppError::Evaluation(err.to_string())
    }
}

impl From<lf_optim::OptimError> for AppError {
    fn from(err: lf_optim::OptimError) -> Self {
        AppError::Optimization(err.to_string())
    }
}

impl From<crate::scenario::ScenarioError> for AppError {
    fn from(err: crate::scenario::ScenarioError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<lf_results::ResultsError> for AppError {
    fn from(err: lf_results::ResultsError) -> Self {
        match err {
            lf_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
