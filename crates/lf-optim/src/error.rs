use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimError {
    #[error("Invalid search space: {what}")]
    InvalidSpace { what: String },

    #[error("Invalid optimizer configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Thread pool error: {message}")]
    ThreadPool { message: String },
}

pub type OptimResult<T> = Result<T, OptimError>;
