use lf_core::ParameterVector;
use lf_eval::Evaluation;
use thiserror::Error;

/// A candidate could not be simulated or evaluated.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("evaluation failed: {message}")]
pub struct EvaluationFailure {
    pub message: String,
}

impl EvaluationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Maps a parameter vector to objective and constraint vectors.
///
/// Called concurrently from worker threads, one candidate per call.
pub trait FitnessFunction: Sync {
    fn evaluate(&self, params: &ParameterVector) -> Result<Evaluation, EvaluationFailure>;
}

impl<F> FitnessFunction for F
where
    F: Fn(&ParameterVector) -> Result<Evaluation, EvaluationFailure> + Sync,
{
    fn evaluate(&self, params: &ParameterVector) -> Result<Evaluation, EvaluationFailure> {
        self(params)
    }
}
