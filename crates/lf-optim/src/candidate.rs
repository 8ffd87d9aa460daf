use lf_core::ParameterVector;
use lf_eval::Evaluation;

/// One evaluated point of the search.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Unique, assigned in ask order.
    pub id: u64,
    pub generation: usize,
    pub x: Vec<f64>,
    pub params: ParameterVector,
    /// Objectives oriented for minimization.
    pub objectives: Vec<f64>,
    /// Total constraint violation; +inf when evaluation failed.
    pub violation: f64,
    pub evaluation: Option<Evaluation>,
    pub failure: Option<String>,
}

impl Candidate {
    pub fn evaluated(
        id: u64,
        generation: usize,
        x: Vec<f64>,
        params: ParameterVector,
        evaluation: Evaluation,
    ) -> Self {
        Self {
            id,
            generation,
            x,
            params,
            objectives: evaluation.objectives.minimized(),
            violation: evaluation.constraints.total_violation(),
            evaluation: Some(evaluation),
            failure: None,
        }
    }

    /// Maximally infeasible placeholder for a failed evaluation.
    pub fn failed(
        id: u64,
        generation: usize,
        x: Vec<f64>,
        params: ParameterVector,
        n_objectives: usize,
        message: String,
    ) -> Self {
        Self {
            id,
            generation,
            x,
            params,
            objectives: vec![f64::INFINITY; n_objectives],
            violation: f64::INFINITY,
            evaluation: None,
            failure: Some(message),
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.violation == 0.0
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Same point in objective and violation space.
    pub fn same_point(&self, other: &Candidate) -> bool {
        self.violation == other.violation && self.objectives == other.objectives
    }
}
