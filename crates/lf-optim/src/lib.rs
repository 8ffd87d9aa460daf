//! Multi-objective search over operating parameters.
//!
//! Provides:
//! - `SearchSpace`: bounded decision variables decoded onto a base parameter vector
//! - constrained Pareto dominance and a `ParetoArchive` of non-dominated candidates
//! - the ask/tell `Solver` trait with `Nsga2` and `RandomSearch`
//! - `Optimizer`: evaluates candidate batches in parallel and enforces budgets

pub mod archive;
pub mod candidate;
pub mod dominance;
pub mod driver;
pub mod error;
pub mod fitness;
pub mod nsga2;
pub mod random;
pub mod solver;
pub mod space;

pub use archive::ParetoArchive;
pub use candidate::Candidate;
pub use dominance::{constrained_dominates, crowding_distance, non_dominated_sort, pareto_dominates};
pub use driver::{GenerationReport, OptimizationOutcome, Optimizer, OptimizerConfig, StopReason};
pub use error::{OptimError, OptimResult};
pub use fitness::{EvaluationFailure, FitnessFunction};
pub use nsga2::{Nsga2, Nsga2Config};
pub use random::RandomSearch;
pub use solver::Solver;
pub use space::{DecisionVariable, SearchSpace};
