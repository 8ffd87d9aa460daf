//! Shared application service layer for lakeflow.
//!
//! Turns project files into engine configurations, runs scenarios and
//! optimizations, and manages the run store for the CLI.

pub mod compile;
pub mod error;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod run_service;
pub mod scenario;

pub use compile::{
    CompiledProject, compile_constraints, compile_hydro, compile_nutrient, compile_objectives,
    compile_project, compile_search_space,
};
pub use error::{AppError, AppResult};
pub use progress::{OptimizationProgress, RunProgressEvent, RunStage};
pub use project_service::{ProjectSummary, load_project, save_project, summarize, validate_project};
pub use query::{RunSummary, extract_series, get_run_summary, list_series_names};
pub use run_service::{
    RunMode, RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run,
    ensure_run_with_progress, list_runs, load_pareto, load_run,
};
pub use scenario::{ScenarioConfig, ScenarioError, ScenarioFitness, ScenarioRunner};
