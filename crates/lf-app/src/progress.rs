//! Progress events streamed from the run service.

use crate::run_service::RunMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStage {
    LoadingProject,
    LoadingForcing,
    CheckingCache,
    LoadingCachedResult,
    Compiling,
    Simulating,
    Optimizing,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingProject => "loading project",
            RunStage::LoadingForcing => "loading forcing",
            RunStage::CheckingCache => "checking cache",
            RunStage::LoadingCachedResult => "loading cached result",
            RunStage::Compiling => "compiling",
            RunStage::Simulating => "simulating",
            RunStage::Optimizing => "optimizing",
            RunStage::SavingResults => "saving results",
            RunStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizationProgress {
    pub generation: usize,
    pub max_generations: Option<usize>,
    pub evaluations: usize,
    pub max_evaluations: Option<usize>,
    pub failures: usize,
    pub archive_size: usize,
    pub feasible_in_archive: usize,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub mode: RunMode,
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub optimization: Option<OptimizationProgress>,
}

impl RunProgressEvent {
    pub fn stage(
        mode: RunMode,
        stage: RunStage,
        elapsed_wall_s: f64,
        message: Option<String>,
    ) -> Self {
        Self {
            mode,
            stage,
            elapsed_wall_s,
            message,
            optimization: None,
        }
    }
}
