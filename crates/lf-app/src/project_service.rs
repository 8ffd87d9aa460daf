//! Project loading, saving, validation, and introspection.

use std::path::Path;

use chrono::NaiveDate;
use lf_project::ProjectError;
use lf_project::schema::{Project, SimulationType};

use crate::compile;
use crate::error::{AppError, AppResult};

/// Summary of a project for listing.
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub name: String,
    pub simulation_type: SimulationType,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: usize,
    pub structure_ids: Vec<String>,
    pub nutrient_enabled: bool,
    pub decision_variables: usize,
    pub objectives: usize,
    pub constraints: usize,
}

/// Load project from a YAML file, migrating and validating it.
pub fn load_project(path: &Path) -> AppResult<Project> {
    lf_project::load_yaml(path).map_err(|e| match e {
        ProjectError::Io(source) => AppError::ProjectFileRead {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })
}

/// Save project to a YAML file.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    lf_project::save_yaml(path, project).map_err(|e| match e {
        ProjectError::Io(source) => AppError::ProjectFileWrite {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })
}

/// Load a project, compile it for its simulation type and check its forcing covers the horizon.
pub fn validate_project(path: &Path) -> AppResult<ProjectSummary> {
    let project = load_project(path)?;
    compile::compile_project(&project, project.simulation.kind)?;
    let inputs = lf_project::load_input_data(&project, path)?;
    let mut summary = summarize(&project);
    summary.days = inputs.horizon().days();
    Ok(summary)
}

pub fn summarize(project: &Project) -> ProjectSummary {
    let days = (project.simulation.end - project.simulation.start).num_days() + 1;
    ProjectSummary {
        name: project.name.clone(),
        simulation_type: project.simulation.kind,
        start: project.simulation.start,
        end: project.simulation.end,
        days: days.max(0) as usize,
        structure_ids: project.structures.iter().map(|s| s.id.clone()).collect(),
        nutrient_enabled: project.nutrient.is_some(),
        decision_variables: project.decision_variables.len(),
        objectives: project.objectives.len(),
        constraints: project.constraints.len(),
    }
}
