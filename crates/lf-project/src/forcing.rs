//! JSON forcing files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use lf_core::{Horizon, InputData, SeriesSet, TimeSeries, ensure_finite};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::Project;
use crate::{ProjectError, ProjectResult};

/// `{ "start": "YYYY-MM-DD", "series": { name: [values...] } }`, one value per day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForcingFile {
    pub start: NaiveDate,
    pub series: BTreeMap<String, Vec<f64>>,
}

impl ForcingFile {
    pub fn into_series_set(self) -> ProjectResult<SeriesSet> {
        let mut set = SeriesSet::new();
        for (name, values) in self.series {
            for &v in &values {
                ensure_finite(v, "forcing value")
                    .map_err(|e| ProjectError::Forcing(format!("series {name}: {e}")))?;
            }
            set.insert(name, TimeSeries::new(self.start, values))
                .map_err(|e| ProjectError::Forcing(e.to_string()))?;
        }
        Ok(set)
    }
}

/// Directory the project's data paths are relative to.
pub fn working_dir(project: &Project, project_path: &Path) -> PathBuf {
    let base = project_path.parent().unwrap_or_else(|| Path::new("."));
    base.join(&project.working_path)
}

pub fn forcing_path(project: &Project, project_path: &Path) -> PathBuf {
    working_dir(project, project_path).join(&project.forcing.file)
}

pub fn horizon(project: &Project) -> ProjectResult<Horizon> {
    Horizon::new(project.simulation.start, project.simulation.end)
        .map_err(|e| ProjectError::Forcing(e.to_string()))
}

pub fn read_forcing(path: &Path) -> ProjectResult<ForcingFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_forcing(path: &Path, forcing: &ForcingFile) -> ProjectResult<()> {
    let content = serde_json::to_string(forcing)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Parse forcing file content and slice every series to the simulation horizon.
pub fn input_data_from_bytes(project: &Project, bytes: &[u8]) -> ProjectResult<InputData> {
    let forcing: ForcingFile = serde_json::from_slice(bytes)?;
    let raw = forcing.into_series_set()?;
    let horizon = horizon(project)?;
    debug!(series = raw.len(), days = horizon.days(), "forcing parsed");
    InputData::new(horizon, raw).map_err(|e| ProjectError::Forcing(e.to_string()))
}

/// Load the project's forcing and slice every series to the simulation horizon.
pub fn load_input_data(project: &Project, project_path: &Path) -> ProjectResult<InputData> {
    let path = forcing_path(project, project_path);
    let bytes = std::fs::read(&path)?;
    input_data_from_bytes(project, &bytes)
}
