//! Run storage API.
//!
//! Layout under the project directory:
//! `.lakeflow/runs/<run_id>/{manifest.json, series.jsonl, pareto.json}`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{DailyRecord, ParetoFile, RunManifest};
use crate::{ResultsError, ResultsResult};

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn for_project(project_path: &Path) -> ResultsResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        let runs_dir = project_dir.join(".lakeflow").join("runs");
        Self::new(runs_dir)
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    /// Write series and Pareto set first so a manifest marks a complete run.
    pub fn save_run(
        &self,
        manifest: &RunManifest,
        records: &[DailyRecord],
        pareto: Option<&ParetoFile>,
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let series_path = run_dir.join("series.jsonl");
        let mut series_content = String::new();
        for record in records {
            let line = serde_json::to_string(record)?;
            series_content.push_str(&line);
            series_content.push('\n');
        }
        fs::write(series_path, series_content)?;

        if let Some(pareto) = pareto {
            let pareto_json = serde_json::to_string_pretty(pareto)?;
            fs::write(run_dir.join("pareto.json"), pareto_json)?;
        }

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join("manifest.json"), manifest_json)?;

        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join("manifest.json");

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_series(&self, run_id: &str) -> ResultsResult<Vec<DailyRecord>> {
        let series_path = self.run_dir(run_id).join("series.jsonl");

        if !series_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(series_path)?;
        let mut records = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                let record: DailyRecord = serde_json::from_str(line)?;
                records.push(record);
            }
        }

        Ok(records)
    }

    pub fn load_pareto(&self, run_id: &str) -> ResultsResult<ParetoFile> {
        if !self.has_run(run_id) {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let path = self.run_dir(run_id).join("pareto.json");
        if !path.exists() {
            return Err(ResultsError::NoParetoSet {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// All complete runs, newest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }
        runs.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });

        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
