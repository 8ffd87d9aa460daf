//! Content-based hashing for run IDs.

use std::collections::BTreeMap;

use lf_project::schema::Project;
use sha2::{Digest, Sha256};

/// SHA-256 over the project, forcing bytes, parameters, run type and engine version.
pub fn compute_run_id(
    project: &Project,
    forcing: &[u8],
    parameters: &BTreeMap<String, f64>,
    run_type: &crate::types::RunType,
    engine_version: &str,
) -> String {
    let mut hasher = Sha256::new();

    let project_json = serde_json::to_string(project).unwrap_or_default();
    hasher.update(project_json.as_bytes());

    hasher.update(forcing);

    let params_json = serde_json::to_string(parameters).unwrap_or_default();
    hasher.update(params_json.as_bytes());

    let run_type_json = serde_json::to_string(run_type).unwrap_or_default();
    hasher.update(run_type_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
