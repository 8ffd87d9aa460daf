//! Result data types.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub project_name: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub run_type: RunType,
    pub engine_version: String,
    pub start: NaiveDate,
    pub days: usize,
    /// Parameter vector the recorded series were simulated with.
    pub parameters: BTreeMap<String, f64>,
    pub series_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunType {
    Scenario,
    OptimizationValidation,
    OptimizationScenario {
        algorithm: String,
        seed: u64,
        population: usize,
        generations: Option<usize>,
        max_evaluations: Option<usize>,
    },
}

impl RunType {
    pub fn label(&self) -> &'static str {
        match self {
            RunType::Scenario => "scenario",
            RunType::OptimizationValidation => "optimization_validation",
            RunType::OptimizationScenario { .. } => "optimization_scenario",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationSummary {
    pub evaluations: usize,
    pub failures: usize,
    pub generations: usize,
    pub stop_reason: String,
    pub elapsed_s: f64,
    pub pareto_size: usize,
}

/// One line of `series.jsonl`: every recorded series on one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParetoFile {
    pub decision_names: Vec<String>,
    pub objective_names: Vec<String>,
    pub constraint_names: Vec<String>,
    pub members: Vec<ParetoMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParetoMember {
    pub id: u64,
    pub generation: usize,
    pub decision: Vec<f64>,
    pub parameters: BTreeMap<String, f64>,
    /// As reported, not sign-flipped; empty when evaluation failed.
    pub objectives: Vec<f64>,
    pub constraints: Vec<f64>,
    /// Total constraint violation; absent when evaluation failed.
    pub violation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl ParetoMember {
    pub fn is_feasible(&self) -> bool {
        self.violation == Some(0.0)
    }
}
