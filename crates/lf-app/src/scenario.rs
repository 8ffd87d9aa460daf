//! One hydrology then nutrient run for a fixed parameter vector.

use std::sync::Arc;

use lf_core::timing::{Timer, engine_timing};
use lf_core::{CompletedRun, InputData, ParameterVector};
use lf_eval::{Constraint, Evaluation, Objective, evaluate};
use lf_hydro::{HydroConfig, simulate_hydrology};
use lf_nutrient::{NutrientConfig, simulate_nutrients};
use lf_optim::{EvaluationFailure, FitnessFunction};
use lf_sim::SimError;
use tracing::debug;

/// Engine configurations for a scenario; nutrient is `None` for hydrology-only runs.
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub hydro: HydroConfig,
    pub nutrient: Option<NutrientConfig>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("hydrology engine: {0}")]
    Hydrology(SimError),

    #[error("nutrient engine: {0}")]
    Nutrient(SimError),
}

/// Runs scenarios against shared, immutable configuration and forcing.
///
/// Cloning is cheap and every call is independent, so a runner can be
/// shared across worker threads.
#[derive(Clone, Debug)]
pub struct ScenarioRunner {
    config: Arc<ScenarioConfig>,
    inputs: Arc<InputData>,
}

impl ScenarioRunner {
    pub fn new(config: Arc<ScenarioConfig>, inputs: Arc<InputData>) -> Self {
        Self { config, inputs }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn inputs(&self) -> &InputData {
        &self.inputs
    }

    pub fn run_scenario(&self, params: &ParameterVector) -> Result<CompletedRun, ScenarioError> {
        let timer = Timer::start();
        let hydrology = simulate_hydrology(&self.inputs, &self.config.hydro, params);
        timer.stop_into(&engine_timing::HYDROLOGY);
        let hydrology = hydrology.map_err(ScenarioError::Hydrology)?;

        let nutrient = match &self.config.nutrient {
            Some(cfg) => {
                let timer = Timer::start();
                let series = simulate_nutrients(&hydrology, &self.inputs, cfg, params);
                timer.stop_into(&engine_timing::NUTRIENT);
                Some(series.map_err(ScenarioError::Nutrient)?)
            }
            None => None,
        };

        Ok(CompletedRun {
            params: params.clone(),
            hydrology,
            nutrient,
        })
    }
}

/// Scenario run plus evaluation, as seen by the optimizer.
#[derive(Clone, Debug)]
pub struct ScenarioFitness {
    pub runner: ScenarioRunner,
    pub objectives: Vec<Objective>,
    pub constraints: Vec<Constraint>,
}

impl FitnessFunction for ScenarioFitness {
    fn evaluate(&self, params: &ParameterVector) -> Result<Evaluation, EvaluationFailure> {
        let run = self.runner.run_scenario(params).map_err(|e| {
            debug!(error = %e, "scenario failed");
            EvaluationFailure::new(e.to_string())
        })?;
        let timer = Timer::start();
        let evaluation = evaluate(&run, &self.objectives, &self.constraints);
        timer.stop_into(&engine_timing::EVALUATION);
        evaluation.map_err(|e| EvaluationFailure::new(e.to_string()))
    }
}
