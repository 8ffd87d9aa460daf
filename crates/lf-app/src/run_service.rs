//! Run execution and caching service.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use lf_core::{CompletedRun, InputData, ParameterVector, SeriesSet};
use lf_optim::{
    Candidate, GenerationReport, Nsga2, Nsga2Config, OptimizationOutcome, Optimizer,
    OptimizerConfig, RandomSearch, Solver,
};
use lf_project::schema::{AlgorithmDef, OptimizerDef, Project, SimulationType};
use lf_results::{
    DailyRecord, OptimizationSummary, ParetoFile, ParetoMember, RunManifest, RunStore,
    RunType as ResultsRunType,
};
use tracing::info;

use crate::compile::{self, CompiledProject};
use crate::error::{AppError, AppResult};
use crate::progress::{OptimizationProgress, RunProgressEvent, RunStage};
use crate::project_service;
use crate::scenario::{ScenarioFitness, ScenarioRunner};

/// Which kind of run to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Scenario,
    OptimizationValidation,
    OptimizationScenario,
}

impl From<SimulationType> for RunMode {
    fn from(kind: SimulationType) -> Self {
        match kind {
            SimulationType::Scenario => RunMode::Scenario,
            SimulationType::OptimizationValidation => RunMode::OptimizationValidation,
            SimulationType::OptimizationScenario => RunMode::OptimizationScenario,
        }
    }
}

impl RunMode {
    pub fn simulation_type(self) -> SimulationType {
        match self {
            RunMode::Scenario => SimulationType::Scenario,
            RunMode::OptimizationValidation => SimulationType::OptimizationValidation,
            RunMode::OptimizationScenario => SimulationType::OptimizationScenario,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.simulation_type().as_str()
    }
}

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub engine_version: String,
    /// Overrides the project's simulation type.
    pub mode: Option<RunMode>,
    /// Overrides the optimizer's worker count.
    pub workers: Option<usize>,
    /// Set to stop an optimization before its next candidate.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            mode: None,
            workers: None,
            cancel: None,
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub options: RunOptions,
}

/// Concise timing summary for a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub compile_time_s: f64,
    pub simulate_time_s: f64,
    pub optimize_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub mode: RunMode,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    mode: RunMode,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    optimization: Option<OptimizationProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            mode,
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            optimization,
        });
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    // Mode is only known once the project is read.
    let provisional = request.options.mode.unwrap_or(RunMode::Scenario);
    emit_progress(
        &mut progress_cb,
        provisional,
        RunStage::LoadingProject,
        started,
        Some("Loading project".to_string()),
        None,
    );
    let project = project_service::load_project(request.project_path)?;
    let mode = request
        .options
        .mode
        .unwrap_or_else(|| project.simulation.kind.into());

    emit_progress(
        &mut progress_cb,
        mode,
        RunStage::LoadingForcing,
        started,
        Some("Loading forcing".to_string()),
        None,
    );
    let forcing_path = lf_project::forcing_path(&project, request.project_path);
    let forcing_bytes = std::fs::read(&forcing_path)?;
    let inputs = lf_project::input_data_from_bytes(&project, &forcing_bytes)?;

    emit_progress(
        &mut progress_cb,
        mode,
        RunStage::CheckingCache,
        started,
        Some("Checking run cache".to_string()),
        None,
    );
    let run_type = results_run_type(&project, mode)?;
    let run_id = lf_results::compute_run_id(
        &project,
        &forcing_bytes,
        &project.parameters,
        &run_type,
        &request.options.engine_version,
    );
    let store = RunStore::for_project(request.project_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            mode,
            RunStage::LoadingCachedResult,
            started,
            Some("Loading cached run".to_string()),
            None,
        );
        let load_started = Instant::now();
        let manifest = store.load_manifest(&run_id)?;
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
        timing.total_time_s = started.elapsed().as_secs_f64();

        emit_progress(
            &mut progress_cb,
            mode,
            RunStage::Completed,
            started,
            Some("Loaded cached run".to_string()),
            None,
        );
        info!(run_id = %run_id, "run loaded from cache");
        return Ok(RunResponse {
            run_id,
            mode,
            manifest,
            loaded_from_cache: true,
            timing,
        });
    }

    emit_progress(
        &mut progress_cb,
        mode,
        RunStage::Compiling,
        started,
        Some("Compiling project".to_string()),
        None,
    );
    let compile_started = Instant::now();
    let compiled = compile::compile_project(&project, mode.simulation_type())?;
    timing.compile_time_s = compile_started.elapsed().as_secs_f64();

    let ctx = RunContext {
        project: &project,
        inputs: Arc::new(inputs),
        store: &store,
        run_id: &run_id,
        run_type,
        options: &request.options,
        mode,
        started,
    };
    let manifest = match mode {
        RunMode::Scenario | RunMode::OptimizationValidation => {
            execute_single(&ctx, compiled, &mut progress_cb, &mut timing)?
        }
        RunMode::OptimizationScenario => {
            execute_optimization(&ctx, compiled, &mut progress_cb, &mut timing)?
        }
    };

    timing.total_time_s = started.elapsed().as_secs_f64();
    emit_progress(
        &mut progress_cb,
        mode,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
        None,
    );
    info!(run_id = %run_id, mode = mode.as_str(), total_s = timing.total_time_s, "run completed");

    Ok(RunResponse {
        run_id,
        mode,
        manifest,
        loaded_from_cache: false,
        timing,
    })
}

struct RunContext<'a> {
    project: &'a Project,
    inputs: Arc<InputData>,
    store: &'a RunStore,
    run_id: &'a str,
    run_type: ResultsRunType,
    options: &'a RunOptions,
    mode: RunMode,
    started: Instant,
}

fn optimizer_def(project: &Project) -> AppResult<&OptimizerDef> {
    project.optimizer.as_ref().ok_or_else(|| {
        AppError::Validation("optimization runs need an optimizer section".to_string())
    })
}

fn results_run_type(project: &Project, mode: RunMode) -> AppResult<ResultsRunType> {
    Ok(match mode {
        RunMode::Scenario => ResultsRunType::Scenario,
        RunMode::OptimizationValidation => ResultsRunType::OptimizationValidation,
        RunMode::OptimizationScenario => {
            let opt = optimizer_def(project)?;
            ResultsRunType::OptimizationScenario {
                algorithm: algorithm_name(opt.algorithm).to_string(),
                seed: opt.seed,
                population: opt.population,
                generations: opt.generations,
                max_evaluations: opt.max_evaluations,
            }
        }
    })
}

fn algorithm_name(algorithm: AlgorithmDef) -> &'static str {
    match algorithm {
        AlgorithmDef::Nsga2 => "nsga2",
        AlgorithmDef::Random => "random",
    }
}

fn to_map(params: &ParameterVector) -> BTreeMap<String, f64> {
    params.iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn run_records(run: &CompletedRun, inputs: &InputData) -> Vec<DailyRecord> {
    let mut sets: Vec<&SeriesSet> = vec![&run.hydrology];
    if let Some(n) = &run.nutrient {
        sets.push(n);
    }
    lf_results::records_from_series(inputs.horizon(), &sets)
}

fn save(
    ctx: &RunContext,
    run: &CompletedRun,
    optimization: Option<OptimizationSummary>,
    pareto: Option<&ParetoFile>,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    timing: &mut RunTimingSummary,
) -> AppResult<RunManifest> {
    emit_progress(
        progress_cb,
        ctx.mode,
        RunStage::SavingResults,
        ctx.started,
        Some("Saving results".to_string()),
        None,
    );
    let save_started = Instant::now();
    let records = run_records(run, &ctx.inputs);
    let series_names = records
        .first()
        .map(|r| r.values.keys().cloned().collect())
        .unwrap_or_default();
    let horizon = ctx.inputs.horizon();
    let manifest = RunManifest {
        run_id: ctx.run_id.to_string(),
        project_name: ctx.project.name.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        run_type: ctx.run_type.clone(),
        engine_version: ctx.options.engine_version.clone(),
        start: horizon.start(),
        days: horizon.days(),
        parameters: to_map(&run.params),
        series_names,
        optimization,
    };
    ctx.store.save_run(&manifest, &records, pareto)?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();
    Ok(manifest)
}

/// Scenario or optimization-validation run with the project parameters.
fn execute_single(
    ctx: &RunContext,
    compiled: CompiledProject,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    timing: &mut RunTimingSummary,
) -> AppResult<RunManifest> {
    emit_progress(
        progress_cb,
        ctx.mode,
        RunStage::Simulating,
        ctx.started,
        Some("Simulating".to_string()),
        None,
    );
    let runner = ScenarioRunner::new(Arc::new(compiled.scenario), Arc::clone(&ctx.inputs));
    let sim_started = Instant::now();
    let run = runner.run_scenario(&compiled.base_params)?;
    timing.simulate_time_s = sim_started.elapsed().as_secs_f64();

    save(ctx, &run, None, None, progress_cb, timing)
}

fn execute_optimization(
    ctx: &RunContext,
    compiled: CompiledProject,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    timing: &mut RunTimingSummary,
) -> AppResult<RunManifest> {
    let opt = optimizer_def(ctx.project)?;
    let space = compile::compile_search_space(ctx.project, &compiled.base_params)?;
    let config = OptimizerConfig {
        max_evaluations: opt.max_evaluations,
        max_generations: opt.generations,
        time_limit: opt.wall_clock_secs.map(Duration::from_secs_f64),
        workers: ctx.options.workers.unwrap_or(opt.workers),
        archive_capacity: opt.archive_capacity,
    };
    let mut optimizer = Optimizer::new(config)?;
    if let Some(cancel) = &ctx.options.cancel {
        optimizer = optimizer.with_cancel(Arc::clone(cancel));
    }
    let mut solver: Box<dyn Solver> = match opt.algorithm {
        AlgorithmDef::Nsga2 => Box::new(Nsga2::new(
            Nsga2Config {
                population: opt.population,
                ..Nsga2Config::default()
            },
            &space,
            opt.seed,
        )?),
        AlgorithmDef::Random => Box::new(RandomSearch::new(&space, opt.population, opt.seed)?),
    };

    let n_objectives = compiled.objectives.len();
    let runner = ScenarioRunner::new(Arc::new(compiled.scenario), Arc::clone(&ctx.inputs));
    let fitness = ScenarioFitness {
        runner: runner.clone(),
        objectives: compiled.objectives,
        constraints: compiled.constraints,
    };

    emit_progress(
        progress_cb,
        ctx.mode,
        RunStage::Optimizing,
        ctx.started,
        Some(format!("Optimizing with {}", solver.name())),
        None,
    );
    let opt_started = Instant::now();
    let outcome = {
        let mode = ctx.mode;
        let started = ctx.started;
        let (max_generations, max_evaluations) = (opt.generations, opt.max_evaluations);
        let mut on_generation = |report: &GenerationReport| {
            emit_progress(
                progress_cb,
                mode,
                RunStage::Optimizing,
                started,
                None,
                Some(OptimizationProgress {
                    generation: report.generation,
                    max_generations,
                    evaluations: report.evaluations,
                    max_evaluations,
                    failures: report.failures,
                    archive_size: report.archive_size,
                    feasible_in_archive: report.feasible_in_archive,
                }),
            );
        };
        optimizer.optimize_with_progress(
            &space,
            &fitness,
            solver.as_mut(),
            n_objectives,
            Some(&mut on_generation),
        )?
    };
    timing.optimize_time_s = opt_started.elapsed().as_secs_f64();

    let representative = representative(&outcome).ok_or_else(|| {
        AppError::Optimization("no candidate could be evaluated".to_string())
    })?;
    info!(
        id = representative.id,
        feasible = representative.is_feasible(),
        "re-simulating representative Pareto member"
    );
    let sim_started = Instant::now();
    let run = runner.run_scenario(&representative.params)?;
    timing.simulate_time_s = sim_started.elapsed().as_secs_f64();

    let pareto = pareto_file(ctx.project, &fitness, &outcome);
    let summary = OptimizationSummary {
        evaluations: outcome.evaluations,
        failures: outcome.failures,
        generations: outcome.generations,
        stop_reason: outcome.stop_reason.as_str().to_string(),
        elapsed_s: outcome.elapsed.as_secs_f64(),
        pareto_size: outcome.pareto.len(),
    };
    save(ctx, &run, Some(summary), Some(&pareto), progress_cb, timing)
}

/// Feasible member with the lowest first objective, ties by id; otherwise the least violating.
fn representative(outcome: &OptimizationOutcome) -> Option<&Candidate> {
    let evaluated = || outcome.pareto.iter().filter(|c| !c.is_failed());
    let by_first = |a: &&Candidate, b: &&Candidate| {
        let fa = a.objectives.first().copied().unwrap_or(0.0);
        let fb = b.objectives.first().copied().unwrap_or(0.0);
        fa.total_cmp(&fb).then(a.id.cmp(&b.id))
    };
    evaluated()
        .filter(|c| c.is_feasible())
        .min_by(by_first)
        .or_else(|| {
            evaluated().min_by(|a, b| a.violation.total_cmp(&b.violation).then(a.id.cmp(&b.id)))
        })
}

fn pareto_file(
    project: &Project,
    fitness: &ScenarioFitness,
    outcome: &OptimizationOutcome,
) -> ParetoFile {
    let members = outcome
        .pareto
        .iter()
        .map(|c| {
            let (objectives, constraints) = match &c.evaluation {
                Some(e) => (e.objectives.values.clone(), e.constraints.values.clone()),
                None => (Vec::new(), Vec::new()),
            };
            ParetoMember {
                id: c.id,
                generation: c.generation,
                decision: c.x.clone(),
                parameters: to_map(&c.params),
                objectives,
                constraints,
                violation: (!c.is_failed()).then_some(c.violation),
                failure: c.failure.clone(),
            }
        })
        .collect();
    ParetoFile {
        decision_names: project
            .decision_variables
            .iter()
            .map(|d| d.name.clone())
            .collect(),
        objective_names: fitness.objectives.iter().map(|o| o.name.clone()).collect(),
        constraint_names: fitness.constraints.iter().map(|c| c.name.clone()).collect(),
        members,
    }
}

/// List runs for a project, most recent first.
pub fn list_runs(project_path: &Path) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.list_runs()?)
}

/// Load a specific run.
pub fn load_run(project_path: &Path, run_id: &str) -> AppResult<(RunManifest, Vec<DailyRecord>)> {
    let store = RunStore::for_project(project_path)?;

    let manifest = store.load_manifest(run_id)?;
    let records = store.load_series(run_id)?;

    Ok((manifest, records))
}

/// Load the Pareto set of an optimization run.
pub fn load_pareto(project_path: &Path, run_id: &str) -> AppResult<ParetoFile> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.load_pareto(run_id)?)
}
