//! Parallel evaluation loop with budgets and cancellation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::archive::ParetoArchive;
use crate::candidate::Candidate;
use crate::error::{OptimError, OptimResult};
use crate::fitness::FitnessFunction;
use crate::solver::Solver;
use crate::space::SearchSpace;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptimizerConfig {
    pub max_evaluations: Option<usize>,
    pub max_generations: Option<usize>,
    pub time_limit: Option<Duration>,
    /// Worker threads; 0 uses the rayon default.
    pub workers: usize,
    pub archive_capacity: Option<usize>,
}

impl OptimizerConfig {
    pub fn validate(&self) -> OptimResult<()> {
        if self.max_evaluations.is_none()
            && self.max_generations.is_none()
            && self.time_limit.is_none()
        {
            return Err(OptimError::InvalidConfig {
                what: "at least one of max_evaluations, max_generations or time_limit is required",
            });
        }
        if self.max_evaluations == Some(0) || self.max_generations == Some(0) {
            return Err(OptimError::InvalidConfig {
                what: "budgets must be positive",
            });
        }
        if self.archive_capacity == Some(0) {
            return Err(OptimError::InvalidConfig {
                what: "archive capacity must be positive",
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    EvaluationBudget,
    GenerationBudget,
    TimeLimit,
    Cancelled,
    /// The solver proposed no further candidates.
    Exhausted,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::EvaluationBudget => "evaluation_budget",
            StopReason::GenerationBudget => "generation_budget",
            StopReason::TimeLimit => "time_limit",
            StopReason::Cancelled => "cancelled",
            StopReason::Exhausted => "exhausted",
        }
    }
}

/// Emitted after every generation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationReport {
    pub generation: usize,
    pub evaluations: usize,
    pub failures: usize,
    pub archive_size: usize,
    pub feasible_in_archive: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Debug)]
pub struct OptimizationOutcome {
    /// Non-dominated candidates, ordered by id.
    pub pareto: Vec<Candidate>,
    pub evaluations: usize,
    pub failures: usize,
    pub generations: usize,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Drives a `Solver` against a `FitnessFunction`.
///
/// Batches are evaluated on a dedicated rayon pool. Each candidate is
/// inserted into the shared archive as soon as it completes; budgets,
/// the time limit and the cancel flag are checked before each candidate
/// starts, so a stop never interrupts a running simulation.
pub struct Optimizer {
    config: OptimizerConfig,
    cancel: Arc<AtomicBool>,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> OptimResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Share an externally owned cancel flag.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag that stops the search before the next candidate when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn optimize<F: FitnessFunction>(
        &self,
        space: &SearchSpace,
        fitness: &F,
        solver: &mut dyn Solver,
        n_objectives: usize,
    ) -> OptimResult<OptimizationOutcome> {
        self.optimize_with_progress(space, fitness, solver, n_objectives, None)
    }

    pub fn optimize_with_progress<F: FitnessFunction>(
        &self,
        space: &SearchSpace,
        fitness: &F,
        solver: &mut dyn Solver,
        n_objectives: usize,
        mut progress: Option<&mut dyn FnMut(&GenerationReport)>,
    ) -> OptimResult<OptimizationOutcome> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| OptimError::ThreadPool {
                message: e.to_string(),
            })?;

        let started_at = Instant::now();
        let archive = Mutex::new(ParetoArchive::new(self.config.archive_capacity));
        let reserved = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let failures = AtomicUsize::new(0);
        let mut next_id: u64 = 0;
        let mut generation = 0;

        info!(
            solver = solver.name(),
            dims = space.dims(),
            workers = pool.current_num_threads(),
            "optimization started"
        );

        let stop_reason = loop {
            if let Some(reason) = self.stop_reason(generation, &reserved, started_at) {
                break reason;
            }

            let batch = solver.ask();
            if batch.is_empty() {
                break StopReason::Exhausted;
            }
            let jobs: Vec<(u64, Vec<f64>)> = batch
                .into_iter()
                .map(|x| {
                    let id = next_id;
                    next_id += 1;
                    (id, x)
                })
                .collect();

            let results: Vec<Option<Candidate>> = pool.install(|| {
                jobs.into_par_iter()
                    .map(|(id, mut x)| {
                        if !self.may_start(&reserved, started_at) {
                            return None;
                        }
                        space.clamp(&mut x);
                        let params = space.decode(&x);
                        let candidate = match fitness.evaluate(&params) {
                            Ok(eval) => Candidate::evaluated(id, generation, x, params, eval),
                            Err(e) => {
                                warn!(id, error = %e, "candidate evaluation failed");
                                failures.fetch_add(1, Ordering::Relaxed);
                                Candidate::failed(id, generation, x, params, n_objectives, e.message)
                            }
                        };
                        completed.fetch_add(1, Ordering::Relaxed);
                        archive
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .insert(candidate.clone());
                        Some(candidate)
                    })
                    .collect()
            });

            let evaluated: Vec<Candidate> = results.into_iter().flatten().collect();
            generation += 1;

            let report = {
                let mut a = archive.lock().unwrap_or_else(PoisonError::into_inner);
                a.truncate();
                GenerationReport {
                    generation,
                    evaluations: completed.load(Ordering::Relaxed),
                    failures: failures.load(Ordering::Relaxed),
                    archive_size: a.len(),
                    feasible_in_archive: a.members().iter().filter(|c| c.is_feasible()).count(),
                    elapsed: started_at.elapsed(),
                }
            };
            debug!(
                generation,
                evaluated = evaluated.len(),
                archive = report.archive_size,
                "generation complete"
            );
            if !evaluated.is_empty() {
                solver.tell(&evaluated);
            }
            if let Some(cb) = progress.as_mut() {
                cb(&report);
            }
        };

        let mut archive = archive.into_inner().unwrap_or_else(PoisonError::into_inner);
        archive.truncate();
        let outcome = OptimizationOutcome {
            pareto: archive.into_sorted(),
            evaluations: completed.load(Ordering::Relaxed),
            failures: failures.load(Ordering::Relaxed),
            generations: generation,
            stop_reason,
            elapsed: started_at.elapsed(),
        };
        info!(
            reason = stop_reason.as_str(),
            evaluations = outcome.evaluations,
            pareto = outcome.pareto.len(),
            "optimization finished"
        );
        Ok(outcome)
    }

    fn stop_reason(
        &self,
        generation: usize,
        reserved: &AtomicUsize,
        started_at: Instant,
    ) -> Option<StopReason> {
        if self.cancel.load(Ordering::SeqCst) {
            return Some(StopReason::Cancelled);
        }
        if let Some(max) = self.config.max_evaluations
            && reserved.load(Ordering::SeqCst) >= max
        {
            return Some(StopReason::EvaluationBudget);
        }
        if let Some(max) = self.config.max_generations
            && generation >= max
        {
            return Some(StopReason::GenerationBudget);
        }
        if let Some(limit) = self.config.time_limit
            && started_at.elapsed() >= limit
        {
            return Some(StopReason::TimeLimit);
        }
        None
    }

    /// Reserve one evaluation slot if no stop condition holds.
    fn may_start(&self, reserved: &AtomicUsize, started_at: Instant) -> bool {
        if self.cancel.load(Ordering::SeqCst) {
            return false;
        }
        if let Some(limit) = self.config.time_limit
            && started_at.elapsed() >= limit
        {
            return false;
        }
        let max = self.config.max_evaluations;
        reserved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match max {
                Some(m) if n >= m => None,
                _ => Some(n + 1),
            })
            .is_ok()
    }
}
