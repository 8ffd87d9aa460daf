//! End-to-end runs through the run service, persisted in a scratch project directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use lf_app::{
    RunMode, RunOptions, RunProgressEvent, RunRequest, RunStage, ensure_run,
    ensure_run_with_progress, list_runs, load_pareto, load_run, query,
};
use lf_project::schema::SimulationType;
use lf_project::{load_yaml, save_yaml};

fn demos() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

/// Copy a demo project and its forcing into a fresh directory.
fn scratch_project(name: &str, edit: impl FnOnce(&mut lf_project::Project)) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lf_app_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::copy(demos().join("data/forcing.json"), dir.join("forcing.json")).unwrap();

    let mut project = load_yaml(&demos().join("lake_scenario.yaml")).unwrap();
    project.working_path = ".".into();
    edit(&mut project);
    let path = dir.join("project.yaml");
    save_yaml(&path, &project).unwrap();
    path
}

fn cleanup(project_path: &Path) {
    if let Some(dir) = project_path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

fn small_search(project: &mut lf_project::Project) {
    project.simulation.kind = SimulationType::OptimizationScenario;
    project.simulation.end = chrono::NaiveDate::from_ymd_opt(2010, 6, 30).unwrap();
    if let Some(opt) = project.optimizer.as_mut() {
        opt.population = 6;
        opt.generations = Some(3);
        opt.max_evaluations = None;
        opt.workers = 2;
    }
}

#[test]
fn scenario_run_persists_and_is_cached() {
    let project_path = scratch_project("scenario_cache", |_| {});
    let request = RunRequest {
        project_path: &project_path,
        options: RunOptions::default(),
    };

    let mut events: Vec<RunProgressEvent> = Vec::new();
    let first = ensure_run_with_progress(&request, Some(&mut |e| events.push(e))).unwrap();
    assert!(!first.loaded_from_cache);
    assert_eq!(first.mode, RunMode::Scenario);
    assert!(events.iter().any(|e| e.stage == RunStage::Simulating));
    assert_eq!(events.last().map(|e| &e.stage), Some(&RunStage::Completed));

    let second = ensure_run(&request).unwrap();
    assert!(second.loaded_from_cache);
    assert_eq!(first.run_id, second.run_id);

    let runs = list_runs(&project_path).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, first.run_id);

    let (manifest, records) = load_run(&project_path, &first.run_id).unwrap();
    assert_eq!(manifest.days, 730);
    assert_eq!(manifest.parameters.get("supply.cutback_z1"), Some(&15.0));
    let summary = query::get_run_summary(&records).unwrap();
    assert_eq!(summary.record_count, 730);
    assert!(query::list_series_names(&records).contains(&"s77_tp_load_kg".to_string()));
    assert!(load_pareto(&project_path, &first.run_id).is_err());

    cleanup(&project_path);
}

#[test]
fn changed_parameters_get_a_new_run_id() {
    let base = scratch_project("params_a", |_| {});
    let changed = scratch_project("params_b", |p| {
        p.parameters.insert("supply.cutback_z1".into(), 25.0);
    });
    let run = |path: &Path| {
        ensure_run(&RunRequest {
            project_path: path,
            options: RunOptions::default(),
        })
        .unwrap()
    };
    assert_ne!(run(&base).run_id, run(&changed).run_id);
    cleanup(&base);
    cleanup(&changed);
}

#[test]
fn validation_mode_uses_optimization_rule() {
    let project_path = scratch_project("validation", |_| {});
    let options = RunOptions {
        mode: Some(RunMode::OptimizationValidation),
        ..RunOptions::default()
    };
    let scenario = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions::default(),
    })
    .unwrap();
    let validation = ensure_run(&RunRequest {
        project_path: &project_path,
        options,
    })
    .unwrap();
    assert_ne!(scenario.run_id, validation.run_id);
    assert_eq!(validation.manifest.run_type.label(), "optimization_validation");
    assert_eq!(list_runs(&project_path).unwrap().len(), 2);
    cleanup(&project_path);
}

#[test]
fn optimization_run_stores_pareto_set() {
    let project_path = scratch_project("optimization", small_search);
    let request = RunRequest {
        project_path: &project_path,
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
    };

    let mut generations = Vec::new();
    let response = ensure_run_with_progress(
        &request,
        Some(&mut |e: RunProgressEvent| {
            if let Some(p) = e.optimization {
                generations.push(p.generation);
            }
        }),
    )
    .unwrap();
    assert_eq!(generations, vec![1, 2, 3]);

    let summary = response.manifest.optimization.clone().unwrap();
    assert_eq!(summary.generations, 3);
    assert_eq!(summary.evaluations, 18);
    assert_eq!(summary.stop_reason, "generation_budget");

    let pareto = load_pareto(&project_path, &response.run_id).unwrap();
    assert_eq!(summary.pareto_size, pareto.members.len());
    assert!(!pareto.members.is_empty());
    assert_eq!(pareto.objective_names, ["estuary_tp_load", "mean_supply"]);
    assert_eq!(pareto.decision_names.len(), 4);
    for m in &pareto.members {
        assert_eq!(m.decision.len(), 4);
        assert_eq!(m.objectives.len(), 2);
        assert!(m.failure.is_none());
    }

    // The stored series belong to a Pareto member.
    let close = |a: &f64, b: &f64| (a - b).abs() <= 1e-9 * a.abs().max(1.0);
    assert!(pareto.members.iter().any(|m| {
        m.parameters.len() == response.manifest.parameters.len()
            && m.parameters
                .iter()
                .zip(&response.manifest.parameters)
                .all(|((ka, va), (kb, vb))| ka == kb && close(va, vb))
    }));
    cleanup(&project_path);
}

#[test]
fn cancelled_before_start_saves_nothing() {
    let project_path = scratch_project("cancelled", small_search);
    let cancel = Arc::new(AtomicBool::new(true));
    let err = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions {
            use_cache: false,
            cancel: Some(cancel),
            ..RunOptions::default()
        },
    })
    .unwrap_err();
    // Nothing was evaluated before the flag was seen.
    assert!(matches!(err, lf_app::AppError::Optimization(_)), "{err}");
    assert!(list_runs(&project_path).unwrap().is_empty());
    cleanup(&project_path);
}
