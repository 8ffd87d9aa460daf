use std::path::PathBuf;
use std::sync::Arc;

use lf_app::{ScenarioRunner, compile_project};
use lf_core::CompletedRun;
use lf_eval::{EvalError, evaluate};
use lf_project::schema::{Project, SimulationType};
use lf_project::{ForcingFile, load_input_data, load_yaml, save_yaml, write_forcing};

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos/lake_scenario.yaml")
}

fn runner_for(project: &Project, path: &std::path::Path) -> ScenarioRunner {
    let compiled = compile_project(project, SimulationType::Scenario).unwrap();
    let inputs = load_input_data(project, path).unwrap();
    ScenarioRunner::new(Arc::new(compiled.scenario), Arc::new(inputs))
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lf_app_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn demo_scenario_is_deterministic() {
    let path = demo_path();
    let project = load_yaml(&path).unwrap();
    let compiled = compile_project(&project, SimulationType::Scenario).unwrap();
    let runner = runner_for(&project, &path);

    let a = runner.run_scenario(&compiled.base_params).unwrap();
    let b = runner.clone().run_scenario(&compiled.base_params).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.hydrology.get("stage_ft").unwrap().len(), 730);
    assert!(a.nutrient.as_ref().unwrap().get("s77_tp_load_kg").is_ok());
}

#[test]
fn hydrology_only_run_skips_nutrient_series() {
    let path = demo_path();
    let mut project = load_yaml(&path).unwrap();
    project.nutrient = None;
    let compiled = compile_project(&project, SimulationType::Scenario).unwrap();
    let run = runner_for(&project, &path)
        .run_scenario(&compiled.base_params)
        .unwrap();

    assert!(run.nutrient.is_none());
    let err = evaluate(&run, &compiled.objectives, &compiled.constraints).unwrap_err();
    assert_eq!(
        err,
        EvalError::MissingSeries {
            name: "s77_tp_load_kg".into()
        }
    );
}

#[test]
fn empty_lake_without_inputs_stays_empty() {
    let dir = scratch("empty_lake");
    let mut project = load_yaml(&demo_path()).unwrap();
    project.working_path = ".".into();
    project.simulation.start = chrono::NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
    project.simulation.end = chrono::NaiveDate::from_ymd_opt(2010, 12, 31).unwrap();
    project.lake.initial_stage_ft = None;
    project.lake.initial_storage_acft = Some(0.0);
    if let Some(n) = project.nutrient.as_mut() {
        n.initial_sediment_kg = 0.0;
        n.atmospheric_kg_per_acre_day = 0.0;
    }

    let demo_forcing = lf_project::read_forcing(&demo_path().with_file_name("data/forcing.json"))
        .unwrap();
    let zeros = ForcingFile {
        start: demo_forcing.start,
        series: demo_forcing
            .series
            .keys()
            .map(|k| (k.clone(), vec![0.0; 365]))
            .collect(),
    };
    write_forcing(&dir.join("forcing.json"), &zeros).unwrap();
    let path = dir.join("project.yaml");
    save_yaml(&path, &project).unwrap();

    let compiled = compile_project(&project, SimulationType::Scenario).unwrap();
    let run = runner_for(&project, &path)
        .run_scenario(&compiled.base_params)
        .unwrap();
    let _ = std::fs::remove_dir_all(&dir);

    let all_zero = |name: &str| run.series(name).unwrap().values().iter().all(|&v| v == 0.0);
    assert_eq!(run.series("storage_acft").unwrap().len(), 365);
    assert!(all_zero("storage_acft"));
    assert!(all_zero("total_outflow_acft"));
    assert!(all_zero("tp_water_mass_kg"));
    assert!(all_zero("tp_sediment_mass_kg"));
    assert!(all_zero("tp_outflow_load_kg"));
}

#[test]
fn doubled_loads_do_not_reduce_estuary_load() {
    let path = demo_path();
    let project = load_yaml(&path).unwrap();
    let compiled = compile_project(&project, SimulationType::Scenario).unwrap();
    let inputs = load_input_data(&project, &path).unwrap();
    let config = Arc::new(compiled.scenario.clone());
    let doubled = inputs.with_scaled("tp_load_kg", 2.0).unwrap();

    let base = ScenarioRunner::new(Arc::clone(&config), Arc::new(inputs))
        .run_scenario(&compiled.base_params)
        .unwrap();
    let more = ScenarioRunner::new(config, Arc::new(doubled))
        .run_scenario(&compiled.base_params)
        .unwrap();
    assert_eq!(base.hydrology, more.hydrology);

    let load = |run: &CompletedRun| {
        evaluate(run, &compiled.objectives, &[])
            .unwrap()
            .objectives
            .values[0]
    };
    assert!(load(&more) >= load(&base));
}
