use std::path::PathBuf;

use lf_project::schema::*;
use lf_project::{ValidationError, load_yaml, validate_project};

fn demo() -> Project {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos/lake_optimization.yaml");
    load_yaml(&path).expect("demo project")
}

#[test]
fn duplicate_structure_ids_rejected() {
    let mut p = demo();
    let dup = p.structures[0].clone();
    p.structures.push(dup);
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::DuplicateId { .. })
    ));
}

#[test]
fn crossing_schedule_lines_rejected() {
    let mut p = demo();
    p.schedule
        .lines
        .insert("d1".into(), LineDef::Flat(16.0));
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::InvalidValue { .. })
    ));
}

#[test]
fn missing_schedule_line_rejected() {
    let mut p = demo();
    p.schedule.lines.remove("wsm1");
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::MissingSection { .. })
    ));
}

#[test]
fn non_monotonic_geometry_rejected() {
    let mut p = demo();
    p.lake.storage_acft[3] = p.lake.storage_acft[2];
    assert!(validate_project(&p).is_err());
}

#[test]
fn protocol_must_reference_structure() {
    let mut p = demo();
    if let Some(ap) = p.adaptive_protocol.as_mut() {
        ap.structure = "nowhere".into();
    }
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::MissingReference { .. })
    ));
}

#[test]
fn decision_variable_bounds_checked() {
    let mut p = demo();
    p.decision_variables[0].min = 300.0;
    assert!(validate_project(&p).is_err());
}

#[test]
fn end_before_start_rejected() {
    let mut p = demo();
    p.simulation.end = p.simulation.start.pred_opt().unwrap();
    assert!(validate_project(&p).is_err());
}

#[test]
fn optimization_needs_budget() {
    let mut p = demo();
    if let Some(opt) = p.optimizer.as_mut() {
        opt.generations = None;
        opt.max_evaluations = None;
        opt.wall_clock_secs = None;
    }
    assert!(validate_project(&p).is_err());

    let mut p = demo();
    p.optimizer = None;
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::MissingSection { .. })
    ));
}

#[test]
fn constraints_need_a_bound() {
    let mut p = demo();
    p.constraints[0].max = None;
    assert!(validate_project(&p).is_err());
}

#[test]
fn empty_objective_name_rejected() {
    let mut p = demo();
    p.objectives[0].name = " ".into();
    assert!(validate_project(&p).is_err());
}

mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn decision_bounds_follow_ordering(lo in -500.0f64..500.0, width in -50.0f64..50.0) {
            let mut p = demo();
            p.decision_variables[0].min = lo;
            p.decision_variables[0].max = lo + width;
            let accepted = validate_project(&p).is_ok();
            prop_assert_eq!(accepted, lo < lo + width);
        }
    }
}
