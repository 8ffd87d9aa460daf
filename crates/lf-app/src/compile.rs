//! Compilation of project definitions into engine configurations.

use lf_core::ParameterVector;
use lf_eval::{Bound, Constraint, Metric, Objective, Reduction, Sense};
use lf_hydro::{
    AdaptiveProtocol, Augmentation, BackflowRule, DemandSource, EtMode, EwsMode, HydroConfig,
    InitialCondition, LakeGeometry, LevelRates, LineKind, LowChanceLine, OptimizedRule,
    PulsePattern, RegulationSchedule, ReleaseMode, ScheduleLine, Structure, TributaryClassifier,
    WaterSupply,
};
use lf_nutrient::NutrientConfig;
use lf_optim::{DecisionVariable, SearchSpace};
use lf_project::schema::{
    AdaptiveProtocolDef, ConstraintDef, DemandDef, EtModeDef, EwsModeDef, LineDef, LowChanceDef,
    MetricDef, NutrientDef, ObjectiveDef, OptimizationRuleDef, Project, ReductionDef, SenseDef,
    SimulationType, StructureDef,
};
use lf_sim::SimError;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::scenario::ScenarioConfig;

/// Everything needed to run or search a project.
#[derive(Clone, Debug)]
pub struct CompiledProject {
    pub scenario: ScenarioConfig,
    /// Project parameters; decision variables are overlaid on these.
    pub base_params: ParameterVector,
    pub objectives: Vec<Objective>,
    pub constraints: Vec<Constraint>,
    pub mode: ReleaseMode,
}

fn compile_err(section: &'static str) -> impl Fn(SimError) -> AppError {
    move |e| AppError::Compile(format!("{section}: {e}"))
}

/// Release mode used by each simulation type.
pub fn release_mode(kind: SimulationType) -> ReleaseMode {
    match kind {
        SimulationType::Scenario => ReleaseMode::Scenario,
        SimulationType::OptimizationValidation | SimulationType::OptimizationScenario => {
            ReleaseMode::Optimization
        }
    }
}

fn compile_schedule(project: &Project) -> AppResult<RegulationSchedule> {
    let mut lines = Vec::with_capacity(LineKind::ALL.len());
    for kind in LineKind::ALL {
        let def = project.schedule.lines.get(kind.name()).ok_or_else(|| {
            AppError::Compile(format!("schedule line '{}' is missing", kind.name()))
        })?;
        let line = match def {
            LineDef::Flat(stage) => ScheduleLine::flat(*stage),
            LineDef::Points(points) => {
                ScheduleLine::new(points.clone()).map_err(compile_err("schedule"))?
            }
        };
        lines.push(line);
    }
    RegulationSchedule::new(lines, project.schedule.wsm_band_ft).map_err(compile_err("schedule"))
}

fn compile_structure(def: &StructureDef) -> Structure {
    Structure {
        id: def.id.clone(),
        runoff_series: def.runoff_series.clone(),
        rates: LevelRates {
            baseflow: def.rates.baseflow,
            level1: def.rates.level1,
            level2: def.rates.level2,
            level3: def.rates.level3,
            maximum: def.rates.maximum,
        },
        capacity_cfs: def.capacity_cfs,
        falling_stage_multiplier: def.recession_multiplier,
        backflow: def.backflow.as_ref().map(|b| BackflowRule {
            stage_below_ft: b.stage_below_ft,
            fraction: b.fraction,
            max_cfs: b.max_cfs,
        }),
        pulses: def.pulses.as_ref().map(|p| PulsePattern {
            level1: p.level1.clone(),
            level2: p.level2.clone(),
            level3: p.level3.clone(),
        }),
        optimized: def.optimized,
    }
}

fn compile_protocol(def: &AdaptiveProtocolDef) -> AdaptiveProtocol {
    AdaptiveProtocol {
        structure: def.structure.clone(),
        thc_threshold: def.thc_threshold,
        low_chance: match &def.low_chance {
            LowChanceDef::Wsm1Offset => LowChanceLine::Wsm1Offset,
            LowChanceDef::Disabled => LowChanceLine::Disabled,
            LowChanceDef::Series { name } => LowChanceLine::Series(name.clone()),
        },
        late_dry_season_only: def.late_dry_season_only,
        no_protocol_above_baseflow_band: def.no_ap_above_baseflow_band,
        ews_mode: match def.ews_mode {
            EwsModeDef::Off => EwsMode::Off,
            EwsModeDef::Target => EwsMode::Target,
            EwsModeDef::Fixed300 => EwsMode::Fixed300,
        },
        thc_bypass_late_dry_season: def.thc_bypass_late_dry_season,
        ews_cfs: def.ews_cfs,
        baseflow_cap_cfs: def.baseflow_cap_cfs,
        cutbacks_pct: def.cutbacks_pct,
    }
}

fn compile_rule(def: &OptimizationRuleDef) -> OptimizedRule {
    OptimizedRule {
        p1: def.p1,
        p2: def.p2,
        high_stage_ft: def.high_stage_ft,
        low_stage_ft: def.low_stage_ft,
        trigger_series: def.trigger_series.clone(),
        monthly_cfs: def.monthly_cfs.clone(),
    }
}

/// Build the hydrology engine configuration.
pub fn compile_hydro(project: &Project, mode: ReleaseMode) -> AppResult<HydroConfig> {
    let lake = &project.lake;
    let geometry = LakeGeometry::new(
        lake.stage_ft.clone(),
        lake.storage_acft.clone(),
        lake.area_acres.clone(),
    )
    .map_err(compile_err("lake"))?;

    // Storage wins when both are given.
    let initial = match (lake.initial_storage_acft, lake.initial_stage_ft) {
        (Some(storage), _) => InitialCondition::Storage(storage),
        (None, Some(stage)) => InitialCondition::Stage(stage),
        (None, None) => {
            return Err(AppError::Compile(
                "lake needs initial_stage_ft or initial_storage_acft".to_string(),
            ));
        }
    };

    let demand = match &project.water_supply.demand {
        DemandDef::Series => DemandSource::Series,
        DemandDef::Weekly {
            weekly_acft,
            multiplier_pct,
        } => DemandSource::Weekly {
            weekly_acft: weekly_acft.clone(),
            multiplier_pct: *multiplier_pct,
        },
    };
    let supply = WaterSupply::new(demand, project.water_supply.cutbacks_pct)
        .map_err(compile_err("water_supply"))?;
    let tributary = TributaryClassifier::new(project.tributary.thresholds)
        .map_err(compile_err("tributary"))?;

    let structures: Vec<Structure> = project.structures.iter().map(compile_structure).collect();
    let optimized_rule = project.optimization_rule.as_ref().map(compile_rule);
    if mode == ReleaseMode::Optimization
        && optimized_rule.is_none()
        && structures.iter().any(|s| s.optimized)
    {
        return Err(AppError::Compile(
            "optimized structures need an optimization_rule in optimization runs".to_string(),
        ));
    }

    let config = HydroConfig {
        geometry,
        initial,
        schedule: compile_schedule(project)?,
        supply,
        tributary,
        structures,
        protocol: project.adaptive_protocol.as_ref().map(compile_protocol),
        optimized_rule,
        augmentation: project
            .augmentation
            .iter()
            .map(|a| Augmentation {
                id: a.id.clone(),
                source_series: a.source_series.clone(),
                trigger_offset_ft: a.trigger_offset_ft,
                cap_cfs: a.cap_cfs,
            })
            .collect(),
        et_mode: match lake.et_mode {
            EtModeDef::Volume => EtMode::Volume,
            EtModeDef::Depth => EtMode::Depth,
        },
        mode,
    };
    config.validate().map_err(compile_err("hydrology"))?;
    Ok(config)
}

fn nutrient_config(project: &Project, def: &NutrientDef) -> NutrientConfig {
    let structures = if def.structures.is_empty() {
        project.structures.iter().map(|s| s.id.clone()).collect()
    } else {
        def.structures.clone()
    };
    NutrientConfig {
        initial_conc_mg_l: def.initial_conc_mg_l,
        initial_sediment_kg: def.initial_sediment_kg,
        settling_velocity_m_per_day: def.settling_velocity_m_per_day,
        release_rate_per_day: def.release_rate_per_day,
        burial_rate_per_day: def.burial_rate_per_day,
        load_multiplier: def.load_multiplier,
        load_series: def.load_series.clone(),
        atmospheric_kg_per_acre_day: def.atmospheric_kg_per_acre_day,
        backflow_conc_mg_l: def.backflow_conc_mg_l,
        max_conc_mg_l: def.max_conc_mg_l,
        structures,
    }
}

/// Build the nutrient engine configuration; `None` when the project has no nutrient section.
pub fn compile_nutrient(project: &Project) -> AppResult<Option<NutrientConfig>> {
    let Some(def) = &project.nutrient else {
        return Ok(None);
    };
    let config = nutrient_config(project, def);
    config.validate().map_err(compile_err("nutrient"))?;
    Ok(Some(config))
}

fn compile_metric(def: &MetricDef) -> Metric {
    let reduction = match def.reduction {
        ReductionDef::Mean => Reduction::Mean,
        ReductionDef::Sum => Reduction::Sum,
        ReductionDef::Max => Reduction::Max,
        ReductionDef::Min => Reduction::Min,
        ReductionDef::DaysAbove { threshold } => Reduction::DaysAbove(threshold),
        ReductionDef::DaysBelow { threshold } => Reduction::DaysBelow(threshold),
        ReductionDef::AnnualDaysAbove { threshold } => Reduction::AnnualDaysAbove(threshold),
        ReductionDef::AnnualDaysBelow { threshold } => Reduction::AnnualDaysBelow(threshold),
    };
    Metric {
        series: def.series.clone(),
        reduction,
        scale: def.scale,
    }
}

pub fn compile_objectives(defs: &[ObjectiveDef]) -> Vec<Objective> {
    defs.iter()
        .map(|o| Objective {
            name: o.name.clone(),
            sense: match o.sense {
                SenseDef::Minimize => Sense::Minimize,
                SenseDef::Maximize => Sense::Maximize,
            },
            metric: compile_metric(&o.metric),
        })
        .collect()
}

/// One engine constraint per bound; a two-sided definition becomes `<name>.min` and `<name>.max`.
pub fn compile_constraints(defs: &[ConstraintDef]) -> AppResult<Vec<Constraint>> {
    let mut out = Vec::with_capacity(defs.len());
    for c in defs {
        let metric = compile_metric(&c.metric);
        match (c.min, c.max) {
            (None, None) => {
                return Err(AppError::Compile(format!(
                    "constraint '{}' needs a min or max bound",
                    c.name
                )));
            }
            (Some(min), None) => out.push(Constraint {
                name: c.name.clone(),
                metric,
                bound: Bound::Min(min),
            }),
            (None, Some(max)) => out.push(Constraint {
                name: c.name.clone(),
                metric,
                bound: Bound::Max(max),
            }),
            (Some(min), Some(max)) => {
                out.push(Constraint {
                    name: format!("{}.min", c.name),
                    metric: metric.clone(),
                    bound: Bound::Min(min),
                });
                out.push(Constraint {
                    name: format!("{}.max", c.name),
                    metric,
                    bound: Bound::Max(max),
                });
            }
        }
    }
    Ok(out)
}

pub fn compile_search_space(project: &Project, base: &ParameterVector) -> AppResult<SearchSpace> {
    let vars = project
        .decision_variables
        .iter()
        .map(|d| DecisionVariable {
            name: d.name.clone(),
            min: d.min,
            max: d.max,
        })
        .collect();
    Ok(SearchSpace::new(vars, base.clone())?)
}

fn check_parameter_names(project: &Project, scenario: &ScenarioConfig) -> AppResult<()> {
    let known = |name: &str| {
        scenario.hydro.is_known_parameter(name)
            || scenario
                .nutrient
                .as_ref()
                .is_some_and(|n| n.is_known_parameter(name))
    };
    let names = project
        .parameters
        .keys()
        .map(String::as_str)
        .chain(project.decision_variables.iter().map(|d| d.name.as_str()));
    for name in names {
        if !known(name) {
            return Err(AppError::Validation(format!(
                "unknown parameter '{name}'"
            )));
        }
    }
    Ok(())
}

/// Compile the whole project for a simulation type.
pub fn compile_project(project: &Project, kind: SimulationType) -> AppResult<CompiledProject> {
    let mode = release_mode(kind);
    let scenario = ScenarioConfig {
        hydro: compile_hydro(project, mode)?,
        nutrient: compile_nutrient(project)?,
    };
    check_parameter_names(project, &scenario)?;

    let objectives = compile_objectives(&project.objectives);
    let constraints = compile_constraints(&project.constraints)?;
    if kind == SimulationType::OptimizationScenario && objectives.is_empty() {
        return Err(AppError::Compile(
            "optimization needs at least one objective".to_string(),
        ));
    }

    debug!(
        structures = scenario.hydro.structures.len(),
        nutrient = scenario.nutrient.is_some(),
        objectives = objectives.len(),
        constraints = constraints.len(),
        "project compiled"
    );

    Ok(CompiledProject {
        scenario,
        base_params: project
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect(),
        objectives,
        constraints,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_project::schema::StructureDef;

    fn demo() -> Project {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/lake_scenario.yaml");
        lf_project::load_yaml(std::path::Path::new(path)).unwrap()
    }

    #[test]
    fn demo_compiles_for_every_type() {
        let project = demo();
        for kind in [
            SimulationType::Scenario,
            SimulationType::OptimizationValidation,
            SimulationType::OptimizationScenario,
        ] {
            let compiled = compile_project(&project, kind).unwrap();
            assert_eq!(compiled.mode, release_mode(kind));
            assert_eq!(compiled.scenario.hydro.structures.len(), 3);
        }
    }

    #[test]
    fn empty_nutrient_structures_mean_all() {
        let mut project = demo();
        if let Some(n) = project.nutrient.as_mut() {
            n.structures.clear();
        }
        let cfg = compile_nutrient(&project).unwrap().unwrap();
        assert_eq!(cfg.structures, vec!["s77", "s308", "south"]);
    }

    #[test]
    fn unknown_parameter_rejected() {
        let mut project = demo();
        project.parameters.insert("release.s99.m01".into(), 10.0);
        let err = compile_project(&project, SimulationType::Scenario).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn optimized_structure_needs_rule() {
        let mut project = demo();
        project.optimization_rule = None;
        project.decision_variables.clear();
        project.parameters.retain(|k, _| !k.starts_with("release."));
        assert!(compile_hydro(&project, ReleaseMode::Scenario).is_ok());
        assert!(matches!(
            compile_hydro(&project, ReleaseMode::Optimization),
            Err(AppError::Compile(_))
        ));
    }

    #[test]
    fn pulse_patterns_compile_and_validate() {
        let mut project = demo();
        let cfg = compile_hydro(&project, ReleaseMode::Scenario).unwrap();
        let s308 = cfg.structures.iter().find(|s| s.id == "s308").unwrap();
        assert_eq!(s308.pulses.as_ref().map(|p| p.level1.len()), Some(10));

        if let Some(p) = project.structures[1].pulses.as_mut() {
            p.level2[3] = -1.0;
        }
        assert!(matches!(
            compile_hydro(&project, ReleaseMode::Scenario),
            Err(AppError::Compile(_))
        ));
    }

    #[test]
    fn two_sided_constraint_splits() {
        let mut project = demo();
        project.constraints[0].min = Some(1.0);
        let cs = compile_constraints(&project.constraints).unwrap();
        let names: Vec<_> = cs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["low_stage_days.min", "low_stage_days.max"]);
        assert_eq!(cs[0].bound, Bound::Min(1.0));
    }

    #[test]
    fn storage_wins_over_stage() {
        let mut project = demo();
        project.lake.initial_stage_ft = Some(14.0);
        project.lake.initial_storage_acft = Some(1_000_000.0);
        let cfg = compile_hydro(&project, ReleaseMode::Scenario).unwrap();
        assert_eq!(cfg.initial, InitialCondition::Storage(1_000_000.0));

        let duplicate = StructureDef {
            id: "s77".into(),
            ..project.structures[0].clone()
        };
        project.structures.push(duplicate);
        assert!(compile_hydro(&project, ReleaseMode::Scenario).is_err());
    }
}
