//! Project schema definitions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    /// Directory holding input data, relative to the project file.
    #[serde(default = "default_working_path")]
    pub working_path: String,
    pub simulation: SimulationDef,
    pub forcing: ForcingDef,
    pub lake: LakeDef,
    pub schedule: ScheduleDef,
    #[serde(default)]
    pub water_supply: WaterSupplyDef,
    #[serde(default)]
    pub tributary: TributaryDef,
    #[serde(default)]
    pub structures: Vec<StructureDef>,
    #[serde(default)]
    pub augmentation: Vec<AugmentationDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptive_protocol: Option<AdaptiveProtocolDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_rule: Option<OptimizationRuleDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient: Option<NutrientDef>,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    #[serde(default)]
    pub decision_variables: Vec<DecisionVariableDef>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveDef>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerDef>,
}

fn default_working_path() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimulationType {
    /// Forward run with the scenario release rules.
    Scenario,
    /// Forward run with the optimization release rule and the given parameters.
    OptimizationValidation,
    /// Search over decision variables with the optimization release rule.
    OptimizationScenario,
}

impl SimulationType {
    pub fn as_str(self) -> &'static str {
        match self {
            SimulationType::Scenario => "scenario",
            SimulationType::OptimizationValidation => "optimization_validation",
            SimulationType::OptimizationScenario => "optimization_scenario",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationDef {
    #[serde(rename = "type")]
    pub kind: SimulationType,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForcingDef {
    /// JSON forcing file, relative to the working path.
    pub file: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EtModeDef {
    #[default]
    Volume,
    Depth,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LakeDef {
    pub stage_ft: Vec<f64>,
    pub storage_acft: Vec<f64>,
    pub area_acres: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_stage_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_storage_acft: Option<f64>,
    #[serde(default)]
    pub et_mode: EtModeDef,
}

/// Regulation lines keyed `a`, `b`, `c`, `d3`, `d2`, `d1`, `d0`, `wsm1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleDef {
    pub lines: BTreeMap<String, LineDef>,
    #[serde(default = "default_wsm_band")]
    pub wsm_band_ft: f64,
}

fn default_wsm_band() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LineDef {
    Flat(f64),
    /// (day of year, stage ft) breakpoints.
    Points(Vec<(u32, f64)>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DemandDef {
    Series,
    Weekly {
        weekly_acft: Vec<f64>,
        #[serde(default = "default_hundred")]
        multiplier_pct: f64,
    },
}

fn default_hundred() -> f64 {
    100.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaterSupplyDef {
    pub demand: DemandDef,
    #[serde(default)]
    pub cutbacks_pct: [f64; 4],
}

impl Default for WaterSupplyDef {
    fn default() -> Self {
        Self {
            demand: DemandDef::Series,
            cutbacks_pct: [0.0; 4],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TributaryDef {
    pub thresholds: [f64; 4],
}

impl Default for TributaryDef {
    fn default() -> Self {
        Self {
            thresholds: [-3.0, -1.5, 1.5, 3.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RatesDef {
    #[serde(default)]
    pub baseflow: f64,
    #[serde(default)]
    pub level1: f64,
    #[serde(default)]
    pub level2: f64,
    #[serde(default)]
    pub level3: f64,
    #[serde(default)]
    pub maximum: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackflowDef {
    pub stage_below_ft: f64,
    pub fraction: f64,
    pub max_cfs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runoff_series: Option<String>,
    pub rates: RatesDef,
    pub capacity_cfs: f64,
    #[serde(default = "default_multiplier")]
    pub recession_multiplier: [f64; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backflow: Option<BackflowDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulses: Option<PulsesDef>,
    #[serde(default)]
    pub optimized: bool,
}

fn default_multiplier() -> [f64; 4] {
    [1.0; 4]
}

/// Relative daily release shape for pulses at levels 1, 2 and 3.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PulsesDef {
    pub level1: Vec<f64>,
    pub level2: Vec<f64>,
    pub level3: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AugmentationDef {
    pub id: String,
    pub source_series: String,
    #[serde(default)]
    pub trigger_offset_ft: f64,
    pub cap_cfs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LowChanceDef {
    Wsm1Offset,
    Disabled,
    Series { name: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EwsModeDef {
    Off,
    Target,
    Fixed300,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdaptiveProtocolDef {
    pub structure: String,
    #[serde(default)]
    pub thc_threshold: f64,
    #[serde(default = "default_low_chance")]
    pub low_chance: LowChanceDef,
    #[serde(default)]
    pub late_dry_season_only: bool,
    #[serde(default)]
    pub no_ap_above_baseflow_band: bool,
    #[serde(default = "default_ews_mode")]
    pub ews_mode: EwsModeDef,
    #[serde(default)]
    pub thc_bypass_late_dry_season: bool,
    #[serde(default)]
    pub ews_cfs: f64,
    #[serde(default)]
    pub baseflow_cap_cfs: f64,
    #[serde(default)]
    pub cutbacks_pct: [f64; 4],
}

fn default_low_chance() -> LowChanceDef {
    LowChanceDef::Disabled
}

fn default_ews_mode() -> EwsModeDef {
    EwsModeDef::Target
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationRuleDef {
    pub p1: f64,
    pub p2: f64,
    pub high_stage_ft: f64,
    pub low_stage_ft: f64,
    #[serde(default = "default_trigger")]
    pub trigger_series: String,
    /// Monthly release (cfs) per structure id, January first.
    #[serde(default)]
    pub monthly_cfs: BTreeMap<String, [f64; 12]>,
}

fn default_trigger() -> String {
    "lake_tp_baseline".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutrientDef {
    #[serde(default)]
    pub initial_conc_mg_l: f64,
    #[serde(default)]
    pub initial_sediment_kg: f64,
    pub settling_velocity_m_per_day: f64,
    #[serde(default)]
    pub release_rate_per_day: f64,
    #[serde(default)]
    pub burial_rate_per_day: f64,
    #[serde(default = "default_one")]
    pub load_multiplier: f64,
    #[serde(default = "default_load_series")]
    pub load_series: String,
    #[serde(default)]
    pub atmospheric_kg_per_acre_day: f64,
    #[serde(default)]
    pub backflow_conc_mg_l: f64,
    #[serde(default = "default_max_conc")]
    pub max_conc_mg_l: f64,
    /// Structures carrying phosphorus out; all structures when empty.
    #[serde(default)]
    pub structures: Vec<String>,
}

fn default_one() -> f64 {
    1.0
}

fn default_load_series() -> String {
    "tp_load_kg".to_string()
}

fn default_max_conc() -> f64 {
    10.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionVariableDef {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReductionDef {
    Mean,
    Sum,
    Max,
    Min,
    DaysAbove { threshold: f64 },
    DaysBelow { threshold: f64 },
    AnnualDaysAbove { threshold: f64 },
    AnnualDaysBelow { threshold: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricDef {
    /// Series reduced; several are summed day by day first.
    pub series: Vec<String>,
    pub reduction: ReductionDef,
    #[serde(default = "default_one")]
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SenseDef {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveDef {
    pub name: String,
    pub sense: SenseDef,
    pub metric: MetricDef,
}

/// Feasible while `min <= value <= max` for whichever bounds are given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstraintDef {
    pub name: String,
    pub metric: MetricDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmDef {
    #[default]
    Nsga2,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizerDef {
    #[serde(default)]
    pub algorithm: AlgorithmDef,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_population")]
    pub population: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_evaluations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_clock_secs: Option<f64>,
    /// Worker threads; 0 uses all cores.
    #[serde(default)]
    pub workers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_capacity: Option<usize>,
}

fn default_population() -> usize {
    40
}
