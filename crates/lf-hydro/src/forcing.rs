//! Forcing series names and lookup.

use lf_core::InputData;
use lf_sim::SimResult;

use crate::config::{EtMode, HydroConfig, ReleaseMode};
use crate::protocol::LowChanceLine;

pub const NET_INFLOW: &str = "net_inflow_acft";
pub const RAINFALL: &str = "rainfall_acft";
pub const ET_VOLUME: &str = "et_acft";
pub const ET_DEPTH: &str = "et_depth_ft";
pub const LOSA_DEMAND: &str = "losa_demand_acft";
pub const STORAGE_DEVIATION: &str = "storage_deviation_acft";
pub const TRIBUTARY_CONDITION: &str = "tributary_condition";
pub const ESTUARY_NEEDS_WATER: &str = "estuary_needs_water";

/// Forcing slices resolved once per run; every slice spans the horizon.
pub(crate) struct Forcing<'a> {
    pub net_inflow: &'a [f64],
    pub rainfall: &'a [f64],
    pub et: &'a [f64],
    pub demand: Option<&'a [f64]>,
    pub storage_deviation: Option<&'a [f64]>,
    pub tributary: Option<&'a [f64]>,
    pub needs_water: Option<&'a [f64]>,
    pub low_chance: Option<&'a [f64]>,
    pub trigger: Option<&'a [f64]>,
    pub runoff: Vec<Option<&'a [f64]>>,
    pub augmentation: Vec<&'a [f64]>,
}

impl<'a> Forcing<'a> {
    pub fn resolve(inputs: &'a InputData, config: &HydroConfig) -> SimResult<Self> {
        let req = |name: &str| -> SimResult<&'a [f64]> { Ok(inputs.required(name)?.values()) };
        let opt = |name: &str| inputs.optional(name).map(|s| s.values());

        let net_inflow = req(NET_INFLOW)?;
        let rainfall = req(RAINFALL)?;
        let et = match config.et_mode {
            EtMode::Volume => req(ET_VOLUME)?,
            EtMode::Depth => req(ET_DEPTH)?,
        };

        let low_chance = match config.protocol.as_ref().map(|p| &p.low_chance) {
            Some(LowChanceLine::Series(name)) => Some(req(name)?),
            _ => None,
        };

        let uses_rule = config.mode == ReleaseMode::Optimization
            && config.structures.iter().any(|s| s.optimized);
        let trigger = match &config.optimized_rule {
            Some(rule) if uses_rule => Some(req(&rule.trigger_series)?),
            _ => None,
        };

        let runoff = config
            .structures
            .iter()
            .map(|s| s.runoff_series.as_deref().map(req).transpose())
            .collect::<SimResult<Vec<_>>>()?;
        let augmentation = config
            .augmentation
            .iter()
            .map(|a| req(&a.source_series))
            .collect::<SimResult<Vec<_>>>()?;

        Ok(Self {
            net_inflow,
            rainfall,
            et,
            demand: opt(LOSA_DEMAND),
            storage_deviation: opt(STORAGE_DEVIATION),
            tributary: opt(TRIBUTARY_CONDITION),
            needs_water: opt(ESTUARY_NEEDS_WATER),
            low_chance,
            trigger,
            runoff,
            augmentation,
        })
    }
}
