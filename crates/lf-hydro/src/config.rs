//! Engine configuration and parameter resolution.

use std::collections::BTreeSet;

use lf_core::ParameterVector;
use lf_sim::{SimError, SimResult};

use crate::geometry::LakeGeometry;
use crate::optimized::OptimizedRule;
use crate::protocol::AdaptiveProtocol;
use crate::schedule::{LineKind, RegulationSchedule};
use crate::structure::{Augmentation, Structure};
use crate::supply::WaterSupply;
use crate::tributary::TributaryClassifier;

/// Which rule operates structures flagged `optimized`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReleaseMode {
    #[default]
    Scenario,
    Optimization,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EtMode {
    /// `et_acft` forcing, volume per day.
    #[default]
    Volume,
    /// `et_depth_ft` forcing times surface area.
    Depth,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InitialCondition {
    Stage(f64),
    Storage(f64),
}

#[derive(Clone, Debug)]
pub struct HydroConfig {
    pub geometry: LakeGeometry,
    pub initial: InitialCondition,
    pub schedule: RegulationSchedule,
    pub supply: WaterSupply,
    pub tributary: TributaryClassifier,
    pub structures: Vec<Structure>,
    pub protocol: Option<AdaptiveProtocol>,
    pub optimized_rule: Option<OptimizedRule>,
    pub augmentation: Vec<Augmentation>,
    pub et_mode: EtMode,
    pub mode: ReleaseMode,
}

pub(crate) const MONTHS: [&str; 12] = [
    "m01", "m02", "m03", "m04", "m05", "m06", "m07", "m08", "m09", "m10", "m11", "m12",
];

/// Configuration after applying a parameter vector.
#[derive(Clone, Debug)]
pub(crate) struct Resolved {
    pub shifts: [f64; 8],
    pub cutbacks: [f64; 4],
    pub capacities: Vec<f64>,
    pub rule: Option<OptimizedRule>,
}

impl HydroConfig {
    pub fn validate(&self) -> SimResult<()> {
        let mut ids = BTreeSet::new();
        for s in &self.structures {
            s.validate()?;
            if !ids.insert(s.id.as_str()) {
                return Err(SimError::InvalidArg {
                    what: "structure ids must be unique",
                });
            }
        }
        if let Some(p) = &self.protocol {
            if !ids.contains(p.structure.as_str()) {
                return Err(SimError::InvalidArg {
                    what: "adaptive protocol refers to an unknown structure",
                });
            }
        }
        if let Some(rule) = &self.optimized_rule {
            rule.validate()?;
            if rule.monthly_cfs.keys().any(|k| !ids.contains(k.as_str())) {
                return Err(SimError::InvalidArg {
                    what: "optimization rule refers to an unknown structure",
                });
            }
        }
        let (InitialCondition::Storage(v) | InitialCondition::Stage(v)) = self.initial;
        if !v.is_finite() {
            return Err(SimError::InvalidArg {
                what: "initial lake condition must be finite",
            });
        }
        Ok(())
    }

    /// Every parameter name this engine reads.
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for line in LineKind::ALL {
            names.push(format!("schedule.{}.shift_ft", line.name()));
        }
        for z in 1..=4 {
            names.push(format!("supply.cutback_z{z}"));
        }
        for s in &self.structures {
            names.push(format!("structure.{}.capacity_cfs", s.id));
        }
        if let Some(rule) = &self.optimized_rule {
            names.push("release.p1".into());
            names.push("release.p2".into());
            for id in rule.monthly_cfs.keys() {
                for m in MONTHS {
                    names.push(format!("release.{id}.{m}"));
                }
            }
        }
        names
    }

    pub fn is_known_parameter(&self, name: &str) -> bool {
        self.parameter_names().iter().any(|n| n == name)
    }

    pub(crate) fn resolve(&self, params: &ParameterVector) -> SimResult<Resolved> {
        let mut shifts = [0.0; 8];
        for (i, line) in LineKind::ALL.iter().enumerate() {
            shifts[i] = params.get_or(&format!("schedule.{}.shift_ft", line.name()), 0.0);
        }

        let mut cutbacks = self.supply.cutbacks_pct;
        for (i, c) in cutbacks.iter_mut().enumerate() {
            *c = params.get_or(&format!("supply.cutback_z{}", i + 1), *c);
        }

        let capacities: Vec<f64> = self
            .structures
            .iter()
            .map(|s| params.get_or(&format!("structure.{}.capacity_cfs", s.id), s.capacity_cfs))
            .collect();

        let rule = self.optimized_rule.as_ref().map(|base| {
            let mut rule = base.clone();
            rule.p1 = params.get_or("release.p1", rule.p1);
            rule.p2 = params.get_or("release.p2", rule.p2);
            for (id, months) in rule.monthly_cfs.iter_mut() {
                for (m, v) in MONTHS.iter().zip(months.iter_mut()) {
                    *v = params.get_or(&format!("release.{id}.{m}"), *v);
                }
            }
            rule
        });

        if shifts.iter().any(|s| !s.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "schedule shifts must be finite",
            });
        }
        if cutbacks.iter().any(|c| !(0.0..=100.0).contains(c)) {
            return Err(SimError::InvalidArg {
                what: "supply cutbacks must be percentages",
            });
        }
        if capacities.iter().any(|c| !(*c >= 0.0)) {
            return Err(SimError::InvalidArg {
                what: "structure capacities must be non-negative",
            });
        }
        if let Some(rule) = &rule {
            rule.validate()?;
        }

        Ok(Resolved {
            shifts,
            cutbacks,
            capacities,
            rule,
        })
    }

    /// Names of the series the engine records, in output order.
    pub fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = crate::engine::LAKE_OUTPUTS
            .iter()
            .map(|s| s.to_string())
            .collect();
        for s in &self.structures {
            for suffix in crate::engine::STRUCTURE_OUTPUTS {
                names.push(format!("{}_{}", s.id, suffix));
            }
        }
        names
    }
}
