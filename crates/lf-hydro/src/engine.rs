//! Daily lake water balance.

use chrono::Datelike;
use lf_core::{Horizon, InputData, ParameterVector, SeriesSet, cfs_day_to_acft};
use lf_sim::{DailyModel, SimResult, check_physical, run_daily};
use tracing::debug;

use crate::config::{EtMode, HydroConfig, InitialCondition, ReleaseMode, Resolved};
use crate::forcing::Forcing;
use crate::protocol::ProtocolDay;
use crate::release::{ReleaseLevel, release_level, season};
use crate::schedule::{DailyLines, LineKind, Zone};

pub(crate) const LAKE_OUTPUTS: [&str; 18] = [
    "stage_ft",
    "storage_acft",
    "surface_area_acres",
    "zone_code",
    "wsm_zone",
    "release_level",
    "pulse_day",
    "net_inflow_acft",
    "rainfall_acft",
    "et_acft",
    "losa_demand_acft",
    "losa_supply_acft",
    "supply_cutback_acft",
    "demand_not_supplied_pct",
    "augmentation_cfs",
    "total_inflow_acft",
    "total_outflow_acft",
    "shortfall_acft",
];

pub(crate) const STRUCTURE_OUTPUTS: [&str; 4] =
    ["release_cfs", "ews_cfs", "backflow_cfs", "downstream_cfs"];

/// Flows through one structure on one day (cfs).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StructureDay {
    pub release: f64,
    pub ews: f64,
    pub backflow: f64,
    pub downstream: f64,
}

/// Lake state at the end of a day, with that day's fluxes.
#[derive(Clone, Debug, PartialEq)]
pub struct HydroState {
    pub stage: f64,
    pub storage: f64,
    pub area: f64,
    /// End-of-day stages of the seven days before this one, oldest first.
    pub stage_history: [f64; 7],
    pub zone: u8,
    pub wsm_zone: u8,
    pub level: ReleaseLevel,
    /// Day of the current release pulse, 0 when not pulsing.
    pub pulse_day: usize,
    pub net_inflow: f64,
    pub rainfall: f64,
    pub et: f64,
    pub demand: f64,
    pub supply: f64,
    pub cutback: f64,
    pub not_supplied_pct: f64,
    pub augmentation_cfs: f64,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub shortfall: f64,
    pub structures: Vec<StructureDay>,
}

/// Hydrology engine bound to one input set and parameter vector.
pub struct HydroModel<'a> {
    inputs: &'a InputData,
    config: &'a HydroConfig,
    resolved: Resolved,
    forcing: Forcing<'a>,
}

impl<'a> HydroModel<'a> {
    pub fn new(
        inputs: &'a InputData,
        config: &'a HydroConfig,
        params: &ParameterVector,
    ) -> SimResult<Self> {
        config.validate()?;
        let resolved = config.resolve(params)?;
        let forcing = Forcing::resolve(inputs, config)?;
        Ok(Self {
            inputs,
            config,
            resolved,
            forcing,
        })
    }

    fn structure_flows(
        &self,
        day: usize,
        prev: &HydroState,
        lines: &DailyLines,
    ) -> SimResult<(ReleaseLevel, usize, Vec<StructureDay>)> {
        let date = self.inputs.horizon().date_at(day);
        let month = date.month();
        let zone = lines.zone(prev.stage);
        let fraction = lines.fraction_of_zone(prev.stage, zone);
        let wsm_zone = lines.wsm_zone(prev.stage);
        let thc_index = self.forcing.tributary.map(|s| s[day]);
        let level = release_level(zone, self.config.tributary.classify(thc_index));
        let pulsing = matches!(zone, Zone::D1 | Zone::D2 | Zone::D3)
            && (ReleaseLevel::Level1..=ReleaseLevel::Level3).contains(&level);
        let pulse_day = match (pulsing, prev.level == level) {
            (false, _) => 0,
            (true, true) if prev.pulse_day > 0 => prev.pulse_day + 1,
            (true, _) => 1,
        };
        let stage_falling = prev.stage - prev.stage_history[0] <= 0.0;
        let optimizing = self.config.mode == ReleaseMode::Optimization;

        let flows = self
            .config
            .structures
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let capacity = self.resolved.capacities[i];
                let runoff = match self.forcing.runoff[i] {
                    Some(r) => check_physical(r[day], "basin runoff", date)?,
                    None => 0.0,
                };
                let backflow = s.backflow_cfs(prev.stage, runoff);

                let (release, ews) = match (&self.resolved.rule, self.forcing.trigger) {
                    (Some(rule), Some(trigger)) if optimizing && s.optimized => {
                        (rule.release_cfs(&s.id, month, prev.stage, trigger[day], capacity), 0.0)
                    }
                    _ => {
                        let target = s.downstream_target(
                            level,
                            zone,
                            fraction,
                            pulse_day,
                            season(month),
                            stage_falling,
                        );
                        let lake_share = (target - runoff).max(0.0);
                        let (regulatory, pre_baseflow) = if level == ReleaseLevel::Baseflow {
                            (0.0, lake_share)
                        } else {
                            (lake_share, 0.0)
                        };
                        let (baseflow, ews) = match &self.config.protocol {
                            Some(p) if p.structure == s.id => {
                                let out = p.apply(&ProtocolDay {
                                    month,
                                    stage: prev.stage,
                                    zone,
                                    wsm_zone,
                                    wsm1: lines.get(LineKind::Wsm1),
                                    thc_index,
                                    low_chance_stage: self.forcing.low_chance.map(|v| v[day]),
                                    estuary_needs_water: self
                                        .forcing
                                        .needs_water
                                        .is_some_and(|v| v[day] > 0.5),
                                    pre_baseflow_cfs: pre_baseflow,
                                    pre_regulatory_cfs: regulatory,
                                });
                                (out.baseflow_cfs, out.ews_cfs)
                            }
                            _ => (pre_baseflow, 0.0),
                        };
                        let release = (regulatory + baseflow).min(capacity);
                        (release, ews.min(capacity - release))
                    }
                };

                Ok(StructureDay {
                    release,
                    ews,
                    backflow,
                    downstream: runoff - backflow,
                })
            })
            .collect::<SimResult<Vec<_>>>()?;
        Ok((level, pulse_day, flows))
    }
}

impl DailyModel for HydroModel<'_> {
    type State = HydroState;

    fn horizon(&self) -> &Horizon {
        self.inputs.horizon()
    }

    fn initial_state(&self) -> SimResult<HydroState> {
        let date = self.inputs.horizon().start();
        let geometry = &self.config.geometry;
        let storage = match self.config.initial {
            InitialCondition::Storage(s) => s,
            InitialCondition::Stage(h) => geometry.storage_at(h),
        };
        let storage = check_physical(storage, "initial storage", date)?;
        let stage = geometry.stage_at(storage);
        let area = check_physical(geometry.area_at(stage), "surface area", date)?;
        Ok(HydroState {
            stage,
            storage,
            area,
            stage_history: [stage; 7],
            zone: 0,
            wsm_zone: 0,
            level: ReleaseLevel::None,
            pulse_day: 0,
            net_inflow: 0.0,
            rainfall: 0.0,
            et: 0.0,
            demand: 0.0,
            supply: 0.0,
            cutback: 0.0,
            not_supplied_pct: 0.0,
            augmentation_cfs: 0.0,
            total_inflow: 0.0,
            total_outflow: 0.0,
            shortfall: 0.0,
            structures: vec![StructureDay::default(); self.config.structures.len()],
        })
    }

    fn step(&self, day: usize, prev: &HydroState) -> SimResult<HydroState> {
        let horizon = self.inputs.horizon();
        let date = horizon.date_at(day);
        let f = &self.forcing;
        let lines = self.config.schedule.lines_on(date, &self.resolved.shifts);
        let zone = lines.zone(prev.stage);
        let wsm_zone = lines.wsm_zone(prev.stage);

        let (level, pulse_day, mut flows) = self.structure_flows(day, prev, &lines)?;

        let augmentation_cfs: f64 = self
            .config
            .augmentation
            .iter()
            .zip(&f.augmentation)
            .map(|(a, src)| a.inflow_cfs(prev.stage, lines.get(LineKind::Wsm1), src[day]))
            .sum();
        let backflow_cfs: f64 = flows.iter().map(|s| s.backflow).sum();

        let demand = check_physical(
            self.config
                .supply
                .demand_on(date, horizon.start(), f.demand.map(|d| d[day])),
            "water supply demand",
            date,
        )?;
        let supply = self
            .config
            .supply
            .supply(demand, wsm_zone, &self.resolved.cutbacks);

        let net_inflow = f.net_inflow[day];
        let rainfall = f.rainfall[day];
        let deviation = f.storage_deviation.map_or(0.0, |s| s[day]);
        let inflow_acft = net_inflow + rainfall + cfs_day_to_acft(backflow_cfs + augmentation_cfs);
        let available = check_physical(
            prev.storage + inflow_acft + deviation,
            "available water",
            date,
        )?;

        // Withdrawals draw on available water in order: ET, supply, releases.
        let et_demand = check_physical(
            match self.config.et_mode {
                EtMode::Volume => f.et[day],
                EtMode::Depth => f.et[day] * prev.area,
            },
            "evapotranspiration",
            date,
        )?;
        let et = et_demand.min(available);
        let mut remaining = available - et;
        let supplied = supply.supply.min(remaining);
        remaining -= supplied;

        let requested = cfs_day_to_acft(flows.iter().map(|s| s.release + s.ews).sum::<f64>());
        let factor = if requested > remaining && requested > 0.0 {
            remaining / requested
        } else {
            1.0
        };
        for s in flows.iter_mut() {
            s.release *= factor;
            s.ews *= factor;
            s.downstream += s.release + s.ews;
        }
        let released = requested * factor;
        remaining -= released;

        let storage = check_physical(remaining, "storage", date)?;
        let stage = self.config.geometry.stage_at(storage);
        let area = check_physical(self.config.geometry.area_at(stage), "surface area", date)?;

        let mut stage_history = [0.0; 7];
        stage_history[..6].copy_from_slice(&prev.stage_history[1..]);
        stage_history[6] = prev.stage;

        Ok(HydroState {
            stage,
            storage,
            area,
            stage_history,
            zone: zone.code(),
            wsm_zone,
            level,
            pulse_day,
            net_inflow,
            rainfall,
            et,
            demand: supply.demand,
            supply: supplied,
            cutback: supply.cutback,
            not_supplied_pct: supply.not_supplied_pct,
            augmentation_cfs,
            total_inflow: inflow_acft,
            total_outflow: et + supplied + released,
            shortfall: (et_demand - et) + (supply.supply - supplied) + (requested - released),
            structures: flows,
        })
    }

    fn output_names(&self) -> Vec<String> {
        self.config.output_names()
    }

    fn record(&self, s: &HydroState, out: &mut [f64]) {
        let lake = [
            s.stage,
            s.storage,
            s.area,
            f64::from(s.zone),
            f64::from(s.wsm_zone),
            f64::from(s.level.code()),
            s.pulse_day as f64,
            s.net_inflow,
            s.rainfall,
            s.et,
            s.demand,
            s.supply,
            s.cutback,
            s.not_supplied_pct,
            s.augmentation_cfs,
            s.total_inflow,
            s.total_outflow,
            s.shortfall,
        ];
        out[..lake.len()].copy_from_slice(&lake);
        for (i, d) in s.structures.iter().enumerate() {
            let base = lake.len() + i * STRUCTURE_OUTPUTS.len();
            out[base..base + STRUCTURE_OUTPUTS.len()]
                .copy_from_slice(&[d.release, d.ews, d.backflow, d.downstream]);
        }
    }
}

/// Run the hydrology engine over the input horizon.
pub fn simulate_hydrology(
    inputs: &InputData,
    config: &HydroConfig,
    params: &ParameterVector,
) -> SimResult<SeriesSet> {
    let model = HydroModel::new(inputs, config, params)?;
    let run = run_daily(&model)?;
    debug!(
        days = inputs.horizon().days(),
        final_stage = run.final_state.stage,
        "hydrology run complete"
    );
    Ok(run.series)
}
