//! Adaptive protocol for estuary environmental water supply.
//!
//! Each day a chain of yes/no conditions decides whether the protocol
//! structure keeps its scheduled baseflow and whether an environmental water
//! supply (EWS) release is made on top of it.

use crate::schedule::Zone;

/// Stage the lake must exceed for the "low chance" check to pass.
#[derive(Clone, Debug, PartialEq)]
pub enum LowChanceLine {
    /// WSM1 during Jun-Sep, WSM1 + 0.5 ft otherwise.
    Wsm1Offset,
    /// Check always passes.
    Disabled,
    /// Stage from a forcing series; passes during Jun-Sep.
    Series(String),
}

/// What the protocol targets as EWS when the lake is in a shortage band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EwsMode {
    /// No EWS inside shortage bands, and none unless stage is above them.
    Off,
    /// Configured EWS target, cut back per shortage band.
    Target,
    /// Fixed 300 cfs, cut back per shortage band.
    Fixed300,
}

#[derive(Clone, Debug)]
pub struct AdaptiveProtocol {
    pub structure: String,
    pub thc_threshold: f64,
    pub low_chance: LowChanceLine,
    pub late_dry_season_only: bool,
    pub no_protocol_above_baseflow_band: bool,
    pub ews_mode: EwsMode,
    pub thc_bypass_late_dry_season: bool,
    pub ews_cfs: f64,
    pub baseflow_cap_cfs: f64,
    pub cutbacks_pct: [f64; 4],
}

/// Inputs for one day, all taken from the previous day's lake state.
#[derive(Clone, Copy, Debug)]
pub struct ProtocolDay {
    pub month: u32,
    pub stage: f64,
    pub zone: Zone,
    pub wsm_zone: u8,
    pub wsm1: f64,
    pub thc_index: Option<f64>,
    pub low_chance_stage: Option<f64>,
    pub estuary_needs_water: bool,
    pub pre_baseflow_cfs: f64,
    pub pre_regulatory_cfs: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProtocolOutcome {
    pub baseflow_cfs: f64,
    pub ews_cfs: f64,
}

fn is_late_dry_season(month: u32) -> bool {
    matches!(month, 4 | 5)
}

fn is_wet_season(month: u32) -> bool {
    (6..=9).contains(&month)
}

impl AdaptiveProtocol {
    fn low_chance_passes(&self, day: &ProtocolDay) -> bool {
        let line = match &self.low_chance {
            LowChanceLine::Wsm1Offset if is_wet_season(day.month) => day.wsm1,
            LowChanceLine::Wsm1Offset => day.wsm1 + 0.5,
            LowChanceLine::Disabled => return true,
            LowChanceLine::Series(_) if is_wet_season(day.month) => return true,
            LowChanceLine::Series(_) => match day.low_chance_stage {
                Some(stage) => stage,
                None => return true,
            },
        };
        day.stage > line
    }

    pub fn apply(&self, day: &ProtocolDay) -> ProtocolOutcome {
        let late_dry = is_late_dry_season(day.month);
        let thc_ok = day.thc_index.is_some_and(|v| v > self.thc_threshold);
        let low_chance = self.low_chance_passes(day);
        let season_ok = if self.late_dry_season_only {
            late_dry && low_chance
        } else {
            low_chance
        };

        // baseflow
        let baseflow_suggested = day.pre_baseflow_cfs > 0.0 && day.estuary_needs_water;
        let all_four = baseflow_suggested && season_ok;
        let above_band = day.zone.is_above_baseflow_band();
        let keep_full = if self.no_protocol_above_baseflow_band {
            matches!(day.zone, Zone::D1 | Zone::D2 | Zone::D3) && day.pre_baseflow_cfs > 0.0
        } else {
            all_four && above_band
        };
        let baseflow_cfs = if keep_full {
            day.pre_baseflow_cfs
        } else if all_four && !above_band {
            day.pre_baseflow_cfs.min(self.baseflow_cap_cfs)
        } else {
            0.0
        };

        // environmental water supply
        let nothing_scheduled = day.pre_regulatory_cfs + day.pre_baseflow_cfs == 0.0;
        let eligible = match self.ews_mode {
            EwsMode::Off => nothing_scheduled && day.zone > Zone::WaterShortage,
            EwsMode::Target | EwsMode::Fixed300 => nothing_scheduled,
        };
        let conditions = season_ok && day.estuary_needs_water && eligible;
        let release = if self.thc_bypass_late_dry_season {
            conditions && (thc_ok || late_dry)
        } else {
            conditions && thc_ok
        };
        let ews_cfs = if !release {
            0.0
        } else if day.wsm_zone == 0 {
            self.ews_cfs
        } else {
            let cut = self.cutbacks_pct[(day.wsm_zone.clamp(1, 4) - 1) as usize] / 100.0;
            let target = match self.ews_mode {
                EwsMode::Off => 0.0,
                EwsMode::Target => self.ews_cfs,
                EwsMode::Fixed300 => 300.0,
            };
            (1.0 - cut) * target
        };

        ProtocolOutcome {
            baseflow_cfs,
            ews_cfs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol() -> AdaptiveProtocol {
        AdaptiveProtocol {
            structure: "west".into(),
            thc_threshold: 0.0,
            low_chance: LowChanceLine::Wsm1Offset,
            late_dry_season_only: false,
            no_protocol_above_baseflow_band: false,
            ews_mode: EwsMode::Target,
            thc_bypass_late_dry_season: false,
            ews_cfs: 650.0,
            baseflow_cap_cfs: 450.0,
            cutbacks_pct: [15.0, 30.0, 45.0, 60.0],
        }
    }

    fn day() -> ProtocolDay {
        ProtocolDay {
            month: 2,
            stage: 13.0,
            zone: Zone::Baseflow,
            wsm_zone: 0,
            wsm1: 11.0,
            thc_index: Some(1.0),
            low_chance_stage: None,
            estuary_needs_water: true,
            pre_baseflow_cfs: 0.0,
            pre_regulatory_cfs: 0.0,
        }
    }

    #[test]
    fn ews_when_nothing_scheduled() {
        let out = protocol().apply(&day());
        assert_eq!(out.ews_cfs, 650.0);
        assert_eq!(out.baseflow_cfs, 0.0);
    }

    #[test]
    fn ews_cut_back_in_shortage() {
        let p = AdaptiveProtocol {
            low_chance: LowChanceLine::Disabled,
            ..protocol()
        };
        let d = ProtocolDay {
            stage: 9.5,
            wsm_zone: 2,
            zone: Zone::WaterShortage,
            ..day()
        };
        let out = p.apply(&d);
        assert!((out.ews_cfs - 0.7 * 650.0).abs() < 1e-9);

        let off = AdaptiveProtocol {
            ews_mode: EwsMode::Off,
            ..p
        };
        assert_eq!(off.apply(&d).ews_cfs, 0.0);
    }

    #[test]
    fn low_chance_blocks_ews() {
        let d = ProtocolDay {
            stage: 11.2,
            zone: Zone::BeneficialUse,
            ..day()
        };
        // Feb: line is WSM1 + 0.5
        assert_eq!(protocol().apply(&d).ews_cfs, 0.0);
        let summer = ProtocolDay { month: 7, ..d };
        assert_eq!(protocol().apply(&summer).ews_cfs, 650.0);
    }

    #[test]
    fn dry_tributaries_need_late_dry_season_bypass() {
        let d = ProtocolDay {
            month: 4,
            thc_index: Some(-2.0),
            ..day()
        };
        assert_eq!(protocol().apply(&d).ews_cfs, 0.0);
        let bypass = AdaptiveProtocol {
            thc_bypass_late_dry_season: true,
            ..protocol()
        };
        assert_eq!(bypass.apply(&d).ews_cfs, 650.0);
    }

    #[test]
    fn baseflow_capped_inside_band() {
        let d = ProtocolDay {
            pre_baseflow_cfs: 800.0,
            ..day()
        };
        let out = protocol().apply(&d);
        assert_eq!(out.baseflow_cfs, 450.0);
        // baseflow already scheduled, so no EWS on top
        assert_eq!(out.ews_cfs, 0.0);

        let above = ProtocolDay {
            zone: Zone::D2,
            ..d
        };
        assert_eq!(protocol().apply(&above).baseflow_cfs, 800.0);

        let dry_estuary = ProtocolDay {
            estuary_needs_water: false,
            ..d
        };
        assert_eq!(protocol().apply(&dry_estuary).baseflow_cfs, 0.0);
    }
}
