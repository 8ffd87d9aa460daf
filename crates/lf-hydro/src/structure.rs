//! Outlet structures and water supply augmentation sources.

use lf_sim::{SimError, SimResult};

use crate::release::ReleaseLevel;
use crate::schedule::Zone;

/// Downstream target flow (cfs) for each release level.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LevelRates {
    pub baseflow: f64,
    pub level1: f64,
    pub level2: f64,
    pub level3: f64,
    pub maximum: f64,
}

impl LevelRates {
    pub fn rate(&self, level: ReleaseLevel) -> f64 {
        match level {
            ReleaseLevel::None => 0.0,
            ReleaseLevel::Baseflow => self.baseflow,
            ReleaseLevel::Level1 => self.level1,
            ReleaseLevel::Level2 => self.level2,
            ReleaseLevel::Level3 => self.level3,
            ReleaseLevel::Maximum => self.maximum,
        }
    }

    fn all(&self) -> [f64; 5] {
        [
            self.baseflow,
            self.level1,
            self.level2,
            self.level3,
            self.maximum,
        ]
    }
}

/// Flow from the structure's basin back into the lake at low stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackflowRule {
    pub stage_below_ft: f64,
    /// Share of basin runoff that drains to the lake.
    pub fraction: f64,
    pub max_cfs: f64,
}

/// Day-by-day shape of a release pulse at levels 1 to 3.
///
/// Each pattern is divided by its own mean, so a whole pulse releases the
/// level rate on average. Patterns repeat while the lake stays at one level.
#[derive(Clone, Debug, PartialEq)]
pub struct PulsePattern {
    pub level1: Vec<f64>,
    pub level2: Vec<f64>,
    pub level3: Vec<f64>,
}

impl PulsePattern {
    fn pattern(&self, level: ReleaseLevel) -> Option<&[f64]> {
        match level {
            ReleaseLevel::Level1 => Some(&self.level1),
            ReleaseLevel::Level2 => Some(&self.level2),
            ReleaseLevel::Level3 => Some(&self.level3),
            _ => None,
        }
    }

    fn validate(&self) -> SimResult<()> {
        for p in [&self.level1, &self.level2, &self.level3] {
            if p.is_empty() || p.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(SimError::InvalidArg {
                    what: "pulse patterns need non-negative values",
                });
            }
            if p.iter().sum::<f64>() <= 0.0 {
                return Err(SimError::InvalidArg {
                    what: "pulse patterns must release something",
                });
            }
        }
        Ok(())
    }

    /// Factor on the level rate for day `pulse_day` (1-based) of a pulse.
    pub fn multiplier(&self, level: ReleaseLevel, pulse_day: usize) -> f64 {
        match self.pattern(level) {
            Some(p) if pulse_day > 0 => {
                let mean = p.iter().sum::<f64>() / p.len() as f64;
                p[(pulse_day - 1) % p.len()] / mean
            }
            _ => 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Structure {
    pub id: String,
    /// Forcing series with local basin runoff (cfs) joining below the lake.
    pub runoff_series: Option<String>,
    pub rates: LevelRates,
    pub capacity_cfs: f64,
    /// Applied to the target when the 7-day stage trend is not rising, per season.
    pub falling_stage_multiplier: [f64; 4],
    pub backflow: Option<BackflowRule>,
    /// Pulsed releases in the D bands instead of the fraction-of-zone ramp.
    pub pulses: Option<PulsePattern>,
    /// Operated by the optimization release rule in optimization runs.
    pub optimized: bool,
}

impl Structure {
    pub fn validate(&self) -> SimResult<()> {
        if self.id.is_empty() {
            return Err(SimError::InvalidArg {
                what: "structure id must not be empty",
            });
        }
        if self.rates.all().iter().any(|r| !r.is_finite() || *r < 0.0)
            || !(self.capacity_cfs >= 0.0)
        {
            return Err(SimError::InvalidArg {
                what: "structure rates and capacity must be non-negative",
            });
        }
        if self.falling_stage_multiplier.iter().any(|m| *m < 0.0) {
            return Err(SimError::InvalidArg {
                what: "falling stage multipliers must be non-negative",
            });
        }
        if let Some(bk) = &self.backflow {
            if !(0.0..=1.0).contains(&bk.fraction) || bk.max_cfs < 0.0 {
                return Err(SimError::InvalidArg {
                    what: "backflow fraction must be in [0, 1] with non-negative cap",
                });
            }
        }
        if let Some(p) = &self.pulses {
            p.validate()?;
        }
        Ok(())
    }

    /// Target flow below the structure before subtracting basin runoff.
    ///
    /// Inside the D bands levels 1 to 3 follow the pulse pattern on
    /// `pulse_day` when the structure has one. Otherwise the rate ramps from
    /// the next lower level's rate at the bottom of the band to the full
    /// level rate at its top.
    pub fn downstream_target(
        &self,
        level: ReleaseLevel,
        zone: Zone,
        fraction: f64,
        pulse_day: usize,
        season: usize,
        stage_falling: bool,
    ) -> f64 {
        let full = self.rates.rate(level);
        let in_d_band = matches!(zone, Zone::D1 | Zone::D2 | Zone::D3);
        let shaped = if in_d_band && level >= ReleaseLevel::Level1 && level <= ReleaseLevel::Level3 {
            match &self.pulses {
                Some(p) => full * p.multiplier(level, pulse_day),
                None => {
                    let lower = self.rates.rate(level.lower());
                    lower + (full - lower) * fraction
                }
            }
        } else {
            full
        };
        if stage_falling {
            shaped * self.falling_stage_multiplier[season - 1]
        } else {
            shaped
        }
    }

    pub fn backflow_cfs(&self, stage: f64, runoff: f64) -> f64 {
        match &self.backflow {
            Some(bk) if stage < bk.stage_below_ft => (runoff.max(0.0) * bk.fraction).min(bk.max_cfs),
            _ => 0.0,
        }
    }
}

/// Extra inflow pumped into the lake when stage drops near the shortage line.
#[derive(Clone, Debug)]
pub struct Augmentation {
    pub id: String,
    /// Forcing series with the water available to pump (cfs).
    pub source_series: String,
    /// Pumping starts below WSM1 plus this offset (ft).
    pub trigger_offset_ft: f64,
    pub cap_cfs: f64,
}

impl Augmentation {
    pub fn inflow_cfs(&self, stage: f64, wsm1: f64, available_cfs: f64) -> f64 {
        if stage < wsm1 + self.trigger_offset_ft {
            available_cfs.max(0.0).min(self.cap_cfs)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outlet() -> Structure {
        Structure {
            id: "east".into(),
            runoff_series: Some("east_runoff_cfs".into()),
            rates: LevelRates {
                baseflow: 200.0,
                level1: 1000.0,
                level2: 2000.0,
                level3: 3000.0,
                maximum: 6000.0,
            },
            capacity_cfs: 7000.0,
            falling_stage_multiplier: [0.5, 1.0, 1.0, 1.0],
            backflow: Some(BackflowRule {
                stage_below_ft: 12.0,
                fraction: 0.5,
                max_cfs: 300.0,
            }),
            pulses: None,
            optimized: false,
        }
    }

    #[test]
    fn target_ramps_in_d_band() {
        let s = outlet();
        let t = s.downstream_target(ReleaseLevel::Level2, Zone::D2, 0.5, 0, 2, false);
        assert!((t - 1500.0).abs() < 1e-12);
        let full = s.downstream_target(ReleaseLevel::Level3, Zone::B, 0.1, 0, 2, false);
        assert_eq!(full, 3000.0);
    }

    #[test]
    fn pulse_pattern_replaces_ramp() {
        let mut s = outlet();
        s.pulses = Some(PulsePattern {
            level1: vec![2.0, 1.0, 1.0, 0.0],
            level2: vec![1.0],
            level3: vec![3.0, 1.0],
        });
        // mean of the level 1 pattern is 1.0
        let day = |d| s.downstream_target(ReleaseLevel::Level1, Zone::D1, 0.2, d, 2, false);
        assert_eq!(day(1), 2000.0);
        assert_eq!(day(2), 1000.0);
        assert_eq!(day(4), 0.0);
        assert_eq!(day(5), 2000.0);
        assert_eq!(
            s.downstream_target(ReleaseLevel::Level3, Zone::D3, 0.0, 1, 2, false),
            4500.0
        );
        // outside the D bands the level rate is used as is
        assert_eq!(
            s.downstream_target(ReleaseLevel::Level3, Zone::C, 0.0, 1, 2, false),
            3000.0
        );
    }

    #[test]
    fn falling_stage_multiplier_by_season() {
        let s = outlet();
        assert_eq!(
            s.downstream_target(ReleaseLevel::Maximum, Zone::A, 1.0, 0, 1, true),
            3000.0
        );
        assert_eq!(
            s.downstream_target(ReleaseLevel::Maximum, Zone::A, 1.0, 0, 3, true),
            6000.0
        );
    }

    #[test]
    fn backflow_only_at_low_stage() {
        let s = outlet();
        assert_eq!(s.backflow_cfs(13.0, 400.0), 0.0);
        assert_eq!(s.backflow_cfs(11.0, 400.0), 200.0);
        assert_eq!(s.backflow_cfs(11.0, 1000.0), 300.0);
    }

    #[test]
    fn augmentation_trigger() {
        let a = Augmentation {
            id: "pump".into(),
            source_series: "pump_cfs".into(),
            trigger_offset_ft: 0.5,
            cap_cfs: 100.0,
        };
        assert_eq!(a.inflow_cfs(11.4, 11.0, 250.0), 100.0);
        assert_eq!(a.inflow_cfs(11.6, 11.0, 250.0), 0.0);
    }

    #[test]
    fn validation() {
        let mut s = outlet();
        assert!(s.validate().is_ok());
        s.capacity_cfs = -1.0;
        assert!(s.validate().is_err());

        let mut s = outlet();
        s.pulses = Some(PulsePattern {
            level1: vec![0.0, 0.0],
            level2: vec![1.0],
            level3: vec![1.0],
        });
        assert!(s.validate().is_err());
    }
}
