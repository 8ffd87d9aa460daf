//! Lake water supply demand and shortage cutbacks.

use chrono::{Datelike, NaiveDate};
use lf_sim::{SimError, SimResult};

#[derive(Clone, Debug)]
pub enum DemandSource {
    /// Daily demand read from the `losa_demand_acft` forcing series.
    Series,
    /// 52 weekly volumes (acft/week) scaled by a percentage.
    Weekly {
        weekly_acft: Vec<f64>,
        multiplier_pct: f64,
    },
}

#[derive(Clone, Debug)]
pub struct WaterSupply {
    pub demand: DemandSource,
    /// Percent of demand withheld in water shortage zones 1..=4.
    pub cutbacks_pct: [f64; 4],
}

/// Supply decision for one day (acft).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SupplyOutcome {
    pub demand: f64,
    pub supply: f64,
    pub cutback: f64,
    pub not_supplied_pct: f64,
}

impl WaterSupply {
    pub fn new(demand: DemandSource, cutbacks_pct: [f64; 4]) -> SimResult<Self> {
        if let DemandSource::Weekly {
            weekly_acft,
            multiplier_pct,
        } = &demand
        {
            if weekly_acft.len() != 52 {
                return Err(SimError::InvalidArg {
                    what: "weekly demand needs 52 values",
                });
            }
            if weekly_acft.iter().any(|w| !(w.is_finite() && *w >= 0.0))
                || !(multiplier_pct.is_finite() && *multiplier_pct >= 0.0)
            {
                return Err(SimError::InvalidArg {
                    what: "weekly demand and its multiplier must be non-negative",
                });
            }
        }
        if cutbacks_pct.iter().any(|c| !(0.0..=100.0).contains(c)) {
            return Err(SimError::InvalidArg {
                what: "supply cutbacks must be percentages",
            });
        }
        Ok(Self {
            demand,
            cutbacks_pct,
        })
    }

    /// No demand at all.
    pub fn none() -> Self {
        Self {
            demand: DemandSource::Series,
            cutbacks_pct: [0.0; 4],
        }
    }

    /// Demand on `date`. `series_value` is the forcing value when present.
    pub fn demand_on(&self, date: NaiveDate, start: NaiveDate, series_value: Option<f64>) -> f64 {
        match &self.demand {
            DemandSource::Series => series_value.unwrap_or(0.0),
            DemandSource::Weekly {
                weekly_acft,
                multiplier_pct,
            } => {
                let week = week_of_run_year(date, start);
                weekly_acft[week - 1] / 7.0 * multiplier_pct / 100.0
            }
        }
    }

    pub fn supply(&self, demand: f64, wsm_zone: u8, cutbacks_pct: &[f64; 4]) -> SupplyOutcome {
        let cut = match wsm_zone {
            1..=4 => cutbacks_pct[wsm_zone as usize - 1],
            _ => 0.0,
        };
        let supply = demand * (1.0 - cut / 100.0);
        let cutback = demand - supply;
        SupplyOutcome {
            demand,
            supply,
            cutback,
            not_supplied_pct: if demand > 0.0 {
                cutback / demand * 100.0
            } else {
                0.0
            },
        }
    }
}

fn anniversary(year: i32, start: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, start.month(), start.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, start.month(), start.day() - 1))
        .unwrap_or(start)
}

/// Week number (1..=52) counted from the latest anniversary of `start`.
pub fn week_of_run_year(date: NaiveDate, start: NaiveDate) -> usize {
    let mut anniv = anniversary(date.year(), start);
    if anniv > date {
        anniv = anniversary(date.year() - 1, start);
    }
    let count = (date - anniv).num_days();
    if count > 363 {
        52
    } else {
        (count / 7 + 1) as usize
    }
}
