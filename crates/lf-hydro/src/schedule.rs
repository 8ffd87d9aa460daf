//! Regulation schedule: seasonal lines that split the lake stage into zones.

use chrono::{Datelike, NaiveDate};
use lf_sim::{SimError, SimResult};

/// Length of the periodic day-of-year axis.
const YEAR_DAYS: f64 = 366.0;

/// Schedule lines, highest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineKind {
    A,
    B,
    C,
    D3,
    D2,
    D1,
    D0,
    Wsm1,
}

impl LineKind {
    pub const ALL: [LineKind; 8] = [
        LineKind::A,
        LineKind::B,
        LineKind::C,
        LineKind::D3,
        LineKind::D2,
        LineKind::D1,
        LineKind::D0,
        LineKind::Wsm1,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LineKind::A => "a",
            LineKind::B => "b",
            LineKind::C => "c",
            LineKind::D3 => "d3",
            LineKind::D2 => "d2",
            LineKind::D1 => "d1",
            LineKind::D0 => "d0",
            LineKind::Wsm1 => "wsm1",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Lake operating zone, numbered from the bottom of the schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Zone {
    WaterShortage = 1,
    BeneficialUse = 2,
    Baseflow = 3,
    D1 = 4,
    D2 = 5,
    D3 = 6,
    C = 7,
    B = 8,
    A = 9,
}

impl Zone {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_above_baseflow_band(self) -> bool {
        self.code() > Zone::Baseflow.code()
    }
}

/// Piecewise-linear periodic function of day-of-year.
#[derive(Clone, Debug)]
pub struct ScheduleLine {
    points: Vec<(u32, f64)>,
}

impl ScheduleLine {
    /// `points` are `(day_of_year, stage_ft)` with strictly increasing days in 1..=366.
    pub fn new(points: Vec<(u32, f64)>) -> SimResult<Self> {
        if points.is_empty() {
            return Err(SimError::InvalidArg {
                what: "schedule line needs at least one point",
            });
        }
        if points.iter().any(|&(d, v)| !(1..=366).contains(&d) || !v.is_finite())
            || points.windows(2).any(|w| w[1].0 <= w[0].0)
        {
            return Err(SimError::InvalidArg {
                what: "schedule line days must increase within 1..=366",
            });
        }
        Ok(Self { points })
    }

    pub fn flat(stage: f64) -> Self {
        Self {
            points: vec![(1, stage)],
        }
    }

    pub fn value_on(&self, day_of_year: u32) -> f64 {
        let d = day_of_year as f64;
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if self.points.len() == 1 {
            return first.1;
        }
        let lerp = |x0: f64, y0: f64, x1: f64, y1: f64| y0 + (y1 - y0) * (d - x0) / (x1 - x0);
        if d < first.0 as f64 {
            return lerp(last.0 as f64 - YEAR_DAYS, last.1, first.0 as f64, first.1);
        }
        if d >= last.0 as f64 {
            return lerp(last.0 as f64, last.1, first.0 as f64 + YEAR_DAYS, first.1);
        }
        for w in self.points.windows(2) {
            let ((x0, y0), (x1, y1)) = (w[0], w[1]);
            if d < x1 as f64 {
                return lerp(x0 as f64, y0, x1 as f64, y1);
            }
        }
        last.1
    }
}

/// Full schedule: the eight lines plus the water-shortage band width.
#[derive(Clone, Debug)]
pub struct RegulationSchedule {
    lines: Vec<ScheduleLine>,
    wsm_band_ft: f64,
}

impl RegulationSchedule {
    /// `lines` must be given in [`LineKind::ALL`] order and stay ordered
    /// (A highest, WSM1 lowest) on every day of the year.
    pub fn new(lines: Vec<ScheduleLine>, wsm_band_ft: f64) -> SimResult<Self> {
        if lines.len() != LineKind::ALL.len() {
            return Err(SimError::InvalidArg {
                what: "schedule needs lines a, b, c, d3, d2, d1, d0 and wsm1",
            });
        }
        if !(wsm_band_ft > 0.0) {
            return Err(SimError::InvalidArg {
                what: "water shortage band must be positive",
            });
        }
        let schedule = Self { lines, wsm_band_ft };
        for doy in 1..=366 {
            let levels: Vec<f64> = schedule.lines.iter().map(|l| l.value_on(doy)).collect();
            if levels.windows(2).any(|w| w[1] > w[0]) {
                return Err(SimError::InvalidArg {
                    what: "schedule lines must not cross",
                });
            }
        }
        Ok(schedule)
    }

    /// Line elevations on `date` after applying per-line shifts (ft).
    pub fn lines_on(&self, date: NaiveDate, shifts: &[f64; 8]) -> DailyLines {
        let doy = date.ordinal();
        let mut levels = [0.0; 8];
        for (i, line) in self.lines.iter().enumerate() {
            levels[i] = line.value_on(doy) + shifts[i];
        }
        DailyLines {
            levels,
            wsm_band_ft: self.wsm_band_ft,
        }
    }
}

/// Schedule line elevations for one day.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DailyLines {
    levels: [f64; 8],
    wsm_band_ft: f64,
}

impl DailyLines {
    pub fn get(&self, line: LineKind) -> f64 {
        self.levels[line.index()]
    }

    pub fn zone(&self, stage: f64) -> Zone {
        use LineKind as L;
        let zones = [
            (L::A, Zone::A),
            (L::B, Zone::B),
            (L::C, Zone::C),
            (L::D3, Zone::D3),
            (L::D2, Zone::D2),
            (L::D1, Zone::D1),
            (L::D0, Zone::Baseflow),
            (L::Wsm1, Zone::BeneficialUse),
        ];
        zones
            .into_iter()
            .find(|&(line, _)| stage >= self.get(line))
            .map_or(Zone::WaterShortage, |(_, zone)| zone)
    }

    fn zone_bounds(&self, zone: Zone) -> (f64, Option<f64>) {
        use LineKind as L;
        let wsm1 = self.get(L::Wsm1);
        match zone {
            Zone::A => (self.get(L::A), None),
            Zone::B => (self.get(L::B), Some(self.get(L::A))),
            Zone::C => (self.get(L::C), Some(self.get(L::B))),
            Zone::D3 => (self.get(L::D3), Some(self.get(L::C))),
            Zone::D2 => (self.get(L::D2), Some(self.get(L::D3))),
            Zone::D1 => (self.get(L::D1), Some(self.get(L::D2))),
            Zone::Baseflow => (self.get(L::D0), Some(self.get(L::D1))),
            Zone::BeneficialUse => (wsm1, Some(self.get(L::D0))),
            Zone::WaterShortage => (wsm1 - 4.0 * self.wsm_band_ft, Some(wsm1)),
        }
    }

    /// Position of `stage` inside its zone: 0 at the bottom line, 1 at the top.
    pub fn fraction_of_zone(&self, stage: f64, zone: Zone) -> f64 {
        match self.zone_bounds(zone) {
            (_, None) => 1.0,
            (bottom, Some(top)) if top > bottom => ((stage - bottom) / (top - bottom)).clamp(0.0, 1.0),
            _ => 1.0,
        }
    }

    /// Water shortage management zone: 0 above WSM1, then 1..=4 per band below it.
    pub fn wsm_zone(&self, stage: f64) -> u8 {
        let wsm1 = self.get(LineKind::Wsm1);
        if stage >= wsm1 {
            return 0;
        }
        let bands = ((wsm1 - stage) / self.wsm_band_ft).ceil();
        bands.clamp(1.0, 4.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_schedule() -> RegulationSchedule {
        let levels = [17.0, 16.0, 15.5, 15.0, 14.5, 14.0, 13.0, 11.0];
        RegulationSchedule::new(levels.iter().map(|&v| ScheduleLine::flat(v)).collect(), 1.0)
            .unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()
    }

    #[test]
    fn zones_by_stage() {
        let lines = flat_schedule().lines_on(day(), &[0.0; 8]);
        assert_eq!(lines.zone(18.0), Zone::A);
        assert_eq!(lines.zone(16.2), Zone::B);
        assert_eq!(lines.zone(14.2), Zone::D1);
        assert_eq!(lines.zone(13.5), Zone::Baseflow);
        assert_eq!(lines.zone(12.0), Zone::BeneficialUse);
        assert_eq!(lines.zone(10.0), Zone::WaterShortage);
        assert_eq!(Zone::D1.code(), 4);
    }

    #[test]
    fn wsm_zone_bands() {
        let lines = flat_schedule().lines_on(day(), &[0.0; 8]);
        assert_eq!(lines.wsm_zone(11.5), 0);
        assert_eq!(lines.wsm_zone(10.5), 1);
        assert_eq!(lines.wsm_zone(9.5), 2);
        assert_eq!(lines.wsm_zone(2.0), 4);
    }

    #[test]
    fn fraction_inside_band() {
        let lines = flat_schedule().lines_on(day(), &[0.0; 8]);
        assert!((lines.fraction_of_zone(14.25, Zone::D1) - 0.5).abs() < 1e-12);
        assert_eq!(lines.fraction_of_zone(20.0, Zone::A), 1.0);
    }

    #[test]
    fn shift_moves_line() {
        let mut shifts = [0.0; 8];
        shifts[LineKind::D0 as usize] = 0.75;
        let lines = flat_schedule().lines_on(day(), &shifts);
        assert_eq!(lines.zone(13.5), Zone::BeneficialUse);
    }

    #[test]
    fn periodic_line_wraps_year_end() {
        let line = ScheduleLine::new(vec![(100, 10.0), (200, 20.0)]).unwrap();
        assert_eq!(line.value_on(150), 15.0);
        // from day 200 back to day 100 + 366
        let at_end = line.value_on(366);
        assert!(at_end > 10.0 && at_end < 20.0);
        assert!((line.value_on(1) - line.value_on(366)).abs() < 0.1);
    }

    #[test]
    fn crossing_lines_rejected() {
        let mut lines: Vec<ScheduleLine> = [17.0, 16.0, 15.5, 15.0, 14.5, 14.0, 13.0, 11.0]
            .iter()
            .map(|&v| ScheduleLine::flat(v))
            .collect();
        lines[7] = ScheduleLine::flat(13.5);
        assert!(RegulationSchedule::new(lines, 1.0).is_err());
    }
}
