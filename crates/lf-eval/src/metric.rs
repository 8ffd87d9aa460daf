//! Scalar reductions over run series.

use lf_core::CompletedRun;

use crate::error::{EvalError, EvalResult};

#[derive(Clone, Debug, PartialEq)]
pub enum Reduction {
    Mean,
    Sum,
    Max,
    Min,
    /// Number of days strictly above the threshold.
    DaysAbove(f64),
    /// Number of days strictly below the threshold.
    DaysBelow(f64),
    /// Days above the threshold per simulated year (365.25 days).
    AnnualDaysAbove(f64),
    AnnualDaysBelow(f64),
}

/// Reduction over one series, or over the day-by-day sum of several.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    pub series: Vec<String>,
    pub reduction: Reduction,
    pub scale: f64,
}

impl Metric {
    pub fn new(series: impl Into<String>, reduction: Reduction) -> Self {
        Self {
            series: vec![series.into()],
            reduction,
            scale: 1.0,
        }
    }

    pub fn sum_of(series: &[&str], reduction: Reduction) -> Self {
        Self {
            series: series.iter().map(|s| s.to_string()).collect(),
            reduction,
            scale: 1.0,
        }
    }

    pub fn scaled(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Daily values the reduction runs over.
    fn values(&self, run: &CompletedRun) -> EvalResult<Vec<f64>> {
        let Some((first, rest)) = self.series.split_first() else {
            return Err(EvalError::InvalidMetric {
                what: "metric names no series",
            });
        };
        let mut acc = run.series(first)?.values().to_vec();
        for name in rest {
            let s = run.series(name)?;
            if s.len() != acc.len() {
                return Err(EvalError::LengthMismatch {
                    a: first.clone(),
                    b: name.clone(),
                });
            }
            for (a, v) in acc.iter_mut().zip(s.values()) {
                *a += v;
            }
        }
        if acc.is_empty() {
            return Err(EvalError::EmptySeries {
                name: first.clone(),
            });
        }
        Ok(acc)
    }

    pub fn compute(&self, run: &CompletedRun) -> EvalResult<f64> {
        let values = self.values(run)?;
        let n = values.len() as f64;
        let years = n / 365.25;
        let count = |pred: &dyn Fn(f64) -> bool| values.iter().filter(|&&v| pred(v)).count() as f64;
        let raw = match self.reduction {
            Reduction::Mean => values.iter().sum::<f64>() / n,
            Reduction::Sum => values.iter().sum(),
            Reduction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reduction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reduction::DaysAbove(t) => count(&|v| v > t),
            Reduction::DaysBelow(t) => count(&|v| v < t),
            Reduction::AnnualDaysAbove(t) => count(&|v| v > t) / years,
            Reduction::AnnualDaysBelow(t) => count(&|v| v < t) / years,
        };
        Ok(raw * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::{NaiveDate, ParameterVector, SeriesSet, TimeSeries};

    fn run() -> CompletedRun {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut hydrology = SeriesSet::new();
        hydrology
            .insert("stage_ft", TimeSeries::new(start, vec![12.0, 15.0, 17.5, 16.0]))
            .unwrap();
        hydrology
            .insert("east_release_cfs", TimeSeries::new(start, vec![0.0, 100.0, 200.0, 300.0]))
            .unwrap();
        let mut nutrient = SeriesSet::new();
        nutrient
            .insert("east_tp_load_kg", TimeSeries::new(start, vec![1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        CompletedRun {
            params: ParameterVector::new(),
            hydrology,
            nutrient: Some(nutrient),
        }
    }

    #[test]
    fn basic_reductions() {
        let r = run();
        let m = |red| Metric::new("stage_ft", red).compute(&r).unwrap();
        assert_eq!(m(Reduction::Mean), 15.125);
        assert_eq!(m(Reduction::Max), 17.5);
        assert_eq!(m(Reduction::Min), 12.0);
        assert_eq!(m(Reduction::DaysAbove(15.5)), 2.0);
        assert_eq!(m(Reduction::DaysBelow(15.0)), 1.0);
        let annual = m(Reduction::AnnualDaysAbove(15.5));
        assert!((annual - 2.0 * 365.25 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn sum_of_across_engines() {
        let r = run();
        let m = Metric::sum_of(&["east_release_cfs", "east_tp_load_kg"], Reduction::Sum).scaled(0.5);
        assert_eq!(m.compute(&r).unwrap(), 305.0);
    }

    #[test]
    fn missing_series() {
        let r = run();
        assert_eq!(
            Metric::new("west_release_cfs", Reduction::Sum).compute(&r),
            Err(EvalError::MissingSeries {
                name: "west_release_cfs".into()
            })
        );
    }
}
