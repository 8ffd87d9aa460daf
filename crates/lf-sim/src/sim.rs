//! Daily fold runner and result recording.

use lf_core::{SeriesSet, TimeSeries};
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::model::DailyModel;

/// Recorded outputs of a completed fold.
#[derive(Clone, Debug)]
pub struct DailyRun<S> {
    pub series: SeriesSet,
    pub final_state: S,
}

/// Fold `model` over its horizon.
///
/// The first failing day aborts the run; no partial series are returned.
pub fn run_daily<M: DailyModel>(model: &M) -> SimResult<DailyRun<M::State>> {
    let horizon = *model.horizon();
    let total = horizon.days();
    let names = model.output_names();
    if names.is_empty() {
        return Err(SimError::InvalidArg {
            what: "model records no outputs",
        });
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(total); names.len()];
    let mut row = vec![0.0; names.len()];
    let mut state = model.initial_state()?;

    for day in 0..total {
        state = model.step(day, &state)?;
        model.record(&state, &mut row);
        for (col, &v) in columns.iter_mut().zip(row.iter()) {
            col.push(v);
        }
    }

    let mut series = SeriesSet::new();
    for (name, values) in names.into_iter().zip(columns) {
        series.insert(name, TimeSeries::new(horizon.start(), values))?;
    }
    debug!(days = total, outputs = series.len(), "daily fold complete");

    Ok(DailyRun {
        series,
        final_state: state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::{Horizon, NaiveDate};

    struct Counter {
        horizon: Horizon,
        fail_on: Option<usize>,
    }

    impl DailyModel for Counter {
        type State = f64;

        fn horizon(&self) -> &Horizon {
            &self.horizon
        }

        fn initial_state(&self) -> SimResult<f64> {
            Ok(0.0)
        }

        fn step(&self, day: usize, prev: &f64) -> SimResult<f64> {
            if Some(day) == self.fail_on {
                return Err(SimError::PhysicalInconsistency {
                    date: self.horizon.date_at(day),
                    what: "count",
                    value: -1.0,
                });
            }
            Ok(prev + 1.0)
        }

        fn output_names(&self) -> Vec<String> {
            vec!["count".into(), "double".into()]
        }

        fn record(&self, state: &f64, out: &mut [f64]) {
            out[0] = *state;
            out[1] = 2.0 * state;
        }
    }

    fn horizon(days: usize) -> Horizon {
        Horizon::from_len(NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(), days).unwrap()
    }

    #[test]
    fn fold_records_each_day() {
        let model = Counter {
            horizon: horizon(5),
            fail_on: None,
        };
        let run = run_daily(&model).unwrap();
        assert_eq!(run.final_state, 5.0);
        assert_eq!(
            run.series.get("count").unwrap().values(),
            &[1.0, 2.0, 3.0, 4.0, 5.0]
        );
        assert_eq!(run.series.get("double").unwrap().value_at(4), Some(10.0));
    }

    #[test]
    fn failure_aborts_run() {
        let model = Counter {
            horizon: horizon(5),
            fail_on: Some(3),
        };
        assert!(matches!(
            run_daily(&model),
            Err(SimError::PhysicalInconsistency { .. })
        ));
    }
}
