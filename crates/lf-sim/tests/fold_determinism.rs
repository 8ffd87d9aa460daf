//! Integration test: a bucket model folded twice gives identical series, and a
//! drained bucket trips the physical guard.

use lf_core::{Horizon, NaiveDate};
use lf_sim::{DailyModel, SimError, SimResult, check_physical, run_daily};
use proptest::prelude::*;

struct Bucket {
    horizon: Horizon,
    inflow: Vec<f64>,
    outflow: f64,
}

impl DailyModel for Bucket {
    type State = f64;

    fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    fn initial_state(&self) -> SimResult<f64> {
        Ok(10.0)
    }

    fn step(&self, day: usize, prev: &f64) -> SimResult<f64> {
        let next = prev + self.inflow[day] - self.outflow;
        check_physical(next, "storage", self.horizon.date_at(day))
    }

    fn output_names(&self) -> Vec<String> {
        vec!["storage".into()]
    }

    fn record(&self, state: &f64, out: &mut [f64]) {
        out[0] = *state;
    }
}

fn horizon(days: usize) -> Horizon {
    Horizon::from_len(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(), days).unwrap()
}

#[test]
fn drained_bucket_fails() {
    let model = Bucket {
        horizon: horizon(30),
        inflow: vec![0.0; 30],
        outflow: 1.0,
    };
    let err = run_daily(&model).unwrap_err();
    match err {
        SimError::PhysicalInconsistency { date, what, .. } => {
            assert_eq!(what, "storage");
            assert_eq!(date, NaiveDate::from_ymd_opt(2010, 1, 11).unwrap());
        }
        other => panic!("unexpected error: {other}"),
    }
}

proptest! {
    #[test]
    fn fold_is_deterministic(inflow in prop::collection::vec(0.0f64..5.0, 1..200)) {
        let model = Bucket {
            horizon: horizon(inflow.len()),
            inflow,
            outflow: 0.5,
        };
        let a = run_daily(&model);
        let b = run_daily(&model);
        match (a, b) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a.series, b.series),
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "runs diverged"),
        }
    }
}
