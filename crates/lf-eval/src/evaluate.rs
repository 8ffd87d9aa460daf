use lf_core::CompletedRun;
use tracing::trace;

use crate::error::{EvalError, EvalResult};
use crate::objective::{Constraint, ConstraintVector, Objective, ObjectiveVector};

/// Objective and constraint vectors for one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluation {
    pub objectives: ObjectiveVector,
    pub constraints: ConstraintVector,
}

fn finite(name: &str, value: f64) -> EvalResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite {
            name: name.to_string(),
            value,
        })
    }
}

/// Reduce `run` to objective and constraint vectors.
///
/// Each entry is computed independently from the run's series; the run is
/// only read, so evaluating it twice gives identical vectors.
pub fn evaluate(
    run: &CompletedRun,
    objectives: &[Objective],
    constraints: &[Constraint],
) -> EvalResult<Evaluation> {
    let mut ov = ObjectiveVector::default();
    for o in objectives {
        ov.values.push(finite(&o.name, o.metric.compute(run)?)?);
        ov.senses.push(o.sense);
    }

    let mut cv = ConstraintVector::default();
    for c in constraints {
        let value = finite(&c.name, c.metric.compute(run)?)?;
        cv.values.push(value);
        cv.violations.push(c.bound.violation(value));
    }
    trace!(
        objectives = ?ov.values,
        violation = cv.total_violation(),
        "run evaluated"
    );

    Ok(Evaluation {
        objectives: ov,
        constraints: cv,
    })
}
