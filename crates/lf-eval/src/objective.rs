//! Objectives, constraints and their value vectors.

use crate::metric::Metric;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Objective {
    pub name: String,
    pub sense: Sense,
    pub metric: Metric,
}

/// Feasibility threshold of a constraint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bound {
    /// Feasible while the value is at most this.
    Max(f64),
    /// Feasible while the value is at least this.
    Min(f64),
}

impl Bound {
    /// Distance into the infeasible side; zero when satisfied.
    pub fn violation(self, value: f64) -> f64 {
        match self {
            Bound::Max(limit) => (value - limit).max(0.0),
            Bound::Min(limit) => (limit - value).max(0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub metric: Metric,
    pub bound: Bound,
}

/// Objective values in declaration order, as reported (not sign-flipped).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectiveVector {
    pub values: Vec<f64>,
    pub senses: Vec<Sense>,
}

impl ObjectiveVector {
    /// Values oriented so that smaller is always better.
    pub fn minimized(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(&self.senses)
            .map(|(&v, s)| match s {
                Sense::Minimize => v,
                Sense::Maximize => -v,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Constraint values and their violations (0 when satisfied).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstraintVector {
    pub values: Vec<f64>,
    pub violations: Vec<f64>,
}

impl ConstraintVector {
    pub fn total_violation(&self) -> f64 {
        self.violations.iter().sum()
    }

    pub fn is_feasible(&self) -> bool {
        self.total_violation() == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_violation() {
        assert_eq!(Bound::Max(10.0).violation(12.5), 2.5);
        assert_eq!(Bound::Max(10.0).violation(9.0), 0.0);
        assert_eq!(Bound::Min(3.0).violation(1.0), 2.0);
        assert_eq!(Bound::Min(3.0).violation(3.0), 0.0);
    }

    #[test]
    fn maximized_objectives_flip_sign() {
        let v = ObjectiveVector {
            values: vec![4.0, 7.0],
            senses: vec![Sense::Minimize, Sense::Maximize],
        };
        assert_eq!(v.minimized(), vec![4.0, -7.0]);
    }
}
