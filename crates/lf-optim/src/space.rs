//! Decision variables and decoding onto parameter vectors.

use std::collections::BTreeSet;

use lf_core::ParameterVector;
use rand::Rng;

use crate::error::{OptimError, OptimResult};

#[derive(Clone, Debug, PartialEq)]
pub struct DecisionVariable {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

/// Bounded box of decision variables layered over a base parameter vector.
#[derive(Clone, Debug)]
pub struct SearchSpace {
    variables: Vec<DecisionVariable>,
    base: ParameterVector,
}

impl SearchSpace {
    pub fn new(variables: Vec<DecisionVariable>, base: ParameterVector) -> OptimResult<Self> {
        if variables.is_empty() {
            return Err(OptimError::InvalidSpace {
                what: "no decision variables".into(),
            });
        }
        let mut seen = BTreeSet::new();
        for v in &variables {
            if !seen.insert(v.name.as_str()) {
                return Err(OptimError::InvalidSpace {
                    what: format!("duplicate variable {}", v.name),
                });
            }
            if !(v.min.is_finite() && v.max.is_finite() && v.min < v.max) {
                return Err(OptimError::InvalidSpace {
                    what: format!("variable {} needs finite min < max", v.name),
                });
            }
        }
        Ok(Self { variables, base })
    }

    pub fn dims(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[DecisionVariable] {
        &self.variables
    }

    pub fn lower(&self) -> Vec<f64> {
        self.variables.iter().map(|v| v.min).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.variables.iter().map(|v| v.max).collect()
    }

    pub fn clamp(&self, x: &mut [f64]) {
        for (xi, v) in x.iter_mut().zip(&self.variables) {
            *xi = xi.clamp(v.min, v.max);
        }
    }

    /// Base parameters with every decision variable set from `x`.
    pub fn decode(&self, x: &[f64]) -> ParameterVector {
        let mut params = self.base.clone();
        for (v, &xi) in self.variables.iter().zip(x) {
            params.set(v.name.clone(), xi.clamp(v.min, v.max));
        }
        params
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        self.variables
            .iter()
            .map(|v| rng.gen_range(v.min..=v.max))
            .collect()
    }
}
