//! Named parameter vector shared by both engines.

use std::collections::BTreeMap;

use crate::{CoreError, CoreResult};

/// Parameter name to value. Ordered by name so iteration and hashing are
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ParameterVector {
    values: BTreeMap<String, f64>,
}

impl ParameterVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    pub fn require(&self, name: &str) -> CoreResult<f64> {
        self.get(name).ok_or_else(|| CoreError::MissingParameter {
            name: name.to_string(),
        })
    }

    /// Copy of `self` with every entry of `overrides` applied on top.
    pub fn overlay(&self, overrides: &ParameterVector) -> Self {
        let mut merged = self.clone();
        for (k, v) in overrides.iter() {
            merged.set(k, v);
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParameterVector {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut pv = Self::new();
        for (k, v) in iter {
            pv.set(k, v);
        }
        pv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_replaces_and_adds() {
        let base: ParameterVector = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        let over = ParameterVector::new().with("b", 5.0).with("c", 7.0);
        let merged = base.overlay(&over);
        assert_eq!(merged.get("a"), Some(1.0));
        assert_eq!(merged.get("b"), Some(5.0));
        assert_eq!(merged.get("c"), Some(7.0));
        assert_eq!(base.get("b"), Some(2.0));
    }

    #[test]
    fn require_reports_name() {
        let pv = ParameterVector::new();
        assert_eq!(
            pv.require("release.p1"),
            Err(CoreError::MissingParameter {
                name: "release.p1".into()
            })
        );
    }
}
