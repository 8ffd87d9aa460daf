//! Tributary hydrologic condition (THC) classification.

use lf_sim::{SimError, SimResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThcClass {
    VeryDry,
    Dry,
    Normal,
    Wet,
    VeryWet,
}

impl ThcClass {
    pub fn is_wet_or_above(self) -> bool {
        self >= ThcClass::Wet
    }

    pub fn is_dry_or_below(self) -> bool {
        self <= ThcClass::Dry
    }
}

/// Splits a tributary condition index into five classes using four ascending
/// thresholds. Days without an index are treated as normal.
#[derive(Clone, Debug)]
pub struct TributaryClassifier {
    thresholds: [f64; 4],
}

impl TributaryClassifier {
    pub fn new(thresholds: [f64; 4]) -> SimResult<Self> {
        if thresholds.windows(2).any(|w| w[1] < w[0]) {
            return Err(SimError::InvalidArg {
                what: "tributary thresholds must be ascending",
            });
        }
        Ok(Self { thresholds })
    }

    pub fn classify(&self, index: Option<f64>) -> ThcClass {
        let Some(v) = index else {
            return ThcClass::Normal;
        };
        let [t0, t1, t2, t3] = self.thresholds;
        if v < t0 {
            ThcClass::VeryDry
        } else if v < t1 {
            ThcClass::Dry
        } else if v < t2 {
            ThcClass::Normal
        } else if v < t3 {
            ThcClass::Wet
        } else {
            ThcClass::VeryWet
        }
    }
}

impl Default for TributaryClassifier {
    fn default() -> Self {
        Self {
            thresholds: [-3.0, -1.5, 1.5, 3.0],
        }
    }
}
