//! Non-negativity guards applied to every state update.

use lf_core::{NaiveDate, ROUNDOFF};

use crate::error::{SimError, SimResult};

/// Values within round-off of zero become exactly zero.
pub fn snap_roundoff(v: f64) -> f64 {
    if v.abs() < ROUNDOFF { 0.0 } else { v }
}

fn non_negative(v: f64) -> Option<f64> {
    if !v.is_finite() || v < -ROUNDOFF {
        None
    } else {
        Some(snap_roundoff(v).max(0.0))
    }
}

/// Hydrologic quantity (storage, stage-derived volume, area) must be >= 0.
pub fn check_physical(v: f64, what: &'static str, date: NaiveDate) -> SimResult<f64> {
    non_negative(v).ok_or(SimError::PhysicalInconsistency {
        date,
        what,
        value: v,
    })
}

/// Nutrient mass or concentration must be >= 0.
pub fn check_mass(v: f64, what: &'static str, date: NaiveDate) -> SimResult<f64> {
    non_negative(v).ok_or(SimError::MassBalanceViolation {
        date,
        what,
        value: v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    #[test]
    fn roundoff_snaps_to_zero() {
        assert_eq!(check_physical(-1e-12, "storage", day()).unwrap(), 0.0);
        assert_eq!(check_physical(0.0, "storage", day()).unwrap(), 0.0);
        assert_eq!(check_physical(3.5, "storage", day()).unwrap(), 3.5);
    }

    #[test]
    fn negative_fails_with_engine_kind() {
        assert!(matches!(
            check_physical(-0.1, "storage", day()),
            Err(SimError::PhysicalInconsistency { .. })
        ));
        assert!(matches!(
            check_mass(-0.1, "tp", day()),
            Err(SimError::MassBalanceViolation { .. })
        ));
    }

    #[test]
    fn nan_fails() {
        assert!(check_physical(f64::NAN, "storage", day()).is_err());
        assert!(check_mass(f64::INFINITY, "tp", day()).is_err());
    }
}
