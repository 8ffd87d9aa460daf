use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// Band around zero treated as round-off by the engines.
pub const ROUNDOFF: Real = 1e-9;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Linear interpolation on a table with strictly increasing `xs`.
///
/// Values below the first abscissa are clamped; values above the last are
/// extrapolated from the final segment.
pub fn interp_extrapolate(xs: &[Real], ys: &[Real], x: Real) -> Real {
    debug_assert_eq!(xs.len(), ys.len());
    match xs.len() {
        0 => 0.0,
        1 => ys[0],
        n => {
            if x <= xs[0] {
                return ys[0];
            }
            let i = match xs.iter().position(|&xi| xi >= x) {
                Some(i) => i,
                None => n - 1,
            };
            let (x0, x1, y0, y1) = (xs[i - 1], xs[i], ys[i - 1], ys[i]);
            if x1 == x0 {
                return y1;
            }
            y0 + (y1 - y0) * (x - x0) / (x1 - x0)
        }
    }
}

/// Same as [`interp_extrapolate`] but clamped at both ends.
pub fn interp_clamped(xs: &[Real], ys: &[Real], x: Real) -> Real {
    match (xs.last(), ys.last()) {
        (Some(&last_x), Some(&last_y)) if x >= last_x => last_y,
        _ => interp_extrapolate(xs, ys, x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn interp_inside_and_outside() {
        let xs = [0.0, 10.0, 20.0];
        let ys = [0.0, 100.0, 300.0];
        assert_eq!(interp_extrapolate(&xs, &ys, 5.0), 50.0);
        assert_eq!(interp_extrapolate(&xs, &ys, 15.0), 200.0);
        assert_eq!(interp_extrapolate(&xs, &ys, -1.0), 0.0);
        assert_eq!(interp_extrapolate(&xs, &ys, 30.0), 500.0);
        assert_eq!(interp_clamped(&xs, &ys, 30.0), 300.0);
    }
}
