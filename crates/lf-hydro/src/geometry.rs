//! Stage-storage-area relationship of the lake.

use lf_core::{interp_clamped, interp_extrapolate};
use lf_sim::{SimError, SimResult};

/// Tabulated lake geometry: stage (ft), storage (acft), surface area (acres).
///
/// Interpolation is linear. Below the first row values are clamped; above the
/// last row storage and stage are extrapolated while area is held constant.
#[derive(Clone, Debug)]
pub struct LakeGeometry {
    stage: Vec<f64>,
    storage: Vec<f64>,
    area: Vec<f64>,
}

impl LakeGeometry {
    pub fn new(stage: Vec<f64>, storage: Vec<f64>, area: Vec<f64>) -> SimResult<Self> {
        if stage.len() < 2 || stage.len() != storage.len() || stage.len() != area.len() {
            return Err(SimError::InvalidArg {
                what: "geometry table needs at least two rows of equal length",
            });
        }
        if stage.windows(2).any(|w| w[1] <= w[0]) || storage.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SimError::InvalidArg {
                what: "geometry stage and storage must be strictly increasing",
            });
        }
        if area.windows(2).any(|w| w[1] < w[0]) || area[0] < 0.0 || storage[0] < 0.0 {
            return Err(SimError::InvalidArg {
                what: "geometry area must be non-negative and non-decreasing",
            });
        }
        Ok(Self {
            stage,
            storage,
            area,
        })
    }

    pub fn storage_at(&self, stage: f64) -> f64 {
        interp_extrapolate(&self.stage, &self.storage, stage)
    }

    pub fn stage_at(&self, storage: f64) -> f64 {
        interp_extrapolate(&self.storage, &self.stage, storage)
    }

    pub fn area_at(&self, stage: f64) -> f64 {
        interp_clamped(&self.stage, &self.area, stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LakeGeometry {
        LakeGeometry::new(
            vec![0.0, 10.0, 20.0],
            vec![0.0, 1000.0, 3000.0],
            vec![0.0, 100.0, 200.0],
        )
        .unwrap()
    }

    #[test]
    fn stage_storage_inverse() {
        let g = table();
        for stage in [0.0, 2.5, 10.0, 14.0, 25.0] {
            let s = g.storage_at(stage);
            assert!((g.stage_at(s) - stage).abs() < 1e-9);
        }
        assert_eq!(g.area_at(30.0), 200.0);
        assert_eq!(g.area_at(5.0), 50.0);
    }

    #[test]
    fn rejects_non_monotonic() {
        assert!(LakeGeometry::new(vec![0.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0]).is_err());
        assert!(LakeGeometry::new(vec![0.0, 1.0], vec![1.0, 1.0], vec![0.0, 1.0]).is_err());
        assert!(LakeGeometry::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![2.0, 1.0]).is_err());
        assert!(LakeGeometry::new(vec![0.0], vec![0.0], vec![0.0]).is_err());
    }
}
