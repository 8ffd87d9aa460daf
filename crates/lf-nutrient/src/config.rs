use lf_core::ParameterVector;
use lf_sim::{SimError, SimResult};

pub const SETTLING_VELOCITY: &str = "nutrient.settling_velocity_m_per_day";
pub const RELEASE_RATE: &str = "nutrient.release_rate_per_day";
pub const BURIAL_RATE: &str = "nutrient.burial_rate_per_day";
pub const LOAD_MULTIPLIER: &str = "nutrient.load_multiplier";

#[derive(Clone, Debug)]
pub struct NutrientConfig {
    /// Starting water column concentration (mg/L), applied to the first day's volume.
    pub initial_conc_mg_l: f64,
    pub initial_sediment_kg: f64,
    pub settling_velocity_m_per_day: f64,
    pub release_rate_per_day: f64,
    pub burial_rate_per_day: f64,
    pub load_multiplier: f64,
    /// Forcing series with external TP load (kg/day).
    pub load_series: String,
    pub atmospheric_kg_per_acre_day: f64,
    /// Concentration of water flowing back into the lake (mg/L).
    pub backflow_conc_mg_l: f64,
    /// Concentrations above this are treated as a broken balance.
    pub max_conc_mg_l: f64,
    /// Structure ids whose outflow carries phosphorus out of the lake.
    pub structures: Vec<String>,
}

/// Rate constants after parameter overrides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rates {
    pub settling: f64,
    pub release: f64,
    pub burial: f64,
    pub load_multiplier: f64,
}

impl NutrientConfig {
    pub fn parameter_names(&self) -> Vec<String> {
        [SETTLING_VELOCITY, RELEASE_RATE, BURIAL_RATE, LOAD_MULTIPLIER]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn is_known_parameter(&self, name: &str) -> bool {
        self.parameter_names().iter().any(|n| n == name)
    }

    pub(crate) fn rates(&self, params: &ParameterVector) -> SimResult<Rates> {
        let rates = Rates {
            settling: params.get_or(SETTLING_VELOCITY, self.settling_velocity_m_per_day),
            release: params.get_or(RELEASE_RATE, self.release_rate_per_day),
            burial: params.get_or(BURIAL_RATE, self.burial_rate_per_day),
            load_multiplier: params.get_or(LOAD_MULTIPLIER, self.load_multiplier),
        };
        let all = [
            rates.settling,
            rates.release,
            rates.burial,
            rates.load_multiplier,
        ];
        if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(SimError::InvalidArg {
                what: "nutrient rates must be finite and non-negative",
            });
        }
        if rates.release + rates.burial > 1.0 {
            return Err(SimError::InvalidArg {
                what: "sediment release plus burial must not exceed the pool",
            });
        }
        Ok(rates)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.initial_conc_mg_l < 0.0
            || self.initial_sediment_kg < 0.0
            || self.atmospheric_kg_per_acre_day < 0.0
            || self.backflow_conc_mg_l < 0.0
        {
            return Err(SimError::InvalidArg {
                what: "nutrient initial values and loads must be non-negative",
            });
        }
        if !(self.max_conc_mg_l > 0.0) {
            return Err(SimError::InvalidArg {
                what: "nutrient concentration bound must be positive",
            });
        }
        self.rates(&ParameterVector::new()).map(|_| ())
    }

    pub fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = crate::engine::LAKE_OUTPUTS
            .iter()
            .map(|s| s.to_string())
            .collect();
        names.extend(self.structures.iter().map(|id| format!("{id}_tp_load_kg")));
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NutrientConfig {
        NutrientConfig {
            initial_conc_mg_l: 0.1,
            initial_sediment_kg: 1.0e6,
            settling_velocity_m_per_day: 0.01,
            release_rate_per_day: 0.001,
            burial_rate_per_day: 0.0005,
            load_multiplier: 1.0,
            load_series: "tp_load_kg".into(),
            atmospheric_kg_per_acre_day: 0.0,
            backflow_conc_mg_l: 0.2,
            max_conc_mg_l: 10.0,
            structures: vec!["east".into()],
        }
    }

    #[test]
    fn overrides_apply() {
        let cfg = sample();
        let params = ParameterVector::new().with(SETTLING_VELOCITY, 0.05);
        let rates = cfg.rates(&params).unwrap();
        assert_eq!(rates.settling, 0.05);
        assert_eq!(rates.release, 0.001);
        assert!(cfg.is_known_parameter(BURIAL_RATE));
        assert!(!cfg.is_known_parameter("release.p1"));
    }

    #[test]
    fn sediment_rates_bounded() {
        let cfg = sample();
        let params = ParameterVector::new()
            .with(RELEASE_RATE, 0.7)
            .with(BURIAL_RATE, 0.5);
        assert!(cfg.rates(&params).is_err());
        assert!(
            cfg.rates(&ParameterVector::new().with(SETTLING_VELOCITY, -1.0))
                .is_err()
        );
    }
}
