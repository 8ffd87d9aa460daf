//! Nutrient fold over a completed hydrology run.

use lf_core::{
    Horizon, InputData, ParameterVector, SeriesSet, acft_to_m3, acres_to_m2, cfs_day_to_acft,
    conc_mg_per_l, mass_kg_from_conc,
};
use lf_sim::{DailyModel, SimError, SimResult, check_mass, run_daily};
use tracing::debug;

use crate::config::{NutrientConfig, Rates};

pub(crate) const LAKE_OUTPUTS: [&str; 9] = [
    "tp_water_mass_kg",
    "tp_sediment_mass_kg",
    "tp_conc_mg_l",
    "tp_load_in_kg",
    "tp_settling_kg",
    "tp_release_kg",
    "tp_burial_kg",
    "tp_outflow_load_kg",
    "tp_supply_load_kg",
];

/// Pools at the end of a day plus that day's fluxes (kg).
#[derive(Clone, Debug, PartialEq)]
pub struct NutrientState {
    pub water_mass: f64,
    pub sediment_mass: f64,
    pub conc: f64,
    pub load_in: f64,
    pub settling: f64,
    pub release: f64,
    pub burial: f64,
    pub outflow_load: f64,
    pub supply_load: f64,
    pub structure_loads: Vec<f64>,
}

/// Hydrology series needed per day, all covering the horizon.
struct Hydrology<'a> {
    storage_acft: &'a [f64],
    area_acres: &'a [f64],
    supply_acft: &'a [f64],
    outflow_cfs: Vec<&'a [f64]>,
    ews_cfs: Vec<&'a [f64]>,
    backflow_cfs: Vec<&'a [f64]>,
}

pub struct NutrientModel<'a> {
    horizon: Horizon,
    config: &'a NutrientConfig,
    rates: Rates,
    hydro: Hydrology<'a>,
    load_kg: &'a [f64],
}

impl<'a> NutrientModel<'a> {
    /// Bind the engine to a hydrology run. Every hydrology series it reads
    /// must cover the whole horizon, otherwise nothing is simulated.
    pub fn new(
        hydrology: &'a SeriesSet,
        inputs: &'a InputData,
        config: &'a NutrientConfig,
        params: &ParameterVector,
    ) -> SimResult<Self> {
        config.validate()?;
        let rates = config.rates(params)?;
        let horizon = *inputs.horizon();
        let get = |name: &str| -> SimResult<&'a [f64]> {
            Ok(hydrology.get_covering(name, &horizon)?.values())
        };
        let per_structure = |suffix: &str| -> SimResult<Vec<&'a [f64]>> {
            config
                .structures
                .iter()
                .map(|id| get(&format!("{id}_{suffix}")))
                .collect()
        };
        let hydro = Hydrology {
            storage_acft: get("storage_acft")?,
            area_acres: get("surface_area_acres")?,
            supply_acft: get("losa_supply_acft")?,
            outflow_cfs: per_structure("release_cfs")?,
            ews_cfs: per_structure("ews_cfs")?,
            backflow_cfs: per_structure("backflow_cfs")?,
        };
        let load_kg = inputs.required(&config.load_series)?.values();
        Ok(Self {
            horizon,
            config,
            rates,
            hydro,
            load_kg,
        })
    }
}

impl DailyModel for NutrientModel<'_> {
    type State = NutrientState;

    fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    fn initial_state(&self) -> SimResult<NutrientState> {
        let volume = acft_to_m3(self.hydro.storage_acft[0]);
        Ok(NutrientState {
            water_mass: mass_kg_from_conc(self.config.initial_conc_mg_l, volume),
            sediment_mass: self.config.initial_sediment_kg,
            conc: self.config.initial_conc_mg_l,
            load_in: 0.0,
            settling: 0.0,
            release: 0.0,
            burial: 0.0,
            outflow_load: 0.0,
            supply_load: 0.0,
            structure_loads: vec![0.0; self.config.structures.len()],
        })
    }

    fn step(&self, day: usize, prev: &NutrientState) -> SimResult<NutrientState> {
        let date = self.horizon.date_at(day);
        let h = &self.hydro;
        let r = &self.rates;

        let volume = acft_to_m3(h.storage_acft[day]);
        let area_m2 = acres_to_m2(h.area_acres[day]);
        let structure_m3: Vec<f64> = h
            .outflow_cfs
            .iter()
            .zip(&h.ews_cfs)
            .map(|(q, e)| acft_to_m3(cfs_day_to_acft(q[day] + e[day])))
            .collect();
        let supply_m3 = acft_to_m3(h.supply_acft[day]);
        let outflow_m3 = structure_m3.iter().sum::<f64>() + supply_m3;
        let backflow_m3 = acft_to_m3(cfs_day_to_acft(
            h.backflow_cfs.iter().map(|b| b[day]).sum::<f64>(),
        ));

        let load_in = self.load_kg[day] * r.load_multiplier
            + self.config.atmospheric_kg_per_acre_day * h.area_acres[day]
            + mass_kg_from_conc(self.config.backflow_conc_mg_l, backflow_m3);
        let load_in = check_mass(load_in, "tp load", date)?;

        let release = r.release * prev.sediment_mass;
        let burial = r.burial * prev.sediment_mass;
        let gross = prev.water_mass + load_in + release;

        let (water_mass, outflow_load, settling) = if volume > 0.0 {
            let k_out = outflow_m3 / volume;
            let k_set = r.settling * area_m2 / volume;
            let m = gross / (1.0 + k_out + k_set);
            (m, m * k_out, m * k_set)
        } else {
            // an empty lake keeps nothing in the water column
            (0.0, 0.0, gross)
        };

        let water_mass = check_mass(water_mass, "tp water column mass", date)?;
        let sediment_mass = check_mass(
            prev.sediment_mass + settling - release - burial,
            "tp sediment mass",
            date,
        )?;
        let conc = check_mass(conc_mg_per_l(water_mass, volume), "tp concentration", date)?;
        if conc > self.config.max_conc_mg_l {
            return Err(SimError::MassBalanceViolation {
                date,
                what: "tp concentration above bound",
                value: conc,
            });
        }

        let structure_loads = structure_m3
            .iter()
            .map(|q| if outflow_m3 > 0.0 { outflow_load * q / outflow_m3 } else { 0.0 })
            .collect();
        let supply_load = if outflow_m3 > 0.0 {
            outflow_load * supply_m3 / outflow_m3
        } else {
            0.0
        };

        Ok(NutrientState {
            water_mass,
            sediment_mass,
            conc,
            load_in,
            settling,
            release,
            burial,
            outflow_load,
            supply_load,
            structure_loads,
        })
    }

    fn output_names(&self) -> Vec<String> {
        self.config.output_names()
    }

    fn record(&self, s: &NutrientState, out: &mut [f64]) {
        let lake = [
            s.water_mass,
            s.sediment_mass,
            s.conc,
            s.load_in,
            s.settling,
            s.release,
            s.burial,
            s.outflow_load,
            s.supply_load,
        ];
        out[..lake.len()].copy_from_slice(&lake);
        out[lake.len()..].copy_from_slice(&s.structure_loads);
    }
}

/// Run the nutrient engine on a finished hydrology run.
pub fn simulate_nutrients(
    hydrology: &SeriesSet,
    inputs: &InputData,
    config: &NutrientConfig,
    params: &ParameterVector,
) -> SimResult<SeriesSet> {
    let model = NutrientModel::new(hydrology, inputs, config, params)?;
    let run = run_daily(&model)?;
    debug!(
        days = inputs.horizon().days(),
        water_mass_kg = run.final_state.water_mass,
        "nutrient run complete"
    );
    Ok(run.series)
}
