// lf-core/src/units.rs

use uom::si::f64::{
    Area as UomArea, Mass as UomMass, Time as UomTime, Volume as UomVolume,
    VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Mass = UomMass;
pub type Time = UomTime;
pub type Volume = UomVolume;
pub type Flow = UomVolumeRate;

#[inline]
pub fn acft(v: f64) -> Volume {
    use uom::si::volume::acre_foot;
    Volume::new::<acre_foot>(v)
}

#[inline]
pub fn cfs(v: f64) -> Flow {
    use uom::si::volume_rate::cubic_foot_per_second;
    Flow::new::<cubic_foot_per_second>(v)
}

#[inline]
pub fn acres(v: f64) -> Area {
    use uom::si::area::acre;
    Area::new::<acre>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn days(v: f64) -> Time {
    use uom::si::time::day;
    Time::new::<day>(v)
}

/// Volume delivered in one day by a constant flow in cfs, as acre-feet.
#[inline]
pub fn cfs_day_to_acft(q: f64) -> f64 {
    use uom::si::volume::acre_foot;
    let v: Volume = cfs(q) * days(1.0);
    v.get::<acre_foot>()
}

#[inline]
pub fn acft_to_m3(v: f64) -> f64 {
    use uom::si::volume::cubic_meter;
    acft(v).get::<cubic_meter>()
}

#[inline]
pub fn acres_to_m2(v: f64) -> f64 {
    use uom::si::area::square_meter;
    acres(v).get::<square_meter>()
}

/// Concentration in mg/L of `mass_kg` dissolved in `volume_m3`.
#[inline]
pub fn conc_mg_per_l(mass_kg: f64, volume_m3: f64) -> f64 {
    use uom::si::mass::milligram;
    use uom::si::volume::{cubic_meter, liter};
    let litres = Volume::new::<cubic_meter>(volume_m3).get::<liter>();
    if litres <= 0.0 {
        return 0.0;
    }
    kg(mass_kg).get::<milligram>() / litres
}

/// Mass in kg carried by `volume_m3` at `conc` mg/L.
#[inline]
pub fn mass_kg_from_conc(conc: f64, volume_m3: f64) -> f64 {
    use uom::si::mass::{kilogram, milligram};
    use uom::si::volume::{cubic_meter, liter};
    let litres = Volume::new::<cubic_meter>(volume_m3).get::<liter>();
    Mass::new::<milligram>(conc * litres).get::<kilogram>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cfs_day_is_about_two_acre_feet() {
        assert!((cfs_day_to_acft(1.0) - 1.9835).abs() < 1e-3);
    }

    // uom's acre and acre-foot are US survey units.
    #[test]
    fn acre_foot_in_cubic_meters() {
        assert!((acft_to_m3(1.0) - 1233.489).abs() < 1e-3);
        assert!((acres_to_m2(1.0) - 4046.873).abs() < 1e-3);
    }

    #[test]
    fn concentration_round_trip() {
        // 1 kg in 1000 m3 is 1 mg/L
        assert!((conc_mg_per_l(1.0, 1000.0) - 1.0).abs() < 1e-12);
        assert!((mass_kg_from_conc(1.0, 1000.0) - 1.0).abs() < 1e-12);
        assert_eq!(conc_mg_per_l(5.0, 0.0), 0.0);
    }
}
