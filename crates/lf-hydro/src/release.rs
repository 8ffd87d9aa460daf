//! Release levels chosen from the operating zone and tributary condition.

use crate::schedule::Zone;
use crate::tributary::ThcClass;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReleaseLevel {
    None = 0,
    Baseflow = 1,
    Level1 = 2,
    Level2 = 3,
    Level3 = 4,
    Maximum = 5,
}

impl ReleaseLevel {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// One level down; `None` stays `None`.
    pub fn lower(self) -> Self {
        match self {
            ReleaseLevel::None | ReleaseLevel::Baseflow => ReleaseLevel::None,
            ReleaseLevel::Level1 => ReleaseLevel::Baseflow,
            ReleaseLevel::Level2 => ReleaseLevel::Level1,
            ReleaseLevel::Level3 => ReleaseLevel::Level2,
            ReleaseLevel::Maximum => ReleaseLevel::Level3,
        }
    }
}

/// Release level for the day.
pub fn release_level(zone: Zone, thc: ThcClass) -> ReleaseLevel {
    let band = |wet: ReleaseLevel| {
        if thc.is_wet_or_above() {
            wet
        } else if thc.is_dry_or_below() {
            ReleaseLevel::Baseflow
        } else {
            wet.lower().max(ReleaseLevel::Baseflow)
        }
    };
    match zone {
        Zone::A => ReleaseLevel::Maximum,
        Zone::B => ReleaseLevel::Level3,
        Zone::C => {
            if thc.is_wet_or_above() {
                ReleaseLevel::Level3
            } else {
                ReleaseLevel::Level2
            }
        }
        Zone::D3 => band(ReleaseLevel::Level3),
        Zone::D2 => band(ReleaseLevel::Level2),
        Zone::D1 => band(ReleaseLevel::Level1),
        Zone::Baseflow => ReleaseLevel::Baseflow,
        Zone::BeneficialUse | Zone::WaterShortage => ReleaseLevel::None,
    }
}

/// Operating season by calendar month: 1 Nov-Feb, 2 Mar-May, 3 Jun-Jul, 4 Aug-Oct.
pub fn season(month: u32) -> usize {
    match month {
        3..=5 => 2,
        6 | 7 => 3,
        8..=10 => 4,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_zone_and_thc() {
        assert_eq!(release_level(Zone::A, ThcClass::VeryDry), ReleaseLevel::Maximum);
        assert_eq!(release_level(Zone::C, ThcClass::Normal), ReleaseLevel::Level2);
        assert_eq!(release_level(Zone::D3, ThcClass::Wet), ReleaseLevel::Level3);
        assert_eq!(release_level(Zone::D3, ThcClass::Normal), ReleaseLevel::Level2);
        assert_eq!(release_level(Zone::D1, ThcClass::Normal), ReleaseLevel::Baseflow);
        assert_eq!(release_level(Zone::D2, ThcClass::Dry), ReleaseLevel::Baseflow);
        assert_eq!(release_level(Zone::Baseflow, ThcClass::VeryWet), ReleaseLevel::Baseflow);
        assert_eq!(release_level(Zone::WaterShortage, ThcClass::VeryWet), ReleaseLevel::None);
    }

    #[test]
    fn seasons() {
        assert_eq!(season(1), 1);
        assert_eq!(season(11), 1);
        assert_eq!(season(4), 2);
        assert_eq!(season(7), 3);
        assert_eq!(season(10), 4);
    }
}
