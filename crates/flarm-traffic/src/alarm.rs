//! Alarm assessment and vertical separation
//!
//! The alarm model is a plain proximity threshold: half a nautical mile and
//! 500 ft for an urgent alarm, one nautical mile and 1000 ft for an
//! important one. It does not look at closing rates or time to impact, so
//! level 1 ("13-18 seconds to impact") is never produced.

use serde::{Deserialize, Serialize};

use crate::situation::Situation;

/// 0.5 NM
pub const URGENT_DISTANCE_M: f64 = 926.0;
/// 500 ft
pub const URGENT_VERTICAL_M: f64 = 152.0;
/// 1.0 NM
pub const IMPORTANT_DISTANCE_M: f64 = 1852.0;
/// 1000 ft
pub const IMPORTANT_VERTICAL_M: f64 = 304.0;

const FEET_PER_METER: f64 = 3.28084;
const METERS_PER_FOOT: f64 = 0.3048;

/// FLARM alarm level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum AlarmLevel {
    /// No alarm; traffic information only
    #[default]
    None,
    /// 13-18 seconds to impact
    Low,
    /// 9-12 seconds to impact
    Important,
    /// 0-8 seconds to impact
    Urgent,
}

impl AlarmLevel {
    /// Numeric level as sent on the wire
    pub fn value(&self) -> u8 {
        match self {
            AlarmLevel::None => 0,
            AlarmLevel::Low => 1,
            AlarmLevel::Important => 2,
            AlarmLevel::Urgent => 3,
        }
    }

    pub fn is_alarm(&self) -> bool {
        *self != AlarmLevel::None
    }
}

/// Alarm level for a target at the given horizontal and vertical separation
pub fn alarm_level(distance_m: f64, vertical_m: f64) -> AlarmLevel {
    let vertical = vertical_m.abs();
    if distance_m < URGENT_DISTANCE_M && vertical < URGENT_VERTICAL_M {
        AlarmLevel::Urgent
    } else if distance_m < IMPORTANT_DISTANCE_M && vertical < IMPORTANT_VERTICAL_M {
        AlarmLevel::Important
    } else {
        AlarmLevel::None
    }
}

/// Vertical separation to a target in meters, positive when it is above us
pub fn relative_vertical_m(
    situation: &Situation,
    traffic_alt_ft: i32,
    traffic_alt_is_gnss: bool,
) -> i32 {
    let own_ft = situation.reference_altitude_ft(traffic_alt_is_gnss);
    (f64::from(traffic_alt_ft) * METERS_PER_FOOT - own_ft * METERS_PER_FOOT) as i32
}

/// Absolute target altitude in feet from a relative vertical in meters
///
/// Returns the altitude and whether it is GNSS (ellipsoid) referenced. With
/// neither baro nor GPS available the altitude is unknown and reported as 0.
pub fn altitude_from_relative(situation: &Situation, relative_vertical_m: f64) -> (i32, bool) {
    let delta_ft = relative_vertical_m * FEET_PER_METER;
    if situation.baro_valid {
        ((situation.baro_altitude_ft + delta_ft) as i32, false)
    } else if situation.gps_valid {
        ((situation.height_above_ellipsoid_ft + delta_ft) as i32, true)
    } else {
        (0, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_strict() {
        assert_eq!(alarm_level(925.9, 0.0), AlarmLevel::Urgent);
        assert_eq!(alarm_level(926.0, 0.0), AlarmLevel::Important);
        assert_eq!(alarm_level(0.0, 151.9), AlarmLevel::Urgent);
        assert_eq!(alarm_level(0.0, 152.0), AlarmLevel::Important);
        assert_eq!(alarm_level(1851.9, 303.9), AlarmLevel::Important);
        assert_eq!(alarm_level(1852.0, 0.0), AlarmLevel::None);
        assert_eq!(alarm_level(0.0, 304.0), AlarmLevel::None);
    }

    #[test]
    fn test_vertical_sign_is_ignored() {
        assert_eq!(alarm_level(500.0, -100.0), AlarmLevel::Urgent);
        assert_eq!(alarm_level(500.0, -200.0), AlarmLevel::Important);
        assert_eq!(alarm_level(500.0, -400.0), AlarmLevel::None);
    }

    #[test]
    fn test_level_values() {
        assert_eq!(AlarmLevel::None.value(), 0);
        assert_eq!(AlarmLevel::Important.value(), 2);
        assert_eq!(AlarmLevel::Urgent.value(), 3);
        assert!(AlarmLevel::Urgent > AlarmLevel::Important);
        assert!(!AlarmLevel::None.is_alarm());
    }

    #[test]
    fn test_relative_vertical_against_baro() {
        let s = Situation {
            gps_valid: true,
            baro_valid: true,
            baro_altitude_ft: 1000.0,
            ..Default::default()
        };
        // 1329 ft is 100.3 m above 1000 ft, truncated toward zero
        assert_eq!(relative_vertical_m(&s, 1329, false), 100);
        assert_eq!(relative_vertical_m(&s, 672, false), -99);
    }

    #[test]
    fn test_altitude_round_trip() {
        let baro = Situation {
            gps_valid: true,
            baro_valid: true,
            baro_altitude_ft: 4500.0,
            ..Default::default()
        };
        let (alt, gnss) = altitude_from_relative(&baro, -120.0);
        assert!(!gnss);
        assert!((relative_vertical_m(&baro, alt, gnss) + 120).abs() <= 1);

        let gps_only = Situation {
            gps_valid: true,
            altitude_msl_ft: 4500.0,
            height_above_ellipsoid_ft: 4650.0,
            ..Default::default()
        };
        let (alt, gnss) = altitude_from_relative(&gps_only, 250.0);
        assert!(gnss);
        assert!((relative_vertical_m(&gps_only, alt, gnss) - 250).abs() <= 1);
    }

    #[test]
    fn test_altitude_unknown_without_sources() {
        assert_eq!(
            altitude_from_relative(&Situation::default(), 300.0),
            (0, false)
        );
    }
}
