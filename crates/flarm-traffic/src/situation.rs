//! Own-ship situation
//!
//! The GPS and baro sources live outside this crate. They publish a
//! [`Situation`] snapshot through an [`OwnshipSource`], which the decoder and
//! the sentence builders read but never modify.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Snapshot of own-ship position, altitude and validity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Situation {
    /// GPS solution is usable
    pub gps_valid: bool,
    /// Latitude, decimal degrees
    pub latitude: f64,
    /// Longitude, decimal degrees
    pub longitude: f64,
    /// Ground track, degrees true
    pub true_course: f64,
    /// Ground speed, knots
    pub ground_speed_knots: f64,
    /// GGA fix quality: 0 = none, 1 = GPS, 2 = DGPS
    pub fix_quality: u8,
    /// Satellites used in the solution
    pub satellites: u16,
    /// Seconds since midnight UTC of the last fix
    pub last_fix_since_midnight_utc: f64,
    /// GPS altitude above mean sea level, feet
    pub altitude_msl_ft: f64,
    /// GPS height above the WGS-84 ellipsoid, feet
    pub height_above_ellipsoid_ft: f64,
    /// Geoid separation, feet
    pub geoid_separation_ft: f64,
    /// Pressure altitude is usable
    pub baro_valid: bool,
    /// Pressure altitude, feet
    pub baro_altitude_ft: f64,
}

impl Situation {
    /// Own altitude to compare a traffic altitude against, in feet
    ///
    /// Prefers pressure altitude, falls back to GPS MSL. Targets whose
    /// altitude is GNSS (ellipsoid) referenced are compared to our own
    /// ellipsoid height so the two datums are never mixed.
    pub fn reference_altitude_ft(&self, traffic_alt_is_gnss: bool) -> f64 {
        if traffic_alt_is_gnss && self.gps_valid {
            return self.height_above_ellipsoid_ft;
        }
        if !self.baro_valid && self.gps_valid {
            return self.altitude_msl_ft;
        }
        self.baro_altitude_ft
    }
}

/// Read-only access to the current own-ship situation
pub trait OwnshipSource: Send + Sync {
    /// Current snapshot
    fn situation(&self) -> Situation;
}

/// An [`OwnshipSource`] updated by whoever owns the GPS
#[derive(Debug, Clone, Default)]
pub struct SharedSituation {
    inner: Arc<RwLock<Situation>>,
}

impl SharedSituation {
    pub fn new(situation: Situation) -> Self {
        Self {
            inner: Arc::new(RwLock::new(situation)),
        }
    }

    /// Replace the current snapshot
    pub fn update(&self, situation: Situation) {
        match self.inner.write() {
            Ok(mut guard) => *guard = situation,
            Err(poisoned) => *poisoned.into_inner() = situation,
        }
    }
}

impl OwnshipSource for SharedSituation {
    fn situation(&self) -> Situation {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
