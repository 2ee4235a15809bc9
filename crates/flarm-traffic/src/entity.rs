//! Traffic entity data model

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use flarm_protocol::AircraftType;
use serde::{Deserialize, Serialize};

/// Registry key: `(address_type_bits << 24) | address`
///
/// Two keys with the same address but different type bits are different
/// entities, even when they describe the same aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrafficKey(pub u32);

impl TrafficKey {
    /// Compose a key from type bits and a 24-bit address
    pub fn new(type_bits: u8, address: u32) -> Self {
        Self((u32::from(type_bits) << 24) | (address & 0xFF_FFFF))
    }

    /// Key used by ICAO-addressed reports
    pub fn icao(address: u32) -> Self {
        Self::new(0, address)
    }

    /// Key used by non-ICAO (tracker assigned) reports
    pub fn non_icao(address: u32) -> Self {
        Self::new(1, address)
    }

    /// The 24-bit address part
    pub fn address(&self) -> u32 {
        self.0 & 0xFF_FFFF
    }

    /// The type bits above the address
    pub fn type_bits(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Address namespace implied by the type bits: 0 is ICAO
    pub fn address_type(&self) -> AddressType {
        match self.type_bits() {
            0 => AddressType::Icao,
            _ => AddressType::NonIcao,
        }
    }
}

impl fmt::Display for TrafficKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:06X}", self.type_bits(), self.address())
    }
}

/// Address namespace of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressType {
    /// ICAO 24-bit aircraft address
    #[default]
    Icao,
    /// Tracker-assigned (FLARM/OGN) ID
    NonIcao,
    /// Randomized stealth ID
    Anonymous,
}

impl AddressType {
    /// PFLAA `<IDType>` for this address type
    ///
    /// Several EFBs reject anything but 1 and 2, so anonymous IDs are
    /// reported as tracker IDs.
    pub fn pflaa_id_type(&self) -> u8 {
        match self {
            AddressType::Icao => flarm_protocol::ID_TYPE_ICAO,
            AddressType::NonIcao | AddressType::Anonymous => flarm_protocol::ID_TYPE_FLARM,
        }
    }

    /// Address type from a PFLAA `<IDType>`; only 1 means ICAO
    pub fn from_pflaa_id_type(id_type: u8) -> Self {
        if id_type == flarm_protocol::ID_TYPE_ICAO {
            AddressType::Icao
        } else {
            AddressType::NonIcao
        }
    }
}

/// Where the last accepted update of an entity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrafficSource {
    #[default]
    Unknown,
    /// 1090 MHz extended squitter
    Es1090,
    /// 978 MHz UAT
    Uat,
    /// FLARM/OGN tracker, serial or network
    Ogn,
}

impl TrafficSource {
    /// Sources whose recent reports take precedence over tracker reports
    pub fn is_primary(&self) -> bool {
        matches!(self, TrafficSource::Es1090)
    }
}

/// ADS-B emitter category, the internal aircraft classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmitterCategory {
    #[default]
    Unknown,
    Light,
    Small,
    Large,
    HighVortexLarge,
    Heavy,
    HighPerformance,
    Rotorcraft,
    Glider,
    LighterThanAir,
    Parachutist,
    Ultralight,
    Uav,
}

impl EmitterCategory {
    /// Category for a FLARM aircraft type
    ///
    /// Tow, drop and piston planes all become `Light`; unknown types give
    /// `None` so an existing classification is kept.
    pub fn from_aircraft_type(ty: AircraftType) -> Option<Self> {
        let category = match ty {
            AircraftType::Glider => EmitterCategory::Glider,
            AircraftType::TowPlane | AircraftType::DropPlane | AircraftType::Piston => {
                EmitterCategory::Light
            }
            AircraftType::Helicopter => EmitterCategory::Rotorcraft,
            AircraftType::Skydiver => EmitterCategory::Parachutist,
            AircraftType::HangGlider | AircraftType::Paraglider => EmitterCategory::Ultralight,
            AircraftType::Jet => EmitterCategory::Large,
            AircraftType::Balloon | AircraftType::Airship => EmitterCategory::LighterThanAir,
            AircraftType::Uav => EmitterCategory::Uav,
            AircraftType::Unknown | AircraftType::StaticObject => return None,
        };
        Some(category)
    }

    /// FLARM aircraft type reported for this category
    pub fn aircraft_type(&self) -> AircraftType {
        match self {
            EmitterCategory::Unknown => AircraftType::Unknown,
            EmitterCategory::Light => AircraftType::Piston,
            EmitterCategory::Small
            | EmitterCategory::Large
            | EmitterCategory::HighVortexLarge
            | EmitterCategory::Heavy
            | EmitterCategory::HighPerformance => AircraftType::Jet,
            EmitterCategory::Rotorcraft => AircraftType::Helicopter,
            EmitterCategory::Glider => AircraftType::Glider,
            EmitterCategory::LighterThanAir => AircraftType::Balloon,
            EmitterCategory::Parachutist => AircraftType::Skydiver,
            EmitterCategory::Ultralight => AircraftType::Paraglider,
            EmitterCategory::Uav => AircraftType::Uav,
        }
    }
}

/// One physically distinct aircraft as best known
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficEntity {
    /// 24-bit aircraft or tracker address
    pub address: u32,
    pub address_type: AddressType,
    /// Registration or competition ID
    pub tail: Option<String>,

    /// Latitude, decimal degrees
    pub latitude: f64,
    /// Longitude, decimal degrees
    pub longitude: f64,
    /// Altitude, feet
    pub altitude_ft: i32,
    /// Altitude is GNSS (ellipsoid) referenced rather than pressure
    pub alt_is_gnss: bool,
    /// Distance from own-ship, meters
    pub distance_m: f64,
    /// Bearing from own-ship, degrees true
    pub bearing_deg: f64,
    /// Estimated distance for targets without position, meters
    pub distance_estimated_m: f64,
    /// Ground track, degrees true
    pub track_deg: f64,
    /// Turn rate, degrees per second
    pub turn_rate: f64,
    pub speed_knots: u16,
    /// Vertical speed, feet per minute
    pub vvel_fpm: i16,
    pub emitter_category: EmitterCategory,

    pub last_source: TrafficSource,
    /// Wall-clock time of the last accepted update
    pub timestamp: DateTime<Utc>,
    pub last_seen: Instant,
    pub last_alt: Instant,
    /// Seconds since the last update, maintained by the owner of the clock
    pub age_secs: f64,

    pub position_valid: bool,
    pub bearing_distance_valid: bool,
    pub speed_valid: bool,
    pub extrapolated: bool,
}

impl TrafficEntity {
    /// A blank entity for a newly seen address
    pub fn new(address: u32, address_type: AddressType) -> Self {
        let now = Instant::now();
        Self {
            address: address & 0xFF_FFFF,
            address_type,
            tail: None,
            latitude: 0.0,
            longitude: 0.0,
            altitude_ft: 0,
            alt_is_gnss: false,
            distance_m: 0.0,
            bearing_deg: 0.0,
            distance_estimated_m: 0.0,
            track_deg: 0.0,
            turn_rate: 0.0,
            speed_knots: 0,
            vvel_fpm: 0,
            emitter_category: EmitterCategory::Unknown,
            last_source: TrafficSource::Unknown,
            timestamp: Utc::now(),
            last_seen: now,
            last_alt: now,
            age_secs: 0.0,
            position_valid: false,
            bearing_distance_valid: false,
            speed_valid: false,
            extrapolated: false,
        }
    }

    /// Length of the stored tail, 0 when none
    pub fn tail_len(&self) -> usize {
        self.tail.as_deref().map_or(0, str::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_composition() {
        let key = TrafficKey::new(2, 0xFFDD8F12);
        assert_eq!(key.0, 0x02DD8F12);
        assert_eq!(key.address(), 0xDD8F12);
        assert_eq!(key.type_bits(), 2);
        assert_eq!(key.to_string(), "2:DD8F12");
        assert_ne!(TrafficKey::icao(0xA4F2EE), TrafficKey::non_icao(0xA4F2EE));
    }

    #[test]
    fn test_key_address_type() {
        assert_eq!(TrafficKey::icao(0xA4F2EE).address_type(), AddressType::Icao);
        assert_eq!(TrafficKey::non_icao(0xA4F2EE).address_type(), AddressType::NonIcao);
        assert_eq!(TrafficKey::new(2, 0xA4F2EE).address_type(), AddressType::NonIcao);
    }

    #[test]
    fn test_address_type_mapping() {
        assert_eq!(AddressType::Icao.pflaa_id_type(), 1);
        assert_eq!(AddressType::NonIcao.pflaa_id_type(), 2);
        assert_eq!(AddressType::Anonymous.pflaa_id_type(), 2);
        assert_eq!(AddressType::from_pflaa_id_type(1), AddressType::Icao);
        for id_type in [0, 2, 3] {
            assert_eq!(AddressType::from_pflaa_id_type(id_type), AddressType::NonIcao);
        }
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(EmitterCategory::Glider.aircraft_type(), AircraftType::Glider);
        assert_eq!(EmitterCategory::Heavy.aircraft_type(), AircraftType::Jet);
        assert_eq!(EmitterCategory::Rotorcraft.aircraft_type(), AircraftType::Helicopter);
        assert_eq!(EmitterCategory::Parachutist.aircraft_type(), AircraftType::Skydiver);
        assert_eq!(EmitterCategory::Ultralight.aircraft_type(), AircraftType::Paraglider);
        assert_eq!(EmitterCategory::LighterThanAir.aircraft_type(), AircraftType::Balloon);
        assert_eq!(EmitterCategory::Unknown.aircraft_type(), AircraftType::Unknown);

        for ty in [AircraftType::TowPlane, AircraftType::DropPlane, AircraftType::Piston] {
            assert_eq!(EmitterCategory::from_aircraft_type(ty), Some(EmitterCategory::Light));
        }
        assert_eq!(EmitterCategory::from_aircraft_type(AircraftType::Unknown), None);
    }

    #[test]
    fn test_category_round_trip_through_flarm_codes() {
        for category in [
            EmitterCategory::Light,
            EmitterCategory::Rotorcraft,
            EmitterCategory::Glider,
            EmitterCategory::LighterThanAir,
            EmitterCategory::Parachutist,
            EmitterCategory::Ultralight,
            EmitterCategory::Uav,
        ] {
            assert_eq!(
                EmitterCategory::from_aircraft_type(category.aircraft_type()),
                Some(category)
            );
        }
    }

    #[test]
    fn test_new_entity() {
        let e = TrafficEntity::new(0x1ABCDEF, AddressType::NonIcao);
        assert_eq!(e.address, 0xABCDEF);
        assert_eq!(e.tail_len(), 0);
        assert!(!e.position_valid);
        assert_eq!(e.last_source, TrafficSource::Unknown);
    }
}
