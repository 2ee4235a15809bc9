//! Outbound sentence builders
//!
//! Everything here is a pure function of an entity snapshot and the own-ship
//! situation; alarm levels are recomputed on every call and never stored.

use chrono::NaiveDate;
use flarm_protocol::{
    EncodeSentence, FixMode, FixStatus, FlarmId, Gpgga, Gprmc, GpsFix, Pflaa, Pflau, Position,
    ALARM_TYPE_AIRCRAFT,
};

use crate::alarm::{alarm_level, relative_vertical_m, AlarmLevel};
use crate::entity::{TrafficEntity, TrafficKey};
use crate::geo::{rect_distance_bearing, wrap_relative};
use crate::situation::Situation;

const MPS_PER_KNOT: f64 = 0.5144;
const METERS_PER_FOOT: f64 = 0.3048;
const FEET_PER_METER: f64 = 3.28084;
/// Placeholder HDOP; the real value is not tracked
const HDOP: f64 = 1.0;

/// Collision geometry of one entity as seen from own-ship
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub alarm: AlarmLevel,
    /// Meters; the estimated distance when the entity has no position
    pub distance_m: f64,
    /// True bearing from own-ship, degrees
    pub bearing_deg: f64,
    pub north_m: f64,
    pub east_m: f64,
    /// Meters, positive when the target is above
    pub relative_vertical_m: i32,
}

/// Geometry and alarm level of `entity` relative to own-ship
pub fn assess(entity: &TrafficEntity, situation: &Situation) -> Assessment {
    let geometry = rect_distance_bearing(
        situation.latitude,
        situation.longitude,
        entity.latitude,
        entity.longitude,
    );
    let (distance_m, north_m) = if entity.position_valid {
        (geometry.distance_m, geometry.north_m)
    } else {
        (entity.distance_estimated_m, entity.distance_estimated_m)
    };
    let relative_vertical = relative_vertical_m(situation, entity.altitude_ft, entity.alt_is_gnss);

    Assessment {
        alarm: alarm_level(distance_m, f64::from(relative_vertical)),
        distance_m,
        bearing_deg: geometry.bearing_deg,
        north_m,
        east_m: geometry.east_m,
        relative_vertical_m: relative_vertical,
    }
}

/// The entity deserving the PFLAU slot: highest alarm, then nearest
pub fn most_severe_threat<'a>(
    entities: impl IntoIterator<Item = &'a TrafficEntity>,
    situation: &Situation,
) -> Option<(&'a TrafficEntity, Assessment)> {
    entities
        .into_iter()
        .map(|e| (e, assess(e, situation)))
        .min_by(|(_, a), (_, b)| {
            b.alarm
                .cmp(&a.alarm)
                .then(a.distance_m.total_cmp(&b.distance_m))
        })
}

fn flarm_id(entity: &TrafficEntity) -> FlarmId {
    FlarmId::new(entity.address, entity.tail.clone())
}

/// `PFLAU` status sentence for `traffic_count` targets and the given threat
///
/// Without an alarm the target fields are left empty.
pub fn pflau_for(
    situation: &Situation,
    traffic_count: usize,
    threat: Option<&TrafficEntity>,
) -> Pflau {
    let mut pflau = Pflau {
        rx: u32::try_from(traffic_count).unwrap_or(u32::MAX),
        tx: true,
        gps: if situation.gps_valid {
            GpsFix::Airborne
        } else {
            GpsFix::None
        },
        power: true,
        ..Default::default()
    };

    let Some(entity) = threat else {
        return pflau;
    };
    let assessment = assess(entity, situation);
    if !assessment.alarm.is_alarm() {
        return pflau;
    }

    pflau.alarm_level = assessment.alarm.value();
    pflau.relative_bearing =
        Some(wrap_relative(assessment.bearing_deg - situation.true_course) as i32);
    pflau.alarm_type = ALARM_TYPE_AIRCRAFT;
    pflau.relative_vertical = Some(assessment.relative_vertical_m);
    pflau.relative_distance = Some(assessment.distance_m.abs() as u32);
    pflau.id = Some(flarm_id(entity));
    pflau
}

/// `PFLAA` sentence for one entity
///
/// Entities without a valid position use the bearingless form: the
/// estimated distance goes in the north field and east, track, turn rate
/// and speed stay empty.
pub fn pflaa_for(entity: &TrafficEntity, situation: &Situation) -> Pflaa {
    let assessment = assess(entity, situation);
    let climb_rate = f64::from(entity.vvel_fpm) * METERS_PER_FOOT / 60.0;

    let mut pflaa = Pflaa {
        alarm_level: assessment.alarm.value(),
        relative_vertical: Some(assessment.relative_vertical_m),
        id_type: entity.address_type.pflaa_id_type(),
        id: flarm_id(entity),
        climb_rate: Some(climb_rate),
        aircraft_type: entity.emitter_category.aircraft_type(),
        ..Default::default()
    };

    if entity.position_valid {
        let speed_mps = if entity.speed_valid {
            (f64::from(entity.speed_knots) * MPS_PER_KNOT).trunc()
        } else {
            0.0
        };
        pflaa.relative_north = Some(assessment.north_m as i32);
        pflaa.relative_east = Some(assessment.east_m as i32);
        pflaa.track = Some(entity.track_deg.rem_euclid(360.0).trunc());
        pflaa.ground_speed = Some(speed_mps);
    } else {
        pflaa.relative_north = Some(assessment.distance_m.abs() as i32);
    }
    pflaa
}

/// `GPRMC` for own-ship on the given UTC date
pub fn gprmc_for(situation: &Situation, date: NaiveDate) -> Gprmc {
    let active = situation.gps_valid && situation.fix_quality > 0;
    let valid = situation.gps_valid;
    Gprmc {
        time_of_day: valid.then_some(situation.last_fix_since_midnight_utc),
        status: if active {
            FixStatus::Active
        } else {
            FixStatus::Void
        },
        position: valid.then_some(Position {
            latitude: situation.latitude,
            longitude: situation.longitude,
        }),
        speed_knots: valid.then_some(situation.ground_speed_knots),
        course: valid.then_some(situation.true_course),
        date,
        mode: FixMode::from_quality(situation.fix_quality),
    }
}

/// `GPGGA` for own-ship
pub fn gpgga_for(situation: &Situation) -> Gpgga {
    if !situation.gps_valid {
        return Gpgga {
            time_of_day: None,
            position: None,
            quality: 0,
            satellites: situation.satellites,
            hdop: None,
            altitude_m: None,
            geoid_separation_m: None,
        };
    }
    Gpgga {
        time_of_day: Some(situation.last_fix_since_midnight_utc),
        position: Some(Position {
            latitude: situation.latitude,
            longitude: situation.longitude,
        }),
        quality: situation.fix_quality,
        satellites: situation.satellites,
        hdop: Some(HDOP),
        altitude_m: Some(situation.altitude_msl_ft / FEET_PER_METER),
        geoid_separation_m: Some(situation.geoid_separation_ft / FEET_PER_METER),
    }
}

/// One reporting cycle: `GPRMC`, `GPGGA`, a `PFLAA` per entity, then `PFLAU`
pub fn report_sentences(
    traffic: &[(TrafficKey, TrafficEntity)],
    situation: &Situation,
    date: NaiveDate,
) -> Vec<String> {
    let mut sentences = Vec::with_capacity(traffic.len() + 3);
    sentences.push(gprmc_for(situation, date).encode());
    sentences.push(gpgga_for(situation).encode());
    sentences.extend(
        traffic
            .iter()
            .map(|(_, entity)| pflaa_for(entity, situation).encode()),
    );

    let threat = most_severe_threat(traffic.iter().map(|(_, e)| e), situation).map(|(e, _)| e);
    sentences.push(pflau_for(situation, traffic.len(), threat).encode());
    sentences
}
