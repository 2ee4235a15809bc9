//! Inbound sentence decoding into the registry
//!
//! The decoder never fails outward: every line ends up as a
//! [`DecodeOutcome`], and drops are logged at debug level.

use std::sync::Arc;

use flarm_protocol::{ParseSentence, Pflaa, Pflau, Sentence};
use tracing::debug;

use crate::alarm::altitude_from_relative;
use crate::entity::{AddressType, EmitterCategory, TrafficKey, TrafficSource};
use crate::error::DecodeError;
use crate::geo::{normalize_bearing, offset_position, project_position, rect_distance_bearing};
use crate::geo::METERS_PER_NM;
use crate::registry::{Motion, TrafficRegistry, TrafficReport, Upsert};
use crate::sinks::{LoggedMessage, MessageLog};
use crate::situation::OwnshipSource;

/// m/s to knots
const KNOTS_PER_MPS: f64 = 1.94384;
/// m/s to ft/min
const FPM_PER_MPS: f64 = 196.85;

/// Why a line was dropped
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    Malformed(DecodeError),
    /// Relative geometry cannot be placed without own position
    GpsUnavailable,
}

/// What became of one inbound line
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// Report merged into the entity at the key
    Merged(TrafficKey),
    /// A fresh primary-source entity kept the report out
    Discarded(TrafficKey),
    Dropped(DropReason),
    /// Not a traffic sentence
    Ignored,
}

impl From<Upsert> for DecodeOutcome {
    fn from(upsert: Upsert) -> Self {
        match upsert {
            Upsert::Inserted(key) | Upsert::Updated(key) => DecodeOutcome::Merged(key),
            Upsert::Discarded(key) => DecodeOutcome::Discarded(key),
        }
    }
}

/// Decodes PFLAU/PFLAA into [`TrafficRegistry`] updates
#[derive(Clone)]
pub struct TrafficDecoder {
    registry: Arc<TrafficRegistry>,
    ownship: Arc<dyn OwnshipSource>,
    messages: Arc<dyn MessageLog>,
}

impl std::fmt::Debug for TrafficDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficDecoder")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl TrafficDecoder {
    pub fn new(
        registry: Arc<TrafficRegistry>,
        ownship: Arc<dyn OwnshipSource>,
        messages: Arc<dyn MessageLog>,
    ) -> Self {
        Self {
            registry,
            ownship,
            messages,
        }
    }

    pub fn registry(&self) -> &Arc<TrafficRegistry> {
        &self.registry
    }

    /// Decode one received line; a checksum suffix is stripped, not checked
    pub fn decode_line(&self, line: &str) -> DecodeOutcome {
        match Sentence::parse(line) {
            Ok(sentence) => self.decode_sentence(&sentence),
            Err(e) => {
                debug!(error = %e, line, "dropping unparsable line");
                DecodeOutcome::Dropped(DropReason::Malformed(e.into()))
            }
        }
    }

    /// Dispatch a tokenized sentence on its talker
    pub fn decode_sentence(&self, sentence: &Sentence) -> DecodeOutcome {
        let result = match sentence.talker() {
            Pflau::TALKER => self.decode_pflau(sentence),
            Pflaa::TALKER => self.decode_pflaa(sentence),
            _ => return DecodeOutcome::Ignored,
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(error = %e, sentence = %sentence, "dropping traffic sentence");
                DecodeOutcome::Dropped(DropReason::Malformed(e))
            }
        }
    }

    fn decode_pflau(&self, sentence: &Sentence) -> Result<DecodeOutcome, DecodeError> {
        let pflau = Pflau::parse(sentence)?;
        let (Some(relative_bearing), Some(relative_vertical), Some(distance_m), Some(id)) = (
            pflau.relative_bearing,
            pflau.relative_vertical,
            pflau.relative_distance,
            pflau.id,
        ) else {
            return Err(DecodeError::NoTarget);
        };

        self.messages.append(LoggedMessage::ogn(sentence.to_string()));

        let situation = self.ownship.situation();
        if !situation.gps_valid {
            debug!(id = %id, "no GPS fix, dropping PFLAU");
            return Ok(DecodeOutcome::Dropped(DropReason::GpsUnavailable));
        }

        let bearing = normalize_bearing(situation.true_course + f64::from(relative_bearing));
        let distance_m = f64::from(distance_m);
        let (latitude, longitude) = project_position(
            situation.latitude,
            situation.longitude,
            bearing,
            distance_m / METERS_PER_NM,
        );
        let (altitude_ft, alt_is_gnss) =
            altitude_from_relative(&situation, f64::from(relative_vertical));

        let report = TrafficReport {
            address: id.address,
            address_type: None,
            device_id: format!("{:06X}", id.address),
            tail: id.tail,
            latitude,
            longitude,
            altitude_ft,
            alt_is_gnss,
            range: Some((distance_m, bearing)),
            motion: None,
            emitter_category: None,
        };

        // The ID type is not part of PFLAU; whichever namespace already
        // holds the address wins.
        let outcome = self.registry.upsert_matching(
            TrafficKey::icao(id.address),
            &[TrafficKey::non_icao(id.address)],
            report,
            TrafficSource::Ogn,
        );
        Ok(outcome.into())
    }

    fn decode_pflaa(&self, sentence: &Sentence) -> Result<DecodeOutcome, DecodeError> {
        sentence.require_len(Pflaa::MIN_FIELDS)?;
        self.messages.append(LoggedMessage::ogn(sentence.to_string()));

        let pflaa = Pflaa::parse(sentence)?;
        let situation = self.ownship.situation();

        let (latitude, longitude) = offset_position(
            situation.latitude,
            situation.longitude,
            f64::from(pflaa.relative_north.unwrap_or(0)),
            f64::from(pflaa.relative_east.unwrap_or(0)),
        );
        let (altitude_ft, alt_is_gnss) =
            altitude_from_relative(&situation, f64::from(pflaa.relative_vertical.unwrap_or(0)));

        let range = situation.gps_valid.then(|| {
            let geometry =
                rect_distance_bearing(situation.latitude, situation.longitude, latitude, longitude);
            (geometry.distance_m, geometry.bearing_deg)
        });

        let motion = Motion {
            track_deg: pflaa.track.unwrap_or(0.0),
            turn_rate: pflaa.turn_rate.unwrap_or(0.0),
            speed_knots: (pflaa.ground_speed.unwrap_or(0.0) * KNOTS_PER_MPS).round() as u16,
            vvel_fpm: (pflaa.climb_rate.unwrap_or(0.0) * FPM_PER_MPS).round() as i16,
        };

        let report = TrafficReport {
            address: pflaa.id.address,
            address_type: Some(AddressType::from_pflaa_id_type(pflaa.id_type)),
            device_id: format!("{:06X}", pflaa.id.address),
            tail: pflaa.id.tail,
            latitude,
            longitude,
            altitude_ft,
            alt_is_gnss,
            range,
            motion: Some(motion),
            emitter_category: EmitterCategory::from_aircraft_type(pflaa.aircraft_type),
        };

        let key = TrafficKey::new(pflaa.id_type, pflaa.id.address);
        Ok(self.registry.upsert(key, report, TrafficSource::Ogn).into())
    }
}
