//! Traffic registry and merge policy
//!
//! The registry is the single owner of the traffic table. Every read-merge-
//! write cycle runs under one registry-wide lock, so an upsert is atomic
//! with respect to other upserts and to snapshot reads. Callers never see
//! the map itself.
//!
//! Reports from this pipeline are secondary: an entity recently written by
//! a primary source (1090ES) is left alone, and a registration-like tail
//! (longer than 3 characters) is never overwritten.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, trace};

use crate::entity::{AddressType, EmitterCategory, TrafficEntity, TrafficKey, TrafficSource};
use crate::sinks::{NoTails, NullObserver, TailLookup, TrafficObserver, FLARM_ORIGIN};

/// Age in seconds below which a primary-source entity is not overwritten
pub const PRIMARY_FRESHNESS_SECS: f64 = 5.0;

/// Tails up to this length are considered placeholders and may be replaced
pub const PLACEHOLDER_TAIL_LEN: usize = 3;

/// Ground track and speeds of a report
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    /// Degrees true
    pub track_deg: f64,
    /// Degrees per second
    pub turn_rate: f64,
    pub speed_knots: u16,
    /// Feet per minute
    pub vvel_fpm: i16,
}

/// Fields an inbound tracker report contributes to an entity
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrafficReport {
    pub address: u32,
    /// `None` keeps the stored address type
    pub address_type: Option<AddressType>,
    /// Normalized device ID used for tail lookup
    pub device_id: String,
    /// Tail carried in the sentence (`ID!TAIL`)
    pub tail: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_ft: i32,
    pub alt_is_gnss: bool,
    /// Distance (m) and bearing (deg) from own-ship, when own GPS is valid
    pub range: Option<(f64, f64)>,
    pub motion: Option<Motion>,
    /// `None` keeps the stored category
    pub emitter_category: Option<EmitterCategory>,
}

/// Result of an [`TrafficRegistry::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// New entity created at the key
    Inserted(TrafficKey),
    /// Existing entity updated
    Updated(TrafficKey),
    /// A fresh primary-source entity holds the key; report ignored
    Discarded(TrafficKey),
}

impl Upsert {
    pub fn key(&self) -> TrafficKey {
        match *self {
            Upsert::Inserted(k) | Upsert::Updated(k) | Upsert::Discarded(k) => k,
        }
    }

    pub fn is_applied(&self) -> bool {
        !matches!(self, Upsert::Discarded(_))
    }
}

#[derive(Debug, Default)]
struct Table {
    entities: HashMap<TrafficKey, TrafficEntity>,
    seen: HashSet<TrafficKey>,
}

/// Shared, internally locked traffic table
pub struct TrafficRegistry {
    table: Mutex<Table>,
    tails: Arc<dyn TailLookup>,
    observer: Arc<dyn TrafficObserver>,
}

impl Default for TrafficRegistry {
    fn default() -> Self {
        Self::new(Arc::new(NoTails), Arc::new(NullObserver))
    }
}

impl std::fmt::Debug for TrafficRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficRegistry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl TrafficRegistry {
    pub fn new(tails: Arc<dyn TailLookup>, observer: Arc<dyn TrafficObserver>) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            tails,
            observer,
        }
    }

    // A panic elsewhere while holding the lock leaves whole entities behind,
    // never half-written ones, so the table stays usable.
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge a secondary-source report into the entity at `key`
    pub fn upsert(&self, key: TrafficKey, report: TrafficReport, source: TrafficSource) -> Upsert {
        self.upsert_matching(key, &[], report, source)
    }

    /// Merge a report into the first existing entity among `key` and
    /// `alternates`, or create one at `key` when none exists
    pub fn upsert_matching(
        &self,
        key: TrafficKey,
        alternates: &[TrafficKey],
        report: TrafficReport,
        source: TrafficSource,
    ) -> Upsert {
        let (outcome, entity) = {
            let mut table = self.lock();

            let matched = std::iter::once(key)
                .chain(alternates.iter().copied())
                .find(|k| table.entities.contains_key(k));
            let target = matched.unwrap_or(key);

            let mut entity = match table.entities.get(&target) {
                Some(existing) => {
                    if existing.last_source.is_primary()
                        && existing.age_secs < PRIMARY_FRESHNESS_SECS
                    {
                        debug!(
                            key = %target,
                            age = existing.age_secs,
                            "primary source is fresh, discarding report"
                        );
                        return Upsert::Discarded(target);
                    }
                    existing.clone()
                }
                None => TrafficEntity::new(
                    report.address,
                    report.address_type.unwrap_or_else(|| target.address_type()),
                ),
            };

            self.apply(&mut entity, report, source);

            let outcome = if matched.is_some() {
                Upsert::Updated(target)
            } else {
                Upsert::Inserted(target)
            };
            table.entities.insert(target, entity.clone());
            table.seen.insert(target);
            (outcome, entity)
        };

        trace!(key = %outcome.key(), "traffic updated");
        self.observer.traffic_updated(outcome.key(), &entity);
        outcome
    }

    fn apply(&self, entity: &mut TrafficEntity, report: TrafficReport, source: TrafficSource) {
        if entity.tail_len() <= PLACEHOLDER_TAIL_LEN {
            match report.tail.filter(|t| !t.is_empty()) {
                Some(tail) => entity.tail = Some(tail),
                None => {
                    if let Some(tail) = self.tails.tail_number(&report.device_id, FLARM_ORIGIN) {
                        entity.tail = Some(tail);
                    }
                }
            }
        }

        entity.address = report.address & 0xFF_FFFF;
        if let Some(address_type) = report.address_type {
            entity.address_type = address_type;
        }

        entity.latitude = report.latitude;
        entity.longitude = report.longitude;
        entity.altitude_ft = report.altitude_ft;
        entity.alt_is_gnss = report.alt_is_gnss;
        entity.position_valid = true;
        entity.extrapolated = false;

        if let Some((distance_m, bearing_deg)) = report.range {
            entity.distance_m = distance_m;
            entity.bearing_deg = bearing_deg;
            entity.bearing_distance_valid = true;
        }

        if let Some(motion) = report.motion {
            entity.track_deg = motion.track_deg;
            entity.turn_rate = motion.turn_rate;
            entity.speed_knots = motion.speed_knots;
            entity.vvel_fpm = motion.vvel_fpm;
            entity.speed_valid = true;
        }

        if let Some(category) = report.emitter_category {
            entity.emitter_category = category;
        }

        let now = Instant::now();
        entity.last_source = source;
        entity.last_seen = now;
        entity.last_alt = now;
        entity.age_secs = 0.0;
        entity.timestamp = Utc::now();
    }

    /// Replace the entity at `key` as-is, for primary-source writers
    pub fn store(&self, key: TrafficKey, entity: TrafficEntity) {
        let mut table = self.lock();
        table.entities.insert(key, entity);
        table.seen.insert(key);
    }

    pub fn get(&self, key: TrafficKey) -> Option<TrafficEntity> {
        self.lock().entities.get(&key).cloned()
    }

    /// Copy of every entity, ordered by key
    pub fn snapshot_all(&self) -> Vec<(TrafficKey, TrafficEntity)> {
        let table = self.lock();
        let mut all: Vec<_> = table
            .entities
            .iter()
            .map(|(k, e)| (*k, e.clone()))
            .collect();
        drop(table);
        all.sort_by_key(|(k, _)| *k);
        all
    }

    pub fn len(&self) -> usize {
        self.lock().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the set of keys updated since the last call
    pub fn drain_seen(&self) -> HashSet<TrafficKey> {
        std::mem::take(&mut self.lock().seen)
    }

    /// Recompute every entity's age against `now`
    pub fn refresh_ages(&self, now: Instant) {
        let mut table = self.lock();
        for entity in table.entities.values_mut() {
            entity.age_secs = now.saturating_duration_since(entity.last_seen).as_secs_f64();
        }
    }

    /// Remove entities not seen for `max_age_secs`, returning how many went
    pub fn remove_stale(&self, max_age_secs: f64) -> usize {
        let mut table = self.lock();
        let before = table.entities.len();
        table.entities.retain(|_, e| e.age_secs < max_age_secs);
        before - table.entities.len()
    }
}
