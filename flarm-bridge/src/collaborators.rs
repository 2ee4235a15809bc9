//! Collaborator implementations for the daemon
//!
//! The traffic core only knows the traits; these are the versions the
//! bridge process plugs in.

use std::collections::HashMap;
use std::path::Path;

use flarm_traffic::{TailLookup, TrafficEntity, TrafficKey, TrafficObserver};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum TailDatabaseError {
    #[error("failed to read tail database: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tail database: {0}")]
    Json(#[from] serde_json::Error),
}

/// Device ID to registration table loaded from a JSON object
///
/// Keys are device IDs as six hex digits, optionally prefixed with an origin
/// tag (`FLR_DD8F12`). Unprefixed entries match any origin.
#[derive(Debug, Clone, Default)]
pub struct TailDatabase {
    tails: HashMap<String, String>,
}

impl TailDatabase {
    pub fn load(path: &Path) -> Result<Self, TailDatabaseError> {
        let text = std::fs::read_to_string(path)?;
        let database = Self::from_json(&text)?;
        info!("Loaded {} tails from {}", database.len(), path.display());
        Ok(database)
    }

    pub fn from_json(text: &str) -> Result<Self, TailDatabaseError> {
        let raw: HashMap<String, String> = serde_json::from_str(text)?;
        let tails = raw
            .into_iter()
            .filter(|(_, tail)| !tail.trim().is_empty())
            .map(|(id, tail)| (id.trim().to_ascii_uppercase(), tail.trim().to_string()))
            .collect();
        Ok(Self { tails })
    }

    pub fn len(&self) -> usize {
        self.tails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tails.is_empty()
    }
}

impl TailLookup for TailDatabase {
    fn tail_number(&self, device_id: &str, origin: &str) -> Option<String> {
        let device_id = device_id.to_ascii_uppercase();
        self.tails
            .get(&format!("{}_{}", origin, device_id))
            .or_else(|| self.tails.get(&device_id))
            .cloned()
    }
}

/// Logs each accepted traffic update at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl TrafficObserver for LoggingObserver {
    fn traffic_updated(&self, key: TrafficKey, entity: &TrafficEntity) {
        debug!(
            key = %key,
            tail = entity.tail.as_deref().unwrap_or(""),
            source = ?entity.last_source,
            lat = entity.latitude,
            lon = entity.longitude,
            alt_ft = entity.altitude_ft,
            "traffic updated"
        );
    }
}
