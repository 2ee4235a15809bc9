//! Collaborators the registry and decoder report to
//!
//! Tail lookup, the raw message log and traffic notifications are owned by
//! the surrounding application. Each is a small trait with a no-op
//! implementation so the core can run standalone.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{TrafficEntity, TrafficKey};

/// Origin tag passed to [`TailLookup`] for FLARM/OGN device IDs
pub const FLARM_ORIGIN: &str = "FLR";

/// Registration lookup by device ID
pub trait TailLookup: Send + Sync {
    /// Tail number for `device_id` (six uppercase hex digits) under `origin`
    fn tail_number(&self, device_id: &str, origin: &str) -> Option<String>;
}

/// Receives every accepted traffic update
pub trait TrafficObserver: Send + Sync {
    fn traffic_updated(&self, key: TrafficKey, entity: &TrafficEntity);
}

/// Class of a logged raw message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageClass {
    /// FLARM/OGN tracker sentence
    Ogn,
}

/// A raw received line with its receive time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedMessage {
    pub class: MessageClass,
    pub received_at: DateTime<Utc>,
    pub raw: String,
}

impl LoggedMessage {
    pub fn ogn(raw: impl Into<String>) -> Self {
        Self {
            class: MessageClass::Ogn,
            received_at: Utc::now(),
            raw: raw.into(),
        }
    }
}

/// Append-only record of raw traffic messages
pub trait MessageLog: Send + Sync {
    fn append(&self, message: LoggedMessage);
}

/// A [`TailLookup`] that never knows a tail
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTails;

impl TailLookup for NoTails {
    fn tail_number(&self, _device_id: &str, _origin: &str) -> Option<String> {
        None
    }
}

/// A [`TrafficObserver`] that ignores updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl TrafficObserver for NullObserver {
    fn traffic_updated(&self, _key: TrafficKey, _entity: &TrafficEntity) {}
}

/// A [`MessageLog`] that discards messages
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMessageLog;

impl MessageLog for NullMessageLog {
    fn append(&self, _message: LoggedMessage) {}
}

/// Bounded in-memory [`MessageLog`] keeping the most recent messages
#[derive(Debug)]
pub struct RingMessageLog {
    capacity: usize,
    messages: Mutex<VecDeque<LoggedMessage>>,
}

impl RingMessageLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            messages: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    /// Copy of the retained messages, oldest first
    pub fn messages(&self) -> Vec<LoggedMessage> {
        let messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageLog for RingMessageLog {
    fn append(&self, message: LoggedMessage) {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        if messages.len() == self.capacity {
            messages.pop_front();
        }
        messages.push_back(message);
    }
}
