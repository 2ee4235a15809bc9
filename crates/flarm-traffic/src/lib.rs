//! Traffic fusion for a FLARM data port bridge
//!
//! This crate owns the traffic picture. Inbound `PFLAU`/`PFLAA` reports are
//! decoded into a [`TrafficRegistry`], reconciled with what primary sources
//! (1090ES, UAT) already wrote there, and turned back into sentences for
//! EFBs and glider computers.
//!
//! - [`geo`]: flat-earth distance, bearing and position offsets
//! - [`alarm`]: proximity alarm levels and datum-aware vertical separation
//! - [`registry`]: the locked entity table and its merge policy
//! - [`decode`]: inbound sentences into registry updates
//! - [`encode`]: registry snapshots into outbound sentences
//!
//! Own-ship state comes from an [`OwnshipSource`]; tail lookup, raw
//! message logging and update notification go through the traits in
//! [`sinks`].

pub mod alarm;
pub mod decode;
pub mod encode;
pub mod entity;
pub mod error;
pub mod geo;
pub mod registry;
pub mod sinks;
pub mod situation;

pub use alarm::{alarm_level, altitude_from_relative, relative_vertical_m, AlarmLevel};
pub use decode::{DecodeOutcome, DropReason, TrafficDecoder};
pub use encode::{
    assess, gpgga_for, gprmc_for, most_severe_threat, pflaa_for, pflau_for, report_sentences,
    Assessment,
};
pub use entity::{AddressType, EmitterCategory, TrafficEntity, TrafficKey, TrafficSource};
pub use error::DecodeError;
pub use geo::{project_position, rect_distance_bearing, RectGeometry};
pub use registry::{Motion, TrafficRegistry, TrafficReport, Upsert, PRIMARY_FRESHNESS_SECS};
pub use sinks::{
    LoggedMessage, MessageClass, MessageLog, NoTails, NullMessageLog, NullObserver,
    RingMessageLog, TailLookup, TrafficObserver, FLARM_ORIGIN,
};
pub use situation::{OwnshipSource, SharedSituation, Situation};
