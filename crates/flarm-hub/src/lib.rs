//! NMEA Distribution Hub
//!
//! This crate is the async side of the bridge. It moves sentences between
//! the traffic core and the network:
//!
//! - [`broadcast`]: the broadcaster actor and its bounded publish queue
//! - [`output`]: TCP output server with the `PASS?`/`AOK` greeting
//! - [`udp`]: best-effort datagram output
//! - [`ingest`]: TCP listener for network-attached trackers
//! - [`serial`]: reader for a directly attached FLARM device
//! - [`reporter`]: periodic sentence generation from the registry
//! - [`status`]: the GPS connection status record
//!
//! # Architecture
//!
//! ```text
//!  tracker ──TCP──▶ IngestListener ─┐
//!  FLARM ──serial─▶ SerialIngest ───┼──▶ TrafficDecoder ──▶ TrafficRegistry
//!                                   │                              │
//!                                   │                       TrafficReporter
//!                                   │                              │
//!                                   │                          NmeaOutput
//!                                   │                         ┌────┴────┐
//!                                   │                     UdpSender  Publisher
//!                                   │                                   │
//!                                   │                            run_broadcaster
//!                                   │                                   │
//!                                   └── GpsStatus              OutputServer clients
//! ```
//!
//! Every task is independent: a connection ends on error or close without
//! affecting the listener or other connections.

pub mod broadcast;
pub mod error;
pub mod ingest;
pub mod output;
pub mod reporter;
pub mod serial;
pub mod status;
pub mod udp;

pub use broadcast::{
    broadcast_channel, run_broadcaster, BroadcastHandle, Broadcaster, ClientHandle, Message,
    Publisher,
};
pub use error::HubError;
pub use ingest::IngestListener;
pub use output::{ConnectionState, OutputServer, ACKNOWLEDGE, CHALLENGE};
pub use reporter::{NmeaOutput, TrafficReporter};
pub use serial::SerialIngest;
pub use status::{GpsConnection, GpsStatus, GPS_TYPE_NETWORK};
pub use udp::UdpSender;
