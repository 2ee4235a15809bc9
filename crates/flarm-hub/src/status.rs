//! GPS connection status record
//!
//! A network-attached tracker doubles as the GPS source. While it is
//! connected the status shows transport type "network" and the peer's IP;
//! whoever decodes the tracker's position sentences may add protocol bits
//! in the upper nibble.

use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Transport type of a GPS fed over the network
pub const GPS_TYPE_NETWORK: u8 = 0x0C;
/// Bits of the detected type that describe the protocol, not the transport
pub const GPS_PROTOCOL_MASK: u8 = 0xF0;

/// Snapshot of the GPS connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GpsConnection {
    /// Transport in the low nibble, detected protocol in the high nibble
    pub detected_type: u8,
    pub connected: bool,
    /// Peer IP of a network GPS, without port
    pub remote_ip: String,
}

/// Shared, cloneable GPS connection status
#[derive(Debug, Clone, Default)]
pub struct GpsStatus {
    inner: Arc<Mutex<GpsConnection>>,
}

impl GpsStatus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GpsConnection> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> GpsConnection {
        self.lock().clone()
    }

    /// A network GPS connected from `ip`; any previous type is overridden
    pub fn network_connected(&self, ip: IpAddr) {
        let mut status = self.lock();
        status.detected_type = GPS_TYPE_NETWORK;
        status.connected = true;
        status.remote_ip = ip.to_string();
    }

    /// Data arrived from the network GPS; keeps detected protocol bits
    pub fn network_active(&self) {
        let mut status = self.lock();
        status.connected = true;
        status.detected_type = GPS_TYPE_NETWORK | (status.detected_type & GPS_PROTOCOL_MASK);
    }

    /// Write protocol bits the way the position decoder does
    #[cfg(test)]
    pub(crate) fn set_protocol(&self, bits: u8) {
        let mut status = self.lock();
        status.detected_type =
            (status.detected_type & !GPS_PROTOCOL_MASK) | (bits & GPS_PROTOCOL_MASK);
    }

    /// The network GPS went away
    pub fn network_disconnected(&self) {
        *self.lock() = GpsConnection::default();
    }
}
