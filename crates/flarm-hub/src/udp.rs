//! Best-effort UDP output
//!
//! Every sentence is also sent as one datagram to a fixed target, usually
//! the local broadcast address. Nothing is queued and send errors are
//! ignored: a missed datagram is superseded by the next report anyway.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::trace;

use crate::error::HubError;

/// Fire-and-forget datagram sender
#[derive(Debug)]
pub struct UdpSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSender {
    /// Bind an ephemeral socket that sends to `target`
    pub async fn bind(target: SocketAddr) -> Result<Self, HubError> {
        let local = if target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| HubError::bind(local, e))?;
        socket.set_broadcast(true)?;
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send one datagram without waiting; failures are dropped
    pub fn send(&self, message: &str) {
        if let Err(e) = self.socket.try_send_to(message.as_bytes(), self.target) {
            trace!("UDP send to {} failed: {}", self.target, e);
        }
    }
}
