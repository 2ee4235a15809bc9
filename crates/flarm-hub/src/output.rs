//! TCP output server
//!
//! EFBs such as SkyDemon or RunwayHD connect here expecting an AIR Connect
//! style greeting: the server sends `PASS?`, then `AOK`, then streams NMEA.
//! The passcode itself is never checked; several apps send it without a
//! line terminator, so waiting for it only breaks them.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

use crate::broadcast::BroadcastHandle;
use crate::error::HubError;

/// Greeting sent on accept
pub const CHALLENGE: &[u8] = b"PASS?";
/// Sent right after the challenge, whatever the client answers
pub const ACKNOWLEDGE: &[u8] = b"AOK";

/// Back-off after a failed accept, so fd exhaustion does not spin
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Lifecycle of one output connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitingHandshake,
    Active,
    Closed,
}

/// Accepts output clients and attaches them to the broadcaster
#[derive(Debug)]
pub struct OutputServer {
    listener: TcpListener,
    hub: BroadcastHandle,
    client_queue_capacity: usize,
}

impl OutputServer {
    /// Bind the listening socket
    pub async fn bind(
        addr: impl ToSocketAddrs + std::fmt::Display + Copy,
        hub: BroadcastHandle,
        client_queue_capacity: usize,
    ) -> Result<Self, HubError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HubError::bind(addr, e))?;
        Ok(Self {
            listener,
            hub,
            client_queue_capacity,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept clients forever
    pub async fn run(self) {
        if let Ok(addr) = self.local_addr() {
            info!("NMEA output listening on {}", addr);
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let hub = self.hub.clone();
                    let capacity = self.client_queue_capacity;
                    tokio::spawn(async move {
                        serve_client(stream, peer, hub, capacity).await;
                    });
                }
                Err(e) => {
                    warn!("Output accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

async fn serve_client(
    mut stream: TcpStream,
    peer: SocketAddr,
    hub: BroadcastHandle,
    capacity: usize,
) {
    let mut state = ConnectionState::AwaitingHandshake;
    debug!("{} connected, state {:?}", peer, state);

    if let Err(e) = handshake(&mut stream).await {
        debug!("Handshake with {} failed: {}", peer, e);
        return;
    }

    let Some((handle, mut rx)) = hub.subscribe(capacity).await else {
        return;
    };
    state = ConnectionState::Active;
    info!("Output client {} connected as {}", peer, handle);

    let (mut reader, mut writer) = stream.into_split();
    let mut discard = [0u8; 256];
    // A half-closed client still gets traffic until a write fails
    let mut reading = true;

    while state == ConnectionState::Active {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else {
                    state = ConnectionState::Closed;
                    continue;
                };
                if let Err(e) = writer.write_all(message.as_bytes()).await {
                    debug!("Write to {} failed: {}", peer, e);
                    state = ConnectionState::Closed;
                }
            }

            // Clients may answer the challenge or chatter; input is ignored
            read = reader.read(&mut discard), if reading => {
                match read {
                    Ok(0) => {
                        debug!("{} closed its write side", peer);
                        reading = false;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Read from {} failed: {}", peer, e);
                        state = ConnectionState::Closed;
                    }
                }
            }
        }
    }

    hub.unsubscribe(handle).await;
    info!("Output client {} ({}) closed", peer, handle);
}

async fn handshake(stream: &mut TcpStream) -> std::io::Result<()> {
    stream.write_all(CHALLENGE).await?;
    stream.write_all(ACKNOWLEDGE).await?;
    stream.flush().await
}
