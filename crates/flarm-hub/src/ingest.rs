//! Inbound tracker streams over TCP
//!
//! A network-attached tracker (OGN tracker, SoftRF) connects and streams
//! NMEA lines. Each connection runs in its own task; lines are decoded in
//! arrival order, with no ordering between connections. While connected,
//! the tracker is also reported as the GPS source.

use std::net::SocketAddr;
use std::time::Duration;

use flarm_protocol::NmeaCodec;
use flarm_traffic::TrafficDecoder;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

use crate::error::HubError;
use crate::status::GpsStatus;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts inbound NMEA connections and feeds the decoder
#[derive(Debug)]
pub struct IngestListener {
    listener: TcpListener,
    decoder: TrafficDecoder,
    status: GpsStatus,
    idle_timeout: Option<Duration>,
}

impl IngestListener {
    /// Bind the listening socket
    ///
    /// With `idle_timeout` set, a connection that stays silent that long is
    /// closed; without it a silent peer is kept until it disconnects.
    pub async fn bind(
        addr: impl ToSocketAddrs + std::fmt::Display + Copy,
        decoder: TrafficDecoder,
        status: GpsStatus,
        idle_timeout: Option<Duration>,
    ) -> Result<Self, HubError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HubError::bind(addr, e))?;
        Ok(Self {
            listener,
            decoder,
            status,
            idle_timeout,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept tracker connections forever
    pub async fn run(self) {
        if let Ok(addr) = self.local_addr() {
            info!("NMEA input listening on {}", addr);
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let decoder = self.decoder.clone();
                    let status = self.status.clone();
                    let idle_timeout = self.idle_timeout;
                    tokio::spawn(async move {
                        read_tracker(stream, peer, decoder, status, idle_timeout).await;
                    });
                }
                Err(e) => {
                    warn!("Input accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

async fn read_tracker(
    mut stream: TcpStream,
    peer: SocketAddr,
    decoder: TrafficDecoder,
    status: GpsStatus,
    idle_timeout: Option<Duration>,
) {
    info!("Tracker connected from {}", peer);
    status.network_connected(peer.ip());

    let mut codec = NmeaCodec::new();
    let mut buffer = vec![0u8; 1024];

    loop {
        let read = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, stream.read(&mut buffer)).await {
                Ok(read) => read,
                Err(_) => {
                    info!("Tracker {} idle for {:?}, closing", peer, limit);
                    break;
                }
            },
            None => stream.read(&mut buffer).await,
        };

        match read {
            Ok(0) => break,
            Ok(n) => {
                status.network_active();
                codec.push_bytes(&buffer[..n]);
                while let Some(line) = codec.next_line() {
                    let outcome = decoder.decode_line(&line);
                    debug!("{}: {:?}", peer, outcome);
                }
            }
            Err(e) => {
                warn!("Read from tracker {} failed: {}", peer, e);
                break;
            }
        }
    }

    status.network_disconnected();
    info!("Tracker {} disconnected", peer);
}
