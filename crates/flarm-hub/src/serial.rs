//! Directly attached FLARM device
//!
//! A FLARM or SoftRF unit on a serial port streams the same sentences as a
//! network tracker. The reader is generic over the I/O type so tests can
//! drive it through `tokio::io::duplex()`.

use std::io::ErrorKind;
use std::time::Duration;

use flarm_protocol::NmeaCodec;
use flarm_traffic::TrafficDecoder;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use crate::error::HubError;

/// Reads NMEA from a serial device into the decoder
#[derive(Debug)]
pub struct SerialIngest<T> {
    port_name: String,
    io: T,
    decoder: TrafficDecoder,
    codec: NmeaCodec,
}

impl SerialIngest<SerialStream> {
    /// Open a serial port
    pub fn open(port_name: &str, baud_rate: u32, decoder: TrafficDecoder) -> Result<Self, HubError> {
        let stream = tokio_serial::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open_native_async()?;
        Ok(Self::new(port_name.to_string(), stream, decoder))
    }
}

impl<T> SerialIngest<T>
where
    T: AsyncRead + Unpin + Send,
{
    /// Create a reader over any byte stream
    pub fn new(port_name: String, io: T, decoder: TrafficDecoder) -> Self {
        Self {
            port_name,
            io,
            decoder,
            codec: NmeaCodec::new(),
        }
    }

    /// Read until the device goes away
    pub async fn run(mut self) {
        info!("Reading FLARM data on {}", self.port_name);
        let mut buffer = vec![0u8; 1024];

        loop {
            match self.io.read(&mut buffer).await {
                Ok(0) => {
                    debug!("{} reached end of stream", self.port_name);
                    break;
                }
                Ok(n) => {
                    self.codec.push_bytes(&buffer[..n]);
                    while let Some(line) = self.codec.next_line() {
                        self.decoder.decode_line(&line);
                    }
                }
                // Serial reads time out when the device is quiet
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {}
                Err(e) => {
                    warn!("Read error on {}: {}", self.port_name, e);
                    break;
                }
            }
        }

        info!("Stopped reading {}", self.port_name);
    }
}
