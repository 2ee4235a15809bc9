//! Error types for the distribution hub and listeners

use thiserror::Error;

/// Errors that can occur while starting or running a hub service
#[derive(Debug, Error)]
pub enum HubError {
    /// Listener or socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
}

impl HubError {
    pub(crate) fn bind(addr: impl ToString, source: std::io::Error) -> Self {
        HubError::Bind {
            addr: addr.to_string(),
            source,
        }
    }
}
