//! Daemon settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A directly attached FLARM device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialSettings {
    /// Serial port path
    pub port: String,
    /// Baud rate
    #[serde(default = "default_serial_baud")]
    pub baud_rate: u32,
}

fn default_serial_baud() -> u32 {
    38400
}

/// Bridge settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Listen address for NMEA output clients
    pub output_bind: String,
    /// Listen address for inbound tracker streams
    pub input_bind: String,
    /// Datagram destination for generated sentences
    pub udp_target: String,
    pub udp_enabled: bool,
    pub serial: Option<SerialSettings>,
    /// Messages the broadcaster may have queued before publishers drop
    pub publish_queue_capacity: usize,
    /// Messages queued per output client before that client drops
    pub client_queue_capacity: usize,
    pub report_interval_ms: u64,
    /// Close inbound connections silent for this long
    pub ingest_idle_timeout_secs: Option<u64>,
    /// JSON object of device ID to tail number
    pub tail_database: Option<PathBuf>,
    /// Drop traffic not heard from for this long
    pub stale_after_secs: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_bind: "0.0.0.0:2000".to_string(),
            input_bind: "0.0.0.0:30011".to_string(),
            udp_target: "255.255.255.255:10110".to_string(),
            udp_enabled: true,
            serial: None,
            publish_queue_capacity: 1024,
            client_queue_capacity: 64,
            report_interval_ms: 1000,
            ingest_idle_timeout_secs: None,
            tail_database: None,
            stale_after_secs: 60.0,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for the bridge
    /// Uses $XDG_CONFIG_HOME/flarm-bridge, falls back to ~/.config/flarm-bridge
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("flarm-bridge"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("flarm-bridge"))
    }

    /// Default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from `path`, or the default location
    ///
    /// A missing or unreadable file yields defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            warn!("No settings path available, using defaults");
            return Self::default();
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                info!("No settings at {} ({}), using defaults", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("Invalid settings in {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms.max(1))
    }

    pub fn ingest_idle_timeout(&self) -> Option<Duration> {
        self.ingest_idle_timeout_secs.map(Duration::from_secs)
    }
}
