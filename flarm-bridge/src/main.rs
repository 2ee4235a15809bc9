//! FLARM Bridge Daemon
//!
//! Accepts FLARM/OGN tracker streams over TCP and serial, fuses them into
//! the traffic registry and serves the resulting NMEA picture to EFBs over
//! TCP and UDP.

mod collaborators;
mod settings;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use collaborators::{LoggingObserver, TailDatabase};
use flarm_hub::{
    broadcast_channel, run_broadcaster, GpsStatus, IngestListener, NmeaOutput, OutputServer,
    SerialIngest, TrafficReporter, UdpSender,
};
use flarm_traffic::{
    NoTails, RingMessageLog, SharedSituation, TailLookup, TrafficDecoder, TrafficRegistry,
};
use settings::Settings;
use tracing::{error, info, warn};

/// Raw tracker sentences kept for inspection
const MESSAGE_LOG_CAPACITY: usize = 1000;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "flarm_bridge=info,flarm_protocol=info,flarm_traffic=info,flarm_hub=info".into()
            }),
        )
        .init();

    info!("Starting FLARM bridge");

    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(settings_path.as_deref());

    let registry = Arc::new(TrafficRegistry::new(
        load_tails(&settings),
        Arc::new(LoggingObserver),
    ));
    // Updated by the GPS source; until then traffic is placed relative to an
    // invalid fix and PFLAU reports are dropped
    let ownship = Arc::new(SharedSituation::default());
    let messages = Arc::new(RingMessageLog::new(MESSAGE_LOG_CAPACITY));
    let decoder = TrafficDecoder::new(Arc::clone(&registry), ownship.clone(), messages);
    let status = GpsStatus::new();

    let (hub, broadcaster) = broadcast_channel(settings.publish_queue_capacity);
    tokio::spawn(run_broadcaster(broadcaster));

    match OutputServer::bind(
        settings.output_bind.as_str(),
        hub.clone(),
        settings.client_queue_capacity,
    )
    .await
    {
        Ok(server) => {
            tokio::spawn(server.run());
        }
        Err(e) => error!("NMEA output disabled: {}", e),
    }

    match IngestListener::bind(
        settings.input_bind.as_str(),
        decoder.clone(),
        status.clone(),
        settings.ingest_idle_timeout(),
    )
    .await
    {
        Ok(listener) => {
            tokio::spawn(listener.run());
        }
        Err(e) => error!("NMEA input disabled: {}", e),
    }

    if let Some(serial) = &settings.serial {
        match SerialIngest::open(&serial.port, serial.baud_rate, decoder.clone()) {
            Ok(reader) => {
                tokio::spawn(reader.run());
            }
            Err(e) => error!("Failed to open {}: {}", serial.port, e),
        }
    }

    let udp = if settings.udp_enabled {
        open_udp(&settings.udp_target).await
    } else {
        None
    };

    let reporter = TrafficReporter::new(
        Arc::clone(&registry),
        ownship,
        NmeaOutput::new(udp, hub.publisher()),
        settings.report_interval(),
    );
    tokio::spawn(reporter.run());
    tokio::spawn(reap_stale(
        Arc::clone(&registry),
        settings.report_interval(),
        settings.stale_after_secs,
    ));

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for shutdown signal: {}", e);
    }
    info!("Shutting down, GPS status {:?}", status.snapshot());
}

fn load_tails(settings: &Settings) -> Arc<dyn TailLookup> {
    let Some(path) = &settings.tail_database else {
        return Arc::new(NoTails);
    };
    match TailDatabase::load(path) {
        Ok(database) => {
            if database.is_empty() {
                warn!("Tail database {} has no entries", path.display());
            }
            Arc::new(database)
        }
        Err(e) => {
            warn!("Tail lookup disabled: {}", e);
            Arc::new(NoTails)
        }
    }
}

async fn open_udp(target: &str) -> Option<UdpSender> {
    let target: SocketAddr = match target.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid UDP target {}: {}", target, e);
            return None;
        }
    };
    match UdpSender::bind(target).await {
        Ok(sender) => Some(sender),
        Err(e) => {
            error!("UDP output disabled: {}", e);
            None
        }
    }
}

/// Forget traffic not heard from within `max_age_secs`
async fn reap_stale(registry: Arc<TrafficRegistry>, period: Duration, max_age_secs: f64) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let seen = registry.drain_seen();
        registry.refresh_ages(Instant::now());
        let removed = registry.remove_stale(max_age_secs);
        if removed > 0 {
            info!(
                "Removed {} stale targets, {} updated this cycle, {} tracked",
                removed,
                seen.len(),
                registry.len()
            );
        }
    }
}
