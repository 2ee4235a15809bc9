//! Periodic traffic reports
//!
//! Once per interval the reporter refreshes entity ages, snapshots the
//! registry and sends own-ship position, every target and the status
//! sentence through [`NmeaOutput`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use flarm_traffic::{report_sentences, OwnshipSource, TrafficRegistry};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::broadcast::Publisher;
use crate::udp::UdpSender;

/// Where generated sentences go: UDP and the TCP broadcaster
#[derive(Debug, Clone)]
pub struct NmeaOutput {
    udp: Option<Arc<UdpSender>>,
    publisher: Publisher,
}

impl NmeaOutput {
    pub fn new(udp: Option<UdpSender>, publisher: Publisher) -> Self {
        Self {
            udp: udp.map(Arc::new),
            publisher,
        }
    }

    /// Send one framed sentence to every output
    ///
    /// The datagram goes out regardless of TCP clients; the TCP copy is
    /// dropped if the publish queue is full.
    pub fn send_nmea(&self, sentence: &str) {
        if let Some(udp) = &self.udp {
            udp.send(sentence);
        }
        self.publisher.publish(sentence);
    }
}

/// Turns the traffic picture into sentences at a fixed rate
pub struct TrafficReporter {
    registry: Arc<TrafficRegistry>,
    ownship: Arc<dyn OwnshipSource>,
    output: NmeaOutput,
    period: Duration,
}

impl TrafficReporter {
    pub fn new(
        registry: Arc<TrafficRegistry>,
        ownship: Arc<dyn OwnshipSource>,
        output: NmeaOutput,
        period: Duration,
    ) -> Self {
        Self {
            registry,
            ownship,
            output,
            period,
        }
    }

    /// Produce and send one report, returning the number of sentences
    pub fn report_once(&self) -> usize {
        self.registry.refresh_ages(Instant::now());
        let traffic = self.registry.snapshot_all();
        let situation = self.ownship.situation();

        let sentences = report_sentences(&traffic, &situation, Utc::now().date_naive());
        for sentence in &sentences {
            self.output.send_nmea(sentence);
        }
        debug!("Reported {} targets", traffic.len());
        sentences.len()
    }

    /// Report forever at the configured period
    pub async fn run(self) {
        info!("Reporting traffic every {:?}", self.period);
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.report_once();
        }
    }
}
