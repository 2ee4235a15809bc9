//! Network tests for the distribution hub
//!
//! Every test binds ephemeral listeners on 127.0.0.1 and talks to them over
//! real sockets:
//! - Output handshake and streaming
//! - UDP datagram delivery
//! - Tracker ingestion and GPS status
//! - Serial ingestion over an in-memory stream
//! - Periodic reports

use std::sync::Arc;
use std::time::Duration;

use flarm_hub::{
    broadcast_channel, run_broadcaster, BroadcastHandle, GpsStatus, IngestListener, NmeaOutput,
    OutputServer, SerialIngest, TrafficReporter, UdpSender, ACKNOWLEDGE, CHALLENGE,
    GPS_TYPE_NETWORK,
};
use flarm_traffic::{
    NullMessageLog, SharedSituation, Situation, TrafficDecoder, TrafficKey, TrafficRegistry,
};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::{sleep, timeout};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub const WAIT: Duration = Duration::from_secs(2);

    pub fn ownship() -> Situation {
        Situation {
            gps_valid: true,
            latitude: 47.0,
            longitude: 8.0,
            fix_quality: 1,
            satellites: 8,
            baro_valid: true,
            baro_altitude_ft: 4000.0,
            ..Default::default()
        }
    }

    pub fn decoder() -> TrafficDecoder {
        TrafficDecoder::new(
            Arc::new(TrafficRegistry::default()),
            Arc::new(SharedSituation::new(ownship())),
            Arc::new(NullMessageLog),
        )
    }

    /// Broadcaster plus an output server on an ephemeral port
    pub async fn start_output() -> (BroadcastHandle, std::net::SocketAddr) {
        let (hub, broadcaster) = broadcast_channel(64);
        tokio::spawn(run_broadcaster(broadcaster));
        let server = OutputServer::bind("127.0.0.1:0", hub.clone(), 16)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());
        (hub, addr)
    }

    /// Connect and consume the greeting
    pub async fn connect_client(addr: std::net::SocketAddr) -> BufReader<TcpStream> {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut greeting = vec![0u8; CHALLENGE.len() + ACKNOWLEDGE.len()];
        timeout(WAIT, stream.read_exact(&mut greeting))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(greeting, b"PASS?AOK");
        BufReader::new(stream)
    }

    /// Publish `message` until the client sees it; registration is async
    pub async fn publish_until_received(
        hub: &BroadcastHandle,
        client: &mut BufReader<TcpStream>,
        message: &str,
    ) {
        let publisher = hub.publisher();
        for _ in 0..100 {
            publisher.publish(message);
            let mut line = String::new();
            if let Ok(Ok(n)) = timeout(Duration::from_millis(50), client.read_line(&mut line)).await
            {
                assert!(n > 0, "server closed the connection");
                assert_eq!(line, message);
                return;
            }
        }
        panic!("client never received {message:?}");
    }

    /// Poll `check` until it holds or the wait expires
    pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if check() {
                return true;
            }
            sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

// ============================================================================
// Output server
// ============================================================================

#[tokio::test]
async fn output_greets_then_streams() {
    let (hub, addr) = helpers::start_output().await;
    let mut client = helpers::connect_client(addr).await;

    helpers::publish_until_received(&hub, &mut client, "$PFLAU,0,1,2,1,0,,0,,,*4F\r\n").await;

    let message = "$GPGGA,,,,,,0,5,,,,,,,*47\r\n";
    hub.publisher().publish(message);
    let mut line = String::new();
    timeout(helpers::WAIT, client.read_line(&mut line))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line, message);
}

#[tokio::test]
async fn output_ignores_passcode_reply() {
    let (hub, addr) = helpers::start_output().await;
    let mut client = helpers::connect_client(addr).await;

    // Some apps answer with a PIN and no terminator
    client.get_mut().write_all(b"6000").await.unwrap();
    helpers::publish_until_received(&hub, &mut client, "$PFLAU,0,1,2,1,0,,0,,,*4F\r\n").await;
}

#[tokio::test]
async fn output_fans_out_to_every_client() {
    let (hub, addr) = helpers::start_output().await;
    let mut first = helpers::connect_client(addr).await;
    let mut second = helpers::connect_client(addr).await;

    helpers::publish_until_received(&hub, &mut first, "A\r\n").await;
    helpers::publish_until_received(&hub, &mut second, "B\r\n").await;

    // both registered now; one more message reaches both
    hub.publisher().publish("C\r\n");
    for client in [&mut first, &mut second] {
        let mut line = String::new();
        loop {
            line.clear();
            timeout(helpers::WAIT, client.read_line(&mut line))
                .await
                .unwrap()
                .unwrap();
            if line == "C\r\n" {
                break;
            }
        }
    }
}

#[tokio::test]
async fn output_survives_client_disconnect() {
    let (hub, addr) = helpers::start_output().await;
    let mut leaving = helpers::connect_client(addr).await;
    helpers::publish_until_received(&hub, &mut leaving, "X\r\n").await;
    drop(leaving);

    let mut staying = helpers::connect_client(addr).await;
    helpers::publish_until_received(&hub, &mut staying, "Y\r\n").await;
}

#[tokio::test]
async fn output_keeps_streaming_to_half_closed_client() {
    let (hub, addr) = helpers::start_output().await;
    let mut client = helpers::connect_client(addr).await;
    helpers::publish_until_received(&hub, &mut client, "A\r\n").await;

    // Listen-only clients may shut down their write side right away
    client.get_mut().shutdown().await.unwrap();
    sleep(Duration::from_millis(50)).await;

    hub.publisher().publish("B\r\n");
    let mut line = String::new();
    // skip any late duplicates of the registration message
    while line != "B\r\n" {
        line.clear();
        let n = timeout(helpers::WAIT, client.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();
        assert!(n > 0, "server closed a half-closed client");
    }
}

#[tokio::test]
async fn output_bind_failure_is_reported() {
    let (hub, addr) = helpers::start_output().await;
    let err = OutputServer::bind(addr, hub, 16).await.unwrap_err();
    assert!(matches!(err, flarm_hub::HubError::Bind { .. }));
}

// ============================================================================
// UDP
// ============================================================================

#[tokio::test]
async fn udp_sends_one_datagram_per_sentence() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let sender = UdpSender::bind(receiver.local_addr().unwrap()).await.unwrap();

    sender.send("$PFLAU,0,1,2,1,0,,0,,,*4F\r\n");
    let mut buf = [0u8; 128];
    let n = timeout(helpers::WAIT, receiver.recv(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[..n], b"$PFLAU,0,1,2,1,0,,0,,,*4F\r\n");
}

#[tokio::test]
async fn udp_errors_are_swallowed() {
    // Nothing listens on the target; sending must still not fail or block
    let target = {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.local_addr().unwrap()
    };
    let sender = UdpSender::bind(target).await.unwrap();
    for _ in 0..10 {
        sender.send("$PFLAU,0,1,2,1,0,,0,,,*4F\r\n");
    }
}

// ============================================================================
// Ingestion
// ============================================================================

#[tokio::test]
async fn ingest_decodes_lines_and_tracks_gps_status() {
    let decoder = helpers::decoder();
    let registry = Arc::clone(decoder.registry());
    let status = GpsStatus::new();

    let listener = IngestListener::bind("127.0.0.1:0", decoder, status.clone(), None)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener.run());

    let mut tracker = TcpStream::connect(addr).await.unwrap();
    // split across writes to exercise line reassembly
    tracker.write_all(b"$PFLAA,0,100,200,30,2,DD8F").await.unwrap();
    tracker.flush().await.unwrap();
    sleep(Duration::from_millis(20)).await;
    tracker
        .write_all(b"12!HB-ABC,90,0,25,0.5,1*00\r\n$GPRMC,ignored\r\n")
        .await
        .unwrap();

    let key = TrafficKey::new(2, 0xDD8F12);
    assert!(helpers::eventually(|| registry.get(key).is_some()).await);
    assert_eq!(registry.get(key).unwrap().tail.as_deref(), Some("HB-ABC"));

    let connected = status.snapshot();
    assert!(connected.connected);
    assert_eq!(connected.detected_type & 0x0F, GPS_TYPE_NETWORK);
    assert_eq!(connected.remote_ip, "127.0.0.1");

    drop(tracker);
    assert!(helpers::eventually(|| !status.snapshot().connected).await);
    assert_eq!(status.snapshot().remote_ip, "");
    assert_eq!(status.snapshot().detected_type, 0);
}

#[tokio::test]
async fn ingest_connections_are_independent() {
    let decoder = helpers::decoder();
    let registry = Arc::clone(decoder.registry());
    let listener = IngestListener::bind("127.0.0.1:0", decoder, GpsStatus::new(), None)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener.run());

    let mut garbage = TcpStream::connect(addr).await.unwrap();
    garbage.write_all(b"\xff\xfe$PFLAA,,,\r\nnot nmea\r\n").await.unwrap();

    let mut good = TcpStream::connect(addr).await.unwrap();
    good.write_all(b"PFLAA,0,100,200,30,2,ABCDEF,90,0,25,0.5,1\r\n")
        .await
        .unwrap();

    assert!(helpers::eventually(|| registry.get(TrafficKey::new(2, 0xABCDEF)).is_some()).await);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn ingest_idle_timeout_closes_silent_peer() {
    let listener = IngestListener::bind(
        "127.0.0.1:0",
        helpers::decoder(),
        GpsStatus::new(),
        Some(Duration::from_millis(100)),
    )
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener.run());

    let mut silent = TcpStream::connect(addr).await.unwrap();
    let mut buf = [0u8; 8];
    let n = timeout(helpers::WAIT, silent.read(&mut buf))
        .await
        .expect("server should close the idle connection")
        .unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn serial_ingest_reads_until_eof() {
    let decoder = helpers::decoder();
    let registry = Arc::clone(decoder.registry());
    let (mut device, port) = tokio::io::duplex(64);

    let reader = SerialIngest::new("/dev/ttyTEST".into(), port, decoder);
    let task = tokio::spawn(reader.run());

    device
        .write_all(b"$PFLAA,0,-50,75,10,2,123ABC,180,0,15,-0.4,7*00\r\n")
        .await
        .unwrap();
    drop(device);

    timeout(helpers::WAIT, task).await.unwrap().unwrap();
    let entity = registry.get(TrafficKey::new(2, 0x123ABC)).unwrap();
    assert_eq!(entity.track_deg, 180.0);
}

// ============================================================================
// Reporter
// ============================================================================

#[tokio::test]
async fn reporter_sends_full_cycle_over_udp_and_tcp() {
    let decoder = helpers::decoder();
    decoder.decode_line("PFLAA,0,300,0,20,2,DD8F12,90,0,25,0.5,1");
    decoder.decode_line("PFLAA,0,9000,0,20,2,ABCDEF,90,0,25,0.5,1");

    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let udp = UdpSender::bind(receiver.local_addr().unwrap()).await.unwrap();

    let (hub, broadcaster) = broadcast_channel(64);
    tokio::spawn(run_broadcaster(broadcaster));
    let (_client, mut rx) = hub.subscribe(64).await.unwrap();

    let reporter = TrafficReporter::new(
        Arc::clone(decoder.registry()),
        Arc::new(SharedSituation::new(helpers::ownship())),
        NmeaOutput::new(Some(udp), hub.publisher()),
        Duration::from_secs(1),
    );
    assert_eq!(reporter.report_once(), 5);

    let mut talkers = Vec::new();
    for _ in 0..5 {
        let message = timeout(helpers::WAIT, rx.recv()).await.unwrap().unwrap();
        talkers.push(message[1..6].to_string());
    }
    assert_eq!(talkers, ["GPRMC", "GPGGA", "PFLAA", "PFLAA", "PFLAU"]);

    let mut buf = [0u8; 256];
    let mut datagrams = 0;
    while let Ok(Ok(n)) = timeout(Duration::from_millis(200), receiver.recv(&mut buf)).await {
        assert!(buf[..n].starts_with(b"$"));
        datagrams += 1;
    }
    assert_eq!(datagrams, 5);
}

#[tokio::test]
async fn reporter_refreshes_ages() {
    let decoder = helpers::decoder();
    decoder.decode_line("PFLAA,0,300,0,20,2,DD8F12,90,0,25,0.5,1");
    let registry = Arc::clone(decoder.registry());

    let (hub, _broadcaster) = broadcast_channel(64);
    let reporter = TrafficReporter::new(
        Arc::clone(&registry),
        Arc::new(SharedSituation::new(helpers::ownship())),
        NmeaOutput::new(None, hub.publisher()),
        Duration::from_secs(1),
    );

    sleep(Duration::from_millis(50)).await;
    reporter.report_once();
    let age = registry.get(TrafficKey::new(2, 0xDD8F12)).unwrap().age_secs;
    assert!(age >= 0.05, "age {age}");
}
