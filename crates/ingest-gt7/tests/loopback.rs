use std::net::{IpAddr, Ipv4Addr, UdpSocket as StdUdpSocket};
use std::time::Duration;

use ingest_core::{IngestError, SessionState, Supervisor, TelemetryRx, TelemetrySnapshot};
use ingest_gt7::{crypto, Gt7Config, Gt7Source};
use tokio::net::UdpSocket;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(3);

fn free_port() -> u16 {
    let socket = StdUdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}

/// Stands in for the console: takes heartbeats, sends encrypted packets.
struct FakeConsole {
    socket: UdpSocket,
}

impl FakeConsole {
    async fn start() -> Self {
        Self { socket: UdpSocket::bind("127.0.0.1:0").await.unwrap() }
    }

    fn port(&self) -> u16 {
        self.socket.local_addr().unwrap().port()
    }

    fn config(&self, recv_port: u16) -> Gt7Config {
        Gt7Config::new("127.0.0.1")
            .with_bind_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_heartbeat_port(self.port())
            .with_recv_port(recv_port)
            .with_read_timeout(Duration::from_millis(200))
    }

    async fn expect_heartbeat(&self) {
        let mut buf = [0u8; 64];
        let (n, _) = timeout(WAIT, self.socket.recv_from(&mut buf))
            .await
            .expect("heartbeat within timeout")
            .unwrap();
        assert_eq!(&buf[..n], b"A");
    }

    async fn send_packet(&self, recv_port: u16, package_id: i32, gear: u8) {
        let mut plain = vec![0u8; 296];
        plain[0..4].copy_from_slice(&crypto::MAGIC.to_le_bytes());
        plain[0x70..0x74].copy_from_slice(&package_id.to_le_bytes());
        plain[0x90] = gear;
        let wire = crypto::encrypt(&plain, 0x0BAD_CAFE).unwrap();
        self.socket.send_to(&wire, ("127.0.0.1", recv_port)).await.unwrap();
    }
}

async fn next_snapshot(rx: &TelemetryRx) -> TelemetrySnapshot {
    let rx = rx.clone();
    tokio::task::spawn_blocking(move || rx.recv_timeout(WAIT))
        .await
        .unwrap()
        .expect("snapshot within timeout")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_loopback_session_lifecycle() {
    let console = FakeConsole::start().await;
    let recv_port = free_port();
    let session = Gt7Source::spawn(console.config(recv_port));

    console.expect_heartbeat().await;
    assert_eq!(session.state(), SessionState::Streaming);

    console.send_packet(recv_port, 42, 0x12).await;
    let rx = session.snapshots().clone();
    let snapshot = next_snapshot(&rx).await;
    assert_eq!(snapshot.package_id, 42);
    assert_eq!(snapshot.current_gear, 2);
    assert_eq!(snapshot.suggested_gear, 1);
    assert_eq!(session.stats().datagrams, 1);

    timeout(Duration::from_secs(1), session.close())
        .await
        .expect("closed within one read timeout")
        .expect("clean close");

    // no snapshots after close, and the port is free again
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    StdUdpSocket::bind(("127.0.0.1", recv_port)).expect("listening port released");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bind_failure_is_terminal() {
    let console = FakeConsole::start().await;
    let taken = StdUdpSocket::bind("127.0.0.1:0").unwrap();
    let recv_port = taken.local_addr().unwrap().port();

    let session = Gt7Source::spawn(console.config(recv_port));
    let err = timeout(WAIT, session.join()).await.expect("session ended").unwrap_err();
    assert!(matches!(err, IngestError::Bind { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_supervisor_restart_reuses_port() {
    let console = FakeConsole::start().await;
    let recv_port = free_port();
    let mut supervisor = Supervisor::default();

    let first = supervisor.start(Gt7Source::new(console.config(recv_port))).await.id();
    console.expect_heartbeat().await;

    let session = supervisor.start(Gt7Source::new(console.config(recv_port))).await;
    assert_ne!(session.id(), first);
    let rx = session.snapshots().clone();

    console.expect_heartbeat().await;
    // a late heartbeat from the first session may still be queued, so resend
    // until the new socket picks a packet up
    let mut snapshot = None;
    for _ in 0..10 {
        console.send_packet(recv_port, 7, 0x35).await;
        let rx = rx.clone();
        let got = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_millis(300)))
            .await
            .unwrap();
        if let Ok(s) = got {
            snapshot = Some(s);
            break;
        }
    }
    let snapshot = snapshot.expect("snapshot from the new session");
    assert_eq!(snapshot.package_id, 7);
    assert_eq!((snapshot.current_gear, snapshot.suggested_gear), (5, 3));

    supervisor.stop().await.expect("clean stop");
}
