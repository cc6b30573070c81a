//! Sockets for one GT7 session.
//!
//! The console only streams while it keeps receiving heartbeats, and it
//! streams to the port it was configured with rather than back to the
//! heartbeat source. Two sockets are therefore needed: a listening one on
//! `recv_port` and a connected one aimed at the console's heartbeat port.

use std::io;
use std::net::SocketAddr;

use ingest_core::IngestError;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, info};

use crate::config::Gt7Config;

/// Requests the full packet variant.
pub const HEARTBEAT_PAYLOAD: &[u8] = b"A";

/// Large enough for any packet variant the console sends.
pub const RECV_BUFFER_LEN: usize = 4096;

/// What the pump needs from the network.
#[async_trait::async_trait]
pub trait Link: Send {
    /// Waits for one datagram and returns its length.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    async fn send_liveness(&mut self) -> io::Result<()>;
}

pub struct UdpLink {
    stream: UdpSocket,
    heartbeat: UdpSocket,
}

impl UdpLink {
    pub async fn open(cfg: &Gt7Config) -> Result<Self, IngestError> {
        let heartbeat = open_heartbeat(cfg).await?;
        let stream = open_stream(cfg).await?;
        Ok(Self { stream, heartbeat })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.stream.local_addr()
    }
}

#[async_trait::async_trait]
impl Link for UdpLink {
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (len, _) = self.stream.recv_from(buf).await?;
        Ok(len)
    }

    async fn send_liveness(&mut self) -> io::Result<()> {
        self.heartbeat.send(HEARTBEAT_PAYLOAD).await?;
        Ok(())
    }
}

/// Binds the socket the console streams telemetry to.
pub async fn open_stream(cfg: &Gt7Config) -> Result<UdpSocket, IngestError> {
    let addr = SocketAddr::new(cfg.bind_ip, cfg.recv_port);
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|source| IngestError::Bind { addr, source })?;
    info!(%addr, "listening for telemetry");
    Ok(socket)
}

/// Opens an ephemeral socket connected to the console's heartbeat port.
pub async fn open_heartbeat(cfg: &Gt7Config) -> Result<UdpSocket, IngestError> {
    let remote = resolve_console(cfg).await?;

    let local = SocketAddr::new(cfg.bind_ip, 0);
    let socket = UdpSocket::bind(local)
        .await
        .map_err(|source| IngestError::Bind { addr: local, source })?;
    socket
        .connect(remote)
        .await
        .map_err(|source| IngestError::Dial { addr: remote, source })?;
    info!(%remote, "heartbeat target");
    Ok(socket)
}

async fn resolve_console(cfg: &Gt7Config) -> Result<SocketAddr, IngestError> {
    let target = format!("{}:{}", cfg.console_ip, cfg.heartbeat_port);
    let resolution = |source| IngestError::AddressResolution { addr: target.clone(), source };

    let mut candidates = lookup_host(target.as_str()).await.map_err(resolution)?.collect::<Vec<_>>();
    debug!(%target, count = candidates.len(), "resolved console");
    // The heartbeat socket binds on bind_ip, so the peer must share its family.
    candidates.retain(|a| a.is_ipv4() == cfg.bind_ip.is_ipv4());
    candidates.into_iter().next().ok_or_else(|| {
        resolution(io::Error::new(
            io::ErrorKind::NotFound,
            "no address matching the bind address family",
        ))
    })
}
