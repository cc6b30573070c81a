use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use ingest_core::IngestError;
use model::PacketLayout;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RECV_PORT: u16 = 33740;
pub const DEFAULT_HEARTBEAT_PORT: u16 = 33739;
pub const DEFAULT_CONSOLE_IP: &str = "192.168.1.8";

/// What the pump does with a datagram that fails to decrypt or decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BadPacketPolicy {
    /// End the session with the packet error.
    #[default]
    Terminate,
    /// Count the datagram and keep reading.
    Skip,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gt7Config {
    /// Console host name or IP the heartbeat is sent to.
    pub console_ip: String,
    /// Local address both sockets bind on.
    pub bind_ip: IpAddr,
    /// Port the console streams telemetry to.
    pub recv_port: u16,
    /// Port on the console that accepts heartbeats.
    pub heartbeat_port: u16,
    pub heartbeat_interval: Duration,
    /// Upper bound on one read; also bounds stop latency.
    pub read_timeout: Duration,
    /// `None` picks the layout from the datagram length.
    pub layout: Option<PacketLayout>,
    pub on_bad_packet: BadPacketPolicy,
    pub channel_capacity: usize,
}

impl Default for Gt7Config {
    fn default() -> Self {
        Self {
            console_ip: DEFAULT_CONSOLE_IP.into(),
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            recv_port: DEFAULT_RECV_PORT,
            heartbeat_port: DEFAULT_HEARTBEAT_PORT,
            heartbeat_interval: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
            layout: None,
            on_bad_packet: BadPacketPolicy::Terminate,
            channel_capacity: ingest_core::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Gt7Config {
    pub fn new(console_ip: impl Into<String>) -> Self {
        Self { console_ip: console_ip.into(), ..Self::default() }
    }

    /// Rejects settings the session loop cannot run with.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.heartbeat_interval.is_zero() {
            return Err(IngestError::InvalidConfig("heartbeat_interval must be non-zero".into()));
        }
        if self.read_timeout.is_zero() {
            return Err(IngestError::InvalidConfig("read_timeout must be non-zero".into()));
        }
        Ok(())
    }

    pub fn with_bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    pub fn with_recv_port(mut self, port: u16) -> Self {
        self.recv_port = port;
        self
    }

    pub fn with_heartbeat_port(mut self, port: u16) -> Self {
        self.heartbeat_port = port;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_layout(mut self, layout: Option<PacketLayout>) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_bad_packet_policy(mut self, policy: BadPacketPolicy) -> Self {
        self.on_bad_packet = policy;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Gt7Config::default();
        assert_eq!(cfg.console_ip, "192.168.1.8");
        assert_eq!(cfg.bind_ip, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(cfg.recv_port, 33740);
        assert_eq!(cfg.heartbeat_port, 33739);
        assert_eq!(cfg.heartbeat_interval, Duration::from_secs(1));
        assert_eq!(cfg.read_timeout, Duration::from_secs(1));
        assert_eq!(cfg.layout, None);
        assert_eq!(cfg.on_bad_packet, BadPacketPolicy::Terminate);
        assert_eq!(cfg.channel_capacity, 256);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_durations_rejected() {
        let err = Gt7Config::default()
            .with_heartbeat_interval(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidConfig(ref m) if m.contains("heartbeat_interval")));

        let err = Gt7Config::default().with_read_timeout(Duration::ZERO).validate().unwrap_err();
        assert!(matches!(err, IngestError::InvalidConfig(ref m) if m.contains("read_timeout")));

        let ok = Gt7Config::default()
            .with_heartbeat_interval(Duration::from_millis(1))
            .with_read_timeout(Duration::from_millis(1));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let cfg = Gt7Config::new("10.0.0.5")
            .with_recv_port(40000)
            .with_heartbeat_port(40001)
            .with_layout(Some(PacketLayout::Legacy))
            .with_bad_packet_policy(BadPacketPolicy::Skip)
            .with_read_timeout(Duration::from_millis(200));
        assert_eq!(cfg.console_ip, "10.0.0.5");
        assert_eq!(cfg.recv_port, 40000);
        assert_eq!(cfg.heartbeat_port, 40001);
        assert_eq!(cfg.layout, Some(PacketLayout::Legacy));
        assert_eq!(cfg.on_bad_packet, BadPacketPolicy::Skip);
        assert_eq!(cfg.read_timeout, Duration::from_millis(200));
        assert_eq!(cfg.heartbeat_interval, Duration::from_secs(1));
    }
}
