use std::net::IpAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use ingest_gt7::config::{DEFAULT_CONSOLE_IP, DEFAULT_HEARTBEAT_PORT, DEFAULT_RECV_PORT};
use ingest_gt7::{BadPacketPolicy, Gt7Config};
use model::PacketLayout;

#[derive(Parser, Debug)]
#[command(name = "gt7-stream", version)]
#[command(about = "Stream Gran Turismo 7 telemetry from a console as NDJSON or CSV")]
pub struct Args {
    /// Console host name or IP address
    #[arg(long, env = "GT7_CONSOLE_IP", default_value = DEFAULT_CONSOLE_IP)]
    pub console_ip: String,

    /// Local address to bind on
    #[arg(long, env = "GT7_BIND_IP", default_value = "0.0.0.0")]
    pub bind_ip: IpAddr,

    /// Port the console streams telemetry to
    #[arg(long, env = "GT7_RECV_PORT", default_value_t = DEFAULT_RECV_PORT)]
    pub recv_port: u16,

    /// Console port accepting heartbeats
    #[arg(long, env = "GT7_HEARTBEAT_PORT", default_value_t = DEFAULT_HEARTBEAT_PORT)]
    pub heartbeat_port: u16,

    /// Packet layout; `auto` picks it from the datagram length
    #[arg(long, value_enum, default_value_t = LayoutArg::Auto)]
    pub layout: LayoutArg,

    /// Keep streaming past datagrams that fail to decrypt or decode
    #[arg(long)]
    pub skip_bad_packets: bool,

    /// Upper bound on snapshots written per second
    #[arg(long, env = "GT7_MAX_RATE_HZ", default_value_t = 60)]
    pub max_rate: u32,

    /// Snapshots buffered between the session and the writer
    #[arg(long, default_value_t = ingest_core::DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Read timeout in milliseconds; also bounds shutdown latency
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub read_timeout_ms: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = FormatArg::Ndjson)]
    pub format: FormatArg,

    /// Verbose logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutArg {
    Auto,
    Legacy,
    Extended,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Ndjson,
    Csv,
}

impl From<FormatArg> for iox::Format {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Ndjson => iox::Format::Ndjson,
            FormatArg::Csv => iox::Format::Csv,
        }
    }
}

impl Args {
    pub fn config(&self) -> Gt7Config {
        let layout = match self.layout {
            LayoutArg::Auto => None,
            LayoutArg::Legacy => Some(PacketLayout::Legacy),
            LayoutArg::Extended => Some(PacketLayout::Extended),
        };
        let policy = if self.skip_bad_packets {
            BadPacketPolicy::Skip
        } else {
            BadPacketPolicy::Terminate
        };
        Gt7Config::new(self.console_ip.clone())
            .with_bind_ip(self.bind_ip)
            .with_recv_port(self.recv_port)
            .with_heartbeat_port(self.heartbeat_port)
            .with_layout(layout)
            .with_bad_packet_policy(policy)
            .with_read_timeout(Duration::from_millis(self.read_timeout_ms))
            .with_channel_capacity(self.channel_capacity)
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
