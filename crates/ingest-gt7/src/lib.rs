//! Gran Turismo 7 telemetry over UDP.
//!
//! The console streams Salsa20-encrypted packets to `recv_port` for as long
//! as it receives a heartbeat on `heartbeat_port`. [`Gt7Source`] owns both
//! sockets for one session and hands decoded snapshots to the consumer.

pub mod config;
pub mod crypto;
pub mod decode;
pub mod layout;
pub mod pump;
pub mod source;
pub mod transport;

pub use config::{BadPacketPolicy, Gt7Config};
pub use decode::{decode, decode_datagram};
pub use source::Gt7Source;
pub use transport::{Link, UdpLink, HEARTBEAT_PAYLOAD};
