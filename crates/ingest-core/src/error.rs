use std::io;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("cannot resolve {addr}: {source}")]
    AddressResolution {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("cannot connect to {addr}: {source}")]
    Dial {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("bad magic after decryption: 0x{found:08X}")]
    Decryption { found: u32 },
    #[error("truncated packet: need {needed} bytes, got {actual}")]
    TruncatedPacket { needed: usize, actual: usize },
    #[error("socket read failed: {0}")]
    SocketRead(#[source] io::Error),
    #[error("liveness send failed: {0}")]
    SendLiveness(#[source] io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Msg(String),
}

impl IngestError {
    /// Failures confined to a single datagram. Everything else ends a session.
    pub fn is_packet_error(&self) -> bool {
        matches!(self, IngestError::Decryption { .. } | IngestError::TruncatedPacket { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_errors() {
        assert!(IngestError::Decryption { found: 0 }.is_packet_error());
        assert!(IngestError::TruncatedPacket { needed: 296, actual: 10 }.is_packet_error());
        let read = IngestError::SocketRead(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(!read.is_packet_error());
    }

    #[test]
    fn test_display() {
        let err = IngestError::Decryption { found: 0xDEADBEEF };
        assert_eq!(err.to_string(), "bad magic after decryption: 0xDEADBEEF");
        let err = IngestError::TruncatedPacket { needed: 148, actual: 64 };
        assert_eq!(err.to_string(), "truncated packet: need 148 bytes, got 64");
        let err = IngestError::InvalidConfig("read_timeout must be non-zero".into());
        assert_eq!(err.to_string(), "invalid configuration: read_timeout must be non-zero");
        assert!(!err.is_packet_error());
    }
}
