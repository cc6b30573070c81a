//! Session plumbing shared by telemetry sources: error taxonomy, snapshot
//! channel, stop signalling, session handle and rate limiting.

use std::sync::Arc;

use crossbeam_channel::TrySendError;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

pub use model::TelemetrySnapshot;

mod error;
mod rate_limiter;
mod session;
mod stop;
mod supervisor;

pub use error::IngestError;
pub use rate_limiter::{RateLimiter, RateLimiterStats};
pub use session::Session;
pub use stop::{stop_pair, StopHandle, StopSignal};
pub use supervisor::Supervisor;

pub type TelemetryTx = crossbeam_channel::Sender<TelemetrySnapshot>;
pub type TelemetryRx = crossbeam_channel::Receiver<TelemetrySnapshot>;

/// Default number of snapshots buffered between a session and its consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Bounded snapshot channel. Producers never block on it, see [`SessionContext::deliver`].
pub fn channel(capacity: usize) -> (TelemetryTx, TelemetryRx) {
    crossbeam_channel::bounded(capacity.max(1))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Closed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    pub state: SessionState,
    pub datagrams: u64,
    pub snapshots: u64,
    /// Snapshots lost because the consumer's channel was full.
    pub dropped: u64,
    /// Datagrams that failed to decrypt or decode and were skipped.
    pub skipped: u64,
    pub liveness_sent: u64,
    pub liveness_failed: u64,
}

pub type SharedStats = Arc<Mutex<SessionStats>>;

/// Outcome of handing a snapshot to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Dropped,
    Disconnected,
}

/// Everything a source needs to run one session.
pub struct SessionContext {
    pub id: Uuid,
    pub tx: TelemetryTx,
    pub stop: StopSignal,
    pub stats: SharedStats,
}

impl SessionContext {
    /// Fresh context with a new id and zeroed stats.
    pub fn new(tx: TelemetryTx, stop: StopSignal) -> Self {
        Self { id: Uuid::new_v4(), tx, stop, stats: SharedStats::default() }
    }

    pub fn set_state(&self, state: SessionState) {
        self.stats.lock().state = state;
        debug!(?state, "session state");
    }

    pub fn record(&self, f: impl FnOnce(&mut SessionStats)) {
        f(&mut self.stats.lock());
    }

    /// Non-blocking hand-off. A full channel drops the snapshot.
    pub fn deliver(&self, snapshot: TelemetrySnapshot) -> Delivery {
        match self.tx.try_send(snapshot) {
            Ok(()) => {
                self.record(|s| s.snapshots += 1);
                Delivery::Sent
            }
            Err(TrySendError::Full(_)) => {
                self.record(|s| s.dropped += 1);
                Delivery::Dropped
            }
            Err(TrySendError::Disconnected(_)) => Delivery::Disconnected,
        }
    }
}

/// Trait for any live source connector
#[async_trait::async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Runs until stopped or failed. Resources are released before returning.
    async fn run(&self, ctx: SessionContext) -> Result<(), IngestError>;
}
