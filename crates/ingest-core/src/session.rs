use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    channel, stop_pair, IngestError, SessionContext, SessionState, SessionStats, SharedStats,
    StopHandle, TelemetryRx, TelemetrySource,
};

/// Handle to one running session.
///
/// Snapshots arrive on [`Session::snapshots`]; the channel ends when the
/// session closes. The terminal error, if any, comes out of [`Session::join`].
/// A closed session cannot be restarted, spawn a new one instead. Dropping the
/// handle stops the session.
pub struct Session {
    id: Uuid,
    rx: TelemetryRx,
    stop: StopHandle,
    stats: SharedStats,
    task: JoinHandle<Result<(), IngestError>>,
}

impl Session {
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: TelemetrySource + 'static>(source: S, capacity: usize) -> Self {
        let (tx, rx) = channel(capacity);
        let (stop, signal) = stop_pair();
        let ctx = SessionContext::new(tx, signal);
        let id = ctx.id;
        let stats = ctx.stats.clone();

        let task_stats = stats.clone();
        let task = tokio::spawn(
            async move {
                info!("session starting");
                let result = source.run(ctx).await;
                task_stats.lock().state = SessionState::Closed;
                match &result {
                    Ok(()) => info!("session closed"),
                    Err(err) => error!(error = %err, "session failed"),
                }
                result
            }
            .instrument(info_span!("session", %id)),
        );

        Self { id, rx, stop, stats, task }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn snapshots(&self) -> &TelemetryRx {
        &self.rx
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.lock().clone()
    }

    /// Live view of the counters that outlives the handle.
    pub fn stats_handle(&self) -> SharedStats {
        self.stats.clone()
    }

    pub fn state(&self) -> SessionState {
        self.stats.lock().state
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the session to end and returns its terminal result.
    pub async fn join(self) -> Result<(), IngestError> {
        let Session { task, stop, .. } = self;
        let result = task.await;
        drop(stop);
        match result {
            Ok(result) => result,
            Err(err) => Err(IngestError::Msg(format!("session task failed: {err}"))),
        }
    }

    /// Stops the session and waits for its sockets to be released.
    pub async fn close(self) -> Result<(), IngestError> {
        self.stop();
        self.join().await
    }
}
