use tracing::{info, warn};

use crate::{IngestError, Session, TelemetrySource, DEFAULT_CHANNEL_CAPACITY};

/// Keeps at most one live session.
///
/// Starting a new session first stops the current one and waits until its
/// sockets are released.
pub struct Supervisor {
    current: Option<Session>,
    capacity: usize,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl Supervisor {
    pub fn new(capacity: usize) -> Self {
        Self { current: None, capacity }
    }

    pub async fn start<S: TelemetrySource + 'static>(&mut self, source: S) -> &Session {
        if let Some(old) = self.current.take() {
            let id = old.id();
            info!(%id, "superseding session");
            if let Err(err) = old.close().await {
                warn!(%id, error = %err, "superseded session ended with error");
            }
        }
        self.current.insert(Session::spawn(source, self.capacity))
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Hands the current session to the caller without stopping it.
    pub fn take(&mut self) -> Option<Session> {
        self.current.take()
    }

    pub async fn stop(&mut self) -> Result<(), IngestError> {
        match self.current.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}
