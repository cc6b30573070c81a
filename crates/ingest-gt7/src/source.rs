use ingest_core::{IngestError, Session, SessionContext, SessionState, TelemetrySource};
use tracing::info;

use crate::config::Gt7Config;
use crate::pump;
use crate::transport::UdpLink;

/// Live GT7 connector: heartbeats the console and decodes what it streams.
pub struct Gt7Source {
    cfg: Gt7Config,
}

impl Gt7Source {
    pub fn new(cfg: Gt7Config) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &Gt7Config {
        &self.cfg
    }

    /// Spawns a session using the configured channel capacity.
    pub fn spawn(cfg: Gt7Config) -> Session {
        let capacity = cfg.channel_capacity;
        Session::spawn(Self::new(cfg), capacity)
    }
}

#[async_trait::async_trait]
impl TelemetrySource for Gt7Source {
    async fn run(&self, mut ctx: SessionContext) -> Result<(), IngestError> {
        self.cfg.validate()?;
        ctx.set_state(SessionState::Connecting);
        let mut link = UdpLink::open(&self.cfg).await?;

        ctx.set_state(SessionState::Streaming);
        info!(console = %self.cfg.console_ip, layout = ?self.cfg.layout, "streaming");
        let result = pump::run(&mut link, &self.cfg, &mut ctx).await;

        // sockets close here, before the session reports Closed
        drop(link);
        result
    }
}
