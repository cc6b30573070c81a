use anyhow::Result;
use ingest_core::{RateLimiter, RateLimiterStats, TelemetryRx};
use iox::SnapshotWriter;
use time::OffsetDateTime;

/// Writes snapshots until the session closes its end of the channel.
///
/// Snapshots arriving faster than the limiter allows are dropped. Each
/// accepted record is flushed so a downstream pipe sees it immediately.
pub fn drain(
    rx: TelemetryRx,
    mut limiter: RateLimiter,
    sink: &mut dyn SnapshotWriter,
) -> Result<RateLimiterStats> {
    for snapshot in rx.iter() {
        if !limiter.should_process() {
            continue;
        }
        sink.write(OffsetDateTime::now_utc(), &snapshot)?;
        sink.flush()?;
    }
    Ok(limiter.stats())
}
