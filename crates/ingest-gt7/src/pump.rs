//! Streaming loop of one session: heartbeat, timed reads, decode, hand-off.

use ingest_core::{Delivery, IngestError, SessionContext};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::config::{BadPacketPolicy, Gt7Config};
use crate::decode::decode_datagram;
use crate::transport::{Link, RECV_BUFFER_LEN};

/// Runs until stopped, the consumer goes away, or a fatal error occurs.
///
/// The first heartbeat goes out before any read. Stop requests win over any
/// other ready branch, so a stopped session neither pings nor delivers again.
pub async fn run<L: Link>(
    link: &mut L,
    cfg: &Gt7Config,
    ctx: &mut SessionContext,
) -> Result<(), IngestError> {
    cfg.validate()?;

    send_liveness(link, ctx).await;
    let period = cfg.heartbeat_interval;
    let mut heartbeat = time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut buf = vec![0u8; RECV_BUFFER_LEN];

    loop {
        tokio::select! {
            biased;

            _ = ctx.stop.stopped() => {
                info!("stop requested");
                return Ok(());
            }

            _ = heartbeat.tick() => send_liveness(link, ctx).await,

            read = time::timeout(cfg.read_timeout, link.recv(&mut buf)) => {
                let len = match read {
                    Err(_) => {
                        trace!("no datagram within read timeout");
                        continue;
                    }
                    Ok(Err(err)) => return Err(IngestError::SocketRead(err)),
                    Ok(Ok(0)) => continue,
                    Ok(Ok(len)) => len,
                };
                ctx.record(|s| s.datagrams += 1);

                let snapshot = match decode_datagram(&buf[..len], cfg.layout) {
                    Ok(snapshot) => snapshot,
                    Err(err) if cfg.on_bad_packet == BadPacketPolicy::Skip => {
                        debug!(error = %err, len, "skipping datagram");
                        ctx.record(|s| s.skipped += 1);
                        continue;
                    }
                    Err(err) => return Err(err),
                };

                match ctx.deliver(snapshot) {
                    Delivery::Sent => {}
                    Delivery::Dropped => trace!("consumer behind, snapshot dropped"),
                    Delivery::Disconnected => {
                        info!("consumer gone");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Counted either way; a lost heartbeat never ends the session.
async fn send_liveness<L: Link>(link: &mut L, ctx: &SessionContext) {
    match link.send_liveness().await {
        Ok(()) => ctx.record(|s| s.liveness_sent += 1),
        Err(err) => {
            warn!(error = %IngestError::SendLiveness(err), "heartbeat not sent");
            ctx.record(|s| s.liveness_failed += 1);
        }
    }
}
