//! gt7-stream: live Gran Turismo 7 telemetry on stdout.

mod args;
mod output;

use std::{io, thread};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ingest_core::RateLimiter;
use ingest_gt7::Gt7Source;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use args::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the records, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level())),
        )
        .with_writer(io::stderr)
        .init();

    let cfg = args.config();
    info!(console = %cfg.console_ip, recv_port = cfg.recv_port, heartbeat_port = cfg.heartbeat_port, "starting");

    let session = Gt7Source::spawn(cfg);
    let stop = session.stop_handle();
    let stats = session.stats_handle();

    let rx = session.snapshots().clone();
    let limiter = RateLimiter::new(args.max_rate);
    let format = iox::Format::from(args.format);
    let writer_stop = stop.clone();
    let output = thread::Builder::new()
        .name("output".into())
        .spawn(move || {
            let mut sink = iox::writer(format, io::stdout().lock());
            let result = output::drain(rx, limiter, sink.as_mut());
            if result.is_err() {
                // nobody is reading anymore
                writer_stop.stop();
            }
            result
        })
        .context("spawn output thread")?;

    let join = session.join();
    tokio::pin!(join);
    let result = tokio::select! {
        result = &mut join => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("listen for ctrl-c")?;
            info!("interrupted, stopping session");
            stop.stop();
            join.await
        }
    };

    let written = tokio::task::spawn_blocking(move || output.join())
        .await
        .context("join output thread")?
        .map_err(|_| anyhow!("output thread panicked"))?;

    let session_stats = stats.lock().clone();
    info!(
        datagrams = session_stats.datagrams,
        snapshots = session_stats.snapshots,
        dropped = session_stats.dropped,
        skipped = session_stats.skipped,
        "session finished"
    );
    match written {
        Ok(limits) => info!(
            written = limits.processed_count,
            rate_limited = limits.dropped_count,
            "output finished"
        ),
        Err(err) => error!(error = %err, "output stopped early"),
    }

    result.context("telemetry session failed")
}
