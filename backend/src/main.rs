//! Vote worker entry-point: migrates the schema and wires the vote pipeline.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use color_eyre::eyre::{Result, eyre};
use ortho_config::OrthoConfig as _;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::worker::{VoteWorker, WorkerSettings};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = WorkerSettings::load_from_iter(std::env::args_os())
        .map_err(|error| eyre!("failed to load worker settings: {error}"))?;

    let cancel = CancellationToken::new();
    let worker = VoteWorker::start(&settings, cancel.clone()).await?;
    info!("awaiting vote batches; press Ctrl-C to stop");

    shutdown_signal().await?;
    worker.shutdown();
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
