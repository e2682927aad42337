//! Graceful shutdown
//!
//! On Ctrl+C or SIGTERM the server stops accepting connections and gives in-flight requests the
//! configured grace period.

use std::{io, time::Duration};

use salvo::server::ServerHandle;
use thiserror::Error;
use tokio::signal;
use tracing::info;

#[derive(Debug, Error)]
pub(crate) enum ShutdownSignalError {
    #[error("failed to install Ctrl+C handler: {0}")]
    CtrlC(#[source] io::Error),

    #[cfg(unix)]
    #[error("failed to install SIGTERM handler: {0}")]
    SigTerm(#[source] io::Error),
}

#[cfg(unix)]
async fn terminate() -> Result<&'static str, ShutdownSignalError> {
    signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(ShutdownSignalError::SigTerm)?
        .recv()
        .await;

    Ok("SIGTERM")
}

#[cfg(not(unix))]
async fn terminate() -> Result<&'static str, ShutdownSignalError> {
    std::future::pending().await
}

/// Wait for a shutdown signal, then stop `handle` gracefully within `grace`.
pub(crate) async fn listen(handle: ServerHandle, grace: Duration) -> Result<(), ShutdownSignalError> {
    let received = tokio::select! {
        result = signal::ctrl_c() => result.map(|()| "Ctrl+C").map_err(ShutdownSignalError::CtrlC)?,
        result = terminate() => result?,
    };

    info!(
        signal = received,
        grace_seconds = grace.as_secs(),
        "shutdown signal received; draining in-flight requests"
    );

    handle.stop_graceful(Some(grace));

    Ok(())
}
