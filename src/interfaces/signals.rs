//! Process shutdown signals.

use std::future::Future;
use std::io;
use tracing::warn;

/// Which signal asked the process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
}

/// Install the shutdown handlers and return a future that resolves on the
/// first of Ctrl+C or SIGTERM.
///
/// Handlers are registered before this returns, so a signal delivered while
/// the caller is still starting up is not lost.
#[cfg(unix)]
pub fn shutdown_signal() -> io::Result<impl Future<Output = ShutdownReason>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            reason = interrupt() => reason,
            _ = terminate.recv() => ShutdownReason::Terminate,
        }
    })
}

#[cfg(not(unix))]
pub fn shutdown_signal() -> io::Result<impl Future<Output = ShutdownReason>> {
    Ok(interrupt())
}

async fn interrupt() -> ShutdownReason {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    ShutdownReason::Interrupt
}
