//! # Cross-platform OS signal handling.
//!
//! Provides [`block_until_quit`], an async helper that completes when the
//! process receives a termination request. It is stateless and independent of
//! any [`Synchronizer`](crate::Synchronizer); the typical pattern is to await
//! it, then call `stop()` on one or more synchronizers.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! Other signal types do not complete the wait.
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

/// Waits for an interrupt or termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when a qualifying signal is received, or `Err` if signal
/// registration fails.
#[cfg(unix)]
pub async fn block_until_quit() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }
    Ok(())
}

/// Waits for an interrupt or termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when a qualifying signal is received, or `Err` if signal
/// registration fails.
#[cfg(not(unix))]
pub async fn block_until_quit() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
