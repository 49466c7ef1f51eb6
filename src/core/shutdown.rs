//! # Run abort triggers.
//!
//! A run is aborted by whichever fires first:
//! - the caller's [`CancellationToken`] (`Orchestrator::run_until`);
//! - `Config::run_deadline`;
//! - an OS termination signal, when `Config::abort_on_signal` is set.
//!
//! ## Signals
//! **Unix platforms:** `SIGINT`, `SIGTERM`, `SIGQUIT`.
//!
//! **Windows platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

/// Why a run was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AbortCause {
    Requested,
    Deadline,
    Signal,
}

impl AbortCause {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            AbortCause::Requested => "abort requested by caller",
            AbortCause::Deadline => "run deadline reached",
            AbortCause::Signal => "termination signal received",
        }
    }
}

/// Completes with the first abort trigger that fires; never completes if none is armed.
pub(crate) async fn abort_trigger(
    external: &CancellationToken,
    deadline: Option<Duration>,
    on_signal: bool,
) -> AbortCause {
    let deadline = async {
        match deadline {
            Some(d) => time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    let signal = async {
        if !on_signal {
            return std::future::pending().await;
        }
        if let Err(error) = wait_for_termination_signal().await {
            tracing::warn!(target: "bootvisor", %error, "cannot listen for termination signals");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = external.cancelled() => AbortCause::Requested,
        _ = deadline => AbortCause::Deadline,
        _ = signal => AbortCause::Signal,
    }
}

/// Waits for a termination signal.
///
/// Returns `Err` if signal registration fails.
#[cfg(unix)]
async fn wait_for_termination_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
