//! # Service lifecycle state.
//!
//! ```text
//! NotStarted ──► Starting ──► Started ──► Stopped
//!                    │            │
//!                    └──► Errored ◄┘ (shutdown action failed)
//! NotStarted ──► Errored (dependency timeout / canceled before start)
//! ```
//!
//! Transitions only move forward. [`ServiceState`] is stored in an
//! [`AtomicServiceState`] so concurrent callers can race on the
//! `NotStarted → Starting` edge and exactly one of them wins.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a [`Service`](crate::Service).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServiceState {
    /// Initial state; the only one from which `start()` proceeds.
    NotStarted = 0,
    /// The startup action is running.
    Starting = 1,
    /// The startup action succeeded.
    Started = 2,
    /// The shutdown action ran after a successful start.
    Stopped = 3,
    /// Startup failed, never happened (dependency timeout, cancellation) or shutdown failed.
    Errored = 4,
}

impl ServiceState {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceState::NotStarted => "not_started",
            ServiceState::Starting => "starting",
            ServiceState::Started => "started",
            ServiceState::Stopped => "stopped",
            ServiceState::Errored => "errored",
        }
    }

    /// Returns true for `Started`, `Stopped` and `Errored`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ServiceState::Started | ServiceState::Stopped | ServiceState::Errored
        )
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ServiceState::NotStarted,
            1 => ServiceState::Starting,
            2 => ServiceState::Started,
            3 => ServiceState::Stopped,
            _ => ServiceState::Errored,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ServiceState::NotStarted => "not started",
            ServiceState::Starting => "being started",
            ServiceState::Started => "started",
            ServiceState::Stopped => "stopped",
            ServiceState::Errored => "errored",
        };
        f.write_str(text)
    }
}

/// Lock-free cell holding a [`ServiceState`].
#[derive(Debug)]
pub(crate) struct AtomicServiceState(AtomicU8);

impl AtomicServiceState {
    pub(crate) fn new(state: ServiceState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> ServiceState {
        ServiceState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: ServiceState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Moves `from → to` atomically; on conflict returns the state that blocked it.
    pub(crate) fn transition(&self, from: ServiceState, to: ServiceState) -> Result<(), ServiceState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(ServiceState::from_u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_reports_blocking_state() {
        let cell = AtomicServiceState::new(ServiceState::NotStarted);
        assert_eq!(
            cell.transition(ServiceState::NotStarted, ServiceState::Starting),
            Ok(())
        );
        assert_eq!(
            cell.transition(ServiceState::NotStarted, ServiceState::Starting),
            Err(ServiceState::Starting)
        );
        cell.store(ServiceState::Started);
        assert_eq!(cell.load(), ServiceState::Started);
    }

    #[test]
    fn terminal_states() {
        assert!(!ServiceState::NotStarted.is_terminal());
        assert!(!ServiceState::Starting.is_terminal());
        assert!(ServiceState::Started.is_terminal());
        assert!(ServiceState::Errored.is_terminal());
        assert_eq!(ServiceState::Starting.to_string(), "being started");
    }
}
