//! # Orchestrator configuration.
//!
//! Provides [`Config`], the centralized settings for a run.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited concurrent startup actions (no semaphore)
//! - `action_timeout = 0s` → startup actions run without timeout
//! - `run_deadline = 0s` → no run-wide deadline
//! - `readiness.deadline = 0s` → wait for needs without bound

use std::time::Duration;

use crate::policies::ReadinessPolicy;

/// Global configuration for orchestration runs.
///
/// ## Field semantics
/// - `readiness`: how launch attempts wait for their needs
/// - `action_timeout`: per startup action timeout (`0s` = none)
/// - `run_deadline`: aborts the whole run after this long (`0s` = none)
/// - `grace`: after an abort, how long to wait for in-flight attempts
/// - `max_concurrent`: startup actions running at once (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `abort_on_signal`: abort the run on SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows)
///
/// Prefer the helper accessors over checking sentinels directly.
#[derive(Clone, Debug)]
pub struct Config {
    /// Readiness wait policy applied to every service.
    pub readiness: ReadinessPolicy,

    /// Timeout applied to each startup action.
    ///
    /// A timed-out action is canceled and the service ends `Errored`.
    pub action_timeout: Duration,

    /// Run-wide deadline; when hit the run is aborted like an external cancel.
    pub run_deadline: Duration,

    /// Maximum time to wait for launch attempts after an abort.
    ///
    /// If exceeded, the stuck attempts are dropped and `run` returns
    /// `RuntimeError::GraceExceeded` carrying the full report.
    pub grace: Duration,

    /// Maximum number of startup actions running concurrently.
    ///
    /// Waiting for readiness never holds a permit.
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Listen for OS termination signals during the run.
    pub abort_on_signal: bool,
}

impl Config {
    /// Returns the concurrency limit (`None` = unlimited).
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the startup action timeout (`None` = no timeout).
    #[inline]
    pub fn action_timeout(&self) -> Option<Duration> {
        if self.action_timeout == Duration::ZERO {
            None
        } else {
            Some(self.action_timeout)
        }
    }

    /// Returns the run-wide deadline (`None` = no deadline).
    #[inline]
    pub fn run_deadline(&self) -> Option<Duration> {
        if self.run_deadline == Duration::ZERO {
            None
        } else {
            Some(self.run_deadline)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `readiness = ReadinessPolicy::default()` (notify, 120s, fail closed)
    /// - `action_timeout = 0s` (none)
    /// - `run_deadline = 0s` (none)
    /// - `grace = 30s`
    /// - `max_concurrent = 0` (unlimited)
    /// - `bus_capacity = 1024`
    /// - `abort_on_signal = false`
    fn default() -> Self {
        Self {
            readiness: ReadinessPolicy::default(),
            action_timeout: Duration::ZERO,
            run_deadline: Duration::ZERO,
            grace: Duration::from_secs(30),
            max_concurrent: 0,
            bus_capacity: 1024,
            abort_on_signal: false,
        }
    }
}
