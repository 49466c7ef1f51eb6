//! # Readiness policy: how a launch attempt waits for its needs.
//!
//! [`ReadinessPolicy`] bundles three knobs:
//! - [`WaitStrategy`]: wake on every registry publish (default) or poll on an interval;
//! - `deadline`: total wait budget (`0` = unbounded);
//! - [`TimeoutPolicy`]: what to do when the budget runs out.
//!
//! ## Quick wiring
//! ```text
//! Config { readiness: ReadinessPolicy, .. }
//!      └─► core::actor::LaunchActor
//!           └─► ReadinessWait { needs, registry, policy, .. }.wait(token)
//!                 ├─ Ready     → start()
//!                 ├─ TimedOut  → Fail: Errored(DependencyTimeout) | StartAnyway: start()
//!                 └─ Canceled  → Errored(Canceled)
//! ```
//!
//! ## Defaults
//! - `WaitStrategy::Notify`, `deadline = 120s`, `TimeoutPolicy::Fail`.
//! - [`ReadinessPolicy::polling`] reproduces the fixed 2s × 60 polling loop with strict gating.

use std::time::Duration;

use crate::policies::backoff::BackoffPolicy;

/// How a waiter learns that the registry changed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum WaitStrategy {
    /// Sleep until the next capability publish (no polling).
    #[default]
    Notify,
    /// Re-check on an interval for at most `max_attempts` rounds, plus one final check.
    Poll {
        /// Interval between checks.
        backoff: BackoffPolicy,
        /// Number of interval sleeps before giving up.
        max_attempts: u32,
    },
}

/// Behaviour when needs are still unmet after the wait budget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// The service moves to `Errored` with `DependencyTimeout` and never starts.
    #[default]
    Fail,
    /// Start the service anyway (best effort).
    StartAnyway,
}

/// Policy applied by every launch attempt while waiting for its needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReadinessPolicy {
    /// Wake-up mechanism.
    pub wait: WaitStrategy,
    /// Total wait budget; `Duration::ZERO` = unbounded.
    pub deadline: Duration,
    /// Behaviour once the budget is exhausted.
    pub on_timeout: TimeoutPolicy,
}

impl Default for ReadinessPolicy {
    /// Notify-based waiting, 120s budget, strict gating.
    fn default() -> Self {
        Self {
            wait: WaitStrategy::Notify,
            deadline: Duration::from_secs(120),
            on_timeout: TimeoutPolicy::Fail,
        }
    }
}

impl ReadinessPolicy {
    /// Fixed-interval polling: 2s × 60 rounds, strict gating.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use bootvisor::{ReadinessPolicy, WaitStrategy};
    ///
    /// let p = ReadinessPolicy::polling();
    /// assert!(matches!(p.wait, WaitStrategy::Poll { max_attempts: 60, .. }));
    /// assert_eq!(p.budget(), Some(Duration::from_secs(120)));
    /// ```
    pub fn polling() -> Self {
        Self {
            wait: WaitStrategy::Poll {
                backoff: BackoffPolicy::constant(Duration::from_secs(2)),
                max_attempts: 60,
            },
            deadline: Duration::from_secs(120),
            on_timeout: TimeoutPolicy::Fail,
        }
    }

    /// Returns a copy with the given deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns a copy with the given timeout behaviour.
    pub fn with_on_timeout(mut self, on_timeout: TimeoutPolicy) -> Self {
        self.on_timeout = on_timeout;
        self
    }

    /// Returns a copy with the given wait strategy.
    pub fn with_wait(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    /// Returns the deadline as an `Option` (`None` = unbounded).
    #[inline]
    pub fn budget(&self) -> Option<Duration> {
        if self.deadline == Duration::ZERO {
            None
        } else {
            Some(self.deadline)
        }
    }
}
