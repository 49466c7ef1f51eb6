//! # Interval policy for readiness polling.
//!
//! [`BackoffPolicy`] computes how long a polling waiter sleeps between two
//! registry checks. It is parameterized by:
//! - [`BackoffPolicy::first`] the interval after the first check;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the cap.
//!
//! The interval for round `n` is `first × factor^n`, clamped to `max`, then
//! jitter is applied. Jitter output never feeds back into later rounds.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use bootvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(250),
//!     max: Duration::from_secs(2),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(250));
//! assert_eq!(backoff.next(1), Duration::from_millis(500));
//! assert_eq!(backoff.next(5), Duration::from_secs(2));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Polling interval policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Interval after the first check.
    pub first: Duration,
    /// Maximum interval.
    pub max: Duration,
    /// Multiplicative growth factor (`1.0` = constant interval).
    pub factor: f64,
    /// Jitter policy to keep waiters from polling in lockstep.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 2s interval, no jitter.
    fn default() -> Self {
        Self::constant(Duration::from_secs(2))
    }
}

impl BackoffPolicy {
    /// Fixed interval, no growth, no jitter.
    pub fn constant(interval: Duration) -> Self {
        Self {
            first: interval,
            max: interval,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the interval following check number `round` (0-indexed).
    pub fn next(&self, round: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = round.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}
