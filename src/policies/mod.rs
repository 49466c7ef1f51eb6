//! Readiness and polling policies.
//!
//! This module groups the knobs that control **how long** a launch attempt
//! waits for its needs and **what happens** when they never arrive.
//!
//! ## Contents
//! - [`ReadinessPolicy`] deadline + wait strategy + timeout behaviour
//! - [`WaitStrategy`] wake on publish, or poll on an interval
//! - [`TimeoutPolicy`] fail closed (default) or start anyway
//! - [`BackoffPolicy`] polling interval growth (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization to keep pollers out of lockstep

mod backoff;
mod jitter;
mod readiness;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use readiness::{ReadinessPolicy, TimeoutPolicy, WaitStrategy};
