//! # Runtime events emitted by the orchestrator and launch attempts.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Run events**: run start/finish, abort, grace overrun
//! - **Readiness events**: waiting, polling, ready, dependency timeout
//! - **Startup events**: starting, started, failed, capabilities published
//! - **Subscriber events**: overflow and panic in subscriber workers
//!
//! The [`Event`] struct carries the metadata (service name, capabilities,
//! durations, reason) relevant to its kind.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use it to restore order across subscribers.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use bootvisor::{Capability, Event, EventKind};
//!
//! let ev = Event::new(EventKind::DependencyTimeout)
//!     .with_service("app")
//!     .with_capabilities([Capability::from("db")])
//!     .with_waited(Duration::from_secs(120));
//!
//! assert_eq!(ev.kind, EventKind::DependencyTimeout);
//! assert_eq!(ev.service.as_deref(), Some("app"));
//! assert_eq!(ev.waited_ms, Some(120_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::services::Capability;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `service` (subscriber name), `reason` (panic message)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `service` (subscriber name), `reason`
    SubscriberOverflow,

    // === Run events ===
    /// A run began; all launch attempts are about to be spawned.
    ///
    /// Sets: `count` (number of services)
    RunStarted,

    /// A run completed; every launch attempt reached a terminal outcome.
    ///
    /// Sets: `count` (number of started services), `elapsed_ms`
    RunFinished,

    /// The run was aborted (external token, run deadline or OS signal).
    ///
    /// Sets: `reason`
    AbortRequested,

    /// After an abort, some launch attempts did not finish within grace.
    ///
    /// Sets: `reason` (stuck services), `timeout_ms` (grace)
    GraceExceeded,

    // === Readiness events ===
    /// Launch attempt is waiting for needs that are not all present yet.
    ///
    /// Sets: `service`, `capabilities` (needs)
    ServiceWaiting,

    /// Polling waiter scheduled its next check.
    ///
    /// Sets: `service`, `round`, `delay_ms`
    PollScheduled,

    /// All needs are present.
    ///
    /// Sets: `service`, `waited_ms`
    ServiceReady,

    /// Needs still missing after the readiness budget; the service will not start.
    ///
    /// Sets: `service`, `capabilities` (missing), `waited_ms`
    DependencyTimeout,

    /// Needs still missing after the budget; starting anyway by policy.
    ///
    /// Sets: `service`, `capabilities` (missing), `waited_ms`
    TimeoutIgnored,

    /// The service was not `NotStarted` when its launch attempt began.
    ///
    /// Sets: `service`, `reason` (blocking state)
    ServiceSkipped,

    // === Startup events ===
    /// Startup action is about to run.
    ///
    /// Sets: `service`, `reason` (action description)
    ServiceStarting,

    /// Startup action succeeded.
    ///
    /// Sets: `service`, `elapsed_ms`
    ServiceStarted,

    /// Startup action exceeded its timeout (always followed by `ServiceFailed`).
    ///
    /// Sets: `service`, `timeout_ms`
    ActionTimeout,

    /// Startup action failed.
    ///
    /// Sets: `service`, `reason`, `elapsed_ms`
    ServiceFailed,

    /// Capabilities were written into the registry.
    ///
    /// Sets: `service`, `capabilities`
    CapabilitiesProvided,

    /// The run was aborted before the service could start.
    ///
    /// Sets: `service`
    ServiceCanceled,

    /// The launch attempt task panicked.
    ///
    /// Sets: `service`, `reason`
    LaunchPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Service (or subscriber) name, if applicable.
    pub service: Option<Arc<str>>,
    /// Capabilities involved (needs, missing or provided, depending on kind).
    pub capabilities: Vec<Capability>,
    /// Human-readable reason (errors, states, action description).
    pub reason: Option<Arc<str>>,
    /// Time spent waiting for readiness, in milliseconds.
    pub waited_ms: Option<u32>,
    /// Duration of the startup action or the run, in milliseconds.
    pub elapsed_ms: Option<u32>,
    /// Timeout or grace that was exceeded, in milliseconds.
    pub timeout_ms: Option<u32>,
    /// Delay before the next poll, in milliseconds.
    pub delay_ms: Option<u32>,
    /// Poll round (0-based).
    pub round: Option<u32>,
    /// Counter (services in a run, services started).
    pub count: Option<u32>,
}

#[inline]
fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            capabilities: Vec::new(),
            reason: None,
            waited_ms: None,
            elapsed_ms: None,
            timeout_ms: None,
            delay_ms: None,
            round: None,
            count: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches capabilities.
    #[inline]
    pub fn with_capabilities<I>(mut self, caps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Capability>,
    {
        self.capabilities = caps.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the readiness wait time (stored as milliseconds).
    #[inline]
    pub fn with_waited(mut self, d: Duration) -> Self {
        self.waited_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a poll delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a poll round.
    #[inline]
    pub fn with_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count.min(u32::MAX as usize) as u32);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_reason(info)
    }

    /// Returns true for events about a specific service (as opposed to run or subscriber events).
    pub fn is_service_event(&self) -> bool {
        !matches!(
            self.kind,
            EventKind::SubscriberPanicked
                | EventKind::SubscriberOverflow
                | EventKind::RunStarted
                | EventKind::RunFinished
                | EventKind::AbortRequested
                | EventKind::GraceExceeded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::RunStarted);
        let b = Event::new(EventKind::RunFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_saturate() {
        let ev = Event::new(EventKind::ServiceStarted).with_elapsed(Duration::from_secs(u64::MAX));
        assert_eq!(ev.elapsed_ms, Some(u32::MAX));
        assert!(ev.is_service_event());
        assert!(!Event::new(EventKind::AbortRequested).is_service_event());
    }
}
