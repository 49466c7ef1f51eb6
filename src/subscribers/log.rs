//! # LogWriter: events rendered through `tracing`.
//!
//! Maps each [`Event`] to a `tracing` record with structured fields. Install
//! any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  bootvisor: run started count=3
//! DEBUG bootvisor: waiting for capabilities service="db" needs=[net]
//! INFO  bootvisor: starting service service="db" action="pg_ctl start"
//! INFO  bootvisor: service started service="db" elapsed_ms=412
//! WARN  bootvisor: dependency timeout service="app" missing=[cache] waited_ms=120000
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "bootvisor";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let caps = &e.capabilities;

        match e.kind {
            EventKind::RunStarted => info!(target: TARGET, count = ?e.count, "run started"),
            EventKind::RunFinished => info!(
                target: TARGET,
                started = ?e.count,
                elapsed_ms = ?e.elapsed_ms,
                "run finished"
            ),
            EventKind::AbortRequested => warn!(target: TARGET, reason, "run aborted"),
            EventKind::GraceExceeded => error!(
                target: TARGET,
                grace_ms = ?e.timeout_ms,
                stuck = reason,
                "abort grace exceeded"
            ),
            EventKind::ServiceWaiting => {
                debug!(target: TARGET, service, needs = ?caps, "waiting for capabilities")
            }
            EventKind::PollScheduled => debug!(
                target: TARGET,
                service,
                round = ?e.round,
                delay_ms = ?e.delay_ms,
                "capabilities not ready, polling again"
            ),
            EventKind::ServiceReady => {
                debug!(target: TARGET, service, waited_ms = ?e.waited_ms, "capabilities ready")
            }
            EventKind::DependencyTimeout => warn!(
                target: TARGET,
                service,
                missing = ?caps,
                waited_ms = ?e.waited_ms,
                "dependency timeout"
            ),
            EventKind::TimeoutIgnored => warn!(
                target: TARGET,
                service,
                missing = ?caps,
                waited_ms = ?e.waited_ms,
                "dependency timeout, starting anyway"
            ),
            EventKind::ServiceSkipped => {
                info!(target: TARGET, service, state = reason, "service not startable, skipped")
            }
            EventKind::ServiceStarting => {
                info!(target: TARGET, service, action = reason, "starting service")
            }
            EventKind::ServiceStarted => {
                info!(target: TARGET, service, elapsed_ms = ?e.elapsed_ms, "service started")
            }
            EventKind::ActionTimeout => {
                warn!(target: TARGET, service, timeout_ms = ?e.timeout_ms, "startup action timed out")
            }
            EventKind::ServiceFailed => error!(
                target: TARGET,
                service,
                error = reason,
                elapsed_ms = ?e.elapsed_ms,
                "service failed to start"
            ),
            EventKind::CapabilitiesProvided => {
                debug!(target: TARGET, service, provides = ?caps, "capabilities provided")
            }
            EventKind::ServiceCanceled => {
                warn!(target: TARGET, service, "service canceled before start")
            }
            EventKind::LaunchPanicked => {
                error!(target: TARGET, service, panic = reason, "launch attempt panicked")
            }
            EventKind::SubscriberOverflow => {
                warn!(target: TARGET, subscriber = service, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                error!(target: TARGET, subscriber = service, panic = reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
