//! # LaunchActor: one launch attempt for one service.
//!
//! Waits for the service's needs, runs its startup action once and publishes
//! its provides on success. Every step is reported on the event bus.
//!
//! ## Event flow
//! ```text
//! ServiceWaiting → ServiceReady → ServiceStarting → ServiceStarted → CapabilitiesProvided
//!                                                 → ActionTimeout? → ServiceFailed
//!                → DependencyTimeout                       (TimeoutPolicy::Fail)
//!                → TimeoutIgnored → ServiceStarting → ...  (TimeoutPolicy::StartAnyway)
//!                → ServiceCanceled                         (run aborted)
//! ServiceSkipped                                           (not NotStarted on entry)
//! ```
//!
//! ## Architecture
//! ```text
//! Orchestrator ──► LaunchActor::run(token)
//!   ├─► state != NotStarted ─► ServiceSkipped (re-publish provides if Started)
//!   ├─► ReadinessWait::wait()       (no permit held)
//!   │     ├─► Ready
//!   │     ├─► TimedOut ─► Fail ─► fail_pending() ─► DependencyTimeout
//!   │     │           └─► StartAnyway ─► continue
//!   │     └─► Canceled ─► fail_pending() ─► Canceled
//!   ├─► acquire semaphore           (cancellable)
//!   ├─► Service::start_with(token, action_timeout)
//!   └─► Ok ─► registry.provide(provides)
//! ```
//!
//! ## Rules
//! - One attempt per service per run; a failed startup action is never retried.
//! - Provides are written only after the startup action succeeded.
//! - The concurrency permit covers the startup action only, never the wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, sync::Semaphore, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::core::readiness::{Readiness, ReadinessWait};
use crate::core::registry::CapabilityRegistry;
use crate::core::report::ServiceOutcome;
use crate::error::{ActionError, StartError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::{ReadinessPolicy, TimeoutPolicy};
use crate::services::{Service, ServiceState};

/// Per-run parameters shared by all launch attempts.
#[derive(Clone, Debug)]
pub(crate) struct LaunchParams {
    /// How to wait for needs.
    pub readiness: ReadinessPolicy,
    /// Optional startup action timeout (`None` = no timeout).
    pub action_timeout: Option<Duration>,
}

/// Drives a single service from `NotStarted` to a terminal outcome.
pub(crate) struct LaunchActor {
    /// Service to launch.
    pub service: Arc<Service>,
    /// Registry of the current run.
    pub registry: Arc<CapabilityRegistry>,
    /// Readiness and timeout settings.
    pub params: LaunchParams,
    /// Event bus of the current run.
    pub bus: Bus,
    /// Optional global limit on concurrent startup actions.
    pub semaphore: Option<Arc<Semaphore>>,
}

impl LaunchActor {
    /// Runs the attempt to completion and returns the service's outcome.
    ///
    /// `token` is the run token: cancelling it interrupts the readiness wait,
    /// the semaphore acquisition and the startup action.
    pub(crate) async fn run(self, token: CancellationToken) -> ServiceOutcome {
        let state = self.service.state();
        if state != ServiceState::NotStarted {
            return self.skip(state).await;
        }

        let needs = self.service.needs();
        if !needs.is_empty() {
            self.publish(EventKind::ServiceWaiting, |e| e.with_capabilities(needs));
        }

        let readiness = ReadinessWait {
            service: self.service.name(),
            needs,
            registry: &self.registry,
            policy: &self.params.readiness,
            bus: &self.bus,
        }
        .wait(&token)
        .await;

        let waited = match readiness {
            Readiness::Ready { waited } => {
                if !needs.is_empty() {
                    self.publish(EventKind::ServiceReady, |e| e.with_waited(waited));
                }
                waited
            }
            Readiness::TimedOut { missing, waited } => match self.params.readiness.on_timeout {
                TimeoutPolicy::Fail => {
                    if let Err(state) = self.service.fail_pending() {
                        return self.skip(state).await;
                    }
                    self.publish(EventKind::DependencyTimeout, |e| {
                        e.with_capabilities(&missing).with_waited(waited)
                    });
                    let err = StartError::DependencyTimeout {
                        service: self.service.name().to_string(),
                        missing,
                        waited,
                    };
                    return self.outcome(Some(err), waited, Duration::ZERO);
                }
                TimeoutPolicy::StartAnyway => {
                    self.publish(EventKind::TimeoutIgnored, |e| {
                        e.with_capabilities(&missing).with_waited(waited)
                    });
                    waited
                }
            },
            Readiness::Canceled { waited } => return self.cancel(waited).await,
        };

        let _permit = match &self.semaphore {
            Some(sem) => {
                let permit_future = sem.clone().acquire_owned();
                tokio::pin!(permit_future);

                select! {
                    res = &mut permit_future => match res {
                        Ok(permit) => Some(permit),
                        Err(_closed) => return self.cancel(waited).await,
                    },
                    _ = token.cancelled() => return self.cancel(waited).await,
                }
            }
            None => None,
        };

        let action = self.service.startup().describe().to_string();
        self.publish(EventKind::ServiceStarting, |e| e.with_reason(action));

        let began = Instant::now();
        let res = self
            .service
            .start_with(&token, self.params.action_timeout)
            .await;
        let elapsed = began.elapsed();

        match res {
            Ok(()) => {
                self.publish(EventKind::ServiceStarted, |e| e.with_elapsed(elapsed));
                self.publish_provides().await;
                self.outcome(None, waited, elapsed)
            }
            Err(err) if err.is_already() => {
                self.publish(EventKind::ServiceSkipped, |e| {
                    e.with_reason(self.service.state().as_label())
                });
                self.outcome(Some(err), waited, Duration::ZERO)
            }
            Err(err) => {
                if let StartError::StartupActionFailed {
                    source: ActionError::Timeout { timeout },
                    ..
                } = &err
                {
                    let timeout = *timeout;
                    self.publish(EventKind::ActionTimeout, |e| e.with_timeout(timeout));
                }
                self.publish(EventKind::ServiceFailed, |e| {
                    e.with_reason(err.to_string()).with_elapsed(elapsed)
                });
                self.outcome(Some(err), waited, elapsed)
            }
        }
    }

    /// The service left `NotStarted` before this attempt could claim it.
    async fn skip(&self, state: ServiceState) -> ServiceOutcome {
        let name = self.service.name();
        let err = StartError::blocked_by(name, state).unwrap_or_else(|| {
            StartError::AlreadyInProgress {
                service: name.to_string(),
            }
        });
        self.publish(EventKind::ServiceSkipped, |e| e.with_reason(state.as_label()));
        if state == ServiceState::Started {
            self.publish_provides().await;
        }
        self.outcome(Some(err), Duration::ZERO, Duration::ZERO)
    }

    async fn cancel(&self, waited: Duration) -> ServiceOutcome {
        if let Err(state) = self.service.fail_pending() {
            return self.skip(state).await;
        }
        self.publish(EventKind::ServiceCanceled, |e| e.with_waited(waited));
        let err = StartError::Canceled {
            service: self.service.name().to_string(),
        };
        self.outcome(Some(err), waited, Duration::ZERO)
    }

    async fn publish_provides(&self) {
        let provides = self.service.provides();
        if provides.is_empty() {
            return;
        }
        let added = self.registry.provide(provides).await;
        if !added.is_empty() {
            self.publish(EventKind::CapabilitiesProvided, |e| e.with_capabilities(added));
        }
    }

    fn publish(&self, kind: EventKind, with: impl FnOnce(Event) -> Event) {
        self.bus
            .publish(with(Event::new(kind).with_service(self.service.name())));
    }

    fn outcome(
        &self,
        error: Option<StartError>,
        waited: Duration,
        elapsed: Duration,
    ) -> ServiceOutcome {
        ServiceOutcome {
            name: self.service.name().to_string(),
            state: self.service.state(),
            error,
            waited,
            elapsed,
        }
    }
}
