//! # Readiness wait: block a launch attempt until its needs are present.
//!
//! ## Notify strategy (default)
//! ```text
//! loop {
//!   ├─► rx.borrow_and_update()        (mark generation seen)
//!   ├─► registry.satisfies(needs)     ─► Ready
//!   └─► select! {
//!         rx.changed()                ─► loop
//!         sleep_until(deadline)       ─► TimedOut { missing }
//!         token.cancelled()           ─► Canceled
//!       }
//! }
//! ```
//! Marking the generation seen **before** checking means a publish landing
//! between the check and the `select!` still wakes the waiter.
//!
//! ## Poll strategy
//! ```text
//! for round in 0..max_attempts {
//!   ├─► registry.satisfies(needs)     ─► Ready
//!   └─► sleep(backoff.next(round))    (cancellable, bounded by deadline)
//! }
//! final check ─► Ready | TimedOut
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::registry::CapabilityRegistry;
use crate::events::{Bus, Event, EventKind};
use crate::policies::{BackoffPolicy, ReadinessPolicy, WaitStrategy};
use crate::services::Capability;

/// Result of a readiness wait.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Readiness {
    /// All needs present.
    Ready { waited: Duration },
    /// Budget exhausted; `missing` were still absent.
    TimedOut {
        missing: Vec<Capability>,
        waited: Duration,
    },
    /// The run was aborted while waiting.
    Canceled { waited: Duration },
}

/// Inputs of one readiness wait.
pub(crate) struct ReadinessWait<'a> {
    pub service: &'a str,
    pub needs: &'a BTreeSet<Capability>,
    pub registry: &'a CapabilityRegistry,
    pub policy: &'a ReadinessPolicy,
    pub bus: &'a Bus,
}

impl ReadinessWait<'_> {
    /// Waits per the policy's strategy and deadline; returns immediately for empty needs.
    pub(crate) async fn wait(&self, token: &CancellationToken) -> Readiness {
        let began = Instant::now();
        if self.needs.is_empty() {
            return Readiness::Ready {
                waited: Duration::ZERO,
            };
        }
        let deadline = self.policy.budget().map(|d| began + d);

        let ready = match self.policy.wait {
            WaitStrategy::Notify => self.notify(deadline, token).await,
            WaitStrategy::Poll {
                backoff,
                max_attempts,
            } => self.poll(backoff, max_attempts, deadline, token).await,
        };

        let waited = began.elapsed();
        match ready {
            Some(true) => Readiness::Ready { waited },
            Some(false) => Readiness::TimedOut {
                missing: self.registry.missing(self.needs).await,
                waited,
            },
            None => Readiness::Canceled { waited },
        }
    }

    /// `Some(true)` = ready, `Some(false)` = timed out, `None` = canceled.
    async fn notify(&self, deadline: Option<Instant>, token: &CancellationToken) -> Option<bool> {
        let mut rx = self.registry.subscribe();
        loop {
            rx.borrow_and_update();
            if self.registry.satisfies(self.needs).await {
                return Some(true);
            }
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        return Some(false);
                    }
                }
                _ = sleep_until(deadline) => return Some(false),
                _ = token.cancelled() => return None,
            }
        }
    }

    async fn poll(
        &self,
        backoff: BackoffPolicy,
        max_attempts: u32,
        deadline: Option<Instant>,
        token: &CancellationToken,
    ) -> Option<bool> {
        for round in 0..max_attempts {
            if self.registry.satisfies(self.needs).await {
                return Some(true);
            }
            let delay = backoff.next(round);
            self.bus.publish(
                Event::new(EventKind::PollScheduled)
                    .with_service(self.service)
                    .with_round(round)
                    .with_delay(delay),
            );
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = sleep_until(deadline) => break,
                _ = token.cancelled() => return None,
            }
        }
        Some(self.registry.satisfies(self.needs).await)
    }
}

/// Sleeps until `deadline`, or forever when there is none.
pub(crate) async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
