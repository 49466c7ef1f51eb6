//! # Run a single action execution.
//!
//! Executes one [`Action`] with a child cancellation token and an optional
//! timeout. Used by [`Service::start_with`](crate::Service::start_with) and
//! [`Service::stop_with`](crate::Service::stop_with).
//!
//! ```text
//! Success:      action.run() → Ok(())
//! Failure:      action.run() → Err(e)            → Err(e)
//! Timeout:      timeout exceeded → cancel child  → Err(Timeout)
//! Cancellation: parent cancelled → child sees it → Err(Canceled) (from the action)
//! Panic:        action.run() unwinds             → Err(Panicked)
//! ```
//!
//! ## Rules
//! - Derives a **child token** per execution; cancelling it never affects the parent.
//! - A zero timeout means no timeout.
//! - A panicking action is a failed action; the unwind never reaches the caller.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::{ActionError, panic_message};
use crate::services::Action;

/// Runs `action` once under `parent`, bounded by `timeout` when set.
pub(crate) async fn run_action<A: Action + ?Sized>(
    action: &A,
    parent: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<(), ActionError> {
    let child = parent.child_token();
    let guarded = AssertUnwindSafe(action.run(child.clone()))
        .catch_unwind()
        .map(|res| {
            res.unwrap_or_else(|panic| {
                Err(ActionError::Panicked {
                    message: panic_message(panic.as_ref()),
                })
            })
        });

    match timeout.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, guarded).await {
            Ok(res) => res,
            Err(_elapsed) => {
                child.cancel();
                Err(ActionError::Timeout { timeout: dur })
            }
        },
        None => guarded.await,
    }
}
