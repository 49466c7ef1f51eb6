//! # Startup/shutdown actions.
//!
//! An [`Action`] is the opaque command a service runs to start or stop. The
//! runtime only executes it and observes success or failure; it never looks
//! inside.
//!
//! Provided implementations:
//! - [`ShellCommand`](crate::ShellCommand): `/bin/sh -c <command>`;
//! - [`ActionFn`]: wraps a closure producing a fresh future per run;
//! - [`Noop`]: succeeds immediately (default shutdown action).
//!
//! The common handle type is [`ActionRef`], an `Arc<dyn Action>`.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ActionError;

/// Shared handle to an action.
pub type ActionRef = Arc<dyn Action>;

/// # Asynchronous, cancelable command.
///
/// Implementors should watch `ctx` and return [`ActionError::Canceled`]
/// promptly once it fires.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use bootvisor::{Action, ActionError};
///
/// struct Migrate;
///
/// #[async_trait]
/// impl Action for Migrate {
///     fn describe(&self) -> &str { "migrate" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), ActionError> {
///         if ctx.is_cancelled() {
///             return Err(ActionError::Canceled);
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Action: Send + Sync + 'static {
    /// Short description used in events and logs (e.g. the command line).
    fn describe(&self) -> &str;

    /// Executes the action once.
    async fn run(&self, ctx: CancellationToken) -> Result<(), ActionError>;
}

/// Function-backed action.
///
/// Wraps a closure that *creates* a new future per run, so nothing is shared
/// between runs unless the closure captures an `Arc` explicitly.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use bootvisor::{ActionError, ActionFn, ActionRef};
///
/// let a: ActionRef = ActionFn::arc("warmup", |_ctx: CancellationToken| async {
///     Ok::<_, ActionError>(())
/// });
/// assert_eq!(a.describe(), "warmup");
/// ```
#[derive(Debug)]
pub struct ActionFn<F> {
    label: Cow<'static, str>,
    f: F,
}

impl<F> ActionFn<F> {
    /// Creates a new function-backed action.
    pub fn new(label: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }

    /// Creates the action and returns it as a shared handle.
    pub fn arc(label: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(label, f))
    }
}

#[async_trait]
impl<F, Fut> Action for ActionFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
{
    fn describe(&self) -> &str {
        &self.label
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ActionError> {
        (self.f)(ctx).await
    }
}

/// Action that does nothing and always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct Noop;

#[async_trait]
impl Action for Noop {
    fn describe(&self) -> &str {
        "noop"
    }

    async fn run(&self, _ctx: CancellationToken) -> Result<(), ActionError> {
        Ok(())
    }
}
