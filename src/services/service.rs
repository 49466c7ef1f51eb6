//! # Service definition and its start/stop state machine.
//!
//! A [`Service`] bundles a name, a startup and a shutdown [`Action`], the
//! capabilities it `provides` once started and the ones it `needs` before it
//! may start. Everything except the lifecycle state is immutable once built.
//!
//! ## Rules
//! - `start()` proceeds only from `NotStarted`; otherwise it returns the matching
//!   `Already*` error and runs nothing.
//! - The state flips to `Starting` (compare-and-swap) **before** the action runs,
//!   so concurrent callers observe the guard and the action runs at most once.
//! - `stop()` proceeds only from `Started`.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::runner::run_action;
use crate::error::{StartError, StopError};
use crate::services::action::{Action, ActionRef, Noop};
use crate::services::capability::Capability;
use crate::services::shell::ShellCommand;
use crate::services::state::{AtomicServiceState, ServiceState};

/// A unit of orchestration.
///
/// Build one with [`Service::builder`].
pub struct Service {
    name: Arc<str>,
    startup: ActionRef,
    shutdown: ActionRef,
    provides: BTreeSet<Capability>,
    needs: BTreeSet<Capability>,
    state: AtomicServiceState,
}

impl Service {
    /// Starts building a service called `name`.
    ///
    /// # Example
    /// ```
    /// use bootvisor::{Service, ServiceState};
    ///
    /// let db = Service::builder("db")
    ///     .startup_cmd("pg_ctl start")
    ///     .shutdown_cmd("pg_ctl stop")
    ///     .provides(["db"])
    ///     .needs(["net"])
    ///     .build();
    ///
    /// assert_eq!(db.name(), "db");
    /// assert_eq!(db.state(), ServiceState::NotStarted);
    /// ```
    pub fn builder(name: impl Into<Cow<'static, str>>) -> ServiceBuilder {
        ServiceBuilder::new(name)
    }

    /// Returns the service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.state.load()
    }

    /// Capabilities published once the service has started.
    pub fn provides(&self) -> &BTreeSet<Capability> {
        &self.provides
    }

    /// Capabilities that must be present before the service may start.
    pub fn needs(&self) -> &BTreeSet<Capability> {
        &self.needs
    }

    /// Returns the startup action.
    pub fn startup(&self) -> &ActionRef {
        &self.startup
    }

    /// Returns the shutdown action.
    pub fn shutdown(&self) -> &ActionRef {
        &self.shutdown
    }

    /// Runs the startup action with no timeout and a fresh cancellation token.
    ///
    /// See [`Service::start_with`].
    pub async fn start(&self) -> Result<(), StartError> {
        self.start_with(&CancellationToken::new(), None).await
    }

    /// Runs the startup action once.
    ///
    /// ### Flow
    /// 1. `NotStarted → Starting`, or return the `Already*` error for the blocking state.
    /// 2. Run the startup action under a child of `ctx`, bounded by `timeout`.
    /// 3. `Starting → Started` on success, `Starting → Errored` otherwise
    ///    (timeout and cancellation count as failures).
    pub async fn start_with(
        &self,
        ctx: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<(), StartError> {
        self.state
            .transition(ServiceState::NotStarted, ServiceState::Starting)
            .map_err(|blocking| self.blocked(blocking))?;

        match run_action(self.startup.as_ref(), ctx, timeout).await {
            Ok(()) => {
                self.state.store(ServiceState::Started);
                Ok(())
            }
            Err(source) => {
                self.state.store(ServiceState::Errored);
                Err(StartError::StartupActionFailed {
                    service: self.name.to_string(),
                    source,
                })
            }
        }
    }

    /// Runs the shutdown action with no timeout and a fresh cancellation token.
    pub async fn stop(&self) -> Result<(), StopError> {
        self.stop_with(&CancellationToken::new(), None).await
    }

    /// Runs the shutdown action once.
    ///
    /// `Started → Stopped` before the action runs; a failing action moves the
    /// service to `Errored`. Stopping never retracts capabilities from any run.
    pub async fn stop_with(
        &self,
        ctx: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<(), StopError> {
        self.state
            .transition(ServiceState::Started, ServiceState::Stopped)
            .map_err(|state| StopError::NotRunning {
                service: self.name.to_string(),
                state,
            })?;

        run_action(self.shutdown.as_ref(), ctx, timeout)
            .await
            .map_err(|source| {
                self.state.store(ServiceState::Errored);
                StopError::ShutdownActionFailed {
                    service: self.name.to_string(),
                    source,
                }
            })
    }

    /// `NotStarted → Errored` for a service that will never start.
    ///
    /// Returns the blocking state if the service already left `NotStarted`.
    pub(crate) fn fail_pending(&self) -> Result<(), ServiceState> {
        self.state
            .transition(ServiceState::NotStarted, ServiceState::Errored)
    }

    /// Moves a launch that will never finish to `Errored`.
    ///
    /// Covers both `NotStarted` and `Starting`; returns the state afterwards.
    pub(crate) fn abandon(&self) -> ServiceState {
        for from in [ServiceState::NotStarted, ServiceState::Starting] {
            if self.state.transition(from, ServiceState::Errored).is_ok() {
                return ServiceState::Errored;
            }
        }
        self.state()
    }

    fn blocked(&self, state: ServiceState) -> StartError {
        StartError::blocked_by(&self.name, state).unwrap_or_else(|| StartError::AlreadyInProgress {
            service: self.name.to_string(),
        })
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("startup", &self.startup.describe())
            .field("shutdown", &self.shutdown.describe())
            .field("provides", &self.provides)
            .field("needs", &self.needs)
            .field("state", &self.state())
            .finish()
    }
}

/// Builder for [`Service`] with fluent API.
///
/// Defaults: both actions are [`Noop`], no provides, no needs.
pub struct ServiceBuilder {
    name: Cow<'static, str>,
    startup: ActionRef,
    shutdown: ActionRef,
    provides: BTreeSet<Capability>,
    needs: BTreeSet<Capability>,
}

impl ServiceBuilder {
    /// Creates a new builder with the given service name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            startup: Arc::new(Noop),
            shutdown: Arc::new(Noop),
            provides: BTreeSet::new(),
            needs: BTreeSet::new(),
        }
    }

    /// Sets the startup action.
    pub fn startup(mut self, action: impl Action) -> Self {
        self.startup = Arc::new(action);
        self
    }

    /// Sets the startup action from a shared handle.
    pub fn startup_ref(mut self, action: ActionRef) -> Self {
        self.startup = action;
        self
    }

    /// Sets the startup action to a shell command.
    pub fn startup_cmd(self, command: impl Into<String>) -> Self {
        self.startup(ShellCommand::new(command))
    }

    /// Sets the shutdown action.
    pub fn shutdown(mut self, action: impl Action) -> Self {
        self.shutdown = Arc::new(action);
        self
    }

    /// Sets the shutdown action from a shared handle.
    pub fn shutdown_ref(mut self, action: ActionRef) -> Self {
        self.shutdown = action;
        self
    }

    /// Sets the shutdown action to a shell command.
    pub fn shutdown_cmd(self, command: impl Into<String>) -> Self {
        self.shutdown(ShellCommand::new(command))
    }

    /// Adds capabilities published on successful start.
    pub fn provides<I, C>(mut self, caps: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Capability>,
    {
        self.provides.extend(caps.into_iter().map(Into::into));
        self
    }

    /// Adds capabilities required before start.
    pub fn needs<I, C>(mut self, caps: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Capability>,
    {
        self.needs.extend(caps.into_iter().map(Into::into));
        self
    }

    /// Builds the service as a shared handle, in `NotStarted` state.
    pub fn build(self) -> Arc<Service> {
        Arc::new(Service {
            name: Arc::from(self.name.as_ref()),
            startup: self.startup,
            shutdown: self.shutdown,
            provides: self.provides,
            needs: self.needs,
            state: AtomicServiceState::new(ServiceState::NotStarted),
        })
    }
}
