//! Error types used by the bootvisor runtime, services and actions.
//!
//! This module defines four enums:
//!
//! - [`RuntimeError`]: errors raised by the orchestration run itself.
//! - [`StartError`]: why a single service did not reach `Started`.
//! - [`StopError`]: why a service's shutdown did not complete.
//! - [`ActionError`]: failures reported by a startup/shutdown [`Action`](crate::Action).
//!
//! All of them provide `as_label` (stable snake_case label for logs) and
//! `as_message` (human-readable details).

use std::time::Duration;
use thiserror::Error;

use crate::core::RunReport;
use crate::services::{Capability, ServiceState};

/// # Errors produced by an orchestration run.
///
/// These abort the run as a whole. Per-service failures never show up here;
/// they are attached to the service's outcome in the [`RunReport`](crate::RunReport).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Two distinct services in the same run share a name.
    #[error("duplicate service name {name:?} in run")]
    DuplicateService {
        /// The repeated name.
        name: String,
    },

    /// The run was aborted and some launch attempts did not finish within the grace period.
    ///
    /// The attempts were dropped; `report` still holds every outcome, with
    /// the stuck services `Errored` by [`StartError::Abandoned`].
    #[error("abort grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Services whose launch attempt was still running.
        stuck: Vec<String>,
        /// Outcomes of the whole run.
        report: RunReport,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use bootvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded {
    ///     grace: Duration::from_secs(5),
    ///     stuck: vec![],
    ///     report: Default::default(),
    /// };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::DuplicateService { .. } => "runtime_duplicate_service",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::DuplicateService { name } => format!("service {name} listed twice"),
            RuntimeError::GraceExceeded { grace, stuck, .. } => {
                format!("grace exceeded after {grace:?}; stuck services={stuck:?}")
            }
        }
    }
}

/// # Errors produced while starting a service.
///
/// The `Already*` variants come from the state guard in
/// [`Service::start`](crate::Service::start): nothing ran and nothing changed.
/// The rest mean the service ended in [`ServiceState::Errored`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StartError {
    /// Another caller is currently running the startup action.
    #[error("service {service} is being started")]
    AlreadyInProgress { service: String },

    /// The service has already started.
    #[error("service {service} is already started")]
    AlreadyStarted { service: String },

    /// The service was stopped.
    #[error("service {service} is stopped")]
    AlreadyStopped { service: String },

    /// A previous start of this service failed.
    #[error("service {service} is errored")]
    AlreadyErrored { service: String },

    /// The startup action reported failure.
    #[error("service {service} failed to start: {source}")]
    StartupActionFailed {
        service: String,
        #[source]
        source: ActionError,
    },

    /// Required capabilities never became available within the readiness budget.
    #[error("service {service} gave up after {waited:?} waiting for {missing:?}")]
    DependencyTimeout {
        service: String,
        /// Capabilities still absent when the budget ran out.
        missing: Vec<Capability>,
        /// Time spent waiting.
        waited: Duration,
    },

    /// The run was aborted before the service could start.
    #[error("service {service} canceled before start")]
    Canceled { service: String },

    /// The launch attempt task panicked.
    #[error("launch attempt for service {service} panicked")]
    LaunchPanicked { service: String },

    /// The run was aborted and the launch attempt outlived the grace period.
    #[error("service {service} abandoned after abort grace {grace:?}")]
    Abandoned { service: String, grace: Duration },
}

impl StartError {
    /// Builds the `Already*` error matching a state that blocks `start()`.
    ///
    /// Returns `None` for [`ServiceState::NotStarted`], which never blocks.
    pub fn blocked_by(service: &str, state: ServiceState) -> Option<Self> {
        let service = service.to_string();
        match state {
            ServiceState::NotStarted => None,
            ServiceState::Starting => Some(StartError::AlreadyInProgress { service }),
            ServiceState::Started => Some(StartError::AlreadyStarted { service }),
            ServiceState::Stopped => Some(StartError::AlreadyStopped { service }),
            ServiceState::Errored => Some(StartError::AlreadyErrored { service }),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use bootvisor::StartError;
    ///
    /// let err = StartError::AlreadyStarted { service: "db".into() };
    /// assert_eq!(err.as_label(), "start_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StartError::AlreadyInProgress { .. } => "start_already_in_progress",
            StartError::AlreadyStarted { .. } => "start_already_started",
            StartError::AlreadyStopped { .. } => "start_already_stopped",
            StartError::AlreadyErrored { .. } => "start_already_errored",
            StartError::StartupActionFailed { .. } => "start_action_failed",
            StartError::DependencyTimeout { .. } => "start_dependency_timeout",
            StartError::Canceled { .. } => "start_canceled",
            StartError::LaunchPanicked { .. } => "start_launch_panicked",
            StartError::Abandoned { .. } => "start_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StartError::StartupActionFailed { source, .. } => {
                format!("startup action: {}", source.as_message())
            }
            StartError::DependencyTimeout {
                missing, waited, ..
            } => {
                let missing: Vec<&str> = missing.iter().map(Capability::as_str).collect();
                format!("missing [{}] after {waited:?}", missing.join(", "))
            }
            other => other.to_string(),
        }
    }

    /// Indicates a benign repeat: `start()` was refused by the state guard and
    /// nothing was executed.
    ///
    /// # Example
    /// ```
    /// use bootvisor::StartError;
    ///
    /// assert!(StartError::AlreadyStarted { service: "a".into() }.is_already());
    /// assert!(!StartError::Canceled { service: "a".into() }.is_already());
    /// ```
    pub fn is_already(&self) -> bool {
        matches!(
            self,
            StartError::AlreadyInProgress { .. }
                | StartError::AlreadyStarted { .. }
                | StartError::AlreadyStopped { .. }
                | StartError::AlreadyErrored { .. }
        )
    }
}

/// # Errors produced while stopping a service.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StopError {
    /// Only a `Started` service can be stopped.
    #[error("service {service} is {state}, not running")]
    NotRunning {
        service: String,
        state: ServiceState,
    },

    /// The shutdown action reported failure; the service is now `Errored`.
    #[error("service {service} failed to shut down: {source}")]
    ShutdownActionFailed {
        service: String,
        #[source]
        source: ActionError,
    },
}

impl StopError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopError::NotRunning { .. } => "stop_not_running",
            StopError::ShutdownActionFailed { .. } => "stop_action_failed",
        }
    }
}

/// # Errors reported by a startup or shutdown action.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    /// The command could not be launched at all.
    #[error("spawn failed: {error}")]
    Spawn { error: String },

    /// The command ran and exited unsuccessfully.
    #[error("exited with {status}: {stderr}")]
    Exited {
        /// Exit status as rendered by the OS (code or signal).
        status: String,
        /// Captured diagnostic output (trimmed).
        stderr: String,
    },

    /// Action-specific failure (used by closure-backed actions).
    #[error("{error}")]
    Failed { error: String },

    /// The action exceeded its timeout and was canceled.
    #[error("timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The action observed cancellation and gave up.
    #[error("canceled")]
    Canceled,

    /// The action panicked while running.
    #[error("panicked: {message}")]
    Panicked { message: String },
}

impl ActionError {
    /// Convenience constructor for [`ActionError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        ActionError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Spawn { .. } => "action_spawn",
            ActionError::Exited { .. } => "action_exited",
            ActionError::Failed { .. } => "action_failed",
            ActionError::Timeout { .. } => "action_timeout",
            ActionError::Canceled => "action_canceled",
            ActionError::Panicked { .. } => "action_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActionError::Exited { status, stderr } if stderr.is_empty() => {
                format!("exited with {status}")
            }
            other => other.to_string(),
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_by_maps_every_non_initial_state() {
        assert!(StartError::blocked_by("a", ServiceState::NotStarted).is_none());
        let labels: Vec<&str> = [
            ServiceState::Starting,
            ServiceState::Started,
            ServiceState::Stopped,
            ServiceState::Errored,
        ]
        .into_iter()
        .filter_map(|s| StartError::blocked_by("a", s))
        .map(|e| e.as_label())
        .collect();
        assert_eq!(
            labels,
            [
                "start_already_in_progress",
                "start_already_started",
                "start_already_stopped",
                "start_already_errored",
            ]
        );
    }

    #[test]
    fn dependency_timeout_message_lists_missing() {
        let err = StartError::DependencyTimeout {
            service: "app".into(),
            missing: vec![Capability::from("db"), Capability::from("net")],
            waited: Duration::from_secs(2),
        };
        assert_eq!(err.as_message(), "missing [db, net] after 2s");
        assert!(!err.is_already());
    }

    #[test]
    fn action_failure_is_the_source() {
        use std::error::Error as _;

        let err = StartError::StartupActionFailed {
            service: "db".into(),
            source: ActionError::Exited {
                status: "exit status: 3".into(),
                stderr: String::new(),
            },
        };
        assert_eq!(err.as_message(), "startup action: exited with exit status: 3");
        assert!(err.source().is_some());
    }
}
