//! # Run results.
//!
//! [`RunReport`] is what [`Orchestrator::run`](crate::Orchestrator::run) returns
//! when the run itself completed: one [`ServiceOutcome`] per input service (in
//! input order) plus the capabilities the run ended up providing.
//!
//! Per-service failures (dependency timeouts, failed startup actions) live in
//! the outcomes; they never fail the run.

use std::time::Duration;

use crate::error::StartError;
use crate::services::{Capability, ServiceState};

/// Final outcome of one service's launch attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceOutcome {
    /// Service name.
    pub name: String,
    /// Service state when the attempt ended.
    pub state: ServiceState,
    /// Why the service did not start in this run (`None` = started here).
    pub error: Option<StartError>,
    /// Time spent waiting for needs.
    pub waited: Duration,
    /// Duration of the startup action (zero if it never ran).
    pub elapsed: Duration,
}

impl ServiceOutcome {
    /// Returns true if this run started the service.
    pub fn is_started(&self) -> bool {
        self.error.is_none() && self.state == ServiceState::Started
    }
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// One outcome per service, in input order.
    pub outcomes: Vec<ServiceOutcome>,
    /// Every capability present in the registry when the run ended (sorted).
    pub provided: Vec<Capability>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl RunReport {
    /// Returns true if every service started in this run.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(ServiceOutcome::is_started)
    }

    /// Looks up the outcome of a service by name.
    pub fn get(&self, name: &str) -> Option<&ServiceOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Outcomes that carry an error.
    pub fn failures(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }

    /// Names of services started in this run, in input order.
    pub fn started(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_started())
            .map(|o| o.name.as_str())
            .collect()
    }
}

impl<'a> IntoIterator for &'a RunReport {
    type Item = &'a ServiceOutcome;
    type IntoIter = std::slice::Iter<'a, ServiceOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, state: ServiceState, error: Option<StartError>) -> ServiceOutcome {
        ServiceOutcome {
            name: name.into(),
            state,
            error,
            waited: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn success_requires_every_service_started() {
        let mut report = RunReport {
            outcomes: vec![
                outcome("net", ServiceState::Started, None),
                outcome("db", ServiceState::Started, None),
            ],
            ..RunReport::default()
        };
        assert!(report.is_success());
        assert_eq!(report.started(), vec!["net", "db"]);

        report.outcomes.push(outcome(
            "app",
            ServiceState::Errored,
            Some(StartError::Canceled {
                service: "app".into(),
            }),
        ));
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.get("app").map(|o| o.state), Some(ServiceState::Errored));
        assert!(report.get("cache").is_none());
    }

    #[test]
    fn already_started_is_not_started_here() {
        let o = outcome(
            "net",
            ServiceState::Started,
            Some(StartError::AlreadyStarted {
                service: "net".into(),
            }),
        );
        assert!(!o.is_started());
    }
}
