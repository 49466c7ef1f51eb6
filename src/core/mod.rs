//! Runtime core: readiness, launch attempts and orchestration.
//!
//! The public API from this module is [`Orchestrator`] (with its builder and
//! [`Config`]), the [`CapabilityRegistry`] and the run results.
//!
//! Internal modules:
//! - [`runner`]: executes one action with timeout and cancellation;
//! - [`readiness`]: waits for a service's needs (notify or poll);
//! - [`actor`]: one launch attempt per service;
//! - [`orchestrator`]: fan-out/fan-in, abort and grace handling;
//! - [`shutdown`]: abort triggers (caller token, run deadline, OS signals);
//! - [`registry`]: the run-scoped capability set.

mod actor;
mod builder;
mod config;
mod orchestrator;
mod readiness;
mod registry;
mod report;
pub(crate) mod runner;
mod shutdown;

pub use builder::OrchestratorBuilder;
pub use config::Config;
pub use orchestrator::Orchestrator;
pub use registry::CapabilityRegistry;
pub use report::{RunReport, ServiceOutcome};
