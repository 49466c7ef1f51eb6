//! # Service model.
//!
//! - [`Capability`]: opaque token a service provides or needs
//! - [`ServiceState`]: lifecycle state machine
//! - [`Action`]: startup/shutdown command ([`ShellCommand`], [`ActionFn`], [`Noop`])
//! - [`Service`]: a named unit with actions, provides/needs sets and its state
//! - [`ServiceCatalog`]: services grouped by capability (configuration input)

mod action;
mod capability;
mod catalog;
mod service;
mod shell;
mod state;

pub use action::{Action, ActionFn, ActionRef, Noop};
pub use capability::Capability;
pub use catalog::ServiceCatalog;
pub use service::{Service, ServiceBuilder};
pub use shell::ShellCommand;
pub use state::ServiceState;

pub(crate) use catalog::dedupe;
