//! # bootvisor
//!
//! **Bootvisor** is a concurrent, dependency-aware service startup orchestrator.
//!
//! Each [`Service`] declares the abstract capabilities it **needs** before it
//! may start and the ones it **provides** once started. The [`Orchestrator`]
//! launches every service exactly once, concurrently, as soon as all of its
//! needs have been provided by other services. There is no static graph
//! analysis: satisfaction is discovered while the run progresses.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Service    │   │   Service    │   │   Service    │
//!     │ net: → [net] │   │db: [net]→[db]│   │ app: [db] →  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator::run (one run)                                      │
//! │  - Bus (broadcast events)                                         │
//! │  - CapabilityRegistry (grow-only set + generation watch)          │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! │  - Semaphore (optional, Config::max_concurrent)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ LaunchActor  │   │ LaunchActor  │   │ LaunchActor  │
//!     │ wait → start │   │ wait → start │   │ wait → start │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ provide([net])   │ satisfies([net])?│ satisfies([db])?
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                       CapabilityRegistry                          │
//! └───────────────────────────────────────────────────────────────────┘
//!
//!   LaunchActor ── publish(Event) ──► Bus ──► event_listener ──► SubscriberSet
//!                                                        ┌─────────┼─────────┐
//!                                                        ▼         ▼         ▼
//!                                                     worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle of one service
//! ```text
//! NotStarted ──► (needs satisfied) ──► Starting ──► Started ──► provide(provides)
//!      │                                   └──────► Errored   (action failed / timed out / panicked,
//!      │                                                       or abandoned after abort grace)
//!      ├──► Errored  (DependencyTimeout, TimeoutPolicy::Fail)
//!      └──► Errored  (Canceled: run aborted while waiting)
//!
//! Started ──► stop() ──► Stopped
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Services**      | Name, startup/shutdown actions, provides/needs, state.       | [`Service`], [`ServiceBuilder`]             |
//! | **Actions**       | Opaque startup/shutdown commands.                            | [`Action`], [`ShellCommand`], [`ActionFn`]  |
//! | **Orchestration** | Concurrent, readiness-gated launch of a set of services.     | [`Orchestrator`], [`ServiceCatalog`]        |
//! | **Policies**      | How long and how to wait for needs.                          | [`ReadinessPolicy`], [`WaitStrategy`]       |
//! | **Results**       | Per-service outcome and provided capabilities.               | [`RunReport`], [`ServiceOutcome`]           |
//! | **Errors**        | Typed errors for runs, services and actions.                 | [`RuntimeError`], [`StartError`]            |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, alerts).       | [`Subscribe`], [`LogWriter`]                |
//! | **Configuration** | Centralized run settings.                                    | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use bootvisor::{Config, LogWriter, Orchestrator, Service, Subscribe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let net = Service::builder("net").provides(["net"]).build();
//!     let db = Service::builder("db").needs(["net"]).provides(["db"]).build();
//!     let app = Service::builder("app").needs(["db"]).build();
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let orch = Orchestrator::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let report = orch.run([app, db, net]).await?;
//!     assert!(report.is_success());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod services;
mod subscribers;

// ---- Public re-exports ----

pub use core::{
    CapabilityRegistry, Config, Orchestrator, OrchestratorBuilder, RunReport, ServiceOutcome,
};
pub use error::{ActionError, RuntimeError, StartError, StopError};
pub use events::{Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, ReadinessPolicy, TimeoutPolicy, WaitStrategy};
pub use services::{
    Action, ActionFn, ActionRef, Capability, Noop, Service, ServiceBuilder, ServiceCatalog,
    ServiceState, ShellCommand,
};
pub use subscribers::{LogWriter, Subscribe};
