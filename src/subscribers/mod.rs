//! # Event subscribers.
//!
//! ```text
//! LaunchActor ── publish(Event) ──► Bus ──► event_listener ──► SubscriberSet
//!                                                                   │
//!                                                    ┌──────────────┼──────────┐
//!                                                    ▼              ▼          ▼
//!                                                LogWriter       Metrics    Custom
//! ```
//!
//! - [`Subscribe`]: trait for custom observers
//! - [`LogWriter`]: renders events through `tracing`

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub(crate) use set::SubscriberSet;
pub use subscriber::Subscribe;
