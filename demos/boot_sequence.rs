//! # Boot sequence
//!
//! Demonstrates:
//! - services gated on capabilities (net → db → app)
//! - shell command and closure actions
//! - a service whose provider never appears (dependency timeout)
//! - `LogWriter` rendering lifecycle events through `tracing`
//!
//! Run with `RUST_LOG=bootvisor=debug cargo run --example boot_sequence`.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bootvisor::{
    ActionError, ActionFn, Config, LogWriter, Orchestrator, ReadinessPolicy, Service, Subscribe,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bootvisor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let net = Service::builder("network")
        .startup_cmd("sleep 0.2 && echo link up")
        .provides(["net"])
        .build();

    let db = Service::builder("database")
        .startup(ActionFn::new("open pool", |ctx: CancellationToken| async move {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(300)) => Ok(()),
                _ = ctx.cancelled() => Err(ActionError::Canceled),
            }
        }))
        .shutdown_cmd("true")
        .needs(["net"])
        .provides(["db"])
        .build();

    let app = Service::builder("app")
        .startup_cmd("echo serving")
        .needs(["db", "net"])
        .build();

    let metrics = Service::builder("metrics")
        .startup_cmd("true")
        .needs(["tsdb"])
        .build();

    let cfg = Config {
        readiness: ReadinessPolicy::default().with_deadline(Duration::from_secs(2)),
        action_timeout: Duration::from_secs(10),
        abort_on_signal: true,
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let orch = Orchestrator::builder(cfg).with_subscribers(subs).build();

    let report = orch.run([app, metrics, db.clone(), net]).await?;

    for outcome in &report {
        match &outcome.error {
            None => println!(
                "{:<10} {} (waited {:?})",
                outcome.name, outcome.state, outcome.waited
            ),
            Some(err) => println!(
                "{:<10} {} [{}] {}",
                outcome.name,
                outcome.state,
                err.as_label(),
                err.as_message()
            ),
        }
    }
    println!("provided: {:?}", report.provided);

    db.stop().await?;
    Ok(())
}
