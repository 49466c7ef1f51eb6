//! # Orchestrator: launches every service once, as soon as its needs are met.
//!
//! The [`Orchestrator`] owns the configuration and the subscribers. Each call
//! to [`Orchestrator::run`] is an independent run with its own event bus,
//! [`CapabilityRegistry`] and subscriber workers.
//!
//! ## High-level architecture
//! ```text
//! Inputs to run():
//!   IntoIterator<Item = Arc<Service>> (or &ServiceCatalog)
//!        └─► dedupe (Arc::ptr_eq) ─► unique names? else DuplicateService
//!
//! Preparation (per run):
//!   Bus::new(cfg.bus_capacity)
//!   event_listener(): Bus.subscribe() ─► SubscriberSet::emit(Event)  (until RunFinished)
//!   CapabilityRegistry::new()
//!   semaphore from cfg.max_concurrent (None = unlimited)
//!
//! Fan-out:
//!   Service[0]   Service[1]   ...   Service[N-1]
//!       └──► LaunchActor { service, registry, params, bus, semaphore }
//!                 └──► set.spawn(actor.run(run_token.child_token()))
//!
//! Fan-in (select loop):
//!   ├─► set.join_next_with_id()     ─► record ServiceOutcome (panic → LaunchPanicked)
//!   ├─► abort_trigger()             ─► AbortRequested, run_token.cancel(), arm grace
//!   └─► grace deadline              ─► GraceExceeded, abort_all(), stuck → Abandoned
//!
//! Finish:
//!   Bus.publish(RunFinished) ─► listener drains subscriber queues ─► RunReport
//!   (wrapped in RuntimeError::GraceExceeded when any attempt was abandoned)
//! ```
//!
//! ## Rules
//! - A failing service never aborts its siblings; its error lands in its outcome.
//! - `run` returns only after every launch attempt reached a terminal outcome
//!   (or was aborted after the grace period).
//! - Every service in the run has an outcome in the report, including those
//!   abandoned after the grace period.
//! - Subscribers see `RunStarted` first and `RunFinished` last, and have
//!   processed every event by the time `run` returns.
//!
//! ## Example
//! ```rust
//! use bootvisor::{Config, Orchestrator, Service, ServiceState};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let net = Service::builder("net").provides(["net"]).build();
//!     let db = Service::builder("db").needs(["net"]).provides(["db"]).build();
//!
//!     let orch = Orchestrator::new(Config::default(), Vec::new());
//!     let report = orch.run([db.clone(), net.clone()]).await?;
//!
//!     assert!(report.is_success());
//!     assert_eq!(db.state(), ServiceState::Started);
//!     Ok(())
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, broadcast::error::RecvError};
use tokio::task::{self, JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::{
    actor::{LaunchActor, LaunchParams},
    builder::OrchestratorBuilder,
    config::Config,
    readiness::sleep_until,
    registry::CapabilityRegistry,
    report::{RunReport, ServiceOutcome},
    shutdown::abort_trigger,
};
use crate::error::{RuntimeError, StartError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::services::{Service, dedupe};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Runs services concurrently, each gated on its needs.
pub struct Orchestrator {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Orchestrator {
    /// Creates an orchestrator with the given config and subscribers.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { cfg, subscribers }
    }

    /// Starts building an orchestrator.
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs every service until each reaches a terminal outcome.
    ///
    /// Aborts only on `Config::run_deadline` or, if enabled, an OS signal.
    pub async fn run<I>(&self, services: I) -> Result<RunReport, RuntimeError>
    where
        I: IntoIterator<Item = Arc<Service>>,
    {
        self.run_until(services, CancellationToken::new()).await
    }

    /// Like [`Orchestrator::run`], also aborting when `abort` is cancelled.
    ///
    /// On abort, waiting services end `Errored` with [`StartError::Canceled`]
    /// and running startup actions are cancelled. If attempts are still
    /// running after `Config::grace`, they are dropped, their services end
    /// `Errored` with [`StartError::Abandoned`], and the full report comes
    /// back inside [`RuntimeError::GraceExceeded`].
    pub async fn run_until<I>(
        &self,
        services: I,
        abort: CancellationToken,
    ) -> Result<RunReport, RuntimeError>
    where
        I: IntoIterator<Item = Arc<Service>>,
    {
        let services = dedupe(services);
        ensure_unique_names(&services)?;

        let began = Instant::now();
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = self.event_listener(&bus);
        let registry = Arc::new(CapabilityRegistry::new());
        let token = CancellationToken::new();

        bus.publish(Event::new(EventKind::RunStarted).with_count(services.len()));

        let mut set = JoinSet::new();
        let index = self.spawn_launch_actors(&mut set, &services, &registry, &bus, &token);
        let outcomes = self
            .drive(&mut set, &index, &services, &token, &abort, &bus)
            .await;

        let elapsed = began.elapsed();
        let started = outcomes.iter().filter(|o| o.is_started()).count();
        bus.publish(
            Event::new(EventKind::RunFinished)
                .with_count(started)
                .with_elapsed(elapsed),
        );
        if let Some(listener) = listener {
            let _ = listener.await;
        }

        let stuck: Vec<String> = outcomes
            .iter()
            .filter(|o| matches!(o.error, Some(StartError::Abandoned { .. })))
            .map(|o| o.name.clone())
            .collect();
        let report = RunReport {
            outcomes,
            provided: registry.snapshot().await,
            elapsed,
        };
        if stuck.is_empty() {
            Ok(report)
        } else {
            Err(RuntimeError::GraceExceeded {
                grace: self.cfg.grace,
                stuck,
                report,
            })
        }
    }

    /// Forwards bus events to the subscribers until `RunFinished`, then drains their queues.
    fn event_listener(&self, bus: &Bus) -> Option<JoinHandle<()>> {
        let set = SubscriberSet::new(&self.subscribers, bus.clone());
        if set.is_empty() {
            return None;
        }
        let mut rx = bus.subscribe();

        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let last = ev.kind == EventKind::RunFinished;
                        set.emit(ev);
                        if last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => set.emit(
                        Event::subscriber_overflow("event_listener", "lagged")
                            .with_count(usize::try_from(skipped).unwrap_or(usize::MAX)),
                    ),
                    Err(RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        }))
    }

    /// Spawns one launch actor per service; returns task id → input index.
    fn spawn_launch_actors(
        &self,
        set: &mut JoinSet<ServiceOutcome>,
        services: &[Arc<Service>],
        registry: &Arc<CapabilityRegistry>,
        bus: &Bus,
        run_token: &CancellationToken,
    ) -> HashMap<task::Id, usize> {
        let semaphore = self
            .cfg
            .concurrency_limit()
            .map(Semaphore::new)
            .map(Arc::new);
        let params = LaunchParams {
            readiness: self.cfg.readiness,
            action_timeout: self.cfg.action_timeout(),
        };

        let mut index = HashMap::with_capacity(services.len());
        for (i, service) in services.iter().enumerate() {
            let actor = LaunchActor {
                service: Arc::clone(service),
                registry: Arc::clone(registry),
                params: params.clone(),
                bus: bus.clone(),
                semaphore: semaphore.clone(),
            };
            let handle = set.spawn(actor.run(run_token.child_token()));
            index.insert(handle.id(), i);
        }
        index
    }

    /// Collects outcomes until the set is empty, handling abort and grace.
    async fn drive(
        &self,
        set: &mut JoinSet<ServiceOutcome>,
        index: &HashMap<task::Id, usize>,
        services: &[Arc<Service>],
        run_token: &CancellationToken,
        abort: &CancellationToken,
        bus: &Bus,
    ) -> Vec<ServiceOutcome> {
        let mut outcomes: Vec<Option<ServiceOutcome>> = vec![None; services.len()];
        let trigger = abort_trigger(abort, self.cfg.run_deadline(), self.cfg.abort_on_signal);
        tokio::pin!(trigger);
        let mut grace_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                joined = set.join_next_with_id() => match joined {
                    None => break,
                    Some(Ok((id, outcome))) => {
                        if let Some(&i) = index.get(&id) {
                            outcomes[i] = Some(outcome);
                        }
                    }
                    Some(Err(err)) => {
                        let Some(&i) = index.get(&err.id()) else { continue };
                        let reason = if err.is_panic() {
                            panic_message(err.into_panic().as_ref())
                        } else {
                            "launch attempt cancelled".to_string()
                        };
                        outcomes[i] = Some(panicked(&services[i], reason, bus));
                    }
                },
                cause = &mut trigger, if grace_deadline.is_none() => {
                    bus.publish(Event::new(EventKind::AbortRequested).with_reason(cause.as_str()));
                    run_token.cancel();
                    grace_deadline = Some(Instant::now() + self.cfg.grace);
                }
                _ = sleep_until(grace_deadline) => {
                    let grace = self.cfg.grace;
                    let stuck: Vec<&str> = outcomes
                        .iter()
                        .zip(services)
                        .filter(|(outcome, _)| outcome.is_none())
                        .map(|(_, service)| service.name())
                        .collect();
                    bus.publish(
                        Event::new(EventKind::GraceExceeded)
                            .with_timeout(grace)
                            .with_reason(stuck.join(", ")),
                    );
                    set.abort_all();
                    while let Some(joined) = set.join_next_with_id().await {
                        if let Ok((id, outcome)) = joined {
                            if let Some(&i) = index.get(&id) {
                                outcomes[i] = Some(outcome);
                            }
                        }
                    }
                    for (slot, service) in outcomes.iter_mut().zip(services) {
                        if slot.is_none() {
                            *slot = Some(abandoned(service, grace));
                        }
                    }
                    break;
                }
            }
        }
        outcomes.into_iter().flatten().collect()
    }
}

/// Outcome for a launch task that died without reporting; the service is
/// forced out of `Starting` so it cannot block later starts.
fn panicked(service: &Service, reason: String, bus: &Bus) -> ServiceOutcome {
    bus.publish(
        Event::new(EventKind::LaunchPanicked)
            .with_service(service.name())
            .with_reason(reason),
    );
    ServiceOutcome {
        name: service.name().to_string(),
        state: service.abandon(),
        error: Some(StartError::LaunchPanicked {
            service: service.name().to_string(),
        }),
        waited: Default::default(),
        elapsed: Default::default(),
    }
}

fn abandoned(service: &Service, grace: Duration) -> ServiceOutcome {
    ServiceOutcome {
        name: service.name().to_string(),
        state: service.abandon(),
        error: Some(StartError::Abandoned {
            service: service.name().to_string(),
            grace,
        }),
        waited: Default::default(),
        elapsed: Default::default(),
    }
}

fn ensure_unique_names(services: &[Arc<Service>]) -> Result<(), RuntimeError> {
    let mut seen = HashSet::with_capacity(services.len());
    for service in services {
        if !seen.insert(service.name()) {
            return Err(RuntimeError::DuplicateService {
                name: service.name().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::ActionError;
    use crate::policies::{ReadinessPolicy, TimeoutPolicy};
    use crate::services::{Action, ActionFn, Capability, ServiceCatalog, ServiceState};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records `name` into `log` after `delay`.
    fn record(log: &Log, name: &'static str, delay: Duration) -> impl Action {
        let log = log.clone();
        ActionFn::new(name, move |_ctx: CancellationToken| {
            let log = log.clone();
            async move {
                tokio::time::sleep(delay).await;
                log.lock().unwrap().push(name.to_string());
                Ok::<_, ActionError>(())
            }
        })
    }

    fn fail(msg: &'static str) -> impl Action {
        ActionFn::new("fail", move |_ctx: CancellationToken| async move {
            Err::<(), _>(ActionError::failed(msg))
        })
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<Event>>);

    impl Collect {
        fn kinds(&self) -> Vec<EventKind> {
            self.0.lock().unwrap().iter().map(|e| e.kind).collect()
        }

        fn count(&self, kind: EventKind, service: &str) -> usize {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.kind == kind && e.service.as_deref() == Some(service))
                .count()
        }
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, e: &Event) {
            self.0.lock().unwrap().push(e.clone());
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    fn with_deadline(deadline: Duration) -> Config {
        Config {
            readiness: ReadinessPolicy::default().with_deadline(deadline),
            ..Config::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn chain_starts_in_causal_order() {
        let log = Log::default();
        let app = Service::builder("app")
            .startup(record(&log, "app", Duration::from_millis(100)))
            .needs(["db"])
            .build();
        let db = Service::builder("db")
            .startup(record(&log, "db", Duration::from_millis(100)))
            .needs(["net"])
            .provides(["db"])
            .build();
        let net = Service::builder("net")
            .startup(record(&log, "net", Duration::from_millis(100)))
            .provides(["net"])
            .build();

        let report = Orchestrator::new(Config::default(), Vec::new())
            .run([app, db, net])
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(*log.lock().unwrap(), vec!["net", "db", "app"]);
        assert_eq!(report.started(), vec!["app", "db", "net"]);
        assert_eq!(
            report.provided,
            vec![Capability::from("db"), Capability::from("net")]
        );

        let wait_of = |name| report.get(name).map(|o| o.waited);
        assert_eq!(wait_of("net"), Some(Duration::ZERO));
        assert_eq!(wait_of("db"), Some(Duration::from_millis(100)));
        assert_eq!(wait_of("app"), Some(Duration::from_millis(200)));
        assert_eq!(report.elapsed, Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn service_with_two_needs_waits_for_both() {
        let log = Log::default();
        let a = Service::builder("a")
            .startup(record(&log, "a", Duration::from_millis(100)))
            .provides(["net"])
            .build();
        let b = Service::builder("b")
            .startup(record(&log, "b", Duration::from_millis(100)))
            .needs(["net"])
            .provides(["db"])
            .build();
        let c = Service::builder("c")
            .startup(record(&log, "c", Duration::from_millis(100)))
            .needs(["net", "db"])
            .build();

        let report = Orchestrator::new(Config::default(), Vec::new())
            .run([c, b, a])
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        // `net` alone is not enough for c; it waits for b's `db` as well.
        let wait_of = |name| report.get(name).map(|o| o.waited);
        assert_eq!(wait_of("a"), Some(Duration::ZERO));
        assert_eq!(wait_of("b"), Some(Duration::from_millis(100)));
        assert_eq!(wait_of("c"), Some(Duration::from_millis(200)));
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_times_out_both_sides() {
        let a = Service::builder("a").needs(["b"]).provides(["a"]).build();
        let b = Service::builder("b").needs(["a"]).provides(["b"]).build();

        let report = Orchestrator::new(with_deadline(Duration::from_secs(5)), Vec::new())
            .run([a.clone(), b.clone()])
            .await
            .unwrap();

        assert_eq!(report.elapsed, Duration::from_secs(5));
        for svc in [&a, &b] {
            assert_eq!(svc.state(), ServiceState::Errored);
            let outcome = report.get(svc.name()).unwrap();
            assert!(matches!(
                outcome.error,
                Some(StartError::DependencyTimeout { .. })
            ));
        }
        assert!(report.provided.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_provider_does_not_block_independents() {
        let app = Service::builder("app").needs(["cache"]).build();
        let net = Service::builder("net").provides(["net"]).build();

        let report = Orchestrator::new(with_deadline(Duration::from_secs(5)), Vec::new())
            .run([app, net.clone()])
            .await
            .unwrap();

        assert_eq!(net.state(), ServiceState::Started);
        assert_eq!(
            report.get("app").and_then(|o| o.error.clone()),
            Some(StartError::DependencyTimeout {
                service: "app".into(),
                missing: vec![Capability::from("cache")],
                waited: Duration::from_secs(5),
            })
        );
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_provider_publishes_nothing() {
        let log = Log::default();
        let net = Service::builder("net").startup(fail("no link")).provides(["net"]).build();
        let db = Service::builder("db")
            .startup(record(&log, "db", Duration::ZERO))
            .needs(["net"])
            .build();

        let report = Orchestrator::new(with_deadline(Duration::from_secs(5)), Vec::new())
            .run([net, db])
            .await
            .unwrap();

        assert!(matches!(
            report.get("net").and_then(|o| o.error.clone()),
            Some(StartError::StartupActionFailed { .. })
        ));
        assert!(matches!(
            report.get("db").and_then(|o| o.error.clone()),
            Some(StartError::DependencyTimeout { .. })
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn start_anyway_launches_after_budget() {
        let cfg = Config {
            readiness: ReadinessPolicy::default()
                .with_deadline(Duration::from_secs(2))
                .with_on_timeout(TimeoutPolicy::StartAnyway),
            ..Config::default()
        };
        let collect = Arc::new(Collect::default());
        let app = Service::builder("app").needs(["cache"]).build();

        let report = Orchestrator::new(cfg, vec![collect.clone()])
            .run([app.clone()])
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(app.state(), ServiceState::Started);
        assert_eq!(collect.count(EventKind::TimeoutIgnored, "app"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_strategy_rechecks_on_interval() {
        let cfg = Config {
            readiness: ReadinessPolicy::polling(),
            ..Config::default()
        };
        let log = Log::default();
        let collect = Arc::new(Collect::default());
        let net = Service::builder("net")
            .startup(record(&log, "net", Duration::from_secs(3)))
            .provides(["net"])
            .build();
        let db = Service::builder("db").needs(["net"]).build();

        let report = Orchestrator::new(cfg, vec![collect.clone()])
            .run([net, db])
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.get("db").map(|o| o.waited), Some(Duration::from_secs(4)));
        assert_eq!(collect.count(EventKind::PollScheduled, "db"), 2);
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let a1 = Service::builder("a").build();
        let a2 = Service::builder("a").build();

        let err = Orchestrator::new(Config::default(), Vec::new())
            .run([a1.clone(), a2])
            .await
            .unwrap_err();
        assert_eq!(err, RuntimeError::DuplicateService { name: "a".into() });
        assert_eq!(a1.state(), ServiceState::NotStarted);
    }

    #[tokio::test]
    async fn catalog_runs_shared_service_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let infra = Service::builder("infra")
            .startup(ActionFn::new("count", move |_ctx: CancellationToken| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ActionError>(()) }
            }))
            .provides(["net", "dns"])
            .build();
        let app = Service::builder("app").needs(["net", "dns"]).build();

        let mut catalog = ServiceCatalog::new();
        catalog.push(infra.clone());
        catalog.push(app);
        assert_eq!(catalog.group("dns").len(), 1);
        assert_eq!(catalog.group("net").len(), 1);

        let report = Orchestrator::new(Config::default(), Vec::new())
            .run(&catalog)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn external_abort_cancels_waiters() {
        let collect = Arc::new(Collect::default());
        let app = Service::builder("app").needs(["cache"]).build();
        let net = Service::builder("net").provides(["net"]).build();
        let abort = CancellationToken::new();
        let trigger = abort.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let report = Orchestrator::new(Config::default(), vec![collect.clone()])
            .run_until([app.clone(), net.clone()], abort)
            .await
            .unwrap();

        assert_eq!(report.elapsed, Duration::from_secs(1));
        assert_eq!(net.state(), ServiceState::Started);
        assert_eq!(app.state(), ServiceState::Errored);
        assert!(matches!(
            report.get("app").and_then(|o| o.error.clone()),
            Some(StartError::Canceled { .. })
        ));
        assert!(collect.kinds().contains(&EventKind::AbortRequested));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_action_exceeds_grace() {
        let net = Service::builder("net").provides(["net"]).build();
        let hang = Service::builder("hang")
            .startup(ActionFn::new("hang", |_ctx: CancellationToken| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok::<_, ActionError>(())
            }))
            .build();
        let cfg = Config {
            run_deadline: Duration::from_secs(1),
            grace: Duration::from_secs(2),
            ..Config::default()
        };
        let collect = Arc::new(Collect::default());

        let err = Orchestrator::new(cfg, vec![collect.clone()])
            .run([net.clone(), hang.clone()])
            .await
            .unwrap_err();

        let RuntimeError::GraceExceeded {
            grace,
            stuck,
            report,
        } = err
        else {
            panic!("expected grace exceeded");
        };
        assert_eq!(grace, Duration::from_secs(2));
        assert_eq!(stuck, vec!["hang"]);
        assert_eq!(report.started(), vec!["net"]);
        assert_eq!(report.provided, vec![Capability::from("net")]);
        assert_eq!(report.elapsed, Duration::from_secs(3));

        let hung = report.get("hang").unwrap();
        assert_eq!(hung.state, ServiceState::Errored);
        assert_eq!(hung.error.as_ref().map(StartError::as_label), Some("start_abandoned"));
        assert_eq!(hang.state(), ServiceState::Errored);
        assert!(matches!(
            hang.start().await,
            Err(StartError::AlreadyErrored { .. })
        ));

        let kinds = collect.kinds();
        assert!(kinds.contains(&EventKind::GraceExceeded));
        assert_eq!(kinds.last(), Some(&EventKind::RunFinished));
    }

    #[tokio::test]
    async fn panicking_action_is_a_failed_outcome() {
        let boom = Service::builder("boom")
            .startup(ActionFn::new("boom", |_ctx: CancellationToken| async {
                if true {
                    panic!("exploded");
                }
                Ok::<_, ActionError>(())
            }))
            .provides(["boom"])
            .build();
        let ok = Service::builder("ok").build();

        let report = Orchestrator::new(Config::default(), Vec::new())
            .run([boom.clone(), ok])
            .await
            .unwrap();

        let outcome = report.get("boom").unwrap();
        assert_eq!(outcome.state, ServiceState::Errored);
        assert!(matches!(
            &outcome.error,
            Some(StartError::StartupActionFailed {
                source: ActionError::Panicked { message },
                ..
            }) if message == "exploded"
        ));
        assert_eq!(report.started(), vec!["ok"]);
        assert!(report.provided.is_empty());
        assert!(matches!(
            boom.start().await,
            Err(StartError::AlreadyErrored { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn max_concurrent_serialises_actions() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let services: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let running = running.clone();
                let peak = peak.clone();
                Service::builder(name)
                    .startup(ActionFn::new(name, move |_ctx: CancellationToken| {
                        let running = running.clone();
                        let peak = peak.clone();
                        async move {
                            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            running.fetch_sub(1, Ordering::SeqCst);
                            Ok::<_, ActionError>(())
                        }
                    }))
                    .build()
            })
            .collect();
        let cfg = Config {
            max_concurrent: 1,
            ..Config::default()
        };

        let report = Orchestrator::new(cfg, Vec::new()).run(services).await.unwrap();

        assert!(report.is_success());
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(report.elapsed, Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_run_bracketed_and_flushed() {
        let collect = Arc::new(Collect::default());
        let net = Service::builder("net").provides(["net"]).build();
        let db = Service::builder("db").needs(["net"]).build();

        Orchestrator::builder(Config::default())
            .with_subscribers(vec![collect.clone()])
            .build()
            .run([net, db])
            .await
            .unwrap();

        let kinds = collect.kinds();
        assert_eq!(kinds.first(), Some(&EventKind::RunStarted));
        assert_eq!(kinds.last(), Some(&EventKind::RunFinished));
        assert_eq!(collect.count(EventKind::ServiceStarted, "net"), 1);
        assert_eq!(collect.count(EventKind::ServiceStarted, "db"), 1);
        assert_eq!(collect.count(EventKind::CapabilitiesProvided, "net"), 1);
    }

    #[tokio::test]
    async fn second_run_skips_started_services() {
        let net = Service::builder("net").provides(["net"]).build();
        let db = Service::builder("db").needs(["net"]).build();
        let orch = Orchestrator::new(Config::default(), Vec::new());

        assert!(orch.run([net.clone(), db.clone()]).await.unwrap().is_success());

        let again = orch.run([net, db]).await.unwrap();
        assert!(again.outcomes.iter().all(|o| matches!(
            o.error,
            Some(StartError::AlreadyStarted { .. })
        )));
        assert_eq!(again.provided, vec![Capability::from("net")]);
    }
}
