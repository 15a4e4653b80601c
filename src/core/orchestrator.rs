//! # Orchestrator: registration, dependency wiring and the three lifecycle phases.
//!
//! ```text
//! register(services...)     for each service, in order:
//!   ├─► null?                         → InvalidService (batch aborted)
//!   ├─► sealed (init started)?        → Sealed
//!   ├─► provider().provide()          → validate every output (null / scalar → InvalidProvision)
//!   ├─► insert outputs into the index → last write wins
//!   └─► append handle to the registry
//!
//! init()                    once; sequential, registration order, fail-fast
//!   └─► Deps::inject(index) → missing type → MissingDependency (init not called)
//!       init(deps)          → error → Init (remaining services untouched)
//!
//! serve()                   once, after a successful init; concurrent fan-in, see `fanin`
//!
//! stop()                    sequential, registration order, never short-circuits
//!   └─► each stop bounded by Config::stop_timeout (expiry = failure)
//!   └─► every failure collected → one Stop error listing all of them
//! ```
//!
//! Every phase selects services by the [`Capabilities`](crate::Capabilities) captured
//! at registration; a capability an object grows or loses afterwards is ignored.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::{
    config::Config,
    core::{
        fanin,
        listener::EventListener,
        registry::{Registry, ServiceHandle},
        OrchestratorBuilder,
    },
    deps::{DependencyIndex, TypeKey},
    error::{LifecycleError, ServiceError, StopFailure, panic_message},
    events::{Bus, Event, EventKind},
    services::ServiceRef,
};

/// Registers services, wires their dependencies, and drives init, serve and stop.
pub struct Orchestrator {
    pub(crate) cfg: Config,
    pub(crate) bus: Bus,
    registry: Registry,
    index: DependencyIndex,
    sealed: bool,
    initialized: bool,
    served: AtomicBool,
    pub(crate) listener: Option<EventListener>,
}

impl Orchestrator {
    /// Creates an orchestrator without event subscribers.
    pub fn new(cfg: Config) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self::from_parts(cfg, bus, None)
    }

    /// Starts a builder, used to attach event subscribers.
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    pub(crate) fn from_parts(cfg: Config, bus: Bus, listener: Option<EventListener>) -> Self {
        Self {
            cfg,
            bus,
            registry: Registry::new(),
            index: DependencyIndex::new(),
            sealed: false,
            initialized: false,
            served: AtomicBool::new(false),
            listener,
        }
    }

    /// Registers services in order.
    ///
    /// Each item may be a [`ServiceRef`] or an `Option<ServiceRef>`; `None` is a null
    /// service and aborts the rest of the batch. Services registered before the
    /// failing one stay registered.
    ///
    /// A service's `provide` runs here, before any `init`.
    pub fn register<I>(&mut self, services: I) -> Result<(), LifecycleError>
    where
        I: IntoIterator,
        I::Item: Into<Option<ServiceRef>>,
    {
        for service in services {
            self.register_one(service.into())?;
        }
        Ok(())
    }

    fn register_one(&mut self, service: Option<ServiceRef>) -> Result<(), LifecycleError> {
        let Some(service) = service else {
            return Err(self.reject(
                None,
                LifecycleError::InvalidService {
                    reason: "null service".to_string(),
                },
            ));
        };
        let handle = ServiceHandle::new(service);

        if self.sealed {
            let err = LifecycleError::Sealed {
                service: handle.name().to_owned(),
            };
            return Err(self.reject(Some(&handle), err));
        }

        let provided = match handle.service().provider() {
            Some(provider) => provider
                .provide()
                .into_iter()
                .map(|p| p.validate(handle.name()))
                .collect::<Result<Vec<_>, _>>(),
            None => Ok(Vec::new()),
        };
        let provided = provided.map_err(|e| self.reject(Some(&handle), e))?;

        for value in provided {
            let key = value.key;
            let event = match self.index.insert(value, handle.shared_name()) {
                None => Event::new(EventKind::DependencyProvided),
                Some(previous) => Event::new(EventKind::DependencyOverridden).with_reason(previous),
            };
            self.bus.publish(
                event
                    .with_service(handle.shared_name())
                    .with_dependency(key.name()),
            );
        }

        self.bus.publish(
            Event::new(EventKind::ServiceRegistered)
                .with_service(handle.shared_name())
                .with_reason(handle.capabilities().to_string()),
        );
        self.registry.push(handle);
        Ok(())
    }

    fn reject(&self, handle: Option<&ServiceHandle>, err: LifecycleError) -> LifecycleError {
        let mut event = Event::new(EventKind::RegistrationRejected).with_reason(err.to_string());
        if let Some(handle) = handle {
            event = event.with_service(handle.shared_name());
        }
        self.bus.publish(event);
        err
    }

    /// Runs every service's `init`, in registration order, with injected dependencies.
    ///
    /// Seals the orchestrator first: later `register` calls fail. Stops at the first
    /// missing dependency or failing `init`; later services are not initialized.
    /// Runs at most once, even if it failed.
    pub async fn init(&mut self) -> Result<(), LifecycleError> {
        if self.sealed {
            return Err(LifecycleError::Phase {
                operation: "init",
                reason: "init already ran",
            });
        }
        self.sealed = true;

        for handle in self.registry.iter().filter(|h| h.capabilities().init) {
            let Some(hook) = handle.service().initializer() else {
                continue;
            };
            self.bus.publish(Event::new(EventKind::InitStarting).with_service(handle.shared_name()));

            if let Err(err) = hook.init_from(handle.name(), &self.index).await {
                self.bus.publish(
                    Event::new(EventKind::InitFailed)
                        .with_service(handle.shared_name())
                        .with_reason(err.to_string()),
                );
                return Err(err);
            }
            self.bus.publish(Event::new(EventKind::InitCompleted).with_service(handle.shared_name()));
        }
        self.initialized = true;
        Ok(())
    }

    /// Launches every service's `serve` and returns the aggregated error stream.
    ///
    /// The receiver yields `None` once every launched serve has finished: single-result
    /// services after returning, streaming services after their stream ends.
    /// Must be called inside a tokio runtime.
    ///
    /// Fails with [`LifecycleError::Phase`] unless `init` succeeded, and on any
    /// call after the first.
    pub fn serve(&self) -> Result<mpsc::Receiver<LifecycleError>, LifecycleError> {
        if !self.initialized {
            return Err(LifecycleError::Phase {
                operation: "serve",
                reason: "init has not completed",
            });
        }
        if self.served.swap(true, Ordering::AcqRel) {
            return Err(LifecycleError::Phase {
                operation: "serve",
                reason: "serve already ran",
            });
        }

        let (tx, rx) = mpsc::channel(self.cfg.serve_buffer_clamped());
        for handle in self.registry.iter().filter(|h| h.capabilities().serve) {
            tokio::spawn(fanin::forward(handle.clone(), tx.clone(), self.bus.clone()));
        }
        Ok(rx)
    }

    /// Runs every service's `stop`, in registration order, collecting all failures.
    ///
    /// Every service gets a stop attempt even if an earlier one failed, panicked or
    /// exceeded [`Config::stop_timeout`].
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let mut failures = Vec::new();

        for handle in self.registry.iter().filter(|h| h.capabilities().stop) {
            let Some(stoppable) = handle.service().stoppable() else {
                continue;
            };
            let attempt = std::panic::AssertUnwindSafe(stoppable.stop()).catch_unwind();
            let caught = match self.cfg.stop_timeout() {
                Some(limit) => match tokio::time::timeout(limit, attempt).await {
                    Ok(caught) => caught,
                    Err(_) => Ok(Err(ServiceError::fatal(format!(
                        "stop timed out after {limit:?}"
                    )))),
                },
                None => attempt.await,
            };
            let outcome = caught.unwrap_or_else(|panic| {
                Err(ServiceError::fatal(format!(
                    "stop panicked: {}",
                    panic_message(&*panic)
                )))
            });

            match outcome {
                Ok(()) => {
                    self.bus
                        .publish(Event::new(EventKind::StopCompleted).with_service(handle.shared_name()));
                }
                Err(error) => {
                    self.bus.publish(
                        Event::new(EventKind::StopFailed)
                            .with_service(handle.shared_name())
                            .with_reason(error.to_string()),
                    );
                    failures.push(StopFailure {
                        service: handle.name().to_owned(),
                        error,
                    });
                }
            }
        }

        self.bus.publish(
            Event::new(EventKind::AllStopped).with_reason(format!("{} failed", failures.len())),
        );
        if failures.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::Stop { failures })
        }
    }

    /// Lists `(service, type)` pairs whose init parameter has no provider yet.
    ///
    /// A pre-flight check only; `init` itself still fails at the first missing type.
    pub fn unresolved(&self) -> Vec<(String, TypeKey)> {
        self.registry
            .iter()
            .filter(|h| h.capabilities().init)
            .filter_map(|h| h.service().initializer().map(|hook| (h, hook.requires())))
            .flat_map(|(h, keys)| {
                keys.into_iter()
                    .filter(|key| !self.index.contains_key(key))
                    .map(move |key| (h.name().to_owned(), key))
            })
            .collect()
    }

    /// Waits until every event published so far reached the subscribers, then
    /// stops the subscriber workers. No-op without subscribers.
    pub async fn close_subscribers(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.close().await;
        }
    }

    /// Registered services, in registration order.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Values provided so far.
    pub fn dependencies(&self) -> &DependencyIndex {
        &self.index
    }

    /// Event bus; subscribe to observe lifecycle events.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// `true` once `init` has started; registration is closed from then on.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn request_shutdown(&self, reason: impl Into<Arc<str>>) {
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::core::testkit::{
        Cache, Journal, NeedsCache, Settings, SettingsProvider, Stopper, UsesSettings,
    };
    use crate::deps::Provision;
    use crate::services::{Provider, Service, Stop};

    fn settings(port: u16) -> ServiceRef {
        Arc::new(SettingsProvider::new("settings", port))
    }

    #[tokio::test]
    async fn provide_runs_at_registration_so_earlier_services_can_inject() {
        let journal = Journal::default();
        let api = Arc::new(UsesSettings::new("api", &journal));

        let mut orch = Orchestrator::new(Config::default());
        orch.register([api.clone() as ServiceRef, settings(8080)]).unwrap();
        assert_eq!(orch.dependencies().len(), 1);

        orch.init().await.unwrap();
        assert_eq!(api.seen_port(), Some(8080));
        assert_eq!(journal.entries(), vec!["init:api"]);
    }

    #[tokio::test]
    async fn init_follows_registration_order() {
        let journal = Journal::default();
        let mut orch = Orchestrator::new(Config::default());
        orch.register([
            settings(1),
            Arc::new(UsesSettings::new("first", &journal)) as ServiceRef,
            Arc::new(Stopper::ok("no-init", &journal)),
            Arc::new(UsesSettings::new("second", &journal)),
        ])
        .unwrap();

        orch.init().await.unwrap();
        assert_eq!(journal.entries(), vec!["init:first", "init:second"]);
    }

    #[tokio::test]
    async fn last_registered_provider_wins() {
        let journal = Journal::default();
        let api = Arc::new(UsesSettings::new("api", &journal));

        let mut orch = Orchestrator::new(Config::default());
        let mut events = orch.bus().subscribe();
        orch.register([settings(1), settings(2), api.clone() as ServiceRef]).unwrap();
        orch.init().await.unwrap();

        assert_eq!(api.seen_port(), Some(2));
        assert_eq!(orch.dependencies().instance::<Settings>().unwrap().port, 2);

        let kinds: Vec<EventKind> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert!(kinds.contains(&EventKind::DependencyOverridden));
    }

    struct HalfNull;

    impl Service for HalfNull {
        fn name(&self) -> &str {
            "half-null"
        }
        fn provider(&self) -> Option<&dyn Provider> {
            Some(self)
        }
    }

    impl Provider for HalfNull {
        fn provide(&self) -> Vec<Provision> {
            vec![
                Provision::instance(Arc::new(Settings { port: 9 })),
                Provision::optional::<Cache>(None),
            ]
        }
    }

    #[tokio::test]
    async fn invalid_provision_adds_neither_handle_nor_values() {
        let mut orch = Orchestrator::new(Config::default());
        let err = orch.register([Arc::new(HalfNull) as ServiceRef]).unwrap_err();

        assert_eq!(err.as_label(), "lifecycle_invalid_provision");
        assert_eq!(err.service(), Some("half-null"));
        assert!(orch.registry().is_empty());
        assert!(orch.dependencies().is_empty());
    }

    #[tokio::test]
    async fn null_service_aborts_rest_of_batch() {
        let journal = Journal::default();
        let mut orch = Orchestrator::new(Config::default());
        let batch: Vec<Option<ServiceRef>> = vec![
            Some(Arc::new(Stopper::ok("a", &journal)) as ServiceRef),
            None,
            Some(Arc::new(Stopper::ok("b", &journal)) as ServiceRef),
        ];

        let err = orch.register(batch).unwrap_err();
        assert_eq!(err.as_label(), "lifecycle_invalid_service");
        assert_eq!(orch.registry().names(), vec!["a"]);
    }

    #[tokio::test]
    async fn missing_dependency_is_fail_fast_and_skips_init() {
        let journal = Journal::default();
        let needs_cache = Arc::new(NeedsCache::default());
        let mut orch = Orchestrator::new(Config::default());
        orch.register([
            settings(1),
            Arc::new(UsesSettings::new("before", &journal)) as ServiceRef,
            needs_cache.clone(),
            Arc::new(UsesSettings::new("after", &journal)),
        ])
        .unwrap();

        let unresolved = orch.unresolved();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].0, "needs-cache");
        assert_eq!(unresolved[0].1, TypeKey::of::<Arc<Cache>>());

        let err = orch.init().await.unwrap_err();
        match &err {
            LifecycleError::MissingDependency { type_name, service } => {
                assert!(type_name.contains("Cache"));
                assert_eq!(service, "needs-cache");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!needs_cache.called.load(Ordering::SeqCst));
        assert_eq!(journal.entries(), vec!["init:before"]);
    }

    #[tokio::test]
    async fn init_error_aborts_remaining_services() {
        let journal = Journal::default();
        let mut orch = Orchestrator::new(Config::default());
        orch.register([
            // port 0 makes UsesSettings fail its init
            settings(0),
            Arc::new(UsesSettings::new("broken", &journal)) as ServiceRef,
        ])
        .unwrap();
        orch.register([Arc::new(UsesSettings::new("never", &journal)) as ServiceRef])
            .unwrap();

        let err = orch.init().await.unwrap_err();
        assert_eq!(err.as_label(), "lifecycle_init_failed");
        assert_eq!(err.service(), Some("broken"));
        assert_eq!(journal.entries(), vec!["init:broken"]);
    }

    #[tokio::test]
    async fn registration_is_sealed_once_init_starts() {
        let mut orch = Orchestrator::new(Config::default());
        orch.register([settings(1)]).unwrap();
        orch.init().await.unwrap();
        assert!(orch.is_sealed());

        let err = orch.register([settings(2)]).unwrap_err();
        assert_eq!(err.as_label(), "lifecycle_sealed");
        assert_eq!(orch.registry().len(), 1);
        assert_eq!(orch.dependencies().instance::<Settings>().unwrap().port, 1);
    }

    #[tokio::test]
    async fn stop_attempts_every_service_and_aggregates_failures() {
        let journal = Journal::default();
        let mut orch = Orchestrator::new(Config::default());
        orch.register([
            Arc::new(Stopper::failing("db", &journal)) as ServiceRef,
            Arc::new(Stopper::ok("cache", &journal)),
            Arc::new(Stopper::failing("http", &journal)),
            Arc::new(Stopper::ok("metrics", &journal)),
        ])
        .unwrap();

        let err = orch.stop().await.unwrap_err();
        assert_eq!(
            journal.entries(),
            vec!["stop:db", "stop:cache", "stop:http", "stop:metrics"]
        );
        match err {
            LifecycleError::Stop { failures } => {
                let names: Vec<&str> = failures.iter().map(|f| f.service.as_str()).collect();
                assert_eq!(names, vec!["db", "http"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn stop_panic_counts_as_failure_and_later_services_still_stop() {
        let journal = Journal::default();
        let mut orch = Orchestrator::new(Config::default());
        orch.register([
            Arc::new(Stopper::panicking("flaky", &journal)) as ServiceRef,
            Arc::new(Stopper::ok("db", &journal)),
        ])
        .unwrap();

        let err = orch.stop().await.unwrap_err();
        assert!(err.to_string().contains("flaky: fatal error: stop panicked"));
        assert_eq!(journal.entries(), vec!["stop:flaky", "stop:db"]);
    }

    #[tokio::test]
    async fn stop_that_never_returns_times_out_and_later_services_still_stop() {
        let journal = Journal::default();
        let cfg = Config {
            stop_timeout_ms: 50,
            ..Config::default()
        };
        let mut orch = Orchestrator::new(cfg);
        orch.register([
            Arc::new(Stopper::hanging("stuck", &journal)) as ServiceRef,
            Arc::new(Stopper::ok("db", &journal)),
        ])
        .unwrap();

        let err = tokio::time::timeout(Duration::from_secs(5), orch.stop())
            .await
            .expect("stop must be bounded by stop_timeout")
            .unwrap_err();
        match err {
            LifecycleError::Stop { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].service, "stuck");
                assert!(failures[0].error.to_string().contains("stop timed out after 50ms"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(journal.entries(), vec!["stop:stuck", "stop:db"]);
    }

    /// Grows a stop capability after registration.
    struct LateStopper {
        journal: Journal,
        armed: AtomicBool,
        stopper: Stopper,
    }

    impl Service for LateStopper {
        fn name(&self) -> &str {
            "late"
        }
        fn stoppable(&self) -> Option<&dyn Stop> {
            self.armed.load(Ordering::SeqCst).then_some(&self.stopper as &dyn Stop)
        }
    }

    #[tokio::test]
    async fn phases_use_capabilities_captured_at_registration() {
        let journal = Journal::default();
        let late = Arc::new(LateStopper {
            journal: journal.clone(),
            armed: AtomicBool::new(false),
            stopper: Stopper::ok("late", &journal),
        });
        let mut orch = Orchestrator::new(Config::default());
        orch.register([late.clone() as ServiceRef, Arc::new(Stopper::ok("db", &journal))])
            .unwrap();
        assert!(!orch.registry().iter().next().unwrap().capabilities().stop);

        late.armed.store(true, Ordering::SeqCst);
        orch.stop().await.unwrap();
        assert_eq!(late.journal.entries(), vec!["stop:db"]);
    }

    /// Provides values that are not functions through `Provision::callable`.
    struct FakeCallables;

    impl Service for FakeCallables {
        fn name(&self) -> &str {
            "fake-callables"
        }
        fn provider(&self) -> Option<&dyn Provider> {
            Some(self)
        }
    }

    impl Provider for FakeCallables {
        fn provide(&self) -> Vec<Provision> {
            vec![
                Provision::instance(Arc::new(Settings { port: 3 })),
                Provision::callable(Arc::new(7u64)),
            ]
        }
    }

    #[tokio::test]
    async fn scalar_passed_as_callable_is_rejected_at_registration() {
        let mut orch = Orchestrator::new(Config::default());
        let err = orch.register([Arc::new(FakeCallables) as ServiceRef]).unwrap_err();

        assert_eq!(err.as_label(), "lifecycle_invalid_provision");
        assert!(err.to_string().contains("not a structured value"));
        assert!(orch.registry().is_empty());
        assert!(orch.dependencies().is_empty());
    }

    #[tokio::test]
    async fn serve_requires_a_completed_init_and_runs_once() {
        let journal = Journal::default();
        let mut orch = Orchestrator::new(Config::default());
        orch.register([settings(0), Arc::new(UsesSettings::new("api", &journal)) as ServiceRef])
            .unwrap();

        let err = orch.serve().unwrap_err();
        assert_eq!(err.as_label(), "lifecycle_phase");
        assert!(err.to_string().contains("init has not completed"));

        // port 0 fails the init, so serve stays locked
        orch.init().await.unwrap_err();
        assert!(orch.serve().is_err());
        let again = orch.init().await.unwrap_err();
        assert!(again.to_string().contains("init already ran"));
        assert_eq!(journal.entries(), vec!["init:api"]);
    }

    #[tokio::test]
    async fn second_serve_is_rejected() {
        let mut orch = Orchestrator::new(Config::default());
        orch.register([settings(1)]).unwrap();
        orch.init().await.unwrap();

        let mut rx = orch.serve().unwrap();
        assert!(rx.recv().await.is_none());

        let err = orch.serve().unwrap_err();
        assert_eq!(err.as_label(), "lifecycle_phase");
        assert!(err.to_string().contains("serve already ran"));
    }

    #[tokio::test]
    async fn clean_stop_returns_ok() {
        let journal = Journal::default();
        let mut orch = Orchestrator::new(Config::default());
        orch.register([Arc::new(Stopper::ok("db", &journal)) as ServiceRef, settings(1)])
            .unwrap();
        assert!(orch.stop().await.is_ok());
        assert_eq!(journal.entries(), vec!["stop:db"]);
    }
}
