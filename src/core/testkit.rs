//! Services shared by the core unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    deps::Provision,
    error::ServiceError,
    services::{Init, InitHook, Provider, Service, Stop},
};

/// Ordered record of lifecycle calls, shared between test services.
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub(crate) struct Settings {
    pub(crate) port: u16,
}

pub(crate) struct Cache;

/// Provides `Arc<Settings>`.
pub(crate) struct SettingsProvider {
    name: &'static str,
    settings: Arc<Settings>,
}

impl SettingsProvider {
    pub(crate) fn new(name: &'static str, port: u16) -> Self {
        Self {
            name,
            settings: Arc::new(Settings { port }),
        }
    }
}

impl Service for SettingsProvider {
    fn name(&self) -> &str {
        self.name
    }
    fn provider(&self) -> Option<&dyn Provider> {
        Some(self)
    }
}

impl Provider for SettingsProvider {
    fn provide(&self) -> Vec<Provision> {
        vec![Provision::instance(Arc::clone(&self.settings))]
    }
}

/// Injects `Arc<Settings>`; fails its init when the port is 0.
pub(crate) struct UsesSettings {
    name: &'static str,
    journal: Journal,
    port: Mutex<Option<u16>>,
}

impl UsesSettings {
    pub(crate) fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: journal.clone(),
            port: Mutex::new(None),
        }
    }

    pub(crate) fn seen_port(&self) -> Option<u16> {
        *self.port.lock().unwrap()
    }
}

impl Service for UsesSettings {
    fn name(&self) -> &str {
        self.name
    }
    fn initializer(&self) -> Option<&dyn InitHook> {
        Some(self)
    }
}

#[async_trait]
impl Init for UsesSettings {
    type Deps = Arc<Settings>;

    async fn init(&self, settings: Arc<Settings>) -> Result<(), ServiceError> {
        self.journal.push(format!("init:{}", self.name));
        if settings.port == 0 {
            return Err(ServiceError::fail("port 0"));
        }
        *self.port.lock().unwrap() = Some(settings.port);
        Ok(())
    }
}

/// Injects `(Arc<Settings>, Arc<Cache>)`; nothing in the tests provides `Cache`.
#[derive(Default)]
pub(crate) struct NeedsCache {
    pub(crate) called: AtomicBool,
}

impl Service for NeedsCache {
    fn name(&self) -> &str {
        "needs-cache"
    }
    fn initializer(&self) -> Option<&dyn InitHook> {
        Some(self)
    }
}

#[async_trait]
impl Init for NeedsCache {
    type Deps = (Arc<Settings>, Arc<Cache>);

    async fn init(&self, _deps: Self::Deps) -> Result<(), ServiceError> {
        self.called.store(true, Ordering::SeqCst);
        Ok(())
    }
}

enum StopOutcome {
    Ok,
    Fail,
    Panic,
    Hang,
}

/// Records its stop call and then succeeds, fails, panics or never returns.
pub(crate) struct Stopper {
    name: &'static str,
    journal: Journal,
    outcome: StopOutcome,
}

impl Stopper {
    pub(crate) fn ok(name: &'static str, journal: &Journal) -> Self {
        Self::with(name, journal, StopOutcome::Ok)
    }

    pub(crate) fn failing(name: &'static str, journal: &Journal) -> Self {
        Self::with(name, journal, StopOutcome::Fail)
    }

    pub(crate) fn panicking(name: &'static str, journal: &Journal) -> Self {
        Self::with(name, journal, StopOutcome::Panic)
    }

    pub(crate) fn hanging(name: &'static str, journal: &Journal) -> Self {
        Self::with(name, journal, StopOutcome::Hang)
    }

    fn with(name: &'static str, journal: &Journal, outcome: StopOutcome) -> Self {
        Self {
            name,
            journal: journal.clone(),
            outcome,
        }
    }
}

impl Service for Stopper {
    fn name(&self) -> &str {
        self.name
    }
    fn stoppable(&self) -> Option<&dyn Stop> {
        Some(self)
    }
}

#[async_trait]
impl Stop for Stopper {
    async fn stop(&self) -> Result<(), ServiceError> {
        self.journal.push(format!("stop:{}", self.name));
        match self.outcome {
            StopOutcome::Ok => Ok(()),
            StopOutcome::Fail => Err(ServiceError::fail(format!("{} refused to stop", self.name))),
            StopOutcome::Panic => panic!("{} stop bug", self.name),
            StopOutcome::Hang => std::future::pending().await,
        }
    }
}
