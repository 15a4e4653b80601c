use std::sync::Arc;

use crate::{
    config::Config,
    core::{listener::EventListener, orchestrator::Orchestrator},
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Orchestrator`] with event subscribers.
///
/// ```no_run
/// use std::sync::Arc;
/// use servisor::{Config, LogWriter, Orchestrator};
///
/// # #[tokio::main] async fn main() {
/// let orch = Orchestrator::builder(Config::default())
///     .with_subscriber(Arc::new(LogWriter::new()))
///     .build();
/// # }
/// ```
pub struct OrchestratorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers, replacing any added before.
    ///
    /// Subscribers receive runtime events (registration, phases, failures)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the orchestrator.
    ///
    /// With subscribers attached this spawns their workers and the bus listener,
    /// so it must be called inside a tokio runtime.
    pub fn build(self) -> Orchestrator {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = (!self.subscribers.is_empty()).then(|| {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            EventListener::spawn(&bus, set)
        });
        Orchestrator::from_parts(self.cfg, bus, listener)
    }
}
