//! # LogWriter: renders runtime events through `tracing`
//!
//! Failures are logged at `warn`/`error`, phase progress at `info`, and dependency
//! wiring at `debug`. Install any `tracing` subscriber to see the output.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  servisor: registered service="database" capabilities=provide,init,stop
//! DEBUG servisor: provided service="config" dependency="alloc::sync::Arc<app::Settings>"
//! INFO  servisor: init completed service="database"
//! WARN  servisor: serve failed service="http" err="bind: address in use"
//! INFO  servisor: shutdown requested reason="serve failure"
//! ERROR servisor: stop failed service="database" err="close timeout"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let dependency = e.dependency.unwrap_or("-");

        match e.kind {
            EventKind::ServiceRegistered => {
                tracing::info!(target: "servisor", service, capabilities = reason, "registered");
            }
            EventKind::RegistrationRejected => {
                tracing::error!(target: "servisor", service, err = reason, "registration rejected");
            }
            EventKind::DependencyProvided => {
                tracing::debug!(target: "servisor", service, dependency, "provided");
            }
            EventKind::DependencyOverridden => {
                tracing::debug!(target: "servisor", service, dependency, previous = reason, "provided (overrides previous)");
            }
            EventKind::InitStarting => {
                tracing::debug!(target: "servisor", service, "init starting");
            }
            EventKind::InitCompleted => {
                tracing::info!(target: "servisor", service, "init completed");
            }
            EventKind::InitFailed => {
                tracing::error!(target: "servisor", service, err = reason, "init failed");
            }
            EventKind::ServeStarting => {
                tracing::info!(target: "servisor", service, "serving");
            }
            EventKind::ServeCompleted => {
                tracing::info!(target: "servisor", service, "serve completed");
            }
            EventKind::ServeFailed => {
                tracing::warn!(target: "servisor", service, err = reason, "serve failed");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "servisor", reason, "shutdown requested");
            }
            EventKind::StopCompleted => {
                tracing::info!(target: "servisor", service, "stopped");
            }
            EventKind::StopFailed => {
                tracing::error!(target: "servisor", service, err = reason, "stop failed");
            }
            EventKind::AllStopped => {
                tracing::info!(target: "servisor", failures = reason, "all services stopped");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "servisor", subscriber = service, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "servisor", subscriber = service, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
