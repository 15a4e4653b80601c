//! # Runtime events emitted by the orchestrator.
//!
//! The [`EventKind`] enum classifies event types across the lifecycle:
//! - **Registration events**: service registered or rejected, values provided
//! - **Phase events**: init, serve and stop progress per service
//! - **Shutdown events**: run loop decided to stop
//! - **Subscriber events**: subscriber worker problems
//!
//! The [`Event`] struct carries metadata such as timestamp, service name,
//! dependency type and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use servisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::InitFailed)
//!     .with_service("database")
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::InitFailed);
//! assert_eq!(ev.service.as_deref(), Some("database"));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `service` (subscriber name) and `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `service` (subscriber name) and `reason`.
    SubscriberOverflow,

    // === Registration events ===
    /// Service appended to the registry.
    ///
    /// Sets `service` and `reason` (capability list, e.g. `provide,init`).
    ServiceRegistered,

    /// Service rejected by registration; nothing was added.
    ///
    /// Sets `service` (when known) and `reason`.
    RegistrationRejected,

    /// A provided value was stored in the dependency index.
    ///
    /// Sets `service` (provider) and `dependency`.
    DependencyProvided,

    /// A provided value replaced an earlier value of the same type.
    ///
    /// Sets `service` (new provider), `dependency` and `reason` (previous provider).
    DependencyOverridden,

    // === Init phase ===
    /// Service init about to run.
    InitStarting,
    /// Service init returned successfully.
    InitCompleted,
    /// Service init failed or a dependency was missing. Sets `reason`.
    InitFailed,

    // === Serve phase ===
    /// Service serve launched.
    ServeStarting,
    /// Service serve work finished (single result returned or stream closed).
    ServeCompleted,
    /// Service reported a serve error (once per streamed item). Sets `reason`.
    ServeFailed,

    // === Shutdown ===
    /// Run loop is stopping services. Sets `reason` (signal, serve failure, finished).
    ShutdownRequested,
    /// Service stop returned successfully.
    StopCompleted,
    /// Service stop failed or panicked. Sets `reason`.
    StopFailed,
    /// Stop phase finished for every service. Sets `reason` (failure count).
    AllStopped,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the service (or subscriber), if applicable.
    pub service: Option<Arc<str>>,
    /// Dependency type name, for provide events.
    pub dependency: Option<&'static str>,
    /// Human-readable reason (errors, capability lists, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            dependency: None,
            reason: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a dependency type name.
    #[inline]
    pub fn with_dependency(mut self, type_name: &'static str) -> Self {
        self.dependency = Some(type_name);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_reason(info)
    }

    /// `true` for events reporting a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::RegistrationRejected
                | EventKind::InitFailed
                | EventKind::ServeFailed
                | EventKind::StopFailed
                | EventKind::SubscriberPanicked
                | EventKind::SubscriberOverflow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::InitStarting);
        let b = Event::new(EventKind::InitCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn failure_kinds() {
        assert!(Event::new(EventKind::StopFailed).is_failure());
        assert!(Event::subscriber_overflow("log", "full").is_failure());
        assert!(!Event::new(EventKind::ServeCompleted).is_failure());
    }
}
