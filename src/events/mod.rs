//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Orchestrator` (register/init/stop, run loop), serve forwarders,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by `OrchestratorBuilder::build`, which fans
//!   out to `SubscriberSet`; tests may call `Bus::subscribe` directly.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
