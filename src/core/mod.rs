//! Runtime core: registration, dependency wiring and lifecycle phases.
//!
//! The public API from this module is [`Orchestrator`] (with its
//! [`OrchestratorBuilder`]), the [`Registry`] it keeps, and the [`ShutdownReason`]
//! returned by its run loop.
//!
//! Internal modules:
//! - [`orchestrator`]: register, init, serve and stop;
//! - [`registry`]: ordered service handles with capabilities inspected once;
//! - [`fanin`]: one forwarder per serving service into the aggregated error stream;
//! - [`runner`]: the run loop racing the error stream against a shutdown signal;
//! - [`listener`]: forwards bus events to the subscriber set and flushes it on close;
//! - [`builder`]: attaches subscribers.

mod builder;
mod fanin;
mod listener;
mod orchestrator;
mod registry;
mod runner;

#[cfg(test)]
pub(crate) mod testkit;

pub use builder::OrchestratorBuilder;
pub use orchestrator::Orchestrator;
pub use registry::{Registry, ServiceHandle};
pub use runner::ShutdownReason;
