//! # servisor
//!
//! **Servisor** is a service registry and lifecycle orchestrator for tokio applications.
//!
//! Independently written services (config loader, database connector, HTTP listener,
//! ...) are registered once, wired together by the types they provide and require,
//! started concurrently, and stopped as one process.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Settings   │   │   Database   │   │     Http     │
//!     │  (provide)   │   │ (init, stop) │   │(init, serve) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - Registry (services in registration order + capabilities)       │
//! │  - DependencyIndex (provided values keyed by type)                │
//! │  - Bus (broadcast lifecycle events)                               │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     init (sequential) serve (concurrent)  stop (sequential)  │ Publishes
//!                           │                                  │ Events
//!                           ▼                                  ▼
//!                   aggregated error stream        Bus ──► listener ──► SubscriberSet
//!                           │                                             │
//!                           ▼                                       LogWriter, ...
//!                       run loop ◄── OS signal
//! ```
//!
//! ### Lifecycle
//! ```text
//! register(services)  ─► provide() outputs validated and indexed by type
//! init()              ─► Deps injected from the index, init(deps), fail-fast
//! serve()             ─► one forwarder per serving service ─► mpsc (closes when all finish)
//! run loop            ─► first of: signal | serve error (policy) | stream closed
//! stop()              ─► every service, registration order, failures aggregated
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Services**      | Opt into provide, init, serve and stop per service.           | [`Service`], [`Provider`], [`Init`], [`Serve`], [`Stop`] |
//! | **Dependencies**  | Type-keyed index and typed init argument lists.               | [`DependencyIndex`], [`Provision`], [`Inject`]  |
//! | **Orchestration** | Registration, phases and the run loop.                        | [`Orchestrator`], [`ShutdownReason`]            |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom).        | [`Subscribe`], [`LogWriter`]                    |
//! | **Errors**        | Typed errors for orchestration and for services.              | [`LifecycleError`], [`ServiceError`]            |
//! | **Configuration** | Runtime settings, loadable from TOML.                         | [`Config`], [`ServeErrorPolicy`]                |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use servisor::{Config, Orchestrator, Provider, Provision, ServeFn, Service, ServiceRef, Serving};
//!
//! struct Settings { port: u16 }
//!
//! struct SettingsLoader;
//!
//! impl Service for SettingsLoader {
//!     fn name(&self) -> &str { "settings" }
//!     fn provider(&self) -> Option<&dyn Provider> { Some(self) }
//! }
//!
//! impl Provider for SettingsLoader {
//!     fn provide(&self) -> Vec<Provision> {
//!         vec![Provision::instance(Arc::new(Settings { port: 8080 }))]
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut orch = Orchestrator::new(Config::default());
//!     orch.register([
//!         Arc::new(SettingsLoader) as ServiceRef,
//!         ServeFn::arc("once", || async { Serving::done() }),
//!     ])?;
//!
//!     // Every serve finishes on its own, so the run loop ends without a signal.
//!     let reason = orch.run().await?;
//!     println!("stopped: {}", reason.as_label());
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod deps;
mod error;
mod events;
pub mod os_signals;
mod policies;
mod services;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{Orchestrator, OrchestratorBuilder, Registry, ServiceHandle, ShutdownReason};
pub use deps::{DependencyIndex, Inject, Injectable, Provision, ProvisionKind, ResolveError, TypeKey};
pub use error::{ConfigError, LifecycleError, ServiceError, StopFailure};
pub use events::{Bus, Event, EventKind};
pub use os_signals::wait_for_shutdown_signal;
pub use policies::ServeErrorPolicy;
pub use services::{
    Capabilities, ErrorStream, Init, InitHook, Provider, Serve, ServeFn, Service, ServiceRef,
    Serving, Stop,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
