//! # Service abstractions.
//!
//! This module provides the service-side contract:
//! - [`Service`] - capability accessors and name
//! - [`Provider`], [`Init`] / [`InitHook`], [`Serve`], [`Stop`] - one trait per lifecycle phase
//! - [`Serving`] - explicit single-result / streaming result of `serve`
//! - [`Capabilities`] - capability set captured at registration
//! - [`ServeFn`] - closure-backed service with only a Serve capability
//! - [`ServiceRef`] - shared reference to a service (`Arc<dyn Service>`)

mod capabilities;
mod serve_fn;
mod service;
mod serving;

pub use capabilities::Capabilities;
pub use serve_fn::ServeFn;
pub use service::{Init, InitHook, Provider, Serve, Service, ServiceRef, Stop};
pub use serving::{ErrorStream, Serving};
