//! # Function-backed service (`ServeFn`)
//!
//! [`ServeFn`] wraps a closure `F: Fn() -> Fut` and exposes it as the Serve
//! capability of a service, producing a fresh future per `serve` call. It has no
//! Provide, Init or Stop capability.
//!
//! ## Example
//! ```rust
//! use servisor::{ServeFn, Service, ServiceRef, Serving};
//!
//! let svc: ServiceRef = ServeFn::arc("heartbeat", || async {
//!     // do work...
//!     Serving::done()
//! });
//!
//! assert_eq!(svc.name(), "heartbeat");
//! assert!(svc.servable().is_some());
//! assert!(svc.stoppable().is_none());
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::services::{Serve, Service, Serving};

/// Function-backed service with only a Serve capability.
#[derive(Debug)]
pub struct ServeFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ServeFn<F> {
    /// Creates a new function-backed service.
    ///
    /// Prefer [`ServeFn::arc`] when you immediately need a [`ServiceRef`](crate::ServiceRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the service and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Service for ServeFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Serving> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn servable(&self) -> Option<&dyn Serve> {
        Some(self)
    }
}

#[async_trait]
impl<F, Fut> Serve for ServeFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Serving> + Send + 'static,
{
    async fn serve(&self) -> Serving {
        (self.f)().await
    }
}
