//! # Service abstraction and its four capabilities.
//!
//! A [`Service`] is any shared object the orchestrator drives. It opts into each
//! lifecycle phase by returning `Some(self)` from the matching accessor:
//!
//! | Capability  | Accessor          | Trait        | Invoked                                  |
//! |-------------|-------------------|--------------|------------------------------------------|
//! | Provide     | `provider()`      | [`Provider`] | at registration, outputs indexed by type |
//! | Init        | `initializer()`   | [`Init`]     | sequentially, registration order         |
//! | Serve       | `servable()`      | [`Serve`]    | concurrently, after every init succeeded |
//! | Stop        | `stoppable()`     | [`Stop`]     | sequentially, registration order         |
//!
//! A missing capability is skipped, never an error.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use servisor::{Init, InitHook, Service, ServiceError, Stop};
//!
//! struct Settings { dsn: String }
//!
//! struct Database;
//!
//! impl Service for Database {
//!     fn name(&self) -> &str { "database" }
//!     fn initializer(&self) -> Option<&dyn InitHook> { Some(self) }
//!     fn stoppable(&self) -> Option<&dyn Stop> { Some(self) }
//! }
//!
//! #[async_trait]
//! impl Init for Database {
//!     type Deps = Arc<Settings>;
//!
//!     async fn init(&self, settings: Arc<Settings>) -> Result<(), ServiceError> {
//!         if settings.dsn.is_empty() {
//!             return Err(ServiceError::fatal("empty dsn"));
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[async_trait]
//! impl Stop for Database {
//!     async fn stop(&self) -> Result<(), ServiceError> { Ok(()) }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    deps::{DependencyIndex, Inject, Provision, TypeKey},
    error::{LifecycleError, ServiceError},
    services::Serving,
};

/// Shared handle to a registered service.
pub type ServiceRef = Arc<dyn Service>;

/// # Object driven by the orchestrator.
///
/// Every accessor defaults to `None`; implement the ones the service supports.
pub trait Service: Send + Sync + 'static {
    /// Returns a stable, human-readable service name used in errors and events.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Provide capability.
    fn provider(&self) -> Option<&dyn Provider> {
        None
    }

    /// Init capability.
    fn initializer(&self) -> Option<&dyn InitHook> {
        None
    }

    /// Serve capability.
    fn servable(&self) -> Option<&dyn Serve> {
        None
    }

    /// Stop capability.
    fn stoppable(&self) -> Option<&dyn Stop> {
        None
    }
}

/// Produces values for other services' `init`, once, at registration time.
pub trait Provider: Send + Sync {
    /// Returns zero or more provisions; a null or non-structured output rejects the service.
    fn provide(&self) -> Vec<Provision>;
}

/// Dependency-injected initialization.
///
/// `Deps` names the parameter types; each one is looked up in the dependency index
/// before `init` is called. If any is missing, `init` is not invoked.
#[async_trait]
pub trait Init: Send + Sync {
    /// Parameter list, see [`Inject`].
    type Deps: Inject;

    /// Initializes the service with its resolved parameters.
    async fn init(&self, deps: Self::Deps) -> Result<(), ServiceError>;
}

/// Object-safe form of [`Init`], implemented for every `Init` type.
#[async_trait]
pub trait InitHook: Send + Sync {
    /// Keys of the declared parameters, in order.
    fn requires(&self) -> Vec<TypeKey>;

    /// Resolves the parameters from `index` and runs `init`.
    async fn init_from(&self, service: &str, index: &DependencyIndex) -> Result<(), LifecycleError>;
}

#[async_trait]
impl<T: Init> InitHook for T {
    fn requires(&self) -> Vec<TypeKey> {
        T::Deps::keys()
    }

    async fn init_from(&self, service: &str, index: &DependencyIndex) -> Result<(), LifecycleError> {
        let deps = T::Deps::inject(index).map_err(|e| e.for_service(service))?;
        self.init(deps)
            .await
            .map_err(|source| LifecycleError::Init {
                service: service.to_owned(),
                source,
            })
    }
}

/// Main loop of a service.
#[async_trait]
pub trait Serve: Send + Sync {
    /// Runs the service: either to completion ([`Serving::Completed`]) or by handing
    /// back a stream of errors that closes when the service is done ([`Serving::Streaming`]).
    async fn serve(&self) -> Serving;
}

/// Resource release on shutdown.
#[async_trait]
pub trait Stop: Send + Sync {
    /// Releases the service's resources. Called once; never retried.
    async fn stop(&self) -> Result<(), ServiceError>;
}
