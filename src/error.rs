//! Error types used by the servisor runtime and by services.
//!
//! This module defines the main error enums:
//!
//! - [`LifecycleError`]: errors raised by the orchestrator itself (registration, wiring, phases).
//! - [`ServiceError`]: errors raised by individual services from `init`, `serve` or `stop`.
//! - [`ConfigError`]: errors raised while loading a [`Config`](crate::Config).
//!
//! All of them provide `as_label` for logging/metrics.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// # Errors produced by the servisor runtime.
///
/// These represent failures of the orchestration itself: a malformed service or
/// provision at registration time, an unresolved dependency, or a phase failure
/// attributed to a named service.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A null service was passed to `register`.
    #[error("service is not a valid reference: {reason}")]
    InvalidService {
        /// Why the service was rejected.
        reason: String,
    },

    /// A `provide` output had an invalid shape (null, scalar, or a callable that is not a function).
    #[error("provide value [{type_name}] is not valid in {service}: {reason}")]
    InvalidProvision {
        /// Service whose `provide` produced the value.
        service: String,
        /// Type name of the rejected output.
        type_name: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// `register` was called after the init phase started.
    #[error("cannot register {service}: dependency index is sealed once init has started")]
    Sealed {
        /// Service that arrived too late.
        service: String,
    },

    /// A lifecycle operation was called out of order (serve before init, or twice).
    #[error("cannot {operation}: {reason}")]
    Phase {
        /// Operation that was refused.
        operation: &'static str,
        /// Why it was refused.
        reason: &'static str,
    },

    /// An init parameter type has no provider.
    #[error("missing dependency [{type_name}] for service {service}")]
    MissingDependency {
        /// Type name of the unresolved parameter.
        type_name: &'static str,
        /// Service requesting the dependency.
        service: String,
    },

    /// A service's own `init` returned an error.
    #[error("init of {service} failed: {source}")]
    Init {
        /// Failing service.
        service: String,
        /// Error returned by the service.
        #[source]
        source: ServiceError,
    },

    /// A service reported an error while serving (single result or streamed).
    #[error("serve of {service} failed: {source}")]
    Serve {
        /// Reporting service.
        service: String,
        /// Error reported by the service.
        #[source]
        source: ServiceError,
    },

    /// A service panicked while serving.
    #[error("serve of {service} panicked: {info}")]
    ServePanicked {
        /// Panicking service.
        service: String,
        /// Panic payload, if it was a string.
        info: String,
    },

    /// One or more services failed to stop.
    #[error("failed to stop some services: [{}]", join_failures(.failures))]
    Stop {
        /// Every failure collected during the stop phase, in registration order.
        failures: Vec<StopFailure>,
    },

    /// Installing the OS signal listeners failed.
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[source] std::io::Error),
}

impl LifecycleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servisor::LifecycleError;
    ///
    /// let err = LifecycleError::MissingDependency { type_name: "Db", service: "api".into() };
    /// assert_eq!(err.as_label(), "lifecycle_missing_dependency");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleError::InvalidService { .. } => "lifecycle_invalid_service",
            LifecycleError::InvalidProvision { .. } => "lifecycle_invalid_provision",
            LifecycleError::Sealed { .. } => "lifecycle_sealed",
            LifecycleError::Phase { .. } => "lifecycle_phase",
            LifecycleError::MissingDependency { .. } => "lifecycle_missing_dependency",
            LifecycleError::Init { .. } => "lifecycle_init_failed",
            LifecycleError::Serve { .. } => "lifecycle_serve_failed",
            LifecycleError::ServePanicked { .. } => "lifecycle_serve_panicked",
            LifecycleError::Stop { .. } => "lifecycle_stop_failed",
            LifecycleError::Signal(_) => "lifecycle_signal",
        }
    }

    /// Returns the name of the service the error is attributed to, if any.
    pub fn service(&self) -> Option<&str> {
        match self {
            LifecycleError::InvalidProvision { service, .. }
            | LifecycleError::Sealed { service }
            | LifecycleError::MissingDependency { service, .. }
            | LifecycleError::Init { service, .. }
            | LifecycleError::Serve { service, .. }
            | LifecycleError::ServePanicked { service, .. } => Some(service),
            LifecycleError::InvalidService { .. }
            | LifecycleError::Phase { .. }
            | LifecycleError::Stop { .. }
            | LifecycleError::Signal(_) => None,
        }
    }
}

/// One service's failure collected by the stop phase.
#[derive(Debug)]
pub struct StopFailure {
    /// Service whose `stop` failed.
    pub service: String,
    /// Error it returned (or the panic it raised).
    pub error: ServiceError,
}

impl fmt::Display for StopFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.service, self.error)
    }
}

fn join_failures(failures: &[StopFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// # Errors produced by services.
///
/// Returned from `init` and `stop`, and reported from `serve` (once, or per
/// streamed item). The orchestrator never retries any of them.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The operation failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The service is unusable and the process should not continue.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Any other error, for services written against `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    /// Shorthand for [`ServiceError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ServiceError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`ServiceError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        ServiceError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servisor::ServiceError;
    ///
    /// assert_eq!(ServiceError::fail("boom").as_label(), "service_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Fail { .. } => "service_failed",
            ServiceError::Fatal { .. } => "service_fatal",
            ServiceError::Other(_) => "service_other",
        }
    }
}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for [`Config`](crate::Config).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse(_) => "config_parse",
        }
    }
}

/// Renders a panic payload caught with `catch_unwind`.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
