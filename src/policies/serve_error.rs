//! # Serve error policy for the run loop.
//!
//! [`ServeErrorPolicy`] decides what the run loop does when a service reports an
//! error on the aggregated serve stream.
//!
//! - [`ServeErrorPolicy::Shutdown`] any serve error stops every service (default).
//! - [`ServeErrorPolicy::LogOnly`] the error is logged and the loop keeps waiting.
//!
//! ```text
//! serve error ──► Shutdown ──► stop() all services ──► ShutdownReason::ServeFailed
//!             └─► LogOnly  ──► publish ServeFailed, keep waiting for signal / closure
//! ```

use serde::Deserialize;

/// Policy applied by the run loop to errors read from the serve stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeErrorPolicy {
    /// Treat any serve error as fatal to the whole process (default).
    #[default]
    Shutdown,
    /// Log the error and keep running the remaining services.
    LogOnly,
}

impl ServeErrorPolicy {
    /// Returns `true` when a serve error should end the run loop.
    #[inline]
    pub fn stops_on_error(self) -> bool {
        matches!(self, ServeErrorPolicy::Shutdown)
    }
}
