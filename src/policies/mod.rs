//! Run loop policies.
//!
//! ## Contents
//! - [`ServeErrorPolicy`] whether a serve error stops every service or is only logged
//!
//! ## Defaults
//! - `ServeErrorPolicy::Shutdown`: any serve error triggers a full stop.

mod serve_error;

pub use serve_error::ServeErrorPolicy;
