//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the orchestrator runtime.
//!
//! Config is used by `Orchestrator::new(config)` and `Orchestrator::builder(config)`,
//! and can be read from TOML with [`Config::from_toml_str`] or [`Config::load`].
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `serve_buffer = 0` → clamped to 1 (a tokio mpsc channel cannot be zero-sized)
//! - `stop_timeout_ms = 0` → no limit: each `stop` may take as long as it needs
//!
//! ## TOML example
//! ```toml
//! bus_capacity = 256
//! serve_buffer = 1
//! on_serve_error = "log_only"
//! stop_timeout_ms = 5000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{error::ConfigError, policies::ServeErrorPolicy};

/// Global configuration for the orchestrator runtime.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `serve_buffer`: Capacity of the aggregated serve error stream (min 1)
/// - `on_serve_error`: What the run loop does when a service reports a serve error
/// - `stop_timeout_ms`: Limit on each service's `stop` (`0` = unbounded)
///
/// Missing TOML keys fall back to [`Config::default`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Capacity of the aggregated serve error channel.
    ///
    /// Kept minimal: producers wait for the run loop to read before reporting more.
    pub serve_buffer: usize,

    /// Policy applied by the run loop to serve errors.
    pub on_serve_error: ServeErrorPolicy,

    /// Maximum time, in milliseconds, one service's `stop` may take.
    ///
    /// An expired stop counts as that service's failure and the stop phase moves
    /// on to the next service. `0` disables the limit.
    pub stop_timeout_ms: u64,
}

impl Config {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a serve stream capacity clamped to a minimum of 1.
    #[inline]
    pub fn serve_buffer_clamped(&self) -> usize {
        self.serve_buffer.max(1)
    }

    /// Returns the per-service stop limit, or `None` when unbounded.
    #[inline]
    pub fn stop_timeout(&self) -> Option<Duration> {
        match self.stop_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `serve_buffer = 1` (minimally buffered)
    /// - `on_serve_error = ServeErrorPolicy::Shutdown`
    /// - `stop_timeout_ms = 30000` (30s per service)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            serve_buffer: 1,
            on_serve_error: ServeErrorPolicy::default(),
            stop_timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.on_serve_error.stops_on_error());
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let cfg = Config::from_toml_str("serve_buffer = 8\non_serve_error = \"log_only\"").unwrap();
        assert_eq!(cfg.serve_buffer, 8);
        assert_eq!(cfg.bus_capacity, 1024);
        assert_eq!(cfg.on_serve_error, ServeErrorPolicy::LogOnly);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("shutdown_grace = 5").unwrap_err();
        assert_eq!(err.as_label(), "config_parse");
    }

    #[test]
    fn stop_timeout_reads_milliseconds_and_zero_disables_it() {
        let cfg = Config::from_toml_str("stop_timeout_ms = 1500").unwrap();
        assert_eq!(cfg.stop_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(Config::default().stop_timeout(), Some(Duration::from_secs(30)));

        let cfg = Config::from_toml_str("stop_timeout_ms = 0").unwrap();
        assert_eq!(cfg.stop_timeout(), None);
    }

    #[test]
    fn zero_capacities_are_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            serve_buffer: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.serve_buffer_clamped(), 1);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load("/definitely/not/here/servisor.toml").unwrap_err();
        assert_eq!(err.as_label(), "config_read");
        assert!(err.to_string().contains("servisor.toml"));
    }
}
