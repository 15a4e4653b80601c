//! Capability set discovered on a service at registration.

use std::fmt;

use crate::services::Service;

/// Which lifecycle phases a service takes part in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Exposes `provide`.
    pub provide: bool,
    /// Exposes `init`.
    pub init: bool,
    /// Exposes `serve`.
    pub serve: bool,
    /// Exposes `stop`.
    pub stop: bool,
}

impl Capabilities {
    /// Inspects the capability accessors of `service`.
    pub fn inspect(service: &dyn Service) -> Self {
        Self {
            provide: service.provider().is_some(),
            init: service.initializer().is_some(),
            serve: service.servable().is_some(),
            stop: service.stoppable().is_some(),
        }
    }

    /// `true` if the service takes part in no phase at all.
    pub fn is_empty(&self) -> bool {
        !(self.provide || self.init || self.serve || self.stop)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names = [
            (self.provide, "provide"),
            (self.init, "init"),
            (self.serve, "serve"),
            (self.stop, "stop"),
        ];
        let present: Vec<&str> = names
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&present.join(","))
    }
}
