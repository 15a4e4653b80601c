//! # Registry: ordered, append-only list of registered services.
//!
//! Iteration order is registration order, and it is the order of both the init
//! and the stop phase. Serve walks the same order but only to launch work.
//!
//! ## Rules
//! - Append-only: handles are never removed or reordered.
//! - A handle shares the registered object (`Arc`), it never copies it.
//! - Read-only once the init phase begins.

use std::sync::Arc;

use crate::services::{Capabilities, ServiceRef};

/// A registered service with the capabilities discovered at registration.
#[derive(Clone)]
pub struct ServiceHandle {
    name: Arc<str>,
    service: ServiceRef,
    capabilities: Capabilities,
}

impl ServiceHandle {
    pub(crate) fn new(service: ServiceRef) -> Self {
        Self {
            name: Arc::from(service.name()),
            capabilities: Capabilities::inspect(service.as_ref()),
            service,
        }
    }

    /// Service name, captured at registration.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared name, cheap to clone into events and tasks.
    #[inline]
    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// The registered object.
    #[inline]
    pub fn service(&self) -> &ServiceRef {
        &self.service
    }

    /// Capability set discovered at registration.
    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// `true` if this handle refers to the same object as `other`.
    pub fn is(&self, other: &ServiceRef) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.service), Arc::as_ptr(other))
    }
}

/// Ordered sequence of service handles.
#[derive(Clone, Default)]
pub struct Registry {
    handles: Vec<ServiceHandle>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, handle: ServiceHandle) {
        self.handles.push(handle);
    }

    /// Iterates over handles in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ServiceHandle> {
        self.handles.iter()
    }

    /// Service names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.handles.iter().map(ServiceHandle::name).collect()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ServiceHandle;
    type IntoIter = std::slice::Iter<'a, ServiceHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ServeFn, Serving};

    #[test]
    fn keeps_registration_order_and_identity() {
        let a: ServiceRef = ServeFn::arc("a", || async { Serving::done() });
        let b: ServiceRef = ServeFn::arc("b", || async { Serving::done() });

        let mut registry = Registry::new();
        registry.push(ServiceHandle::new(a.clone()));
        registry.push(ServiceHandle::new(b.clone()));

        assert_eq!(registry.names(), vec!["a", "b"]);
        let first = registry.iter().next().unwrap();
        assert!(first.is(&a));
        assert!(!first.is(&b));
        assert!(first.capabilities().serve);
        assert!(!first.capabilities().init);
    }
}
