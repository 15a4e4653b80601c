//! # Dependency index: provided values keyed by type identity.
//!
//! Filled during registration from each service's `provide` outputs and read
//! during the init phase to build each service's `init` arguments.
//!
//! ## Rules
//! - **Last write wins**: a later provision of the same type replaces the earlier one.
//! - **Phase separated**: written only while registering, read-only once init starts,
//!   so no locking is needed.
//! - **Explicit failures**: typed lookups return [`ResolveError`] instead of defaulting.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::{
    deps::{ProvidedValue, ProvisionKind, TypeKey},
    error::LifecycleError,
};

/// Lookup failure for one type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// No value of this type was provided.
    #[error("no value provided for [{0}]")]
    Missing(TypeKey),
}

impl ResolveError {
    /// Attributes the failure to the service that requested the value.
    pub fn for_service(self, service: &str) -> LifecycleError {
        match self {
            ResolveError::Missing(key) => LifecycleError::MissingDependency {
                type_name: key.name(),
                service: service.to_owned(),
            },
        }
    }
}

struct Entry {
    value: Box<dyn Any + Send + Sync>,
    kind: ProvisionKind,
    provider: Arc<str>,
}

/// Type-keyed store of provided values.
#[derive(Default)]
pub struct DependencyIndex {
    entries: HashMap<TypeKey, Entry>,
}

impl DependencyIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a validated value, returning the provider it replaced (if any).
    pub(crate) fn insert(&mut self, provided: ProvidedValue, provider: Arc<str>) -> Option<Arc<str>> {
        let entry = Entry {
            value: provided.value,
            kind: provided.kind,
            provider,
        };
        self.entries
            .insert(provided.key, entry)
            .map(|previous| previous.provider)
    }

    /// Returns a clone of the value stored for type `V`.
    ///
    /// `V` is the shared handle type, e.g. `Arc<Db>` or `Arc<dyn Fn(&str) -> Route + Send + Sync>`.
    /// Entries are keyed by the `TypeId` of the value they box, so a present key
    /// always downcasts.
    pub fn get<V: Clone + 'static>(&self) -> Result<V, ResolveError> {
        let key = TypeKey::of::<V>();
        self.entries
            .get(&key)
            .and_then(|entry| entry.value.downcast_ref::<V>())
            .cloned()
            .ok_or(ResolveError::Missing(key))
    }

    /// Returns the shared instance of `T` (shorthand for `get::<Arc<T>>()`).
    pub fn instance<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        self.get::<Arc<T>>()
    }

    /// `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Name of the service whose value is currently stored under `key`.
    pub fn provider_of(&self, key: &TypeKey) -> Option<&str> {
        self.entries.get(key).map(|e| e.provider.as_ref())
    }

    /// Shape of the value stored under `key`.
    pub fn kind_of(&self, key: &TypeKey) -> Option<ProvisionKind> {
        self.entries.get(key).map(|e| e.kind)
    }

    /// Iterates over all stored keys (unordered).
    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.entries.keys().copied()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing was provided.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::Provision;

    #[derive(Debug, PartialEq)]
    struct Db(&'static str);

    fn put(index: &mut DependencyIndex, p: Provision, provider: &str) -> Option<Arc<str>> {
        let provided = p.validate(provider).unwrap_or_else(|e| panic!("{e}"));
        index.insert(provided, Arc::from(provider))
    }

    #[test]
    fn last_write_wins() {
        let mut index = DependencyIndex::new();
        assert!(put(&mut index, Provision::instance(Arc::new(Db("primary"))), "a").is_none());
        let replaced = put(&mut index, Provision::instance(Arc::new(Db("replica"))), "b");

        assert_eq!(replaced.as_deref(), Some("a"));
        assert_eq!(index.len(), 1);
        assert_eq!(*index.instance::<Db>().unwrap(), Db("replica"));
        assert_eq!(index.provider_of(&TypeKey::of::<Arc<Db>>()), Some("b"));
    }

    #[test]
    fn missing_type_fails_explicitly() {
        let index = DependencyIndex::new();
        let err = index.instance::<Db>().unwrap_err();
        assert_eq!(err, ResolveError::Missing(TypeKey::of::<Arc<Db>>()));

        let lifted = err.for_service("api");
        assert_eq!(lifted.as_label(), "lifecycle_missing_dependency");
        assert_eq!(lifted.service(), Some("api"));
    }

    #[test]
    fn callables_resolve_by_trait_object_type() {
        type Route = dyn Fn(&str) -> String + Send + Sync;
        let mut index = DependencyIndex::new();
        let f: Arc<Route> = Arc::new(|path: &str| format!("/api{path}"));
        put(&mut index, Provision::callable(f), "router");

        let route = index.get::<Arc<Route>>().unwrap();
        assert_eq!(route("/users"), "/api/users");
        assert_eq!(
            index.kind_of(&TypeKey::of::<Arc<Route>>()),
            Some(ProvisionKind::Callable)
        );
    }
}
