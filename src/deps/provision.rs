//! # Values produced by a service's `provide` operation.
//!
//! A [`Provision`] is one output of [`Provider::provide`](crate::Provider::provide).
//! It is keyed by the exact type of the shared handle it carries (`Arc<T>`), which is
//! also the type an `init` parameter must name to receive it.
//!
//! ## Shapes
//! ```text
//! Provision::instance(Arc<Db>)                       → key Arc<Db>            (structured value)
//! Provision::callable(Arc<dyn Fn(&str) -> Route>)    → key Arc<dyn Fn(..)>    (function value)
//! Provision::optional(None::<Arc<Db>>)               → null, rejected at registration
//! ```
//!
//! ## Rules
//! - A null output rejects the whole registration.
//! - A scalar or string pointee (`bool`, integers, floats, `char`, `str`, `String`,
//!   `()`) is not a structured value and is rejected, whatever the shape.
//! - A callable must point at a function type: a `dyn Fn*` trait object, a `fn`
//!   pointer or a closure.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::{deps::TypeKey, error::LifecycleError};

/// Shape of a provided value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvisionKind {
    /// Shared reference to a structured value.
    Instance,
    /// Shared function value.
    Callable,
}

impl ProvisionKind {
    /// Returns a short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            ProvisionKind::Instance => "instance",
            ProvisionKind::Callable => "callable",
        }
    }
}

/// One output of a `provide` operation.
pub struct Provision {
    key: TypeKey,
    pointee: TypeKey,
    kind: ProvisionKind,
    value: Option<Box<dyn Any + Send + Sync>>,
}

/// A validated provision, ready to be inserted into the index.
pub(crate) struct ProvidedValue {
    pub(crate) key: TypeKey,
    pub(crate) kind: ProvisionKind,
    pub(crate) value: Box<dyn Any + Send + Sync>,
}

impl Provision {
    /// Provides a shared structured value, injectable as `Arc<T>`.
    pub fn instance<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            key: TypeKey::of::<Arc<T>>(),
            pointee: TypeKey::of::<T>(),
            kind: ProvisionKind::Instance,
            value: Some(Box::new(value)),
        }
    }

    /// Provides a shared function value, injectable as `Arc<F>`.
    ///
    /// `F` is normally a `dyn Fn(..) -> .. + Send + Sync` trait object, so that the
    /// injecting side can name the type.
    pub fn callable<F: ?Sized + Send + Sync + 'static>(f: Arc<F>) -> Self {
        Self {
            key: TypeKey::of::<Arc<F>>(),
            pointee: TypeKey::of::<F>(),
            kind: ProvisionKind::Callable,
            value: Some(Box::new(f)),
        }
    }

    /// Provides a value that may be absent; `None` is a null output.
    pub fn optional<T: Send + Sync + 'static>(value: Option<Arc<T>>) -> Self {
        match value {
            Some(value) => Self::instance(value),
            None => Self {
                key: TypeKey::of::<Arc<T>>(),
                pointee: TypeKey::of::<T>(),
                kind: ProvisionKind::Instance,
                value: None,
            },
        }
    }

    /// Index key of this value.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Shape of this value.
    #[inline]
    pub fn kind(&self) -> ProvisionKind {
        self.kind
    }

    /// `true` if the output is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Validates the shape and unwraps the value for insertion.
    pub(crate) fn validate(self, service: &str) -> Result<ProvidedValue, LifecycleError> {
        let invalid = |reason| LifecycleError::InvalidProvision {
            service: service.to_owned(),
            type_name: self.key.name(),
            reason,
        };
        if is_scalar(self.pointee.id()) {
            return Err(invalid("not a structured value"));
        }
        if self.kind == ProvisionKind::Callable && !is_function(self.pointee.name()) {
            return Err(invalid("not a function value"));
        }
        match self.value {
            Some(value) => Ok(ProvidedValue {
                key: self.key,
                kind: self.kind,
                value,
            }),
            None => Err(invalid("null reference")),
        }
    }
}

fn is_scalar(id: TypeId) -> bool {
    [
        TypeId::of::<()>(),
        TypeId::of::<bool>(),
        TypeId::of::<char>(),
        TypeId::of::<i8>(),
        TypeId::of::<i16>(),
        TypeId::of::<i32>(),
        TypeId::of::<i64>(),
        TypeId::of::<i128>(),
        TypeId::of::<isize>(),
        TypeId::of::<u8>(),
        TypeId::of::<u16>(),
        TypeId::of::<u32>(),
        TypeId::of::<u64>(),
        TypeId::of::<u128>(),
        TypeId::of::<usize>(),
        TypeId::of::<f32>(),
        TypeId::of::<f64>(),
        TypeId::of::<str>(),
        TypeId::of::<String>(),
    ]
    .contains(&id)
}

/// Recognizes function types by their type name.
fn is_function(type_name: &str) -> bool {
    let trait_object = type_name.starts_with("dyn ")
        && type_name.contains("core::ops::function::Fn");
    let pointer = type_name.starts_with("fn(")
        || type_name.starts_with("unsafe ")
        || type_name.starts_with("extern ")
        || type_name.starts_with("for<");
    trait_object || pointer || type_name.ends_with("{{closure}}")
}
