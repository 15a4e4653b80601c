//! # Init argument injection.
//!
//! [`Inject`] turns the dependency index into the typed argument list of an
//! `init` operation. It is implemented for `()`, for a single `Arc<T>`, and for
//! tuples of shared handles up to eight elements:
//!
//! ```text
//! type Deps = ();                                   // no parameters
//! type Deps = Arc<Settings>;                        // one parameter
//! type Deps = (Arc<Settings>, Arc<Pool>, Arc<F>);   // resolved in this order
//! ```
//!
//! Resolution stops at the first unresolved parameter.

use std::sync::Arc;

use crate::deps::{DependencyIndex, ResolveError, TypeKey};

/// A value that can be stored in and cloned out of the index.
pub trait Injectable: Clone + Send + Sync + 'static {}

impl<T: ?Sized + Send + Sync + 'static> Injectable for Arc<T> {}

/// Argument list of an `init` operation, resolved from the index.
pub trait Inject: Sized + Send + 'static {
    /// Keys of every parameter, in parameter order.
    fn keys() -> Vec<TypeKey>;

    /// Resolves every parameter from `index`, in parameter order.
    fn inject(index: &DependencyIndex) -> Result<Self, ResolveError>;
}

impl Inject for () {
    fn keys() -> Vec<TypeKey> {
        Vec::new()
    }

    fn inject(_index: &DependencyIndex) -> Result<Self, ResolveError> {
        Ok(())
    }
}

impl<T: ?Sized + Send + Sync + 'static> Inject for Arc<T> {
    fn keys() -> Vec<TypeKey> {
        vec![TypeKey::of::<Arc<T>>()]
    }

    fn inject(index: &DependencyIndex) -> Result<Self, ResolveError> {
        index.get::<Arc<T>>()
    }
}

macro_rules! impl_inject_tuple {
    ($($name:ident),+) => {
        impl<$($name: Injectable),+> Inject for ($($name,)+) {
            fn keys() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$name>()),+]
            }

            fn inject(index: &DependencyIndex) -> Result<Self, ResolveError> {
                Ok(($(index.get::<$name>()?,)+))
            }
        }
    };
}

impl_inject_tuple!(A);
impl_inject_tuple!(A, B);
impl_inject_tuple!(A, B, C);
impl_inject_tuple!(A, B, C, D);
impl_inject_tuple!(A, B, C, D, E);
impl_inject_tuple!(A, B, C, D, E, F);
impl_inject_tuple!(A, B, C, D, E, F, G);
impl_inject_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::Provision;

    struct Settings {
        port: u16,
    }
    struct Pool;
    struct Cache;

    fn index_with(provisions: Vec<Provision>) -> DependencyIndex {
        let mut index = DependencyIndex::new();
        for p in provisions {
            let provided = p.validate("test").unwrap_or_else(|e| panic!("{e}"));
            index.insert(provided, Arc::from("test"));
        }
        index
    }

    #[test]
    fn tuple_resolves_in_parameter_order() {
        let index = index_with(vec![
            Provision::instance(Arc::new(Pool)),
            Provision::instance(Arc::new(Settings { port: 8080 })),
        ]);
        let (settings, _pool) = <(Arc<Settings>, Arc<Pool>)>::inject(&index).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(settings.port, 8080);
        assert_eq!(
            <(Arc<Settings>, Arc<Pool>)>::keys(),
            vec![TypeKey::of::<Arc<Settings>>(), TypeKey::of::<Arc<Pool>>()]
        );
    }

    #[test]
    fn first_unresolved_parameter_is_reported() {
        let index = index_with(vec![Provision::instance(Arc::new(Settings { port: 1 }))]);
        let err = <(Arc<Settings>, Arc<Cache>, Arc<Pool>)>::inject(&index).err().unwrap();
        assert_eq!(err, ResolveError::Missing(TypeKey::of::<Arc<Cache>>()));
    }

    #[test]
    fn unit_needs_nothing() {
        assert!(<()>::keys().is_empty());
        assert!(<()>::inject(&DependencyIndex::new()).is_ok());
    }
}
