//! # Dependency wiring: type keys, provisions, the index and init injection.
//!
//! ```text
//! register(service)
//!   └─► provider.provide() ─► Vec<Provision> ─► validate all ─► DependencyIndex (last write wins)
//!
//! init()
//!   └─► for each service in registration order:
//!         Init::Deps::inject(&index) ─► init(deps)
//! ```
//!
//! ## Contents
//! - [`TypeKey`] stable type identity (`TypeId` + name)
//! - [`Provision`], [`ProvisionKind`] outputs of `provide`
//! - [`DependencyIndex`], [`ResolveError`] type-keyed store with explicit lookups
//! - [`Inject`], [`Injectable`] typed `init` argument lists

mod index;
mod inject;
mod key;
mod provision;

pub use index::{DependencyIndex, ResolveError};
pub use inject::{Inject, Injectable};
pub use key::TypeKey;
pub use provision::{Provision, ProvisionKind};
pub(crate) use provision::ProvidedValue;
