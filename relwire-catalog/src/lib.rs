//! Hierarchical catalog and name resolution.
//!
//! A [`Catalog`] is an arena of schema nodes: each node owns child
//! schemas, tables, function overload sets, and named types, with a
//! non-owning back-reference to its parent. The [`CatalogResolver`] walks
//! that tree under a configured [`SearchPath`] and [`NameMatcher`] to turn
//! textual identifiers into typed handles, and converts catalog function
//! descriptors into resolvable operator definitions.
//!
//! The catalog is populated up front and then shared behind an `Arc`; the
//! resolver performs no locking and relies on the owner to keep the tree
//! read-stable during a resolve call.

#![forbid(unsafe_code)]

pub mod config;
pub mod convert;
pub mod function;
pub mod matcher;
pub mod moniker;
pub mod resolver;
pub mod schema;
pub mod table;

pub use config::{Conformance, ResolverConfig};
pub use convert::{param_families, to_operator};
pub use function::{
    CategoryFilter, FunctionCategory, FunctionDescriptor, FunctionParam, ReturnTypeStrategy,
};
pub use matcher::NameMatcher;
pub use moniker::{Moniker, MonikerKind};
pub use resolver::{CatalogResolver, SearchPath};
pub use schema::{Catalog, SchemaId};
pub use table::{CatalogTable, PreResolvedTable, SimpleTable, TableHandle};

/// Result type for catalog operations.
pub type CatalogResult<T> = relwire_result::Result<T>;
