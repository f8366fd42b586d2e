//! relwire: a wire protocol for relational-algebra query plans.
//!
//! This crate is the entrypoint for the relwire toolkit. It re-exports the
//! plan codec, expression codec, catalog resolver, and operator registry
//! from the underlying `relwire-*` crates, providing a unified API surface
//! for users.
//!
//! # Quick Start
//!
//! Build a catalog, encode a plan, and decode it back:
//!
//! ```rust
//! use std::sync::Arc;
//! use relwire::catalog::{Catalog, CatalogResolver, ResolverConfig, SimpleTable};
//! use relwire::expr::ScalarExpr;
//! use relwire::ops::OperatorRegistry;
//! use relwire::plan::{AlgebraNode, PlanReader, PlanWriter};
//! use relwire::types::{RelField, RelType};
//!
//! let mut catalog = Catalog::new();
//! let hr = catalog.add_schema_path(&["hr"]);
//! catalog.add_table(
//!     hr,
//!     "emps",
//!     Arc::new(SimpleTable::new(vec![
//!         RelField::new("empid", RelType::integer()),
//!         RelField::new("deptno", RelType::integer().with_nullable(true)),
//!     ])),
//! );
//!
//! let resolver = CatalogResolver::new(Arc::new(catalog), Vec::new(), ResolverConfig::default());
//! let registry = OperatorRegistry::standard();
//!
//! let eq = registry.lookup_wire("=", "EQUALS", "BINARY").unwrap();
//! let plan = AlgebraNode::filter(
//!     AlgebraNode::table_scan(resolver.resolve_table(&["hr", "emps"]).unwrap()),
//!     ScalarExpr::call(
//!         eq,
//!         vec![
//!             ScalarExpr::input(1, RelType::integer().with_nullable(true)),
//!             ScalarExpr::literal(10i64, RelType::integer()),
//!         ],
//!     )
//!     .unwrap(),
//! );
//!
//! let text = PlanWriter::encode_to_string(&plan).unwrap();
//! let decoded = PlanReader::new(&resolver, &registry).decode_str(&text).unwrap();
//! assert_eq!(decoded, plan);
//! ```
//!
//! # Architecture
//!
//! relwire is organized as a layered workspace:
//!
//! - **Plan Codec** (`relwire-plan`): encodes/decodes the ordered algebra
//!   node sequence under the document's `"rels"` key.
//! - **Expression Codec** (`relwire-expr`): scalar expression trees,
//!   window specifications, and the input-translator hook.
//! - **Catalog** (`relwire-catalog`): the hierarchical schema tree,
//!   search-path resolution, and function-to-operator conversion.
//! - **Operators** (`relwire-ops`): operator identities, inference rules,
//!   and the extension-library registry.
//! - **Types** (`relwire-types`): type descriptors, exact decimal and
//!   literal values, and their codecs.

#![forbid(unsafe_code)]

// Re-export result types for error handling
pub use relwire_result::{Error, Result};

pub mod types {
    //! Type descriptors, literal values, and their codecs.
    pub use relwire_types::codec::{decode_type, encode_type};
    pub use relwire_types::{
        DecimalValue, IntervalUnit, LiteralValue, RelField, RelType, TypeKind,
    };
}

pub mod ops {
    //! Operator definitions and the operator registry.
    pub use relwire_ops::{
        extended_library, KindTag, OperatorDef, OperatorRegistry, ReturnTypeRule, SyntaxForm,
    };
}

pub mod catalog {
    //! The schema tree, resolver, and function descriptors.
    pub use relwire_catalog::{
        Catalog, CatalogResolver, CatalogTable, CategoryFilter, Conformance, FunctionCategory,
        FunctionDescriptor, Moniker, MonikerKind, NameMatcher, PreResolvedTable, ResolverConfig,
        SearchPath, SimpleTable, TableHandle,
    };
}

pub mod expr {
    //! Scalar expression trees and their codec.
    pub use relwire_expr::{
        decode_expr, encode_expr, CallExpr, Direction, ExprContext, FrameUnits, InputTranslator,
        NullDirection, OrderKey, ScalarExpr, WindowBound, WindowFrame, WindowSpec,
    };
}

pub mod plan {
    //! Algebra nodes and the plan codec.
    pub use relwire_plan::{
        AggregateCall, AlgebraNode, CollationKey, Distribution, DistributionType, JoinType,
        ModifyOp, NodeKind, PlanReader, PlanWriter,
    };
}
