//! Algebra-node trees and the plan codec.
//!
//! A plan is an owned tree of [`AlgebraNode`]s. [`PlanWriter`] walks the
//! tree input-before-consumer and emits one record per node under the
//! top-level `"rels"` key, assigning sequential ids at emit time.
//! [`PlanReader`] replays the record sequence, resolving table references
//! through a [`CatalogResolver`](relwire_catalog::CatalogResolver) and
//! operator identities through an
//! [`OperatorRegistry`](relwire_ops::OperatorRegistry), and rebuilds the
//! tree in original construction order. A plan either fully reconstructs
//! or the decode fails with the originating node id attached.

#![forbid(unsafe_code)]

pub mod node;
pub mod reader;
pub mod writer;

pub use node::{
    AggregateCall, AlgebraNode, CollationKey, Distribution, DistributionType, InputArity,
    JoinType, ModifyOp, NodeKind,
};
pub use reader::PlanReader;
pub use writer::PlanWriter;

/// Result type for plan operations.
pub type PlanResult<T> = relwire_result::Result<T>;
