//! Scalar expression trees and the codec that moves them on and off the
//! wire.
//!
//! An expression node is a literal, an input-field reference, an operator
//! call (optionally windowed), a correlation variable, or a dynamic
//! parameter. Every node carries a resolved type; calls derive theirs from
//! the operator's return-type rule unless the rule demands an explicit
//! wire type.

#![forbid(unsafe_code)]

pub mod codec;
pub mod expr;

pub use codec::{decode_expr, encode_expr, ExprContext, InputTranslator};
pub use expr::{
    CallExpr, Direction, FrameUnits, NullDirection, OrderKey, ScalarExpr, WindowBound,
    WindowFrame, WindowSpec,
};

/// Result type for expression operations.
pub type ExprResult<T> = relwire_result::Result<T>;
