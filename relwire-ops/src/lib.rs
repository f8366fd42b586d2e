//! Operator definitions and the operator registry.
//!
//! An operator's wire identity is the triple (name, kind tag, syntax
//! form). The registry resolves identities against a built-in standard
//! table first and then against named extension libraries in registration
//! order, which is how documents carrying non-standard operators decode.

#![forbid(unsafe_code)]

pub mod operator;
pub mod registry;

pub use operator::{
    KindTag, OperandRule, OperatorCategory, OperatorDef, ParamMetadata, ReturnTypeRule,
    SyntaxForm, TypeFamily,
};
pub use registry::{extended_library, OperatorRegistry};

/// Result type for operator operations.
pub type OpsResult<T> = relwire_result::Result<T>;
