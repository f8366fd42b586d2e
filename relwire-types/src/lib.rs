//! Type descriptors and literal values for the relwire IR, plus the codecs
//! that move them on and off the JSON wire form.
//!
//! [`RelType`] describes an arbitrarily nested SQL-flavored data type
//! (nullability, precision/scale, interval units, row fields).
//! [`LiteralValue`] carries a typed scalar constant. The [`codec`] module
//! implements the round-trip laws the interchange protocol relies on:
//! `decode(encode(x)) == x` for every representable type and literal.

#![forbid(unsafe_code)]

pub mod codec;
pub mod datatype;
pub mod decimal;
pub mod translation;
pub mod value;

pub use datatype::{IntervalUnit, RelField, RelType, TypeKind};
pub use decimal::{DecimalError, DecimalValue, MAX_DECIMAL_PRECISION};
pub use value::LiteralValue;

/// Result type for type and literal operations.
pub type TypeResult<T> = relwire_result::Result<T>;
