//! JSON codecs for type descriptors and literal values.
//!
//! Types encode as `{"type": NAME, "nullable": bool}` plus the facets that
//! apply to the kind; row types encode as an ordered `"fields"` list. A
//! literal's payload shape depends on its declared type: numerics and
//! temporal counts are JSON numbers (decoded through serde_json's
//! arbitrary-precision `Number`, never `f64`), binary data is a lowercase
//! hex string, and SQL NULL is the JSON literal `null`.

use serde_json::{Map, Number, Value};

use relwire_result::{Error, Result};

use crate::datatype::{IntervalUnit, RelField, RelType, TypeKind};
use crate::decimal::DecimalValue;
use crate::value::{hex_decode, hex_lower, LiteralValue};

/// Encode a type descriptor as a structured value.
pub fn encode_type(ty: &RelType) -> Value {
    Value::Object(type_map(ty))
}

/// Encode a row-type field: the field's type object with `"name"` appended.
pub fn encode_field(field: &RelField) -> Value {
    let mut map = type_map(&field.ty);
    map.insert("name".into(), Value::String(field.name.clone()));
    Value::Object(map)
}

fn type_map(ty: &RelType) -> Map<String, Value> {
    let mut map = Map::new();
    match ty.kind() {
        TypeKind::Row(fields) => {
            let encoded: Vec<Value> = fields.iter().map(encode_field).collect();
            map.insert("fields".into(), Value::Array(encoded));
            map.insert("nullable".into(), Value::Bool(ty.nullable()));
        }
        kind => {
            map.insert("type".into(), Value::String(kind.name().to_string()));
            map.insert("nullable".into(), Value::Bool(ty.nullable()));
            match kind {
                TypeKind::Decimal { precision, scale } => {
                    map.insert("precision".into(), Value::Number((*precision).into()));
                    map.insert("scale".into(), Value::Number((*scale).into()));
                }
                TypeKind::Char { length } | TypeKind::Binary { length } => {
                    map.insert("precision".into(), Value::Number((*length).into()));
                }
                TypeKind::Varchar { length: Some(n) }
                | TypeKind::Varbinary { length: Some(n) } => {
                    map.insert("precision".into(), Value::Number((*n).into()));
                }
                _ => {}
            }
        }
    }
    map
}

/// Decode a type descriptor.
///
/// Accepts the full object form and the compact bare-string form
/// (`"INTEGER"`), which some producers use for null literals; the compact
/// form yields the nullable rendition of the named kind.
pub fn decode_type(value: &Value) -> Result<RelType> {
    match value {
        Value::String(name) => Ok(RelType::new(parse_kind(name, None, None)?, true)),
        Value::Object(map) => {
            let nullable = map
                .get("nullable")
                .and_then(Value::as_bool)
                .unwrap_or(true);
            if let Some(fields) = map.get("fields") {
                let fields = fields
                    .as_array()
                    .ok_or_else(|| Error::malformed("'fields' must be an array"))?
                    .iter()
                    .map(decode_field)
                    .collect::<Result<Vec<_>>>()?;
                return Ok(RelType::new(TypeKind::Row(fields), nullable));
            }
            let name = map
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::malformed("type object is missing 'type'"))?;
            let precision = map.get("precision").and_then(Value::as_u64);
            let scale = map.get("scale").and_then(Value::as_i64);
            Ok(RelType::new(parse_kind(name, precision, scale)?, nullable))
        }
        other => Err(Error::malformed(format!(
            "expected a type name or type object, got {other}"
        ))),
    }
}

/// Decode a row-type field (a type object carrying `"name"`).
pub fn decode_field(value: &Value) -> Result<RelField> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::malformed("row field must be an object"))?;
    let name = map
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::malformed("row field is missing 'name'"))?;
    let ty = decode_type(value)?;
    Ok(RelField::new(name, ty))
}

fn parse_kind(name: &str, precision: Option<u64>, scale: Option<i64>) -> Result<TypeKind> {
    if let Some(unit) = IntervalUnit::from_type_name(name) {
        return Ok(TypeKind::Interval(unit));
    }
    let kind = match name {
        "BOOLEAN" => TypeKind::Boolean,
        "TINYINT" => TypeKind::TinyInt,
        "SMALLINT" => TypeKind::SmallInt,
        "INTEGER" => TypeKind::Integer,
        "BIGINT" => TypeKind::BigInt,
        "DECIMAL" => TypeKind::Decimal {
            precision: precision.unwrap_or(19) as u8,
            scale: scale.unwrap_or(0) as i8,
        },
        "REAL" => TypeKind::Real,
        "FLOAT" => TypeKind::Float,
        "DOUBLE" => TypeKind::Double,
        "CHAR" => TypeKind::Char {
            length: precision.unwrap_or(1) as u32,
        },
        "VARCHAR" => TypeKind::Varchar {
            length: precision.map(|p| p as u32),
        },
        "BINARY" => TypeKind::Binary {
            length: precision.unwrap_or(1) as u32,
        },
        "VARBINARY" => TypeKind::Varbinary {
            length: precision.map(|p| p as u32),
        },
        "DATE" => TypeKind::Date,
        "TIME" => TypeKind::Time,
        "TIMESTAMP" => TypeKind::Timestamp,
        "TIMESTAMP_WITH_LOCAL_TIME_ZONE" => TypeKind::TimestampWithLocalTimeZone,
        "SYMBOL" => TypeKind::Symbol,
        "ANY" => TypeKind::Any,
        "NULL" => TypeKind::Null,
        "CURSOR" => TypeKind::Cursor,
        other => {
            return Err(Error::malformed(format!("unknown type name '{other}'")));
        }
    };
    Ok(kind)
}

/// Encode a literal's payload for the wire, validating it against the
/// declared type.
pub fn encode_literal(value: &LiteralValue, ty: &RelType) -> Result<Value> {
    let kind = ty.kind();
    match value {
        LiteralValue::Null => Ok(Value::Null),
        LiteralValue::Number(decimal) => {
            if kind.is_numeric() || matches!(kind, TypeKind::Any) {
                decimal_to_number(*decimal).map(Value::Number)
            } else {
                Err(mismatch(value, ty))
            }
        }
        LiteralValue::Bool(b) => match kind {
            TypeKind::Boolean | TypeKind::Any => Ok(Value::Bool(*b)),
            _ => Err(mismatch(value, ty)),
        },
        LiteralValue::Str { value: text, .. } => {
            if kind.is_character() || matches!(kind, TypeKind::Any) {
                Ok(Value::String(text.clone()))
            } else {
                Err(mismatch(value, ty))
            }
        }
        LiteralValue::Bytes(bytes) => {
            if kind.is_binary() {
                Ok(Value::String(hex_lower(bytes)))
            } else {
                Err(mismatch(value, ty))
            }
        }
        LiteralValue::Date(days) => match kind {
            TypeKind::Date => Ok(Value::Number((*days as i64).into())),
            _ => Err(mismatch(value, ty)),
        },
        LiteralValue::Time(millis) => match kind {
            TypeKind::Time => Ok(Value::Number((*millis).into())),
            _ => Err(mismatch(value, ty)),
        },
        LiteralValue::Timestamp(millis) => match kind {
            TypeKind::Timestamp | TypeKind::TimestampWithLocalTimeZone => {
                Ok(Value::Number((*millis).into()))
            }
            _ => Err(mismatch(value, ty)),
        },
        LiteralValue::Interval(count) => match kind {
            TypeKind::Interval(_) => Ok(Value::Number((*count).into())),
            _ => Err(mismatch(value, ty)),
        },
        LiteralValue::Symbol(name) => match kind {
            TypeKind::Symbol => Ok(Value::String(name.clone())),
            _ => Err(mismatch(value, ty)),
        },
    }
}

/// Decode a literal payload against its declared type.
pub fn decode_literal(value: &Value, ty: &RelType) -> Result<LiteralValue> {
    if value.is_null() {
        return Ok(LiteralValue::Null);
    }
    match ty.kind() {
        TypeKind::Boolean => value
            .as_bool()
            .map(LiteralValue::Bool)
            .ok_or_else(|| Error::type_mismatch(format!("non-boolean value for BOOLEAN: {value}"))),
        kind if kind.is_numeric() => {
            let number = value.as_number().ok_or_else(|| {
                Error::type_mismatch(format!(
                    "non-numeric value for numeric type {}: {value}",
                    kind.name()
                ))
            })?;
            let decimal = number
                .to_string()
                .parse::<DecimalValue>()
                .map_err(|err| Error::type_mismatch(format!("bad numeric literal: {err}")))?;
            Ok(LiteralValue::Number(decimal))
        }
        kind if kind.is_character() => Ok(LiteralValue::Str {
            value: expect_string(value, kind.name())?.to_string(),
            charset: None,
        }),
        kind if kind.is_binary() => {
            let text = expect_string(value, kind.name())?;
            hex_decode(text).map(LiteralValue::Bytes).ok_or_else(|| {
                Error::type_mismatch(format!("'{text}' is not a hex-encoded binary literal"))
            })
        }
        TypeKind::Date => {
            let days = expect_integer(value, "DATE")?;
            let days = i32::try_from(days).map_err(|_| {
                Error::type_mismatch(format!("date literal {days} out of range"))
            })?;
            Ok(LiteralValue::Date(days))
        }
        TypeKind::Time => Ok(LiteralValue::Time(expect_integer(value, "TIME")?)),
        TypeKind::Timestamp | TypeKind::TimestampWithLocalTimeZone => {
            // Must be parsed as a wide integer: millisecond counts exceed
            // 32 bits less than a month after the epoch.
            Ok(LiteralValue::Timestamp(expect_integer(value, "TIMESTAMP")?))
        }
        TypeKind::Interval(_) => Ok(LiteralValue::Interval(expect_integer(value, "INTERVAL")?)),
        TypeKind::Symbol => Ok(LiteralValue::Symbol(
            expect_string(value, "SYMBOL")?.to_string(),
        )),
        TypeKind::Any => decode_untyped(value),
        other => Err(Error::type_mismatch(format!(
            "literals of type {} are not supported",
            other.name()
        ))),
    }
}

/// Literal decode for the dynamic ANY type: shape decides the value.
fn decode_untyped(value: &Value) -> Result<LiteralValue> {
    match value {
        Value::Null => Ok(LiteralValue::Null),
        Value::Bool(b) => Ok(LiteralValue::Bool(*b)),
        Value::Number(n) => {
            let decimal = n
                .to_string()
                .parse::<DecimalValue>()
                .map_err(|err| Error::type_mismatch(format!("bad numeric literal: {err}")))?;
            Ok(LiteralValue::Number(decimal))
        }
        Value::String(s) => Ok(LiteralValue::string(s.clone())),
        other => Err(Error::type_mismatch(format!(
            "unsupported literal shape for ANY: {other}"
        ))),
    }
}

fn decimal_to_number(decimal: DecimalValue) -> Result<Number> {
    // serde_json with arbitrary_precision keeps the digits verbatim, so
    // the Display form survives the round trip exactly.
    serde_json::from_str::<Number>(&decimal.to_string())
        .map_err(|err| Error::Internal(format!("decimal '{decimal}' is not a JSON number: {err}")))
}

fn expect_string<'a>(value: &'a Value, type_name: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        Error::type_mismatch(format!("non-string value for {type_name}: {value}"))
    })
}

fn expect_integer(value: &Value, type_name: &str) -> Result<i64> {
    value
        .as_number()
        .and_then(Number::as_i64)
        .ok_or_else(|| {
            Error::type_mismatch(format!(
                "{type_name} literal must be an integer count: {value}"
            ))
        })
}

fn mismatch(value: &LiteralValue, ty: &RelType) -> Error {
    Error::type_mismatch(format!(
        "{} value cannot be encoded as {}",
        value.family_name(),
        ty.kind().name()
    ))
}
