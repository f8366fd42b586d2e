//! Conversions between relwire type descriptors and Arrow schemas.
//!
//! Catalogs in Arrow-native engines describe table row types with Arrow
//! schemas; these helpers let such a schema serve directly as a table's
//! row type, and map the supported kinds back when a consumer wants Arrow
//! out. Arrow types with no SQL counterpart here collapse to the nullable
//! ANY sentinel, per the encode-side sentinel rule.

use std::sync::Arc;

use arrow::datatypes::{
    DataType as ArrowType, Field as ArrowField, Fields, IntervalUnit as ArrowIntervalUnit,
    Schema, TimeUnit,
};

use relwire_result::{Error, Result};

use crate::datatype::{IntervalUnit, RelField, RelType, TypeKind};

/// Convert an Arrow data type (plus the field's nullability) into a
/// relwire type.
pub fn rel_type_from_arrow(data_type: &ArrowType, nullable: bool) -> RelType {
    let kind = match data_type {
        ArrowType::Boolean => TypeKind::Boolean,
        ArrowType::Int8 => TypeKind::TinyInt,
        ArrowType::Int16 => TypeKind::SmallInt,
        ArrowType::Int32 => TypeKind::Integer,
        ArrowType::Int64 => TypeKind::BigInt,
        ArrowType::UInt8 => TypeKind::SmallInt,
        ArrowType::UInt16 => TypeKind::Integer,
        ArrowType::UInt32 => TypeKind::BigInt,
        ArrowType::UInt64 => TypeKind::Decimal {
            precision: 20,
            scale: 0,
        },
        ArrowType::Float32 => TypeKind::Real,
        ArrowType::Float64 => TypeKind::Double,
        ArrowType::Decimal128(precision, scale) => TypeKind::Decimal {
            precision: *precision,
            scale: *scale,
        },
        ArrowType::Utf8 | ArrowType::LargeUtf8 | ArrowType::Utf8View => {
            TypeKind::Varchar { length: None }
        }
        ArrowType::Binary | ArrowType::LargeBinary | ArrowType::BinaryView => {
            TypeKind::Varbinary { length: None }
        }
        ArrowType::FixedSizeBinary(len) => TypeKind::Binary {
            length: (*len).max(0) as u32,
        },
        ArrowType::Date32 | ArrowType::Date64 => TypeKind::Date,
        ArrowType::Time32(_) | ArrowType::Time64(_) => TypeKind::Time,
        ArrowType::Timestamp(_, None) => TypeKind::Timestamp,
        ArrowType::Timestamp(_, Some(_)) => TypeKind::TimestampWithLocalTimeZone,
        ArrowType::Interval(ArrowIntervalUnit::YearMonth) => {
            TypeKind::Interval(IntervalUnit::YearMonth)
        }
        ArrowType::Interval(ArrowIntervalUnit::DayTime) => {
            TypeKind::Interval(IntervalUnit::DaySecond)
        }
        ArrowType::Struct(fields) => {
            let fields = fields.iter().map(|f| rel_field_from_arrow(f)).collect();
            TypeKind::Row(fields)
        }
        ArrowType::Null => TypeKind::Null,
        // No SQL counterpart: opaque sentinel.
        _ => return RelType::any(),
    };
    RelType::new(kind, nullable)
}

/// Convert an Arrow field into a named row field.
pub fn rel_field_from_arrow(field: &ArrowField) -> RelField {
    RelField::new(
        field.name().clone(),
        rel_type_from_arrow(field.data_type(), field.is_nullable()),
    )
}

/// Convert an Arrow schema into a (non-null) row type.
pub fn row_type_from_arrow(schema: &Schema) -> RelType {
    let fields = schema
        .fields()
        .iter()
        .map(|f| rel_field_from_arrow(f))
        .collect();
    RelType::row(fields)
}

/// Convert a relwire type back into an Arrow data type, failing for kinds
/// with no Arrow representation.
pub fn arrow_from_rel_type(ty: &RelType) -> Result<ArrowType> {
    let arrow = match ty.kind() {
        TypeKind::Boolean => ArrowType::Boolean,
        TypeKind::TinyInt => ArrowType::Int8,
        TypeKind::SmallInt => ArrowType::Int16,
        TypeKind::Integer => ArrowType::Int32,
        TypeKind::BigInt => ArrowType::Int64,
        TypeKind::Decimal { precision, scale } => ArrowType::Decimal128(*precision, *scale),
        TypeKind::Real => ArrowType::Float32,
        TypeKind::Float | TypeKind::Double => ArrowType::Float64,
        TypeKind::Char { .. } | TypeKind::Varchar { .. } => ArrowType::Utf8,
        TypeKind::Binary { length } => ArrowType::FixedSizeBinary(*length as i32),
        TypeKind::Varbinary { .. } => ArrowType::Binary,
        TypeKind::Date => ArrowType::Date32,
        TypeKind::Time => ArrowType::Time32(TimeUnit::Millisecond),
        TypeKind::Timestamp => ArrowType::Timestamp(TimeUnit::Millisecond, None),
        TypeKind::TimestampWithLocalTimeZone => {
            ArrowType::Timestamp(TimeUnit::Millisecond, Some(Arc::from("UTC")))
        }
        TypeKind::Interval(unit) if unit.is_year_month() => {
            ArrowType::Interval(ArrowIntervalUnit::YearMonth)
        }
        TypeKind::Interval(_) => ArrowType::Interval(ArrowIntervalUnit::DayTime),
        TypeKind::Row(fields) => {
            let arrow_fields = fields
                .iter()
                .map(arrow_field_from_rel)
                .collect::<Result<Vec<_>>>()?;
            ArrowType::Struct(Fields::from(arrow_fields))
        }
        other => {
            return Err(Error::InvalidArgument(format!(
                "type {} has no Arrow representation",
                other.name()
            )));
        }
    };
    Ok(arrow)
}

fn arrow_field_from_rel(field: &RelField) -> Result<ArrowField> {
    Ok(ArrowField::new(
        field.name.clone(),
        arrow_from_rel_type(&field.ty)?,
        field.ty.nullable(),
    ))
}

/// Convert a row type into an Arrow schema.
pub fn arrow_schema_from_row(ty: &RelType) -> Result<Schema> {
    let fields = ty.fields().ok_or_else(|| {
        Error::InvalidArgument(format!("expected a row type, got {}", ty.kind().name()))
    })?;
    let arrow_fields = fields
        .iter()
        .map(arrow_field_from_rel)
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::new(arrow_fields))
}
