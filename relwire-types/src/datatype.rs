//! Data-type descriptors for the relwire IR.
//!
//! A [`RelType`] pairs a [`TypeKind`] with a nullability flag. Kinds carry
//! only the facets that apply to them: character/binary length, decimal
//! precision and scale, an interval unit, or nested row fields. The set of
//! kinds is the closed core the wire protocol understands; anything a
//! producing runtime cannot express maps to the nullable ANY sentinel.

use std::fmt;

/// Interval qualifier units, named the way they appear on the wire
/// (`INTERVAL_DAY_SECOND` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Year,
    YearMonth,
    Month,
    Day,
    DayHour,
    DayMinute,
    DaySecond,
    Hour,
    HourMinute,
    HourSecond,
    Minute,
    MinuteSecond,
    Second,
}

impl IntervalUnit {
    /// Wire name of the interval type carrying this unit.
    pub fn type_name(self) -> &'static str {
        match self {
            IntervalUnit::Year => "INTERVAL_YEAR",
            IntervalUnit::YearMonth => "INTERVAL_YEAR_MONTH",
            IntervalUnit::Month => "INTERVAL_MONTH",
            IntervalUnit::Day => "INTERVAL_DAY",
            IntervalUnit::DayHour => "INTERVAL_DAY_HOUR",
            IntervalUnit::DayMinute => "INTERVAL_DAY_MINUTE",
            IntervalUnit::DaySecond => "INTERVAL_DAY_SECOND",
            IntervalUnit::Hour => "INTERVAL_HOUR",
            IntervalUnit::HourMinute => "INTERVAL_HOUR_MINUTE",
            IntervalUnit::HourSecond => "INTERVAL_HOUR_SECOND",
            IntervalUnit::Minute => "INTERVAL_MINUTE",
            IntervalUnit::MinuteSecond => "INTERVAL_MINUTE_SECOND",
            IntervalUnit::Second => "INTERVAL_SECOND",
        }
    }

    /// Parse a wire type name back into a unit.
    pub fn from_type_name(name: &str) -> Option<IntervalUnit> {
        Some(match name {
            "INTERVAL_YEAR" => IntervalUnit::Year,
            "INTERVAL_YEAR_MONTH" => IntervalUnit::YearMonth,
            "INTERVAL_MONTH" => IntervalUnit::Month,
            "INTERVAL_DAY" => IntervalUnit::Day,
            "INTERVAL_DAY_HOUR" => IntervalUnit::DayHour,
            "INTERVAL_DAY_MINUTE" => IntervalUnit::DayMinute,
            "INTERVAL_DAY_SECOND" => IntervalUnit::DaySecond,
            "INTERVAL_HOUR" => IntervalUnit::Hour,
            "INTERVAL_HOUR_MINUTE" => IntervalUnit::HourMinute,
            "INTERVAL_HOUR_SECOND" => IntervalUnit::HourSecond,
            "INTERVAL_MINUTE" => IntervalUnit::Minute,
            "INTERVAL_MINUTE_SECOND" => IntervalUnit::MinuteSecond,
            "INTERVAL_SECOND" => IntervalUnit::Second,
            _ => return None,
        })
    }

    /// Whether this unit belongs to the year-month family. Literal values
    /// for year-month intervals count months; day-time intervals count
    /// milliseconds.
    pub fn is_year_month(self) -> bool {
        matches!(
            self,
            IntervalUnit::Year | IntervalUnit::YearMonth | IntervalUnit::Month
        )
    }
}

/// A named, individually nullable field of a row type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelField {
    pub name: String,
    pub ty: RelType,
}

impl RelField {
    pub fn new(name: impl Into<String>, ty: RelType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Base type kind plus the facets that apply to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal { precision: u8, scale: i8 },
    Real,
    Float,
    Double,
    Char { length: u32 },
    Varchar { length: Option<u32> },
    Binary { length: u32 },
    Varbinary { length: Option<u32> },
    Date,
    Time,
    Timestamp,
    TimestampWithLocalTimeZone,
    Interval(IntervalUnit),
    /// Internal enum-flag literals (e.g. trim specifiers).
    Symbol,
    /// The dynamic catch-all; also the sentinel for unrepresentable types.
    Any,
    Null,
    /// Result type of table functions and table macros.
    Cursor,
    Row(Vec<RelField>),
}

impl TypeKind {
    /// Wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Boolean => "BOOLEAN",
            TypeKind::TinyInt => "TINYINT",
            TypeKind::SmallInt => "SMALLINT",
            TypeKind::Integer => "INTEGER",
            TypeKind::BigInt => "BIGINT",
            TypeKind::Decimal { .. } => "DECIMAL",
            TypeKind::Real => "REAL",
            TypeKind::Float => "FLOAT",
            TypeKind::Double => "DOUBLE",
            TypeKind::Char { .. } => "CHAR",
            TypeKind::Varchar { .. } => "VARCHAR",
            TypeKind::Binary { .. } => "BINARY",
            TypeKind::Varbinary { .. } => "VARBINARY",
            TypeKind::Date => "DATE",
            TypeKind::Time => "TIME",
            TypeKind::Timestamp => "TIMESTAMP",
            TypeKind::TimestampWithLocalTimeZone => "TIMESTAMP_WITH_LOCAL_TIME_ZONE",
            TypeKind::Interval(unit) => unit.type_name(),
            TypeKind::Symbol => "SYMBOL",
            TypeKind::Any => "ANY",
            TypeKind::Null => "NULL",
            TypeKind::Cursor => "CURSOR",
            TypeKind::Row(_) => "ROW",
        }
    }

    /// Whether literal values of this kind are numeric on the wire.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeKind::TinyInt
                | TypeKind::SmallInt
                | TypeKind::Integer
                | TypeKind::BigInt
                | TypeKind::Decimal { .. }
                | TypeKind::Real
                | TypeKind::Float
                | TypeKind::Double
        )
    }

    /// Whether this kind carries character data.
    pub fn is_character(&self) -> bool {
        matches!(self, TypeKind::Char { .. } | TypeKind::Varchar { .. })
    }

    /// Whether this kind carries binary data.
    pub fn is_binary(&self) -> bool {
        matches!(self, TypeKind::Binary { .. } | TypeKind::Varbinary { .. })
    }
}

/// A resolved data type: a kind plus nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelType {
    kind: TypeKind,
    nullable: bool,
}

impl RelType {
    pub fn new(kind: TypeKind, nullable: bool) -> Self {
        Self { kind, nullable }
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[inline]
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Row fields, if this is a row type.
    pub fn fields(&self) -> Option<&[RelField]> {
        match &self.kind {
            TypeKind::Row(fields) => Some(fields),
            _ => None,
        }
    }

    // Convenience constructors for the common kinds. All non-null unless
    // the kind is inherently nullable.

    pub fn boolean() -> Self {
        Self::new(TypeKind::Boolean, false)
    }

    pub fn tinyint() -> Self {
        Self::new(TypeKind::TinyInt, false)
    }

    pub fn smallint() -> Self {
        Self::new(TypeKind::SmallInt, false)
    }

    pub fn integer() -> Self {
        Self::new(TypeKind::Integer, false)
    }

    pub fn bigint() -> Self {
        Self::new(TypeKind::BigInt, false)
    }

    pub fn decimal(precision: u8, scale: i8) -> Self {
        Self::new(TypeKind::Decimal { precision, scale }, false)
    }

    pub fn real() -> Self {
        Self::new(TypeKind::Real, false)
    }

    pub fn double() -> Self {
        Self::new(TypeKind::Double, false)
    }

    pub fn char(length: u32) -> Self {
        Self::new(TypeKind::Char { length }, false)
    }

    pub fn varchar(length: Option<u32>) -> Self {
        Self::new(TypeKind::Varchar { length }, false)
    }

    pub fn binary(length: u32) -> Self {
        Self::new(TypeKind::Binary { length }, false)
    }

    pub fn varbinary(length: Option<u32>) -> Self {
        Self::new(TypeKind::Varbinary { length }, false)
    }

    pub fn date() -> Self {
        Self::new(TypeKind::Date, false)
    }

    pub fn time() -> Self {
        Self::new(TypeKind::Time, false)
    }

    pub fn timestamp() -> Self {
        Self::new(TypeKind::Timestamp, false)
    }

    pub fn timestamp_with_local_time_zone() -> Self {
        Self::new(TypeKind::TimestampWithLocalTimeZone, false)
    }

    pub fn interval(unit: IntervalUnit) -> Self {
        Self::new(TypeKind::Interval(unit), false)
    }

    pub fn symbol() -> Self {
        Self::new(TypeKind::Symbol, false)
    }

    /// The nullable ANY sentinel used for dynamically-typed values and for
    /// foreign types with no representation here.
    pub fn any() -> Self {
        Self::new(TypeKind::Any, true)
    }

    pub fn null() -> Self {
        Self::new(TypeKind::Null, true)
    }

    pub fn cursor() -> Self {
        Self::new(TypeKind::Cursor, false)
    }

    pub fn row(fields: Vec<RelField>) -> Self {
        Self::new(TypeKind::Row(fields), false)
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Decimal { precision, scale } => {
                write!(f, "DECIMAL({precision}, {scale})")?
            }
            TypeKind::Char { length } => write!(f, "CHAR({length})")?,
            TypeKind::Varchar { length: Some(n) } => write!(f, "VARCHAR({n})")?,
            TypeKind::Binary { length } => write!(f, "BINARY({length})")?,
            TypeKind::Varbinary { length: Some(n) } => write!(f, "VARBINARY({n})")?,
            TypeKind::Row(fields) => {
                write!(f, "ROW(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", field.name, field.ty)?;
                }
                write!(f, ")")?;
            }
            other => write!(f, "{}", other.name())?,
        }
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}
