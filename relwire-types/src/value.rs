//! Typed scalar literal values.
//!
//! A literal pairs with a [`RelType`](crate::RelType) on the wire; the
//! value here is the payload half. Temporal values are stored as the raw
//! signed counts the protocol uses (days since epoch for dates,
//! milliseconds since epoch for times and timestamps), which keeps the
//! codec lossless for instants far outside 32-bit range.

use std::fmt;

use time::{Date, Month};

use crate::decimal::DecimalValue;

/// A scalar literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Null,
    /// Any exact or approximate numeric, held losslessly.
    Number(DecimalValue),
    Bool(bool),
    /// Character data with an optional character set / collation name.
    /// `None` means the resolver's configured default applies.
    Str {
        value: String,
        charset: Option<String>,
    },
    Bytes(Vec<u8>),
    /// Days since the Unix epoch.
    Date(i32),
    /// Milliseconds since midnight.
    Time(i64),
    /// Milliseconds since the Unix epoch; the type decides whether a local
    /// time zone is implied.
    Timestamp(i64),
    /// Months for year-month interval types, milliseconds for day-time
    /// interval types.
    Interval(i64),
    /// Internal enum-flag literal (e.g. a trim specifier).
    Symbol(String),
}

impl LiteralValue {
    /// String literal with the default character set.
    pub fn string(value: impl Into<String>) -> Self {
        LiteralValue::Str {
            value: value.into(),
            charset: None,
        }
    }

    pub fn number(value: impl Into<DecimalValue>) -> Self {
        LiteralValue::Number(value.into())
    }

    /// Short family name used in mismatch diagnostics.
    pub fn family_name(&self) -> &'static str {
        match self {
            LiteralValue::Null => "null",
            LiteralValue::Number(_) => "number",
            LiteralValue::Bool(_) => "boolean",
            LiteralValue::Str { .. } => "string",
            LiteralValue::Bytes(_) => "binary",
            LiteralValue::Date(_) => "date",
            LiteralValue::Time(_) => "time",
            LiteralValue::Timestamp(_) => "timestamp",
            LiteralValue::Interval(_) => "interval",
            LiteralValue::Symbol(_) => "symbol",
        }
    }

    /// Human-friendly rendering used in plan/debug output.
    pub fn format_display(&self) -> String {
        match self {
            LiteralValue::Null => "NULL".to_string(),
            LiteralValue::Number(n) => n.to_string(),
            LiteralValue::Bool(b) => b.to_string().to_uppercase(),
            LiteralValue::Str { value, .. } => format!("'{}'", escape_string(value)),
            LiteralValue::Bytes(bytes) => format!("X'{}'", hex_lower(bytes)),
            LiteralValue::Date(days) => format!("DATE '{}'", format_date(*days)),
            LiteralValue::Time(millis) => format!("TIME '{}'", format_time(*millis)),
            LiteralValue::Timestamp(millis) => {
                format!("TIMESTAMP '{}'", format_timestamp(*millis))
            }
            LiteralValue::Interval(count) => format!("INTERVAL {count}"),
            LiteralValue::Symbol(name) => format!("FLAG({name})"),
        }
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        LiteralValue::Number(DecimalValue::from_i64(value))
    }
}

impl From<DecimalValue> for LiteralValue {
    fn from(value: DecimalValue) -> Self {
        LiteralValue::Number(value)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Bool(value)
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::string(value)
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_display())
    }
}

/// Lowercase hex rendering of a byte slice (the wire form for binary
/// literals).
pub fn hex_lower(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

/// Parse a lowercase/uppercase hex string into bytes. Returns `None` for
/// odd-length or non-hex input.
pub fn hex_decode(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(text.len() / 2);
    let bytes = text.as_bytes();
    for pair in bytes.chunks_exact(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push(((hi << 4) | lo) as u8);
    }
    Some(out)
}

fn format_date(days: i32) -> String {
    let julian = match epoch_julian_day().checked_add(days) {
        Some(value) => value,
        None => return days.to_string(),
    };
    match Date::from_julian_day(julian) {
        Ok(date) => {
            let (year, month, day) = date.to_calendar_date();
            format!("{:04}-{:02}-{:02}", year, month as u8, day)
        }
        Err(_) => days.to_string(),
    }
}

fn format_time(millis: i64) -> String {
    let total_seconds = millis.div_euclid(1000);
    let ms = millis.rem_euclid(1000);
    let (h, m, s) = (
        total_seconds / 3600,
        (total_seconds / 60) % 60,
        total_seconds % 60,
    );
    if ms == 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{h:02}:{m:02}:{s:02}.{ms:03}")
    }
}

fn format_timestamp(millis: i64) -> String {
    let days = millis.div_euclid(86_400_000);
    let within_day = millis.rem_euclid(86_400_000);
    let Ok(day_i32) = i32::try_from(days) else {
        return millis.to_string();
    };
    format!("{} {}", format_date(day_i32), format_time(within_day))
}

fn epoch_julian_day() -> i32 {
    Date::from_calendar_date(1970, Month::January, 1)
        .expect("1970-01-01 is a valid date")
        .to_julian_day()
}

fn escape_string(value: &str) -> String {
    value.replace('\'', "''")
}
