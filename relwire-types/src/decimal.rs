//! Arbitrary-precision decimal values for wire literals.
//!
//! Numeric literals travel as JSON numbers and must survive the round trip
//! without drifting through `f64`. [`DecimalValue`] stores the scaled i128
//! mantissa plus a scale, mirroring Decimal128 semantics, and renders the
//! exact decimal string the wire carries.

use std::fmt;
use std::str::FromStr;

use arrow::datatypes::DECIMAL128_MAX_PRECISION;

/// Maximum precision supported by `DecimalValue` (aligns with Decimal128).
pub const MAX_DECIMAL_PRECISION: u8 = DECIMAL128_MAX_PRECISION;

/// Errors that can occur while building or parsing decimal values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    /// Requested scale falls outside the supported range.
    ScaleOutOfRange { scale: i32 },
    /// Result exceeded the maximum representable precision.
    PrecisionOverflow { value: i128, scale: i8 },
    /// Value does not fit the Decimal128 range, or the input was not a
    /// decimal number at all.
    Unrepresentable,
}

impl fmt::Display for DecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecimalError::ScaleOutOfRange { scale } => {
                write!(f, "decimal scale {scale} outside supported range")
            }
            DecimalError::PrecisionOverflow { value, scale } => {
                write!(
                    f,
                    "decimal value {value} with scale {scale} exceeds maximum precision"
                )
            }
            DecimalError::Unrepresentable => write!(f, "value not representable as a decimal"),
        }
    }
}

impl std::error::Error for DecimalError {}

/// An exact decimal: scaled integer mantissa plus fractional-digit count.
///
/// Equality is representation equality: `20.0` and `20.00` are distinct
/// values, which is what canonical re-encoding stability requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecimalValue {
    value: i128,
    scale: i8,
}

impl DecimalValue {
    /// Create a decimal from its raw parts, validating precision bounds.
    pub fn new(value: i128, scale: i8) -> Result<Self, DecimalError> {
        if !scale_within_bounds(scale as i32) {
            return Err(DecimalError::ScaleOutOfRange {
                scale: scale as i32,
            });
        }
        if digit_count(value) > MAX_DECIMAL_PRECISION {
            return Err(DecimalError::PrecisionOverflow { value, scale });
        }
        Ok(Self { value, scale })
    }

    /// Construct a decimal from an integer value with zero scale.
    pub fn from_i64(value: i64) -> Self {
        Self::new(value as i128, 0).expect("i64 fits within Decimal128 limits")
    }

    /// The scaled integer backing this decimal.
    #[inline]
    pub fn raw_value(self) -> i128 {
        self.value
    }

    /// Number of fractional digits.
    #[inline]
    pub fn scale(self) -> i8 {
        self.scale
    }

    /// Total digit count of the mantissa.
    #[inline]
    pub fn precision(self) -> u8 {
        digit_count(self.value)
    }

    /// Whether the value has no fractional part in its representation.
    #[inline]
    pub fn is_integral(self) -> bool {
        self.scale == 0
    }

    /// The value as an `i64` if it is integral and in range.
    pub fn to_i64(self) -> Option<i64> {
        if self.scale != 0 {
            return None;
        }
        i64::try_from(self.value).ok()
    }

    /// Lossy conversion for display-adjacent consumers.
    pub fn to_f64(self) -> f64 {
        if self.value == 0 {
            return 0.0;
        }
        (self.value as f64) / 10_f64.powi(self.scale as i32)
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.value);
        }
        let digits = self.value.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if self.value < 0 {
            f.write_str("-")?;
        }
        if digits.len() <= scale {
            f.write_str("0.")?;
            for _ in digits.len()..scale {
                f.write_str("0")?;
            }
            f.write_str(&digits)
        } else {
            let split = digits.len() - scale;
            f.write_str(&digits[..split])?;
            f.write_str(".")?;
            f.write_str(&digits[split..])
        }
    }
}

impl FromStr for DecimalValue {
    type Err = DecimalError;

    /// Parse a decimal string, including the scientific notation JSON
    /// number grammar allows (`-1.5e3`). Exponents fold into the scale so
    /// the parsed value stays exact.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (mantissa_part, exponent) = match s.find(['e', 'E']) {
            Some(pos) => {
                let exp = s[pos + 1..]
                    .parse::<i32>()
                    .map_err(|_| DecimalError::Unrepresentable)?;
                (&s[..pos], exp)
            }
            None => (s, 0),
        };

        let (sign, unsigned) = match mantissa_part.strip_prefix('-') {
            Some(rest) => (-1i128, rest),
            None => (1i128, mantissa_part.strip_prefix('+').unwrap_or(mantissa_part)),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DecimalError::Unrepresentable);
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(DecimalError::Unrepresentable);
        }

        let mut value: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add((b - b'0') as i128))
                .ok_or(DecimalError::Unrepresentable)?;
        }
        value *= sign;

        let mut scale = frac_part.len() as i32 - exponent;
        if scale < 0 {
            for _ in 0..(-scale) {
                value = value.checked_mul(10).ok_or(DecimalError::Unrepresentable)?;
            }
            scale = 0;
        }
        if !scale_within_bounds(scale) {
            return Err(DecimalError::ScaleOutOfRange { scale });
        }

        Self::new(value, scale as i8)
    }
}

fn digit_count(value: i128) -> u8 {
    let mut remaining = value.unsigned_abs();
    if remaining == 0 {
        return 1;
    }
    let mut count = 0u8;
    while remaining != 0 {
        remaining /= 10;
        count += 1;
    }
    count
}

fn scale_within_bounds(scale: i32) -> bool {
    let max = MAX_DECIMAL_PRECISION as i32;
    (-max..=max).contains(&scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_parse() {
        for text in ["0", "10", "-10", "20.00", "0.001", "-0.5", "12345678901234567.89"] {
            let parsed: DecimalValue = text.parse().unwrap();
            assert_eq!(parsed.to_string(), text, "for input {text}");
        }
    }

    #[test]
    fn representation_is_preserved() {
        let a: DecimalValue = "20.0".parse().unwrap();
        let b: DecimalValue = "20.00".parse().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.raw_value(), 200);
        assert_eq!(b.raw_value(), 2000);
    }

    #[test]
    fn scientific_notation_folds_into_scale() {
        let v: DecimalValue = "1.5e3".parse().unwrap();
        assert_eq!(v, DecimalValue::new(1500, 0).unwrap());
        let v: DecimalValue = "25e-2".parse().unwrap();
        assert_eq!(v, DecimalValue::new(25, 2).unwrap());
        assert_eq!(v.to_string(), "0.25");
    }

    #[test]
    fn wide_values_stay_exact() {
        let v: DecimalValue = "3129400000".parse().unwrap();
        assert_eq!(v.to_i64(), Some(3_129_400_000));
        let v: DecimalValue = "20.0000000000000049".parse().unwrap();
        assert_eq!(v.to_string(), "20.0000000000000049");
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<DecimalValue>().is_err());
        assert!("abc".parse::<DecimalValue>().is_err());
        assert!("1.2.3".parse::<DecimalValue>().is_err());
    }

    #[test]
    fn precision_bound_enforced() {
        let too_wide = "9".repeat(MAX_DECIMAL_PRECISION as usize + 1);
        assert!(matches!(
            too_wide.parse::<DecimalValue>(),
            Err(DecimalError::PrecisionOverflow { .. })
        ));
    }
}
