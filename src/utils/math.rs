//! Arbitrary-precision decimal arithmetic.
//!
//! Exchange rates are carried as [`Dec`]: a signed big integer scaled by
//! 10^18. The integer is unbounded here; callers enforce the
//! [`MAX_RATE_BIT_LENGTH`](crate::utils::constants::MAX_RATE_BIT_LENGTH)
//! guard where a rate enters the protocol.

use num_bigint::{BigInt, Sign};
use num_traits::{Signed, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::utils::constants::DECIMAL_PRECISION;

// ═══════════════════════════════════════════════════════════════════════════════
// DECIMAL TYPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Signed decimal with 18 fractional digits and unbounded magnitude
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dec(BigInt);

/// 10^18 as a big integer
fn scale() -> BigInt {
    BigInt::from(10u32).pow(DECIMAL_PRECISION)
}

impl Dec {
    /// Zero value
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// One (1.0)
    pub fn one() -> Self {
        Self(scale())
    }

    /// Create from the raw scaled integer
    pub fn from_raw(raw: BigInt) -> Self {
        Self(raw)
    }

    /// Create from an integer (scales up)
    pub fn from_int(value: i64) -> Self {
        Self(BigInt::from(value) * scale())
    }

    /// Create from `mantissa * 10^-exponent`, e.g. `(102, 2)` is 1.02
    pub fn with_prec(mantissa: i64, exponent: u32) -> Result<Self> {
        if exponent > DECIMAL_PRECISION {
            return Err(Error::InvalidParameter {
                name: "exponent".into(),
                reason: format!("exceeds {} decimal places", DECIMAL_PRECISION),
            });
        }
        let factor = BigInt::from(10u32).pow(DECIMAL_PRECISION - exponent);
        Ok(Self(BigInt::from(mantissa) * factor))
    }

    /// The raw scaled integer
    pub fn raw(&self) -> &BigInt {
        &self.0
    }

    /// Bit length of the magnitude of the underlying integer
    pub fn bit_len(&self) -> u64 {
        self.0.bits()
    }

    /// Check if value is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Check if value is negative
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Check if value is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// Absolute value
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Multiply, truncating toward zero
    pub fn mul(&self, other: &Dec) -> Self {
        Self((&self.0 * &other.0) / scale())
    }

    /// Multiply by an integer
    pub fn mul_int(&self, value: u64) -> Self {
        Self(&self.0 * BigInt::from(value))
    }

    /// Divide by an integer, truncating toward zero
    pub fn quo_int(&self, value: u64) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Self(&self.0 / BigInt::from(value)))
        }
    }

    /// Integer square root at full precision, `None` for negative values
    pub fn sqrt(&self) -> Option<Self> {
        if self.is_negative() {
            return None;
        }
        Some(Self((&self.0 * scale()).sqrt()))
    }

    /// Convert a [`rust_decimal::Decimal`] into a [`Dec`], truncating past 18 places
    pub fn from_decimal(value: rust_decimal::Decimal) -> Self {
        let mantissa = BigInt::from(value.mantissa());
        let value_scale = value.scale();
        if value_scale <= DECIMAL_PRECISION {
            Self(mantissa * BigInt::from(10u32).pow(DECIMAL_PRECISION - value_scale))
        } else {
            Self(mantissa / BigInt::from(10u32).pow(value_scale - DECIMAL_PRECISION))
        }
    }
}

impl Add for Dec {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Dec {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl<'a> Add<&'a Dec> for &'a Dec {
    type Output = Dec;

    fn add(self, rhs: &'a Dec) -> Dec {
        Dec(&self.0 + &rhs.0)
    }
}

impl<'a> Sub<&'a Dec> for &'a Dec {
    type Output = Dec;

    fn sub(self, rhs: &'a Dec) -> Dec {
        Dec(&self.0 - &rhs.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING AND FORMATTING
// ═══════════════════════════════════════════════════════════════════════════════

impl FromStr for Dec {
    type Err = Error;

    /// Parse `[-]digits[.digits]` with at most 18 fractional digits
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidParameter {
            name: "decimal".into(),
            reason: format!("'{}': {}", s, reason),
        };

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        if body.is_empty() {
            return Err(invalid("empty"));
        }

        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };

        if body.contains('.') && frac_part.is_empty() {
            return Err(invalid("missing fractional digits"));
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("no digits"));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("non-digit character"));
        }
        if frac_part.len() > DECIMAL_PRECISION as usize {
            return Err(invalid("too many decimal places"));
        }

        let mut digits = String::with_capacity(int_part.len() + DECIMAL_PRECISION as usize);
        digits.push_str(int_part);
        digits.push_str(frac_part);
        for _ in frac_part.len()..DECIMAL_PRECISION as usize {
            digits.push('0');
        }

        let magnitude = BigInt::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| invalid("unparseable digits"))?;

        Ok(Self(if negative { -magnitude } else { magnitude }))
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.magnitude().to_str_radix(10);
        let precision = DECIMAL_PRECISION as usize;
        let padded = if digits.len() <= precision {
            format!("{}{}", "0".repeat(precision + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - precision);
        let sign = if self.0.sign() == Sign::Minus { "-" } else { "" };
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({})", self)
    }
}

impl Serialize for Dec {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SAFE ARITHMETIC OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Safe addition with overflow check
pub fn safe_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(Error::Overflow {
        operation: format!("{} + {}", a, b),
    })
}

/// Period index of a block height
pub fn period_of(height: u64, period_length: u64) -> u64 {
    if period_length == 0 {
        return 0;
    }
    height / period_length
}

/// Whether `height` is the last block of a period of the given length
pub fn is_period_last_block(height: u64, period_length: u64) -> bool {
    period_length != 0 && height % period_length == period_length - 1
}
