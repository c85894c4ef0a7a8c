//! Input validation utilities.
//!
//! Stateless checks shared by message validation and the state machine.

use crate::error::{Error, Result};
use crate::utils::constants::*;
use crate::utils::math::Dec;

// ═══════════════════════════════════════════════════════════════════════════════
// SALT VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate a reveal salt: exactly 64 characters, all hex
pub fn validate_salt(salt: &str) -> Result<()> {
    if salt.len() != SALT_HEX_LENGTH {
        return Err(Error::InvalidSaltLength {
            expected: SALT_HEX_LENGTH,
            got: salt.len(),
        });
    }
    if hex::decode(salt).is_err() {
        return Err(Error::InvalidSaltFormat);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// DENOM VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate denom syntax: a letter followed by 2..=127 of `[a-zA-Z0-9/:._-]`
pub fn validate_denom(denom: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidDenom {
        denom: denom.to_string(),
        reason,
    };

    if denom.len() < MIN_DENOM_LENGTH || denom.len() > MAX_DENOM_LENGTH {
        return Err(invalid(format!(
            "length {} outside [{}, {}]",
            denom.len(),
            MIN_DENOM_LENGTH,
            MAX_DENOM_LENGTH
        )));
    }

    let mut chars = denom.chars();
    if !chars.next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
        return Err(invalid("must start with a letter".into()));
    }
    if let Some(c) = chars.find(|c| !is_denom_char(*c)) {
        return Err(invalid(format!("invalid character '{}'", c)));
    }

    Ok(())
}

/// Characters allowed after the first one in a denom
pub fn is_denom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-')
}

// ═══════════════════════════════════════════════════════════════════════════════
// RATE VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate an exchange rate against the bit length overflow guard
pub fn validate_rate_bits(denom: &str, rate: &Dec) -> Result<()> {
    let bits = rate.bit_len();
    if bits > MAX_RATE_BIT_LENGTH {
        return Err(Error::RateOverflow {
            denom: denom.to_string(),
            bits,
            max_bits: MAX_RATE_BIT_LENGTH,
        });
    }
    Ok(())
}
