//! Exchange rate tuple parsing.
//!
//! A vote reveals its prices as a single string of decimal coins,
//! `<rate><denom>` joined by commas, e.g. `1.02BTC,3000.5ETH`. The string is
//! hashed verbatim, so the parser never rewrites it; the canonical form is
//! only used when a node prints tuples back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Error, Result};
use crate::utils::constants::{DECIMAL_PRECISION, MAX_EXCHANGE_RATES_LENGTH};
use crate::utils::math::Dec;
use crate::utils::validation::{validate_denom, validate_rate_bits};

/// One `(denom, rate)` pair of a vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateTuple {
    /// Asset symbol
    pub denom: String,
    /// Price in the reference asset
    pub exchange_rate: Dec,
}

impl ExchangeRateTuple {
    /// Create a new tuple
    pub fn new(denom: impl Into<String>, exchange_rate: Dec) -> Self {
        Self {
            denom: denom.into(),
            exchange_rate,
        }
    }
}

impl fmt::Display for ExchangeRateTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.exchange_rate, self.denom)
    }
}

/// Ordered list of tuples, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateTuples(Vec<ExchangeRateTuple>);

impl ExchangeRateTuples {
    /// Wrap already-validated tuples
    pub fn new(tuples: Vec<ExchangeRateTuple>) -> Self {
        Self(tuples)
    }

    /// Iterate in submission order
    pub fn iter(&self) -> impl Iterator<Item = &ExchangeRateTuple> {
        self.0.iter()
    }

    /// Rate for a denom, if present
    pub fn rate_of(&self, denom: &str) -> Option<&Dec> {
        self.0
            .iter()
            .find(|t| t.denom == denom)
            .map(|t| &t.exchange_rate)
    }

    /// Number of tuples
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ExchangeRateTuples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tuple) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", tuple)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ExchangeRateTuples {
    type Item = &'a ExchangeRateTuple;
    type IntoIter = std::slice::Iter<'a, ExchangeRateTuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse and bound-check an exchange rates string.
///
/// Checks, in order: overall length, per-item syntax, the rate bit-length
/// guard, then duplicate denoms.
pub fn parse_exchange_rate_tuples(s: &str) -> Result<ExchangeRateTuples> {
    if s.is_empty() {
        return Err(Error::EmptyVoteRejected);
    }
    if s.len() > MAX_EXCHANGE_RATES_LENGTH {
        return Err(Error::OversizedVoteRejected {
            len: s.len(),
            max: MAX_EXCHANGE_RATES_LENGTH,
        });
    }

    let mut tuples = Vec::new();
    let mut seen = BTreeSet::new();

    for item in s.split(',') {
        let tuple = parse_tuple(item)?;
        validate_rate_bits(&tuple.denom, &tuple.exchange_rate)?;
        if !seen.insert(tuple.denom.clone()) {
            return Err(Error::DuplicateDenomInVote(tuple.denom));
        }
        tuples.push(tuple);
    }

    Ok(ExchangeRateTuples(tuples))
}

fn parse_tuple(item: &str) -> Result<ExchangeRateTuple> {
    let malformed = |reason: &str| Error::MalformedRateTuple {
        tuple: item.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = item.trim();
    if trimmed.is_empty() {
        return Err(malformed("empty item"));
    }

    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(|| malformed("missing denom"))?;
    let (amount, denom) = trimmed.split_at(split);
    let amount = amount.trim_end();

    if amount.is_empty() {
        return Err(malformed("missing exchange rate"));
    }
    if !amount.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(malformed("exchange rate must be an unsigned decimal"));
    }
    if amount.ends_with('.') || amount.matches('.').count() > 1 {
        return Err(malformed("invalid decimal point"));
    }
    if let Some((_, frac)) = amount.split_once('.') {
        if frac.len() > DECIMAL_PRECISION as usize {
            return Err(malformed("too many decimal places"));
        }
    }

    validate_denom(denom).map_err(|e| malformed(&e.to_string()))?;

    let exchange_rate: Dec = amount.parse().map_err(|e: Error| malformed(&e.to_string()))?;

    Ok(ExchangeRateTuple::new(denom, exchange_rate))
}
