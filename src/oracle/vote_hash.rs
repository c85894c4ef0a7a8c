//! Aggregate vote hash: the commitment carried by a prevote.
//!
//! The hash binds the salt, the exact exchange rates string, the feeder and
//! the validator. Only the hash is public until the reveal, so nobody can
//! copy another validator's prices within the same period.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{Error, Result};
use crate::utils::constants::{VOTE_HASH_HEX_LENGTH, VOTE_HASH_LENGTH};
use crate::utils::crypto::sha256_truncated;

/// Truncated SHA-256 commitment to a vote
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AggregateVoteHash([u8; VOTE_HASH_LENGTH]);

impl AggregateVoteHash {
    /// Commit to `(salt, exchange_rates, feeder, validator)`.
    ///
    /// Addresses are the bech32 strings; the preimage is the four fields
    /// joined by `:` in that order.
    pub fn compute(salt: &str, exchange_rates: &str, feeder: &str, validator: &str) -> Self {
        let preimage = format!("{}:{}:{}:{}", salt, exchange_rates, feeder, validator);
        Self(sha256_truncated(preimage.as_bytes()))
    }

    /// Create from raw bytes
    pub fn new(bytes: [u8; VOTE_HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse from a hex string of exactly [`VOTE_HASH_HEX_LENGTH`] characters
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != VOTE_HASH_HEX_LENGTH {
            return Err(Error::InvalidHashFormat(format!(
                "expected {} hex characters, got {}",
                VOTE_HASH_HEX_LENGTH,
                s.len()
            )));
        }
        let bytes = hex::decode(s).map_err(|e| Error::InvalidHashFormat(e.to_string()))?;
        let mut arr = [0u8; VOTE_HASH_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Get the hash as bytes
    pub fn as_bytes(&self) -> &[u8; VOTE_HASH_LENGTH] {
        &self.0
    }

    /// Convert to lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for AggregateVoteHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggregateVoteHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for AggregateVoteHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for AggregateVoteHash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AggregateVoteHash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SALT: &str = "1f3e6c8a0b2d4f6e8a0c2e4f6a8b0d2f4e6a8c0e2f4a6b8d0f2e4a6c8e0a2b4d";

    #[test]
    fn test_compute_is_deterministic() {
        let a = AggregateVoteHash::compute(SALT, "1.0BTC", "feeder", "validator");
        let b = AggregateVoteHash::compute(SALT, "1.0BTC", "feeder", "validator");
        assert_eq!(a, b);
        assert_eq!(a.to_hex().len(), VOTE_HASH_HEX_LENGTH);
    }

    #[test]
    fn test_matches_preimage_layout() {
        let hash = AggregateVoteHash::compute("s", "r", "f", "v");
        assert_eq!(hash.as_bytes(), &sha256_truncated(b"s:r:f:v"));
    }

    #[test]
    fn test_field_order_matters() {
        let a = AggregateVoteHash::compute(SALT, "1.0BTC", "alice", "bob");
        let b = AggregateVoteHash::compute(SALT, "1.0BTC", "bob", "alice");
        assert_ne!(a, b);
    }

    #[test]
    fn test_binds_feeder_and_validator() {
        let base = AggregateVoteHash::compute(SALT, "1.0BTC", "alice", "valoper");
        assert_ne!(base, AggregateVoteHash::compute(SALT, "1.0BTC", "carol", "valoper"));
        assert_ne!(base, AggregateVoteHash::compute(SALT, "1.0BTC", "alice", "valoper2"));
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(
            AggregateVoteHash::from_hex("abcd"),
            Err(Error::InvalidHashFormat(_))
        ));
        assert!(matches!(
            AggregateVoteHash::from_hex(&"zz".repeat(VOTE_HASH_LENGTH)),
            Err(Error::InvalidHashFormat(_))
        ));
        assert!(AggregateVoteHash::from_hex(&"ab".repeat(VOTE_HASH_LENGTH)).is_ok());
    }

    #[test]
    fn test_uppercase_hex_accepted() {
        let hash = AggregateVoteHash::compute(SALT, "1.0BTC", "f", "v");
        let upper = hash.to_hex().to_uppercase();
        assert_eq!(AggregateVoteHash::from_hex(&upper).unwrap(), hash);
    }

    proptest! {
        #[test]
        fn prop_hex_roundtrip_is_stable(
            salt in "[0-9a-f]{64}",
            rates in "[0-9]{1,6}\\.[0-9]{1,6}[A-Z]{3,6}",
            feeder in "[a-z0-9]{10,40}",
            validator in "[a-z0-9]{10,40}",
        ) {
            let hash = AggregateVoteHash::compute(&salt, &rates, &feeder, &validator);
            let parsed = AggregateVoteHash::from_hex(&hash.to_string()).unwrap();
            prop_assert_eq!(parsed, hash);
        }

        #[test]
        fn prop_salt_perturbation_changes_hash(
            salt in "[0-9a-f]{64}",
            idx in 0usize..64,
        ) {
            let mut other: Vec<char> = salt.chars().collect();
            other[idx] = if other[idx] == '0' { '1' } else { '0' };
            let other: String = other.into_iter().collect();

            let a = AggregateVoteHash::compute(&salt, "1.0BTC", "f", "v");
            let b = AggregateVoteHash::compute(&other, "1.0BTC", "f", "v");
            prop_assert_ne!(a, b);
        }
    }
}
