//! Account and validator addresses.
//!
//! Addresses are raw bytes; their textual form is bech32 with a prefix that
//! depends on the address kind. [`AddressCodec`] owns the prefixes and is the
//! only place strings are turned into addresses, so a malformed address is
//! always a typed [`AddressParseError`] and never a panic.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::utils::constants::{DEFAULT_ACCOUNT_PREFIX, DEFAULT_VALIDATOR_PREFIX, MAX_ADDRESS_LENGTH};

/// Failure to parse or encode a bech32 address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    /// Address string is empty
    #[error("empty address string")]
    Empty,

    /// Not valid bech32
    #[error("bech32 decoding failed: {0}")]
    Bech32(String),

    /// Valid bech32 but with the wrong human-readable part
    #[error("invalid address prefix: expected '{expected}', got '{got}'")]
    WrongPrefix {
        /// Expected prefix
        expected: String,
        /// Prefix found in the string
        got: String,
    },

    /// Decoded payload length outside 1..=255 bytes
    #[error("invalid address length: {0} bytes")]
    InvalidLength(usize),

    /// Address could not be encoded under the configured prefix
    #[error("bech32 encoding failed: {0}")]
    Encoding(String),
}

macro_rules! address_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Vec<u8>);

        impl $name {
            /// Create from raw bytes, checking the length bounds
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressParseError> {
                if bytes.is_empty() || bytes.len() > MAX_ADDRESS_LENGTH {
                    return Err(AddressParseError::InvalidLength(bytes.len()));
                }
                Ok(Self(bytes.to_vec()))
            }

            /// Raw address bytes
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Short hex form for logs
            pub fn short(&self) -> String {
                let hex = hex::encode(&self.0);
                hex[..hex.len().min(12)].to_string()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(&self.0))
            }
        }
    };
}

address_type!(
    /// Account address (feeders, governance authority)
    AccAddress
);

address_type!(
    /// Validator operator address
    ValAddress
);

impl ValAddress {
    /// The operator's account address: same bytes, account prefix
    pub fn to_account(&self) -> AccAddress {
        AccAddress(self.0.clone())
    }
}

impl AccAddress {
    /// Reinterpret as a validator operator address
    pub fn to_validator(&self) -> ValAddress {
        ValAddress(self.0.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS CODEC
// ═══════════════════════════════════════════════════════════════════════════════

/// Bech32 codec for the two address kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCodec {
    /// Prefix of account addresses
    pub account_prefix: String,
    /// Prefix of validator operator addresses
    pub validator_prefix: String,
}

impl Default for AddressCodec {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT_PREFIX, DEFAULT_VALIDATOR_PREFIX)
    }
}

impl AddressCodec {
    /// Create a codec with the given prefixes
    pub fn new(account_prefix: impl Into<String>, validator_prefix: impl Into<String>) -> Self {
        Self {
            account_prefix: account_prefix.into(),
            validator_prefix: validator_prefix.into(),
        }
    }

    /// Parse a bech32 account address
    pub fn parse_account(&self, s: &str) -> Result<AccAddress, AddressParseError> {
        let bytes = decode(s, &self.account_prefix)?;
        AccAddress::from_bytes(&bytes)
    }

    /// Parse a bech32 validator operator address
    pub fn parse_validator(&self, s: &str) -> Result<ValAddress, AddressParseError> {
        let bytes = decode(s, &self.validator_prefix)?;
        ValAddress::from_bytes(&bytes)
    }

    /// Encode an account address
    pub fn encode_account(&self, addr: &AccAddress) -> Result<String, AddressParseError> {
        encode(&self.account_prefix, addr.as_bytes())
    }

    /// Encode a validator operator address
    pub fn encode_validator(&self, addr: &ValAddress) -> Result<String, AddressParseError> {
        encode(&self.validator_prefix, addr.as_bytes())
    }

    /// Check the prefixes are usable as bech32 human-readable parts
    pub fn validate(&self) -> Result<(), AddressParseError> {
        for prefix in [&self.account_prefix, &self.validator_prefix] {
            Hrp::parse(prefix).map_err(|e| AddressParseError::Encoding(e.to_string()))?;
        }
        Ok(())
    }
}

fn decode(s: &str, expected_prefix: &str) -> Result<Vec<u8>, AddressParseError> {
    if s.trim().is_empty() {
        return Err(AddressParseError::Empty);
    }

    let (hrp, data) = bech32::decode(s).map_err(|e| AddressParseError::Bech32(e.to_string()))?;

    if !hrp.as_str().eq_ignore_ascii_case(expected_prefix) {
        return Err(AddressParseError::WrongPrefix {
            expected: expected_prefix.to_string(),
            got: hrp.as_str().to_string(),
        });
    }

    if data.is_empty() || data.len() > MAX_ADDRESS_LENGTH {
        return Err(AddressParseError::InvalidLength(data.len()));
    }

    Ok(data)
}

fn encode(prefix: &str, bytes: &[u8]) -> Result<String, AddressParseError> {
    let hrp = Hrp::parse(prefix).map_err(|e| AddressParseError::Encoding(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, bytes).map_err(|e| AddressParseError::Encoding(e.to_string()))
}
