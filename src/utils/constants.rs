//! Protocol constants and magic numbers.
//!
//! All protocol-wide constants are defined here for easy auditing and modification.

// ═══════════════════════════════════════════════════════════════════════════════
// VOTE HASH CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Length of a truncated SHA-256 digest, as used for ledger transaction hashes
pub const TRUNCATED_HASH_LENGTH: usize = 20;

/// Binary length of an aggregate vote hash
pub const VOTE_HASH_LENGTH: usize = TRUNCATED_HASH_LENGTH;

/// Hex length of an aggregate vote hash (hex doubles the length)
pub const VOTE_HASH_HEX_LENGTH: usize = VOTE_HASH_LENGTH * 2;

/// Salt length in bytes before hex encoding
pub const SALT_BYTES: usize = 32;

/// Salt length in hex characters
pub const SALT_HEX_LENGTH: usize = SALT_BYTES * 2;

// ═══════════════════════════════════════════════════════════════════════════════
// EXCHANGE RATE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum length of an exchange rates string in one vote
pub const MAX_EXCHANGE_RATES_LENGTH: usize = 4096;

/// Number of fractional decimal digits carried by exchange rates
pub const DECIMAL_PRECISION: u32 = 18;

/// Bits needed to carry the fractional precision (2^60 > 10^18)
pub const DECIMAL_PRECISION_BITS: u64 = 60;

/// Maximum bit length of an exchange rate's underlying integer
pub const MAX_RATE_BIT_LENGTH: u64 = 255 + DECIMAL_PRECISION_BITS;

// ═══════════════════════════════════════════════════════════════════════════════
// DENOM CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Minimum denom length
pub const MIN_DENOM_LENGTH: usize = 3;

/// Maximum denom length
pub const MAX_DENOM_LENGTH: usize = 128;

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum address length in bytes
pub const MAX_ADDRESS_LENGTH: usize = 255;

/// Default bech32 prefix for account addresses
pub const DEFAULT_ACCOUNT_PREFIX: &str = "oracle";

/// Default bech32 prefix for validator operator addresses
pub const DEFAULT_VALIDATOR_PREFIX: &str = "oraclevaloper";

// ═══════════════════════════════════════════════════════════════════════════════
// MESSAGE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Module name
pub const MODULE_NAME: &str = "oracle";

/// Router key for all oracle messages
pub const ROUTER_KEY: &str = MODULE_NAME;

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default vote period in blocks
pub const DEFAULT_VOTE_PERIOD: u64 = 14;

/// Default slash window in blocks (7200 vote periods)
pub const DEFAULT_SLASH_WINDOW: u64 = DEFAULT_VOTE_PERIOD * 7200;
