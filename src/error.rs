//! Error types for the rate oracle.
//!
//! Every message handler returns [`Result`]. Errors are local to the message
//! that produced them: a failing message leaves no state behind (the single
//! exception being the prevote discarded on a hash mismatch, see
//! [`Error::VoteHashMismatch`]).

use thiserror::Error;

use crate::core::address::AddressParseError;

/// Result type alias for oracle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed hash, salt, address, denom or tuple string
    Format,
    /// Wrong feeder or wrong governance authority
    Authorization,
    /// Reveal that does not match its commitment, or has none
    ProtocolViolation,
    /// Rate magnitude or string length bound exceeded
    Overflow,
    /// Message is well formed but the chain state rejects it
    State,
    /// Encoding, storage and other internal failures
    Internal,
}

/// Main error type for the rate oracle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Format Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Vote hash is not hex of the expected length
    #[error("Invalid vote hash format: {0}")]
    InvalidHashFormat(String),

    /// Salt is not exactly 64 characters
    #[error("Invalid salt length: expected {expected} characters, got {got}")]
    InvalidSaltLength {
        /// Required salt length
        expected: usize,
        /// Length of the submitted salt
        got: usize,
    },

    /// Salt contains non-hex characters
    #[error("Invalid salt format: salt must be a valid hex string")]
    InvalidSaltFormat,

    /// Exchange rates string is empty
    #[error("Empty vote: must provide at least one exchange rate")]
    EmptyVoteRejected,

    /// An exchange rate tuple could not be parsed
    #[error("Malformed exchange rate tuple '{tuple}': {reason}")]
    MalformedRateTuple {
        /// Offending substring
        tuple: String,
        /// What was wrong with it
        reason: String,
    },

    /// The same denom appears twice in one vote
    #[error("Duplicate denom in vote: {0}")]
    DuplicateDenomInVote(String),

    /// Denom does not match the denom grammar
    #[error("Invalid denom '{denom}': {reason}")]
    InvalidDenom {
        /// Offending denom
        denom: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Address failed to parse
    #[error("Invalid {field} address: {source}")]
    InvalidAddress {
        /// Message field holding the address
        field: &'static str,
        /// Underlying parse failure
        #[source]
        source: AddressParseError,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Submitter is not the feeder registered for the validator
    #[error("Unauthorized feeder {submitter} for validator {validator}: expected {expected}")]
    UnauthorizedFeeder {
        /// Validator the vote was submitted for
        validator: String,
        /// Account that submitted it
        submitter: String,
        /// Account currently allowed to submit
        expected: String,
    },

    /// Principal may not perform a governance action
    #[error("Unauthorized action: {0}")]
    UnauthorizedAction(String),

    // ═══════════════════════════════════════════════════════════════════
    // Protocol Violations
    // ═══════════════════════════════════════════════════════════════════

    /// Revealed vote does not hash to the pending prevote.
    ///
    /// The prevote is consumed by the failed attempt.
    #[error("Vote hash mismatch for validator {validator}: prevote discarded")]
    VoteHashMismatch {
        /// Validator whose reveal failed
        validator: String,
    },

    /// Vote submitted with no pending prevote
    #[error("No pending prevote for validator {0}")]
    NoPrevote(String),

    /// Vote revealed outside the period following its prevote
    #[error("Reveal period mismatch: prevote in period {prevote_period}, current period {current_period}")]
    RevealPeriodMismatch {
        /// Period the prevote was submitted in
        prevote_period: u64,
        /// Period of the reveal attempt
        current_period: u64,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Overflow Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Exchange rates string longer than allowed
    #[error("Oversized vote: exchange rates string has {len} characters, max {max}")]
    OversizedVoteRejected {
        /// Submitted length
        len: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Rate magnitude exceeds the bit length guard
    #[error("Exchange rate overflow for {denom}: {bits} bits exceeds {max_bits}")]
    RateOverflow {
        /// Denom of the offending rate
        denom: String,
        /// Bit length of the rate's underlying integer
        bits: u64,
        /// Maximum allowed bit length
        max_bits: u64,
    },

    /// Overflow in calculation
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // State Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Validator is not in the bonded set
    #[error("Unknown or unbonded validator: {0}")]
    UnknownValidator(String),

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Wrap an address parse failure for the given message field
    pub fn address(field: &'static str, source: AddressParseError) -> Self {
        Error::InvalidAddress { field, source }
    }

    /// Category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidHashFormat(_)
            | Error::InvalidSaltLength { .. }
            | Error::InvalidSaltFormat
            | Error::EmptyVoteRejected
            | Error::MalformedRateTuple { .. }
            | Error::DuplicateDenomInVote(_)
            | Error::InvalidDenom { .. }
            | Error::InvalidAddress { .. }
            | Error::InvalidParameter { .. } => ErrorCategory::Format,

            Error::UnauthorizedFeeder { .. } | Error::UnauthorizedAction(_) => {
                ErrorCategory::Authorization
            }

            Error::VoteHashMismatch { .. }
            | Error::NoPrevote(_)
            | Error::RevealPeriodMismatch { .. } => ErrorCategory::ProtocolViolation,

            Error::OversizedVoteRejected { .. }
            | Error::RateOverflow { .. }
            | Error::Overflow { .. } => ErrorCategory::Overflow,

            Error::UnknownValidator(_) => ErrorCategory::State,

            Error::Serialization(_)
            | Error::Deserialization(_)
            | Error::Config(_)
            | Error::Internal(_)
            | Error::Storage(_) => ErrorCategory::Internal,
        }
    }

    /// Returns true if the submitter can fix the message and resubmit
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Internal)
    }

    /// Returns true if the error can be raised without reading chain state
    pub fn is_stateless(&self) -> bool {
        matches!(self.category(), ErrorCategory::Format | ErrorCategory::Overflow)
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Format errors: 1xxx
            Error::InvalidHashFormat(_) => 1001,
            Error::InvalidSaltLength { .. } => 1002,
            Error::InvalidSaltFormat => 1003,
            Error::EmptyVoteRejected => 1004,
            Error::MalformedRateTuple { .. } => 1005,
            Error::DuplicateDenomInVote(_) => 1006,
            Error::InvalidDenom { .. } => 1007,
            Error::InvalidAddress { .. } => 1008,
            Error::InvalidParameter { .. } => 1009,

            // Authorization errors: 2xxx
            Error::UnauthorizedFeeder { .. } => 2001,
            Error::UnauthorizedAction(_) => 2002,

            // Protocol violations: 3xxx
            Error::VoteHashMismatch { .. } => 3001,
            Error::NoPrevote(_) => 3002,
            Error::RevealPeriodMismatch { .. } => 3003,

            // Overflow errors: 4xxx
            Error::OversizedVoteRejected { .. } => 4001,
            Error::RateOverflow { .. } => 4002,
            Error::Overflow { .. } => 4003,

            // State errors: 5xxx
            Error::UnknownValidator(_) => 5001,

            // Internal errors: 9xxx
            Error::Serialization(_) => 9001,
            Error::Deserialization(_) => 9002,
            Error::Config(_) => 9003,
            Error::Internal(_) => 9004,
            Error::Storage(_) => 9005,
        }
    }
}

impl From<AddressParseError> for Error {
    fn from(source: AddressParseError) -> Self {
        Error::InvalidAddress {
            field: "signer",
            source,
        }
    }
}
