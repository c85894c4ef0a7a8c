//! Oracle messages.
//!
//! [`OracleMsg`] is the closed set of messages the oracle accepts. Payloads
//! carry addresses as bech32 strings, exactly as they arrive from clients;
//! [`OracleMsg::validate_basic`] performs every check that needs no state.

use serde::{Deserialize, Serialize};

use crate::core::address::{AccAddress, AddressCodec, AddressParseError, ValAddress};
use crate::core::params::Params;
use crate::error::{Error, Result};
use crate::oracle::tuples::{parse_exchange_rate_tuples, ExchangeRateTuples};
use crate::oracle::vote_hash::AggregateVoteHash;
use crate::utils::constants::ROUTER_KEY;
use crate::utils::validation::{validate_denom, validate_salt};

// ═══════════════════════════════════════════════════════════════════════════════
// MESSAGE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Type string of the prevote message
pub const TYPE_MSG_AGGREGATE_EXCHANGE_RATE_PREVOTE: &str = "aggregate_exchange_rate_prevote";
/// Type string of the vote message
pub const TYPE_MSG_AGGREGATE_EXCHANGE_RATE_VOTE: &str = "aggregate_exchange_rate_vote";
/// Type string of the feeder delegation message
pub const TYPE_MSG_DELEGATE_FEED_CONSENT: &str = "delegate_feeder";
/// Type string of the add denom message
pub const TYPE_MSG_ADD_REQUIRED_DENOM: &str = "add_price";
/// Type string of the remove denom message
pub const TYPE_MSG_REMOVE_REQUIRED_DENOM: &str = "remove_price";
/// Type string of the params update message
pub const TYPE_MSG_UPDATE_PARAMS: &str = "update_params";

/// Every message the oracle accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OracleMsg {
    /// Commit to a vote
    AggregateExchangeRatePrevote(MsgAggregateExchangeRatePrevote),
    /// Reveal a committed vote
    AggregateExchangeRateVote(MsgAggregateExchangeRateVote),
    /// Delegate feeding rights
    #[serde(rename = "delegate_feeder")]
    DelegateFeedConsent(MsgDelegateFeedConsent),
    /// Add a required denom
    #[serde(rename = "add_price")]
    AddRequiredDenom(MsgAddRequiredDenom),
    /// Remove a required denom
    #[serde(rename = "remove_price")]
    RemoveRequiredDenom(MsgRemoveRequiredDenom),
    /// Replace params
    UpdateParams(MsgUpdateParams),
}

/// Commitment to an upcoming vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAggregateExchangeRatePrevote {
    /// Hex vote hash
    pub hash: String,
    /// Submitting feeder account
    pub feeder: String,
    /// Validator operator
    pub validator: String,
}

/// Reveal of a committed vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAggregateExchangeRateVote {
    /// 64 hex character salt
    pub salt: String,
    /// Exchange rates string, e.g. `1.02BTC,3000.5ETH`
    pub exchange_rates: String,
    /// Submitting feeder account
    pub feeder: String,
    /// Validator operator
    pub validator: String,
}

/// Delegation of feeding rights
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDelegateFeedConsent {
    /// Validator operator
    pub operator: String,
    /// New feeder account
    pub delegate: String,
}

/// Governance request to add a required denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAddRequiredDenom {
    /// Governance authority account
    pub authority: String,
    /// Denom to add
    pub symbol: String,
}

/// Governance request to remove a required denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRemoveRequiredDenom {
    /// Governance authority account
    pub authority: String,
    /// Denom to remove
    pub symbol: String,
}

/// Governance request to replace params
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateParams {
    /// Governance authority account
    pub authority: String,
    /// New params
    pub params: Params,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTORS
// ═══════════════════════════════════════════════════════════════════════════════

impl OracleMsg {
    /// Prevote for `validator`, submitted by `feeder`
    pub fn prevote(
        hash: &AggregateVoteHash,
        feeder: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self::AggregateExchangeRatePrevote(MsgAggregateExchangeRatePrevote {
            hash: hash.to_hex(),
            feeder: feeder.into(),
            validator: validator.into(),
        })
    }

    /// Vote reveal for `validator`, submitted by `feeder`
    pub fn vote(
        salt: impl Into<String>,
        exchange_rates: impl Into<String>,
        feeder: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self::AggregateExchangeRateVote(MsgAggregateExchangeRateVote {
            salt: salt.into(),
            exchange_rates: exchange_rates.into(),
            feeder: feeder.into(),
            validator: validator.into(),
        })
    }

    /// Feeder delegation from `operator` to `delegate`
    pub fn delegate_feeder(operator: impl Into<String>, delegate: impl Into<String>) -> Self {
        Self::DelegateFeedConsent(MsgDelegateFeedConsent {
            operator: operator.into(),
            delegate: delegate.into(),
        })
    }

    /// Add a required denom
    pub fn add_required_denom(authority: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::AddRequiredDenom(MsgAddRequiredDenom {
            authority: authority.into(),
            symbol: symbol.into(),
        })
    }

    /// Remove a required denom
    pub fn remove_required_denom(authority: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::RemoveRequiredDenom(MsgRemoveRequiredDenom {
            authority: authority.into(),
            symbol: symbol.into(),
        })
    }

    /// Replace params
    pub fn update_params(authority: impl Into<String>, params: Params) -> Self {
        Self::UpdateParams(MsgUpdateParams {
            authority: authority.into(),
            params,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MESSAGE INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

impl OracleMsg {
    /// Router key of the oracle module
    pub fn route(&self) -> &'static str {
        ROUTER_KEY
    }

    /// Message type string
    pub fn msg_type(&self) -> &'static str {
        match self {
            Self::AggregateExchangeRatePrevote(_) => TYPE_MSG_AGGREGATE_EXCHANGE_RATE_PREVOTE,
            Self::AggregateExchangeRateVote(_) => TYPE_MSG_AGGREGATE_EXCHANGE_RATE_VOTE,
            Self::DelegateFeedConsent(_) => TYPE_MSG_DELEGATE_FEED_CONSENT,
            Self::AddRequiredDenom(_) => TYPE_MSG_ADD_REQUIRED_DENOM,
            Self::RemoveRequiredDenom(_) => TYPE_MSG_REMOVE_REQUIRED_DENOM,
            Self::UpdateParams(_) => TYPE_MSG_UPDATE_PARAMS,
        }
    }

    /// Accounts that must sign the message
    pub fn signers(&self, codec: &AddressCodec) -> std::result::Result<Vec<AccAddress>, AddressParseError> {
        let signer = match self {
            Self::AggregateExchangeRatePrevote(msg) => codec.parse_account(&msg.feeder)?,
            Self::AggregateExchangeRateVote(msg) => codec.parse_account(&msg.feeder)?,
            Self::DelegateFeedConsent(msg) => codec.parse_validator(&msg.operator)?.to_account(),
            Self::AddRequiredDenom(msg) => codec.parse_account(&msg.authority)?,
            Self::RemoveRequiredDenom(msg) => codec.parse_account(&msg.authority)?,
            Self::UpdateParams(msg) => codec.parse_account(&msg.authority)?,
        };
        Ok(vec![signer])
    }

    /// Canonical bytes to sign: JSON with keys sorted
    pub fn sign_bytes(&self) -> Result<Vec<u8>> {
        // serde_json::Value keeps object keys in a BTreeMap
        let value = serde_json::to_value(self).map_err(|e| Error::Serialization(e.to_string()))?;
        serde_json::to_vec(&value).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Every stateless check
    pub fn validate_basic(&self, codec: &AddressCodec) -> Result<()> {
        match self {
            Self::AggregateExchangeRatePrevote(msg) => msg.validate_basic(codec),
            Self::AggregateExchangeRateVote(msg) => msg.validate_basic(codec).map(|_| ()),
            Self::DelegateFeedConsent(msg) => msg.validate_basic(codec),
            Self::AddRequiredDenom(msg) => {
                parse_account(codec, &msg.authority, "authority")?;
                validate_denom(&msg.symbol)
            }
            Self::RemoveRequiredDenom(msg) => {
                parse_account(codec, &msg.authority, "authority")?;
                validate_denom(&msg.symbol)
            }
            Self::UpdateParams(msg) => {
                parse_account(codec, &msg.authority, "authority")?;
                msg.params.validate()
            }
        }
    }
}

impl MsgAggregateExchangeRatePrevote {
    /// Stateless checks: hash format, feeder and validator addresses
    pub fn validate_basic(&self, codec: &AddressCodec) -> Result<()> {
        AggregateVoteHash::from_hex(&self.hash)?;
        parse_account(codec, &self.feeder, "feeder")?;
        parse_validator(codec, &self.validator, "validator")?;
        Ok(())
    }
}

impl MsgAggregateExchangeRateVote {
    /// Stateless checks, returning the parsed tuples.
    ///
    /// Addresses first, then the rates string, then the salt.
    pub fn validate_basic(&self, codec: &AddressCodec) -> Result<ExchangeRateTuples> {
        parse_account(codec, &self.feeder, "feeder")?;
        parse_validator(codec, &self.validator, "validator")?;
        let tuples = parse_exchange_rate_tuples(&self.exchange_rates)?;
        validate_salt(&self.salt)?;
        Ok(tuples)
    }
}

impl MsgDelegateFeedConsent {
    /// Stateless checks: operator and delegate addresses
    pub fn validate_basic(&self, codec: &AddressCodec) -> Result<()> {
        parse_validator(codec, &self.operator, "operator")?;
        parse_account(codec, &self.delegate, "delegate")?;
        Ok(())
    }
}

/// Parse an account address, naming the field on failure
pub(crate) fn parse_account(codec: &AddressCodec, s: &str, field: &'static str) -> Result<AccAddress> {
    codec.parse_account(s).map_err(|e| Error::address(field, e))
}

/// Parse a validator address, naming the field on failure
pub(crate) fn parse_validator(codec: &AddressCodec, s: &str, field: &'static str) -> Result<ValAddress> {
    codec.parse_validator(s).map_err(|e| Error::address(field, e))
}
