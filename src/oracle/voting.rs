//! Commit-reveal voting.
//!
//! A validator's slot moves through
//! `NoPrevote -> HasPrevote -> (Revealed | Expired) -> NoPrevote`:
//!
//! - a prevote in any state replaces the previous one
//! - a vote is accepted only in the period right after its prevote, and only
//!   if it hashes to the committed value
//! - a reveal that does not match consumes the prevote (one attempt)
//! - prevotes that were never revealed are dropped at the next tally

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::address::{AccAddress, AddressCodec, ValAddress};
use crate::error::{Error, Result};
use crate::oracle::tuples::ExchangeRateTuples;
use crate::oracle::vote_hash::AggregateVoteHash;
use crate::storage::backend::StorageBackend;
use crate::storage::state::OracleStore;
use crate::utils::math::period_of;

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// A committed, not yet revealed, vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateExchangeRatePrevote {
    /// Commitment to the upcoming vote
    pub hash: AggregateVoteHash,
    /// Account that submitted the prevote
    pub feeder: AccAddress,
    /// Validator the prevote is for
    pub validator: ValAddress,
    /// Height the prevote was included at
    pub submit_block: u64,
    /// Vote period of `submit_block`, fixed at submission
    pub period: u64,
}

impl AggregateExchangeRatePrevote {
    /// Create a new prevote record
    pub fn new(
        hash: AggregateVoteHash,
        feeder: AccAddress,
        validator: ValAddress,
        submit_block: u64,
        period: u64,
    ) -> Self {
        Self {
            hash,
            feeder,
            validator,
            submit_block,
            period,
        }
    }
}

/// A revealed vote that matched its prevote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateExchangeRateVote {
    /// Salt that opened the commitment
    pub salt: String,
    /// Revealed rates
    pub exchange_rate_tuples: ExchangeRateTuples,
    /// Account that revealed
    pub feeder: AccAddress,
    /// Validator the vote counts for
    pub validator: ValAddress,
}

/// Where a validator's slot stands in the current period
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing committed
    NoPrevote,
    /// A commitment is waiting to be revealed
    HasPrevote {
        /// Committed hash
        hash: AggregateVoteHash,
        /// Period of the commitment
        period: u64,
    },
    /// Vote revealed and waiting for the tally
    Revealed,
}

// ═══════════════════════════════════════════════════════════════════════════════
// VOTE BOOK
// ═══════════════════════════════════════════════════════════════════════════════

/// Prevote and vote bookkeeping on top of the oracle store
pub struct VoteBook<'a, B: StorageBackend> {
    store: &'a OracleStore<B>,
    codec: &'a AddressCodec,
    vote_period: u64,
}

impl<'a, B: StorageBackend> VoteBook<'a, B> {
    /// Create a vote book for the given period length
    pub fn new(store: &'a OracleStore<B>, codec: &'a AddressCodec, vote_period: u64) -> Self {
        Self {
            store,
            codec,
            vote_period,
        }
    }

    /// Record a prevote, returning the one it replaced
    pub fn submit_prevote(
        &self,
        validator: &ValAddress,
        feeder: &AccAddress,
        hash: AggregateVoteHash,
        height: u64,
    ) -> Result<Option<AggregateExchangeRatePrevote>> {
        let replaced = self.store.prevote(validator)?;
        let prevote = AggregateExchangeRatePrevote::new(
            hash,
            feeder.clone(),
            validator.clone(),
            height,
            period_of(height, self.vote_period),
        );
        self.store.set_prevote(&prevote)?;

        debug!(
            validator = %validator.short(),
            hash = %hash,
            replaced = replaced.is_some(),
            "prevote recorded"
        );

        Ok(replaced)
    }

    /// Reveal a vote against the pending prevote.
    ///
    /// `exchange_rates` is the string exactly as submitted; it is what the
    /// commitment was computed over.
    pub fn submit_vote(
        &self,
        salt: &str,
        exchange_rates: &str,
        tuples: ExchangeRateTuples,
        feeder: &AccAddress,
        validator: &ValAddress,
        height: u64,
    ) -> Result<AggregateExchangeRateVote> {
        let validator_str = self.codec.encode_validator(validator)?;

        let prevote = self
            .store
            .prevote(validator)?
            .ok_or_else(|| Error::NoPrevote(validator_str.clone()))?;

        let prevote_period = prevote.period;
        let current_period = period_of(height, self.vote_period);
        if prevote_period + 1 != current_period {
            return Err(Error::RevealPeriodMismatch {
                prevote_period,
                current_period,
            });
        }

        let feeder_str = self.codec.encode_account(feeder)?;
        let expected = AggregateVoteHash::compute(salt, exchange_rates, &feeder_str, &validator_str);
        if expected != prevote.hash {
            self.store.delete_prevote(validator)?;
            warn!(
                validator = %validator_str,
                committed = %prevote.hash,
                revealed = %expected,
                "vote hash mismatch, prevote discarded"
            );
            return Err(Error::VoteHashMismatch {
                validator: validator_str,
            });
        }

        let vote = AggregateExchangeRateVote {
            salt: salt.to_string(),
            exchange_rate_tuples: tuples,
            feeder: feeder.clone(),
            validator: validator.clone(),
        };
        self.store.set_vote(&vote)?;
        self.store.delete_prevote(validator)?;

        debug!(
            validator = %validator_str,
            rates = vote.exchange_rate_tuples.len(),
            "vote revealed"
        );

        Ok(vote)
    }

    /// Current slot state of a validator
    pub fn slot_state(&self, validator: &ValAddress) -> Result<SlotState> {
        if self.store.vote(validator)?.is_some() {
            return Ok(SlotState::Revealed);
        }
        Ok(match self.store.prevote(validator)? {
            Some(prevote) => SlotState::HasPrevote {
                hash: prevote.hash,
                period: prevote.period,
            },
            None => SlotState::NoPrevote,
        })
    }

    /// Drop every prevote submitted before `current_period`
    pub fn clear_expired_prevotes(
        &self,
        current_period: u64,
    ) -> Result<Vec<AggregateExchangeRatePrevote>> {
        let mut expired = Vec::new();
        for prevote in self.store.prevotes()? {
            if prevote.period < current_period {
                self.store.delete_prevote(&prevote.validator)?;
                expired.push(prevote);
            }
        }
        Ok(expired)
    }
}
