//! Oracle state management.
//!
//! [`OracleStore`] is the typed view of everything the oracle persists:
//! feeder delegations, prevotes, votes, the required denom set, published
//! rates, miss counters and params. Collections are keyed by raw address
//! bytes or denom, so listing them always yields a stable order.

use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::core::address::{AccAddress, ValAddress};
use crate::core::config::OracleConfig;
use crate::core::params::Params;
use crate::error::{Error, Result};
use crate::oracle::voting::{AggregateExchangeRatePrevote, AggregateExchangeRateVote};
use crate::storage::backend::{make_key, prefixes, StorageBackend, TypedStore};
use crate::utils::math::Dec;

/// Typed oracle state on top of a storage backend
pub struct OracleStore<B: StorageBackend> {
    store: TypedStore<B>,
}

impl<B: StorageBackend> OracleStore<B> {
    /// Create a new oracle store
    pub fn new(backend: B) -> Self {
        Self {
            store: TypedStore::new(backend),
        }
    }

    /// Write params and required denoms from config when the store is empty
    pub fn initialize_if_needed(&self, config: &OracleConfig) -> Result<bool> {
        if self.store.has(prefixes::PARAMS)? {
            return Ok(false);
        }

        self.set_params(&config.params)?;
        for denom in &config.required_denoms {
            self.add_required_denom(denom)?;
        }

        info!(
            vote_period = config.params.vote_period,
            denoms = config.required_denoms.len(),
            "oracle state initialized"
        );
        Ok(true)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PARAMS
    // ═══════════════════════════════════════════════════════════════════════

    /// Current params
    pub fn params(&self) -> Result<Params> {
        self.store
            .get(prefixes::PARAMS)?
            .ok_or_else(|| Error::Storage("params not initialized".into()))
    }

    /// Replace params
    pub fn set_params(&self, params: &Params) -> Result<()> {
        self.store.set(prefixes::PARAMS, params)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // FEEDER DELEGATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Delegated feeder of a validator, if any
    pub fn feeder_delegation(&self, validator: &ValAddress) -> Result<Option<AccAddress>> {
        self.store
            .get(&make_key(prefixes::FEEDER_DELEGATION, validator.as_bytes()))
    }

    /// Set the delegated feeder of a validator
    pub fn set_feeder_delegation(&self, validator: &ValAddress, feeder: &AccAddress) -> Result<()> {
        self.store.set(
            &make_key(prefixes::FEEDER_DELEGATION, validator.as_bytes()),
            feeder,
        )
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PREVOTES
    // ═══════════════════════════════════════════════════════════════════════

    /// Pending prevote of a validator
    pub fn prevote(&self, validator: &ValAddress) -> Result<Option<AggregateExchangeRatePrevote>> {
        self.store.get(&make_key(prefixes::PREVOTE, validator.as_bytes()))
    }

    /// Store a prevote, replacing any previous one
    pub fn set_prevote(&self, prevote: &AggregateExchangeRatePrevote) -> Result<()> {
        self.store.set(
            &make_key(prefixes::PREVOTE, prevote.validator.as_bytes()),
            prevote,
        )
    }

    /// Remove a validator's prevote
    pub fn delete_prevote(&self, validator: &ValAddress) -> Result<bool> {
        self.store
            .delete(&make_key(prefixes::PREVOTE, validator.as_bytes()))
    }

    /// All pending prevotes, ordered by validator
    pub fn prevotes(&self) -> Result<Vec<AggregateExchangeRatePrevote>> {
        Ok(self
            .store
            .scan(prefixes::PREVOTE)?
            .into_iter()
            .map(|(_, prevote)| prevote)
            .collect())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // VOTES
    // ═══════════════════════════════════════════════════════════════════════

    /// Revealed vote of a validator
    pub fn vote(&self, validator: &ValAddress) -> Result<Option<AggregateExchangeRateVote>> {
        self.store.get(&make_key(prefixes::VOTE, validator.as_bytes()))
    }

    /// Store a revealed vote
    pub fn set_vote(&self, vote: &AggregateExchangeRateVote) -> Result<()> {
        self.store
            .set(&make_key(prefixes::VOTE, vote.validator.as_bytes()), vote)
    }

    /// All revealed votes, ordered by validator
    pub fn votes(&self) -> Result<Vec<AggregateExchangeRateVote>> {
        Ok(self
            .store
            .scan(prefixes::VOTE)?
            .into_iter()
            .map(|(_, vote)| vote)
            .collect())
    }

    /// Remove every revealed vote
    pub fn clear_votes(&self) -> Result<usize> {
        self.store.clear_prefix(prefixes::VOTE)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // REQUIRED DENOMS
    // ═══════════════════════════════════════════════════════════════════════

    /// Whether a denom is in the required set
    pub fn is_required_denom(&self, denom: &str) -> Result<bool> {
        self.store
            .has(&make_key(prefixes::REQUIRED_DENOM, denom.as_bytes()))
    }

    /// Add a denom to the required set, returning whether it was new
    pub fn add_required_denom(&self, denom: &str) -> Result<bool> {
        if self.is_required_denom(denom)? {
            return Ok(false);
        }
        self.store
            .set(&make_key(prefixes::REQUIRED_DENOM, denom.as_bytes()), &())?;
        Ok(true)
    }

    /// Remove a denom from the required set, returning whether it was present
    pub fn remove_required_denom(&self, denom: &str) -> Result<bool> {
        self.store
            .delete(&make_key(prefixes::REQUIRED_DENOM, denom.as_bytes()))
    }

    /// The required denom set
    pub fn required_denoms(&self) -> Result<BTreeSet<String>> {
        self.store
            .keys(prefixes::REQUIRED_DENOM)?
            .into_iter()
            .map(|key| {
                String::from_utf8(key)
                    .map_err(|e| Error::Deserialization(format!("denom key: {}", e)))
            })
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // EXCHANGE RATES
    // ═══════════════════════════════════════════════════════════════════════

    /// Published exchange rate of a denom
    pub fn exchange_rate(&self, denom: &str) -> Result<Option<Dec>> {
        self.store
            .get(&make_key(prefixes::EXCHANGE_RATE, denom.as_bytes()))
    }

    /// Publish an exchange rate
    pub fn set_exchange_rate(&self, denom: &str, rate: &Dec) -> Result<()> {
        self.store
            .set(&make_key(prefixes::EXCHANGE_RATE, denom.as_bytes()), rate)
    }

    /// All published rates by denom
    pub fn exchange_rates(&self) -> Result<BTreeMap<String, Dec>> {
        let mut rates = BTreeMap::new();
        for (key, rate) in self.store.scan::<Dec>(prefixes::EXCHANGE_RATE)? {
            let denom = String::from_utf8(key)
                .map_err(|e| Error::Deserialization(format!("rate key: {}", e)))?;
            rates.insert(denom, rate);
        }
        Ok(rates)
    }

    /// Remove every published rate
    pub fn clear_exchange_rates(&self) -> Result<usize> {
        self.store.clear_prefix(prefixes::EXCHANGE_RATE)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // MISS COUNTERS
    // ═══════════════════════════════════════════════════════════════════════

    /// Misses of a validator in the current slash window
    pub fn miss_counter(&self, validator: &ValAddress) -> Result<u64> {
        Ok(self
            .store
            .get(&make_key(prefixes::MISS_COUNTER, validator.as_bytes()))?
            .unwrap_or(0))
    }

    /// Set a validator's miss counter
    pub fn set_miss_counter(&self, validator: &ValAddress, count: u64) -> Result<()> {
        self.store
            .set(&make_key(prefixes::MISS_COUNTER, validator.as_bytes()), &count)
    }

    /// Add one miss, returning the new count
    pub fn increment_miss_counter(&self, validator: &ValAddress) -> Result<u64> {
        let count = crate::utils::math::safe_add(self.miss_counter(validator)?, 1)?;
        self.set_miss_counter(validator, count)?;
        Ok(count)
    }

    /// All non-zero miss counters, ordered by validator
    pub fn miss_counters(&self) -> Result<BTreeMap<ValAddress, u64>> {
        let mut counters = BTreeMap::new();
        for (key, count) in self.store.scan::<u64>(prefixes::MISS_COUNTER)? {
            let validator = ValAddress::from_bytes(&key)
                .map_err(|e| Error::Deserialization(format!("miss counter key: {}", e)))?;
            counters.insert(validator, count);
        }
        Ok(counters)
    }

    /// Reset every miss counter
    pub fn clear_miss_counters(&self) -> Result<usize> {
        self.store.clear_prefix(prefixes::MISS_COUNTER)
    }
}
