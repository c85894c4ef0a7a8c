//! Stake weight lookup.
//!
//! Validator staking state is owned by the host ledger; the oracle only
//! needs to know who is bonded and with how much power.

use std::collections::BTreeMap;

use crate::core::address::ValAddress;

/// Read access to the bonded validator set
pub trait StakingView {
    /// Power of a bonded validator, `None` if unknown or not bonded
    fn validator_power(&self, validator: &ValAddress) -> Option<u64>;

    /// All bonded validators with their power, ordered by address
    fn bonded_validators(&self) -> BTreeMap<ValAddress, u64>;

    /// Whether the validator is bonded
    fn is_bonded(&self, validator: &ValAddress) -> bool {
        self.validator_power(validator).is_some()
    }

    /// Sum of all bonded power
    fn total_bonded_power(&self) -> u128 {
        self.bonded_validators().values().map(|p| *p as u128).sum()
    }
}

/// Fixed validator set, for tests and single-process simulations
#[derive(Debug, Clone, Default)]
pub struct StaticStakingView {
    powers: BTreeMap<ValAddress, u64>,
}

impl StaticStakingView {
    /// Create an empty validator set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style validator registration
    pub fn with_validator(mut self, validator: ValAddress, power: u64) -> Self {
        self.set_power(validator, power);
        self
    }

    /// Bond a validator or change its power; zero power unbonds it
    pub fn set_power(&mut self, validator: ValAddress, power: u64) {
        if power == 0 {
            self.powers.remove(&validator);
        } else {
            self.powers.insert(validator, power);
        }
    }

    /// Unbond a validator
    pub fn remove(&mut self, validator: &ValAddress) {
        self.powers.remove(validator);
    }
}

impl StakingView for StaticStakingView {
    fn validator_power(&self, validator: &ValAddress) -> Option<u64> {
        self.powers.get(validator).copied()
    }

    fn bonded_validators(&self) -> BTreeMap<ValAddress, u64> {
        self.powers.clone()
    }
}
