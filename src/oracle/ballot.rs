//! Per-denom ballots.
//!
//! A ballot collects every counted vote for one denom together with the
//! stake weight of the validator that cast it. A non-positive rate is an
//! abstention: it carries no power and stays out of the median and spread.

use serde::{Deserialize, Serialize};

use crate::core::address::ValAddress;
use crate::core::params::MedianTieBreak;
use crate::utils::math::Dec;

/// One validator's rate for one denom, weighted by stake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteForTally {
    /// Denom voted on
    pub denom: String,
    /// Rate voted
    pub exchange_rate: Dec,
    /// Voting validator
    pub validator: ValAddress,
    /// Stake weight of the validator
    pub power: u64,
}

impl VoteForTally {
    /// Create a new ballot entry
    pub fn new(denom: impl Into<String>, exchange_rate: Dec, validator: ValAddress, power: u64) -> Self {
        Self {
            denom: denom.into(),
            exchange_rate,
            validator,
            power,
        }
    }

    /// Create an entry, zeroing the power of an abstention
    pub fn weighted(denom: impl Into<String>, exchange_rate: Dec, validator: ValAddress, power: u64) -> Self {
        let power = if exchange_rate.is_positive() { power } else { 0 };
        Self::new(denom, exchange_rate, validator, power)
    }

    /// Whether the entry abstains rather than quotes a rate
    pub fn is_abstain(&self) -> bool {
        !self.exchange_rate.is_positive()
    }
}

/// All votes for a single denom
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeRateBallot {
    votes: Vec<VoteForTally>,
}

impl ExchangeRateBallot {
    /// Create an empty ballot
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vote
    pub fn push(&mut self, vote: VoteForTally) {
        self.votes.push(vote);
    }

    /// Votes in the ballot
    pub fn votes(&self) -> &[VoteForTally] {
        &self.votes
    }

    /// Number of votes
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    /// Votes quoting a rate
    pub fn quotes(&self) -> impl Iterator<Item = &VoteForTally> {
        self.votes.iter().filter(|v| !v.is_abstain())
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Total stake weight behind the ballot
    pub fn power(&self) -> u128 {
        self.votes.iter().map(|v| v.power as u128).sum()
    }

    /// Sort by rate, ties by validator address
    fn sorted(&self) -> Vec<&VoteForTally> {
        let mut sorted: Vec<&VoteForTally> = self.votes.iter().collect();
        sorted.sort_by(|a, b| {
            a.exchange_rate
                .cmp(&b.exchange_rate)
                .then_with(|| a.validator.cmp(&b.validator))
        });
        sorted
    }

    /// Stake-weighted median.
    ///
    /// Walks the sorted ballot and returns the first rate whose cumulative
    /// power reaches half of the ballot power. `None` for a powerless ballot.
    pub fn weighted_median(&self, tie_break: MedianTieBreak) -> Option<Dec> {
        let total = self.power();
        if total == 0 {
            return None;
        }

        let mut cumulative: u128 = 0;
        for vote in self.sorted() {
            cumulative += vote.power as u128;
            let reached = match tie_break {
                MedianTieBreak::Lower => cumulative * 2 >= total,
                MedianTieBreak::Upper => cumulative * 2 > total,
            };
            if reached {
                return Some(vote.exchange_rate.clone());
            }
        }

        None
    }

    /// Standard deviation of the quoted rates around `median`, unweighted
    pub fn standard_deviation(&self, median: &Dec) -> Dec {
        let count = self.quotes().count();
        if count == 0 {
            return Dec::zero();
        }

        let sum = self.quotes().fold(Dec::zero(), |acc, vote| {
            let deviation = &vote.exchange_rate - median;
            acc + deviation.mul(&deviation)
        });

        sum.quo_int(count as u64)
            .and_then(|variance| variance.sqrt())
            .unwrap_or_default()
    }
}

impl FromIterator<VoteForTally> for ExchangeRateBallot {
    fn from_iter<I: IntoIterator<Item = VoteForTally>>(iter: I) -> Self {
        Self {
            votes: iter.into_iter().collect(),
        }
    }
}
