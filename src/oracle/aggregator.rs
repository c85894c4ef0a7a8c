//! End-of-period tally.
//!
//! This module reduces the revealed votes of one period into canonical rates:
//! - Ballots per required denom, weighted by stake
//! - Quorum check against total bonded power
//! - Stake-weighted median per denom
//! - Reward band wins and per-validator misses
//!
//! The tally is a pure function of its inputs; the state machine feeds it
//! from the store and applies the resulting report.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::core::address::ValAddress;
use crate::core::params::Params;
use crate::error::{Error, Result};
use crate::oracle::ballot::{ExchangeRateBallot, VoteForTally};
use crate::oracle::voting::AggregateExchangeRateVote;
use crate::utils::math::Dec;

// ═══════════════════════════════════════════════════════════════════════════════
// REPORT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of tallying one denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationOutcome {
    /// Quorum reached, rate published
    Published {
        /// Weighted median rate
        rate: Dec,
        /// Stake behind the ballot
        ballot_power: u128,
        /// Number of validators quoting a rate
        voters: usize,
    },
    /// Not enough stake voted; nothing published
    QuorumUnmet {
        /// Stake behind the ballot
        ballot_power: u128,
        /// Stake the ballot needed
        threshold_power: u128,
    },
}

/// Outcome for one required denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomOutcome {
    /// Denom tallied
    pub denom: String,
    /// What happened to it
    pub outcome: AggregationOutcome,
}

/// Per-validator performance in the period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorClaim {
    /// Stake weight
    pub power: u64,
    /// Votes that landed inside the reward band of a published rate
    pub win_count: u64,
    /// Required denoms the validator cast no counted vote for
    pub missed_denoms: BTreeSet<String>,
}

/// Everything the tally of one period produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationReport {
    /// Period tallied
    pub period: u64,
    /// Total bonded power at tally time
    pub total_bonded_power: u128,
    /// One entry per required denom, in denom order
    pub outcomes: Vec<DenomOutcome>,
    /// One entry per bonded validator
    pub claims: BTreeMap<ValAddress, ValidatorClaim>,
}

impl AggregationReport {
    /// Rates that reached quorum
    pub fn published_rates(&self) -> BTreeMap<String, Dec> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.outcome {
                AggregationOutcome::Published { rate, .. } => Some((o.denom.clone(), rate.clone())),
                AggregationOutcome::QuorumUnmet { .. } => None,
            })
            .collect()
    }

    /// Validators that missed at least one required denom
    pub fn missed_validators(&self) -> Vec<ValAddress> {
        self.claims
            .iter()
            .filter(|(_, claim)| !claim.missed_denoms.is_empty())
            .map(|(validator, _)| validator.clone())
            .collect()
    }

    /// Outcome for a denom, if it is required
    pub fn outcome(&self, denom: &str) -> Option<&AggregationOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.denom == denom)
            .map(|o| &o.outcome)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AGGREGATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Stateless tally of a period's votes
pub struct Aggregator;

impl Aggregator {
    /// Tally `votes` against the bonded set.
    ///
    /// Votes from unbonded validators and rates for non-required denoms are
    /// ignored.
    pub fn tally(
        params: &Params,
        period: u64,
        required_denoms: &BTreeSet<String>,
        votes: &[AggregateExchangeRateVote],
        bonded: &BTreeMap<ValAddress, u64>,
    ) -> Result<AggregationReport> {
        let total_bonded_power: u128 = bonded.values().map(|p| *p as u128).sum();
        let threshold_power = Self::threshold_power(params.vote_threshold, total_bonded_power)?;

        let mut claims: BTreeMap<ValAddress, ValidatorClaim> = bonded
            .iter()
            .map(|(validator, power)| {
                (
                    validator.clone(),
                    ValidatorClaim {
                        power: *power,
                        ..Default::default()
                    },
                )
            })
            .collect();

        let ballots = Self::organize_ballots(required_denoms, votes, bonded);
        let half_band = Dec::from_decimal(params.reward_band)
            .quo_int(2)
            .unwrap_or_default();

        let mut outcomes = Vec::with_capacity(required_denoms.len());
        for denom in required_denoms {
            let ballot = ballots.get(denom).cloned().unwrap_or_default();

            for (validator, claim) in claims.iter_mut() {
                if !ballot.votes().iter().any(|v| &v.validator == validator) {
                    claim.missed_denoms.insert(denom.clone());
                }
            }

            let ballot_power = ballot.power();
            let median = if ballot_power > 0 && ballot_power >= threshold_power {
                ballot.weighted_median(params.median_tie_break)
            } else {
                None
            };

            let outcome = match median {
                Some(rate) => {
                    let spread = std::cmp::max(half_band.mul(&rate), ballot.standard_deviation(&rate));
                    for vote in ballot.quotes() {
                        if (&vote.exchange_rate - &rate).abs() <= spread {
                            if let Some(claim) = claims.get_mut(&vote.validator) {
                                claim.win_count += 1;
                            }
                        }
                    }

                    info!(
                        period,
                        denom = %denom,
                        rate = %rate,
                        voters = ballot.quotes().count(),
                        "exchange rate published"
                    );
                    AggregationOutcome::Published {
                        rate,
                        ballot_power,
                        voters: ballot.quotes().count(),
                    }
                }
                None => {
                    warn!(
                        period,
                        denom = %denom,
                        ballot_power = %ballot_power,
                        threshold_power = %threshold_power,
                        "quorum not met"
                    );
                    AggregationOutcome::QuorumUnmet {
                        ballot_power,
                        threshold_power,
                    }
                }
            };

            outcomes.push(DenomOutcome {
                denom: denom.clone(),
                outcome,
            });
        }

        Ok(AggregationReport {
            period,
            total_bonded_power,
            outcomes,
            claims,
        })
    }

    /// Group counted votes by required denom.
    ///
    /// Abstentions enter the ballot with zero power.
    pub fn organize_ballots(
        required_denoms: &BTreeSet<String>,
        votes: &[AggregateExchangeRateVote],
        bonded: &BTreeMap<ValAddress, u64>,
    ) -> BTreeMap<String, ExchangeRateBallot> {
        let mut ballots: BTreeMap<String, ExchangeRateBallot> = BTreeMap::new();

        for vote in votes {
            let Some(power) = bonded.get(&vote.validator) else {
                continue;
            };
            for tuple in &vote.exchange_rate_tuples {
                if !required_denoms.contains(&tuple.denom) {
                    continue;
                }
                ballots
                    .entry(tuple.denom.clone())
                    .or_default()
                    .push(VoteForTally::weighted(
                        tuple.denom.clone(),
                        tuple.exchange_rate.clone(),
                        vote.validator.clone(),
                        *power,
                    ));
            }
        }

        ballots
    }

    /// `ceil(threshold * total_power)`, the least integer power meeting the threshold
    pub fn threshold_power(threshold: Decimal, total_power: u128) -> Result<u128> {
        let overflow = || Error::Overflow {
            operation: format!("{} * {}", threshold, total_power),
        };
        let total = Decimal::from_u128(total_power).ok_or_else(overflow)?;
        threshold
            .checked_mul(total)
            .and_then(|product| product.ceil().to_u128())
            .ok_or_else(overflow)
    }
}
