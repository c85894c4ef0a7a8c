//! Oracle State Machine - message dispatch and end-of-period processing.
//!
//! The state machine is the single entry point for oracle state changes:
//! messages go through [`OracleStateMachine::deliver`], and
//! [`OracleStateMachine::end_block`] runs the tally at the last block of each
//! vote period. Every handler finishes its checks before it writes, so a
//! rejected message leaves the store as it found it. The one exception is a
//! reveal that does not match its commitment, which consumes the prevote.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::core::address::{AccAddress, AddressCodec, ValAddress};
use crate::core::config::OracleConfig;
use crate::core::params::Params;
use crate::core::staking::StakingView;
use crate::error::{Error, Result};
use crate::governance::authority::{AuthorityResolver, GovernanceAction};
use crate::governance::denoms::DenomWhitelist;
use crate::oracle::aggregator::{AggregationOutcome, AggregationReport, Aggregator};
use crate::oracle::feeder::FeederRegistry;
use crate::oracle::vote_hash::AggregateVoteHash;
use crate::oracle::voting::{
    AggregateExchangeRatePrevote, AggregateExchangeRateVote, SlotState, VoteBook,
};
use crate::protocol::events::*;
use crate::protocol::messages::*;
use crate::storage::backend::StorageBackend;
use crate::storage::state::OracleStore;
use crate::utils::math::{is_period_last_block, period_of, Dec};

// ═══════════════════════════════════════════════════════════════════════════════
// STATE MACHINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Oracle state machine - orchestrates all oracle operations
pub struct OracleStateMachine<B: StorageBackend, S: StakingView, A: AuthorityResolver> {
    /// Typed oracle state
    store: OracleStore<B>,
    /// Address codec
    codec: AddressCodec,
    /// Bonded validator set
    staking: S,
    /// Governance authority
    authority: A,
    /// Current block height
    block_height: u64,
    /// Events emitted in the current block
    event_log: EventLog,
}

impl<B: StorageBackend, S: StakingView, A: AuthorityResolver> OracleStateMachine<B, S, A> {
    /// Create a state machine, initializing an empty store from `config`
    pub fn new(backend: B, config: &OracleConfig, staking: S, authority: A) -> Result<Self> {
        config.validate()?;

        let store = OracleStore::new(backend);
        store.initialize_if_needed(config)?;

        Ok(Self {
            store,
            codec: config.codec.clone(),
            staking,
            authority,
            block_height: 0,
            event_log: EventLog::new(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BLOCK PROCESSING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Begin a new block
    pub fn begin_block(&mut self, height: u64) {
        self.block_height = height;
        self.event_log = EventLog::new();
    }

    /// Current block height
    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    /// Take the events emitted since the block began
    pub fn take_events(&mut self) -> Vec<OracleEvent> {
        self.event_log.drain()
    }

    /// End the current block, tallying if it closes a vote period
    pub fn end_block(&mut self) -> Result<Option<AggregationReport>> {
        let params = self.store.params()?;
        if !is_period_last_block(self.block_height, params.vote_period) {
            return Ok(None);
        }

        let period = period_of(self.block_height, params.vote_period);
        let report = Aggregator::tally(
            &params,
            period,
            &self.store.required_denoms()?,
            &self.store.votes()?,
            &self.staking.bonded_validators(),
        )?;

        self.apply_report(&params, &report)?;

        if is_period_last_block(self.block_height, params.slash_window) {
            self.process_slash_window(&params)?;
        }

        Ok(Some(report))
    }

    fn apply_report(&mut self, params: &Params, report: &AggregationReport) -> Result<()> {
        let height = self.block_height;

        self.store.clear_exchange_rates()?;
        for outcome in &report.outcomes {
            match &outcome.outcome {
                AggregationOutcome::Published { rate, .. } => {
                    self.store.set_exchange_rate(&outcome.denom, rate)?;
                    self.event_log
                        .push(OracleEvent::ExchangeRateUpdated(ExchangeRateUpdatedEvent {
                            denom: outcome.denom.clone(),
                            exchange_rate: rate.clone(),
                            block_height: height,
                        }));
                }
                AggregationOutcome::QuorumUnmet {
                    ballot_power,
                    threshold_power,
                } => {
                    self.event_log.push(OracleEvent::QuorumUnmet(QuorumUnmetEvent {
                        denom: outcome.denom.clone(),
                        ballot_power: *ballot_power,
                        threshold_power: *threshold_power,
                        block_height: height,
                    }));
                }
            }
        }

        for (validator, claim) in &report.claims {
            if claim.missed_denoms.is_empty() {
                continue;
            }
            let miss_counter = self.store.increment_miss_counter(validator)?;
            self.event_log
                .push(OracleEvent::ValidatorMissed(ValidatorMissedEvent {
                    validator: self.codec.encode_validator(validator)?,
                    missed_denoms: claim.missed_denoms.iter().cloned().collect(),
                    miss_counter,
                    block_height: height,
                }));
        }

        let cleared = self.store.clear_votes()?;
        let expired = VoteBook::new(&self.store, &self.codec, params.vote_period)
            .clear_expired_prevotes(report.period)?;
        for prevote in expired {
            self.event_log
                .push(OracleEvent::PrevoteExpired(PrevoteExpiredEvent {
                    validator: self.codec.encode_validator(&prevote.validator)?,
                    submit_block: prevote.submit_block,
                    block_height: height,
                }));
        }

        info!(
            period = report.period,
            published = report.published_rates().len(),
            votes = cleared,
            missed = report.missed_validators().len(),
            "vote period tallied"
        );
        Ok(())
    }

    fn process_slash_window(&mut self, params: &Params) -> Result<()> {
        let periods = params.periods_per_window();
        let min_valid = Dec::from_decimal(params.min_valid_per_window);

        for (validator, misses) in self.store.miss_counters()? {
            if !self.staking.is_bonded(&validator) {
                continue;
            }
            let missed_ratio = Dec::one()
                .mul_int(misses)
                .quo_int(periods)
                .ok_or_else(|| Error::Internal("slash window shorter than a vote period".into()))?;
            let valid_ratio = Dec::one() - missed_ratio;

            if valid_ratio < min_valid {
                let validator_str = self.codec.encode_validator(&validator)?;
                warn!(
                    validator = %validator_str,
                    misses,
                    valid_ratio = %valid_ratio,
                    "validator below minimum valid votes per window"
                );
                self.event_log
                    .push(OracleEvent::SlashCandidate(SlashCandidateEvent {
                        validator: validator_str,
                        miss_counter: misses,
                        valid_ratio,
                        block_height: self.block_height,
                    }));
            }
        }

        self.store.clear_miss_counters()?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MESSAGE EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Execute a message, returning the events it emitted
    pub fn deliver(&mut self, msg: &OracleMsg) -> Result<Vec<OracleEvent>> {
        let result = match msg {
            OracleMsg::AggregateExchangeRatePrevote(m) => self.execute_prevote(m),
            OracleMsg::AggregateExchangeRateVote(m) => self.execute_vote(m),
            OracleMsg::DelegateFeedConsent(m) => self.execute_delegate(m),
            OracleMsg::AddRequiredDenom(m) => self.execute_add_denom(m),
            OracleMsg::RemoveRequiredDenom(m) => self.execute_remove_denom(m),
            OracleMsg::UpdateParams(m) => self.execute_update_params(m),
        };

        match result {
            Ok(events) => {
                debug!(msg_type = msg.msg_type(), events = events.len(), "message accepted");
                for event in &events {
                    self.event_log.push(event.clone());
                }
                Ok(events)
            }
            Err(e) => {
                debug!(msg_type = msg.msg_type(), error = %e, "message rejected");
                Err(e)
            }
        }
    }

    fn ensure_bonded(&self, validator: &ValAddress, validator_str: &str) -> Result<()> {
        if self.staking.is_bonded(validator) {
            Ok(())
        } else {
            Err(Error::UnknownValidator(validator_str.to_string()))
        }
    }

    fn execute_prevote(&mut self, msg: &MsgAggregateExchangeRatePrevote) -> Result<Vec<OracleEvent>> {
        msg.validate_basic(&self.codec)?;
        let hash = AggregateVoteHash::from_hex(&msg.hash)?;
        let feeder = parse_account(&self.codec, &msg.feeder, "feeder")?;
        let validator = parse_validator(&self.codec, &msg.validator, "validator")?;

        self.ensure_bonded(&validator, &msg.validator)?;
        FeederRegistry::new(&self.store).ensure_authorized(&feeder, &validator, &self.codec)?;

        let params = self.store.params()?;
        let replaced = VoteBook::new(&self.store, &self.codec, params.vote_period)
            .submit_prevote(&validator, &feeder, hash, self.block_height)?;

        Ok(vec![OracleEvent::PrevoteSubmitted(PrevoteSubmittedEvent {
            validator: msg.validator.clone(),
            feeder: msg.feeder.clone(),
            hash: hash.to_hex(),
            replaced: replaced.is_some(),
            block_height: self.block_height,
        })])
    }

    fn execute_vote(&mut self, msg: &MsgAggregateExchangeRateVote) -> Result<Vec<OracleEvent>> {
        let tuples = msg.validate_basic(&self.codec)?;
        let feeder = parse_account(&self.codec, &msg.feeder, "feeder")?;
        let validator = parse_validator(&self.codec, &msg.validator, "validator")?;

        self.ensure_bonded(&validator, &msg.validator)?;
        FeederRegistry::new(&self.store).ensure_authorized(&feeder, &validator, &self.codec)?;

        let params = self.store.params()?;
        let vote = VoteBook::new(&self.store, &self.codec, params.vote_period).submit_vote(
            &msg.salt,
            &msg.exchange_rates,
            tuples,
            &feeder,
            &validator,
            self.block_height,
        )?;

        Ok(vec![OracleEvent::VoteRevealed(VoteRevealedEvent {
            validator: msg.validator.clone(),
            feeder: msg.feeder.clone(),
            exchange_rates: vote.exchange_rate_tuples.to_string(),
            block_height: self.block_height,
        })])
    }

    fn execute_delegate(&mut self, msg: &MsgDelegateFeedConsent) -> Result<Vec<OracleEvent>> {
        msg.validate_basic(&self.codec)?;
        let operator = parse_validator(&self.codec, &msg.operator, "operator")?;
        let delegate = parse_account(&self.codec, &msg.delegate, "delegate")?;

        self.ensure_bonded(&operator, &msg.operator)?;
        FeederRegistry::new(&self.store).delegate(&operator, &delegate)?;

        Ok(vec![OracleEvent::FeederDelegated(FeederDelegatedEvent {
            operator: msg.operator.clone(),
            feeder: msg.delegate.clone(),
            block_height: self.block_height,
        })])
    }

    fn execute_add_denom(&mut self, msg: &MsgAddRequiredDenom) -> Result<Vec<OracleEvent>> {
        let authority = parse_account(&self.codec, &msg.authority, "authority")?;
        let added = DenomWhitelist::new(&self.store, &self.authority).add(&authority, &msg.symbol)?;

        Ok(if added {
            vec![OracleEvent::RequiredDenomAdded(DenomChangedEvent {
                denom: msg.symbol.clone(),
                block_height: self.block_height,
            })]
        } else {
            Vec::new()
        })
    }

    fn execute_remove_denom(&mut self, msg: &MsgRemoveRequiredDenom) -> Result<Vec<OracleEvent>> {
        let authority = parse_account(&self.codec, &msg.authority, "authority")?;
        let removed =
            DenomWhitelist::new(&self.store, &self.authority).remove(&authority, &msg.symbol)?;

        Ok(if removed {
            vec![OracleEvent::RequiredDenomRemoved(DenomChangedEvent {
                denom: msg.symbol.clone(),
                block_height: self.block_height,
            })]
        } else {
            Vec::new()
        })
    }

    fn execute_update_params(&mut self, msg: &MsgUpdateParams) -> Result<Vec<OracleEvent>> {
        let authority = parse_account(&self.codec, &msg.authority, "authority")?;
        self.authority.ensure_authorized(
            &authority,
            &GovernanceAction::UpdateParams {
                params: msg.params.clone(),
            },
        )?;
        msg.params.validate()?;

        self.store.set_params(&msg.params)?;
        info!(vote_period = msg.params.vote_period, "params updated");

        Ok(vec![OracleEvent::ParamsUpdated(ParamsUpdatedEvent {
            vote_period: msg.params.vote_period,
            block_height: self.block_height,
        })])
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Current params
    pub fn params(&self) -> Result<Params> {
        self.store.params()
    }

    /// Published rate of a denom
    pub fn exchange_rate(&self, denom: &str) -> Result<Option<Dec>> {
        self.store.exchange_rate(denom)
    }

    /// All published rates
    pub fn exchange_rates(&self) -> Result<BTreeMap<String, Dec>> {
        self.store.exchange_rates()
    }

    /// The required denom set
    pub fn required_denoms(&self) -> Result<BTreeSet<String>> {
        self.store.required_denoms()
    }

    /// Account currently allowed to feed for a validator
    pub fn feeder(&self, validator: &ValAddress) -> Result<AccAddress> {
        FeederRegistry::new(&self.store).resolve_feeder(validator)
    }

    /// Pending prevote of a validator
    pub fn prevote(&self, validator: &ValAddress) -> Result<Option<AggregateExchangeRatePrevote>> {
        self.store.prevote(validator)
    }

    /// Revealed vote of a validator
    pub fn vote(&self, validator: &ValAddress) -> Result<Option<AggregateExchangeRateVote>> {
        self.store.vote(validator)
    }

    /// Slot state of a validator
    pub fn slot_state(&self, validator: &ValAddress) -> Result<SlotState> {
        let params = self.store.params()?;
        VoteBook::new(&self.store, &self.codec, params.vote_period).slot_state(validator)
    }

    /// Misses of a validator in the current slash window
    pub fn miss_counter(&self, validator: &ValAddress) -> Result<u64> {
        self.store.miss_counter(validator)
    }

    /// Address codec
    pub fn codec(&self) -> &AddressCodec {
        &self.codec
    }

    /// Mutable access to the validator set
    pub fn staking_mut(&mut self) -> &mut S {
        &mut self.staking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::staking::StaticStakingView;
    use crate::governance::authority::FixedAuthority;
    use crate::storage::backend::InMemoryStore;

    type Machine = OracleStateMachine<InMemoryStore, StaticStakingView, FixedAuthority>;

    fn val(b: u8) -> ValAddress {
        ValAddress::from_bytes(&[b; 20]).unwrap()
    }

    fn machine() -> Machine {
        let config = OracleConfig::testnet();
        let authority = FixedAuthority::new(config.authority_address().unwrap());
        let staking = StaticStakingView::new()
            .with_validator(val(1), 10)
            .with_validator(val(2), 5);
        OracleStateMachine::new(InMemoryStore::new(), &config, staking, authority).unwrap()
    }

    #[test]
    fn test_initialized_from_config() {
        let m = machine();
        assert_eq!(m.params().unwrap(), Params::testnet());
        assert!(m.required_denoms().unwrap().contains("BTC"));
        assert_eq!(m.slot_state(&val(1)).unwrap(), SlotState::NoPrevote);
    }

    #[test]
    fn test_end_block_only_at_period_end() {
        let mut m = machine();
        m.begin_block(3);
        assert!(m.end_block().unwrap().is_none());

        // Period length 5: height 4 closes period 0
        m.begin_block(4);
        let report = m.end_block().unwrap().unwrap();
        assert_eq!(report.period, 0);
        assert!(report.published_rates().is_empty());
        assert_eq!(m.miss_counter(&val(1)).unwrap(), 1);
    }

    #[test]
    fn test_unknown_validator_rejected() {
        let mut m = machine();
        let codec = m.codec().clone();
        let stranger = val(9);
        let msg = OracleMsg::delegate_feeder(
            codec.encode_validator(&stranger).unwrap(),
            codec.encode_account(&stranger.to_account()).unwrap(),
        );
        assert!(matches!(m.deliver(&msg), Err(Error::UnknownValidator(_))));
    }

    #[test]
    fn test_governance_requires_authority() {
        let mut m = machine();
        let codec = m.codec().clone();
        let stranger = codec.encode_account(&val(1).to_account()).unwrap();

        let msg = OracleMsg::add_required_denom(stranger, "ATOM");
        assert!(matches!(m.deliver(&msg), Err(Error::UnauthorizedAction(_))));

        let authority = OracleConfig::testnet().authority;
        let msg = OracleMsg::add_required_denom(authority.clone(), "ATOM");
        assert_eq!(m.deliver(&msg).unwrap().len(), 1);
        // Second add is a no-op
        assert!(m.deliver(&msg).unwrap().is_empty());
        assert!(m.required_denoms().unwrap().contains("ATOM"));

        let msg = OracleMsg::update_params(authority, Params::testnet().with_vote_period(10));
        assert!(m.deliver(&msg).is_ok());
        assert_eq!(m.params().unwrap().vote_period, 10);
    }

    #[test]
    fn test_events_collected_per_block() {
        let mut m = machine();
        let authority = OracleConfig::testnet().authority;

        m.begin_block(1);
        m.deliver(&OracleMsg::add_required_denom(authority, "ATOM")).unwrap();
        assert_eq!(m.take_events().len(), 1);
        assert!(m.take_events().is_empty());
    }
}
