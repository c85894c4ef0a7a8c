//! Integration tests for the rate oracle.
//!
//! These tests drive the state machine block by block through complete
//! commit-reveal periods.

use rate_oracle::core::address::{AccAddress, AddressCodec, ValAddress};
use rate_oracle::core::config::OracleConfig;
use rate_oracle::core::params::Params;
use rate_oracle::core::staking::StaticStakingView;
use rate_oracle::error::{Error, Result};
use rate_oracle::governance::authority::FixedAuthority;
use rate_oracle::oracle::aggregator::{AggregationOutcome, AggregationReport};
use rate_oracle::oracle::vote_hash::AggregateVoteHash;
use rate_oracle::oracle::voting::SlotState;
use rate_oracle::protocol::events::OracleEvent;
use rate_oracle::protocol::messages::OracleMsg;
use rate_oracle::protocol::state_machine::OracleStateMachine;
use rate_oracle::storage::backend::InMemoryStore;
use rate_oracle::utils::math::Dec;

// ═══════════════════════════════════════════════════════════════════════════════
// TEST HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

type Machine = OracleStateMachine<InMemoryStore, StaticStakingView, FixedAuthority>;

fn val(b: u8) -> ValAddress {
    ValAddress::from_bytes(&[b; 20]).unwrap()
}

fn salt(n: u8) -> String {
    format!("{:02x}", n).repeat(32)
}

fn dec(mantissa: i64, exponent: u32) -> Dec {
    Dec::with_prec(mantissa, exponent).unwrap()
}

/// Oracle on the testnet preset: 5-block periods, 50-block slash window,
/// required denoms BTC and ETH.
struct Harness {
    oracle: Machine,
    codec: AddressCodec,
    authority: String,
    height: u64,
    reports: Vec<AggregationReport>,
    events: Vec<OracleEvent>,
}

impl Harness {
    fn new(validators: &[(u8, u64)]) -> Self {
        let config = OracleConfig::testnet();
        let mut staking = StaticStakingView::new();
        for (b, power) in validators {
            staking.set_power(val(*b), *power);
        }
        let authority = FixedAuthority::new(config.authority_address().unwrap());
        let mut oracle =
            OracleStateMachine::new(InMemoryStore::new(), &config, staking, authority).unwrap();
        oracle.begin_block(0);

        Self {
            oracle,
            codec: config.codec.clone(),
            authority: config.authority.clone(),
            height: 0,
            reports: Vec::new(),
            events: Vec::new(),
        }
    }

    /// End the current block and every block before `height`, then begin `height`
    fn advance_to(&mut self, height: u64) {
        assert!(height > self.height);
        self.finish_block();
        for h in self.height + 1..height {
            self.oracle.begin_block(h);
            self.finish_block();
        }
        self.oracle.begin_block(height);
        self.height = height;
    }

    fn finish_block(&mut self) {
        if let Some(report) = self.oracle.end_block().unwrap() {
            self.reports.push(report);
        }
        self.events.extend(self.oracle.take_events());
    }

    fn validator(&self, b: u8) -> String {
        self.codec.encode_validator(&val(b)).unwrap()
    }

    /// The validator's own account, its feeder when nothing is delegated
    fn own_feeder(&self, b: u8) -> String {
        self.codec.encode_account(&val(b).to_account()).unwrap()
    }

    fn prevote_as(&mut self, feeder: &str, validator: u8, salt: &str, rates: &str) -> Result<Vec<OracleEvent>> {
        let validator = self.validator(validator);
        let hash = AggregateVoteHash::compute(salt, rates, feeder, &validator);
        self.oracle.deliver(&OracleMsg::prevote(&hash, feeder, validator))
    }

    fn reveal_as(&mut self, feeder: &str, validator: u8, salt: &str, rates: &str) -> Result<Vec<OracleEvent>> {
        let validator = self.validator(validator);
        self.oracle.deliver(&OracleMsg::vote(salt, rates, feeder, validator))
    }

    fn prevote(&mut self, validator: u8, salt: &str, rates: &str) -> Result<Vec<OracleEvent>> {
        let feeder = self.own_feeder(validator);
        self.prevote_as(&feeder, validator, salt, rates)
    }

    fn reveal(&mut self, validator: u8, salt: &str, rates: &str) -> Result<Vec<OracleEvent>> {
        let feeder = self.own_feeder(validator);
        self.reveal_as(&feeder, validator, salt, rates)
    }

    fn events_of(&self, event_type: &str) -> Vec<&OracleEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VOTE PERIOD LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_full_period_publishes_weighted_median() {
    let mut h = Harness::new(&[(1, 10), (2, 5)]);

    // Period 0: commit
    h.advance_to(2);
    h.prevote(1, &salt(1), "1.00BTC,3000ETH").unwrap();
    h.prevote(2, &salt(2), "1.02BTC,3000ETH").unwrap();
    assert!(matches!(
        h.oracle.slot_state(&val(1)).unwrap(),
        SlotState::HasPrevote { period: 0, .. }
    ));

    // Period 1: reveal
    h.advance_to(6);
    h.reveal(1, &salt(1), "1.00BTC,3000ETH").unwrap();
    h.reveal(2, &salt(2), "1.02BTC,3000ETH").unwrap();
    assert_eq!(h.oracle.slot_state(&val(1)).unwrap(), SlotState::Revealed);

    h.advance_to(10);
    assert_eq!(h.reports.len(), 2);
    let report = &h.reports[1];
    assert_eq!(report.period, 1);
    assert_eq!(report.total_bonded_power, 15);

    let rates = report.published_rates();
    assert_eq!(rates["BTC"], dec(100, 2));
    assert_eq!(rates["ETH"], Dec::from_int(3000));
    assert_eq!(h.oracle.exchange_rate("BTC").unwrap(), Some(dec(100, 2)));

    // 1.02 sits outside max(1% of median, stddev of ~0.014) on BTC
    assert_eq!(report.claims[&val(1)].win_count, 2);
    assert_eq!(report.claims[&val(2)].win_count, 1);

    // Nobody voted in period 0
    assert_eq!(h.oracle.miss_counter(&val(1)).unwrap(), 1);
    assert_eq!(h.oracle.miss_counter(&val(2)).unwrap(), 1);

    // Votes do not carry over into the next period
    assert_eq!(h.oracle.slot_state(&val(1)).unwrap(), SlotState::NoPrevote);
    assert_eq!(h.events_of("ExchangeRateUpdated").len(), 2);
}

#[test]
fn test_rates_cleared_when_next_period_misses_quorum() {
    let mut h = Harness::new(&[(1, 10)]);

    h.advance_to(2);
    h.prevote(1, &salt(1), "1.00BTC,3000ETH").unwrap();
    h.advance_to(6);
    h.reveal(1, &salt(1), "1.00BTC,3000ETH").unwrap();
    h.advance_to(10);
    assert_eq!(h.oracle.exchange_rates().unwrap().len(), 2);

    h.advance_to(15);
    assert!(h.oracle.exchange_rates().unwrap().is_empty());
    assert!(matches!(
        h.reports[2].outcome("BTC"),
        Some(AggregationOutcome::QuorumUnmet { ballot_power: 0, .. })
    ));
}

#[test]
fn test_double_prevote_keeps_latest() {
    let mut h = Harness::new(&[(1, 10)]);

    h.advance_to(2);
    let first = h.prevote(1, &salt(1), "1.00BTC,3000ETH").unwrap();
    assert!(matches!(&first[0], OracleEvent::PrevoteSubmitted(e) if !e.replaced));

    h.advance_to(3);
    let second = h.prevote(1, &salt(2), "1.10BTC,3100ETH").unwrap();
    assert!(matches!(&second[0], OracleEvent::PrevoteSubmitted(e) if e.replaced));

    h.advance_to(6);
    h.reveal(1, &salt(2), "1.10BTC,3100ETH").unwrap();
    h.advance_to(10);
    assert_eq!(h.oracle.exchange_rate("BTC").unwrap(), Some(dec(110, 2)));
}

#[test]
fn test_replaced_commitment_cannot_be_revealed() {
    let mut h = Harness::new(&[(1, 10)]);

    h.advance_to(2);
    h.prevote(1, &salt(1), "1.00BTC,3000ETH").unwrap();
    h.prevote(1, &salt(2), "1.10BTC,3100ETH").unwrap();

    h.advance_to(6);
    let result = h.reveal(1, &salt(1), "1.00BTC,3000ETH");
    assert!(matches!(result, Err(Error::VoteHashMismatch { .. })));
}

#[test]
fn test_perturbed_reveal_rejected() {
    let committed = "1.00BTC,3000ETH";
    let cases = [
        (salt(9), committed),
        (salt(1), "1.01BTC,3000ETH"),
        // Same values, different text
        (salt(1), "1.0BTC,3000ETH"),
        (salt(1), "3000ETH,1.00BTC"),
    ];

    for (reveal_salt, reveal_rates) in cases {
        let mut h = Harness::new(&[(1, 10)]);
        h.advance_to(2);
        h.prevote(1, &salt(1), committed).unwrap();

        h.advance_to(6);
        let result = h.reveal(1, &reveal_salt, reveal_rates);
        assert!(
            matches!(result, Err(Error::VoteHashMismatch { .. })),
            "reveal of {} was not rejected",
            reveal_rates
        );

        // The mismatch consumed the prevote
        assert_eq!(h.oracle.slot_state(&val(1)).unwrap(), SlotState::NoPrevote);
        let retry = h.reveal(1, &salt(1), committed);
        assert!(matches!(retry, Err(Error::NoPrevote(_))));
    }
}

#[test]
fn test_reveal_outside_next_period() {
    let mut h = Harness::new(&[(1, 10)]);

    h.advance_to(2);
    h.prevote(1, &salt(1), "1.00BTC,3000ETH").unwrap();

    // Same period
    h.advance_to(3);
    let early = h.reveal(1, &salt(1), "1.00BTC,3000ETH");
    assert!(matches!(
        early,
        Err(Error::RevealPeriodMismatch {
            prevote_period: 0,
            current_period: 0
        })
    ));
    assert!(matches!(
        h.oracle.slot_state(&val(1)).unwrap(),
        SlotState::HasPrevote { .. }
    ));

    // Dropped at the end of period 1
    h.advance_to(11);
    assert_eq!(h.events_of("PrevoteExpired").len(), 1);
    let late = h.reveal(1, &salt(1), "1.00BTC,3000ETH");
    assert!(matches!(late, Err(Error::NoPrevote(_))));
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEEDER DELEGATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_delegated_feeder_votes_for_validator() {
    let mut h = Harness::new(&[(1, 10)]);
    let delegate = AccAddress::from_bytes(&[0xAA; 20]).unwrap();
    let delegate_str = h.codec.encode_account(&delegate).unwrap();

    h.advance_to(1);
    let msg = OracleMsg::delegate_feeder(h.validator(1), delegate_str.clone());
    h.oracle.deliver(&msg).unwrap();
    assert_eq!(h.oracle.feeder(&val(1)).unwrap(), delegate);

    // The validator's own account no longer feeds
    h.advance_to(2);
    let own = h.prevote(1, &salt(1), "1.00BTC,3000ETH");
    assert!(matches!(own, Err(Error::UnauthorizedFeeder { .. })));

    h.prevote_as(&delegate_str, 1, &salt(1), "1.00BTC,3000ETH").unwrap();
    h.advance_to(6);
    h.reveal_as(&delegate_str, 1, &salt(1), "1.00BTC,3000ETH").unwrap();
    h.advance_to(10);
    assert_eq!(h.oracle.exchange_rate("ETH").unwrap(), Some(Dec::from_int(3000)));
}

#[test]
fn test_prevote_bound_to_its_feeder() {
    let mut h = Harness::new(&[(1, 10)]);
    let delegate = AccAddress::from_bytes(&[0xAA; 20]).unwrap();
    let delegate_str = h.codec.encode_account(&delegate).unwrap();

    h.advance_to(2);
    h.prevote(1, &salt(1), "1.00BTC,3000ETH").unwrap();

    h.advance_to(3);
    let msg = OracleMsg::delegate_feeder(h.validator(1), delegate_str.clone());
    h.oracle.deliver(&msg).unwrap();

    // The commitment names the validator's own account
    h.advance_to(6);
    let result = h.reveal_as(&delegate_str, 1, &salt(1), "1.00BTC,3000ETH");
    assert!(matches!(result, Err(Error::VoteHashMismatch { .. })));
    assert_eq!(h.oracle.slot_state(&val(1)).unwrap(), SlotState::NoPrevote);
}

#[test]
fn test_unknown_validator_cannot_vote() {
    let mut h = Harness::new(&[(1, 10)]);

    h.advance_to(2);
    let result = h.prevote(7, &salt(1), "1.00BTC,3000ETH");
    assert!(matches!(result, Err(Error::UnknownValidator(_))));
    assert_eq!(h.oracle.slot_state(&val(7)).unwrap(), SlotState::NoPrevote);
}

// ═══════════════════════════════════════════════════════════════════════════════
// QUORUM AND MISSES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_quorum_unmet_records_misses() {
    let mut h = Harness::new(&[(1, 10), (2, 5), (3, 5)]);

    h.advance_to(2);
    h.prevote(2, &salt(2), "1.00BTC,3000ETH").unwrap();
    h.advance_to(6);
    h.reveal(2, &salt(2), "1.00BTC,3000ETH").unwrap();
    h.advance_to(10);

    let report = &h.reports[1];
    assert_eq!(
        report.outcome("BTC"),
        Some(&AggregationOutcome::QuorumUnmet {
            ballot_power: 5,
            threshold_power: 10
        })
    );
    assert!(h.oracle.exchange_rates().unwrap().is_empty());
    assert_eq!(report.missed_validators(), vec![val(1), val(3)]);

    assert_eq!(h.oracle.miss_counter(&val(1)).unwrap(), 2);
    assert_eq!(h.oracle.miss_counter(&val(2)).unwrap(), 1);
    assert_eq!(h.oracle.miss_counter(&val(3)).unwrap(), 2);
    assert_eq!(h.events_of("QuorumUnmet").len(), 4);
}

#[test]
fn test_slash_window_reports_absent_validator() {
    let mut h = Harness::new(&[(1, 10), (2, 5)]);

    h.advance_to(2);
    h.prevote(1, &salt(1), "1.00BTC,3000ETH").unwrap();
    h.advance_to(6);
    h.reveal(1, &salt(1), "1.00BTC,3000ETH").unwrap();

    // Block 49 closes the 10-period window
    h.advance_to(50);
    let candidates: Vec<_> = h
        .events
        .iter()
        .filter_map(|e| match e {
            OracleEvent::SlashCandidate(c) => Some(c),
            _ => None,
        })
        .collect();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].validator, h.validator(2));
    assert_eq!(candidates[0].miss_counter, 10);
    assert_eq!(candidates[0].valid_ratio, Dec::zero());

    assert_eq!(h.oracle.miss_counter(&val(1)).unwrap(), 0);
    assert_eq!(h.oracle.miss_counter(&val(2)).unwrap(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// GOVERNANCE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_required_denoms_follow_governance() {
    let mut h = Harness::new(&[(1, 10)]);
    let authority = h.authority.clone();

    h.advance_to(1);
    let stranger = h.own_feeder(1);
    let denied = h.oracle.deliver(&OracleMsg::add_required_denom(stranger, "ATOM"));
    assert!(matches!(denied, Err(Error::UnauthorizedAction(_))));

    // Wire form of the add message
    let json = format!(
        r#"{{"type":"add_price","authority":"{}","symbol":"ATOM"}}"#,
        authority
    );
    let msg: OracleMsg = serde_json::from_str(&json).unwrap();
    h.oracle.deliver(&msg).unwrap();
    h.oracle
        .deliver(&OracleMsg::remove_required_denom(authority, "ETH"))
        .unwrap();

    h.advance_to(2);
    h.prevote(1, &salt(1), "1.00BTC,3000ETH,12.5ATOM").unwrap();
    h.advance_to(6);
    h.reveal(1, &salt(1), "1.00BTC,3000ETH,12.5ATOM").unwrap();
    h.advance_to(10);

    let rates = h.oracle.exchange_rates().unwrap();
    assert_eq!(rates.len(), 2);
    assert_eq!(rates["ATOM"], dec(125, 1));
    assert!(!rates.contains_key("ETH"));
}

#[test]
fn test_params_update_requires_authority_and_valid_params() {
    let mut h = Harness::new(&[(1, 10)]);
    let authority = h.authority.clone();

    h.advance_to(1);
    let invalid = Params::testnet().with_vote_period(0);
    let result = h
        .oracle
        .deliver(&OracleMsg::update_params(authority.clone(), invalid));
    assert!(matches!(result, Err(Error::InvalidParameter { .. })));

    let stranger = h.own_feeder(1);
    let result = h
        .oracle
        .deliver(&OracleMsg::update_params(stranger, Params::testnet()));
    assert!(matches!(result, Err(Error::UnauthorizedAction(_))));

    let updated = Params::testnet().with_vote_period(10);
    let events = h
        .oracle
        .deliver(&OracleMsg::update_params(authority, updated.clone()))
        .unwrap();
    assert!(matches!(&events[0], OracleEvent::ParamsUpdated(e) if e.vote_period == 10));
    assert_eq!(h.oracle.params().unwrap(), updated);
}
