//! Oracle events for state change notifications.
//!
//! Every accepted message and every tally emits events so that clients can
//! follow oracle activity without reading the store. Addresses are carried
//! as bech32 strings.

use serde::{Deserialize, Serialize};

use crate::utils::math::Dec;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// All oracle event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleEvent {
    // Voting Events
    /// Prevote recorded
    PrevoteSubmitted(PrevoteSubmittedEvent),
    /// Vote revealed and accepted
    VoteRevealed(VoteRevealedEvent),
    /// Unrevealed prevote dropped at a tally
    PrevoteExpired(PrevoteExpiredEvent),

    // Delegation Events
    /// Feeder delegation changed
    FeederDelegated(FeederDelegatedEvent),

    // Governance Events
    /// Denom added to the required set
    RequiredDenomAdded(DenomChangedEvent),
    /// Denom removed from the required set
    RequiredDenomRemoved(DenomChangedEvent),
    /// Params replaced
    ParamsUpdated(ParamsUpdatedEvent),

    // Tally Events
    /// Rate published for a denom
    ExchangeRateUpdated(ExchangeRateUpdatedEvent),
    /// Denom did not reach quorum
    QuorumUnmet(QuorumUnmetEvent),
    /// Validator missed at least one required denom
    ValidatorMissed(ValidatorMissedEvent),
    /// Validator fell below the minimum valid ratio of a slash window
    SlashCandidate(SlashCandidateEvent),
}

impl OracleEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PrevoteSubmitted(_) => "PrevoteSubmitted",
            Self::VoteRevealed(_) => "VoteRevealed",
            Self::PrevoteExpired(_) => "PrevoteExpired",
            Self::FeederDelegated(_) => "FeederDelegated",
            Self::RequiredDenomAdded(_) => "RequiredDenomAdded",
            Self::RequiredDenomRemoved(_) => "RequiredDenomRemoved",
            Self::ParamsUpdated(_) => "ParamsUpdated",
            Self::ExchangeRateUpdated(_) => "ExchangeRateUpdated",
            Self::QuorumUnmet(_) => "QuorumUnmet",
            Self::ValidatorMissed(_) => "ValidatorMissed",
            Self::SlashCandidate(_) => "SlashCandidate",
        }
    }

    /// Get the block height of the event
    pub fn block_height(&self) -> u64 {
        match self {
            Self::PrevoteSubmitted(e) => e.block_height,
            Self::VoteRevealed(e) => e.block_height,
            Self::PrevoteExpired(e) => e.block_height,
            Self::FeederDelegated(e) => e.block_height,
            Self::RequiredDenomAdded(e) => e.block_height,
            Self::RequiredDenomRemoved(e) => e.block_height,
            Self::ParamsUpdated(e) => e.block_height,
            Self::ExchangeRateUpdated(e) => e.block_height,
            Self::QuorumUnmet(e) => e.block_height,
            Self::ValidatorMissed(e) => e.block_height,
            Self::SlashCandidate(e) => e.block_height,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VOTING EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when a prevote is recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrevoteSubmittedEvent {
    /// Validator the prevote is for
    pub validator: String,
    /// Submitting feeder
    pub feeder: String,
    /// Committed hash (hex)
    pub hash: String,
    /// Whether an earlier prevote was overwritten
    pub replaced: bool,
    /// Block height
    pub block_height: u64,
}

/// Event emitted when a vote is revealed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRevealedEvent {
    /// Validator the vote counts for
    pub validator: String,
    /// Submitting feeder
    pub feeder: String,
    /// Canonical exchange rates string
    pub exchange_rates: String,
    /// Block height
    pub block_height: u64,
}

/// Event emitted when a prevote is dropped unrevealed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrevoteExpiredEvent {
    /// Validator whose prevote expired
    pub validator: String,
    /// Height the prevote was submitted at
    pub submit_block: u64,
    /// Block height
    pub block_height: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DELEGATION AND GOVERNANCE EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when a validator delegates its feeder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeederDelegatedEvent {
    /// Delegating operator
    pub operator: String,
    /// New feeder
    pub feeder: String,
    /// Block height
    pub block_height: u64,
}

/// Event emitted when the required denom set changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomChangedEvent {
    /// Denom added or removed
    pub denom: String,
    /// Block height
    pub block_height: u64,
}

/// Event emitted when params are replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsUpdatedEvent {
    /// New vote period
    pub vote_period: u64,
    /// Block height
    pub block_height: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TALLY EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when a rate is published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateUpdatedEvent {
    /// Denom
    pub denom: String,
    /// Published rate
    pub exchange_rate: Dec,
    /// Block height
    pub block_height: u64,
}

/// Event emitted when a denom misses quorum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumUnmetEvent {
    /// Denom
    pub denom: String,
    /// Stake behind the ballot
    pub ballot_power: u128,
    /// Stake the ballot needed
    pub threshold_power: u128,
    /// Block height
    pub block_height: u64,
}

/// Event emitted for every validator with a miss in a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorMissedEvent {
    /// Validator
    pub validator: String,
    /// Required denoms without a counted vote
    pub missed_denoms: Vec<String>,
    /// Misses so far in the slash window
    pub miss_counter: u64,
    /// Block height
    pub block_height: u64,
}

/// Event emitted at the end of a slash window for under-performing validators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCandidateEvent {
    /// Validator
    pub validator: String,
    /// Misses in the window
    pub miss_counter: u64,
    /// Fraction of periods with a valid vote
    pub valid_ratio: Dec,
    /// Block height
    pub block_height: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Collection of events from a message or block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<OracleEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn push(&mut self, event: OracleEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[OracleEvent] {
        &self.events
    }

    /// Get the number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take all events, leaving the log empty
    pub fn drain(&mut self) -> Vec<OracleEvent> {
        std::mem::take(&mut self.events)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn denom_added(denom: &str, height: u64) -> OracleEvent {
        OracleEvent::RequiredDenomAdded(DenomChangedEvent {
            denom: denom.into(),
            block_height: height,
        })
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.push(denom_added("BTC", 10));
        log.push(OracleEvent::ExchangeRateUpdated(ExchangeRateUpdatedEvent {
            denom: "BTC".into(),
            exchange_rate: Dec::one(),
            block_height: 13,
        }));

        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[1].event_type(), "ExchangeRateUpdated");
        assert_eq!(log.events()[1].block_height(), 13);

        assert_eq!(log.drain().len(), 2);
        assert!(log.is_empty());
    }
}
