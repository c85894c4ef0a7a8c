//! # Rate Oracle
//!
//! A commit-reveal exchange rate oracle for a proof-of-stake ledger.
//! Bonded validators commit to a hash of their prices in one vote period,
//! reveal the prices in the next, and at the end of every period the oracle
//! publishes a stake-weighted median per required denom.
//!
//! ## Architecture
//!
//! - **Core**: Addresses, params, configuration and the staking interface
//! - **Oracle**: Vote hashes, rate tuples, feeder delegation, ballots and the tally
//! - **Governance**: Authority checks and the required denom whitelist
//! - **Protocol**: Messages, events and the state machine
//! - **Storage**: Key-value backend and typed oracle state
//!
//! ## Example
//!
//! ```rust,ignore
//! use rate_oracle::prelude::*;
//!
//! let mut oracle = OracleStateMachine::new(backend, &config, staking, authority)?;
//! oracle.begin_block(height);
//! oracle.deliver(&OracleMsg::prevote(&hash, feeder, validator))?;
//! let report = oracle.end_block()?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod core;
pub mod error;
pub mod governance;
pub mod oracle;
pub mod protocol;
pub mod storage;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        address::{AccAddress, AddressCodec, ValAddress},
        config::OracleConfig,
        params::{MedianTieBreak, Params},
        staking::{StakingView, StaticStakingView},
    };
    pub use crate::error::{Error, Result};
    pub use crate::governance::authority::{AuthorityResolver, FixedAuthority};
    pub use crate::oracle::{
        aggregator::{AggregationOutcome, AggregationReport},
        tuples::{parse_exchange_rate_tuples, ExchangeRateTuples},
        vote_hash::AggregateVoteHash,
    };
    pub use crate::protocol::{events::OracleEvent, messages::OracleMsg, state_machine::OracleStateMachine};
    pub use crate::storage::backend::InMemoryStore;
    pub use crate::utils::math::Dec;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Module name
pub const PROTOCOL_NAME: &str = utils::constants::MODULE_NAME;
