//! Oracle voting and aggregation.
//!
//! This module provides the commit-reveal exchange rate oracle:
//! - Vote hash commitments
//! - Exchange rate tuple parsing and bounds checking
//! - Feeder delegation
//! - Prevote and vote bookkeeping
//! - Stake-weighted ballots and the end-of-period tally
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rate_oracle::oracle::{parse_exchange_rate_tuples, AggregateVoteHash};
//!
//! let rates = "1.02BTC,3000.5ETH";
//! parse_exchange_rate_tuples(rates)?;
//! let hash = AggregateVoteHash::compute(&salt, rates, &feeder, &validator);
//! ```

pub mod aggregator;
pub mod ballot;
pub mod feeder;
pub mod tuples;
pub mod vote_hash;
pub mod voting;

pub use aggregator::*;
pub use ballot::*;
pub use feeder::FeederRegistry;
pub use tuples::*;
pub use vote_hash::AggregateVoteHash;
pub use voting::*;
