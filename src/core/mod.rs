//! Core types and collaborator interfaces.
//!
//! - Addresses and their bech32 codec
//! - Oracle parameters
//! - Configuration
//! - Stake weight lookup

pub mod address;
pub mod config;
pub mod params;
pub mod staking;

pub use address::{AccAddress, AddressCodec, AddressParseError, ValAddress};
pub use config::OracleConfig;
pub use params::{MedianTieBreak, Params};
pub use staking::{StakingView, StaticStakingView};
