//! Governance hooks for the oracle.
//!
//! This module gates the operations only the governance authority may
//! perform:
//! - Required denom whitelist changes
//! - Param replacement
//!
//! The authority itself is resolved by the host through
//! [`AuthorityResolver`]; [`FixedAuthority`] covers the common case of a
//! single module account.

pub mod authority;
pub mod denoms;

pub use authority::*;
pub use denoms::*;
