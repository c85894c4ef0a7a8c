//! Utility modules for the rate oracle.
//!
//! This module contains shared utilities used across the oracle:
//! - Hashing primitives
//! - Arbitrary-precision decimals
//! - Validation helpers
//! - Constants

pub mod constants;
pub mod crypto;
pub mod math;
pub mod validation;

pub use constants::*;
pub use crypto::*;
pub use math::*;
pub use validation::*;
