//! Storage module for oracle state.
//!
//! The host ledger owns persistence; this module defines the key-value
//! interface it must provide and the typed oracle view on top of it.
//!
//! ## Backends
//!
//! - **InMemoryStore**: ordered in-memory storage for tests and simulations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rate_oracle::storage::{InMemoryStore, OracleStore};
//!
//! let store = OracleStore::new(InMemoryStore::new());
//! store.initialize_if_needed(&OracleConfig::default())?;
//! ```

pub mod backend;
pub mod state;

pub use backend::*;
pub use state::*;
