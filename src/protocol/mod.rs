//! Protocol module - messages, events and the oracle state machine.
//!
//! Messages enter through [`OracleStateMachine::deliver`]; every accepted
//! message and every tally reports what it changed as [`OracleEvent`]s.

pub mod events;
pub mod messages;
pub mod state_machine;

pub use events::*;
pub use messages::*;
pub use state_machine::*;
