//! Boss AI for SKYWARD.
//!
//! Implements the boss behavior state machine and the profiles that
//! tune it.

pub mod fsm;
pub mod profiles;

pub use skyward_core as core;
