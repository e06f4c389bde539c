//! Wave choreography engine for SKYWARD.
//!
//! Decides when hostile groups appear, where they start and how they move.
//! Ownership is a strict tree: `Level` owns `WaveRunner`s, a runner owns one
//! `Tactic`, a tactic owns its formations, a formation owns its ships. The
//! host owns the `Stage` (ECS world, RNG, events) and drives everything with
//! `update(time, delta)` once per frame.

pub mod deferred;
pub mod formation;
pub mod level;
pub mod runner;
pub mod stage;
pub mod tactic;

pub use skyward_core as core;
pub use level::Level;
pub use runner::{RunnerState, WaveRunner};
pub use stage::{Stage, StageConfig};
pub use tactic::Tactic;

#[cfg(test)]
mod tests;
