//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Movement logic lives in formations and tactics, not components.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Position and facing of an entity in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: DVec2,
    /// Facing in radians (0 = +x, PI/2 = down the screen).
    pub rotation: f64,
}

/// Hostile ship state owned by the physics collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub kind: String,
    /// Top speed in px per reference frame.
    pub max_speed: f64,
    pub mass: f64,
    pub scale: f64,
    /// Cleared by the host when the ship dies. Inactive ships are reaped
    /// from their formation on the next update.
    pub active: bool,
}

/// Collision group a ship is constructed into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionLayer {
    #[default]
    Hostile,
    /// Debris and asteroids: collide with everything, never shoot.
    Hazard,
}
