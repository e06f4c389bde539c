//! Events emitted by the wave engine for the host's audio, VFX and HUD.

use glam::DVec2;
use hecs::Entity;

#[derive(Debug, Clone, PartialEq)]
pub enum WaveEvent {
    /// A wave step began with this many runners.
    StepStarted { step: usize, runners: usize },
    ShipSpawned { entity: Entity, kind: String },
    /// A ship fired. Projectile creation is up to the host.
    Shot {
        entity: Entity,
        origin: DVec2,
        heading: f64,
    },
    /// A ship left the playfield and was removed.
    ShipCulled { entity: Entity },
    RunnerFinished { label: String },
    LevelLooped { loops: u32 },
    LevelComplete { name: String },
}
