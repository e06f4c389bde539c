//! Formations: layout generators that place a roster of ships.
//!
//! A formation creates its ships in `spawn`, keeps its roster current in
//! `update` (dropping dead members, running their fire schedules), and may
//! offer its own self-contained motion through `advance`. Tactics call
//! `update` before applying any movement so dead members never reach the
//! movement math in the tick they die.

pub mod explicit;
pub mod field;
pub mod grid;
pub mod line;
pub mod roster;
pub mod sinus;

use glam::DVec2;
use hecs::Entity;

use skyward_core::components::CollisionLayer;
use skyward_core::config::{FormationConfig, ShipConfig};

use crate::stage::Stage;

pub use roster::Roster;

/// Everything a formation needs to build its ships.
#[derive(Debug, Clone)]
pub struct FormationSetup {
    pub config: FormationConfig,
    pub ships: Vec<ShipConfig>,
    pub layer: CollisionLayer,
}

/// One ship in a formation.
#[derive(Debug, Clone, PartialEq)]
pub struct FormationMember {
    pub entity: Entity,
    /// Simulated time the member starts moving. May lie in the future for
    /// staggered placements.
    pub spawn_time: f64,
    /// Recorded spawn position; all motion is computed from it.
    pub start: DVec2,
    /// Spawn order within the formation. Stable when others die.
    pub slot: usize,
    /// Sinus or wobble phase (rad).
    pub phase: f64,
    /// Wobble angular speed (rad/s).
    pub wobble_speed: f64,
    /// Spin rate (rad/s).
    pub spin: f64,
    /// Facing at spawn.
    pub heading: f64,
}

impl FormationMember {
    pub fn new(entity: Entity, spawn_time: f64, start: DVec2, slot: usize) -> Self {
        Self {
            entity,
            spawn_time,
            start,
            slot,
            phase: 0.0,
            wobble_speed: 0.0,
            spin: 0.0,
            heading: skyward_core::constants::SPAWN_ROTATION,
        }
    }

    /// Seconds since this member started moving, or `None` before that.
    pub fn elapsed_secs(&self, time: f64) -> Option<f64> {
        (time >= self.spawn_time).then(|| (time - self.spawn_time) / 1000.0)
    }
}

pub trait Formation {
    /// Create the ships. Called once.
    fn spawn(&mut self, stage: &mut Stage, time: f64);

    fn members(&self) -> &[FormationMember];

    /// Roster maintenance only: reap dead members and run fire schedules.
    fn update(&mut self, stage: &mut Stage, time: f64, delta: f64);

    /// Self-contained motion for formations nothing else drives.
    fn advance(&mut self, _stage: &mut Stage, _time: f64, _delta: f64) {}

    fn is_complete(&self) -> bool {
        self.members().is_empty()
    }

    /// Despawn every member and cancel pending fire.
    fn destroy(&mut self, stage: &mut Stage);
}

/// Build the formation an authored config describes.
pub fn build(setup: &FormationSetup) -> Box<dyn Formation> {
    let roster = Roster::new(setup.ships.clone(), setup.layer);
    match &setup.config {
        FormationConfig::Grid(config) => Box::new(grid::GridFormation::new(config.clone(), roster)),
        FormationConfig::Line(config) => Box::new(line::LineFormation::new(config.clone(), roster)),
        FormationConfig::Sinus(config) => {
            Box::new(sinus::SinusFormation::new(config.clone(), roster))
        }
        FormationConfig::Field(config) => {
            Box::new(field::FieldFormation::new(config.clone(), roster))
        }
        FormationConfig::Explicit(config) => {
            Box::new(explicit::ExplicitFormation::new(config.clone(), roster))
        }
    }
}

/// Horizontal positions of a centered 1-D row, plus the zig-zag drop for
/// every other member.
pub(crate) fn row_layout(
    center_x: f64,
    top: f64,
    count: usize,
    spacing: f64,
    zigzag: f64,
) -> Vec<DVec2> {
    let mid = (count as f64 - 1.0) / 2.0;
    (0..count)
        .map(|i| {
            let drop = if i % 2 == 1 { zigzag } else { 0.0 };
            DVec2::new(center_x + (i as f64 - mid) * spacing, top - drop)
        })
        .collect()
}

/// Member count for a row that fills the screen width.
pub(crate) fn fill_count(width: f64, spacing: f64) -> usize {
    if spacing <= 0.0 {
        return 1;
    }
    ((width / spacing).floor() as usize).max(1)
}

/// Straight descent at the member's own speed; culls it once it leaves.
pub(crate) fn descend(stage: &mut Stage, member: &FormationMember, time: f64, rotation: f64) {
    let Some(elapsed) = member.elapsed_secs(time) else {
        return;
    };
    let Some(speed) = stage.max_speed(member.entity) else {
        return;
    };
    let speed = speed * skyward_core::constants::REFERENCE_FRAME_RATE;
    let position = member.start + DVec2::Y * speed * elapsed;
    stage.set_pose(member.entity, position, rotation);
    if stage.bounds.has_exited(position, skyward_core::constants::CULL_BUFFER) {
        stage.cull_ship(member.entity);
    }
}
