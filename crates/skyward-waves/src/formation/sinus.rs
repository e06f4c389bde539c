//! Sinus formation: a zig-zag row whose members weave side to side while
//! descending.
//!
//! Poses are recomputed every frame from time since spawn, never
//! integrated, so the motion is identical at any frame rate.

use glam::DVec2;

use skyward_core::config::SinusConfig;
use skyward_core::constants::{CULL_BUFFER, REFERENCE_FRAME_RATE, SPAWN_BUFFER};

use crate::formation::{fill_count, row_layout, Formation, FormationMember, Roster};
use crate::stage::Stage;

/// Position and facing on a descending sine path `elapsed` seconds in.
/// Facing follows the analytic derivative of the path.
pub fn sinus_pose(
    start: DVec2,
    elapsed: f64,
    speed: f64,
    amplitude: f64,
    frequency: f64,
    phase: f64,
) -> (DVec2, f64) {
    let angle = elapsed * frequency + phase;
    let position = DVec2::new(start.x + angle.sin() * amplitude, start.y + speed * elapsed);
    let dx = angle.cos() * amplitude * frequency;
    let dy = speed;
    (position, dy.atan2(dx))
}

pub struct SinusFormation {
    config: SinusConfig,
    roster: Roster,
}

impl SinusFormation {
    pub fn new(config: SinusConfig, roster: Roster) -> Self {
        Self { config, roster }
    }
}

impl Formation for SinusFormation {
    fn spawn(&mut self, stage: &mut Stage, time: f64) {
        let bounds = stage.bounds;
        let count = self
            .config
            .count
            .unwrap_or_else(|| fill_count(bounds.width, self.config.spacing));
        let positions = row_layout(
            bounds.width / 2.0,
            -SPAWN_BUFFER,
            count,
            self.config.spacing,
            self.config.zigzag,
        );
        for (i, position) in positions.into_iter().enumerate() {
            let config = self.roster.ship(i);
            let phase = i as f64 * self.config.phase_step;
            if let Some(member) = self.roster.enlist(stage, time, 0.0, position, &config) {
                member.phase = phase;
            }
        }
    }

    fn members(&self) -> &[FormationMember] {
        self.roster.members()
    }

    fn update(&mut self, stage: &mut Stage, _time: f64, delta: f64) {
        self.roster.maintain(stage, delta);
    }

    fn advance(&mut self, stage: &mut Stage, time: f64, _delta: f64) {
        for member in self.roster.members() {
            let Some(elapsed) = member.elapsed_secs(time) else {
                continue;
            };
            let Some(speed) = stage.max_speed(member.entity) else {
                continue;
            };
            let (position, rotation) = sinus_pose(
                member.start,
                elapsed,
                speed * REFERENCE_FRAME_RATE,
                self.config.amplitude,
                self.config.frequency,
                member.phase,
            );
            stage.set_pose(member.entity, position, rotation);
            if stage.bounds.has_exited(position, CULL_BUFFER) {
                stage.cull_ship(member.entity);
            }
        }
    }

    fn destroy(&mut self, stage: &mut Stage) {
        self.roster.destroy(stage);
    }
}
