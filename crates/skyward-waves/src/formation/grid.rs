//! Grid / diamond formation.
//!
//! Rows are laid out front to back, each centered on the travel line, and
//! the whole block is tilted so its front faces the direction of travel
//! from the start width fraction at the top to the end width fraction at
//! the bottom. On its own the grid advances in a straight line with a small
//! per-member sideways wobble.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec2;
use rand::Rng;

use skyward_core::config::{GridConfig, GridRows, ShipConfig};
use skyward_core::constants::*;

use crate::formation::{Formation, FormationMember, Roster};
use crate::stage::Stage;

pub struct GridFormation {
    config: GridConfig,
    roster: Roster,
    travel_angle: f64,
}

impl GridFormation {
    pub fn new(config: GridConfig, roster: Roster) -> Self {
        Self {
            config,
            roster,
            travel_angle: FRAC_PI_2,
        }
    }

    /// Heading of the straight-line advance (rad).
    pub fn travel_angle(&self) -> f64 {
        self.travel_angle
    }

    /// Per-row ship configs; `None` cells are gaps.
    fn rows(&self) -> Vec<Vec<Option<ShipConfig>>> {
        match &self.config.rows {
            GridRows::Counts(counts) => counts
                .iter()
                .enumerate()
                .map(|(row, &count)| vec![Some(self.roster.ship(row)); count])
                .collect(),
            GridRows::Cells(cells) => cells.clone(),
        }
    }
}

impl Formation for GridFormation {
    fn spawn(&mut self, stage: &mut Stage, time: f64) {
        let bounds = stage.bounds;
        let start_x = bounds.width * self.config.start_width_fraction;
        let end_x = bounds.width * self.config.end_width_fraction;
        self.travel_angle = (bounds.height + SPAWN_BUFFER).atan2(end_x - start_x);

        let tilt = DVec2::from_angle(self.travel_angle - FRAC_PI_2);
        let origin = DVec2::new(start_x, -SPAWN_BUFFER);

        for (row, cells) in self.rows().iter().enumerate() {
            let mid = (cells.len() as f64 - 1.0) / 2.0;
            for (cell, config) in cells.iter().enumerate() {
                let Some(config) = config else {
                    continue;
                };
                let local = DVec2::new(
                    (cell as f64 - mid) * self.config.spacing,
                    -(row as f64) * self.config.row_spacing,
                );
                let position = origin + tilt.rotate(local);
                let phase = stage.rng.gen_range(0.0..TAU);
                let wobble_speed = stage.rng.gen_range(WOBBLE_SPEED_MIN..WOBBLE_SPEED_MAX);
                let heading = self.travel_angle;
                if let Some(member) = self.roster.enlist(stage, time, 0.0, position, config) {
                    member.phase = phase;
                    member.wobble_speed = wobble_speed;
                    member.heading = heading;
                }
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
        let direction = DVec2::from_angle(self.travel_angle);
        let normal = direction.perp();
        for member in self.roster.members() {
            let Some(elapsed) = member.elapsed_secs(time) else {
                continue;
            };
            let Some(speed) = stage.max_speed(member.entity) else {
                continue;
            };
            let travelled = speed * REFERENCE_FRAME_RATE * elapsed;
            let wobble = (elapsed * member.wobble_speed + member.phase).sin()
                * self.config.wobble_amplitude;
            let position = member.start + direction * travelled + normal * wobble;
            stage.set_pose(member.entity, position, self.travel_angle);
            if stage.bounds.has_exited(position, CULL_BUFFER) {
                stage.cull_ship(member.entity);
            }
        }
    }

    fn destroy(&mut self, stage: &mut Stage) {
        self.roster.destroy(stage);
    }
}
