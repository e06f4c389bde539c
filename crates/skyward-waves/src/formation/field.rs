//! Field formation: a random scatter of debris or drones.
//!
//! Members are strewn across a band of the screen width, drawn from a
//! weighted set of variants, and given a little physical jitter in mass,
//! initial facing and spin so no two look alike.

use std::f64::consts::TAU;

use glam::DVec2;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tracing::warn;

use skyward_core::components::Ship;
use skyward_core::config::FieldConfig;
use skyward_core::constants::{CULL_BUFFER, REFERENCE_FRAME_RATE, SPAWN_BUFFER};

use crate::formation::{Formation, FormationMember, Roster};
use crate::stage::Stage;

pub struct FieldFormation {
    config: FieldConfig,
    roster: Roster,
}

impl FieldFormation {
    pub fn new(config: FieldConfig, roster: Roster) -> Self {
        Self { config, roster }
    }

    fn variant_picker(&self) -> Option<WeightedIndex<f64>> {
        if self.config.variants.is_empty() {
            return None;
        }
        for variant in &self.config.variants {
            if variant.config >= self.roster.ship_count().max(1) {
                warn!(
                    "Field variant refers to ship config {} but only {} exist, wrapping around",
                    variant.config,
                    self.roster.ship_count()
                );
            }
        }
        match WeightedIndex::new(self.config.variants.iter().map(|v| v.weight)) {
            Ok(picker) => Some(picker),
            Err(e) => {
                warn!("Field variant weights unusable ({}), cycling ship list", e);
                None
            }
        }
    }
}

fn jitter<R: Rng>(rng: &mut R, spread: f64) -> f64 {
    if spread > 0.0 {
        rng.gen_range(-spread..spread)
    } else {
        0.0
    }
}

impl Formation for FieldFormation {
    fn spawn(&mut self, stage: &mut Stage, time: f64) {
        let bounds = stage.bounds;
        let half_band = bounds.width * self.config.width_fraction.clamp(0.0, 1.0) / 2.0;
        let picker = self.variant_picker();

        for i in 0..self.config.count {
            let x = bounds.width / 2.0 + jitter(&mut stage.rng, half_band);
            let depth = if self.config.depth > 0.0 {
                stage.rng.gen_range(0.0..self.config.depth)
            } else {
                0.0
            };
            let position = DVec2::new(x, -SPAWN_BUFFER - depth);

            let (config_index, scale) = match &picker {
                Some(picker) => {
                    let variant = &self.config.variants[picker.sample(&mut stage.rng)];
                    (variant.config, variant.scale)
                }
                None => (i, 1.0),
            };
            let config = self.roster.ship(config_index);
            let mass_factor = 1.0 + jitter(&mut stage.rng, self.config.mass_jitter);
            let heading = stage.rng.gen_range(0.0..TAU);
            let spin = jitter(&mut stage.rng, self.config.spin_jitter);

            let Some(member) = self.roster.enlist(stage, time, 0.0, position, &config) else {
                continue;
            };
            member.heading = heading;
            member.spin = spin;
            let entity = member.entity;

            if let Ok(mut ship) = stage.world.get::<&mut Ship>(entity) {
                ship.mass *= mass_factor.max(0.05);
                ship.scale = scale;
            }
            stage.set_pose(entity, position, heading);
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
            let position = member.start + DVec2::Y * speed * REFERENCE_FRAME_RATE * elapsed;
            let rotation = member.heading + member.spin * elapsed;
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
