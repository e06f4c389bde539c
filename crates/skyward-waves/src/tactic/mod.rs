//! Tactics: movement strategies applied to the formations they spawn.
//!
//! A `Tactic` binds construction parameters, spawns exactly one formation
//! and drives it every frame. The strategy itself is a `Maneuver`; the
//! per-frame ordering is shared by all of them in [`drive`]:
//! completed formations are pruned first, then each live formation runs
//! its own roster maintenance, and only then does the maneuver move it.

pub mod boss;
pub mod linear;
pub mod native;
pub mod path;
pub mod sinus;

use std::collections::HashSet;

use glam::DVec2;
use hecs::Entity;
use tracing::{debug, warn};

use skyward_core::config::TacticConfig;
use skyward_core::constants::CULL_BUFFER;

use crate::formation::{self, Formation, FormationSetup};
use crate::stage::Stage;

/// The movement math of one tactic variant.
pub trait Maneuver {
    fn name(&self) -> &'static str;

    /// Called once right after the formation has spawned its ships.
    fn on_spawn(&mut self, _formation: &dyn Formation, _stage: &mut Stage, _time: f64) {}

    /// Move a formation whose roster is already current for this tick.
    fn update_formation(
        &mut self,
        formation: &mut dyn Formation,
        stage: &mut Stage,
        time: f64,
        delta: f64,
    );
}

/// Prune finished formations, then maintain and move the rest.
pub fn drive(
    formations: &mut Vec<Box<dyn Formation>>,
    maneuver: &mut dyn Maneuver,
    stage: &mut Stage,
    time: f64,
    delta: f64,
) {
    formations.retain_mut(|formation| {
        if formation.is_complete() {
            formation.destroy(stage);
            false
        } else {
            true
        }
    });

    for formation in formations.iter_mut() {
        formation.update(stage, time, delta);
        if !formation.is_complete() {
            maneuver.update_formation(formation.as_mut(), stage, time, delta);
        }
    }
}

/// Remembers which members have been on screen.
///
/// Formations stage above the top edge, so a member that has never been
/// seen may only leave through the bottom or a side. Once seen, any edge
/// counts.
#[derive(Debug, Default)]
pub(crate) struct Sightings {
    seen: HashSet<Entity>,
}

impl Sightings {
    /// Record the member's position and report whether it should be culled.
    pub(crate) fn should_cull(&mut self, stage: &Stage, entity: Entity, position: DVec2) -> bool {
        if !stage.bounds.is_outside(position, 0.0) {
            self.seen.insert(entity);
            return false;
        }
        if self.seen.contains(&entity) {
            stage.bounds.is_outside(position, CULL_BUFFER)
        } else {
            stage.bounds.has_exited(position, CULL_BUFFER)
        }
    }

    pub(crate) fn forget_dead(&mut self, stage: &Stage) {
        self.seen.retain(|entity| stage.is_alive(*entity));
    }
}

pub struct Tactic {
    setup: Option<FormationSetup>,
    formations: Vec<Box<dyn Formation>>,
    maneuver: Box<dyn Maneuver>,
}

impl Tactic {
    pub fn new(maneuver: Box<dyn Maneuver>) -> Self {
        Self {
            setup: None,
            formations: Vec::new(),
            maneuver,
        }
    }

    pub fn from_config(config: &TacticConfig) -> Self {
        let maneuver: Box<dyn Maneuver> = match config {
            TacticConfig::Native => Box::new(native::NativeManeuver),
            TacticConfig::Linear(c) => Box::new(linear::LinearManeuver::new(c.clone())),
            TacticConfig::Sinus(c) => Box::new(sinus::SinusManeuver::new(c.clone())),
            TacticConfig::Path(c) => Box::new(path::PathManeuver::new(c.clone())),
            TacticConfig::Boss(c) => Box::new(boss::BossManeuver::new(c.clone())),
        };
        Self::new(maneuver)
    }

    /// Bind construction parameters. Nothing is spawned yet.
    pub fn initialize(&mut self, setup: FormationSetup) {
        self.setup = Some(setup);
    }

    /// Spawn one formation from the bound parameters and keep it.
    pub fn spawn(&mut self, stage: &mut Stage, time: f64) {
        let Some(setup) = &self.setup else {
            warn!("{} tactic spawned before initialize, nothing to spawn", self.maneuver.name());
            return;
        };
        let mut formation = formation::build(setup);
        formation.spawn(stage, time);
        debug!(
            "{} tactic spawned a formation of {}",
            self.maneuver.name(),
            formation.members().len()
        );
        self.maneuver.on_spawn(formation.as_ref(), stage, time);
        self.formations.push(formation);
    }

    pub fn update(&mut self, stage: &mut Stage, time: f64, delta: f64) {
        drive(
            &mut self.formations,
            self.maneuver.as_mut(),
            stage,
            time,
            delta,
        );
    }

    pub fn is_complete(&self) -> bool {
        self.formations.is_empty()
    }

    pub fn destroy(&mut self, stage: &mut Stage) {
        for mut formation in self.formations.drain(..) {
            formation.destroy(stage);
        }
    }

    pub fn formations(&self) -> &[Box<dyn Formation>] {
        &self.formations
    }

    pub fn name(&self) -> &'static str {
        self.maneuver.name()
    }
}
