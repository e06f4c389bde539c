//! Explicit formation: members at authored fractional screen positions,
//! each optionally appearing after its own delay.

use std::f64::consts::FRAC_PI_2;

use tracing::warn;

use skyward_core::config::ExplicitConfig;

use crate::formation::{descend, Formation, FormationMember, Roster};
use crate::stage::Stage;

pub struct ExplicitFormation {
    config: ExplicitConfig,
    roster: Roster,
}

impl ExplicitFormation {
    pub fn new(config: ExplicitConfig, roster: Roster) -> Self {
        Self { config, roster }
    }
}

impl Formation for ExplicitFormation {
    fn spawn(&mut self, stage: &mut Stage, time: f64) {
        let bounds = stage.bounds;
        for placement in &self.config.placements {
            if placement.config >= self.roster.ship_count().max(1) {
                warn!(
                    "Placement refers to ship config {} but only {} exist, wrapping around",
                    placement.config,
                    self.roster.ship_count()
                );
            }
            let config = self.roster.ship(placement.config);
            let position = bounds.point(placement.x, placement.y);
            self.roster
                .enlist(stage, time, placement.delay_ms.max(0.0), position, &config);
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
            descend(stage, member, time, FRAC_PI_2);
        }
    }

    fn destroy(&mut self, stage: &mut Stage) {
        self.roster.destroy(stage);
    }
}
