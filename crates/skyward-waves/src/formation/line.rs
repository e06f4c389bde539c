//! Line formation: a single zig-zag row staged above the screen.

use std::f64::consts::FRAC_PI_2;

use skyward_core::config::LineConfig;
use skyward_core::constants::SPAWN_BUFFER;

use crate::formation::{descend, fill_count, row_layout, Formation, FormationMember, Roster};
use crate::stage::Stage;

pub struct LineFormation {
    config: LineConfig,
    roster: Roster,
}

impl LineFormation {
    pub fn new(config: LineConfig, roster: Roster) -> Self {
        Self { config, roster }
    }
}

impl Formation for LineFormation {
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
            self.roster.enlist(stage, time, 0.0, position, &config);
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
