//! Sinusoidal tactic: every member weaves around its own spawn column.

use skyward_core::config::SinusTacticConfig;
use skyward_core::constants::{CULL_BUFFER, LINEAR_CULL_GRACE_MS, REFERENCE_FRAME_RATE};

use crate::formation::sinus::sinus_pose;
use crate::formation::Formation;
use crate::stage::Stage;
use crate::tactic::Maneuver;

pub struct SinusManeuver {
    config: SinusTacticConfig,
}

impl SinusManeuver {
    pub fn new(config: SinusTacticConfig) -> Self {
        Self { config }
    }
}

impl Maneuver for SinusManeuver {
    fn name(&self) -> &'static str {
        "sinus"
    }

    fn update_formation(
        &mut self,
        formation: &mut dyn Formation,
        stage: &mut Stage,
        time: f64,
        _delta: f64,
    ) {
        for member in formation.members() {
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
                member.slot as f64 * self.config.phase_step,
            );
            stage.set_pose(member.entity, position, rotation);
            if elapsed * 1000.0 > LINEAR_CULL_GRACE_MS
                && stage.bounds.has_exited(position, CULL_BUFFER)
            {
                stage.cull_ship(member.entity);
            }
        }
    }
}
