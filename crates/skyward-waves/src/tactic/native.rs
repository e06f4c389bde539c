//! Native tactic: hands movement back to the formation's own motion.

use crate::formation::Formation;
use crate::stage::Stage;
use crate::tactic::Maneuver;

pub struct NativeManeuver;

impl Maneuver for NativeManeuver {
    fn name(&self) -> &'static str {
        "native"
    }

    fn update_formation(
        &mut self,
        formation: &mut dyn Formation,
        stage: &mut Stage,
        time: f64,
        delta: f64,
    ) {
        formation.advance(stage, time, delta);
    }
}
