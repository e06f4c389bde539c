//! Linear tactic: straight flight along one heading.
//!
//! The heading is either authored or aimed once, at spawn, from the
//! formation's centroid toward the tracked target. Plain flight is a pure
//! function of time since spawn, optionally wrapped modulo a loop length.
//! In withdraw mode each member flies in to a random depth, then turns at
//! a fixed rate toward the nearer side of the screen and leaves.

use std::collections::HashMap;
use std::f64::consts::PI;

use glam::DVec2;
use hecs::Entity;
use rand::Rng;
use tracing::debug;

use skyward_core::config::LinearConfig;
use skyward_core::constants::{LINEAR_CULL_GRACE_MS, REFERENCE_FRAME_RATE};
use skyward_core::types::{direction, heading_of, rotate_towards};

use crate::formation::Formation;
use crate::stage::Stage;
use crate::tactic::{Maneuver, Sightings};

/// Integrated state of one withdrawing member.
#[derive(Debug, Clone, Copy)]
struct Withdrawal {
    position: DVec2,
    heading: f64,
    /// Depth (px) at which the member peels off.
    turn_at_y: f64,
    retreat_heading: Option<f64>,
}

pub struct LinearManeuver {
    config: LinearConfig,
    heading: f64,
    withdrawals: HashMap<Entity, Withdrawal>,
    sightings: Sightings,
}

impl LinearManeuver {
    pub fn new(config: LinearConfig) -> Self {
        let heading = config.angle_deg.to_radians();
        Self {
            config,
            heading,
            withdrawals: HashMap::new(),
            sightings: Sightings::default(),
        }
    }

    /// Heading in use (rad).
    pub fn heading(&self) -> f64 {
        self.heading
    }

    fn fly_withdrawal(&mut self, entity: Entity, speed: f64, stage: &mut Stage, delta: f64) {
        let Some(withdraw) = &self.config.withdraw else {
            return;
        };
        let Some(state) = self.withdrawals.get_mut(&entity) else {
            return;
        };
        let delta_s = delta / 1000.0;

        if state.retreat_heading.is_none() && state.position.y >= state.turn_at_y {
            let exit = if state.position.x < stage.bounds.width / 2.0 {
                PI
            } else {
                0.0
            };
            state.retreat_heading = Some(exit);
        }
        if let Some(exit) = state.retreat_heading {
            let max_turn = withdraw.turn_rate_deg.to_radians() * delta_s;
            state.heading = rotate_towards(state.heading, exit, max_turn);
        }
        state.position += direction(state.heading) * speed * delta_s;

        let position = state.position;
        let retreating = state.retreat_heading.is_some();
        stage.set_pose(entity, position, state.heading);
        if self.sightings.should_cull(stage, entity, position) && retreating {
            stage.cull_ship(entity);
        }
    }
}

impl Maneuver for LinearManeuver {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn on_spawn(&mut self, formation: &dyn Formation, stage: &mut Stage, _time: f64) {
        let members = formation.members();
        if self.config.aim_at_target && !members.is_empty() {
            match stage.target_position() {
                Some(target) => {
                    let centroid = members.iter().map(|m| m.start).sum::<DVec2>()
                        / members.len() as f64;
                    self.heading = heading_of(target - centroid, self.heading);
                }
                None => debug!("Linear tactic has no target to aim at, keeping authored angle"),
            }
        }

        if let Some(withdraw) = &self.config.withdraw {
            let lo = withdraw.min_fraction.min(withdraw.max_fraction);
            let hi = withdraw.min_fraction.max(withdraw.max_fraction);
            for member in members {
                let fraction = if hi > lo { stage.rng.gen_range(lo..hi) } else { lo };
                self.withdrawals.insert(
                    member.entity,
                    Withdrawal {
                        position: member.start,
                        heading: self.heading,
                        turn_at_y: stage.bounds.height * fraction,
                        retreat_heading: None,
                    },
                );
            }
        }
    }

    fn update_formation(
        &mut self,
        formation: &mut dyn Formation,
        stage: &mut Stage,
        time: f64,
        delta: f64,
    ) {
        let forward = direction(self.heading);
        let loop_length = self.config.loop_length.filter(|l| *l > 0.0);
        let withdrawing = self.config.withdraw.is_some();

        for member in formation.members() {
            let Some(elapsed) = member.elapsed_secs(time) else {
                continue;
            };
            let Some(speed) = stage.max_speed(member.entity) else {
                continue;
            };
            let speed = speed * REFERENCE_FRAME_RATE;

            if withdrawing {
                self.fly_withdrawal(member.entity, speed, stage, delta);
                continue;
            }

            let mut travelled = speed * elapsed;
            if let Some(length) = loop_length {
                travelled = travelled.rem_euclid(length);
            }
            let position = member.start + forward * travelled;
            stage.set_pose(member.entity, position, self.heading);
            if self.sightings.should_cull(stage, member.entity, position)
                && loop_length.is_none()
                && elapsed * 1000.0 > LINEAR_CULL_GRACE_MS
            {
                stage.cull_ship(member.entity);
            }
        }

        self.withdrawals.retain(|entity, _| stage.is_alive(*entity));
        self.sightings.forget_dead(stage);
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use skyward_core::components::CollisionLayer;
    use skyward_core::config::{
        ExplicitConfig, FormationConfig, GridConfig, GridRows, LinearConfig, Placement,
        ShipConfig, WithdrawConfig,
    };
    use skyward_core::events::WaveEvent;

    use super::*;
    use crate::formation::{self, FormationSetup};
    use crate::stage::{FixedPoint, StageConfig};

    fn single_ship(x: f64, y: f64) -> FormationSetup {
        FormationSetup {
            config: FormationConfig::Explicit(ExplicitConfig {
                placements: vec![Placement {
                    x,
                    y,
                    config: 0,
                    delay_ms: 0.0,
                }],
            }),
            ships: vec![ShipConfig::default()],
            layer: CollisionLayer::Hostile,
        }
    }

    #[test]
    fn test_aims_once_at_spawn() {
        let mut stage = Stage::new(StageConfig::default());
        stage.set_target(FixedPoint(DVec2::new(400.0, 600.0)));
        let mut formation = formation::build(&single_ship(0.5, 0.0));
        formation.spawn(&mut stage, 0.0);

        let mut maneuver = LinearManeuver::new(LinearConfig {
            angle_deg: 0.0,
            aim_at_target: true,
            ..Default::default()
        });
        maneuver.on_spawn(formation.as_ref(), &mut stage, 0.0);
        assert!((maneuver.heading() - FRAC_PI_2).abs() < 1e-12);

        // Moving the target later does not re-aim.
        stage.set_target(FixedPoint(DVec2::new(0.0, 0.0)));
        maneuver.update_formation(formation.as_mut(), &mut stage, 500.0, 500.0);
        assert!((maneuver.heading() - FRAC_PI_2).abs() < 1e-12);
        let pose = stage.transform(formation.members()[0].entity).unwrap();
        assert!((pose.position - DVec2::new(400.0, 60.0)).length() < 1e-9);
    }

    #[test]
    fn test_loop_length_wraps_travel() {
        let mut stage = Stage::new(StageConfig::default());
        let mut formation = formation::build(&single_ship(0.5, 0.0));
        formation.spawn(&mut stage, 0.0);
        let mut maneuver = LinearManeuver::new(LinearConfig {
            loop_length: Some(100.0),
            ..Default::default()
        });
        maneuver.on_spawn(formation.as_ref(), &mut stage, 0.0);

        // 120 px/s for 1s = 120 px, wrapped to 20.
        maneuver.update_formation(formation.as_mut(), &mut stage, 1000.0, 16.0);
        let pose = stage.transform(formation.members()[0].entity).unwrap();
        assert!((pose.position.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_withdraw_turns_toward_nearer_side() {
        let mut stage = Stage::new(StageConfig::default());
        let mut formation = formation::build(&single_ship(0.25, 0.0));
        formation.spawn(&mut stage, 0.0);
        let mut maneuver = LinearManeuver::new(LinearConfig {
            withdraw: Some(WithdrawConfig {
                min_fraction: 0.1,
                max_fraction: 0.1,
                turn_rate_deg: 90.0,
            }),
            ..Default::default()
        });
        maneuver.on_spawn(formation.as_ref(), &mut stage, 0.0);
        let entity = formation.members()[0].entity;

        let mut time = 0.0;
        let mut last = FRAC_PI_2;
        for _ in 0..120 {
            time += 16.0;
            maneuver.update_formation(formation.as_mut(), &mut stage, time, 16.0);
            let Some(pose) = stage.transform(entity) else {
                break;
            };
            // Never snaps: at most 90 deg/s * 16 ms per frame.
            assert!((pose.rotation - last).abs() <= FRAC_PI_2 * 0.016 + 1e-9);
            last = pose.rotation;
        }
        // Left half of the screen retreats toward PI (leftward).
        assert!(last > FRAC_PI_2);
    }

    #[test]
    fn test_staged_rows_survive_until_seen() {
        let mut stage = Stage::new(StageConfig::default());
        let setup = FormationSetup {
            config: FormationConfig::Grid(GridConfig {
                rows: GridRows::Counts(vec![1, 1, 1, 1]),
                ..Default::default()
            }),
            ships: vec![ShipConfig {
                speed: 0.5,
                ..Default::default()
            }],
            layer: CollisionLayer::Hostile,
        };
        let mut formation = formation::build(&setup);
        formation.spawn(&mut stage, 0.0);
        assert_eq!(formation.members()[3].start.y, -240.0);
        let mut maneuver = LinearManeuver::new(LinearConfig::default());
        maneuver.on_spawn(formation.as_ref(), &mut stage, 0.0);

        let culled = |stage: &mut Stage| {
            stage
                .drain_events()
                .iter()
                .filter(|e| matches!(e, WaveEvent::ShipCulled { .. }))
                .count()
        };

        // 30 px/s: the rear row is still above the screen after 5 s.
        let mut time = 0.0;
        while time < 5000.0 {
            time += 16.0;
            maneuver.update_formation(formation.as_mut(), &mut stage, time, 16.0);
        }
        assert_eq!(culled(&mut stage), 0);
        assert!(formation.members().iter().all(|m| stage.is_alive(m.entity)));

        // Every row eventually leaves through the bottom.
        while time < 36_000.0 {
            time += 16.0;
            maneuver.update_formation(formation.as_mut(), &mut stage, time, 16.0);
        }
        assert_eq!(culled(&mut stage), 4);
    }
}
