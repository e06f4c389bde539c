//! Boss tactic: each member runs its own move, aim, attack cycle.

use std::collections::HashMap;

use hecs::Entity;
use tracing::debug;

use skyward_boss_ai::fsm::{evaluate, plan_move, BossContext, BossPhase, MovePlan};
use skyward_boss_ai::profiles::BossProfile;
use skyward_core::config::BossConfig;
use skyward_core::constants::REFERENCE_FRAME_RATE;

use crate::formation::Formation;
use crate::stage::Stage;
use crate::tactic::Maneuver;

#[derive(Debug, Clone, Copy)]
struct BossBrain {
    phase: BossPhase,
    phase_started: f64,
    plan: Option<MovePlan>,
    profile: BossProfile,
}

pub struct BossManeuver {
    config: BossConfig,
    brains: HashMap<Entity, BossBrain>,
}

impl BossManeuver {
    pub fn new(config: BossConfig) -> Self {
        Self {
            config,
            brains: HashMap::new(),
        }
    }

    /// Current phase of a boss, if it is still tracked.
    pub fn phase_of(&self, entity: Entity) -> Option<BossPhase> {
        self.brains.get(&entity).map(|b| b.phase)
    }

    /// Fresh brain with an initial move planned from the current position.
    fn wake(&self, entity: Entity, stage: &mut Stage, time: f64) -> Option<BossBrain> {
        let speed = stage.max_speed(entity)? * REFERENCE_FRAME_RATE;
        let position = stage.transform(entity)?.position;
        let profile = BossProfile::from_config(&self.config, speed);
        let plan = plan_move(position, stage.bounds, &profile, &mut stage.rng);
        debug!(
            "Boss {:?} awake, first move to ({:.0}, {:.0})",
            entity, plan.to.x, plan.to.y
        );
        Some(BossBrain {
            phase: BossPhase::Moving,
            phase_started: time,
            plan: Some(plan),
            profile,
        })
    }
}

impl Maneuver for BossManeuver {
    fn name(&self) -> &'static str {
        "boss"
    }

    fn on_spawn(&mut self, formation: &dyn Formation, stage: &mut Stage, time: f64) {
        for member in formation.members() {
            if let Some(brain) = self.wake(member.entity, stage, time) {
                self.brains.insert(member.entity, brain);
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
        self.brains.retain(|entity, _| stage.is_alive(*entity));
        let target = stage.target_position();

        for member in formation.members() {
            let entity = member.entity;
            if !self.brains.contains_key(&entity) {
                match self.wake(entity, stage, time) {
                    Some(brain) => self.brains.insert(entity, brain),
                    None => continue,
                };
            }
            let Some(pose) = stage.transform(entity) else {
                continue;
            };
            let Some(brain) = self.brains.get_mut(&entity) else {
                continue;
            };

            let ctx = BossContext {
                phase: brain.phase,
                position: pose.position,
                rotation: pose.rotation,
                target,
                elapsed_in_phase_ms: time - brain.phase_started,
                delta_ms: delta,
                plan: brain.plan,
            };
            let update = evaluate(&ctx, &brain.profile);
            stage.set_pose(entity, update.position, update.rotation);
            if update.fire {
                stage.fire(entity);
            }

            if update.phase_changed {
                debug!(
                    "Boss {:?} {:?} -> {:?}",
                    entity, brain.phase, update.new_phase
                );
                brain.phase = update.new_phase;
                brain.phase_started = time;
                brain.plan = match update.new_phase {
                    BossPhase::Moving => Some(plan_move(
                        update.position,
                        stage.bounds,
                        &brain.profile,
                        &mut stage.rng,
                    )),
                    _ => None,
                };
            }
        }
    }
}
