//! Shared member bookkeeping for every formation.
//!
//! Owns the member list and the fire schedule. Fire orders are plain data
//! in a `DeferredQueue`; a continuous order reschedules itself only while
//! its ship is still alive.

use glam::DVec2;
use hecs::Entity;
use rand::Rng;
use tracing::trace;

use skyward_core::components::CollisionLayer;
use skyward_core::config::{FireMode, ShipConfig};
use skyward_core::constants::MIN_FIRE_INTERVAL_MS;

use crate::deferred::DeferredQueue;
use crate::formation::FormationMember;
use crate::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq)]
struct FireOrder {
    entity: Entity,
    /// Reschedule interval for continuous fire.
    repeat_ms: Option<f64>,
}

pub struct Roster {
    members: Vec<FormationMember>,
    fire: DeferredQueue<FireOrder>,
    ships: Vec<ShipConfig>,
    layer: CollisionLayer,
    next_slot: usize,
}

impl Roster {
    pub fn new(ships: Vec<ShipConfig>, layer: CollisionLayer) -> Self {
        Self {
            members: Vec::new(),
            fire: DeferredQueue::new(),
            ships,
            layer,
            next_slot: 0,
        }
    }

    pub fn members(&self) -> &[FormationMember] {
        &self.members
    }

    /// Ship config by index, cycling through the list. Directives without
    /// ship configs get the default ship.
    pub fn ship(&self, index: usize) -> ShipConfig {
        if self.ships.is_empty() {
            ShipConfig::default()
        } else {
            self.ships[index % self.ships.len()].clone()
        }
    }

    pub fn ship_count(&self) -> usize {
        self.ships.len()
    }

    /// Construct a ship and add it to the roster. `appear_delay` pushes the
    /// member's spawn time (and its first shot) into the future.
    pub fn enlist(
        &mut self,
        stage: &mut Stage,
        time: f64,
        appear_delay: f64,
        position: DVec2,
        config: &ShipConfig,
    ) -> Option<&mut FormationMember> {
        let entity = stage.spawn_ship(position, config, self.layer)?;
        let slot = self.next_slot;
        self.next_slot += 1;
        self.schedule_fire(stage, entity, config, appear_delay);
        self.members
            .push(FormationMember::new(entity, time + appear_delay, position, slot));
        self.members.last_mut()
    }

    fn schedule_fire(
        &mut self,
        stage: &mut Stage,
        entity: Entity,
        config: &ShipConfig,
        lead_ms: f64,
    ) {
        let Some(weapon) = &config.weapon else {
            return;
        };
        let chance = if weapon.chance.is_finite() {
            weapon.chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if !stage.rng.gen_bool(chance) {
            return;
        }
        match weapon.mode {
            FireMode::Volley {
                shots,
                initial_delay_ms,
                spacing_ms,
            } => {
                for shot in 0..shots {
                    let delay = lead_ms + initial_delay_ms + shot as f64 * spacing_ms;
                    self.fire.schedule(
                        delay,
                        FireOrder {
                            entity,
                            repeat_ms: None,
                        },
                    );
                }
            }
            FireMode::Continuous {
                initial_delay_ms,
                interval_ms,
            } => {
                self.fire.schedule(
                    lead_ms + initial_delay_ms,
                    FireOrder {
                        entity,
                        repeat_ms: Some(interval_ms.max(MIN_FIRE_INTERVAL_MS)),
                    },
                );
            }
        }
    }

    /// Drop members whose ship died or vanished since the last tick.
    pub fn reap(&mut self, stage: &Stage) {
        self.members.retain(|m| stage.is_alive(m.entity));
    }

    /// Run due fire orders.
    pub fn tick_fire(&mut self, stage: &mut Stage, delta: f64) {
        for order in self.fire.advance(delta) {
            if !stage.fire(order.entity) {
                trace!("Dropping fire order for dead ship {:?}", order.entity);
                continue;
            }
            if let Some(interval) = order.repeat_ms {
                self.fire.schedule(interval, order);
            }
        }
    }

    /// Roster maintenance: reap, then fire.
    pub fn maintain(&mut self, stage: &mut Stage, delta: f64) {
        self.reap(stage);
        self.tick_fire(stage, delta);
    }

    pub fn destroy(&mut self, stage: &mut Stage) {
        self.fire.cancel_all();
        for member in self.members.drain(..) {
            stage.despawn_ship(member.entity);
        }
    }
}
