//! The world context shared by every layer of the engine.
//!
//! `Stage` owns the hecs world, the seeded RNG and the outgoing event
//! buffer, plus the two host-supplied collaborators: the ship factory and
//! the target provider. All entity mutation goes through it so stale
//! handles are checked in one place.

use glam::DVec2;
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{trace, warn};

use skyward_core::components::{CollisionLayer, Ship, Transform};
use skyward_core::config::ShipConfig;
use skyward_core::constants::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH, SPAWN_ROTATION};
use skyward_core::error::SpawnError;
use skyward_core::events::WaveEvent;
use skyward_core::types::ScreenBounds;

/// Configuration for a new stage.
pub struct StageConfig {
    pub width: f64,
    pub height: f64,
    /// RNG seed for determinism. Same seed = same waves.
    pub seed: u64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
            seed: 42,
        }
    }
}

/// Locates whatever hostile ships should aim at (usually the player).
pub trait TargetProvider {
    fn locate(&self, world: &World) -> Option<DVec2>;
}

/// Follows an entity's `Transform`. Yields nothing once it is despawned.
pub struct TrackedEntity(pub Entity);

impl TargetProvider for TrackedEntity {
    fn locate(&self, world: &World) -> Option<DVec2> {
        world.get::<&Transform>(self.0).ok().map(|t| t.position)
    }
}

/// A target that never moves.
pub struct FixedPoint(pub DVec2);

impl TargetProvider for FixedPoint {
    fn locate(&self, _world: &World) -> Option<DVec2> {
        Some(self.0)
    }
}

/// Builds ship entities from authored configs.
pub trait ShipFactory {
    fn spawn(
        &self,
        world: &mut World,
        position: DVec2,
        config: &ShipConfig,
        layer: CollisionLayer,
    ) -> Result<Entity, SpawnError>;
}

/// Spawns `(Transform, Ship, CollisionLayer)` bundles.
pub struct StandardShipFactory;

impl ShipFactory for StandardShipFactory {
    fn spawn(
        &self,
        world: &mut World,
        position: DVec2,
        config: &ShipConfig,
        layer: CollisionLayer,
    ) -> Result<Entity, SpawnError> {
        if !position.is_finite() {
            return Err(SpawnError::NonFinitePosition {
                x: position.x,
                y: position.y,
            });
        }
        if !config.speed.is_finite() || config.speed < 0.0 {
            return Err(SpawnError::InvalidSpeed {
                kind: config.kind.clone(),
                speed: config.speed,
            });
        }
        Ok(world.spawn((
            Transform {
                position,
                rotation: SPAWN_ROTATION,
            },
            Ship {
                kind: config.kind.clone(),
                max_speed: config.speed,
                mass: config.mass,
                scale: 1.0,
                active: true,
            },
            layer,
        )))
    }
}

pub struct Stage {
    pub world: World,
    pub rng: ChaCha8Rng,
    pub bounds: ScreenBounds,
    pub events: Vec<WaveEvent>,
    factory: Box<dyn ShipFactory>,
    target: Option<Box<dyn TargetProvider>>,
}

impl Stage {
    pub fn new(config: StageConfig) -> Self {
        Self {
            world: World::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            bounds: ScreenBounds::new(config.width, config.height),
            events: Vec::new(),
            factory: Box::new(StandardShipFactory),
            target: None,
        }
    }

    pub fn set_factory(&mut self, factory: impl ShipFactory + 'static) {
        self.factory = Box::new(factory);
    }

    pub fn set_target(&mut self, target: impl TargetProvider + 'static) {
        self.target = Some(Box::new(target));
    }

    /// Current position of the tracked target, if any.
    pub fn target_position(&self) -> Option<DVec2> {
        self.target.as_ref().and_then(|t| t.locate(&self.world))
    }

    /// Construct a ship. Factory failures are logged and yield `None`.
    pub fn spawn_ship(
        &mut self,
        position: DVec2,
        config: &ShipConfig,
        layer: CollisionLayer,
    ) -> Option<Entity> {
        match self.factory.spawn(&mut self.world, position, config, layer) {
            Ok(entity) => {
                self.events.push(WaveEvent::ShipSpawned {
                    entity,
                    kind: config.kind.clone(),
                });
                Some(entity)
            }
            Err(e) => {
                warn!("Could not spawn `{}`: {}", config.kind, e);
                None
            }
        }
    }

    /// An entity is alive while it exists and its ship is active.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.world
            .get::<&Ship>(entity)
            .map(|ship| ship.active)
            .unwrap_or(false)
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    /// Top speed in px per reference frame, for live ships only.
    pub fn max_speed(&self, entity: Entity) -> Option<f64> {
        self.world
            .get::<&Ship>(entity)
            .ok()
            .filter(|ship| ship.active)
            .map(|ship| ship.max_speed)
    }

    /// Write a pose. Stale or dead handles are skipped; returns whether the
    /// write happened.
    pub fn set_pose(&mut self, entity: Entity, position: DVec2, rotation: f64) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        match self.world.get::<&mut Transform>(entity) {
            Ok(mut transform) => {
                transform.position = position;
                transform.rotation = rotation;
                true
            }
            Err(_) => false,
        }
    }

    /// Fire the ship's weapon. The host turns `Shot` events into projectiles.
    pub fn fire(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let Some(transform) = self.transform(entity) else {
            return false;
        };
        trace!("Ship {:?} fired", entity);
        self.events.push(WaveEvent::Shot {
            entity,
            origin: transform.position,
            heading: transform.rotation,
        });
        true
    }

    /// Remove a ship from the world. Unknown handles are ignored.
    pub fn despawn_ship(&mut self, entity: Entity) {
        let _ = self.world.despawn(entity);
    }

    /// Remove a ship that flew off the playfield.
    pub fn cull_ship(&mut self, entity: Entity) {
        if self.world.despawn(entity).is_ok() {
            self.events.push(WaveEvent::ShipCulled { entity });
        }
    }

    /// Take all events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<WaveEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(StageConfig::default())
    }
}
