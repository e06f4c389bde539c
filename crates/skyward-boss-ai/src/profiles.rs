//! Boss behavioral profiles.
//!
//! Resolves authored `BossConfig` values into the units the FSM works in.

use skyward_core::config::BossConfig;
use skyward_core::constants::{BOSS_EDGE_MARGIN, BOSS_MIN_SPEED};

/// Behavioral profile for one boss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossProfile {
    /// Roaming speed (px/s), never below `BOSS_MIN_SPEED`.
    pub speed: f64,
    /// Max distance of a single roaming move (px).
    pub move_radius: f64,
    /// Roam only within this top fraction of the screen.
    pub upper_fraction: f64,
    /// Keep-out margin from the screen edges (px).
    pub edge_margin: f64,
    /// Turn rate while aiming (rad/s).
    pub turn_rate: f64,
    /// Aim error accepted before attacking (rad).
    pub tolerance: f64,
    pub fire_duration_ms: f64,
    pub fire_interval_ms: f64,
}

impl BossProfile {
    /// Build a profile. `ship_speed` (px/s) is used when the config does not
    /// set its own roaming speed.
    pub fn from_config(config: &BossConfig, ship_speed: f64) -> Self {
        let speed = config.speed.unwrap_or(ship_speed);
        Self {
            speed: if speed.is_finite() { speed.max(BOSS_MIN_SPEED) } else { BOSS_MIN_SPEED },
            move_radius: config.move_radius.max(0.0),
            upper_fraction: config.upper_fraction.clamp(0.0, 1.0),
            edge_margin: BOSS_EDGE_MARGIN,
            turn_rate: config.turn_rate_deg.to_radians(),
            tolerance: config.tolerance_deg.to_radians().abs(),
            fire_duration_ms: config.fire_duration_ms.max(0.0),
            fire_interval_ms: config.fire_interval_ms.max(1.0),
        }
    }
}
