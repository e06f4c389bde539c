//! Engine constants and tuning parameters.

use std::f64::consts::PI;

/// Frame rate that ship speeds are authored against. A ship speed of 2.0
/// means 2 px per frame at this rate, i.e. 120 px/s.
pub const REFERENCE_FRAME_RATE: f64 = 60.0;

// --- Screen ---

pub const DEFAULT_SCREEN_WIDTH: f64 = 800.0;
pub const DEFAULT_SCREEN_HEIGHT: f64 = 600.0;

/// Distance above the top edge at which descending formations are staged.
pub const SPAWN_BUFFER: f64 = 60.0;

/// Off-screen margin past which members are culled.
pub const CULL_BUFFER: f64 = 200.0;

// --- Ships ---

/// Default ship speed (px per reference frame).
pub const DEFAULT_SHIP_SPEED: f64 = 2.0;

/// Rotation given to freshly constructed ships (facing down the screen).
pub const SPAWN_ROTATION: f64 = PI / 2.0;

/// Max angular rate of formation members turning onto a new heading (rad/s).
pub const MEMBER_TURN_RATE: f64 = PI;

/// Floor applied to continuous fire intervals so a zero interval cannot spin.
pub const MIN_FIRE_INTERVAL_MS: f64 = 16.0;

// --- Grid ---

pub const DEFAULT_GRID_SPACING: f64 = 80.0;
pub const DEFAULT_GRID_ROW_SPACING: f64 = 60.0;
pub const DEFAULT_WOBBLE_AMPLITUDE: f64 = 4.0;
/// Range of per-member wobble angular speeds (rad/s).
pub const WOBBLE_SPEED_MIN: f64 = 1.5;
pub const WOBBLE_SPEED_MAX: f64 = 3.0;

// --- Line / sinus ---

pub const DEFAULT_LINE_SPACING: f64 = 64.0;
pub const DEFAULT_ZIGZAG: f64 = 20.0;
pub const DEFAULT_SINUS_AMPLITUDE: f64 = 80.0;
/// Angular frequency of sinusoidal motion (rad/s).
pub const DEFAULT_SINUS_FREQUENCY: f64 = 2.0;
pub const DEFAULT_PHASE_STEP: f64 = 0.5;

// --- Field ---

pub const DEFAULT_FIELD_WIDTH_FRACTION: f64 = 0.8;
pub const DEFAULT_FIELD_DEPTH: f64 = 200.0;
pub const DEFAULT_MASS_JITTER: f64 = 0.2;
/// Max per-member spin (rad/s).
pub const DEFAULT_SPIN_JITTER: f64 = 1.0;

// --- Tactics ---

/// Linear/sinus members are never culled during this startup window (ms).
pub const LINEAR_CULL_GRACE_MS: f64 = 1000.0;

/// Path-following members are never culled during this startup window (ms).
pub const PATH_STARTUP_GRACE_MS: f64 = 2000.0;

/// Default turn rate of withdrawing members (degrees/s).
pub const DEFAULT_WITHDRAW_TURN_RATE_DEG: f64 = 120.0;

// --- Boss ---

pub const BOSS_MIN_SPEED: f64 = 40.0;
pub const BOSS_MOVE_RADIUS: f64 = 200.0;
/// Bosses roam within this top fraction of the screen.
pub const BOSS_UPPER_FRACTION: f64 = 0.4;
/// Keep-out margin from the screen edges while roaming (px).
pub const BOSS_EDGE_MARGIN: f64 = 60.0;
pub const BOSS_TURN_RATE_DEG: f64 = 90.0;
pub const BOSS_AIM_TOLERANCE_DEG: f64 = 5.0;
pub const BOSS_FIRE_DURATION_MS: f64 = 2000.0;
pub const BOSS_FIRE_INTERVAL_MS: f64 = 250.0;
