//! Screen-space geometry helpers.
//!
//! All positions are `glam::DVec2` in pixels with y growing downward.
//! Angles are radians measured from +x toward +y, so `FRAC_PI_2` points
//! straight down the screen.

use std::f64::consts::{PI, TAU};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Visible playfield dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub width: f64,
    pub height: f64,
}

impl Default for ScreenBounds {
    fn default() -> Self {
        Self {
            width: crate::constants::DEFAULT_SCREEN_WIDTH,
            height: crate::constants::DEFAULT_SCREEN_HEIGHT,
        }
    }
}

impl ScreenBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Convert a fractional screen coordinate (0..1 on each axis) to pixels.
    pub fn point(&self, fx: f64, fy: f64) -> DVec2 {
        DVec2::new(fx * self.width, fy * self.height)
    }

    /// True if `p` lies outside the screen expanded by `buffer` on every side.
    pub fn is_outside(&self, p: DVec2, buffer: f64) -> bool {
        p.x < -buffer || p.x > self.width + buffer || p.y < -buffer || p.y > self.height + buffer
    }

    /// True if a descending entity has left through the bottom or a side.
    /// The top edge is ignored because formations stage above the screen.
    pub fn has_exited(&self, p: DVec2, buffer: f64) -> bool {
        p.y > self.height + buffer || p.x < -buffer || p.x > self.width + buffer
    }
}

/// Normalize an angle into (-PI, PI].
pub fn wrap_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a > PI {
        a - TAU
    } else {
        a
    }
}

/// Turn `current` toward `target` by at most `max_step` radians along the
/// shorter arc.
pub fn rotate_towards(current: f64, target: f64, max_step: f64) -> f64 {
    let diff = wrap_angle(target - current);
    if diff.abs() <= max_step {
        target
    } else {
        current + max_step.copysign(diff)
    }
}

/// Heading of a direction vector. Returns `fallback` for a zero vector.
pub fn heading_of(v: DVec2, fallback: f64) -> f64 {
    if v.length_squared() <= f64::EPSILON {
        fallback
    } else {
        v.y.atan2(v.x)
    }
}

/// Unit vector for a heading.
pub fn direction(heading: f64) -> DVec2 {
    DVec2::new(heading.cos(), heading.sin())
}
