//! Path segment resolution.
//!
//! A segment resolves to a waypoint given the anchor's current state. Some
//! segments also contribute a per-frame offset or a facing override, which
//! keep applying after the waypoint itself has been reached.

use std::f64::consts::TAU;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::types::ScreenBounds;

/// Everything a segment may look at when it is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct SegmentContext {
    pub anchor: DVec2,
    /// Current travel heading of the anchor.
    pub heading: f64,
    pub bounds: ScreenBounds,
    /// Tracked target (usually the player), if one is alive.
    pub target: Option<DVec2>,
    /// Time since the path started (ms).
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PathSegment {
    /// Fixed point in fractional screen coordinates.
    Point { x: f64, y: f64 },
    /// Fractional-screen offset from wherever the anchor is.
    Relative { dx: f64, dy: f64 },
    /// Head `approach` of the way from the anchor toward the target.
    /// Falls back to a fixed point when there is no target.
    Intercept {
        approach: f64,
        fallback_x: f64,
        fallback_y: f64,
    },
    /// Sideways sinusoidal weave around the travel line.
    Wiggle {
        base: Box<PathSegment>,
        amplitude: f64,
        /// Angular frequency in rad/s.
        frequency: f64,
    },
    /// Circle around the anchor, starting from zero offset.
    Orbit {
        base: Box<PathSegment>,
        radius: f64,
        period_ms: f64,
    },
    /// Hold a fixed facing regardless of heading.
    Facing { base: Box<PathSegment>, degrees: f64 },
}

impl PathSegment {
    /// Resolve the waypoint this segment steers toward.
    pub fn resolve(&self, ctx: &SegmentContext) -> DVec2 {
        match self {
            PathSegment::Point { x, y } => ctx.bounds.point(*x, *y),
            PathSegment::Relative { dx, dy } => ctx.anchor + ctx.bounds.point(*dx, *dy),
            PathSegment::Intercept {
                approach,
                fallback_x,
                fallback_y,
            } => match ctx.target {
                Some(target) => ctx.anchor + (target - ctx.anchor) * *approach,
                None => ctx.bounds.point(*fallback_x, *fallback_y),
            },
            PathSegment::Wiggle { base, .. }
            | PathSegment::Orbit { base, .. }
            | PathSegment::Facing { base, .. } => base.resolve(ctx),
        }
    }

    /// Additive offset applied on top of the anchor this frame.
    pub fn offset(&self, ctx: &SegmentContext) -> DVec2 {
        match self {
            PathSegment::Wiggle {
                base,
                amplitude,
                frequency,
            } => {
                let normal = DVec2::new(-ctx.heading.sin(), ctx.heading.cos());
                let t = ctx.elapsed_ms / 1000.0;
                base.offset(ctx) + normal * (t * frequency).sin() * *amplitude
            }
            PathSegment::Orbit {
                base,
                radius,
                period_ms,
            } => {
                if *period_ms <= 0.0 {
                    return base.offset(ctx);
                }
                let theta = ctx.elapsed_ms / period_ms * TAU;
                base.offset(ctx) + DVec2::new(theta.cos() - 1.0, theta.sin()) * *radius
            }
            PathSegment::Facing { base, .. } => base.offset(ctx),
            _ => DVec2::ZERO,
        }
    }

    /// Facing override for members, if this segment imposes one.
    pub fn rotation(&self, ctx: &SegmentContext) -> Option<f64> {
        match self {
            PathSegment::Facing { degrees, .. } => Some(degrees.to_radians()),
            PathSegment::Wiggle { base, .. } | PathSegment::Orbit { base, .. } => {
                base.rotation(ctx)
            }
            _ => None,
        }
    }

    /// True if resolution depends on the tracked target.
    pub fn is_dynamic(&self) -> bool {
        match self {
            PathSegment::Intercept { .. } => true,
            PathSegment::Wiggle { base, .. }
            | PathSegment::Orbit { base, .. }
            | PathSegment::Facing { base, .. } => base.is_dynamic(),
            _ => false,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            PathSegment::Intercept { approach, .. } if !(0.0..=1.0).contains(approach) => {
                Err(format!("intercept approach {} outside [0, 1]", approach))
            }
            PathSegment::Wiggle { base, .. }
            | PathSegment::Orbit { base, .. }
            | PathSegment::Facing { base, .. } => base.validate(),
            _ => Ok(()),
        }
    }
}
