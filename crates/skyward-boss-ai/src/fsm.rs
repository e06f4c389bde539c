//! Boss behavior finite state machine.
//!
//! Pure functions that compute phase transitions, pose and fire decisions
//! for a boss given its current phase and situation. No ECS dependency;
//! operates on plain data. The cycle is strictly
//! `Moving -> Rotating -> Attacking -> Moving`.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec2;
use rand::Rng;

use skyward_core::types::{heading_of, rotate_towards, wrap_angle, ScreenBounds};

use crate::profiles::BossProfile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BossPhase {
    /// Travelling to a random point at constant velocity.
    #[default]
    Moving,
    /// Turning to face the target.
    Rotating,
    /// Firing for a fixed duration.
    Attacking,
}

/// A straight constant-velocity move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovePlan {
    pub from: DVec2,
    pub to: DVec2,
    pub duration_ms: f64,
}

/// Input to the boss FSM for a single boss.
pub struct BossContext {
    pub phase: BossPhase,
    pub position: DVec2,
    pub rotation: f64,
    pub target: Option<DVec2>,
    /// Time since the current phase began, including this frame (ms).
    pub elapsed_in_phase_ms: f64,
    pub delta_ms: f64,
    /// Active move; required while `Moving`.
    pub plan: Option<MovePlan>,
}

/// Output from the boss FSM.
pub struct BossUpdate {
    pub new_phase: BossPhase,
    pub position: DVec2,
    pub rotation: f64,
    pub phase_changed: bool,
    /// Fire this frame.
    pub fire: bool,
}

/// Pick a random point within `move_radius` of `position`, clamped to the
/// upper band of the screen, and time the move at the profile speed.
pub fn plan_move<R: Rng>(
    position: DVec2,
    bounds: ScreenBounds,
    profile: &BossProfile,
    rng: &mut R,
) -> MovePlan {
    let angle: f64 = rng.gen_range(0.0..TAU);
    let radius: f64 = if profile.move_radius > 0.0 {
        rng.gen_range(0.0..=profile.move_radius)
    } else {
        0.0
    };
    let candidate = position + DVec2::new(angle.cos(), angle.sin()) * radius;

    let margin = profile.edge_margin;
    let max_x = (bounds.width - margin).max(margin);
    let max_y = (bounds.height * profile.upper_fraction).max(margin);
    let to = DVec2::new(candidate.x.clamp(margin, max_x), candidate.y.clamp(margin, max_y));

    let distance = position.distance(to);
    MovePlan {
        from: position,
        to,
        duration_ms: distance / profile.speed * 1000.0,
    }
}

/// Evaluate the FSM for one boss.
pub fn evaluate(ctx: &BossContext, profile: &BossProfile) -> BossUpdate {
    match ctx.phase {
        BossPhase::Moving => evaluate_moving(ctx),
        BossPhase::Rotating => evaluate_rotating(ctx, profile),
        BossPhase::Attacking => evaluate_attacking(ctx, profile),
    }
}

fn evaluate_moving(ctx: &BossContext) -> BossUpdate {
    let Some(plan) = ctx.plan else {
        // No plan yet: nothing to traverse, go straight to aiming.
        return BossUpdate {
            new_phase: BossPhase::Rotating,
            position: ctx.position,
            rotation: ctx.rotation,
            phase_changed: true,
            fire: false,
        };
    };

    if ctx.elapsed_in_phase_ms >= plan.duration_ms {
        return BossUpdate {
            new_phase: BossPhase::Rotating,
            position: plan.to,
            rotation: ctx.rotation,
            phase_changed: true,
            fire: false,
        };
    }

    let t = (ctx.elapsed_in_phase_ms / plan.duration_ms).clamp(0.0, 1.0);
    BossUpdate {
        new_phase: BossPhase::Moving,
        position: plan.from.lerp(plan.to, t),
        rotation: ctx.rotation,
        phase_changed: false,
        fire: false,
    }
}

fn evaluate_rotating(ctx: &BossContext, profile: &BossProfile) -> BossUpdate {
    let desired = match ctx.target {
        Some(target) => heading_of(target - ctx.position, FRAC_PI_2),
        None => FRAC_PI_2,
    };
    let step = profile.turn_rate * ctx.delta_ms / 1000.0;
    let rotation = rotate_towards(ctx.rotation, desired, step);
    let aimed = wrap_angle(desired - rotation).abs() <= profile.tolerance;

    BossUpdate {
        new_phase: if aimed { BossPhase::Attacking } else { BossPhase::Rotating },
        position: ctx.position,
        rotation,
        phase_changed: aimed,
        fire: false,
    }
}

fn evaluate_attacking(ctx: &BossContext, profile: &BossProfile) -> BossUpdate {
    if ctx.elapsed_in_phase_ms >= profile.fire_duration_ms {
        return BossUpdate {
            new_phase: BossPhase::Moving,
            position: ctx.position,
            rotation: ctx.rotation,
            phase_changed: true,
            fire: false,
        };
    }

    BossUpdate {
        new_phase: BossPhase::Attacking,
        position: ctx.position,
        rotation: ctx.rotation,
        phase_changed: false,
        fire: shot_due(ctx.elapsed_in_phase_ms, ctx.delta_ms, profile.fire_interval_ms),
    }
}

/// True if a fire-interval boundary falls inside this frame. The first
/// frame of the attack always fires.
fn shot_due(elapsed_ms: f64, delta_ms: f64, interval_ms: f64) -> bool {
    let before = elapsed_ms - delta_ms;
    if before <= 0.0 {
        return true;
    }
    (elapsed_ms / interval_ms).floor() > (before / interval_ms).floor()
}
