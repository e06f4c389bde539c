//! Path-following tactic.
//!
//! The whole formation follows one shared anchor. Each tick the anchor
//! spends a distance budget (slowest live member's speed times the frame
//! time) walking toward the resolved waypoint. A waypoint is resolved once,
//! when its leg begins, so a target-relative waypoint is a ballistic aim
//! point rather than a homing one. Members are placed at their own spawn
//! position plus the anchor's net displacement, which keeps the formation
//! rigid no matter which members survive.

use std::f64::consts::FRAC_PI_2;

use glam::DVec2;
use tracing::debug;

use skyward_core::config::{PathConfig, PathEnd};
use skyward_core::constants::{MEMBER_TURN_RATE, PATH_STARTUP_GRACE_MS, REFERENCE_FRAME_RATE};
use skyward_core::path::{PathSegment, SegmentContext};
use skyward_core::types::{direction, heading_of, rotate_towards};

use crate::formation::Formation;
use crate::stage::Stage;
use crate::tactic::{Maneuver, Sightings};

/// The anchor's walk along the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorState {
    pub current: DVec2,
    /// Where the anchor started. Displacement is measured from here.
    pub original: DVec2,
    /// Index of the segment being walked toward. Never decreases.
    pub target_index: usize,
    /// Waypoint of the current leg; `None` once the path is exhausted.
    pub resolved: Option<DVec2>,
    pub last_angle: f64,
    pub started: bool,
    pub started_at: f64,
}

impl Default for AnchorState {
    fn default() -> Self {
        Self {
            current: DVec2::ZERO,
            original: DVec2::ZERO,
            target_index: 0,
            resolved: None,
            last_angle: FRAC_PI_2,
            started: false,
            started_at: 0.0,
        }
    }
}

pub struct PathManeuver {
    segments: Vec<PathSegment>,
    on_end: PathEnd,
    anchor: AnchorState,
    offset: DVec2,
    sightings: Sightings,
}

impl PathManeuver {
    pub fn new(config: PathConfig) -> Self {
        Self {
            segments: config.segments,
            on_end: config.on_end,
            anchor: AnchorState::default(),
            offset: DVec2::ZERO,
            sightings: Sightings::default(),
        }
    }

    pub fn anchor(&self) -> &AnchorState {
        &self.anchor
    }

    /// Net movement applied to every member this tick.
    pub fn displacement(&self) -> DVec2 {
        self.anchor.current + self.offset - self.anchor.original
    }

    /// Segment for a target index, honoring the loop policy.
    fn segment_at(&self, index: usize) -> Option<&PathSegment> {
        let len = self.segments.len();
        if index < len {
            return self.segments.get(index);
        }
        match self.on_end {
            PathEnd::Loop if len >= 2 => self.segments.get(1 + (index - 1) % (len - 1)),
            _ => None,
        }
    }

    fn context(&self, stage: &Stage, time: f64) -> SegmentContext {
        SegmentContext {
            anchor: self.anchor.current,
            heading: self.anchor.last_angle,
            bounds: stage.bounds,
            target: stage.target_position(),
            elapsed_ms: if self.anchor.started {
                time - self.anchor.started_at
            } else {
                0.0
            },
        }
    }

    /// The first segment is the spawn anchor; the walk starts toward the second.
    fn begin(&mut self, stage: &Stage, time: f64) {
        let origin = match self.segments.first() {
            Some(first) => first.resolve(&self.context(stage, time)),
            None => DVec2::ZERO,
        };
        self.anchor = AnchorState {
            current: origin,
            original: origin,
            target_index: 0,
            resolved: None,
            last_angle: FRAC_PI_2,
            started: true,
            started_at: time,
        };
        self.advance_target(stage, time);
        if let Some(target) = self.anchor.resolved {
            self.anchor.last_angle = heading_of(target - origin, FRAC_PI_2);
        }
    }

    /// Move on to the next segment and resolve its waypoint, once.
    fn advance_target(&mut self, stage: &Stage, time: f64) {
        self.anchor.target_index += 1;
        let ctx = self.context(stage, time);
        self.anchor.resolved = self
            .segment_at(self.anchor.target_index)
            .map(|segment| segment.resolve(&ctx));
        match self.anchor.resolved {
            Some(target) => debug!(
                "Path leg {} resolved to ({:.1}, {:.1})",
                self.anchor.target_index, target.x, target.y
            ),
            None => debug!("Path exhausted after {} legs", self.anchor.target_index - 1),
        }
    }

    /// Spend `budget` px walking the anchor along the path.
    fn walk(&mut self, stage: &Stage, time: f64, mut budget: f64) {
        // Consecutive zero-length legs. A full lap of them means the path
        // cannot move the anchor at all.
        let mut idle_legs = 0;
        while budget > 0.0 {
            let Some(target) = self.anchor.resolved else {
                if self.on_end == PathEnd::Continue {
                    self.anchor.current += direction(self.anchor.last_angle) * budget;
                }
                return;
            };
            let to_target = target - self.anchor.current;
            let distance = to_target.length();
            self.anchor.last_angle = heading_of(to_target, self.anchor.last_angle);
            if budget < distance {
                self.anchor.current += to_target / distance * budget;
                return;
            }
            self.anchor.current = target;
            budget -= distance;
            self.advance_target(stage, time);

            idle_legs = if distance > 0.0 { 0 } else { idle_legs + 1 };
            if idle_legs > self.segments.len() {
                return;
            }
        }
    }
}

/// Path speed (px/s): the slowest live member sets the pace.
pub fn formation_speed(formation: &dyn Formation, stage: &Stage) -> Option<f64> {
    formation
        .members()
        .iter()
        .filter_map(|m| stage.max_speed(m.entity))
        .min_by(|a, b| a.total_cmp(b))
        .map(|speed| speed * REFERENCE_FRAME_RATE)
}

impl Maneuver for PathManeuver {
    fn name(&self) -> &'static str {
        "path"
    }

    fn update_formation(
        &mut self,
        formation: &mut dyn Formation,
        stage: &mut Stage,
        time: f64,
        delta: f64,
    ) {
        if !self.anchor.started {
            self.begin(stage, time);
        }
        let delta_s = delta / 1000.0;
        if let Some(speed) = formation_speed(formation, stage) {
            self.walk(stage, time, speed * delta_s);
        }

        let ctx = self.context(stage, time);
        let active = self
            .segment_at(self.anchor.target_index)
            .or(self.segments.last());
        let offset = active.map(|s| s.offset(&ctx)).unwrap_or(DVec2::ZERO);
        let facing = active
            .and_then(|s| s.rotation(&ctx))
            .unwrap_or(self.anchor.last_angle);
        self.offset = offset;

        let displacement = self.displacement();
        let running_ms = time - self.anchor.started_at;
        let max_turn = MEMBER_TURN_RATE * delta_s;

        for member in formation.members() {
            // Staggered members hold still until their own spawn time.
            if time < member.spawn_time {
                continue;
            }
            let Some(pose) = stage.transform(member.entity) else {
                continue;
            };
            let position = member.start + displacement;
            let rotation = rotate_towards(pose.rotation, facing, max_turn);
            if !stage.set_pose(member.entity, position, rotation) {
                continue;
            }
            if self.sightings.should_cull(stage, member.entity, position)
                && running_ms > PATH_STARTUP_GRACE_MS
            {
                stage.cull_ship(member.entity);
            }
        }
        self.sightings.forget_dead(stage);
    }
}
