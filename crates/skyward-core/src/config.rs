//! Authored level data.
//!
//! Levels are plain serde data: an ordered list of wave steps, each a group
//! of spawn directives run in parallel. Every formation and tactic variant
//! carries only its own fields.

use serde::{Deserialize, Serialize};

use crate::components::CollisionLayer;
use crate::constants::*;
use crate::error::ConfigError;
use crate::path::PathSegment;

/// A complete level: ordered wave steps, optionally looping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    #[serde(rename = "loop", default)]
    pub looping: bool,
    pub steps: Vec<WaveStep>,
}

/// Directives that start together. The step ends when all of them finish.
pub type WaveStep = Vec<SpawnDirective>;

/// One formation, the tactic that moves it, and when to start it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnDirective {
    /// Missing tactics are skipped at runtime with a warning.
    #[serde(default)]
    pub tactic: Option<TacticConfig>,
    pub formation: FormationConfig,
    #[serde(default)]
    pub ships: Vec<ShipConfig>,
    #[serde(default)]
    pub start_delay_ms: f64,
    #[serde(default)]
    pub repeat: Option<Repeat>,
    #[serde(default)]
    pub layer: CollisionLayer,
}

/// Run the directive `count` times, waiting `interval_ms` after each
/// instance completes before starting the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Repeat {
    pub count: u32,
    #[serde(default)]
    pub interval_ms: f64,
}

/// Construction parameters for one ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    pub kind: String,
    /// Px per reference frame.
    pub speed: f64,
    pub mass: f64,
    pub weapon: Option<WeaponConfig>,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            kind: "drone".to_string(),
            speed: DEFAULT_SHIP_SPEED,
            mass: 1.0,
            weapon: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponConfig {
    /// Probability that a member armed with this weapon fires at all.
    #[serde(default = "default_fire_chance")]
    pub chance: f64,
    pub mode: FireMode,
}

fn default_fire_chance() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FireMode {
    /// A fixed number of shots with staggered delays.
    Volley {
        shots: u32,
        #[serde(default)]
        initial_delay_ms: f64,
        #[serde(default)]
        spacing_ms: f64,
    },
    /// Fire every `interval_ms` until the ship is gone.
    Continuous {
        #[serde(default)]
        initial_delay_ms: f64,
        interval_ms: f64,
    },
}

// --- Formations ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FormationConfig {
    Grid(GridConfig),
    Line(LineConfig),
    Sinus(SinusConfig),
    Field(FieldConfig),
    Explicit(ExplicitConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: GridRows,
    pub spacing: f64,
    pub row_spacing: f64,
    pub start_width_fraction: f64,
    pub end_width_fraction: f64,
    pub wobble_amplitude: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: GridRows::Counts(vec![1]),
            spacing: DEFAULT_GRID_SPACING,
            row_spacing: DEFAULT_GRID_ROW_SPACING,
            start_width_fraction: 0.5,
            end_width_fraction: 0.5,
            wobble_amplitude: DEFAULT_WOBBLE_AMPLITUDE,
        }
    }
}

/// Grid rows, either as member counts (ship configs cycle per row) or as
/// explicit cells where `null` leaves a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridRows {
    Counts(Vec<usize>),
    Cells(Vec<Vec<Option<ShipConfig>>>),
}

impl GridRows {
    pub fn row_count(&self) -> usize {
        match self {
            GridRows::Counts(rows) => rows.len(),
            GridRows::Cells(rows) => rows.len(),
        }
    }

    /// Number of ships the grid produces.
    pub fn member_count(&self) -> usize {
        match self {
            GridRows::Counts(rows) => rows.iter().sum(),
            GridRows::Cells(rows) => rows.iter().flatten().filter(|c| c.is_some()).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Fixed member count; when absent the row fills the screen width.
    pub count: Option<usize>,
    pub spacing: f64,
    /// Vertical offset applied to every other member.
    pub zigzag: f64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            count: None,
            spacing: DEFAULT_LINE_SPACING,
            zigzag: DEFAULT_ZIGZAG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinusConfig {
    pub count: Option<usize>,
    pub spacing: f64,
    pub zigzag: f64,
    pub amplitude: f64,
    /// Angular frequency in rad/s.
    pub frequency: f64,
    /// Phase added per member slot.
    pub phase_step: f64,
}

impl Default for SinusConfig {
    fn default() -> Self {
        Self {
            count: None,
            spacing: DEFAULT_LINE_SPACING,
            zigzag: DEFAULT_ZIGZAG,
            amplitude: DEFAULT_SINUS_AMPLITUDE,
            frequency: DEFAULT_SINUS_FREQUENCY,
            phase_step: DEFAULT_PHASE_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub count: usize,
    /// Fraction of the screen width the scatter is centered in.
    pub width_fraction: f64,
    /// Vertical scatter above the spawn line (px).
    pub depth: f64,
    /// Weighted ship variants. Empty means cycle through the ship list.
    pub variants: Vec<FieldVariant>,
    /// Relative mass jitter, e.g. 0.2 for +/-20%.
    pub mass_jitter: f64,
    /// Max spin in rad/s.
    pub spin_jitter: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            count: 8,
            width_fraction: DEFAULT_FIELD_WIDTH_FRACTION,
            depth: DEFAULT_FIELD_DEPTH,
            variants: Vec::new(),
            mass_jitter: DEFAULT_MASS_JITTER,
            spin_jitter: DEFAULT_SPIN_JITTER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldVariant {
    pub weight: f64,
    /// Index into the directive's ship list.
    #[serde(default)]
    pub config: usize,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplicitConfig {
    pub placements: Vec<Placement>,
}

/// A member at a fractional screen position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    /// Index into the directive's ship list.
    #[serde(default)]
    pub config: usize,
    /// Member stays unpositioned until this long after the formation spawns.
    #[serde(default)]
    pub delay_ms: f64,
}

// --- Tactics ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TacticConfig {
    /// Let the formation run its own motion.
    Native,
    Linear(LinearConfig),
    Sinus(SinusTacticConfig),
    Path(PathConfig),
    Boss(BossConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    pub angle_deg: f64,
    /// Aim once, at spawn, from the formation centroid toward the target.
    pub aim_at_target: bool,
    /// Wrap travelled distance modulo this length (px).
    pub loop_length: Option<f64>,
    pub withdraw: Option<WithdrawConfig>,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            angle_deg: 90.0,
            aim_at_target: false,
            loop_length: None,
            withdraw: None,
        }
    }
}

/// Fly in to a random depth, then peel off toward the nearer side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawConfig {
    pub min_fraction: f64,
    pub max_fraction: f64,
    pub turn_rate_deg: f64,
}

impl Default for WithdrawConfig {
    fn default() -> Self {
        Self {
            min_fraction: 0.3,
            max_fraction: 0.6,
            turn_rate_deg: DEFAULT_WITHDRAW_TURN_RATE_DEG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinusTacticConfig {
    pub amplitude: f64,
    pub frequency: f64,
    pub phase_step: f64,
}

impl Default for SinusTacticConfig {
    fn default() -> Self {
        Self {
            amplitude: DEFAULT_SINUS_AMPLITUDE,
            frequency: DEFAULT_SINUS_FREQUENCY,
            phase_step: DEFAULT_PHASE_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// First segment is the spawn anchor; traversal starts at the second.
    pub segments: Vec<PathSegment>,
    #[serde(default)]
    pub on_end: PathEnd,
}

/// What the anchor does once every segment has been consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathEnd {
    /// Keep flying along the last heading.
    #[default]
    Continue,
    Stop,
    /// Wrap back to the second segment.
    Loop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    /// Roaming speed in px/s. Defaults to the ship's own top speed.
    pub speed: Option<f64>,
    pub move_radius: f64,
    pub upper_fraction: f64,
    pub turn_rate_deg: f64,
    pub tolerance_deg: f64,
    pub fire_duration_ms: f64,
    pub fire_interval_ms: f64,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            speed: None,
            move_radius: BOSS_MOVE_RADIUS,
            upper_fraction: BOSS_UPPER_FRACTION,
            turn_rate_deg: BOSS_TURN_RATE_DEG,
            tolerance_deg: BOSS_AIM_TOLERANCE_DEG,
            fire_duration_ms: BOSS_FIRE_DURATION_MS,
            fire_interval_ms: BOSS_FIRE_INTERVAL_MS,
        }
    }
}

impl LevelConfig {
    /// Parse and validate a level from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let level: LevelConfig = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Check authored data for values the engine cannot run sensibly.
    /// Missing tactics are not rejected here; they are skipped at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::NoSteps(self.name.clone()));
        }
        for (step, directives) in self.steps.iter().enumerate() {
            for (index, directive) in directives.iter().enumerate() {
                directive
                    .validate()
                    .map_err(|reason| ConfigError::InvalidDirective {
                        step,
                        directive: index,
                        reason,
                    })?;
            }
        }
        Ok(())
    }
}

impl SpawnDirective {
    fn validate(&self) -> Result<(), String> {
        if !self.start_delay_ms.is_finite() || self.start_delay_ms < 0.0 {
            return Err(format!(
                "start delay {} is not a finite non-negative value",
                self.start_delay_ms
            ));
        }
        if let Some(repeat) = &self.repeat {
            if repeat.count == 0 {
                return Err("repeat count must be at least 1".to_string());
            }
            if !repeat.interval_ms.is_finite() || repeat.interval_ms < 0.0 {
                return Err(format!("repeat interval {} is invalid", repeat.interval_ms));
            }
        }
        for ship in &self.ships {
            if !ship.speed.is_finite() || ship.speed < 0.0 {
                return Err(format!("ship `{}` has invalid speed {}", ship.kind, ship.speed));
            }
        }
        self.validate_formation()?;
        if let Some(TacticConfig::Path(path)) = &self.tactic {
            if path.segments.len() < 2 {
                return Err(format!(
                    "path needs at least 2 segments, found {}",
                    path.segments.len()
                ));
            }
            for segment in &path.segments {
                segment.validate()?;
            }
        }
        Ok(())
    }

    fn validate_formation(&self) -> Result<(), String> {
        let check_index = |index: usize| {
            if index >= self.ships.len().max(1) {
                Err(format!("ship config index {} out of range", index))
            } else {
                Ok(())
            }
        };
        match &self.formation {
            FormationConfig::Grid(grid) => {
                if grid.rows.member_count() == 0 {
                    return Err("grid has no members".to_string());
                }
            }
            FormationConfig::Field(field) => {
                for variant in &field.variants {
                    check_index(variant.config)?;
                    if !variant.weight.is_finite() || variant.weight < 0.0 {
                        return Err(format!("field variant weight {} is invalid", variant.weight));
                    }
                }
            }
            FormationConfig::Explicit(explicit) => {
                for placement in &explicit.placements {
                    check_index(placement.config)?;
                }
            }
            FormationConfig::Line(_) | FormationConfig::Sinus(_) => {}
        }
        Ok(())
    }
}
