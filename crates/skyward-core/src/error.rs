//! Error types.
//!
//! Only level loading surfaces errors to the host. Everything that goes
//! wrong inside the frame loop is logged and degrades to fewer ships.

/// Problems with authored level data.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("level data could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("level `{0}` has no wave steps")]
    NoSteps(String),

    #[error("step {step}, directive {directive}: {reason}")]
    InvalidDirective {
        step: usize,
        directive: usize,
        reason: String,
    },
}

/// A ship could not be constructed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SpawnError {
    #[error("non-finite spawn position ({x}, {y})")]
    NonFinitePosition { x: f64, y: f64 },

    #[error("ship `{kind}` has invalid speed {speed}")]
    InvalidSpeed { kind: String, speed: f64 },

    #[error("ship factory rejected `{0}`")]
    Rejected(String),
}
