//! Visual estimate task: simulated partner model and revision engine
//!
//! A participant estimates where a target flashed on a circle, sees a
//! simulated partner's estimate and may revise inside the minor arc between
//! the two. This crate holds the partner model, the arc geometry, the
//! influence score and the trial sequencing; rendering, input and storage
//! are collaborators behind traits in [`core::orchestrator`].

pub mod config;
pub mod core;
pub mod types;

// =============================================================================
// DISPLAY GEOMETRY
// =============================================================================

/// Display width in pixels
pub const DISPLAY_WIDTH: f64 = 800.0;

/// Display height in pixels
pub const DISPLAY_HEIGHT: f64 = 600.0;

/// Radius of the response circle in pixels
pub const CIRCLE_RADIUS: f64 = 200.0;

// =============================================================================
// PARTNER MODEL
// =============================================================================

/// von Mises concentration for the low-confidence first estimate
pub const KAPPA: f64 = 7.4;

/// Confidence at or above which the partner anchors tightly (uniform ±20°)
pub const HIGH_CONFIDENCE_THRESHOLD: u8 = 5;

/// Half-width of the high-confidence uniform offset, in degrees
pub const HIGH_CONFIDENCE_SPREAD_DEG: f64 = 20.0;

/// Confidence assumed when none was elicited
pub const DEFAULT_CONFIDENCE: u8 = 1;

/// Susceptible partner: weights over (high, mid, low) influence bands
pub const SUSCEPTIBLE_WEIGHTS: [f64; 3] = [0.5, 0.2, 0.3];
pub const SUSCEPTIBLE_RANGES: [(f64, f64); 3] = [(0.7, 1.0), (0.3, 0.7), (0.0, 0.3)];

/// Insusceptible partner: weights over (low, mid, high) influence bands
pub const INSUSCEPTIBLE_WEIGHTS: [f64; 3] = [0.65, 0.2, 0.15];
pub const INSUSCEPTIBLE_RANGES: [(f64, f64); 3] = [(0.0, 0.2), (0.3, 0.7), (0.7, 0.9)];

// =============================================================================
// SESSION
// =============================================================================

/// Trials run inside each condition block
pub const TRIALS_PER_CONDITION: u32 = 30;

/// Distractor dots scattered after the target flash
pub const DISTRACTOR_COUNT: u32 = 90;

/// Highest confidence offered at elicitation (keys 1-6)
pub const CONFIDENCE_SCALE_MAX: u8 = 6;

/// Hard ceiling for any confidence scale
pub const CONFIDENCE_LIMIT: u8 = 9;

/// Default results file
pub const DEFAULT_OUTPUT_PATH: &str = "experiment.csv";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown condition: {0:?} (expected susceptible, insusceptible or baseline)")]
    UnknownCondition(String),

    #[error("confidence {value} outside 1..={max}")]
    ConfidenceOutOfRange { value: u8, max: u8 },

    #[error("transition lambda {0} outside [0, 1]")]
    LambdaOutOfRange(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("results line {line}: {message}")]
    ResultsParse { line: usize, message: String },

    #[error("participant quit")]
    Quit,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
