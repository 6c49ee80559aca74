//! Data-driven game balance
//!
//! Every gameplay constant lives here so a JSON blob can retune the game
//! without a rebuild. Size-dependent values are stored as fractions of
//! the playfield and resolved through [`crate::sim::Playfield`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a tuning blob
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning json is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(&'static str),
}

/// Gameplay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Body ===
    /// Downward acceleration per reference frame
    pub gravity: f32,
    /// Velocity set by a jump (negative = up)
    pub jump_impulse: f32,
    /// Terminal fall speed
    pub velocity_ceiling: f32,
    /// A jump is accepted only while velocity is above this
    pub jump_reentry_threshold: f32,
    pub body_width: f32,
    pub body_height: f32,
    /// Body x as a fraction of playfield width
    pub body_x_fraction: f32,

    // === Obstacles ===
    pub obstacle_width: f32,
    /// Horizontal speed per reference frame
    pub pipe_speed: f32,
    /// Gap between the tail obstacle and the right edge before the next spawn, fraction of width
    pub spacing_fraction: f32,
    /// Shortest allowed pipe segment, fraction of height
    pub min_pipe_fraction: f32,
    pub initial_gap_fraction: f32,
    pub min_gap_fraction: f32,
    /// Gap shrink per point scored
    pub gap_decrease_rate: f32,
    /// Largest fractional gap reduction from score alone
    pub gap_reduction_cap: f32,

    // === Collision ===
    /// Hit-box inset on every side of the body
    pub hitbox_inset: f32,

    // === Timing (ms) ===
    pub countdown_step_ms: f64,
    pub game_over_delay_ms: f64,
    pub quiz_feedback_ms: f64,

    // === Quiz ===
    /// Consecutive correct answers that unlock the gate
    pub required_streak: u8,

    // === Cosmetic ===
    pub flap_frame_speed: f32,
    pub flap_frame_count: f32,
    pub ground_speed: f32,
    pub ground_tile_width: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.4,
            jump_impulse: -6.5,
            velocity_ceiling: 8.0,
            jump_reentry_threshold: -4.0,
            body_width: 34.0,
            body_height: 24.0,
            body_x_fraction: 0.2,

            obstacle_width: 52.0,
            pipe_speed: 3.0,
            spacing_fraction: 0.5,
            min_pipe_fraction: 0.1,
            initial_gap_fraction: 0.25,
            min_gap_fraction: 0.18,
            gap_decrease_rate: 0.002,
            gap_reduction_cap: 0.3,

            hitbox_inset: 5.0,

            countdown_step_ms: 1000.0,
            game_over_delay_ms: 1500.0,
            quiz_feedback_ms: 1000.0,

            required_streak: 2,

            flap_frame_speed: 0.15,
            flap_frame_count: 3.0,
            ground_speed: 2.0,
            ground_tile_width: 336.0,
        }
    }
}

impl Tuning {
    /// Parse and validate a tuning blob. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse a tuning blob, falling back to defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Ignoring tuning override: {}", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.body_width <= 0.0 || self.body_height <= 0.0 {
            return Err(TuningError::Invalid("body size must be positive"));
        }
        if self.obstacle_width <= 0.0 {
            return Err(TuningError::Invalid("obstacle width must be positive"));
        }
        if self.jump_impulse >= 0.0 {
            return Err(TuningError::Invalid("jump impulse must point up (negative)"));
        }
        if self.min_gap_fraction > self.initial_gap_fraction {
            return Err(TuningError::Invalid("min gap exceeds initial gap"));
        }
        // Two minimum-height segments plus the widest gap must fit
        if self.initial_gap_fraction + 2.0 * self.min_pipe_fraction > 1.0 {
            return Err(TuningError::Invalid("gap and pipe minimums exceed the playfield"));
        }
        if self.required_streak == 0 {
            return Err(TuningError::Invalid("required streak must be at least 1"));
        }
        Ok(())
    }
}
