//! Gate Runner - A side-scrolling gate runner with a quiz checkpoint
//!
//! Core modules:
//! - `sim`: Simulation (physics, obstacles, collisions, game state machine)
//! - `quiz`: Arithmetic quiz that gates every (re)start
//! - `clock`: Frame delta clamping and normalization
//! - `snapshot`: Plain per-frame state handed to the renderer
//! - `tuning`: Data-driven game balance
//! - `highscores`: Persisted best score
//! - `audio`, `settings`: Sound effects and player preferences

pub mod audio;
pub mod clock;
pub mod highscores;
pub mod quiz;
pub mod settings;
pub mod sim;
pub mod snapshot;
pub mod tuning;

pub use clock::FrameClock;
pub use highscores::{BestScoreStore, MemoryStore};
pub use settings::Settings;
pub use snapshot::RenderSnapshot;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Reference frame duration the physics constants are tuned against (ms)
    pub const REFERENCE_FRAME_MS: f64 = 16.0;
    /// Largest raw frame delta fed to the simulation (ms)
    pub const MAX_FRAME_MS: f64 = 32.0;

    /// Quiz operands are drawn from this inclusive range
    pub const OPERAND_MIN: u32 = 1;
    pub const OPERAND_MAX: u32 = 10;
    /// Every answer option lies in [0, OPTION_MAX]
    pub const OPTION_MAX: u32 = 20;
    /// Distractor pool radius around the correct answer
    pub const DISTRACTOR_SPREAD: u32 = 5;
    /// Number of answer buttons
    pub const OPTION_COUNT: usize = 4;

    /// Countdown starts here and ticks down to 1
    pub const COUNTDOWN_FROM: u8 = 3;

    /// Default playfield (used before the layout reports a size)
    pub const DEFAULT_WIDTH: f32 = 320.0;
    pub const DEFAULT_HEIGHT: f32 = 480.0;
}

/// Clamp `value` into `[min, max]` (f32, NaN-tolerant on the low side)
#[inline]
pub fn clamp_f32(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Canvas backing-store size in device pixels for a CSS size and
/// `devicePixelRatio`. A non-positive or non-finite ratio counts as 1.
pub fn backing_store_size(css_width: f64, css_height: f64, dpr: f64) -> (u32, u32) {
    let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
    (
        (css_width.max(1.0) * dpr).round() as u32,
        (css_height.max(1.0) * dpr).round() as u32,
    )
}
