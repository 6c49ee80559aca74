//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Time comes in as arguments (host ms for deadlines, normalized dt for physics)
//! - Seeded RNG only
//! - Obstacles are kept in spawn order, which is left-to-right order

pub mod body;
pub mod collision;
pub mod obstacle;
pub mod state;
pub mod tick;
pub mod timer;

pub use body::Body;
pub use collision::{HitBox, check_collision};
pub use obstacle::{Obstacle, ObstacleField, current_gap};
pub use state::{GamePhase, GameState, Phase, Playfield, QuizPurpose, SessionState};
pub use tick::{GameEvent, TickInput, tick};
pub use timer::Deadline;
