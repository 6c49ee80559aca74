//! Game state and session types
//!
//! `GameState` is the single owner of everything that changes. A run's
//! mutable entities live in `SessionState`, which is replaced wholesale
//! whenever a new run begins.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::obstacle::ObstacleField;
use super::timer::Deadline;
use crate::consts::*;
use crate::highscores::BestScoreStore;
use crate::quiz::QuizSession;
use crate::tuning::Tuning;

/// Playfield dimensions reported by the layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Playfield {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn body_x(&self, tuning: &Tuning) -> f32 {
        self.width * tuning.body_x_fraction
    }

    /// Vertical rest position for the body's top edge
    pub fn rest_y(&self) -> f32 {
        self.height / 2.0
    }

    pub fn spacing(&self, tuning: &Tuning) -> f32 {
        self.width * tuning.spacing_fraction
    }

    pub fn min_pipe_height(&self, tuning: &Tuning) -> f32 {
        self.height * tuning.min_pipe_fraction
    }

    pub fn initial_gap(&self, tuning: &Tuning) -> f32 {
        self.height * tuning.initial_gap_fraction
    }

    pub fn min_gap(&self, tuning: &Tuning) -> f32 {
        self.height * tuning.min_gap_fraction
    }
}

/// Coarse phase, as seen by input filtering and the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for the first press
    Start,
    /// 3-2-1 before a run
    Countdown,
    /// Active run
    Playing,
    /// Run ended, result on screen
    GameOver,
    /// Arithmetic quiz blocking the next run
    QuizGate,
}

/// Why a quiz gate is up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizPurpose {
    /// Before the first run of this boot
    PreGame,
    /// Before a retry after game over
    Continue,
}

/// Phase with the data only that phase needs, including any armed deadline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Phase {
    Start,
    Countdown { remaining: u8, next_step: Deadline },
    Playing,
    GameOver { until: Deadline },
    QuizGate { quiz: QuizSession, purpose: QuizPurpose },
}

impl Phase {
    pub fn kind(&self) -> GamePhase {
        match self {
            Phase::Start => GamePhase::Start,
            Phase::Countdown { .. } => GamePhase::Countdown,
            Phase::Playing => GamePhase::Playing,
            Phase::GameOver { .. } => GamePhase::GameOver,
            Phase::QuizGate { .. } => GamePhase::QuizGate,
        }
    }
}

/// Everything that belongs to a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub body: Body,
    pub obstacles: ObstacleField,
    pub score: u32,
}

impl SessionState {
    /// A fresh run: body at rest, no obstacles, zero score
    pub fn new(playfield: &Playfield, tuning: &Tuning) -> Self {
        Self {
            body: Body::new(playfield.body_x(tuning), playfield.rest_y(), tuning),
            obstacles: ObstacleField::new(),
            score: 0,
        }
    }
}

/// Complete game state
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    pub playfield: Playfield,
    pub phase: Phase,
    pub session: SessionState,
    /// Best score as last read from / written to the store
    pub best_score: u32,
    /// Slot of the last correct quiz answer shown, carried across gates
    pub last_quiz_slot: Option<usize>,
    /// Cosmetic ground scroll
    pub ground_offset: f32,
    /// Number of runs started this boot
    pub runs: u32,
    pub(crate) store: Box<dyn BestScoreStore>,
}

impl GameState {
    /// Create a game on the title screen
    pub fn new(
        seed: u64,
        tuning: Tuning,
        playfield: Playfield,
        store: Box<dyn BestScoreStore>,
    ) -> Self {
        let session = SessionState::new(&playfield, &tuning);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            playfield,
            phase: Phase::Start,
            session,
            best_score: 0,
            last_quiz_slot: None,
            ground_offset: 0.0,
            runs: 0,
            store,
        };
        state.refresh_best_score();
        state
    }

    pub fn phase_kind(&self) -> GamePhase {
        self.phase.kind()
    }

    pub fn score(&self) -> u32 {
        self.session.score
    }

    pub fn quiz(&self) -> Option<&QuizSession> {
        match &self.phase {
            Phase::QuizGate { quiz, .. } => Some(quiz),
            _ => None,
        }
    }

    /// Re-read the persisted best score, keeping the cached value if the
    /// store is unavailable
    pub fn refresh_best_score(&mut self) {
        match self.store.load() {
            Ok(best) => self.best_score = best,
            Err(e) => log::warn!("Best score unavailable ({}), keeping {}", e, self.best_score),
        }
    }

    /// Persist the current score if it beats the best. Returns true on a new best.
    pub(crate) fn record_best_score(&mut self) -> bool {
        let score = self.session.score;
        if score <= self.best_score {
            return false;
        }
        self.best_score = score;
        if let Err(e) = self.store.save(score) {
            log::warn!("Could not persist best score {}: {}", score, e);
        }
        log::info!("New best score: {}", score);
        true
    }

    /// Apply new playfield dimensions.
    ///
    /// Size-derived values (spacing, gap bounds) are read from the playfield
    /// on use, so only the body needs moving. Obstacles keep their absolute
    /// positions.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.playfield = Playfield::new(width, height);
        let body = &mut self.session.body;
        body.pos.x = self.playfield.body_x(&self.tuning);
        if !matches!(self.phase, Phase::Playing) {
            body.pos.y = self.playfield.rest_y();
        }
        log::info!("Playfield resized to {}x{}", self.playfield.width, self.playfield.height);
    }
}
