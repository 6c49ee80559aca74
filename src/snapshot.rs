//! Render feed
//!
//! A plain copy of what the renderer needs for one frame. No drawing calls
//! and no references back into the simulation.

use serde::Serialize;

use crate::consts::OPTION_COUNT;
use crate::sim::{GamePhase, GameState, Phase, QuizPurpose};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyView {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    /// Flap animation frame index
    pub frame: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObstacleView {
    pub x: f32,
    pub top_height: f32,
    pub bottom_height: f32,
    pub gap_size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizView {
    pub purpose: QuizPurpose,
    pub question: String,
    pub options: [u32; OPTION_COUNT],
    /// False while a result is on screen
    pub answers_enabled: bool,
    pub streak: u8,
    pub required_streak: u8,
    /// Outcome of the answer currently on screen
    pub last_correct: Option<bool>,
}

/// Everything the renderer and HUD need for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub phase: GamePhase,
    pub width: f32,
    pub height: f32,
    pub body: BodyView,
    pub obstacles: Vec<ObstacleView>,
    pub obstacle_width: f32,
    pub score: u32,
    pub best_score: u32,
    /// Number on screen during the countdown
    pub countdown: Option<u8>,
    pub quiz: Option<QuizView>,
    pub ground_offset: f32,
}

impl RenderSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let body = &state.session.body;
        let countdown = match &state.phase {
            Phase::Countdown { remaining, .. } => Some(*remaining),
            _ => None,
        };
        let quiz = match &state.phase {
            Phase::QuizGate { quiz, purpose } => Some(QuizView {
                purpose: *purpose,
                question: quiz.question.text(),
                options: quiz.options.options,
                answers_enabled: !quiz.is_locked(),
                streak: quiz.streak,
                required_streak: quiz.required_streak,
                last_correct: quiz.pending().map(|p| p.correct),
            }),
            _ => None,
        };

        Self {
            phase: state.phase_kind(),
            width: state.playfield.width,
            height: state.playfield.height,
            body: BodyView {
                x: body.pos.x,
                y: body.pos.y,
                width: body.size.x,
                height: body.size.y,
                rotation: body.rotation,
                frame: body.frame.floor() as u32,
            },
            obstacles: state
                .session
                .obstacles
                .iter()
                .map(|o| ObstacleView {
                    x: o.x,
                    top_height: o.top_height,
                    bottom_height: o.bottom_height,
                    gap_size: o.gap_size,
                })
                .collect(),
            obstacle_width: state.tuning.obstacle_width,
            score: state.session.score,
            best_score: state.best_score,
            countdown,
            quiz,
            ground_offset: state.ground_offset,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl GameState {
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(self)
    }
}
