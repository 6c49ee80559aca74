//! Per-frame simulation step
//!
//! One call advances the state machine by one display frame. Within a
//! Playing frame the order is fixed: body, bounds, obstacles, collision,
//! then any transition.

use serde::{Deserialize, Serialize};

use super::collision::check_collision;
use super::state::{GamePhase, GameState, Phase, QuizPurpose, SessionState};
use super::timer::Deadline;
use crate::audio::SoundEffect;
use crate::consts::COUNTDOWN_FROM;
use crate::quiz::{AnswerOutcome, QuizProgress, QuizSession};

/// Input gathered since the previous frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Press / tap / key
    pub activate: bool,
    /// Value of a quiz option the player picked
    pub answer: Option<u32>,
}

/// Things that happened during a tick, for audio, HUD and logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged(GamePhase),
    Jump,
    /// Score after the increment
    Scored(u32),
    GameOver { score: u32, best: u32 },
    NewBest(u32),
    AnswerResult { correct: bool, streak: u8 },
    GateUnlocked,
}

impl GameEvent {
    /// Sound to play for this event, if any
    pub fn sound(&self) -> Option<SoundEffect> {
        match self {
            GameEvent::Jump => Some(SoundEffect::Jump),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            _ => None,
        }
    }
}

/// Advance the game by one frame.
///
/// `now_ms` is host time used for deadlines; `dt` is the normalized frame
/// delta from [`crate::clock::FrameClock`].
pub fn tick(state: &mut GameState, input: &TickInput, now_ms: f64, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    match &mut state.phase {
        Phase::Start => {
            if input.activate {
                enter_quiz(state, QuizPurpose::PreGame, &mut events);
            }
        }

        Phase::QuizGate { quiz, .. } => {
            if let Some(answer) = input.answer {
                match quiz.check_answer(answer, now_ms) {
                    AnswerOutcome::Correct { streak } => events.push(GameEvent::AnswerResult {
                        correct: true,
                        streak,
                    }),
                    AnswerOutcome::Wrong => events.push(GameEvent::AnswerResult {
                        correct: false,
                        streak: 0,
                    }),
                    AnswerOutcome::Ignored => {}
                }
            }
            let slot = quiz.correct_slot();
            match quiz.poll(now_ms, &mut state.rng) {
                Some(QuizProgress::Unlocked) => {
                    state.last_quiz_slot = Some(slot);
                    events.push(GameEvent::GateUnlocked);
                    enter_countdown(state, now_ms, &mut events);
                }
                Some(QuizProgress::NextQuestion) => {
                    state.last_quiz_slot = Some(quiz.correct_slot());
                }
                None => {}
            }
        }

        Phase::Countdown {
            remaining,
            next_step,
        } => {
            let step_ms = state.tuning.countdown_step_ms;
            while next_step.is_due(now_ms) && *remaining > 0 {
                *remaining -= 1;
                *next_step = next_step.next(step_ms);
            }
            if *remaining == 0 {
                enter_playing(state, &mut events);
            }
        }

        Phase::Playing => {
            if input.activate && state.session.body.try_jump() {
                events.push(GameEvent::Jump);
            }
            if step_playing(state, dt, &mut events) {
                enter_game_over(state, now_ms, &mut events);
            }
        }

        Phase::GameOver { until } => {
            if until.is_due(now_ms) {
                enter_quiz(state, QuizPurpose::Continue, &mut events);
            }
        }
    }

    events
}

/// One Playing frame. Returns true if the run ended.
fn step_playing(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) -> bool {
    let tuning = &state.tuning;
    let playfield = state.playfield;
    let session = &mut state.session;

    session.body.integrate(dt);
    session
        .body
        .animate(tuning.flap_frame_speed, tuning.flap_frame_count, dt);
    if session.body.out_of_bounds(playfield.height) {
        log::debug!("Body left the playfield at y={:.1}", session.body.pos.y);
        return true;
    }

    state.ground_offset = (state.ground_offset - tuning.ground_speed * dt) % tuning.ground_tile_width;

    session.obstacles.advance(tuning.pipe_speed * dt);
    let passed = session
        .obstacles
        .award_passes(session.body.pos.x, tuning.obstacle_width);
    for _ in 0..passed {
        session.score += 1;
        events.push(GameEvent::Scored(session.score));
    }
    session.obstacles.retire(tuning.obstacle_width);
    if session.obstacles.needs_spawn(&playfield, tuning) {
        session
            .obstacles
            .spawn(&mut state.rng, session.score, &playfield, tuning);
    }

    check_collision(
        &session.body,
        session.obstacles.iter(),
        tuning.obstacle_width,
        tuning.hitbox_inset,
    )
}

fn set_phase(state: &mut GameState, phase: Phase, events: &mut Vec<GameEvent>) {
    let kind = phase.kind();
    log::info!("Phase: {:?} -> {:?}", state.phase.kind(), kind);
    state.phase = phase;
    events.push(GameEvent::PhaseChanged(kind));
}

fn enter_quiz(state: &mut GameState, purpose: QuizPurpose, events: &mut Vec<GameEvent>) {
    let quiz = QuizSession::new(
        &mut state.rng,
        state.last_quiz_slot,
        state.tuning.required_streak,
        state.tuning.quiz_feedback_ms,
    );
    state.last_quiz_slot = Some(quiz.correct_slot());
    set_phase(state, Phase::QuizGate { quiz, purpose }, events);
}

fn enter_countdown(state: &mut GameState, now_ms: f64, events: &mut Vec<GameEvent>) {
    let phase = Phase::Countdown {
        remaining: COUNTDOWN_FROM,
        next_step: Deadline::after(now_ms, state.tuning.countdown_step_ms),
    };
    set_phase(state, phase, events);
}

/// Start a run: nothing from the previous run survives
fn enter_playing(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.refresh_best_score();
    state.session = SessionState::new(&state.playfield, &state.tuning);
    state.ground_offset = 0.0;
    state.runs += 1;
    let score = state.session.score;
    state
        .session
        .obstacles
        .spawn(&mut state.rng, score, &state.playfield, &state.tuning);
    log::info!("Run {} started (best {})", state.runs, state.best_score);
    set_phase(state, Phase::Playing, events);
}

fn enter_game_over(state: &mut GameState, now_ms: f64, events: &mut Vec<GameEvent>) {
    let score = state.session.score;
    if state.record_best_score() {
        events.push(GameEvent::NewBest(score));
    }
    events.push(GameEvent::GameOver {
        score,
        best: state.best_score,
    });
    log::info!("Game over: score {} (best {})", score, state.best_score);
    let until = Deadline::after(now_ms, state.tuning.game_over_delay_ms);
    set_phase(state, Phase::GameOver { until }, events);
}

impl GameState {
    pub fn tick(&mut self, input: &TickInput, now_ms: f64, dt: f32) -> Vec<GameEvent> {
        tick(self, input, now_ms, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::MemoryStore;
    use crate::sim::obstacle::Obstacle;
    use crate::sim::state::Playfield;
    use crate::tuning::Tuning;

    const FRAME: f64 = 16.0;

    fn new_game(best: u32) -> GameState {
        GameState::new(
            4242,
            Tuning::default(),
            Playfield::new(320.0, 480.0),
            Box::new(MemoryStore::with_best(best)),
        )
    }

    fn press() -> TickInput {
        TickInput {
            activate: true,
            ..Default::default()
        }
    }

    fn answer(value: u32) -> TickInput {
        TickInput {
            activate: false,
            answer: Some(value),
        }
    }

    /// Answer the current quiz correctly and wait out the feedback delay
    fn pass_question(state: &mut GameState, now: &mut f64) -> Vec<GameEvent> {
        let value = state.quiz().unwrap().question.answer;
        let mut events = tick(state, &answer(value), *now, 1.0);
        *now += state.tuning.quiz_feedback_ms;
        events.extend(tick(state, &TickInput::default(), *now, 1.0));
        events
    }

    /// Drive from the title screen into a run
    fn start_run(state: &mut GameState, now: &mut f64) {
        tick(state, &press(), *now, 1.0);
        pass_question(state, now);
        pass_question(state, now);
        assert_eq!(state.phase_kind(), GamePhase::Countdown);
        *now += 3.0 * state.tuning.countdown_step_ms;
        tick(state, &TickInput::default(), *now, 1.0);
        assert_eq!(state.phase_kind(), GamePhase::Playing);
    }

    #[test]
    fn test_start_opens_quiz() {
        let mut state = new_game(0);
        let events = tick(&mut state, &press(), 0.0, 1.0);
        assert_eq!(state.phase_kind(), GamePhase::QuizGate);
        assert!(events.contains(&GameEvent::PhaseChanged(GamePhase::QuizGate)));
        assert!(matches!(
            state.phase,
            Phase::QuizGate {
                purpose: QuizPurpose::PreGame,
                ..
            }
        ));
    }

    #[test]
    fn test_start_ignores_answers() {
        let mut state = new_game(0);
        tick(&mut state, &answer(3), 0.0, 1.0);
        assert_eq!(state.phase_kind(), GamePhase::Start);
    }

    #[test]
    fn test_quiz_then_countdown_then_play() {
        let mut state = new_game(0);
        let mut now = 0.0;
        tick(&mut state, &press(), now, 1.0);

        let events = pass_question(&mut state, &mut now);
        assert!(events.contains(&GameEvent::AnswerResult {
            correct: true,
            streak: 1
        }));
        assert_eq!(state.phase_kind(), GamePhase::QuizGate);

        let events = pass_question(&mut state, &mut now);
        assert!(events.contains(&GameEvent::GateUnlocked));
        assert_eq!(state.phase_kind(), GamePhase::Countdown);

        // Presses during the countdown do nothing
        tick(&mut state, &press(), now + 10.0, 1.0);
        assert!(matches!(state.phase, Phase::Countdown { remaining: 3, .. }));

        now += 1000.0;
        tick(&mut state, &TickInput::default(), now, 1.0);
        assert!(matches!(state.phase, Phase::Countdown { remaining: 2, .. }));
        now += 2000.0;
        let events = tick(&mut state, &TickInput::default(), now, 1.0);
        assert!(events.contains(&GameEvent::PhaseChanged(GamePhase::Playing)));
        assert_eq!(state.session.obstacles.len(), 1);
        assert_eq!(state.session.score, 0);
        assert_eq!(state.runs, 1);
    }

    #[test]
    fn test_wrong_answer_keeps_gate_closed() {
        let mut state = new_game(0);
        let mut now = 0.0;
        tick(&mut state, &press(), now, 1.0);
        pass_question(&mut state, &mut now);

        let quiz = state.quiz().unwrap();
        let wrong = quiz.options.options[(quiz.correct_slot() + 1) % 4];
        let events = tick(&mut state, &answer(wrong), now, 1.0);
        assert!(events.contains(&GameEvent::AnswerResult {
            correct: false,
            streak: 0
        }));
        now += 1000.0;
        tick(&mut state, &TickInput::default(), now, 1.0);
        assert_eq!(state.phase_kind(), GamePhase::QuizGate);
        assert_eq!(state.quiz().unwrap().streak, 0);
    }

    #[test]
    fn test_jump_event_and_reentry_guard() {
        let mut state = new_game(0);
        let mut now = 0.0;
        start_run(&mut state, &mut now);

        now += FRAME;
        let events = tick(&mut state, &press(), now, 1.0);
        assert!(events.contains(&GameEvent::Jump));
        // Still rising fast: second press is swallowed
        now += FRAME;
        let events = tick(&mut state, &press(), now, 1.0);
        assert!(!events.contains(&GameEvent::Jump));
    }

    #[test]
    fn test_falling_out_ends_run() {
        let mut state = new_game(0);
        let mut now = 0.0;
        start_run(&mut state, &mut now);

        state.session.body.pos.y = 480.0 - 24.0 + 1.0;
        let events = tick(&mut state, &TickInput::default(), now + FRAME, 1.0);
        assert_eq!(state.phase_kind(), GamePhase::GameOver);
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));
    }

    #[test]
    fn test_ceiling_breach_ends_run() {
        let mut state = new_game(0);
        let mut now = 0.0;
        start_run(&mut state, &mut now);

        state.session.body.pos.y = -5.0;
        state.session.body.velocity = -6.5;
        tick(&mut state, &TickInput::default(), now + FRAME, 1.0);
        assert_eq!(state.phase_kind(), GamePhase::GameOver);
    }

    #[test]
    fn test_scoring_and_new_best() {
        let mut state = new_game(0);
        let mut now = 0.0;
        start_run(&mut state, &mut now);

        // Replace the spawned obstacle with one about to be cleared, far from the body vertically
        let mut field = crate::sim::obstacle::ObstacleField::new();
        field.push(Obstacle {
            x: 10.0,
            top_height: 0.0,
            bottom_height: 0.0,
            gap_size: 480.0,
            passed: false,
        });
        state.session.obstacles = field;

        now += FRAME;
        let events = tick(&mut state, &TickInput::default(), now, 1.0);
        assert!(events.contains(&GameEvent::Scored(1)));
        now += FRAME;
        let events = tick(&mut state, &TickInput::default(), now, 1.0);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Scored(_))));
        assert_eq!(state.session.score, 1);

        state.session.body.pos.y = 1000.0;
        let events = tick(&mut state, &TickInput::default(), now + FRAME, 1.0);
        assert!(events.contains(&GameEvent::NewBest(1)));
        assert_eq!(state.best_score, 1);
    }

    #[test]
    fn test_game_over_leads_to_continue_quiz() {
        let mut state = new_game(0);
        let mut now = 0.0;
        start_run(&mut state, &mut now);
        state.session.body.pos.y = 1000.0;
        now += FRAME;
        tick(&mut state, &TickInput::default(), now, 1.0);
        assert_eq!(state.phase_kind(), GamePhase::GameOver);

        // Presses during the game-over display are ignored
        tick(&mut state, &press(), now + 10.0, 1.0);
        assert_eq!(state.phase_kind(), GamePhase::GameOver);

        now += state.tuning.game_over_delay_ms;
        tick(&mut state, &TickInput::default(), now, 1.0);
        assert!(matches!(
            state.phase,
            Phase::QuizGate {
                purpose: QuizPurpose::Continue,
                ..
            }
        ));
    }

    #[test]
    fn test_new_run_resets_session() {
        let mut state = new_game(0);
        let mut now = 0.0;
        start_run(&mut state, &mut now);
        for _ in 0..30 {
            now += FRAME;
            tick(&mut state, &TickInput::default(), now, 1.0);
        }
        state.session.score = 3;
        state.session.body.pos.y = 1000.0;
        now += FRAME;
        tick(&mut state, &TickInput::default(), now, 1.0);
        now += state.tuning.game_over_delay_ms;
        tick(&mut state, &TickInput::default(), now, 1.0);
        pass_question(&mut state, &mut now);
        pass_question(&mut state, &mut now);
        now += 3000.0;
        tick(&mut state, &TickInput::default(), now, 1.0);

        assert_eq!(state.phase_kind(), GamePhase::Playing);
        assert_eq!(state.session.score, 0);
        assert_eq!(state.session.obstacles.len(), 1);
        assert_eq!(state.session.body.velocity, 0.0);
        assert_eq!(state.session.body.pos.y, 240.0);
        assert_eq!(state.runs, 2);
        assert_eq!(state.best_score, 3);
    }

    #[test]
    fn test_pending_quiz_feedback_dies_with_gate() {
        let mut state = new_game(0);
        let mut now = 0.0;
        tick(&mut state, &press(), now, 1.0);
        pass_question(&mut state, &mut now);
        let value = state.quiz().unwrap().question.answer;
        tick(&mut state, &answer(value), now, 1.0);
        now += 1000.0;
        tick(&mut state, &TickInput::default(), now, 1.0);
        assert_eq!(state.phase_kind(), GamePhase::Countdown);
        // No quiz remains to fire late feedback
        assert!(state.quiz().is_none());
    }

    #[test]
    fn test_wrong_answers_move_correct_slot() {
        let mut state = new_game(0);
        let mut now = 0.0;
        tick(&mut state, &press(), now, 1.0);
        let mut last = state.quiz().unwrap().correct_slot();
        for _ in 0..20 {
            let quiz = state.quiz().unwrap();
            let wrong = quiz.options.options[(quiz.correct_slot() + 1) % 4];
            tick(&mut state, &answer(wrong), now, 1.0);
            now += 1000.0;
            tick(&mut state, &TickInput::default(), now, 1.0);
            let slot = state.quiz().unwrap().correct_slot();
            assert_ne!(slot, last);
            last = slot;
        }
    }

    #[test]
    fn test_spawn_after_resize_uses_new_bounds() {
        let mut state = new_game(0);
        let mut now = 0.0;
        start_run(&mut state, &mut now);
        assert_eq!(state.session.obstacles.len(), 1);

        state.resize(640.0, 960.0);
        assert_eq!(state.session.body.pos.x, 128.0);
        assert_eq!(state.session.body.pos.y, 240.0);
        assert_eq!(state.session.obstacles.head().unwrap().x, 320.0);

        // spacing 320: the first column's trailing edge must reach x = 320
        let mut frames = 0;
        while state.session.obstacles.len() < 2 {
            now += FRAME;
            tick(&mut state, &TickInput::default(), now, 1.0);
            frames += 1;
            assert_eq!(state.phase_kind(), GamePhase::Playing);
            assert!(frames < 30);
        }
        assert_eq!(frames, 18);

        let fresh = state.session.obstacles.iter().last().unwrap();
        assert_eq!(fresh.x, 640.0);
        assert!((fresh.gap_size - 240.0).abs() < 1e-3);
        assert!(fresh.top_height >= 96.0);
        assert!(fresh.bottom_height >= 96.0 - 1e-3);
        assert!((fresh.column_height() - 960.0).abs() < 1e-3);
    }

    #[test]
    fn test_ground_scroll_wraps() {
        let mut state = new_game(0);
        let mut now = 0.0;
        start_run(&mut state, &mut now);
        assert_eq!(state.ground_offset, 0.0);

        now += FRAME;
        tick(&mut state, &TickInput::default(), now, 1.0);
        assert_eq!(state.ground_offset, -2.0);

        state.ground_offset = -335.0;
        now += FRAME;
        tick(&mut state, &TickInput::default(), now, 1.0);
        assert!((state.ground_offset + 1.0).abs() < 1e-3);
        assert!(state.ground_offset > -state.tuning.ground_tile_width);
    }

    #[test]
    fn test_sound_mapping() {
        assert_eq!(GameEvent::Jump.sound(), Some(SoundEffect::Jump));
        assert_eq!(
            GameEvent::GameOver { score: 1, best: 1 }.sound(),
            Some(SoundEffect::GameOver)
        );
        assert_eq!(GameEvent::Scored(1).sound(), None);
    }
}
