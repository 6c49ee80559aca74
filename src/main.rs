//! Gate Runner entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, KeyboardEvent};

    use gate_runner::audio::AudioManager;
    use gate_runner::consts::OPTION_COUNT;
    use gate_runner::highscores::LocalStore;
    use gate_runner::sim::{GamePhase, GameState, Playfield, TickInput};
    use gate_runner::{FrameClock, RenderSnapshot, Settings, Tuning, backing_store_size};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        clock: FrameClock,
        input: TickInput,
        audio: AudioManager,
        settings: Settings,
        ctx: CanvasRenderingContext2d,
    }

    impl Game {
        /// Run one simulation step and route its events
        fn update(&mut self, time: f64) {
            let dt = self.clock.advance(time);
            let input = std::mem::take(&mut self.input);
            let events = self.state.tick(&input, time, dt);
            for event in &events {
                if let Some(effect) = event.sound() {
                    self.audio.play(effect);
                }
                log::debug!("{:?}", event);
            }
        }

        fn render(&self, snap: &RenderSnapshot) {
            let ctx = &self.ctx;
            ctx.set_fill_style_str("#4EC0CA");
            ctx.fill_rect(0.0, 0.0, snap.width as f64, snap.height as f64);

            ctx.set_fill_style_str("#75C147");
            let w = snap.obstacle_width as f64;
            for o in &snap.obstacles {
                ctx.fill_rect(o.x as f64, 0.0, w, o.top_height as f64);
                let bottom_y = (o.top_height + o.gap_size) as f64;
                ctx.fill_rect(o.x as f64, bottom_y, w, o.bottom_height as f64);
            }

            let b = &snap.body;
            ctx.save();
            let _ = ctx.translate((b.x + b.width / 2.0) as f64, (b.y + b.height / 2.0) as f64);
            let _ = ctx.rotate(b.rotation as f64);
            ctx.set_fill_style_str(if b.frame == 1 { "#FFE44D" } else { "#FFD700" });
            ctx.fill_rect(
                -(b.width as f64) / 2.0,
                -(b.height as f64) / 2.0,
                b.width as f64,
                b.height as f64,
            );
            ctx.restore();

            if snap.phase == GamePhase::Playing {
                ctx.set_fill_style_str("white");
                ctx.set_font("bold 36px Arial");
                let _ = ctx.fill_text(&snap.score.to_string(), snap.width as f64 / 2.0, 50.0);
            }
        }

        /// Show/hide overlays and fill in HUD text
        fn update_hud(&self, snap: &RenderSnapshot) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            show(&document, "start-screen", snap.phase == GamePhase::Start);
            show(&document, "countdown", snap.phase == GamePhase::Countdown);
            show(&document, "game-over", snap.phase == GamePhase::GameOver);
            show(&document, "quiz", snap.phase == GamePhase::QuizGate);

            set_text(&document, "best-score", &snap.best_score.to_string());
            set_text(&document, "final-score", &snap.score.to_string());
            if let Some(n) = snap.countdown {
                set_text(&document, "countdown", &n.to_string());
            }

            if let Some(quiz) = &snap.quiz {
                set_text(&document, "quiz-question", &quiz.question);
                set_text(
                    &document,
                    "quiz-streak",
                    &format!("{}/{}", quiz.streak, quiz.required_streak),
                );
                let feedback = match quiz.last_correct {
                    Some(true) => "Correct!",
                    Some(false) => "Try again",
                    None => "",
                };
                set_text(&document, "quiz-feedback", feedback);
                for (slot, value) in quiz.options.iter().enumerate() {
                    let id = format!("quiz-option-{}", slot);
                    set_text(&document, &id, &value.to_string());
                    if let Some(el) = document.get_element_by_id(&id) {
                        let _ = if quiz.answers_enabled {
                            el.remove_attribute("disabled")
                        } else {
                            el.set_attribute("disabled", "")
                        };
                    }
                }
            }
        }
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = if visible {
                el.class_list().remove_1("hidden")
            } else {
                el.class_list().add_1("hidden")
            };
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    /// Size the backing store in device pixels, draw in CSS pixels, and
    /// tell the simulation the CSS size
    fn fit_canvas(canvas: &HtmlCanvasElement, game: &Rc<RefCell<Game>>) {
        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        let w = canvas.client_width().max(1) as f64;
        let h = canvas.client_height().max(1) as f64;
        let (backing_w, backing_h) = backing_store_size(w, h, dpr);
        canvas.set_width(backing_w);
        canvas.set_height(backing_h);
        let dpr = backing_w as f64 / w;

        let mut g = game.borrow_mut();
        // Resizing the backing store resets the transform
        let _ = g.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
        g.state.resize(w as f32, h as f32);
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Gate Runner starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let settings = Settings::default();
        let mut audio = AudioManager::new();
        audio.apply_settings(&settings);

        let seed = js_sys::Date::now() as u64;
        let playfield = Playfield::new(canvas.client_width() as f32, canvas.client_height() as f32);
        let state = GameState::new(seed, Tuning::default(), playfield, Box::new(LocalStore));
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            state,
            clock: FrameClock::new(),
            input: TickInput::default(),
            audio,
            settings,
            ctx,
        }));
        fit_canvas(&canvas, &game);

        setup_input_handlers(&canvas, game.clone());
        setup_quiz_buttons(&document, game.clone());
        setup_resize(canvas.clone(), game.clone());

        request_animation_frame(game);
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse / touch press
        for event_name in ["mousedown", "touchstart"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                event.prevent_default();
                game.borrow_mut().input.activate = true;
            });
            let _ = canvas
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        if let Some(window) = web_sys::window() {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "Enter" | "ArrowUp" => g.input.activate = true,
                    "m" | "M" => {
                        g.settings.toggle_mute();
                        let settings = g.settings.clone();
                        g.audio.apply_settings(&settings);
                        log::info!("Muted: {}", settings.muted);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_quiz_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for slot in 0..OPTION_COUNT {
            let Some(btn) = document.get_element_by_id(&format!("quiz-option-{}", slot)) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                let value = g.state.quiz().map(|q| q.options.options[slot]);
                if let Some(value) = value {
                    g.input.answer = Some(value);
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            fit_canvas(&canvas, &game);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            let snap = g.state.snapshot();
            g.render(&snap);
            g.update_hud(&snap);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Gate Runner (native) starting...");
    log::info!("Native mode runs a headless autopilot - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2024);
    let report = headless::run(seed, 3, 60 * 120);
    println!(
        "seed {}: {} runs, scores {:?}, best {}, {} quiz answers ({} wrong)",
        seed, report.runs, report.scores, report.best, report.answers, report.wrong_answers
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless autopilot that exercises the whole state machine without a display
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use gate_runner::consts::{OPTION_COUNT, REFERENCE_FRAME_MS};
    use gate_runner::sim::{GameEvent, GamePhase, GameState, Playfield, TickInput, tick};
    use gate_runner::{FrameClock, MemoryStore, Tuning};

    #[derive(Debug, Default)]
    pub struct Report {
        pub runs: u32,
        pub scores: Vec<u32>,
        pub best: u32,
        pub answers: u32,
        pub wrong_answers: u32,
    }

    /// Play until `max_runs` runs have ended or `max_frames` frames pass
    pub fn run(seed: u64, max_runs: u32, max_frames: u32) -> Report {
        let mut state = GameState::new(
            seed,
            Tuning::default(),
            Playfield::default(),
            Box::new(MemoryStore::new()),
        );
        let mut clock = FrameClock::new();
        let mut report = Report::default();

        for frame in 0..max_frames {
            let now = frame as f64 * REFERENCE_FRAME_MS;
            let input = decide(&state, report.answers);
            if input.answer.is_some() {
                report.answers += 1;
            }
            let dt = clock.advance(now);
            for event in tick(&mut state, &input, now, dt) {
                match event {
                    GameEvent::GameOver { score, best } => {
                        report.scores.push(score);
                        report.best = best;
                    }
                    GameEvent::AnswerResult { correct: false, .. } => report.wrong_answers += 1,
                    _ => {}
                }
            }
            if report.scores.len() as u32 >= max_runs {
                break;
            }
        }
        report.runs = state.runs;
        report
    }

    /// Press on the title screen, answer quizzes (every fifth one wrong),
    /// and flap whenever the body sinks below the next opening until the
    /// run's target score is reached, then let it fall
    fn decide(state: &GameState, answers_so_far: u32) -> TickInput {
        let mut input = TickInput::default();
        match state.phase_kind() {
            GamePhase::Start => input.activate = true,
            GamePhase::QuizGate => {
                if let Some(quiz) = state.quiz().filter(|q| !q.is_locked()) {
                    let slot = if answers_so_far % 5 == 4 {
                        (quiz.correct_slot() + 1) % OPTION_COUNT
                    } else {
                        quiz.correct_slot()
                    };
                    input.answer = Some(quiz.options.options[slot]);
                }
            }
            GamePhase::Playing if state.score() > state.runs => {}
            GamePhase::Playing => {
                let body = &state.session.body;
                let width = state.tuning.obstacle_width;
                let target = state
                    .session
                    .obstacles
                    .iter()
                    .find(|o| o.trailing_edge(width) > body.left())
                    .map(|o| o.gap_top() + o.gap_size * 0.6)
                    .unwrap_or(state.playfield.height / 2.0);
                input.activate = body.bottom() > target;
            }
            GamePhase::Countdown | GamePhase::GameOver => {}
        }
        input
    }

}
