//! Frame clock
//!
//! Turns host frame timestamps into the normalized delta the simulation
//! integrates with. A stall (backgrounded tab, debugger) is clamped so the
//! next step stays small.

use crate::consts::{MAX_FRAME_MS, REFERENCE_FRAME_MS};

/// Tracks the previous frame timestamp
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last_ms: None }
    }

    /// Record a frame at `now_ms` and return the normalized delta.
    ///
    /// The first frame after construction or [`reset`](Self::reset) counts as
    /// exactly one reference frame.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => normalize_delta(now_ms - last),
            None => 1.0,
        };
        self.last_ms = Some(now_ms);
        dt
    }

    /// Forget the previous timestamp (call when a session restarts)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Clamp a raw delta to `[0, MAX_FRAME_MS]` and express it in reference frames
pub fn normalize_delta(raw_ms: f64) -> f32 {
    (raw_ms.clamp(0.0, MAX_FRAME_MS) / REFERENCE_FRAME_MS) as f32
}
