//! Gated obstacles
//!
//! Obstacles enter at the right edge and scroll left. The queue is ordered
//! by spawn time, which is also left-to-right order, so only the head is
//! ever retired and only the tail is ever checked for spacing.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::Playfield;
use crate::tuning::Tuning;

/// A top/bottom pipe pair with an opening between them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    /// Leading (left) edge
    pub x: f32,
    pub top_height: f32,
    pub bottom_height: f32,
    /// Opening size, frozen at spawn
    pub gap_size: f32,
    /// Set once the body has cleared the trailing edge
    pub passed: bool,
}

impl Obstacle {
    #[inline]
    pub fn trailing_edge(&self, width: f32) -> f32 {
        self.x + width
    }

    /// Y coordinate where the opening starts
    #[inline]
    pub fn gap_top(&self) -> f32 {
        self.top_height
    }

    /// Y coordinate where the bottom pipe starts
    #[inline]
    pub fn gap_bottom(&self) -> f32 {
        self.top_height + self.gap_size
    }

    /// Full column height; equals the playfield height at spawn time
    pub fn column_height(&self) -> f32 {
        self.top_height + self.gap_size + self.bottom_height
    }
}

/// Opening size for the next obstacle at `score`.
///
/// Shrinks linearly with score up to the reduction cap, never below the
/// minimum gap.
pub fn current_gap(score: u32, playfield: &Playfield, tuning: &Tuning) -> f32 {
    let reduction = (score as f32 * tuning.gap_decrease_rate).min(tuning.gap_reduction_cap);
    (playfield.initial_gap(tuning) * (1.0 - reduction)).max(playfield.min_gap(tuning))
}

/// The live obstacle queue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleField {
    obstacles: VecDeque<Obstacle>,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    pub fn head(&self) -> Option<&Obstacle> {
        self.obstacles.front()
    }

    /// Append an obstacle directly (tests and replays)
    pub fn push(&mut self, obstacle: Obstacle) {
        self.obstacles.push_back(obstacle);
    }

    /// Spawn a new obstacle at the right edge with a random opening position
    pub fn spawn<R: Rng>(
        &mut self,
        rng: &mut R,
        score: u32,
        playfield: &Playfield,
        tuning: &Tuning,
    ) -> &Obstacle {
        let gap_size = current_gap(score, playfield, tuning);
        let available = playfield.height - gap_size;
        let min_pipe = playfield.min_pipe_height(tuning);
        let max_top = (available - min_pipe).max(min_pipe);
        let top_height = rng.random_range(min_pipe..=max_top);

        log::debug!(
            "Spawn obstacle: top={:.1} gap={:.1} (score {})",
            top_height,
            gap_size,
            score
        );

        self.obstacles.push_back(Obstacle {
            x: playfield.width,
            top_height,
            bottom_height: available - top_height,
            gap_size,
            passed: false,
        });
        &self.obstacles[self.obstacles.len() - 1]
    }

    /// Scroll every obstacle left by `distance`
    pub fn advance(&mut self, distance: f32) {
        for obstacle in &mut self.obstacles {
            obstacle.x -= distance;
        }
    }

    /// Mark obstacles whose trailing edge is now left of `body_x`.
    /// Returns how many were newly passed; each obstacle counts once.
    pub fn award_passes(&mut self, body_x: f32, obstacle_width: f32) -> u32 {
        let mut passed = 0;
        for obstacle in &mut self.obstacles {
            if !obstacle.passed && obstacle.trailing_edge(obstacle_width) < body_x {
                obstacle.passed = true;
                passed += 1;
            }
        }
        passed
    }

    /// Drop obstacles that have fully left the playfield
    pub fn retire(&mut self, obstacle_width: f32) -> usize {
        let mut retired = 0;
        while self
            .obstacles
            .front()
            .is_some_and(|o| o.trailing_edge(obstacle_width) < 0.0)
        {
            self.obstacles.pop_front();
            retired += 1;
        }
        retired
    }

    /// True when the queue is empty or the tail has opened up enough room
    /// at the right edge
    pub fn needs_spawn(&self, playfield: &Playfield, tuning: &Tuning) -> bool {
        match self.obstacles.back() {
            None => true,
            Some(tail) => {
                playfield.width - tail.trailing_edge(tuning.obstacle_width)
                    >= playfield.spacing(tuning)
            }
        }
    }
}
