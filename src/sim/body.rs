//! The controllable body
//!
//! Only `y` moves during a session. Velocity is integrated in reference
//! frames (see [`crate::clock`]) and never exceeds the terminal ceiling.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clamp_f32;
use crate::tuning::Tuning;

/// Low-pass factor applied to the presentation velocity each tick
pub const SMOOTHING_FACTOR: f32 = 0.1;
/// Radians of tilt per unit of smoothed velocity
pub const ROTATION_FACTOR: f32 = 0.12;
/// Tilt limit either way (45 degrees)
pub const MAX_ROTATION: f32 = std::f32::consts::FRAC_PI_4;

/// The player's body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Vertical velocity (positive = falling)
    pub velocity: f32,
    pub gravity: f32,
    pub jump_impulse: f32,
    pub velocity_ceiling: f32,
    pub jump_reentry_threshold: f32,
    /// Filtered velocity, drives rotation only
    pub smoothed_velocity: f32,
    /// Presentation tilt in radians
    pub rotation: f32,
    /// Wing-flap animation frame (cosmetic)
    #[serde(default)]
    pub frame: f32,
}

impl Body {
    /// Create a resting body at (`x`, `y`) using the tuned kinematics
    pub fn new(x: f32, y: f32, tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(tuning.body_width, tuning.body_height),
            velocity: 0.0,
            gravity: tuning.gravity,
            jump_impulse: tuning.jump_impulse,
            velocity_ceiling: tuning.velocity_ceiling,
            jump_reentry_threshold: tuning.jump_reentry_threshold,
            smoothed_velocity: 0.0,
            rotation: 0.0,
            frame: 0.0,
        }
    }

    /// Advance by `dt` reference frames
    pub fn integrate(&mut self, dt: f32) {
        self.velocity += self.gravity * dt;
        self.velocity = self.velocity.min(self.velocity_ceiling);
        self.pos.y += self.velocity * dt;

        self.smoothed_velocity += (self.velocity - self.smoothed_velocity) * SMOOTHING_FACTOR;
        self.rotation = clamp_f32(self.smoothed_velocity * ROTATION_FACTOR, -MAX_ROTATION, MAX_ROTATION);
    }

    /// Apply the jump impulse unless the body is still rising fast from the
    /// previous one. Returns whether the jump was taken.
    pub fn try_jump(&mut self) -> bool {
        if self.velocity > self.jump_reentry_threshold {
            self.velocity = self.jump_impulse;
            true
        } else {
            false
        }
    }

    /// Step the flap animation, wrapping at `frame_count`
    pub fn animate(&mut self, speed: f32, frame_count: f32, dt: f32) {
        self.frame += speed * dt;
        if self.frame >= frame_count {
            self.frame = 0.0;
        }
    }

    /// True once the top leaves the playfield or the bottom sinks below it
    pub fn out_of_bounds(&self, playfield_height: f32) -> bool {
        self.top() < 0.0 || self.bottom() > playfield_height
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }
}
