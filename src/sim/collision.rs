//! Collision detection between the body and the obstacle queue
//!
//! The body's hit-box is inset from its sprite rectangle so grazing a pipe
//! edge with a transparent sprite corner does not end the run.

use super::body::Body;
use super::obstacle::Obstacle;

/// Axis-aligned rectangle used for hit tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitBox {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl HitBox {
    /// The body's bounding rectangle shrunk by `inset` on every side
    pub fn inset(body: &Body, inset: f32) -> Self {
        Self {
            left: body.left() + inset,
            right: body.right() - inset,
            top: body.top() + inset,
            bottom: body.bottom() - inset,
        }
    }

    /// True if the box overlaps either pipe of `obstacle`
    pub fn hits(&self, obstacle: &Obstacle, obstacle_width: f32) -> bool {
        let overlaps_x =
            self.right > obstacle.x && self.left < obstacle.trailing_edge(obstacle_width);
        if !overlaps_x {
            return false;
        }
        let hits_top = self.top < obstacle.gap_top();
        let hits_bottom = self.bottom > obstacle.gap_bottom();
        hits_top || hits_bottom
    }
}

/// Check the body against every obstacle. Pure: no state is touched.
pub fn check_collision<'a>(
    body: &Body,
    obstacles: impl IntoIterator<Item = &'a Obstacle>,
    obstacle_width: f32,
    inset: f32,
) -> bool {
    let hitbox = HitBox::inset(body, inset);
    obstacles
        .into_iter()
        .any(|obstacle| hitbox.hits(obstacle, obstacle_width))
}
