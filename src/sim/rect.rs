//! Axis-aligned rectangle primitive used by all collision tests

use glam::Vec2;

/// An axis-aligned rectangle described by its top-left corner and size.
/// World y grows downward, matching the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    /// Build from a center point
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            pos: center - size / 2.0,
            size,
        }
    }

    pub fn left(&self) -> f32 {
        self.pos.x
    }

    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    pub fn top(&self) -> f32 {
        self.pos.y
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Bounding-box overlap test against a circle. The circle is treated
    /// as its bounding square, which is how the engine always resolved
    /// ball contacts.
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        center.x + radius > self.left()
            && center.x - radius < self.right()
            && center.y + radius > self.top()
            && center.y - radius < self.bottom()
    }

    /// Rectangle-rectangle overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}
