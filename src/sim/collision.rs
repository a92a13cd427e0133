//! Collision detection and response for the rectangular playfield
//!
//! Walls use clamp-and-force-sign rather than a naive velocity negate so a
//! ball overlapping a corner cannot oscillate in place. The paddle bounce
//! carries the steering mechanic: outgoing horizontal velocity is set from
//! the contact offset, not reflected.

use glam::Vec2;

pub use super::rect::Rect;
use crate::clampf;

/// Resolve ball contact with the side and top walls in place.
/// Returns true if any wall was touched this step. The bottom edge is
/// open; ball loss is handled by the caller.
pub fn confine_to_walls(pos: &mut Vec2, vel: &mut Vec2, radius: f32, field_w: f32) -> bool {
    let mut touched = false;

    if pos.x + radius > field_w {
        pos.x = field_w - radius;
        vel.x = -vel.x.abs();
        touched = true;
    } else if pos.x - radius < 0.0 {
        pos.x = radius;
        vel.x = vel.x.abs();
        touched = true;
    }

    if pos.y - radius < 0.0 {
        pos.y = radius;
        vel.y = vel.y.abs();
        touched = true;
    }

    touched
}

/// Resolve ball contact with the paddle in place.
///
/// Only resolved while the ball is moving downward, which prevents a
/// double bounce on resting contact. On hit the ball is clamped above the
/// paddle surface, vertical velocity inverts, and horizontal velocity is
/// set proportionally to the offset from paddle center, clamped to
/// `steer_max`. Returns true if the bounce happened.
pub fn paddle_bounce(
    pos: &mut Vec2,
    vel: &mut Vec2,
    radius: f32,
    paddle: &Rect,
    steer_factor: f32,
    steer_max: f32,
) -> bool {
    if vel.y <= 0.0 {
        return false;
    }
    if !paddle.overlaps_circle(*pos, radius) {
        return false;
    }

    pos.y = paddle.top() - radius;
    vel.y = -vel.y.abs();
    let offset = pos.x - paddle.center().x;
    vel.x = clampf(offset * steer_factor, -steer_max, steer_max);
    true
}

/// True once the ball's bottom edge has crossed the open bottom of the
/// field. The paddle check runs first, so a ball this low was missed.
#[inline]
pub fn below_field(pos: Vec2, radius: f32, field_h: f32) -> bool {
    pos.y + radius > field_h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_wall_clamps_and_forces_sign() {
        let mut pos = Vec2::new(798.0, 100.0);
        let mut vel = Vec2::new(3.0, -3.0);
        assert!(confine_to_walls(&mut pos, &mut vel, 7.0, 800.0));
        assert_eq!(pos.x, 793.0);
        assert!(vel.x < 0.0);
    }

    #[test]
    fn test_corner_overlap_cannot_stick() {
        // Ball jammed into the top-left corner with velocity already
        // pointing at the corner: both components must come out forced
        // away, not merely negated back and forth.
        let mut pos = Vec2::new(2.0, 2.0);
        let mut vel = Vec2::new(-3.0, -3.0);
        assert!(confine_to_walls(&mut pos, &mut vel, 7.0, 800.0));
        assert_eq!(pos, Vec2::new(7.0, 7.0));
        assert!(vel.x > 0.0 && vel.y > 0.0);

        // A second resolve is a no-op
        let before = (pos, vel);
        confine_to_walls(&mut pos, &mut vel, 7.0, 800.0);
        assert_eq!((pos, vel), before);
    }

    #[test]
    fn test_wall_miss() {
        let mut pos = Vec2::new(400.0, 200.0);
        let mut vel = Vec2::new(3.0, 3.0);
        assert!(!confine_to_walls(&mut pos, &mut vel, 7.0, 800.0));
        assert_eq!(pos, Vec2::new(400.0, 200.0));
    }

    #[test]
    fn test_paddle_bounce_steers_from_offset() {
        let paddle = Rect::new(Vec2::new(350.0, 428.0), Vec2::new(100.0, 12.0));
        // Contact 30px right of center, moving down
        let mut pos = Vec2::new(430.0, 430.0);
        let mut vel = Vec2::new(1.0, 3.0);
        assert!(paddle_bounce(&mut pos, &mut vel, 7.0, &paddle, 0.2, 8.0));
        assert!(vel.y < 0.0);
        assert!((vel.x - 6.0).abs() < 1e-4);
        // Clamped above the paddle surface
        assert_eq!(pos.y, paddle.top() - 7.0);
    }

    #[test]
    fn test_paddle_bounce_clamps_steer() {
        let paddle = Rect::new(Vec2::new(350.0, 428.0), Vec2::new(100.0, 12.0));
        // Far-edge contact would steer past the clamp without it
        let mut pos = Vec2::new(449.0, 430.0);
        let mut vel = Vec2::new(0.0, 3.0);
        assert!(paddle_bounce(&mut pos, &mut vel, 7.0, &paddle, 0.2, 8.0));
        assert!((vel.x - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_paddle_ignores_upward_ball() {
        let paddle = Rect::new(Vec2::new(350.0, 428.0), Vec2::new(100.0, 12.0));
        let mut pos = Vec2::new(400.0, 430.0);
        let mut vel = Vec2::new(2.0, -3.0);
        assert!(!paddle_bounce(&mut pos, &mut vel, 7.0, &paddle, 0.2, 8.0));
        assert_eq!(vel, Vec2::new(2.0, -3.0));
    }

    #[test]
    fn test_below_field_at_bottom_edge() {
        // Lost as soon as the bottom edge crosses the floor line, not
        // once the whole ball is out of view
        assert!(!below_field(Vec2::new(10.0, 440.0), 7.0, 450.0));
        assert!(!below_field(Vec2::new(10.0, 443.0), 7.0, 450.0));
        assert!(below_field(Vec2::new(10.0, 443.5), 7.0, 450.0));
        assert!(below_field(Vec2::new(10.0, 458.0), 7.0, 450.0));
    }
}
