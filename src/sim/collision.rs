//! Collision detection and response for axis-aligned boxes
//!
//! Pure functions over entity bounds. No swept tests: the fixed step is
//! small enough relative to entity sizes that overlap checks after
//! integration are sufficient.

use glam::Vec2;

use super::entity::{Body, Rect};

/// Play-field limits for balls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    /// Anything whose top edge passes this is lost
    pub bottom: f32,
}

/// Outcome of containing a ball in the arena
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryHit {
    /// Reflected off a side wall or the ceiling
    pub bounced: bool,
    /// Fell out through the bottom
    pub lost: bool,
}

/// Which velocity component a brick impact flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Reflect a ball off the side walls and ceiling, flag it when it falls out.
///
/// Reflection forces the velocity away from the wall it touched, so a ball
/// pushed into a wall by some other response can't get stuck flipping.
pub fn contain_in_arena(body: &mut Body, arena: &ArenaBounds) -> BoundaryHit {
    let mut hit = BoundaryHit::default();

    if body.pos.x <= arena.left {
        body.pos.x = arena.left;
        body.vel.x = body.vel.x.abs();
        hit.bounced = true;
    } else if body.pos.x + body.width >= arena.right {
        body.pos.x = arena.right - body.width;
        body.vel.x = -body.vel.x.abs();
        hit.bounced = true;
    }

    if body.pos.y <= arena.top {
        body.pos.y = arena.top;
        body.vel.y = body.vel.y.abs();
        hit.bounced = true;
    }

    if body.pos.y > arena.bottom {
        hit.lost = true;
    }

    hit
}

/// Ball centre relative to paddle centre, normalized to [-1, 1]
pub fn paddle_offset(ball: &Rect, paddle: &Rect) -> f32 {
    let half = paddle.w / 2.0;
    if half <= 0.0 {
        return 0.0;
    }
    ((ball.center().x - paddle.center().x) / half).clamp(-1.0, 1.0)
}

/// Upward velocity of magnitude `speed` at `angle` radians from vertical
/// (positive leans right)
pub fn launch_velocity(angle: f32, speed: f32) -> Vec2 {
    Vec2::new(speed * angle.sin(), -(speed * angle.cos()).abs())
}

/// Unit heading for a ball striking the paddle: up to `max_angle_deg` off
/// vertical depending on where it landed. `None` when there is no contact
/// or the ball is already moving up.
pub fn deflect_off_paddle(ball: &Body, paddle: &Body, max_angle_deg: f32) -> Option<Vec2> {
    if ball.vel.y <= 0.0 {
        return None;
    }
    let ball_rect = ball.bounds();
    let paddle_rect = paddle.bounds();
    if !ball_rect.intersects(&paddle_rect) {
        return None;
    }
    let offset = paddle_offset(&ball_rect, &paddle_rect);
    let angle = (max_angle_deg * offset).to_radians();
    Some(launch_velocity(angle, 1.0))
}

/// Approximate face of impact from the overlap shape: a wide, flat overlap
/// means a top/bottom hit (flip Y), a tall one a side hit (flip X)
pub fn brick_bounce_axis(ball: &Rect, brick: &Rect) -> Option<Axis> {
    let overlap = ball.intersection(brick)?;
    if overlap.w >= overlap.h {
        Some(Axis::Y)
    } else {
        Some(Axis::X)
    }
}

/// Rescale `vel` to magnitude `speed`; a zero vector stays zero
pub fn renormalize(vel: Vec2, speed: f32) -> Vec2 {
    let length = vel.length();
    if length == 0.0 {
        return vel;
    }
    vel * (speed / length)
}

/// Rotate a velocity by `angle` radians
pub fn rotate(vel: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(vel)
}
