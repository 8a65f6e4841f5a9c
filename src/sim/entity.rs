//! Axis-aligned entity base
//!
//! Every moving thing in the arena is a box with a top-left position, a
//! velocity and a size. Specialized entities embed a [`Body`] and expose it
//! through the [`Entity`] trait, which supplies the shared integrator.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 2D point / velocity
pub type Vector2D = Vec2;

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap test; touching edges do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.w > 0.0
            && self.h > 0.0
            && other.w > 0.0
            && other.h > 0.0
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Overlap rectangle, `None` when the rectangles don't intersect
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right - x, bottom - y))
    }
}

/// Position, velocity and size shared by all entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Body {
    /// Negative sizes are clamped to zero
    pub fn new(pos: Vec2, width: f32, height: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    /// Explicit Euler step
    #[inline]
    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }
}

/// Common behaviour of arena entities
pub trait Entity {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    /// Advance by `dt` seconds (default: integrate velocity)
    fn update(&mut self, dt: f32) {
        self.body_mut().integrate(dt);
    }

    fn bounds(&self) -> Rect {
        self.body().bounds()
    }

    fn pos(&self) -> Vec2 {
        self.body().pos
    }

    fn vel(&self) -> Vec2 {
        self.body().vel
    }

    fn width(&self) -> f32 {
        self.body().width
    }

    fn height(&self) -> f32 {
        self.body().height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrate() {
        let mut body = Body::new(Vec2::new(10.0, 20.0), 4.0, 4.0).with_velocity(Vec2::new(100.0, -50.0));
        body.integrate(0.5);
        assert_eq!(body.pos, Vec2::new(60.0, -5.0));
    }

    #[test]
    fn test_negative_size_clamped() {
        let body = Body::new(Vec2::ZERO, -3.0, 5.0);
        assert_eq!(body.width, 0.0);
        assert_eq!(body.height, 5.0);
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(6.0, 8.0, 10.0, 10.0);
        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap, Rect::new(6.0, 8.0, 4.0, 2.0));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_empty_rect_never_intersects() {
        let a = Rect::new(0.0, 0.0, 0.0, 10.0);
        let b = Rect::new(-5.0, -5.0, 20.0, 20.0);
        assert!(!a.intersects(&b));
    }
}
