//! Arena entities
//!
//! Plain data plus the small amount of behaviour each entity owns. The
//! session is the only mutator; entities never reference each other.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Entity, Rect};
use crate::consts::*;
use crate::level::BrickBlueprint;

/// Packed 0xRRGGBB colour
pub type Rgb = u32;

const FIRE_TINT: Rgb = 0xFFA500;
const FIRE_BORDER: Rgb = 0xB27300;

/// Linear blend of two colours, `ratio` clamped to [0, 1]
pub fn blend(a: Rgb, b: Rgb, ratio: f32) -> Rgb {
    let r = ratio.clamp(0.0, 1.0);
    let channel = |shift: u32| {
        let ca = ((a >> shift) & 0xFF) as f32;
        let cb = ((b >> shift) & 0xFF) as f32;
        ((ca * (1.0 - r) + cb * r) as u32).min(0xFF) << shift
    };
    channel(16) | channel(8) | channel(0)
}

/// Fill/border colour pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skin {
    pub fill: Rgb,
    pub border: Rgb,
}

impl Default for Skin {
    fn default() -> Self {
        Self {
            fill: 0xECEFF1,
            border: 0x90A4AE,
        }
    }
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub body: Body,
    /// Colours when not on fire
    pub base_skin: Skin,
    /// Seconds of piercing left (0 = inactive)
    pub fire_timer: f32,
    /// Recent centre points (oldest first)
    #[serde(skip)]
    pub trail: VecDeque<Vec2>,
}

impl Entity for Ball {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, dt: f32) {
        self.body.integrate(dt);
        if self.fire_timer > 0.0 {
            self.fire_timer = (self.fire_timer - dt).max(0.0);
        }
        if self.body.vel != Vec2::ZERO {
            self.trail.push_back(self.body.center());
            if self.trail.len() > TRAIL_LENGTH {
                self.trail.pop_front();
            }
        }
    }
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, size: f32, skin: Skin) -> Self {
        Self {
            id,
            body: Body::new(pos, size, size),
            base_skin: skin,
            fire_timer: 0.0,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
        }
    }

    pub fn set_velocity(&mut self, vel: Vec2) {
        self.body.vel = vel;
    }

    pub fn invert_x(&mut self) {
        self.body.vel.x = -self.body.vel.x;
    }

    pub fn invert_y(&mut self) {
        self.body.vel.y = -self.body.vel.y;
    }

    /// Park the ball: place it, stop it, forget the trail
    pub fn reset_position(&mut self, pos: Vec2) {
        self.body.pos = pos;
        self.body.vel = Vec2::ZERO;
        self.trail.clear();
    }

    /// Enable piercing; never shortens a longer remaining timer
    pub fn set_fire(&mut self, duration: f32) {
        self.fire_timer = self.fire_timer.max(duration.max(0.0));
    }

    pub fn clear_fire(&mut self) {
        self.fire_timer = 0.0;
    }

    pub fn is_fire_active(&self) -> bool {
        self.fire_timer > 0.0
    }

    /// Colours currently shown
    pub fn skin(&self) -> Skin {
        if self.is_fire_active() {
            Skin {
                fill: blend(self.base_skin.fill, FIRE_TINT, 0.6),
                border: FIRE_BORDER,
            }
        } else {
            self.base_skin
        }
    }

    /// Copy with a new id: same position, velocity, skin and fire time, empty trail
    pub fn duplicate(&self, id: u32) -> Self {
        Self {
            id,
            body: self.body,
            base_skin: self.base_skin,
            fire_timer: self.fire_timer,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
        }
    }

    pub fn speed(&self) -> f32 {
        self.body.vel.length()
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub body: Body,
    /// Horizontal movement speed (pixels/s)
    pub speed: f32,
    /// Width restored after a life is lost
    pub base_width: f32,
    /// Upper bound for power-up growth
    pub max_width: f32,
}

impl Entity for Paddle {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Paddle {
    pub fn new(pos: Vec2, width: f32, height: f32, speed: f32, max_width: f32) -> Self {
        Self {
            body: Body::new(pos, width, height),
            speed,
            base_width: width,
            max_width: max_width.max(width),
        }
    }

    pub fn move_left(&mut self) {
        self.body.vel.x = -self.speed;
    }

    pub fn move_right(&mut self) {
        self.body.vel.x = self.speed;
    }

    pub fn stop(&mut self) {
        self.body.vel.x = 0.0;
    }

    /// Resize around the current left edge, clamped to [0, max_width]
    pub fn set_width(&mut self, width: f32) {
        self.body.width = width.clamp(0.0, self.max_width);
    }

    pub fn reset_width(&mut self) {
        self.body.width = self.base_width;
    }

    /// Keep the paddle within [min_x, max_x]
    pub fn clamp(&mut self, min_x: f32, max_x: f32) {
        if self.body.pos.x < min_x {
            self.body.pos.x = min_x;
        }
        if self.body.pos.x + self.body.width > max_x {
            self.body.pos.x = max_x - self.body.width;
        }
    }

    pub fn center_x(&self) -> f32 {
        self.body.pos.x + self.body.width / 2.0
    }
}

/// A brick placed from a level blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: u32,
    pub body: Body,
    pub hit_points: u32,
    pub score_value: u32,
    pub column: u32,
    pub row: u32,
    pub brick_type: String,
    pub tags: Vec<String>,
    pub modifiers: Vec<String>,
}

impl Entity for Brick {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Brick {
    pub fn from_blueprint(id: u32, blueprint: &BrickBlueprint, rect: Rect) -> Self {
        let hit_points = blueprint.hit_points.max(1);
        Self {
            id,
            body: Body::new(Vec2::new(rect.x, rect.y), rect.w, rect.h),
            hit_points,
            score_value: BRICK_SCORE_PER_HP * hit_points,
            column: blueprint.column,
            row: blueprint.row,
            brick_type: blueprint.brick_type.clone(),
            tags: blueprint.tags.clone(),
            modifiers: blueprint.modifiers.clone(),
        }
    }

    /// Apply one hit. Returns true only for the hit that destroys the brick.
    pub fn hit(&mut self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        self.hit_points -= 1;
        self.is_destroyed()
    }

    pub fn is_destroyed(&self) -> bool {
        self.hit_points == 0
    }

    /// Display colour by remaining strength
    pub fn color(&self) -> Rgb {
        match self.hit_points.max(1) {
            1 => 0xFF7043,
            2 => 0xFFA000,
            3 => 0xF44336,
            _ => 0x9C27B0,
        }
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerUpKind {
    ExpandPaddle,
    SlowBall,
    MultiBall,
    ExtraLife,
    FireBall,
    PaddleGun,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::ExpandPaddle,
        PowerUpKind::SlowBall,
        PowerUpKind::MultiBall,
        PowerUpKind::ExtraLife,
        PowerUpKind::FireBall,
        PowerUpKind::PaddleGun,
    ];

    /// Letter drawn on the capsule
    pub fn symbol(&self) -> char {
        match self {
            PowerUpKind::ExpandPaddle => 'E',
            PowerUpKind::SlowBall => 'S',
            PowerUpKind::MultiBall => 'M',
            PowerUpKind::ExtraLife => 'L',
            PowerUpKind::FireBall => 'F',
            PowerUpKind::PaddleGun => 'G',
        }
    }

    pub fn color(&self) -> Rgb {
        match self {
            PowerUpKind::ExpandPaddle => 0x8BC34A,
            PowerUpKind::SlowBall => 0xFFEB3B,
            PowerUpKind::MultiBall => 0x7E57C2,
            PowerUpKind::ExtraLife => 0xFFD54F,
            PowerUpKind::FireBall => 0xFF5722,
            PowerUpKind::PaddleGun => 0x03A9F4,
        }
    }
}

/// A falling power-up capsule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub body: Body,
}

impl Entity for PowerUp {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl PowerUp {
    pub fn new(id: u32, kind: PowerUpKind, pos: Vec2, size: f32) -> Self {
        Self {
            id,
            kind,
            body: Body::new(pos, size, size).with_velocity(Vec2::new(0.0, POWERUP_FALL_SPEED)),
        }
    }
}

/// A paddle-gun bullet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub body: Body,
}

impl Entity for Bullet {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Bullet {
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            body: Body::new(pos, BULLET_WIDTH, BULLET_HEIGHT)
                .with_velocity(Vec2::new(0.0, -BULLET_SPEED)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brick(hp: u32) -> Brick {
        let blueprint = BrickBlueprint::new(2, 1, "basic", hp).with_tags(&["gold"]);
        Brick::from_blueprint(1, &blueprint, Rect::new(100.0, 90.0, 60.0, 24.0))
    }

    #[test]
    fn test_brick_from_blueprint() {
        let b = brick(3);
        assert_eq!(b.hit_points, 3);
        assert_eq!(b.score_value, 150);
        assert_eq!((b.column, b.row), (2, 1));
        assert_eq!(b.tags, vec!["gold".to_string()]);
        assert_eq!(b.bounds(), Rect::new(100.0, 90.0, 60.0, 24.0));
    }

    #[test]
    fn test_brick_hit_idempotent_after_destruction() {
        let mut b = brick(2);
        assert!(!b.hit());
        assert!(b.hit());
        assert!(b.is_destroyed());
        // Further hits are no-ops and never report a second destruction
        assert!(!b.hit());
        assert!(!b.hit());
        assert_eq!(b.hit_points, 0);
    }

    #[test]
    fn test_paddle_clamp() {
        let mut paddle = Paddle::new(Vec2::new(590.0, 660.0), 120.0, 18.0, 420.0, 240.0);
        paddle.move_right();
        paddle.update(0.5);
        paddle.clamp(215.0, 1025.0);
        assert_eq!(paddle.body.pos.x, 800.0);

        paddle.update(1.0);
        paddle.clamp(215.0, 1025.0);
        assert_eq!(paddle.body.pos.x, 905.0);

        paddle.move_left();
        paddle.update(10.0);
        paddle.clamp(215.0, 1025.0);
        assert_eq!(paddle.body.pos.x, 215.0);
    }

    #[test]
    fn test_paddle_width_clamped_and_restored() {
        let mut paddle = Paddle::new(Vec2::ZERO, 120.0, 18.0, 420.0, 240.0);
        paddle.set_width(500.0);
        assert_eq!(paddle.width(), 240.0);
        paddle.reset_width();
        assert_eq!(paddle.width(), 120.0);
    }

    #[test]
    fn test_ball_trail_is_bounded() {
        let mut ball = Ball::new(1, Vec2::ZERO, 14.0, Skin::default());
        ball.update(0.1);
        assert!(ball.trail.is_empty(), "stationary ball leaves no trail");

        ball.set_velocity(Vec2::new(10.0, 0.0));
        for _ in 0..20 {
            ball.update(0.1);
        }
        assert_eq!(ball.trail.len(), TRAIL_LENGTH);
        // Newest point is the current centre
        assert_eq!(*ball.trail.back().unwrap(), ball.body.center());

        ball.reset_position(Vec2::new(5.0, 5.0));
        assert!(ball.trail.is_empty());
        assert_eq!(ball.vel(), Vec2::ZERO);
    }

    #[test]
    fn test_ball_fire_timer() {
        let mut ball = Ball::new(1, Vec2::ZERO, 14.0, Skin::default());
        ball.set_fire(1.0);
        ball.set_fire(0.5);
        assert!(ball.is_fire_active());
        assert_ne!(ball.skin(), ball.base_skin);

        ball.update(0.6);
        assert!(ball.is_fire_active());
        ball.update(0.5);
        assert!(!ball.is_fire_active());
        assert_eq!(ball.skin(), ball.base_skin);
    }

    #[test]
    fn test_ball_duplicate() {
        let mut ball = Ball::new(1, Vec2::new(3.0, 4.0), 14.0, Skin::default());
        ball.set_velocity(Vec2::new(1.0, -1.0));
        ball.set_fire(2.0);
        ball.update(0.1);
        let copy = ball.duplicate(9);
        assert_eq!(copy.id, 9);
        assert_eq!(copy.body, ball.body);
        assert_eq!(copy.fire_timer, ball.fire_timer);
        assert!(copy.trail.is_empty());
    }

    #[test]
    fn test_powerup_falls() {
        let mut p = PowerUp::new(1, PowerUpKind::MultiBall, Vec2::new(0.0, 100.0), POWERUP_SIZE);
        p.update(0.5);
        assert_eq!(p.pos().y, 100.0 + POWERUP_FALL_SPEED * 0.5);
    }

    #[test]
    fn test_bullet_rises() {
        let mut b = Bullet::new(1, Vec2::new(0.0, 600.0));
        b.update(0.5);
        assert_eq!(b.pos().y, 600.0 - BULLET_SPEED * 0.5);
    }

    #[test]
    fn test_blend() {
        assert_eq!(blend(0x000000, 0xFFFFFF, 0.0), 0x000000);
        assert_eq!(blend(0x000000, 0xFFFFFF, 1.0), 0xFFFFFF);
        assert_eq!(blend(0x000000, 0x0000FF, 2.0), 0x0000FF);
    }
}
