//! Paddle-mounted gun
//!
//! While active, fires a twin burst from the paddle's edges every
//! `fire_interval` seconds. Bullets fly straight up and are spent on the
//! first live brick they touch. Deactivates itself when the duration runs
//! out, taking any bullets in flight with it.

use glam::Vec2;

use super::entity::{Entity, Rect};
use super::state::{Brick, Bullet, Paddle};
use crate::consts::*;

/// A hit landed on a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrickStrike {
    /// Index into the session's brick list
    pub index: usize,
    /// This hit destroyed the brick
    pub destroyed: bool,
}

#[derive(Debug, Clone)]
pub struct PaddleGun {
    bullets: Vec<Bullet>,
    duration: f32,
    fire_interval: f32,
    timer: f32,
    cooldown: f32,
    active: bool,
    next_id: u32,
}

impl PaddleGun {
    pub fn new(duration: f32, fire_interval: f32) -> Self {
        Self {
            bullets: Vec::new(),
            duration,
            fire_interval,
            timer: 0.0,
            cooldown: 0.0,
            active: false,
            next_id: 1,
        }
    }

    /// Switch off and drop bullets in flight
    pub fn reset(&mut self) {
        self.bullets.clear();
        self.timer = 0.0;
        self.cooldown = 0.0;
        self.active = false;
    }

    /// (Re)arm for a full duration; the first burst fires on the next update
    pub fn activate(&mut self) {
        self.active = true;
        self.timer = self.duration;
        self.cooldown = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds of fire left
    pub fn time_remaining(&self) -> f32 {
        if self.active { self.timer } else { 0.0 }
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// Advance timers, fire, move bullets and resolve bullet-brick hits
    pub fn update(&mut self, dt: f32, paddle: &Paddle, bricks: &mut [Brick]) -> Vec<BrickStrike> {
        if !self.active {
            return Vec::new();
        }
        self.timer -= dt;
        self.cooldown -= dt;
        if self.timer <= 0.0 {
            self.reset();
            return Vec::new();
        }
        if self.cooldown <= 0.0 {
            self.fire_burst(paddle);
            self.cooldown = self.fire_interval;
        }
        self.update_bullets(dt, bricks)
    }

    fn fire_burst(&mut self, paddle: &Paddle) {
        let origin_y = paddle.pos().y - GUN_ORIGIN_Y_OFFSET;
        let left_x = paddle.pos().x + GUN_LEFT_OFFSET;
        let right_x = paddle.pos().x + paddle.width() - GUN_RIGHT_OFFSET;
        for x in [left_x, right_x] {
            let id = self.next_id;
            self.next_id += 1;
            self.bullets.push(Bullet::new(id, Vec2::new(x, origin_y)));
        }
    }

    fn update_bullets(&mut self, dt: f32, bricks: &mut [Brick]) -> Vec<BrickStrike> {
        let mut strikes = Vec::new();
        self.bullets.retain_mut(|bullet| {
            bullet.update(dt);
            let bounds: Rect = bullet.bounds();
            if bounds.bottom() < BULLET_CEILING {
                return false;
            }
            let target = bricks
                .iter()
                .position(|b| !b.is_destroyed() && b.bounds().intersects(&bounds));
            match target {
                Some(index) => {
                    let destroyed = bricks[index].hit();
                    strikes.push(BrickStrike { index, destroyed });
                    false
                }
                None => true,
            }
        });
        strikes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::BrickBlueprint;

    fn paddle() -> Paddle {
        Paddle::new(Vec2::new(500.0, 660.0), 120.0, 18.0, 420.0, 240.0)
    }

    fn brick_above(hp: u32) -> Brick {
        let blueprint = BrickBlueprint::new(0, 0, "basic", hp);
        Brick::from_blueprint(1, &blueprint, Rect::new(480.0, 560.0, 160.0, 24.0))
    }

    #[test]
    fn test_inactive_does_nothing() {
        let mut gun = PaddleGun::new(GUN_DURATION, GUN_FIRE_INTERVAL);
        let mut bricks = vec![brick_above(1)];
        assert!(gun.update(0.1, &paddle(), &mut bricks).is_empty());
        assert!(gun.bullets().is_empty());
    }

    #[test]
    fn test_fires_twin_burst_on_interval() {
        let mut gun = PaddleGun::new(GUN_DURATION, GUN_FIRE_INTERVAL);
        gun.activate();
        gun.update(0.01, &paddle(), &mut []);
        assert_eq!(gun.bullets().len(), 2);
        let xs: Vec<f32> = gun.bullets().iter().map(|b| b.pos().x).collect();
        assert_eq!(xs, vec![510.0, 604.0]);

        // No new burst until the interval elapses
        gun.update(0.1, &paddle(), &mut []);
        assert_eq!(gun.bullets().len(), 2);
        gun.update(0.2, &paddle(), &mut []);
        assert_eq!(gun.bullets().len(), 4);
    }

    #[test]
    fn test_bullet_hits_brick_and_is_spent() {
        let mut gun = PaddleGun::new(GUN_DURATION, 10.0);
        gun.activate();
        let mut bricks = vec![brick_above(2)];
        let mut strikes = Vec::new();
        for _ in 0..30 {
            strikes.extend(gun.update(1.0 / 60.0, &paddle(), &mut bricks));
        }
        assert_eq!(
            strikes,
            vec![
                BrickStrike { index: 0, destroyed: false },
                BrickStrike { index: 0, destroyed: true },
            ]
        );
        assert!(bricks[0].is_destroyed());
        assert!(gun.bullets().is_empty());
    }

    #[test]
    fn test_bullets_leave_through_ceiling() {
        let mut gun = PaddleGun::new(GUN_DURATION, 100.0);
        gun.activate();
        for _ in 0..120 {
            gun.update(1.0 / 60.0, &paddle(), &mut []);
        }
        assert!(gun.is_active());
        assert!(gun.bullets().is_empty());
    }

    #[test]
    fn test_expires_after_duration() {
        let mut gun = PaddleGun::new(1.0, GUN_FIRE_INTERVAL);
        gun.activate();
        gun.update(0.5, &paddle(), &mut []);
        assert!(gun.is_active());
        gun.update(0.6, &paddle(), &mut []);
        assert!(!gun.is_active());
        assert!(gun.bullets().is_empty());
        assert_eq!(gun.time_remaining(), 0.0);
    }
}
