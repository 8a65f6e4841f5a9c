//! Power-up capsules
//!
//! Spawned by a Bernoulli roll when a brick is destroyed, fall at constant
//! speed, and are either caught by the paddle or lost off the bottom. The
//! session applies the effect of whatever gets caught.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{Entity, Rect};
use super::state::{Brick, PowerUp, PowerUpKind};

#[derive(Debug, Clone)]
pub struct PowerUpSystem {
    capsules: Vec<PowerUp>,
    drop_chance: f64,
    size: f32,
    next_id: u32,
}

impl PowerUpSystem {
    pub fn new(drop_chance: f64, size: f32) -> Self {
        Self {
            capsules: Vec::new(),
            drop_chance: drop_chance.clamp(0.0, 1.0),
            size,
            next_id: 1,
        }
    }

    /// Drop every capsule in flight
    pub fn reset(&mut self) {
        self.capsules.clear();
    }

    /// Roll for a drop centred on `brick`; returns the kind spawned
    pub fn maybe_spawn_from(&mut self, brick: &Brick, rng: &mut Pcg32) -> Option<PowerUpKind> {
        if !rng.random_bool(self.drop_chance) {
            return None;
        }
        let kind = PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())];
        let pos = brick.body.center() - Vec2::splat(self.size / 2.0);
        self.spawn(kind, pos);
        Some(kind)
    }

    /// Place a capsule with its top-left at `pos`
    pub fn spawn(&mut self, kind: PowerUpKind, pos: Vec2) {
        let id = self.next_id;
        self.next_id += 1;
        self.capsules.push(PowerUp::new(id, kind, pos, self.size));
    }

    /// Fall, expire below `arena_bottom`, and return kinds caught by the paddle
    /// in spawn order
    pub fn update(&mut self, dt: f32, paddle: &Rect, arena_bottom: f32) -> Vec<PowerUpKind> {
        let mut collected = Vec::new();
        self.capsules.retain_mut(|capsule| {
            capsule.update(dt);
            if capsule.pos().y > arena_bottom {
                return false;
            }
            if capsule.bounds().intersects(paddle) {
                collected.push(capsule.kind);
                return false;
            }
            true
        });
        collected
    }

    pub fn iter(&self) -> impl Iterator<Item = &PowerUp> {
        self.capsules.iter()
    }

    pub fn len(&self) -> usize {
        self.capsules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capsules.is_empty()
    }
}
