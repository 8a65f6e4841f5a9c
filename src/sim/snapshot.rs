//! Read-only frame snapshots
//!
//! Built once per scheduler iteration after all fixed steps have run, and
//! handed to render/audio sinks. Nothing here points back into the session.

use serde::Serialize;

use super::entity::Entity;
use super::objectives::ObjectiveState;
use super::session::{SessionPhase, StatusMessage};
use super::state::{Ball, Brick, Bullet, Paddle, PowerUp, PowerUpKind, Rgb};
use crate::consts::BRICK_SCORE_PER_HP;

const PADDLE_FILL: Rgb = 0x4FC3F7;
const PADDLE_BORDER: Rgb = 0x0288D1;
const BULLET_FILL: Rgb = 0xFFF59D;

/// What an [`EntityView`] depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Paddle,
    Ball,
    Brick,
    PowerUp(PowerUpKind),
    Bullet,
}

/// Visual state flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisualTag {
    /// Ball is piercing
    FireActive,
    /// Brick has taken at least one hit
    Damaged,
    /// Paddle is wider than its base width
    Expanded,
    /// Paddle gun is firing
    Armed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    pub id: u32,
    pub kind: EntityKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Rgb,
    pub border: Rgb,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<VisualTag>,
    /// Ball trail, oldest first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trail: Vec<[f32; 2]>,
    /// Capsule letter or remaining brick strength
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl EntityView {
    fn from_entity(id: u32, kind: EntityKind, entity: &impl Entity, fill: Rgb, border: Rgb) -> Self {
        let pos = entity.pos();
        Self {
            id,
            kind,
            x: pos.x,
            y: pos.y,
            width: entity.width(),
            height: entity.height(),
            fill,
            border,
            tags: Vec::new(),
            trail: Vec::new(),
            label: None,
        }
    }

    pub fn paddle(paddle: &Paddle, armed: bool) -> Self {
        let mut view = Self::from_entity(0, EntityKind::Paddle, paddle, PADDLE_FILL, PADDLE_BORDER);
        if paddle.width() > paddle.base_width {
            view.tags.push(VisualTag::Expanded);
        }
        if armed {
            view.tags.push(VisualTag::Armed);
        }
        view
    }

    pub fn ball(ball: &Ball) -> Self {
        let skin = ball.skin();
        let mut view = Self::from_entity(ball.id, EntityKind::Ball, ball, skin.fill, skin.border);
        if ball.is_fire_active() {
            view.tags.push(VisualTag::FireActive);
        }
        view.trail = ball.trail.iter().map(|p| [p.x, p.y]).collect();
        view
    }

    pub fn brick(brick: &Brick) -> Self {
        let color = brick.color();
        let mut view = Self::from_entity(brick.id, EntityKind::Brick, brick, color, color);
        if brick.hit_points * BRICK_SCORE_PER_HP < brick.score_value {
            view.tags.push(VisualTag::Damaged);
        }
        if brick.hit_points > 1 {
            view.label = Some(brick.hit_points.to_string());
        }
        view
    }

    pub fn power_up(power_up: &PowerUp) -> Self {
        let color = power_up.kind.color();
        let mut view = Self::from_entity(
            power_up.id,
            EntityKind::PowerUp(power_up.kind),
            power_up,
            color,
            color,
        );
        view.label = Some(power_up.kind.symbol().to_string());
        view
    }

    pub fn bullet(bullet: &Bullet) -> Self {
        Self::from_entity(bullet.id, EntityKind::Bullet, bullet, BULLET_FILL, BULLET_FILL)
    }
}

/// Everything a sink needs to present one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    /// Fixed steps simulated so far
    pub tick: u64,
    pub level_id: String,
    pub level_name: String,
    pub level_index: usize,
    pub score: u64,
    pub lives: u32,
    pub phase: SessionPhase,
    pub paused: bool,
    pub status: Option<StatusMessage>,
    pub ball_speed: f32,
    pub gun_time_remaining: f32,
    /// Live entities only; destroyed bricks are never listed
    pub entities: Vec<EntityView>,
    pub objectives: Vec<ObjectiveState>,
}

impl FrameSnapshot {
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }

    pub fn balls(&self) -> impl Iterator<Item = &EntityView> {
        self.entities.iter().filter(|e| e.kind == EntityKind::Ball)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
