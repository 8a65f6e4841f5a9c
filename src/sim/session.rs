//! Gameplay session
//!
//! Owns every live entity, the objective engine, score and lives, and
//! advances them one fixed step at a time. Nothing outside the session
//! mutates its entities; collaborators read [`FrameSnapshot`]s and drain
//! [`SessionEvent`]s after the step instead.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::collision::{self, ArenaBounds, Axis};
use super::entity::{Entity, Rect};
use super::objectives::{ObjectiveEngine, ObjectiveEvent, ObjectiveNotice};
use super::powerups::PowerUpSystem;
use super::snapshot::{EntityView, FrameSnapshot};
use super::state::{Ball, Brick, Paddle, PowerUpKind, Skin};
use super::weapon::{BrickStrike, PaddleGun};
use crate::config::{ConfigError, SessionConfig};
use crate::consts::*;
use crate::input::{Key, TickInput};
use crate::level::{LevelCatalog, LevelSchema};

/// Where the session is in a level attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    /// Ball parked on the paddle, waiting for launch input
    Serve,
    /// Ball(s) in flight
    Playing,
    /// Out of lives
    GameOver,
    /// Last level of the catalog cleared
    Victory,
}

impl SessionPhase {
    /// Only restart/menu input is accepted
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::GameOver | SessionPhase::Victory)
    }
}

/// HUD status line, serialized as its message key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusMessage {
    #[serde(rename = "gameplay.message.ready")]
    Ready,
    #[serde(rename = "gameplay.message.lifeLost")]
    LifeLost,
    #[serde(rename = "gameplay.message.stageCleared")]
    StageCleared,
    #[serde(rename = "gameplay.message.victory")]
    Victory,
    #[serde(rename = "gameplay.message.gameOver")]
    GameOver,
    #[serde(rename = "gameplay.message.objectiveCompleted")]
    ObjectiveCompleted,
    #[serde(rename = "gameplay.message.objectiveFailed")]
    ObjectiveFailed,
}

impl StatusMessage {
    pub fn key(&self) -> &'static str {
        match self {
            StatusMessage::Ready => "gameplay.message.ready",
            StatusMessage::LifeLost => "gameplay.message.lifeLost",
            StatusMessage::StageCleared => "gameplay.message.stageCleared",
            StatusMessage::Victory => "gameplay.message.victory",
            StatusMessage::GameOver => "gameplay.message.gameOver",
            StatusMessage::ObjectiveCompleted => "gameplay.message.objectiveCompleted",
            StatusMessage::ObjectiveFailed => "gameplay.message.objectiveFailed",
        }
    }
}

/// Outbound notifications for audio/UI, queued during a step
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SessionStarted,
    LevelLoaded {
        level_id: String,
    },
    BallLaunched {
        ball_id: u32,
    },
    WallHit {
        ball_id: u32,
    },
    PaddleHit {
        ball_id: u32,
        speed: f32,
    },
    /// A brick survived a hit
    BrickHit {
        brick_id: u32,
        hit_points: u32,
    },
    BrickDestroyed {
        brick_id: u32,
        column: u32,
        row: u32,
        points: u32,
    },
    PowerUpSpawned {
        kind: PowerUpKind,
    },
    PowerUpCollected {
        kind: PowerUpKind,
    },
    BallLost {
        ball_id: u32,
    },
    LifeLost {
        lives_left: u32,
    },
    LevelCleared {
        level_id: String,
        next_level_id: Option<String>,
    },
    Victory {
        score: u64,
    },
    GameOver {
        score: u64,
    },
    Paused,
    Resumed,
    ReturnToMenu,
    Objective(ObjectiveNotice),
}

/// Place a level's bricks on the grid inside the arena
pub fn layout_bricks(level: &LevelSchema, arena: &ArenaBounds) -> Vec<Brick> {
    let columns = level.board.columns.max(1) as f32;
    let left = arena.left + BRICK_SIDE_PADDING;
    let available = (arena.right - BRICK_SIDE_PADDING) - left;
    let width = ((available - BRICK_GAP * (columns - 1.0)) / columns).max(1.0);

    level
        .bricks
        .iter()
        .enumerate()
        .map(|(i, blueprint)| {
            let x = left + blueprint.column as f32 * (width + BRICK_GAP);
            let y = BRICK_TOP_PADDING + blueprint.row as f32 * (BRICK_HEIGHT + BRICK_GAP);
            Brick::from_blueprint(i as u32 + 1, blueprint, Rect::new(x, y, width, BRICK_HEIGHT))
        })
        .collect()
}

fn spawn_paddle(config: &SessionConfig) -> Paddle {
    let pos = Vec2::new(
        config.center_x() - config.paddle_width / 2.0,
        config.paddle_y(),
    );
    Paddle::new(
        pos,
        config.paddle_width,
        config.paddle_height,
        config.paddle_speed,
        config.paddle_max_width,
    )
}

#[derive(Debug, Clone)]
pub struct GameplaySession {
    config: SessionConfig,
    catalog: LevelCatalog,
    rng: Pcg32,
    arena: ArenaBounds,

    paddle: Paddle,
    balls: Vec<Ball>,
    bricks: Vec<Brick>,
    powerups: PowerUpSystem,
    gun: PaddleGun,
    objectives: ObjectiveEngine,

    score: u64,
    lives: u32,
    /// Target magnitude every live ball is renormalized to
    ball_speed: f32,
    phase: SessionPhase,
    paused: bool,
    active: bool,
    status: Option<StatusMessage>,

    events: Vec<SessionEvent>,
    next_ball_id: u32,
    time_ticks: u64,
}

impl GameplaySession {
    /// Build a session on the first level of `catalog`. The session stays
    /// inactive until [`begin_new_session`](Self::begin_new_session).
    pub fn new(config: SessionConfig, catalog: LevelCatalog) -> Result<Self, ConfigError> {
        config.validate()?;
        let arena = ArenaBounds {
            left: config.left_bound,
            right: config.right_bound,
            top: config.top_bound,
            bottom: config.arena_height,
        };
        let rng = Pcg32::seed_from_u64(config.seed);
        let powerups = PowerUpSystem::new(config.drop_chance, POWERUP_SIZE);
        let gun = PaddleGun::new(config.gun_duration, config.gun_fire_interval);

        let mut session = Self {
            paddle: spawn_paddle(&config),
            lives: config.start_lives,
            ball_speed: config.ball_base_speed,
            config,
            catalog,
            rng,
            arena,
            balls: Vec::new(),
            bricks: Vec::new(),
            powerups,
            gun,
            objectives: ObjectiveEngine::new(),
            score: 0,
            phase: SessionPhase::Serve,
            paused: false,
            active: false,
            status: None,
            events: Vec::new(),
            next_ball_id: 1,
            time_ticks: 0,
        };
        session.load_level();
        session.events.clear();
        Ok(session)
    }

    // === Lifecycle ===

    /// Fresh run from the first level: score and lives reset
    pub fn begin_new_session(&mut self) {
        self.score = 0;
        self.lives = self.config.start_lives;
        self.catalog.reset();
        self.paused = false;
        self.active = true;
        self.load_level();
        self.events.push(SessionEvent::SessionStarted);
        log::info!("New session started (seed {:#x})", self.config.seed);
    }

    /// Reload the current level, keeping score. A run that ran out of lives
    /// gets its starting lives back.
    pub fn restart_level(&mut self) {
        if self.lives == 0 {
            self.lives = self.config.start_lives;
        }
        self.paused = false;
        self.active = true;
        self.load_level();
    }

    pub fn is_session_active(&self) -> bool {
        self.active
    }

    pub fn pause_game(&mut self) {
        if !self.active || self.paused || self.phase.is_terminal() {
            return;
        }
        self.paused = true;
        self.events.push(SessionEvent::Paused);
        log::debug!("Paused");
    }

    pub fn resume_from_pause(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.events.push(SessionEvent::Resumed);
        log::debug!("Resumed");
    }

    /// Leave the session; updates become no-ops until it is restarted
    pub fn end_session(&mut self) {
        self.active = false;
        self.paused = false;
    }

    // === Step ===

    /// Advance the simulation by one fixed step
    pub fn update(&mut self, input: &TickInput, dt: f32) {
        if !self.active || self.paused {
            return;
        }
        if self.phase.is_terminal() {
            self.handle_terminal_input(input);
            return;
        }
        if input.was_pressed(Key::Pause) {
            self.pause_game();
            return;
        }

        self.time_ticks += 1;
        self.update_paddle(input, dt);

        if self.phase == SessionPhase::Serve {
            self.attach_ball();
            if input.was_pressed(Key::Launch) {
                self.launch_ball();
            }
        } else {
            self.update_balls(dt);
        }

        if !self.phase.is_terminal() {
            self.update_weapon(dt);
            self.update_power_ups(dt);
        }

        self.objectives.update(dt);
        self.forward_objective_notices();

        if !self.phase.is_terminal() && self.is_level_complete() {
            self.complete_level();
        }
    }

    fn handle_terminal_input(&mut self, input: &TickInput) {
        if input.was_pressed(Key::Confirm) {
            self.begin_new_session();
        } else if input.was_pressed(Key::Back) {
            self.events.push(SessionEvent::ReturnToMenu);
            self.end_session();
        }
    }

    fn update_paddle(&mut self, input: &TickInput, dt: f32) {
        match input.horizontal() {
            d if d < 0 => self.paddle.move_left(),
            d if d > 0 => self.paddle.move_right(),
            _ => self.paddle.stop(),
        }
        self.paddle.update(dt);
        self.paddle.clamp(self.arena.left, self.arena.right);
    }

    fn serve_position(&self) -> Vec2 {
        let size = self.config.ball_size;
        Vec2::new(
            self.paddle.center_x() - size / 2.0,
            self.paddle.pos().y - size - SERVE_GAP,
        )
    }

    fn attach_ball(&mut self) {
        let pos = self.serve_position();
        if let Some(ball) = self.balls.first_mut() {
            ball.reset_position(pos);
        }
    }

    fn launch_ball(&mut self) {
        let max_angle = self.config.max_bounce_angle_deg;
        let angle = self.rng.random_range(-max_angle..=max_angle).to_radians();
        self.ball_speed = self.config.ball_base_speed;

        let Some(ball) = self.balls.first_mut() else {
            return;
        };
        ball.set_velocity(collision::launch_velocity(angle, self.ball_speed));
        let ball_id = ball.id;

        self.phase = SessionPhase::Playing;
        self.status = None;
        self.events.push(SessionEvent::BallLaunched { ball_id });
        self.objectives.handle_event(&ObjectiveEvent::MoveConsumed);
        log::trace!("Ball {} launched at {:.1} deg", ball_id, angle.to_degrees());
    }

    fn update_balls(&mut self, dt: f32) {
        let max_angle = self.config.max_bounce_angle_deg;
        let mut lost = Vec::new();
        let mut destroyed = Vec::new();

        for (index, ball) in self.balls.iter_mut().enumerate() {
            ball.update(dt);

            let boundary = collision::contain_in_arena(&mut ball.body, &self.arena);
            if boundary.lost {
                lost.push(index);
                continue;
            }
            if boundary.bounced {
                ball.set_velocity(collision::renormalize(ball.vel(), self.ball_speed));
                self.events.push(SessionEvent::WallHit { ball_id: ball.id });
            }

            if let Some(dir) =
                collision::deflect_off_paddle(&ball.body, &self.paddle.body, max_angle)
            {
                self.ball_speed =
                    (self.ball_speed * self.config.paddle_boost).min(self.config.ball_max_speed);
                ball.set_velocity(dir * self.ball_speed);
                ball.body.pos.y = self.paddle.pos().y - ball.height() - 1.0;
                self.events.push(SessionEvent::PaddleHit {
                    ball_id: ball.id,
                    speed: self.ball_speed,
                });
            }

            // First live brick in list order wins
            let ball_rect = ball.bounds();
            let Some(brick_index) = self
                .bricks
                .iter()
                .position(|b| !b.is_destroyed() && b.bounds().intersects(&ball_rect))
            else {
                continue;
            };
            let brick = &mut self.bricks[brick_index];

            let destroyed_now = if ball.is_fire_active() {
                while !brick.is_destroyed() {
                    brick.hit();
                }
                true
            } else {
                match collision::brick_bounce_axis(&ball_rect, &brick.bounds()) {
                    Some(Axis::Y) => ball.invert_y(),
                    Some(Axis::X) => ball.invert_x(),
                    None => {}
                }
                brick.hit()
            };
            ball.set_velocity(collision::renormalize(ball.vel(), self.ball_speed));

            if destroyed_now {
                destroyed.push(brick_index);
            } else {
                self.events.push(SessionEvent::BrickHit {
                    brick_id: brick.id,
                    hit_points: brick.hit_points,
                });
            }
        }

        for index in destroyed {
            self.on_brick_destroyed(index);
        }

        if lost.is_empty() {
            return;
        }
        for &index in lost.iter().rev() {
            let ball = self.balls.remove(index);
            self.events.push(SessionEvent::BallLost { ball_id: ball.id });
        }
        if self.balls.is_empty() {
            self.lose_life();
        }
    }

    fn on_brick_destroyed(&mut self, index: usize) {
        let Some(brick) = self.bricks.get(index) else {
            return;
        };
        let points = brick.score_value;
        self.score += u64::from(points);
        self.events.push(SessionEvent::BrickDestroyed {
            brick_id: brick.id,
            column: brick.column,
            row: brick.row,
            points,
        });

        self.objectives
            .handle_event(&ObjectiveEvent::ScoreAwarded { points });
        self.objectives.handle_event(&ObjectiveEvent::BrickCleared {
            column: brick.column,
            row: brick.row,
            brick_type: brick.brick_type.clone(),
            tags: brick.tags.clone(),
        });

        if let Some(kind) = self.powerups.maybe_spawn_from(brick, &mut self.rng) {
            log::trace!("{:?} dropped from brick {}", kind, brick.id);
            self.events.push(SessionEvent::PowerUpSpawned { kind });
        }
    }

    fn update_weapon(&mut self, dt: f32) {
        let strikes = self.gun.update(dt, &self.paddle, &mut self.bricks);
        for BrickStrike { index, destroyed } in strikes {
            if destroyed {
                self.on_brick_destroyed(index);
            } else if let Some(brick) = self.bricks.get(index) {
                self.events.push(SessionEvent::BrickHit {
                    brick_id: brick.id,
                    hit_points: brick.hit_points,
                });
            }
        }
    }

    fn update_power_ups(&mut self, dt: f32) {
        let paddle = self.paddle.bounds();
        for kind in self.powerups.update(dt, &paddle, self.arena.bottom) {
            self.apply_power_up(kind);
        }
    }

    fn apply_power_up(&mut self, kind: PowerUpKind) {
        log::debug!("Power-up collected: {:?}", kind);
        self.events.push(SessionEvent::PowerUpCollected { kind });

        match kind {
            PowerUpKind::ExpandPaddle => {
                self.paddle.set_width(self.paddle.width() * EXPAND_FACTOR);
                self.paddle.clamp(self.arena.left, self.arena.right);
            }
            PowerUpKind::SlowBall => {
                self.ball_speed = (self.ball_speed * SLOW_FACTOR).max(self.config.ball_min_speed);
                for ball in &mut self.balls {
                    ball.set_velocity(collision::renormalize(ball.vel(), self.ball_speed));
                }
            }
            PowerUpKind::MultiBall => self.split_balls(),
            PowerUpKind::ExtraLife => {
                self.lives = (self.lives + 1).min(self.config.max_lives);
            }
            PowerUpKind::FireBall => {
                for ball in &mut self.balls {
                    ball.set_fire(self.config.fire_duration);
                }
            }
            PowerUpKind::PaddleGun => {
                self.gun.activate();
                log::debug!("Paddle gun armed for {:.1}s", self.config.gun_duration);
            }
        }
    }

    /// Clone the first moving ball at ±spread from its heading
    fn split_balls(&mut self) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        let Some(reference) = self.balls.iter().find(|b| b.vel() != Vec2::ZERO).cloned() else {
            return;
        };
        let spread = MULTI_BALL_SPREAD_DEG.to_radians();
        for angle in [spread, -spread] {
            if self.balls.len() >= self.config.max_balls {
                break;
            }
            let id = self.allocate_ball_id();
            let mut clone = reference.duplicate(id);
            let heading = collision::rotate(reference.vel(), angle);
            clone.set_velocity(collision::renormalize(heading, self.ball_speed));
            self.balls.push(clone);
        }
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(SessionEvent::LifeLost {
            lives_left: self.lives,
        });
        self.powerups.reset();
        self.gun.reset();

        if self.lives == 0 {
            self.phase = SessionPhase::GameOver;
            self.status = Some(StatusMessage::GameOver);
            self.events.push(SessionEvent::GameOver { score: self.score });
            log::info!("Game over, final score {}", self.score);
            return;
        }

        log::debug!("Life lost, {} left", self.lives);
        self.status = Some(StatusMessage::LifeLost);
        self.paddle.reset_width();
        self.paddle.clamp(self.arena.left, self.arena.right);
        self.ball_speed = self.config.ball_base_speed;
        self.respawn_ball();
    }

    fn allocate_ball_id(&mut self) -> u32 {
        let id = self.next_ball_id;
        self.next_ball_id += 1;
        id
    }

    /// Single ball parked on the paddle
    fn respawn_ball(&mut self) {
        let id = self.allocate_ball_id();
        let ball = Ball::new(id, self.serve_position(), self.config.ball_size, Skin::default());
        self.balls.clear();
        self.balls.push(ball);
        self.phase = SessionPhase::Serve;
    }

    fn load_level(&mut self) {
        let level = self.catalog.current();
        self.objectives.bind(level);
        self.bricks = layout_bricks(level, &self.arena);
        log::info!(
            "Loaded level '{}' ({} bricks, {} objectives)",
            level.id,
            self.bricks.len(),
            self.objectives.len()
        );
        let level_id = level.id.clone();

        self.paddle = spawn_paddle(&self.config);
        self.powerups.reset();
        self.gun.reset();
        self.ball_speed = self.config.ball_base_speed;
        self.respawn_ball();
        self.status = Some(StatusMessage::Ready);
        self.events.push(SessionEvent::LevelLoaded { level_id });
    }

    fn forward_objective_notices(&mut self) {
        for notice in self.objectives.drain_notices() {
            match &notice {
                ObjectiveNotice::Completed(state) => {
                    log::info!("Objective '{}' completed", state.id);
                    self.status = Some(StatusMessage::ObjectiveCompleted);
                }
                ObjectiveNotice::Failed(state) => {
                    log::info!("Objective '{}' failed", state.id);
                    self.status = Some(StatusMessage::ObjectiveFailed);
                }
                ObjectiveNotice::Progress(_) => {}
            }
            self.events.push(SessionEvent::Objective(notice));
        }
    }

    /// Primary objectives met, or nothing left to break
    fn is_level_complete(&self) -> bool {
        self.objectives.are_primary_objectives_met() || self.bricks.iter().all(Brick::is_destroyed)
    }

    fn complete_level(&mut self) {
        let cleared = self.catalog.current().id.clone();

        if self.catalog.advance() {
            let next = self.catalog.current().id.clone();
            log::info!("Level '{}' cleared, advancing to '{}'", cleared, next);
            self.events.push(SessionEvent::LevelCleared {
                level_id: cleared,
                next_level_id: Some(next),
            });
            self.load_level();
            self.status = Some(StatusMessage::StageCleared);
        } else {
            log::info!("Level '{}' cleared, all levels won with {}", cleared, self.score);
            self.phase = SessionPhase::Victory;
            self.status = Some(StatusMessage::Victory);
            self.powerups.reset();
            self.gun.reset();
            self.events.push(SessionEvent::LevelCleared {
                level_id: cleared,
                next_level_id: None,
            });
            self.events.push(SessionEvent::Victory { score: self.score });
        }
    }

    // === Read access ===

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let level = self.catalog.current();
        let mut entities = Vec::with_capacity(
            1 + self.balls.len() + self.bricks.len() + self.powerups.len() + self.gun.bullets().len(),
        );
        entities.push(EntityView::paddle(&self.paddle, self.gun.is_active()));
        entities.extend(
            self.bricks
                .iter()
                .filter(|b| !b.is_destroyed())
                .map(EntityView::brick),
        );
        entities.extend(self.powerups.iter().map(EntityView::power_up));
        entities.extend(self.gun.bullets().iter().map(EntityView::bullet));
        entities.extend(self.balls.iter().map(EntityView::ball));

        FrameSnapshot {
            tick: self.time_ticks,
            level_id: level.id.clone(),
            level_name: level.display_name.clone(),
            level_index: self.catalog.current_index(),
            score: self.score,
            lives: self.lives,
            phase: self.phase,
            paused: self.paused,
            status: self.status,
            ball_speed: self.ball_speed,
            gun_time_remaining: self.gun.time_remaining(),
            entities,
            objectives: self.objectives.snapshot(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn arena(&self) -> &ArenaBounds {
        &self.arena
    }

    pub fn level(&self) -> &LevelSchema {
        self.catalog.current()
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_awaiting_launch(&self) -> bool {
        self.phase == SessionPhase::Serve
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }

    pub fn is_won(&self) -> bool {
        self.phase == SessionPhase::Victory
    }

    pub fn status(&self) -> Option<StatusMessage> {
        self.status
    }

    pub fn ball_speed(&self) -> f32 {
        self.ball_speed
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn remaining_bricks(&self) -> usize {
        self.bricks.iter().filter(|b| !b.is_destroyed()).count()
    }

    pub fn power_ups(&self) -> &PowerUpSystem {
        &self.powerups
    }

    pub fn gun(&self) -> &PaddleGun {
        &self.gun
    }

    pub fn objectives(&self) -> &ObjectiveEngine {
        &self.objectives
    }
}
