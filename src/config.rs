//! Session and scheduler configuration
//!
//! Both structs load from JSON with every field optional; missing fields
//! fall back to the values in [`crate::consts`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Gameplay tuning for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// RNG seed (launch angles, drops)
    pub seed: u64,

    // === Arena ===
    pub arena_height: f32,
    /// Left inner bound for paddle and balls
    pub left_bound: f32,
    /// Right inner bound for paddle and balls
    pub right_bound: f32,
    /// Ball ceiling
    pub top_bound: f32,

    // === Paddle ===
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_speed: f32,
    pub paddle_y_offset: f32,
    pub paddle_max_width: f32,

    // === Ball ===
    pub ball_size: f32,
    pub ball_base_speed: f32,
    pub ball_min_speed: f32,
    pub ball_max_speed: f32,
    pub paddle_boost: f32,
    pub max_bounce_angle_deg: f32,

    // === Lives ===
    pub start_lives: u32,
    pub max_lives: u32,

    // === Power-ups ===
    pub drop_chance: f64,
    pub max_balls: usize,
    pub fire_duration: f32,
    pub gun_duration: f32,
    pub gun_fire_interval: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,

            arena_height: ARENA_HEIGHT,
            left_bound: ARENA_LEFT,
            right_bound: ARENA_RIGHT,
            top_bound: ARENA_TOP,

            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_speed: PADDLE_SPEED,
            paddle_y_offset: PADDLE_Y_OFFSET,
            paddle_max_width: PADDLE_MAX_WIDTH,

            ball_size: BALL_SIZE,
            ball_base_speed: BALL_BASE_SPEED,
            ball_min_speed: BALL_MIN_SPEED,
            ball_max_speed: BALL_MAX_SPEED,
            paddle_boost: PADDLE_BOOST,
            max_bounce_angle_deg: MAX_BOUNCE_ANGLE_DEG,

            start_lives: START_LIVES,
            max_lives: MAX_LIVES,

            drop_chance: POWERUP_DROP_CHANCE,
            max_balls: MAX_BALLS,
            fire_duration: FIRE_DURATION,
            gun_duration: GUN_DURATION,
            gun_fire_interval: GUN_FIRE_INTERVAL,
        }
    }
}

impl SessionConfig {
    /// Parse and validate from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Same config with a different seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Y coordinate of the paddle's top edge
    pub fn paddle_y(&self) -> f32 {
        self.arena_height - self.paddle_y_offset
    }

    /// Horizontal center of the play field
    pub fn center_x(&self) -> f32 {
        (self.left_bound + self.right_bound) / 2.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.right_bound <= self.left_bound {
            return Err(invalid("rightBound", "must be greater than leftBound"));
        }
        if self.arena_height <= self.top_bound {
            return Err(invalid("arenaHeight", "must be greater than topBound"));
        }
        if self.paddle_width <= 0.0 || self.paddle_width > self.right_bound - self.left_bound {
            return Err(invalid("paddleWidth", "must fit inside the arena"));
        }
        if self.paddle_max_width < self.paddle_width {
            return Err(invalid("paddleMaxWidth", "must be at least paddleWidth"));
        }
        if self.ball_size <= 0.0 {
            return Err(invalid("ballSize", "must be positive"));
        }
        if !(self.ball_min_speed > 0.0
            && self.ball_min_speed <= self.ball_base_speed
            && self.ball_base_speed <= self.ball_max_speed)
        {
            return Err(invalid(
                "ballBaseSpeed",
                "expected 0 < ballMinSpeed <= ballBaseSpeed <= ballMaxSpeed",
            ));
        }
        if !(0.0..90.0).contains(&self.max_bounce_angle_deg) {
            return Err(invalid("maxBounceAngleDeg", "must be within [0, 90)"));
        }
        if !(0.0..=1.0).contains(&self.drop_chance) {
            return Err(invalid("dropChance", "must be within [0, 1]"));
        }
        if self.start_lives == 0 || self.start_lives > self.max_lives {
            return Err(invalid("startLives", "must be within [1, maxLives]"));
        }
        if self.max_balls == 0 {
            return Err(invalid("maxBalls", "must be at least 1"));
        }
        if self.gun_fire_interval <= 0.0 {
            return Err(invalid("gunFireInterval", "must be positive"));
        }
        Ok(())
    }
}

/// Fixed-step scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Simulation steps per second
    pub target_rate: u32,
    /// Cap on fixed steps drained per iteration
    pub max_steps_per_iteration: u32,
    /// Sleep between iterations (milliseconds)
    pub idle_millis: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_rate: SIM_RATE,
            max_steps_per_iteration: MAX_SUBSTEPS,
            idle_millis: IDLE_MILLIS,
        }
    }
}

impl SchedulerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Length of one fixed step in seconds
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.target_rate as f32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_rate == 0 {
            return Err(invalid("targetRate", "must be positive"));
        }
        if self.max_steps_per_iteration == 0 {
            return Err(invalid("maxStepsPerIteration", "must be at least 1"));
        }
        Ok(())
    }
}
