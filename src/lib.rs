//! Brickfall - A breakout-style arcade simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, objectives, session)
//! - `level`: Level schema, validation and the built-in catalog
//! - `input`: Latched keyboard-style input
//! - `scheduler`: Fixed timestep game loop
//! - `config`: Data-driven game balance

pub mod config;
pub mod input;
pub mod level;
pub mod scheduler;
pub mod sim;

pub use config::{ConfigError, SchedulerConfig, SessionConfig};
pub use input::{InputLatch, Key, TickInput};
pub use level::{LevelCatalog, LevelError, LevelSchema};
pub use scheduler::{
    FixedStep, FrameSink, NullSink, Scheduler, SchedulerError, SessionCommand, Simulation,
};
pub use sim::{FrameSnapshot, GameplaySession, SessionEvent, SessionPhase};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (steps per second)
    pub const SIM_RATE: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / SIM_RATE as f32;
    /// Maximum substeps per iteration to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;
    /// Scheduler idle between iterations (milliseconds)
    pub const IDLE_MILLIS: u64 = 2;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 1240.0;
    pub const ARENA_HEIGHT: f32 = 720.0;
    /// Inner play-field bounds (side panels live outside these)
    pub const ARENA_LEFT: f32 = 215.0;
    pub const ARENA_RIGHT: f32 = 1025.0;
    /// Ball ceiling
    pub const ARENA_TOP: f32 = 50.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 120.0;
    pub const PADDLE_HEIGHT: f32 = 18.0;
    pub const PADDLE_SPEED: f32 = 420.0;
    /// Distance from arena bottom to paddle top
    pub const PADDLE_Y_OFFSET: f32 = 60.0;
    pub const PADDLE_MAX_WIDTH: f32 = 240.0;

    /// Ball defaults
    pub const BALL_SIZE: f32 = 14.0;
    pub const BALL_BASE_SPEED: f32 = 360.0;
    /// Slow-ball floor, also the minimum speed after a reset
    pub const BALL_MIN_SPEED: f32 = 260.0;
    pub const BALL_MAX_SPEED: f32 = 560.0;
    /// Speed boost when ball hits paddle (multiplicative)
    pub const PADDLE_BOOST: f32 = 1.02;
    /// Maximum deflection off the paddle and at launch (degrees)
    pub const MAX_BOUNCE_ANGLE_DEG: f32 = 60.0;
    /// Gap between a served ball and the paddle top
    pub const SERVE_GAP: f32 = 4.0;
    pub const TRAIL_LENGTH: usize = 8;

    /// Lives
    pub const START_LIVES: u32 = 3;
    pub const MAX_LIVES: u32 = 5;

    /// Power-ups
    pub const POWERUP_SIZE: f32 = 18.0;
    pub const POWERUP_FALL_SPEED: f32 = 120.0;
    pub const POWERUP_DROP_CHANCE: f64 = 0.15;
    pub const EXPAND_FACTOR: f32 = 1.3;
    pub const SLOW_FACTOR: f32 = 0.8;
    pub const MULTI_BALL_SPREAD_DEG: f32 = 25.0;
    pub const MAX_BALLS: usize = 6;
    pub const FIRE_DURATION: f32 = 6.0;

    /// Paddle gun
    pub const GUN_DURATION: f32 = 8.0;
    pub const GUN_FIRE_INTERVAL: f32 = 0.25;
    pub const GUN_LEFT_OFFSET: f32 = 10.0;
    pub const GUN_RIGHT_OFFSET: f32 = 16.0;
    pub const GUN_ORIGIN_Y_OFFSET: f32 = 10.0;
    pub const BULLET_WIDTH: f32 = 6.0;
    pub const BULLET_HEIGHT: f32 = 16.0;
    pub const BULLET_SPEED: f32 = 420.0;
    /// Bullets are dropped once fully above this line
    pub const BULLET_CEILING: f32 = 40.0;

    /// Brick grid layout
    pub const BRICK_SIDE_PADDING: f32 = 30.0;
    pub const BRICK_TOP_PADDING: f32 = 90.0;
    pub const BRICK_GAP: f32 = 4.0;
    pub const BRICK_HEIGHT: f32 = 24.0;
    /// Score per hit point of a destroyed brick
    pub const BRICK_SCORE_PER_HP: u32 = 50;
}

