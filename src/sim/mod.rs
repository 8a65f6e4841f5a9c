//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (list order, first hit wins)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod objectives;
pub mod powerups;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod weapon;

pub use collision::{ArenaBounds, Axis, BoundaryHit};
pub use entity::{Body, Entity, Rect, Vector2D};
pub use objectives::{
    ObjectiveEngine, ObjectiveEvent, ObjectiveKind, ObjectiveNotice, ObjectiveState,
    ObjectiveStatus,
};
pub use powerups::PowerUpSystem;
pub use session::{GameplaySession, SessionEvent, SessionPhase, StatusMessage, layout_bricks};
pub use snapshot::{EntityKind, EntityView, FrameSnapshot, VisualTag};
pub use state::{Ball, Brick, Bullet, Paddle, PowerUp, PowerUpKind, Skin};
pub use weapon::{BrickStrike, PaddleGun};
