//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod event;
pub mod grid;
pub mod rect;
pub mod state;
pub mod tick;
pub mod timer;

pub use event::GameEvent;
pub use grid::GridSpec;
pub use rect::Rect;
pub use state::{
    Ball, Brick, BrickStatus, GamePhase, GameState, Hazard, Paddle, PowerUp, PowerUpKind,
};
pub use tick::{TickInput, start_activate_all, tick};
