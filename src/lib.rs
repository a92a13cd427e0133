//! Skills Breaker - the brick-breaker skill showcase embedded in the
//! portfolio page
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, game state)
//! - `skills`: Skill taxonomy and progression mirror
//! - `tuning`: Data-driven game balance
//! - `input`: Pointer/touch/keyboard normalization
//! - `session`: Host boundary (callbacks, lifecycle, event dispatch)
//! - `renderer`: WebGPU rendering pipeline

pub mod input;
pub mod renderer;
pub mod session;
pub mod sim;
pub mod skills;
pub mod tuning;

pub use session::{HostHooks, Session};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matching the original frame-locked
    /// physics so velocities stay in px/tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Simulation tick rate
    pub const TICK_HZ: u32 = 60;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Concurrent ball cap; every spawn site checks this
    pub const MAX_BALLS: usize = 10;
    /// Lives at session start and on retry
    pub const START_LIVES: u32 = 5;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const PADDLE_HEIGHT: f32 = 12.0;
    /// Keyboard paddle speed and steering clamp (px/tick)
    pub const PADDLE_SPEED: f32 = 8.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 7.0;
    /// Launch velocity components (px/tick); horizontal sign is randomized
    pub const BALL_LAUNCH_VX: f32 = 3.0;
    pub const BALL_LAUNCH_VY: f32 = -3.0;

    /// Playfield aspect: height = min(width * ASPECT, MAX_HEIGHT)
    pub const FIELD_ASPECT: f32 = 0.7;
    pub const FIELD_MAX_HEIGHT: f32 = 450.0;

    /// Skill points needed for activation
    pub const POINTS_TO_ACTIVATE: u8 = 5;
}

/// Clamp a value into [lo, hi]
#[inline]
pub fn clampf(v: f32, lo: f32, hi: f32) -> f32 {
    v.max(lo).min(hi)
}

/// Playfield height for a given width
#[inline]
pub fn field_height(width: f32) -> f32 {
    (width * consts::FIELD_ASPECT).min(consts::FIELD_MAX_HEIGHT)
}
