//! Events emitted during a simulation tick.
//! The session layer consumes these for host callbacks, HUD updates, and
//! floating feedback text.

use glam::Vec2;

use super::state::{GamePhase, PowerUpKind};

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Points granted to a skill; `delta` is the raw roll forwarded to the
    /// host (both sides clamp identically)
    PointsAwarded { skill: usize, delta: u8, at: Vec2 },
    /// A brick of a completed category was permanently cleared
    CategoryCleared { category: usize, at: Vec2 },
    /// Endless-mode score increment
    EndlessScored { total: u64, at: Vec2 },
    PowerUpSpawned { kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind },
    HazardSpawned,
    /// Hazard consumed on paddle contact; the life cost lands when the
    /// flash sequence finishes
    HazardStruck,
    /// One or more balls fell out this tick
    BallLost { remaining: usize },
    LifeLost { remaining: u32 },
    PhaseChanged { phase: GamePhase },
    /// The activate-all script finished awarding every skill
    AllActivated,
}
