//! Game state and core simulation types
//!
//! Everything the tick function mutates lives here. State is constructed
//! from a seed so runs are reproducible in tests.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::Rect;
use super::grid::{self, GridSpec};
use super::timer::DeferredAction;
use crate::consts::*;
use crate::skills::SkillBook;
use crate::tuning::Tuning;
use crate::{clampf, field_height};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Ball parked on paddle, waiting for launch input
    Ready,
    /// Active gameplay
    Playing,
    /// Lives exhausted
    GameOver,
    /// Every skill activated (never entered in endless mode)
    Win,
}

/// A ball entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub id: u32,
    /// Center position
    pub pos: Vec2,
    /// Velocity in px/tick, scaled by the session speed multiplier at
    /// integration time
    pub vel: Vec2,
    pub radius: f32,
    /// Inactive balls are excluded from simulation and swept at tick end
    pub active: bool,
}

impl Ball {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            active: true,
        }
    }

    /// Park the ball on the paddle center (ready phase tracking)
    pub fn park_on(&mut self, paddle: &Paddle) {
        self.pos = Vec2::new(paddle.center_x(), paddle.pos.y - self.radius);
        self.vel = Vec2::ZERO;
    }

    /// Launch from parked state. `dir` is the horizontal sign (+1/-1).
    pub fn launch(&mut self, dir: f32) {
        self.vel = Vec2::new(BALL_LAUNCH_VX * dir.signum(), BALL_LAUNCH_VY);
    }
}

/// The player's paddle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    /// Top-left corner
    pub pos: Vec2,
    pub w: f32,
    pub h: f32,
    /// Horizontal movement applied this tick (steering reads ball offset,
    /// not this, but the renderer and tests do)
    pub dx: f32,
    /// Hazard feedback: render the paddle in its flash color while set
    pub flash_on: bool,
}

impl Paddle {
    /// Paddle centered at the bottom of a field of the given size
    pub fn new(field_w: f32, field_h: f32) -> Self {
        Self {
            pos: Vec2::new(
                (field_w - PADDLE_WIDTH) / 2.0,
                field_h - PADDLE_HEIGHT - 10.0,
            ),
            w: PADDLE_WIDTH,
            h: PADDLE_HEIGHT,
            dx: 0.0,
            flash_on: false,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + self.w / 2.0
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, Vec2::new(self.w, self.h))
    }

    /// Move horizontally, clamped to the field
    pub fn slide(&mut self, dx: f32, field_w: f32) {
        let x = clampf(self.pos.x + dx, 0.0, field_w - self.w);
        self.dx = x - self.pos.x;
        self.pos.x = x;
    }

    /// Absolute tracking (pointer/touch): move center toward `x`
    pub fn track_to(&mut self, x: f32, field_w: f32) {
        let target = clampf(x - self.w / 2.0, 0.0, field_w - self.w);
        self.dx = target - self.pos.x;
        self.pos.x = target;
    }
}

/// Brick lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickStatus {
    /// Not drawn, not collidable (permanent gap or awaiting nothing)
    Empty,
    /// Collidable target
    Active,
    /// Hit and waiting on its regeneration timer; drawn faded
    Regenerating,
}

/// A brick cell. Bricks are never removed from the grid vector; only
/// `status` changes until the grid is rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct Brick {
    pub col: u32,
    pub row: u32,
    pub rect: Rect,
    pub status: BrickStatus,
    /// Index into the taxonomy's category list
    pub category: usize,
    /// Permanent gaps never regenerate and never become active
    pub permanently_empty: bool,
}

impl Brick {
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    /// Three extra balls launched from the paddle
    Multiball,
    /// Every active ball clones two offset copies
    Split,
}

/// A falling pickup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    /// Center position
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
}

impl PowerUp {
    pub fn rect(&self) -> Rect {
        Rect::centered(self.pos, Vec2::splat(self.size))
    }
}

/// A falling obstacle; paddle contact costs a life
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hazard {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
}

impl Hazard {
    pub fn rect(&self) -> Rect {
        Rect::centered(self.pos, Vec2::splat(self.size))
    }
}

/// Complete game state (deterministic under a fixed seed)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Playfield size in world units (CSS px)
    pub width: f32,
    pub height: f32,
    pub lives: u32,
    pub phase: GamePhase,
    /// Scales ball integration; +0.02 per brick hit, reset to a
    /// lives-dependent baseline each round
    pub speed_mult: f32,
    /// Post-victory mode: no win checks, no category-based clearing
    pub endless: bool,
    pub endless_score: u64,
    /// Simulation tick counter (drives deferred actions)
    pub tick_count: u64,
    /// Session generation; deferred actions from an older epoch are stale
    pub epoch: u32,
    pub paddle: Paddle,
    /// Sorted by id for deterministic iteration
    pub balls: Vec<Ball>,
    /// Column-major (col outer, row inner); fixed length cols*rows
    pub bricks: Vec<Brick>,
    pub grid: GridSpec,
    pub powerups: Vec<PowerUp>,
    pub hazards: Vec<Hazard>,
    /// Pending tick-scheduled actions (brick regen, flash steps, ...)
    pub timers: Vec<DeferredAction>,
    /// Engine-side mirror of the host's skill progression
    pub book: SkillBook,
    next_id: u32,
}

impl GameState {
    /// Create a session state. The grid is built immediately from the
    /// skill book, so the book must contain at least one category.
    pub fn new(seed: u64, width: f32, book: SkillBook, endless: bool, tuning: &Tuning) -> Self {
        let height = field_height(width);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            width,
            height,
            lives: START_LIVES,
            phase: GamePhase::Ready,
            speed_mult: 1.0,
            endless,
            endless_score: 0,
            tick_count: 0,
            epoch: 0,
            paddle: Paddle::new(width, height),
            balls: Vec::new(),
            bricks: Vec::new(),
            grid: GridSpec::for_field(width, tuning),
            powerups: Vec::new(),
            hazards: Vec::new(),
            timers: Vec::new(),
            book,
            next_id: 1,
        };

        state.rebuild_grid(tuning);
        state.spawn_ball_parked();
        state.speed_mult = state.life_baseline_mult();

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Count of balls still in play
    pub fn active_balls(&self) -> usize {
        self.balls.iter().filter(|b| b.active).count()
    }

    /// Spawn the fresh round ball parked on the paddle
    pub fn spawn_ball_parked(&mut self) {
        let id = self.next_entity_id();
        let mut ball = Ball::new(id);
        ball.park_on(&self.paddle);
        self.balls.push(ball);
    }

    /// Spawn a free ball if under the cap. Returns false when at cap.
    pub fn try_spawn_ball(&mut self, pos: Vec2, vel: Vec2) -> bool {
        if self.active_balls() >= MAX_BALLS {
            return false;
        }
        let id = self.next_entity_id();
        let mut ball = Ball::new(id);
        ball.pos = pos;
        ball.vel = vel;
        self.balls.push(ball);
        true
    }

    /// Speed multiplier baseline at the start of a life: fewer remaining
    /// lives restart slightly slower
    pub fn life_baseline_mult(&self) -> f32 {
        let lost = START_LIVES.saturating_sub(self.lives.min(START_LIVES));
        1.0 + 0.2 * lost as f32
    }

    /// Rebuild the brick grid from the current skill book (round start,
    /// retry, progress reset)
    pub fn rebuild_grid(&mut self, tuning: &Tuning) {
        self.grid = GridSpec::for_field(self.width, tuning);
        self.bricks = grid::build_bricks(
            &self.grid,
            &self.book,
            self.endless,
            tuning,
            &mut self.rng,
        );
    }

    /// Reset to a fresh single parked ball after a lost life. The brick
    /// grid and every pending deferred action survive; falling entities
    /// do not. A struck hazard whose flash is still running keeps its
    /// pending life cost.
    pub fn round_reset(&mut self) {
        self.balls.clear();
        self.powerups.clear();
        self.hazards.clear();
        self.spawn_ball_parked();
        self.speed_mult = self.life_baseline_mult();
        self.phase = GamePhase::Ready;
    }

    /// Full restart (gameOver retry / progress reset): fresh lives, fresh
    /// grid, fresh timers. Bumping the epoch turns every still-pending
    /// deferred action into a guarded no-op.
    pub fn restart(&mut self, tuning: &Tuning) {
        self.epoch += 1;
        self.timers.clear();
        self.lives = START_LIVES;
        self.endless_score = 0;
        self.balls.clear();
        self.powerups.clear();
        self.hazards.clear();
        self.paddle = Paddle::new(self.width, self.height);
        self.rebuild_grid(tuning);
        self.spawn_ball_parked();
        self.speed_mult = 1.0;
        self.phase = GamePhase::Ready;
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
        self.powerups.sort_by_key(|p| p.id);
        self.hazards.sort_by_key(|h| h.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::test_book;

    fn test_state() -> GameState {
        let tuning = Tuning::default();
        GameState::new(42, 800.0, test_book(), false, &tuning)
    }

    #[test]
    fn test_new_state_starts_ready_with_one_parked_ball() {
        let state = test_state();
        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.lives, START_LIVES);
        assert_eq!(state.active_balls(), 1);
        let ball = &state.balls[0];
        assert_eq!(ball.pos.x, state.paddle.center_x());
        assert!(ball.pos.y < state.paddle.pos.y);
        assert_eq!(ball.vel, Vec2::ZERO);
    }

    #[test]
    fn test_ball_cap_enforced_at_spawn() {
        let mut state = test_state();
        for _ in 0..MAX_BALLS + 5 {
            state.try_spawn_ball(Vec2::new(100.0, 100.0), Vec2::new(1.0, -1.0));
        }
        assert_eq!(state.active_balls(), MAX_BALLS);
    }

    #[test]
    fn test_life_baseline_mult() {
        let mut state = test_state();
        assert!((state.life_baseline_mult() - 1.0).abs() < 1e-6);
        state.lives = 3;
        assert!((state.life_baseline_mult() - 1.4).abs() < 1e-6);
        state.lives = 1;
        assert!((state.life_baseline_mult() - 1.8).abs() < 1e-6);
        // Saturates rather than going negative on out-of-range lives
        state.lives = 9;
        assert!((state.life_baseline_mult() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_paddle_slide_clamps_to_field() {
        let mut state = test_state();
        state.paddle.slide(-10_000.0, state.width);
        assert_eq!(state.paddle.pos.x, 0.0);
        state.paddle.slide(10_000.0, state.width);
        assert_eq!(state.paddle.pos.x, state.width - state.paddle.w);
    }

    #[test]
    fn test_round_reset_spawns_single_ball_and_clears_pickups() {
        let mut state = test_state();
        state.phase = GamePhase::Playing;
        state.balls.clear();
        state.powerups.push(PowerUp {
            id: 99,
            kind: PowerUpKind::Multiball,
            pos: Vec2::new(50.0, 50.0),
            vel: Vec2::new(0.0, 2.5),
            size: 18.0,
        });
        state.lives = 4;
        state.round_reset();
        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.active_balls(), 1);
        assert!(state.powerups.is_empty());
        assert!((state.speed_mult - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_grid() {
        let tuning = Tuning::default();
        let a = GameState::new(7, 800.0, test_book(), false, &tuning);
        let b = GameState::new(7, 800.0, test_book(), false, &tuning);
        assert_eq!(a.bricks, b.bricks);
    }
}
