//! Fixed timestep simulation tick
//!
//! Core game loop that advances the simulation deterministically. One call
//! is one fixed step: due deferred actions fire first, then paddle
//! movement, then the phase machine (ball integration, collisions, falling
//! pickups, loss and win resolution).

use glam::Vec2;
use rand::Rng;

use super::collision;
use super::event::GameEvent;
use super::state::{Ball, BrickStatus, GamePhase, GameState, Hazard, PowerUp, PowerUpKind};
use super::timer::{self, ActionKind, DeferredAction};
use crate::consts::*;
use crate::tuning::Tuning;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Absolute paddle-center target (from mouse/touch position)
    pub target_x: Option<f32>,
    /// Keyboard hold direction: -1.0, 0.0, or 1.0
    pub move_dir: f32,
    /// Launch ball (click/tap/space)
    pub launch: bool,
}

/// Advance the game state by one fixed timestep and report what happened.
pub fn tick(state: &mut GameState, input: &TickInput, tuning: &Tuning) -> Vec<GameEvent> {
    let mut events = Vec::new();
    state.tick_count += 1;

    run_due_actions(state, tuning, &mut events);
    move_paddle(state, input);

    match state.phase {
        GamePhase::Ready => {
            // Parked ball rides the paddle until launch
            let paddle = state.paddle;
            for ball in &mut state.balls {
                ball.park_on(&paddle);
            }
            if input.launch {
                launch_round(state, &mut events);
            }
        }
        GamePhase::Playing => {
            step_balls(state, tuning, &mut events);
            step_powerups(state, tuning, &mut events);
            step_hazards(state, tuning, &mut events);
            resolve_ball_loss(state, &mut events);
            check_win(state, &mut events);
        }
        GamePhase::GameOver | GamePhase::Win => {
            // Overlay phases: paddle stays responsive, nothing else moves
        }
    }

    state.normalize_order();
    events
}

/// Begin the activate-all bypass: a scripted walk over the whole skill
/// list awarding each skill its remaining points, one skill per step,
/// finishing through the same win path as regular play. No-op while a
/// walk is already running or the game is in a terminal phase.
pub fn start_activate_all(state: &mut GameState) {
    let running = state
        .timers
        .iter()
        .any(|a| matches!(a.kind, ActionKind::ActivateNext { .. }));
    if running || matches!(state.phase, GamePhase::GameOver | GamePhase::Win) {
        return;
    }
    state.timers.push(DeferredAction {
        fire_at: state.tick_count + 1,
        epoch: state.epoch,
        kind: ActionKind::ActivateNext { skill: 0 },
    });
}

fn run_due_actions(state: &mut GameState, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    let due = timer::drain_due(&mut state.timers, state.tick_count, state.epoch);
    for action in due {
        match action.kind {
            ActionKind::RegenBrick { col, row } => {
                let idx = state.grid.index_of(col, row);
                if let Some(brick) = state.bricks.get_mut(idx) {
                    if !brick.permanently_empty && brick.status == BrickStatus::Regenerating {
                        brick.status = BrickStatus::Active;
                    }
                }
            }
            ActionKind::FlashStep { remaining } => {
                if remaining > 1 {
                    state.paddle.flash_on = !state.paddle.flash_on;
                    state.timers.push(DeferredAction {
                        fire_at: state.tick_count + tuning.flash_step_ticks as u64,
                        epoch: state.epoch,
                        kind: ActionKind::FlashStep {
                            remaining: remaining - 1,
                        },
                    });
                } else {
                    state.paddle.flash_on = false;
                    apply_hazard_life_loss(state, events);
                }
            }
            ActionKind::ActivateNext { skill } => {
                activate_next(state, tuning, skill, events);
            }
        }
    }
}

fn move_paddle(state: &mut GameState, input: &TickInput) {
    if let Some(x) = input.target_x {
        state.paddle.track_to(x, state.width);
    } else if input.move_dir != 0.0 {
        state
            .paddle
            .slide(input.move_dir.signum() * PADDLE_SPEED, state.width);
    } else {
        state.paddle.dx = 0.0;
    }
}

fn launch_round(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let dir = if state.rng.random_bool(0.5) { 1.0 } else { -1.0 };
    for ball in &mut state.balls {
        ball.launch(dir);
    }
    state.phase = GamePhase::Playing;
    events.push(GameEvent::PhaseChanged {
        phase: GamePhase::Playing,
    });
}

/// Integrate each ball, resolve walls, paddle, then at most one brick.
fn step_balls(state: &mut GameState, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    let speed = state.speed_mult;
    let width = state.width;
    let paddle_rect = state.paddle.rect();

    for i in 0..state.balls.len() {
        if !state.balls[i].active {
            continue;
        }
        {
            let ball = &mut state.balls[i];
            ball.pos += ball.vel * speed;
            collision::confine_to_walls(&mut ball.pos, &mut ball.vel, ball.radius, width);
            collision::paddle_bounce(
                &mut ball.pos,
                &mut ball.vel,
                ball.radius,
                &paddle_rect,
                tuning.steer_factor,
                tuning.steer_max,
            );
        }

        // First overlapping active brick wins, in storage order (column
        // by column). One brick per ball per tick.
        let (pos, radius) = (state.balls[i].pos, state.balls[i].radius);
        let hit = state
            .bricks
            .iter()
            .position(|b| b.status == BrickStatus::Active && b.rect.overlaps_circle(pos, radius));
        if let Some(brick_idx) = hit {
            state.balls[i].vel.y = -state.balls[i].vel.y;
            resolve_brick_hit(state, brick_idx, tuning, events);
        }
    }
}

fn resolve_brick_hit(
    state: &mut GameState,
    brick_idx: usize,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) {
    let category = state.bricks[brick_idx].category;
    let at = state.bricks[brick_idx].center();

    // A brick of a fully activated category clears for good outside
    // endless mode: no points, no speed-up, no spawn rolls.
    if !state.endless && state.book.category_activated(category) {
        let brick = &mut state.bricks[brick_idx];
        brick.status = BrickStatus::Empty;
        brick.permanently_empty = true;
        events.push(GameEvent::CategoryCleared { category, at });
        return;
    }

    state.bricks[brick_idx].status = BrickStatus::Regenerating;
    let delay = state
        .rng
        .random_range(tuning.regen_min_ticks..=tuning.regen_max_ticks) as u64;
    let (col, row) = (state.bricks[brick_idx].col, state.bricks[brick_idx].row);
    state.timers.push(DeferredAction {
        fire_at: state.tick_count + delay,
        epoch: state.epoch,
        kind: ActionKind::RegenBrick { col, row },
    });
    state.speed_mult += tuning.speed_increment;

    if state.endless {
        state.endless_score += 1;
        events.push(GameEvent::EndlessScored {
            total: state.endless_score,
            at,
        });
    } else {
        award_category_points(state, category, at, events);
    }

    if state.active_balls() < MAX_BALLS && state.rng.random_bool(tuning.powerup_chance as f64) {
        let kind = if state.rng.random_bool(0.5) {
            PowerUpKind::Multiball
        } else {
            PowerUpKind::Split
        };
        let id = state.next_entity_id();
        state.powerups.push(PowerUp {
            id,
            kind,
            pos: at,
            vel: Vec2::new(0.0, tuning.powerup_fall_speed),
            size: tuning.powerup_size,
        });
        events.push(GameEvent::PowerUpSpawned { kind });
    }
    if state.rng.random_bool(tuning.hazard_chance as f64) {
        let id = state.next_entity_id();
        state.hazards.push(Hazard {
            id,
            pos: at,
            vel: Vec2::new(0.0, tuning.hazard_fall_speed),
            size: tuning.hazard_size,
        });
        events.push(GameEvent::HazardSpawned);
    }
}

/// Pick a not-yet-activated skill from the category (any of its skills
/// if every one is activated) and award a random 1-5 point roll.
fn award_category_points(
    state: &mut GameState,
    category: usize,
    at: Vec2,
    events: &mut Vec<GameEvent>,
) {
    let open: Vec<usize> = state
        .book
        .category_skills(category)
        .filter(|&i| !state.book.skill(i).activated)
        .collect();
    let pool = if open.is_empty() {
        state.book.category_skills(category).collect()
    } else {
        open
    };
    if pool.is_empty() {
        return;
    }
    let skill = pool[state.rng.random_range(0..pool.len())];
    let delta = state.rng.random_range(1..=POINTS_TO_ACTIVATE);
    state.book.award(skill, delta);
    events.push(GameEvent::PointsAwarded { skill, delta, at });
}

fn step_powerups(state: &mut GameState, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    let paddle_rect = state.paddle.rect();
    let field_h = state.height;

    let mut collected = Vec::new();
    state.powerups.retain_mut(|p| {
        p.pos += p.vel;
        if p.rect().overlaps(&paddle_rect) {
            collected.push(p.kind);
            return false;
        }
        p.pos.y - p.size / 2.0 <= field_h
    });

    for kind in collected {
        events.push(GameEvent::PowerUpCollected { kind });
        match kind {
            PowerUpKind::Multiball => spawn_multiball(state, tuning),
            PowerUpKind::Split => split_balls(state, tuning),
        }
    }
}

fn step_hazards(state: &mut GameState, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    let paddle_rect = state.paddle.rect();
    let field_h = state.height;

    let mut strikes = 0u32;
    state.hazards.retain_mut(|h| {
        h.pos += h.vel;
        if h.rect().overlaps(&paddle_rect) {
            strikes += 1;
            return false;
        }
        h.pos.y - h.size / 2.0 <= field_h
    });

    // Each struck hazard runs its own flash sequence and costs its own
    // life when the sequence completes.
    for _ in 0..strikes {
        events.push(GameEvent::HazardStruck);
        state.paddle.flash_on = true;
        state.timers.push(DeferredAction {
            fire_at: state.tick_count + tuning.flash_step_ticks as u64,
            epoch: state.epoch,
            kind: ActionKind::FlashStep {
                remaining: tuning.flash_steps,
            },
        });
    }
}

/// Three balls from the paddle at fixed upward angles, capped.
fn spawn_multiball(state: &mut GameState, tuning: &Tuning) {
    let origin = Vec2::new(
        state.paddle.center_x(),
        state.paddle.pos.y - BALL_RADIUS - 1.0,
    );
    let speed = Vec2::new(BALL_LAUNCH_VX, BALL_LAUNCH_VY).length();
    for angle_deg in tuning.multiball_angles_deg {
        let a = angle_deg.to_radians();
        let vel = Vec2::new(a.sin(), -a.cos()) * speed;
        if !state.try_spawn_ball(origin, vel) {
            break;
        }
    }
}

/// Every active ball clones two horizontally nudged copies, capped.
fn split_balls(state: &mut GameState, tuning: &Tuning) {
    let snapshot: Vec<Ball> = state.balls.iter().filter(|b| b.active).copied().collect();
    for ball in snapshot {
        for offset in [-tuning.split_offset, tuning.split_offset] {
            let vel = Vec2::new(ball.vel.x + offset, ball.vel.y);
            if !state.try_spawn_ball(ball.pos, vel) {
                return;
            }
        }
    }
}

fn resolve_ball_loss(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let field_h = state.height;
    for ball in &mut state.balls {
        if ball.active && collision::below_field(ball.pos, ball.radius, field_h) {
            ball.active = false;
        }
    }
    let before = state.balls.len();
    state.balls.retain(|b| b.active);
    if state.balls.len() < before {
        events.push(GameEvent::BallLost {
            remaining: state.balls.len(),
        });
    }

    if state.balls.is_empty() && state.phase == GamePhase::Playing {
        state.lives = state.lives.saturating_sub(1);
        events.push(GameEvent::LifeLost {
            remaining: state.lives,
        });
        if state.lives == 0 {
            state.phase = GamePhase::GameOver;
            events.push(GameEvent::PhaseChanged {
                phase: GamePhase::GameOver,
            });
        } else {
            state.round_reset();
            events.push(GameEvent::PhaseChanged {
                phase: GamePhase::Ready,
            });
        }
    }
}

fn check_win(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.endless || state.phase != GamePhase::Playing {
        return;
    }
    if state.book.all_activated() {
        state.phase = GamePhase::Win;
        events.push(GameEvent::PhaseChanged {
            phase: GamePhase::Win,
        });
    }
}

fn apply_hazard_life_loss(state: &mut GameState, events: &mut Vec<GameEvent>) {
    // The cost lands even if the round reset mid-sequence; only a game
    // that already ended is off-limits.
    if matches!(state.phase, GamePhase::GameOver | GamePhase::Win) {
        return;
    }
    state.lives = state.lives.saturating_sub(1);
    events.push(GameEvent::LifeLost {
        remaining: state.lives,
    });
    if state.lives == 0 {
        state.phase = GamePhase::GameOver;
        events.push(GameEvent::PhaseChanged {
            phase: GamePhase::GameOver,
        });
    }
}

fn activate_next(state: &mut GameState, tuning: &Tuning, skill: usize, events: &mut Vec<GameEvent>) {
    if skill >= state.book.skill_count() {
        events.push(GameEvent::AllActivated);
        if !state.endless && state.phase != GamePhase::Win {
            state.phase = GamePhase::Win;
            events.push(GameEvent::PhaseChanged {
                phase: GamePhase::Win,
            });
        }
        return;
    }

    let remaining = state.book.remaining(skill);
    if remaining > 0 {
        state.book.award(skill, remaining);
        events.push(GameEvent::PointsAwarded {
            skill,
            delta: remaining,
            at: Vec2::new(state.width / 2.0, state.height * 0.4),
        });
    }
    state.timers.push(DeferredAction {
        fire_at: state.tick_count + tuning.activate_step_ticks as u64,
        epoch: state.epoch,
        kind: ActionKind::ActivateNext { skill: skill + 1 },
    });
}
