//! Host boundary
//!
//! A [`Session`] owns one game run: the simulation state, the input
//! accumulator, and the callbacks the host page injected at mount time.
//! Each animation frame the platform layer calls [`Session::advance`],
//! which steps the fixed-timestep simulation, forwards the events that
//! concern the host through the hooks, and hands the full event list back
//! for HUD and feedback rendering.
//!
//! Lifecycle operations (`retry`, `finish`, `activate_all`,
//! `reset_progress`, `dispose`) mirror the buttons the host renders over
//! the playfield. `dispose` bumps the session epoch, so any deferred
//! action still queued inside the simulation becomes a guarded no-op.

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::input::InputState;
use crate::sim::{GameEvent, GamePhase, GameState, start_activate_all, tick};
use crate::skills::{SkillBook, SkillProgress, Taxonomy};
use crate::tuning::Tuning;
use std::collections::HashMap;

/// Callbacks injected by the host at construction. Defaults are no-ops so
/// native and test sessions can run headless.
pub struct HostHooks {
    /// Points granted to a named skill; the host applies the same clamp
    /// the engine already did
    pub on_point_update: Box<dyn FnMut(&str, u8)>,
    /// Session finished; `true` for a win, `false` for game over
    pub on_game_end: Box<dyn FnMut(bool)>,
    /// The bulk-completion script finished awarding every skill
    pub on_activate_all: Box<dyn FnMut()>,
    /// Endless-mode request to wipe all skill progress
    pub on_reset_progress: Box<dyn FnMut()>,
}

impl Default for HostHooks {
    fn default() -> Self {
        Self {
            on_point_update: Box::new(|_, _| {}),
            on_game_end: Box::new(|_| {}),
            on_activate_all: Box::new(|| {}),
            on_reset_progress: Box::new(|| {}),
        }
    }
}

/// One mounted game run
pub struct Session {
    state: GameState,
    tuning: Tuning,
    input: InputState,
    hooks: HostHooks,
    accumulator: f32,
    disposed: bool,
}

impl Session {
    /// Build a session from the host's taxonomy and progress snapshot.
    /// `has_won` selects endless mode from the first tick. The taxonomy
    /// must contain at least one category; that precondition belongs to
    /// the host.
    pub fn new(
        seed: u64,
        field_width: f32,
        taxonomy: Taxonomy,
        initial: &HashMap<String, SkillProgress>,
        has_won: bool,
        tuning: Tuning,
        hooks: HostHooks,
    ) -> Self {
        let book = SkillBook::new(taxonomy, initial);
        let tuning = tuning.sanitized();
        let state = GameState::new(seed, field_width, book, has_won, &tuning);
        Self {
            state,
            tuning,
            input: InputState::new(),
            hooks,
            accumulator: 0.0,
            disposed: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn endless(&self) -> bool {
        self.state.endless
    }

    pub fn disposed(&self) -> bool {
        self.disposed
    }

    /// DOM handlers write through this between frames
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Advance the simulation by one frame of wall-clock time. Runs zero
    /// or more fixed steps depending on the accumulated elapsed time,
    /// dispatches host callbacks, and returns every event for the
    /// presentation layer. A disposed session stays inert.
    pub fn advance(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.disposed {
            return Vec::new();
        }

        // Long frames (tab switch, debugger pause) are capped so the sim
        // never tries to catch up across seconds of dead time.
        self.accumulator += dt.min(0.1);
        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let tick_input = self.input.take_tick_input();
            events.extend(tick(&mut self.state, &tick_input, &self.tuning));
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        self.dispatch(&events);
        events
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::PointsAwarded { skill, delta, .. } => {
                    let name = self.state.book.skill(*skill).name.clone();
                    (self.hooks.on_point_update)(&name, *delta);
                }
                GameEvent::AllActivated => {
                    (self.hooks.on_activate_all)();
                }
                _ => {}
            }
        }
    }

    /// Report the terminal outcome to the host. Only meaningful from a
    /// terminal phase; the host decides whether to unmount afterwards.
    pub fn finish(&mut self) {
        match self.state.phase {
            GamePhase::Win => (self.hooks.on_game_end)(true),
            GamePhase::GameOver => (self.hooks.on_game_end)(false),
            _ => {}
        }
    }

    /// Player chose to retry from game over (or replay after a win):
    /// fresh lives, fresh grid, score back to zero.
    pub fn retry(&mut self) {
        if self.disposed {
            return;
        }
        self.input.clear();
        self.state.restart(&self.tuning);
    }

    /// Start the scripted bulk-completion walk
    pub fn activate_all(&mut self) {
        if self.disposed {
            return;
        }
        start_activate_all(&mut self.state);
    }

    /// Endless-mode only: wipe all skill progress, tell the host to do
    /// the same, and restart a normal run from a full grid. With nothing
    /// activated anymore the session leaves endless mode, so bricks award
    /// points again and the win is back on the table.
    pub fn reset_progress(&mut self) {
        if self.disposed || !self.state.endless {
            return;
        }
        self.state.book.reset_all();
        self.state.endless = false;
        (self.hooks.on_reset_progress)();
        self.state.restart(&self.tuning);
    }

    /// Tear the session down. The epoch bump strands every still-pending
    /// deferred action; subsequent advances are no-ops.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.state.epoch += 1;
        self.state.timers.clear();
        self.input.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{POINTS_TO_ACTIVATE, START_LIVES};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Record of every hook invocation, shared with the closures
    #[derive(Debug, Default)]
    struct HookLog {
        points: Vec<(String, u8)>,
        game_end: Vec<bool>,
        activate_all: u32,
        reset_progress: u32,
    }

    fn recording_hooks() -> (HostHooks, Rc<RefCell<HookLog>>) {
        let log = Rc::new(RefCell::new(HookLog::default()));
        let hooks = HostHooks {
            on_point_update: {
                let log = log.clone();
                Box::new(move |name, delta| {
                    log.borrow_mut().points.push((name.to_string(), delta));
                })
            },
            on_game_end: {
                let log = log.clone();
                Box::new(move |win| log.borrow_mut().game_end.push(win))
            },
            on_activate_all: {
                let log = log.clone();
                Box::new(move || log.borrow_mut().activate_all += 1)
            },
            on_reset_progress: {
                let log = log.clone();
                Box::new(move || log.borrow_mut().reset_progress += 1)
            },
        };
        (hooks, log)
    }

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            categories: vec![
                crate::skills::CategoryDef {
                    name: "Languages".into(),
                    color: "#e0218a".into(),
                    skills: vec!["Python".into(), "Rust".into()],
                },
                crate::skills::CategoryDef {
                    name: "Tools".into(),
                    color: "#9333ea".into(),
                    skills: vec!["Git".into()],
                },
            ],
        }
    }

    fn quiet_session(has_won: bool) -> (Session, Rc<RefCell<HookLog>>) {
        let tuning = Tuning {
            gap_chance: 0.0,
            powerup_chance: 0.0,
            hazard_chance: 0.0,
            ..Tuning::default()
        };
        let (hooks, log) = recording_hooks();
        let session = Session::new(
            42,
            800.0,
            taxonomy(),
            &HashMap::new(),
            has_won,
            tuning,
            hooks,
        );
        (session, log)
    }

    /// One fixed step's worth of wall time
    fn step(session: &mut Session) -> Vec<GameEvent> {
        session.advance(SIM_DT)
    }

    #[test]
    fn test_advance_accumulates_fixed_steps() {
        let (mut session, _) = quiet_session(false);
        let t0 = session.state().tick_count;

        // Half a step: no tick yet
        session.advance(SIM_DT / 2.0);
        assert_eq!(session.state().tick_count, t0);

        // The other half completes one step
        session.advance(SIM_DT / 2.0);
        assert_eq!(session.state().tick_count, t0 + 1);

        // A long frame is capped: no catching up across seconds of dead time
        session.advance(10.0);
        let caught_up = session.state().tick_count - (t0 + 1);
        assert!(caught_up >= 1);
        assert!(caught_up <= MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_input_flows_into_launch() {
        let (mut session, _) = quiet_session(false);
        assert_eq!(session.phase(), GamePhase::Ready);
        session.input_mut().press();
        step(&mut session);
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_points_forwarded_by_name() {
        let (mut session, log) = quiet_session(false);
        session.input_mut().press();
        step(&mut session);

        // Drive the ball into the first brick
        let target = session.state.bricks[0].rect.center();
        session.state.balls[0].pos = target;
        session.state.balls[0].vel = glam::Vec2::new(0.0, -0.1);
        step(&mut session);

        let log = log.borrow();
        assert_eq!(log.points.len(), 1);
        let (name, delta) = &log.points[0];
        assert!(*delta >= 1 && *delta <= POINTS_TO_ACTIVATE);
        assert!(["Python", "Rust", "Git"].contains(&name.as_str()));
    }

    #[test]
    fn test_activate_all_reports_and_wins() {
        let (mut session, log) = quiet_session(false);
        session.activate_all();

        for _ in 0..200 {
            step(&mut session);
        }

        assert_eq!(session.phase(), GamePhase::Win);
        assert_eq!(log.borrow().activate_all, 1);
        // One award per skill, in taxonomy order, by name
        let names: Vec<String> = log.borrow().points.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, vec!["Python", "Rust", "Git"]);

        session.finish();
        assert_eq!(log.borrow().game_end, vec![true]);
    }

    #[test]
    fn test_finish_reports_loss() {
        let (mut session, log) = quiet_session(false);
        session.input_mut().press();
        step(&mut session);
        session.state.lives = 1;
        session.state.balls[0].pos.y = session.state.height + 20.0;
        step(&mut session);
        assert_eq!(session.phase(), GamePhase::GameOver);

        // finish is a no-op until a terminal phase, then reports once per call
        session.finish();
        assert_eq!(log.borrow().game_end, vec![false]);
    }

    #[test]
    fn test_finish_noop_outside_terminal_phase() {
        let (mut session, log) = quiet_session(false);
        session.finish();
        assert!(log.borrow().game_end.is_empty());
    }

    #[test]
    fn test_retry_restores_fresh_run() {
        let (mut session, _) = quiet_session(false);
        session.input_mut().press();
        step(&mut session);
        session.state.lives = 1;
        session.state.balls[0].pos.y = session.state.height + 20.0;
        step(&mut session);
        assert_eq!(session.phase(), GamePhase::GameOver);

        session.retry();
        assert_eq!(session.phase(), GamePhase::Ready);
        assert_eq!(session.state().lives, START_LIVES);
        assert_eq!(session.state().active_balls(), 1);
    }

    #[test]
    fn test_reset_progress_endless_only() {
        let (mut session, log) = quiet_session(false);
        session.reset_progress();
        assert_eq!(log.borrow().reset_progress, 0);

        let (mut endless, log) = quiet_session(true);
        endless.state.book.award(0, POINTS_TO_ACTIVATE);
        endless.state.endless_score = 12;
        endless.reset_progress();
        assert_eq!(log.borrow().reset_progress, 1);
        assert_eq!(endless.state().book.skill(0).points, 0);
        assert_eq!(endless.state().endless_score, 0);
        assert_eq!(endless.phase(), GamePhase::Ready);
    }

    #[test]
    fn test_reset_progress_leaves_endless_mode() {
        let (mut session, log) = quiet_session(true);
        session.reset_progress();
        assert!(!session.endless());

        // The fresh run awards points again instead of scoring
        session.input_mut().press();
        step(&mut session);
        session.state.balls[0].pos = session.state.bricks[0].rect.center();
        session.state.balls[0].vel = glam::Vec2::new(0.0, -0.1);
        let events = step(&mut session);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::PointsAwarded { .. }))
        );
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, GameEvent::EndlessScored { .. }))
        );
        assert_eq!(log.borrow().points.len(), 1);
        assert_eq!(session.state().endless_score, 0);
    }

    #[test]
    fn test_dispose_makes_session_inert() {
        let (mut session, log) = quiet_session(false);
        session.input_mut().press();
        step(&mut session);
        let epoch_before = session.state().epoch;

        session.dispose();
        assert!(session.disposed());
        assert_eq!(session.state().epoch, epoch_before + 1);
        assert!(session.state().timers.is_empty());

        let tick_before = session.state().tick_count;
        assert!(session.advance(1.0).is_empty());
        assert_eq!(session.state().tick_count, tick_before);

        session.retry();
        session.activate_all();
        session.reset_progress();
        assert_eq!(session.state().tick_count, tick_before);
        assert_eq!(log.borrow().activate_all, 0);
    }
}
