//! Input state tracker.
//!
//! DOM event handlers feed this accumulator; the session drains it into a
//! [`TickInput`] once per simulation tick. Held keys drive continuous
//! paddle movement, while launch and pointer targets are edge-triggered:
//! consumed by the first tick after they arrive.

use crate::sim::TickInput;

#[derive(Debug, Default)]
pub struct InputState {
    /// Latest pointer/touch x in field coordinates, consumed per tick
    target_x: Option<f32>,
    left_held: bool,
    right_held: bool,
    launch_queued: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer or touch moved to `x` (field coordinates)
    pub fn point_to(&mut self, x: f32) {
        self.target_x = Some(x);
    }

    /// Click or tap: queue a launch
    pub fn press(&mut self) {
        self.launch_queued = true;
    }

    /// Key went down. Returns true when the key is one of ours, so the
    /// caller can prevent the browser default (page scroll on space and
    /// arrows).
    pub fn key_down(&mut self, key: &str) -> bool {
        match key {
            "ArrowLeft" | "a" | "A" => {
                self.left_held = true;
                true
            }
            "ArrowRight" | "d" | "D" => {
                self.right_held = true;
                true
            }
            " " | "Enter" => {
                self.launch_queued = true;
                true
            }
            _ => false,
        }
    }

    pub fn key_up(&mut self, key: &str) {
        match key {
            "ArrowLeft" | "a" | "A" => self.left_held = false,
            "ArrowRight" | "d" | "D" => self.right_held = false,
            _ => {}
        }
    }

    /// Drop everything, including held-key state. Used across restart and
    /// teardown boundaries so a key held through them cannot keep moving
    /// the paddle.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Produce the input for one tick and clear the one-shot parts
    pub fn take_tick_input(&mut self) -> TickInput {
        let move_dir = match (self.left_held, self.right_held) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        TickInput {
            target_x: self.target_x.take(),
            move_dir,
            launch: std::mem::take(&mut self.launch_queued),
        }
    }
}
