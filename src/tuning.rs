//! Data-driven game balance
//!
//! Every probability and pacing constant the collision engine branches on
//! lives here so tests can substitute deterministic values and the host
//! can override individual fields with a partial JSON object.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Chance for a grid cell to be a permanent gap
    pub gap_chance: f32,
    /// Field width below which the grid drops to 6x4 cells
    pub narrow_field_px: f32,
    pub brick_height: f32,
    pub brick_padding: f32,
    pub grid_offset_top: f32,
    pub grid_offset_left: f32,

    /// Speed multiplier gained per brick hit
    pub speed_increment: f32,
    /// Power-up spawn roll on a non-permanent brick hit
    pub powerup_chance: f32,
    /// Hazard spawn roll on a non-permanent brick hit
    pub hazard_chance: f32,
    /// Brick regeneration delay range in ticks (uniform)
    pub regen_min_ticks: u32,
    pub regen_max_ticks: u32,

    pub powerup_size: f32,
    pub powerup_fall_speed: f32,
    pub hazard_size: f32,
    pub hazard_fall_speed: f32,

    /// Paddle steering: outgoing dx = offset * factor, clamped
    pub steer_factor: f32,
    pub steer_max: f32,
    /// Horizontal velocity offset applied to split clones
    pub split_offset: f32,
    /// Multiball launch angles, degrees from straight up
    pub multiball_angles_deg: [f32; 3],

    /// Hazard feedback: number of flash toggles and ticks between them.
    /// The life is deducted when the sequence completes.
    pub flash_steps: u32,
    pub flash_step_ticks: u32,

    /// Ticks between skills in the activate-all sequence
    pub activate_step_ticks: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gap_chance: 0.20,
            narrow_field_px: 520.0,
            brick_height: 20.0,
            brick_padding: 5.0,
            grid_offset_top: 30.0,
            grid_offset_left: 5.0,

            speed_increment: 0.02,
            powerup_chance: 0.10,
            hazard_chance: 0.08,
            regen_min_ticks: 300,
            regen_max_ticks: 420,

            powerup_size: 18.0,
            powerup_fall_speed: 2.5,
            hazard_size: 16.0,
            hazard_fall_speed: 3.0,

            steer_factor: 0.2,
            steer_max: 8.0,
            split_offset: 1.5,
            multiball_angles_deg: [-60.0, -30.0, 0.0],

            flash_steps: 6,
            flash_step_ticks: 5,

            activate_step_ticks: 5,
        }
    }
}

impl Tuning {
    /// Parse a full or partial override object; absent fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Clamp fields into usable ranges. Applied after host overrides so a
    /// bad value degrades instead of breaking the probability rolls.
    pub fn sanitized(mut self) -> Self {
        self.gap_chance = self.gap_chance.clamp(0.0, 1.0);
        self.powerup_chance = self.powerup_chance.clamp(0.0, 1.0);
        self.hazard_chance = self.hazard_chance.clamp(0.0, 1.0);
        if self.regen_max_ticks < self.regen_min_ticks {
            self.regen_max_ticks = self.regen_min_ticks;
        }
        self.flash_steps = self.flash_steps.max(1);
        self.flash_step_ticks = self.flash_step_ticks.max(1);
        self.activate_step_ticks = self.activate_step_ticks.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let t = Tuning::default();
        assert!(t.gap_chance > 0.0 && t.gap_chance < 1.0);
        assert!(t.regen_min_ticks <= t.regen_max_ticks);
        assert_eq!(t.multiball_angles_deg.len(), 3);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let t = Tuning::from_json(r#"{"powerup_chance": 0.0, "hazard_chance": 1.0}"#)
            .expect("parse override");
        assert_eq!(t.powerup_chance, 0.0);
        assert_eq!(t.hazard_chance, 1.0);
        assert_eq!(t.gap_chance, Tuning::default().gap_chance);
        assert_eq!(t.steer_max, Tuning::default().steer_max);
    }

    #[test]
    fn test_sanitize_clamps_bad_values() {
        let t = Tuning::from_json(r#"{"gap_chance": 7.5, "regen_min_ticks": 500, "regen_max_ticks": 100, "flash_steps": 0}"#)
            .expect("parse override")
            .sanitized();
        assert_eq!(t.gap_chance, 1.0);
        assert_eq!(t.regen_max_ticks, 500);
        assert_eq!(t.flash_steps, 1);
    }

    #[test]
    fn test_round_trip() {
        let t = Tuning::default();
        let json = serde_json::to_string(&t).expect("serialize");
        let back = Tuning::from_json(&json).expect("parse back");
        assert_eq!(t.steer_factor, back.steer_factor);
        assert_eq!(t.multiball_angles_deg, back.multiball_angles_deg);
    }
}
