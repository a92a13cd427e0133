//! Skill taxonomy input and the engine-side progression mirror
//!
//! The host page owns the authoritative skill-progress store; the engine
//! keeps this mirror because collision resolution and the win check read
//! progress synchronously. The mirror applies the same clamping the host
//! does, so the two can only drift if the host rejects an award, which it
//! never does by contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::consts::POINTS_TO_ACTIVATE;

/// One skill category as supplied by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    /// CSS hex color, e.g. "#e0218a"
    pub color: String,
    /// Ordered skill names
    pub skills: Vec<String>,
}

/// Host-supplied per-skill progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProgress {
    #[serde(default)]
    pub points: u8,
    #[serde(default)]
    pub activated: bool,
}

/// The category list. Supplied as an ordered JSON array because the
/// round-robin grid assignment depends on category order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    pub categories: Vec<CategoryDef>,
}

impl Taxonomy {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A flattened skill with its category back-reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillEntry {
    pub name: String,
    pub category: usize,
    pub points: u8,
    pub activated: bool,
}

/// Result of a point award
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwardOutcome {
    /// Delta actually applied after clamping to the activation cap
    pub applied: u8,
    pub newly_activated: bool,
}

/// Runtime view of all skills, flattened in taxonomy order
#[derive(Debug, Clone, PartialEq)]
pub struct SkillBook {
    taxonomy: Taxonomy,
    skills: Vec<SkillEntry>,
}

impl SkillBook {
    /// Build from the taxonomy and the host's initial progress map.
    /// Skills missing from the map start at zero; map entries that name
    /// no known skill are ignored.
    pub fn new(taxonomy: Taxonomy, initial: &HashMap<String, SkillProgress>) -> Self {
        let mut skills = Vec::new();
        for (cat_idx, cat) in taxonomy.categories.iter().enumerate() {
            for name in &cat.skills {
                let progress = initial.get(name).copied().unwrap_or_default();
                let points = progress.points.min(POINTS_TO_ACTIVATE);
                skills.push(SkillEntry {
                    name: name.clone(),
                    category: cat_idx,
                    points,
                    activated: progress.activated || points >= POINTS_TO_ACTIVATE,
                });
            }
        }
        Self { taxonomy, skills }
    }

    pub fn category_count(&self) -> usize {
        self.taxonomy.categories.len()
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn category(&self, idx: usize) -> &CategoryDef {
        &self.taxonomy.categories[idx]
    }

    pub fn skill(&self, idx: usize) -> &SkillEntry {
        &self.skills[idx]
    }

    /// Indices of the skills belonging to a category, in taxonomy order
    pub fn category_skills(&self, cat: usize) -> impl Iterator<Item = usize> + '_ {
        self.skills
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.category == cat)
            .map(|(i, _)| i)
    }

    /// A category is complete when every skill in it is activated
    pub fn category_activated(&self, cat: usize) -> bool {
        self.skills
            .iter()
            .filter(|s| s.category == cat)
            .all(|s| s.activated)
    }

    pub fn all_activated(&self) -> bool {
        !self.skills.is_empty() && self.skills.iter().all(|s| s.activated)
    }

    /// Points still needed before a skill activates
    pub fn remaining(&self, skill: usize) -> u8 {
        POINTS_TO_ACTIVATE.saturating_sub(self.skills[skill].points)
    }

    /// Add points to a skill, clamped to the activation cap. Activation
    /// is one-way; awards never decrement.
    pub fn award(&mut self, skill: usize, delta: u8) -> AwardOutcome {
        let entry = &mut self.skills[skill];
        let before = entry.points;
        entry.points = entry.points.saturating_add(delta).min(POINTS_TO_ACTIVATE);
        let was_activated = entry.activated;
        if entry.points >= POINTS_TO_ACTIVATE {
            entry.activated = true;
        }
        AwardOutcome {
            applied: entry.points - before,
            newly_activated: entry.activated && !was_activated,
        }
    }

    /// Wipe all progress (endless-mode reset-from-zero path)
    pub fn reset_all(&mut self) {
        for s in &mut self.skills {
            s.points = 0;
            s.activated = false;
        }
    }

    /// Per-category brick color packed as 0xRRGGBBAA, white on a bad hex
    pub fn category_color_rgba(&self, cat: usize) -> u32 {
        parse_hex_color(&self.taxonomy.categories[cat].color).unwrap_or(0xFFFF_FFFF)
    }
}

/// Parse "#rrggbb" (or "rrggbb") into packed 0xRRGGBBAA
pub fn parse_hex_color(s: &str) -> Option<u32> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(u32::from_be_bytes([r, g, b, 0xFF]))
}

/// Small fixed taxonomy used across the sim tests
#[cfg(test)]
pub fn test_book() -> SkillBook {
    let taxonomy = Taxonomy {
        categories: vec![
            CategoryDef {
                name: "Languages".into(),
                color: "#e0218a".into(),
                skills: vec!["Python".into(), "C++".into(), "R".into()],
            },
            CategoryDef {
                name: "ML/AI".into(),
                color: "#0abdc6".into(),
                skills: vec!["TensorFlow".into(), "PyTorch".into()],
            },
            CategoryDef {
                name: "Tools".into(),
                color: "#9333ea".into(),
                skills: vec!["Docker".into(), "Git".into()],
            },
        ],
    };
    SkillBook::new(taxonomy, &HashMap::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_clamps_and_activates() {
        let mut book = test_book();
        let out = book.award(0, 3);
        assert_eq!(out.applied, 3);
        assert!(!out.newly_activated);

        let out = book.award(0, 4);
        assert_eq!(out.applied, 2);
        assert!(out.newly_activated);
        assert_eq!(book.skill(0).points, 5);
        assert!(book.skill(0).activated);

        // Further awards apply nothing and never re-report activation
        let out = book.award(0, 5);
        assert_eq!(out.applied, 0);
        assert!(!out.newly_activated);
    }

    #[test]
    fn test_category_activated_requires_every_skill() {
        let mut book = test_book();
        book.award(3, 5);
        assert!(!book.category_activated(1));
        book.award(4, 5);
        assert!(book.category_activated(1));
        assert!(!book.category_activated(0));
        assert!(!book.all_activated());
    }

    #[test]
    fn test_all_activated() {
        let mut book = test_book();
        for i in 0..book.skill_count() {
            book.award(i, 5);
        }
        assert!(book.all_activated());
        book.reset_all();
        assert!(!book.all_activated());
        assert_eq!(book.skill(2).points, 0);
    }

    #[test]
    fn test_initial_state_applies_and_ignores_unknown() {
        let taxonomy = Taxonomy {
            categories: vec![CategoryDef {
                name: "Languages".into(),
                color: "#e0218a".into(),
                skills: vec!["Python".into(), "SQL".into()],
            }],
        };
        let mut initial = HashMap::new();
        initial.insert(
            "Python".to_string(),
            SkillProgress {
                points: 7,
                activated: false,
            },
        );
        initial.insert(
            "Basket Weaving".to_string(),
            SkillProgress {
                points: 5,
                activated: true,
            },
        );
        let book = SkillBook::new(taxonomy, &initial);
        assert_eq!(book.skill_count(), 2);
        // Over-cap input clamps and implies activation
        assert_eq!(book.skill(0).points, 5);
        assert!(book.skill(0).activated);
        assert_eq!(book.skill(1).points, 0);
    }

    #[test]
    fn test_taxonomy_json_array_form() {
        let json = r##"[
            {"name": "Languages", "color": "#e0218a", "skills": ["Python", "C++"]},
            {"name": "Tools", "color": "#9333ea", "skills": ["Git"]}
        ]"##;
        let tax = Taxonomy::from_json(json).expect("parse taxonomy");
        assert_eq!(tax.categories.len(), 2);
        assert_eq!(tax.categories[0].skills[1], "C++");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#e0218a"), Some(0xE021_8AFF));
        assert_eq!(parse_hex_color("0abdc6"), Some(0x0ABD_C6FF));
        assert_eq!(parse_hex_color("#xyz"), None);
        assert_eq!(parse_hex_color("#e0218a00ff"), None);
    }
}
