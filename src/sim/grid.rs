//! Brick grid construction
//!
//! The grid is rebuilt from the skill book at session start, on retry, and
//! after a progress reset. Between rebuilds bricks only toggle status.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::rect::Rect;
use super::state::{Brick, BrickStatus};
use crate::skills::SkillBook;
use crate::tuning::Tuning;

/// Grid geometry for the current field size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub cols: u32,
    pub rows: u32,
    pub brick_w: f32,
    pub brick_h: f32,
    pub padding: f32,
    pub offset_top: f32,
    pub offset_left: f32,
}

impl GridSpec {
    /// Cell counts drop on narrow fields so bricks stay tappable
    pub fn for_field(width: f32, tuning: &Tuning) -> Self {
        let (cols, rows) = if width < tuning.narrow_field_px {
            (6, 4)
        } else {
            (8, 5)
        };
        let brick_w = (width - 2.0 * tuning.grid_offset_left
            - tuning.brick_padding * (cols - 1) as f32)
            / cols as f32;
        Self {
            cols,
            rows,
            brick_w,
            brick_h: tuning.brick_height,
            padding: tuning.brick_padding,
            offset_top: tuning.grid_offset_top,
            offset_left: tuning.grid_offset_left,
        }
    }

    pub fn cell_count(&self) -> usize {
        (self.cols * self.rows) as usize
    }

    pub fn cell_rect(&self, col: u32, row: u32) -> Rect {
        let x = self.offset_left + col as f32 * (self.brick_w + self.padding);
        let y = self.offset_top + row as f32 * (self.brick_h + self.padding);
        Rect::new(Vec2::new(x, y), Vec2::new(self.brick_w, self.brick_h))
    }

    /// Index into the column-major brick vector
    pub fn index_of(&self, col: u32, row: u32) -> usize {
        (col * self.rows + row) as usize
    }
}

/// Build the brick vector in column-major order.
///
/// Categories are assigned by round-robin over not-yet-fully-activated
/// categories; once every category is complete (or always in endless
/// mode) the rotation falls back to all of them. Every cell independently
/// rolls a permanent-gap chance; cells whose assigned category is already
/// complete are also forced to permanent gaps outside endless mode, which
/// visually clears finished categories.
///
/// The skill book must contain at least one category; the host owns that
/// precondition.
pub fn build_bricks(
    spec: &GridSpec,
    book: &SkillBook,
    endless: bool,
    tuning: &Tuning,
    rng: &mut Pcg32,
) -> Vec<Brick> {
    let all: Vec<usize> = (0..book.category_count()).collect();
    let live: Vec<usize> = if endless {
        all.clone()
    } else {
        let open: Vec<usize> = all
            .iter()
            .copied()
            .filter(|&c| !book.category_activated(c))
            .collect();
        if open.is_empty() { all.clone() } else { open }
    };

    let mut bricks = Vec::with_capacity(spec.cell_count());
    for col in 0..spec.cols {
        for row in 0..spec.rows {
            let category = live[((col + row) as usize) % live.len()];
            let gap = rng.random_bool(tuning.gap_chance as f64);
            let finished = !endless && book.category_activated(category);
            let permanently_empty = gap || finished;
            bricks.push(Brick {
                col,
                row,
                rect: spec.cell_rect(col, row),
                status: if permanently_empty {
                    BrickStatus::Empty
                } else {
                    BrickStatus::Active
                },
                category,
                permanently_empty,
            });
        }
    }
    bricks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::test_book;
    use rand::SeedableRng;

    fn rng(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    #[test]
    fn test_responsive_dims() {
        let tuning = Tuning::default();
        let wide = GridSpec::for_field(800.0, &tuning);
        assert_eq!((wide.cols, wide.rows), (8, 5));
        let narrow = GridSpec::for_field(400.0, &tuning);
        assert_eq!((narrow.cols, narrow.rows), (6, 4));
    }

    #[test]
    fn test_cells_fill_width_without_overlap() {
        let tuning = Tuning::default();
        let spec = GridSpec::for_field(800.0, &tuning);
        let first = spec.cell_rect(0, 0);
        let last = spec.cell_rect(spec.cols - 1, 0);
        assert_eq!(first.left(), tuning.grid_offset_left);
        assert!((last.right() - (800.0 - tuning.grid_offset_left)).abs() < 1e-3);

        // Adjacent cells are separated by the padding gap
        let second = spec.cell_rect(1, 0);
        assert!((second.left() - first.right() - tuning.brick_padding).abs() < 1e-3);
        let below = spec.cell_rect(0, 1);
        assert!(!first.overlaps(&below));
    }

    #[test]
    fn test_column_major_indexing_matches_build_order() {
        let tuning = Tuning::default();
        let spec = GridSpec::for_field(800.0, &tuning);
        let bricks = build_bricks(&spec, &test_book(), false, &tuning, &mut rng(1));
        assert_eq!(bricks.len(), spec.cell_count());
        for col in 0..spec.cols {
            for row in 0..spec.rows {
                let b = &bricks[spec.index_of(col, row)];
                assert_eq!((b.col, b.row), (col, row));
            }
        }
    }

    #[test]
    fn test_gaps_are_empty_and_permanent() {
        let tuning = Tuning::default();
        let spec = GridSpec::for_field(800.0, &tuning);
        let bricks = build_bricks(&spec, &test_book(), false, &tuning, &mut rng(3));
        let gaps = bricks.iter().filter(|b| b.permanently_empty).count();
        assert!(gaps > 0, "seed 3 should roll at least one gap");
        for b in &bricks {
            if b.permanently_empty {
                assert_eq!(b.status, BrickStatus::Empty);
            } else {
                assert_eq!(b.status, BrickStatus::Active);
            }
        }
    }

    #[test]
    fn test_completed_category_excluded_from_rotation() {
        let tuning = Tuning::default();
        let spec = GridSpec::for_field(800.0, &tuning);
        let mut book = test_book();
        // Complete category 1 (two skills)
        for idx in book.category_skills(1).collect::<Vec<_>>() {
            book.award(idx, 5);
        }
        let bricks = build_bricks(&spec, &book, false, &tuning, &mut rng(5));
        assert!(bricks.iter().all(|b| b.category != 1));
        assert!(bricks.iter().any(|b| b.category == 0));
        assert!(bricks.iter().any(|b| b.category == 2));
    }

    #[test]
    fn test_endless_keeps_completed_categories() {
        let tuning = Tuning::default();
        let spec = GridSpec::for_field(800.0, &tuning);
        let mut book = test_book();
        for idx in book.category_skills(1).collect::<Vec<_>>() {
            book.award(idx, 5);
        }
        let bricks = build_bricks(&spec, &book, true, &tuning, &mut rng(5));
        assert!(bricks.iter().any(|b| b.category == 1));
        // Completion does not force gaps in endless mode
        assert!(
            bricks
                .iter()
                .any(|b| b.category == 1 && !b.permanently_empty)
        );
    }

    #[test]
    fn test_everything_activated_forces_empty_grid() {
        let tuning = Tuning::default();
        let spec = GridSpec::for_field(800.0, &tuning);
        let mut book = test_book();
        for i in 0..book.skill_count() {
            book.award(i, 5);
        }
        let bricks = build_bricks(&spec, &book, false, &tuning, &mut rng(9));
        assert!(bricks.iter().all(|b| b.permanently_empty));
    }

    #[test]
    fn test_zero_gap_chance_fills_grid() {
        let tuning = Tuning {
            gap_chance: 0.0,
            ..Tuning::default()
        };
        let spec = GridSpec::for_field(800.0, &tuning);
        let bricks = build_bricks(&spec, &test_book(), false, &tuning, &mut rng(11));
        assert!(bricks.iter().all(|b| b.status == BrickStatus::Active));
    }
}
