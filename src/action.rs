//! Actions: a slide by the player or a placement by the environment.

use std::fmt;

use crate::engine::{Board, Direction, Rank, Reward};

/// A pure instruction; it holds no reference to the board it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Slide(Direction),
    /// Put `tile` on `pos` (0..16) and announce `hint` as the next tile.
    Place { pos: u8, tile: Rank, hint: Rank },
}

impl Action {
    #[inline]
    pub fn slide(dir: Direction) -> Self {
        Action::Slide(dir)
    }

    #[inline]
    pub fn place(pos: usize, tile: Rank, hint: Rank) -> Self {
        debug_assert!(pos < 16);
        Action::Place { pos: pos as u8, tile, hint }
    }

    /// Apply to `board`, returning the reward or `ILLEGAL_MOVE`.
    pub fn apply(&self, board: &mut Board) -> Reward {
        match *self {
            Action::Slide(dir) => board.slide(dir),
            Action::Place { pos, tile, hint } => board.place(pos as usize, tile, hint),
        }
    }

    #[inline]
    pub fn is_slide(&self) -> bool {
        matches!(self, Action::Slide(_))
    }
}

impl From<Direction> for Action {
    fn from(dir: Direction) -> Self {
        Action::Slide(dir)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Slide(dir) => write!(f, "#{}", dir.code()),
            Action::Place { pos, tile, hint } => write!(f, "{pos}={tile}+{hint}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ILLEGAL_MOVE;

    #[test]
    fn it_applies_slides_and_placements() {
        let mut board = Board::EMPTY;
        assert_eq!(Action::place(4, 1, 2).apply(&mut board), 0);
        assert_eq!(board.cell(4), 1);
        assert_eq!(Action::place(4, 2, 2).apply(&mut board), ILLEGAL_MOVE);
        assert_eq!(Action::place(5, 2, 3).apply(&mut board), 0);
        assert_eq!(Action::from(Direction::Left).apply(&mut board), 3);
        assert_eq!(board.cell(4), 3);
        assert_eq!(Action::slide(Direction::Left).apply(&mut board), ILLEGAL_MOVE);
    }

    #[test]
    fn it_formats() {
        assert_eq!(Action::slide(Direction::Right).to_string(), "#2");
        assert_eq!(Action::place(15, 3, 1).to_string(), "15=3+1");
        assert!(Action::slide(Direction::Up).is_slide());
        assert!(!Action::place(0, 1, 1).is_slide());
    }
}
