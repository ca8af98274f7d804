//! Tile bag and placement planning.
//!
//! The bag holds four tiles of each base rank (1, 2, 3). Drawing removes a
//! tile; an emptied bag refills itself. New tiles enter on the edge the last
//! slide vacated, or anywhere before the first slide.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::action::Action;
use crate::engine::{Board, Direction, Rank, CELLS};

/// Ranks the bag deals out.
pub const BASE_RANKS: [Rank; 3] = [1, 2, 3];
/// Copies of each base rank in a full bag.
pub const TILES_PER_RANK: u8 = 4;

const ALL_CELLS: [usize; CELLS] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

/// Remaining counts of each base rank.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TileBag {
    counts: [u8; 3],
}

impl Default for TileBag {
    fn default() -> Self {
        TileBag::FULL
    }
}

impl TileBag {
    pub const FULL: TileBag = TileBag { counts: [TILES_PER_RANK; 3] };

    #[inline]
    pub fn is_base(rank: Rank) -> bool {
        (1..=3).contains(&rank)
    }

    /// Tiles of `rank` left; 0 for ranks the bag never holds.
    #[inline]
    pub fn count(&self, rank: Rank) -> u8 {
        if Self::is_base(rank) {
            self.counts[rank as usize - 1]
        } else {
            0
        }
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&c| c as u32).sum()
    }

    /// Remove one tile of `rank`, refilling when the bag runs dry.
    pub fn take(&mut self, rank: Rank) {
        debug_assert!(self.count(rank) > 0, "taking rank {rank} from {self:?}");
        if let Some(slot) = rank.checked_sub(1).and_then(|i| self.counts.get_mut(i as usize)) {
            *slot = slot.saturating_sub(1);
        }
        if self.total() == 0 {
            *self = TileBag::FULL;
        }
    }

    /// Draw a tile with probability proportional to the remaining counts.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Rank {
        let mut pick = rng.gen_range(0..self.total());
        let rank = BASE_RANKS
            .into_iter()
            .find(|&rank| {
                let count = self.count(rank) as u32;
                if pick < count {
                    true
                } else {
                    pick -= count;
                    false
                }
            })
            .unwrap_or(3);
        self.take(rank);
        rank
    }
}

/// Cells a new tile may enter after a slide toward `last`.
pub fn placement_positions(last: Option<Direction>) -> &'static [usize] {
    match last {
        Some(Direction::Left) => &[3, 7, 11, 15],
        Some(Direction::Up) => &[12, 13, 14, 15],
        Some(Direction::Right) => &[0, 4, 8, 12],
        Some(Direction::Down) => &[0, 1, 2, 3],
        None => &ALL_CELLS,
    }
}

/// Plan the next placement on the edge vacated by the last slide.
///
/// The placed tile is the pending hint when there is one, otherwise a draw
/// from the bag; the new hint is drawn from what is left. Returns `None` when
/// every cell of the edge is occupied.
pub fn plan_placement<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<Action> {
    plan_within(board, placement_positions(board.last()), rng)
}

/// Like [`plan_placement`] but considers every empty cell.
pub fn plan_placement_anywhere<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<Action> {
    plan_within(board, &ALL_CELLS, rng)
}

fn plan_within<R: Rng + ?Sized>(board: &Board, positions: &[usize], rng: &mut R) -> Option<Action> {
    let mut empty = [0usize; CELLS];
    let mut n = 0;
    for &pos in positions.iter().filter(|&&pos| board.cell(pos) == 0) {
        empty[n] = pos;
        n += 1;
    }
    let &pos = empty[..n].choose(rng)?;

    let mut bag = *board.bag();
    let tile = match board.hint() {
        0 => bag.draw(rng),
        hint => hint,
    };
    let hint = bag.draw(rng);
    Some(Action::place(pos, tile, hint))
}
