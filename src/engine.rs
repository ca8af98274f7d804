//! Packed 4x4 Threes! board and the slide/merge engine.
//!
//! Cells hold a 4-bit rank: 0 is empty, 1 and 2 are the base tiles, and every
//! rank from 3 up is a merged tile whose face value doubles with each step
//! (3, 6, 12, ...). Cell 0 is the top-left corner and lives in the most
//! significant nibble; positions run row-major up to 15.
//!
//! Slides go through per-line lookup tables built once on first use. Rows are
//! looked up directly, columns by transposing before and after.

use std::fmt;
use std::sync::OnceLock;

use crate::bag::TileBag;

/// Internal tile encoding, 0..=15.
pub type Rank = u8;
/// Score gained by an action, or [`ILLEGAL_MOVE`].
pub type Reward = i32;

type BoardRaw = u64;
type Line = u16;

/// Returned by [`Board::slide`] and [`Board::place`] when the board cannot change.
pub const ILLEGAL_MOVE: Reward = -1;
/// Highest rank a nibble can hold. Two tiles of this rank do not merge.
pub const MAX_RANK: Rank = 15;
/// Reward for merging a 1 with a 2.
pub const BASE_PAIR_BONUS: Reward = 3;
/// Number of cells on the board.
pub const CELLS: usize = 16;

const LINE_TABLE_SIZE: usize = 0x1_0000;

/// A slide direction. The discriminant is the external action code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
}

impl Direction {
    /// Fixed enumeration order used wherever directions are tried in turn.
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Direction::Left),
            1 => Some(Direction::Up),
            2 => Some(Direction::Right),
            3 => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct Stores {
    slide_left: Box<[Line]>,
    slide_right: Box<[Line]>,
    reward_left: Box<[Reward]>,
    reward_right: Box<[Reward]>,
}

/// Threes! board: the packed grid plus the placement state carried between turns.
///
/// `Board` is `Copy`; probing a move on a copy never touches the original.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    grid: BoardRaw,
    last: Option<Direction>,
    hint: Rank,
    bag: TileBag,
}

impl Default for Board {
    fn default() -> Self {
        Board::EMPTY
    }
}

impl Board {
    /// Empty grid, no slide yet, no hint and a full bag.
    pub const EMPTY: Board = Board { grid: 0, last: None, hint: 0, bag: TileBag::FULL };

    /// Build a board from a packed grid, with fresh placement state.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self {
        Board { grid: raw, ..Board::EMPTY }
    }

    /// Build a board from row-major ranks.
    pub fn from_cells(cells: [Rank; CELLS]) -> Self {
        let grid = cells.iter().fold(0 as BoardRaw, |grid, &rank| {
            debug_assert!(rank <= MAX_RANK);
            (grid << 4) | (rank as BoardRaw & 0xf)
        });
        Board::from_raw(grid)
    }

    /// The packed grid, cell 0 in the top nibble.
    #[inline]
    pub fn raw(&self) -> BoardRaw {
        self.grid
    }

    /// Rank at `pos` (0..16, row-major).
    #[inline]
    pub fn cell(&self, pos: usize) -> Rank {
        debug_assert!(pos < CELLS);
        ((self.grid >> (60 - 4 * pos)) & 0xf) as Rank
    }

    #[inline]
    pub fn set_cell(&mut self, pos: usize, rank: Rank) {
        debug_assert!(pos < CELLS && rank <= MAX_RANK);
        let shift = 60 - 4 * pos;
        self.grid = (self.grid & !(0xf << shift)) | ((rank as BoardRaw & 0xf) << shift);
    }

    pub fn row(&self, row: usize) -> [Rank; 4] {
        line_to_cells(extract_line(self.grid, row))
    }

    pub fn cells(&self) -> [Rank; CELLS] {
        let mut cells = [0; CELLS];
        for (pos, cell) in cells.iter_mut().enumerate() {
            *cell = self.cell(pos);
        }
        cells
    }

    /// Direction of the last legal slide, `None` before the first one.
    #[inline]
    pub fn last(&self) -> Option<Direction> {
        self.last
    }

    /// Tile announced for the next placement, 0 when none is pending.
    #[inline]
    pub fn hint(&self) -> Rank {
        self.hint
    }

    #[inline]
    pub fn bag(&self) -> &TileBag {
        &self.bag
    }

    /// Tiles of `rank` left in the bag.
    #[inline]
    pub fn bag_count(&self, rank: Rank) -> u8 {
        self.bag.count(rank)
    }

    /// Swap the grid along its main diagonal. Applying it twice is a no-op.
    #[inline]
    pub fn transpose(&mut self) {
        self.grid = transpose(self.grid);
    }

    /// Slide every tile toward `dir`, merging eligible neighbours.
    ///
    /// Returns the merge reward, or [`ILLEGAL_MOVE`] with the board left
    /// untouched when nothing moves.
    ///
    /// ```
    /// use threes_td::engine::{Board, Direction, ILLEGAL_MOVE};
    /// let mut b = Board::from_cells([1, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    /// assert_eq!(b.slide(Direction::Left), 3);
    /// assert_eq!(b.cell(0), 3);
    /// assert_eq!(b.slide(Direction::Left), ILLEGAL_MOVE);
    /// ```
    pub fn slide(&mut self, dir: Direction) -> Reward {
        let s = stores();
        let (grid, reward) = match dir {
            Direction::Left => slide_rows(self.grid, &s.slide_left, &s.reward_left),
            Direction::Right => slide_rows(self.grid, &s.slide_right, &s.reward_right),
            Direction::Up => {
                let (grid, reward) = slide_rows(transpose(self.grid), &s.slide_left, &s.reward_left);
                (transpose(grid), reward)
            }
            Direction::Down => {
                let (grid, reward) = slide_rows(transpose(self.grid), &s.slide_right, &s.reward_right);
                (transpose(grid), reward)
            }
        };
        if grid == self.grid {
            return ILLEGAL_MOVE;
        }
        self.grid = grid;
        self.last = Some(dir);
        reward
    }

    /// Put `tile` on the empty cell `pos` and announce `hint` as the next tile.
    ///
    /// When a hint is pending, `tile` must equal it. Otherwise `tile` is drawn
    /// from the bag here. The new hint is always drawn from the bag.
    pub fn place(&mut self, pos: usize, tile: Rank, hint: Rank) -> Reward {
        if pos >= CELLS || self.cell(pos) != 0 || !TileBag::is_base(tile) || !TileBag::is_base(hint) {
            return ILLEGAL_MOVE;
        }
        let mut bag = self.bag;
        if self.hint != 0 {
            if tile != self.hint {
                return ILLEGAL_MOVE;
            }
        } else {
            if bag.count(tile) == 0 {
                return ILLEGAL_MOVE;
            }
            bag.take(tile);
        }
        if bag.count(hint) == 0 {
            return ILLEGAL_MOVE;
        }
        bag.take(hint);

        self.set_cell(pos, tile);
        self.hint = hint;
        self.bag = bag;
        0
    }

    /// Whether sliding toward `dir` would change the board.
    #[inline]
    pub fn can_slide(&self, dir: Direction) -> bool {
        let mut probe = *self;
        probe.slide(dir) != ILLEGAL_MOVE
    }

    /// True when no direction can be slid.
    pub fn is_game_over(&self) -> bool {
        !Direction::ALL.iter().any(|&dir| self.can_slide(dir))
    }

    pub fn count_empty(&self) -> u32 {
        16 - count_non_empty(self.grid)
    }

    pub fn max_rank(&self) -> Rank {
        (0..CELLS).map(|pos| self.cell(pos)).max().unwrap_or(0)
    }

    /// Face value of the largest tile.
    pub fn highest_tile(&self) -> u32 {
        face_value(self.max_rank())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x}, last: {:?}, hint: {}, bag: {:?})", self.grid, self.last, self.hint, self.bag)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+------------------------+")?;
        for r in 0..4 {
            let row = self.row(r);
            writeln!(
                f,
                "|{:>6}{:>6}{:>6}{:>6}|",
                format_rank(row[0]),
                format_rank(row[1]),
                format_rank(row[2]),
                format_rank(row[3])
            )?;
        }
        writeln!(f, "+------------------------+")?;
        write!(f, "hint: {}", format_rank(self.hint))
    }
}

/// Face value shown to a player for `rank`.
#[inline]
pub fn face_value(rank: Rank) -> u32 {
    match rank {
        0..=2 => rank as u32,
        r => 3 << (r - 3),
    }
}

/// Rank produced by merging `a` into `b`, if they merge.
///
/// A 1 and a 2 always merge into a 3; tiles of rank 3 or more merge only with
/// an equal rank.
#[inline]
pub fn merge(a: Rank, b: Rank) -> Option<Rank> {
    match (a, b) {
        (1, 2) | (2, 1) => Some(3),
        (a, b) if a >= 3 && a == b && a < MAX_RANK => Some(a + 1),
        _ => None,
    }
}

/// Initialize the line tables. Safe to call multiple times.
pub fn new() {
    let _ = stores();
}

pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

#[inline]
pub(crate) fn extract_line(board: BoardRaw, line_idx: usize) -> Line {
    ((board >> ((3 - line_idx) * 16)) & 0xffff) as Line
}

static STORES: OnceLock<Stores> = OnceLock::new();

#[inline(always)]
fn stores() -> &'static Stores {
    STORES.get_or_init(create_stores)
}

fn create_stores() -> Stores {
    let mut slide_left = vec![0 as Line; LINE_TABLE_SIZE];
    let mut slide_right = vec![0 as Line; LINE_TABLE_SIZE];
    let mut reward_left = vec![0 as Reward; LINE_TABLE_SIZE];
    let mut reward_right = vec![0 as Reward; LINE_TABLE_SIZE];

    for val in 0..LINE_TABLE_SIZE {
        let cells = line_to_cells(val as Line);

        let (moved, reward) = slide_line_left(cells);
        slide_left[val] = cells_to_line(moved);
        reward_left[val] = reward;

        let (moved, reward) = slide_line_left(reversed(cells));
        slide_right[val] = cells_to_line(reversed(moved));
        reward_right[val] = reward;
    }

    Stores {
        slide_left: slide_left.into_boxed_slice(),
        slide_right: slide_right.into_boxed_slice(),
        reward_left: reward_left.into_boxed_slice(),
        reward_right: reward_right.into_boxed_slice(),
    }
}

fn slide_rows(grid: BoardRaw, lines: &[Line], rewards: &[Reward]) -> (BoardRaw, Reward) {
    (0..4).fold((0, 0), |(acc, reward), row| {
        let line = extract_line(grid, row) as usize;
        let moved = lines[line] as BoardRaw;
        (acc | (moved << ((3 - row) * 16)), reward + rewards[line])
    })
}

// Compact toward index 0; each tile merges at most once per slide.
fn slide_line_left(cells: [Rank; 4]) -> ([Rank; 4], Reward) {
    let mut out = [0; 4];
    let mut filled = 0;
    let mut pivot: Option<Rank> = None;
    let mut reward = 0;
    for &tile in cells.iter().filter(|&&t| t != 0) {
        match pivot {
            None => pivot = Some(tile),
            Some(p) => match merge(p, tile) {
                Some(merged) => {
                    out[filled] = merged;
                    filled += 1;
                    reward += face_value(merged) as Reward;
                    pivot = None;
                }
                None => {
                    out[filled] = p;
                    filled += 1;
                    pivot = Some(tile);
                }
            },
        }
    }
    if let Some(p) = pivot {
        out[filled] = p;
    }
    (out, reward)
}

fn line_to_cells(line: Line) -> [Rank; 4] {
    [(line >> 12) as Rank & 0xf, (line >> 8) as Rank & 0xf, (line >> 4) as Rank & 0xf, line as Rank & 0xf]
}

fn cells_to_line(cells: [Rank; 4]) -> Line {
    (cells[0] as Line) << 12 | (cells[1] as Line) << 8 | (cells[2] as Line) << 4 | cells[3] as Line
}

fn reversed(mut cells: [Rank; 4]) -> [Rank; 4] {
    cells.reverse();
    cells
}

fn count_non_empty(grid: BoardRaw) -> u32 {
    let mut g = grid;
    g |= g >> 1;
    g |= g >> 2;
    g &= 0x1111111111111111;
    g.count_ones()
}

fn format_rank(rank: Rank) -> String {
    match rank {
        0 => String::from("."),
        r => face_value(r).to_string(),
    }
}
