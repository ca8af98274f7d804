//! N-tuple feature extraction.
//!
//! A pattern is an ordered list of board cells. Reading the ranks of those
//! cells and packing them four bits apiece, first cell in the most
//! significant position, gives a slot in a weight table. Pattern `i` reads
//! table `i % table_count`, so patterns can deliberately share (tie) a table.

use crate::engine::{Board, CELLS};
use crate::weights::{Address, Weight, WeightStore};

/// Longest pattern whose packed index fits in 32 bits.
pub const MAX_PATTERN_LEN: usize = 8;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("a pattern needs 1..={MAX_PATTERN_LEN} cells, got {0}")]
    Length(usize),
    #[error("cell {0} is outside the board")]
    Cell(usize),
    #[error("no patterns configured")]
    NoPatterns,
    #[error("no weight tables to index")]
    NoTables,
    #[error("pattern {pattern} needs {needed} slots but table {table} holds {size}")]
    TableTooSmall { pattern: usize, table: usize, needed: usize, size: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    cells: Box<[usize]>,
}

impl Pattern {
    pub fn new(cells: &[usize]) -> Result<Self, PatternError> {
        if cells.is_empty() || cells.len() > MAX_PATTERN_LEN {
            return Err(PatternError::Length(cells.len()));
        }
        if let Some(&bad) = cells.iter().find(|&&c| c >= CELLS) {
            return Err(PatternError::Cell(bad));
        }
        Ok(Self { cells: cells.into() })
    }

    #[inline]
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Number of distinct indices this pattern can produce.
    #[inline]
    pub fn slots(&self) -> usize {
        1 << (4 * self.cells.len())
    }

    /// Packed index of `board` under this pattern.
    #[inline]
    pub fn index(&self, board: &Board) -> usize {
        self.cells.iter().fold(0, |idx, &pos| (idx << 4) | board.cell(pos) as usize)
    }
}

/// Patterns bound to the tables of one weight store.
#[derive(Clone, Debug)]
pub struct FeatureExtractor {
    patterns: Vec<Pattern>,
    table_count: usize,
}

impl FeatureExtractor {
    /// Bind `patterns` to `store`, checking every pattern's index range fits
    /// the table it maps to.
    pub fn for_store(patterns: Vec<Pattern>, store: &WeightStore) -> Result<Self, PatternError> {
        if patterns.is_empty() {
            return Err(PatternError::NoPatterns);
        }
        if store.table_count() == 0 {
            return Err(PatternError::NoTables);
        }
        let extractor = Self { patterns, table_count: store.table_count() };
        for (i, pattern) in extractor.patterns.iter().enumerate() {
            let table = extractor.table_for(i);
            let size = store.table(table).len();
            if pattern.slots() > size {
                return Err(PatternError::TableTooSmall { pattern: i, table, needed: pattern.slots(), size });
            }
        }
        Ok(extractor)
    }

    /// The four rows and four columns, interleaved so that with two tables
    /// rows share table 0 and columns share table 1.
    pub fn rows_and_columns() -> Vec<Pattern> {
        (0..4)
            .flat_map(|i| {
                let row = Pattern { cells: (0..4).map(|c| i * 4 + c).collect() };
                let col = Pattern { cells: (0..4).map(|r| r * 4 + i).collect() };
                [row, col]
            })
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Table read by pattern `pattern_idx`.
    #[inline]
    pub fn table_for(&self, pattern_idx: usize) -> usize {
        pattern_idx % self.table_count
    }

    /// One address per pattern, in pattern order.
    pub fn addresses<'a>(&'a self, board: &'a Board) -> impl Iterator<Item = Address> + 'a {
        self.patterns
            .iter()
            .enumerate()
            .map(move |(i, p)| Address { table: self.table_for(i), slot: p.index(board) })
    }

    /// Sum of the weights `board` addresses.
    #[inline]
    pub fn value(&self, board: &Board, store: &WeightStore) -> Weight {
        self.addresses(board).map(|a| store.get(a)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_board() -> Board {
        Board::from_raw(0x0123_4567_89ab_cdef)
    }

    #[test]
    fn it_packs_most_significant_first() {
        let b = counting_board();
        assert_eq!(Pattern::new(&[0, 1, 2, 3]).unwrap().index(&b), 0x0123);
        assert_eq!(Pattern::new(&[3, 2, 1, 0]).unwrap().index(&b), 0x3210);
        assert_eq!(Pattern::new(&[15, 0]).unwrap().index(&b), 0xf0);
        assert_eq!(Pattern::new(&[0, 4, 8, 12, 1, 5]).unwrap().index(&b), 0x048c15);
    }

    #[test]
    fn it_validates_patterns() {
        assert_eq!(Pattern::new(&[]), Err(PatternError::Length(0)));
        assert_eq!(Pattern::new(&[0; 9]), Err(PatternError::Length(9)));
        assert_eq!(Pattern::new(&[0, 16]), Err(PatternError::Cell(16)));
        assert_eq!(Pattern::new(&[0, 1]).unwrap().slots(), 256);
    }

    #[test]
    fn it_ties_patterns_to_tables_by_index() {
        let store = WeightStore::with_sizes(&[65536, 65536]).unwrap();
        let fx = FeatureExtractor::for_store(FeatureExtractor::rows_and_columns(), &store).unwrap();
        assert_eq!(fx.len(), 8);
        assert_eq!(fx.patterns()[2].cells(), &[4, 5, 6, 7]);
        assert_eq!(fx.patterns()[3].cells(), &[1, 5, 9, 13]);
        let b = counting_board();
        let addrs: Vec<_> = fx.addresses(&b).collect();
        // rows on table 0, columns on table 1
        assert_eq!(addrs[0], Address { table: 0, slot: 0x0123 });
        assert_eq!(addrs[1], Address { table: 1, slot: 0x048c });
        assert_eq!(addrs[6], Address { table: 0, slot: 0xcdef });
        assert_eq!(addrs[7], Address { table: 1, slot: 0x37bf });
    }

    #[test]
    fn tied_patterns_share_weights() {
        let mut store = WeightStore::with_sizes(&[65536]).unwrap();
        let patterns = vec![Pattern::new(&[0, 1, 2, 3]).unwrap(), Pattern::new(&[4, 5, 6, 7]).unwrap()];
        let fx = FeatureExtractor::for_store(patterns, &store).unwrap();
        let b = Board::from_raw(0x1230_1230_0000_0000);
        store.table_mut(0)[0x1230] = 2.5;
        // Both rows read the same slot of the single table.
        assert_eq!(fx.value(&b, &store), 5.0);
    }

    #[test]
    fn it_rejects_tables_too_small() {
        let store = WeightStore::with_sizes(&[65536, 256]).unwrap();
        let err = FeatureExtractor::for_store(FeatureExtractor::rows_and_columns(), &store).unwrap_err();
        assert_eq!(err, PatternError::TableTooSmall { pattern: 1, table: 1, needed: 65536, size: 256 });

        let empty = WeightStore::default();
        let err = FeatureExtractor::for_store(FeatureExtractor::rows_and_columns(), &empty).unwrap_err();
        assert_eq!(err, PatternError::NoTables);
    }
}
