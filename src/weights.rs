//! Weight tables for the n-tuple network and their binary file format.
//!
//! Binary layout (host-native byte order):
//! - table count: u32
//! - for each table, in declaration order:
//!   element count: u64
//!   elements: that many f32 values
//!
//! Table sizes are fixed when the store is created and never change.

use std::fs;
use std::io;
use std::mem::size_of;
use std::path::Path;

use serde::Serialize;

/// Numeric type held in every table.
pub type Weight = f32;

#[derive(thiserror::Error, Debug)]
pub enum WeightError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed weight file: {0}")]
    Malformed(&'static str),
    #[error("table size {0} is not a non-zero power of two")]
    InvalidSize(usize),
    #[error("weight tables do not match: expected {expected:?}, found {found:?}")]
    Shape { expected: Vec<usize>, found: Vec<usize> },
}

/// One slot of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub table: usize,
    pub slot: usize,
}

/// Summary numbers for one table, as printed by the `weights` tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableSummary {
    pub size: usize,
    pub nonzero: usize,
    pub min: Weight,
    pub max: Weight,
    pub mean: f64,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct WeightStore {
    tables: Vec<Box<[Weight]>>,
}

impl WeightStore {
    /// Zero-filled tables of the given sizes.
    pub fn with_sizes(sizes: &[usize]) -> Result<Self, WeightError> {
        let tables = sizes
            .iter()
            .map(|&size| {
                check_size(size)?;
                Ok(vec![0.0; size].into_boxed_slice())
            })
            .collect::<Result<Vec<_>, WeightError>>()?;
        Ok(Self { tables })
    }

    #[inline]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.tables.iter().map(|t| t.len()).collect()
    }

    #[inline]
    pub fn table(&self, idx: usize) -> &[Weight] {
        &self.tables[idx]
    }

    #[inline]
    pub fn table_mut(&mut self, idx: usize) -> &mut [Weight] {
        &mut self.tables[idx]
    }

    /// Weight at `addr`. Out-of-range addresses are a bug and panic.
    #[inline]
    pub fn get(&self, addr: Address) -> Weight {
        self.tables[addr.table][addr.slot]
    }

    #[inline]
    pub fn add(&mut self, addr: Address, delta: Weight) {
        self.tables[addr.table][addr.slot] += delta;
    }

    /// Sum of the weights at `addrs`; an address listed twice counts twice.
    #[inline]
    pub fn value(&self, addrs: &[Address]) -> Weight {
        addrs.iter().map(|&a| self.get(a)).sum()
    }

    pub fn summary(&self, idx: usize) -> TableSummary {
        let table = self.table(idx);
        let (min, max, sum, nonzero) = table.iter().fold(
            (Weight::INFINITY, Weight::NEG_INFINITY, 0f64, 0usize),
            |(min, max, sum, nonzero), &w| (min.min(w), max.max(w), sum + w as f64, nonzero + (w != 0.0) as usize),
        );
        TableSummary { size: table.len(), nonzero, min, max, mean: sum / table.len().max(1) as f64 }
    }

    /// Serialize into the on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload: usize = self.tables.iter().map(|t| 8 + t.len() * size_of::<Weight>()).sum();
        let mut buf = Vec::with_capacity(4 + payload);
        buf.extend_from_slice(&(self.tables.len() as u32).to_ne_bytes());
        for table in &self.tables {
            buf.extend_from_slice(&(table.len() as u64).to_ne_bytes());
            buf.extend_from_slice(bytemuck::cast_slice(&table[..]));
        }
        buf
    }

    /// Parse the on-disk layout, rejecting truncated or oversized input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WeightError> {
        let count = read_u32_ne(bytes).ok_or(WeightError::Malformed("missing table count"))? as usize;
        let mut off = 4;
        let mut tables = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let len = read_u64_ne(&bytes[off..]).ok_or(WeightError::Malformed("missing table length"))?;
            off += 8;
            let len = usize::try_from(len).map_err(|_| WeightError::Malformed("table length overflow"))?;
            check_size(len)?;
            let end = len
                .checked_mul(size_of::<Weight>())
                .and_then(|n| off.checked_add(n))
                .ok_or(WeightError::Malformed("table length overflow"))?;
            if end > bytes.len() {
                return Err(WeightError::Malformed("truncated table"));
            }
            let values: Vec<Weight> = bytemuck::pod_collect_to_vec(&bytes[off..end]);
            tables.push(values.into_boxed_slice());
            off = end;
        }
        if off != bytes.len() {
            return Err(WeightError::Malformed("trailing bytes after last table"));
        }
        Ok(Self { tables })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), WeightError> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes())?;
        log::debug!("saved {} weight tables to {}", self.tables.len(), path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WeightError> {
        let path = path.as_ref();
        let store = Self::from_bytes(&fs::read(path)?)?;
        log::debug!("loaded weight tables {:?} from {}", store.sizes(), path.display());
        Ok(store)
    }
}

fn check_size(size: usize) -> Result<(), WeightError> {
    if size.is_power_of_two() {
        Ok(())
    } else {
        Err(WeightError::InvalidSize(size))
    }
}

#[inline]
fn read_u32_ne(bytes: &[u8]) -> Option<u32> {
    Some(u32::from_ne_bytes(bytes.get(..4)?.try_into().ok()?))
}

#[inline]
fn read_u64_ne(bytes: &[u8]) -> Option<u64> {
    Some(u64::from_ne_bytes(bytes.get(..8)?.try_into().ok()?))
}
