use wheelwatch_core::{Spin, SpinError, SpinStream};

use crate::record::StrategyRecord;
use crate::store::StoreError;

/// Read/write access to the recorded spins.
///
/// The registry only needs the read half; the session drives the writes and
/// reports each one as a [`crate::StreamDelta`].
pub trait SpinSource {
    fn spin_count(&self) -> usize;

    /// Whole history, oldest first (spin index 1 first).
    fn oldest_first(&self) -> Vec<Spin>;

    /// The `k` newest spins, oldest of them first.
    fn newest(&self, k: usize) -> Vec<Spin>;

    fn append(&mut self, value: i64) -> Result<Spin, SpinError>;

    fn remove_latest(&mut self) -> Option<Spin>;

    /// Replace everything; `values` are newest first. Returns the number of
    /// values dropped as out of range.
    fn replace(&mut self, values: &[i64]) -> usize;

    fn clear(&mut self);
}

impl SpinSource for SpinStream {
    fn spin_count(&self) -> usize {
        self.len()
    }

    fn oldest_first(&self) -> Vec<Spin> {
        self.to_oldest_first()
    }

    fn newest(&self, k: usize) -> Vec<Spin> {
        self.newest_chronological(k)
    }

    fn append(&mut self, value: i64) -> Result<Spin, SpinError> {
        SpinStream::append(self, value)
    }

    fn remove_latest(&mut self) -> Option<Spin> {
        self.remove_front()
    }

    fn replace(&mut self, values: &[i64]) -> usize {
        self.replace_all(values)
    }

    fn clear(&mut self) {
        SpinStream::clear(self)
    }
}

/// Durable storage for spins and strategy records.
///
/// Unreadable or corrupt data loads as empty and is logged, never returned
/// as an error; only real I/O failures are.
pub trait StrategyStore {
    fn load_strategies(&self) -> Result<Vec<StrategyRecord>, StoreError>;

    fn save_strategies(&mut self, records: &[StrategyRecord]) -> Result<(), StoreError>;

    /// Spins newest first.
    fn load_spins(&self) -> Result<Vec<Spin>, StoreError>;

    fn save_spins(&mut self, newest_first: &[Spin]) -> Result<(), StoreError>;
}
