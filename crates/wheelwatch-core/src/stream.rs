use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::spin::{Color, Parity, Spin, SpinError};

/// Ordered record of outcomes, newest first.
///
/// The length is the only notion of "total spins"; every derived count is
/// recomputed from the contents on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpinStream {
    spins: VecDeque<Spin>,
}

/// Aggregate counts over the current stream contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinStats {
    pub total_spins: usize,
    pub red_count: usize,
    pub black_count: usize,
    pub green_count: usize,
    pub even_count: usize,
    pub odd_count: usize,
    pub last_number: Option<Spin>,
}

impl SpinStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from spins already ordered newest first.
    pub fn from_newest_first(spins: impl IntoIterator<Item = Spin>) -> Self {
        Self {
            spins: spins.into_iter().collect(),
        }
    }

    /// Build from spins ordered oldest first (log order).
    pub fn from_oldest_first(spins: impl IntoIterator<Item = Spin>) -> Self {
        let mut stream = Self::new();
        for spin in spins {
            stream.push(spin);
        }
        stream
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.spins.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spins.is_empty()
    }

    /// Validate a raw value and record it as the newest spin.
    pub fn append(&mut self, value: i64) -> Result<Spin, SpinError> {
        let spin = Spin::try_from(value)?;
        self.push(spin);
        Ok(spin)
    }

    /// Record an already-validated spin as the newest.
    #[inline]
    pub fn push(&mut self, spin: Spin) {
        self.spins.push_front(spin);
    }

    /// Drop the newest spin.
    pub fn remove_front(&mut self) -> Option<Spin> {
        self.spins.pop_front()
    }

    /// Replace the whole stream, silently dropping out-of-range values.
    ///
    /// `values` are newest first. Returns how many values were discarded.
    pub fn replace_all(&mut self, values: &[i64]) -> usize {
        self.spins = values
            .iter()
            .filter_map(|&v| Spin::try_from(v).ok())
            .collect();
        values.len() - self.spins.len()
    }

    pub fn clear(&mut self) {
        self.spins.clear();
    }

    #[inline]
    pub fn latest(&self) -> Option<Spin> {
        self.spins.front().copied()
    }

    pub fn iter_newest_first(&self) -> impl DoubleEndedIterator<Item = Spin> + ExactSizeIterator + '_ {
        self.spins.iter().copied()
    }

    pub fn iter_oldest_first(&self) -> impl DoubleEndedIterator<Item = Spin> + ExactSizeIterator + '_ {
        self.spins.iter().rev().copied()
    }

    pub fn to_newest_first(&self) -> Vec<Spin> {
        self.spins.iter().copied().collect()
    }

    pub fn to_oldest_first(&self) -> Vec<Spin> {
        self.iter_oldest_first().collect()
    }

    /// The `k` newest spins in chronological order, oldest of them first.
    pub fn newest_chronological(&self, k: usize) -> Vec<Spin> {
        let k = k.min(self.len());
        self.spins.iter().take(k).rev().copied().collect()
    }

    pub fn stats(&self) -> SpinStats {
        let mut stats = SpinStats {
            total_spins: self.len(),
            last_number: self.latest(),
            ..SpinStats::default()
        };
        for spin in &self.spins {
            match spin.color() {
                Color::Red => stats.red_count += 1,
                Color::Black => stats.black_count += 1,
                Color::Green => stats.green_count += 1,
            }
            match spin.parity() {
                Some(Parity::Even) => stats.even_count += 1,
                Some(Parity::Odd) => stats.odd_count += 1,
                None => {}
            }
        }
        stats
    }

    /// Load a spin log using memory-mapped I/O.
    ///
    /// One spin per line, oldest first. A non-numeric first line is treated
    /// as a header. `00` is accepted for the double-zero pocket.
    pub fn from_csv(path: &Path) -> Result<Self, SpinLogError> {
        let file = std::fs::File::open(path).map_err(|e| SpinLogError::Io(e.to_string()))?;
        let mmap =
            unsafe { memmap2::Mmap::map(&file) }.map_err(|e| SpinLogError::Io(e.to_string()))?;
        let stream = Self::parse_csv_bytes(&mmap[..])?;
        log::debug!("loaded {} spins from {}", stream.len(), path.display());
        Ok(stream)
    }

    /// Parse a spin log from raw bytes (testable without files).
    pub fn parse_csv_bytes(data: &[u8]) -> Result<Self, SpinLogError> {
        let mut stream = Self::new();
        let len = data.len();
        let mut pos = 0;
        let mut line_no = 0;

        while pos < len {
            let line_end = memchr::memchr(b'\n', &data[pos..])
                .map(|i| pos + i)
                .unwrap_or(len);
            line_no += 1;

            let line = &data[pos..line_end];
            let line = if line.last() == Some(&b'\r') {
                &line[..line.len() - 1]
            } else {
                line
            };
            // Only the first column matters; extra columns are ignored.
            let field = match memchr::memchr(b',', line) {
                Some(i) => &line[..i],
                None => line,
            };
            let text = std::str::from_utf8(field)
                .map_err(|e| SpinLogError::Parse {
                    line: line_no,
                    reason: e.to_string(),
                })?
                .trim();

            if !text.is_empty() {
                let is_header = line_no == 1 && !text.bytes().any(|b| b.is_ascii_digit());
                if !is_header {
                    let spin: Spin = text.parse().map_err(|e: SpinError| SpinLogError::Parse {
                        line: line_no,
                        reason: e.to_string(),
                    })?;
                    stream.push(spin);
                }
            }

            pos = line_end + 1;
        }

        Ok(stream)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpinLogError {
    #[error("spin log I/O error: {0}")]
    Io(String),
    #[error("spin log parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },
}
