use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use wheelwatch_core::Spin;

use crate::record::StrategyRecord;
use crate::traits::StrategyStore;

pub const SPINS_FILE: &str = "spins.json";
pub const STRATEGIES_FILE: &str = "strategies.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(String),
    #[error("storage serialization error: {0}")]
    Serialize(String),
}

/// Decode a stored blob, discarding it with a warning if it does not parse.
fn decode_or_discard<T: DeserializeOwned>(what: &str, bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("discarding corrupt stored {what}: {e}");
            None
        }
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialize(e.to_string()))
}

/// One JSON document per collection inside a data directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(file);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", path.display()))),
        };
        Ok(decode_or_discard(file, &bytes))
    }

    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::Io(format!("{}: {e}", self.dir.display())))?;
        let path = self.dir.join(file);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, encode(value)?)
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

impl StrategyStore for JsonFileStore {
    fn load_strategies(&self) -> Result<Vec<StrategyRecord>, StoreError> {
        Ok(self.read(STRATEGIES_FILE)?.unwrap_or_default())
    }

    fn save_strategies(&mut self, records: &[StrategyRecord]) -> Result<(), StoreError> {
        self.write(STRATEGIES_FILE, records)
    }

    fn load_spins(&self) -> Result<Vec<Spin>, StoreError> {
        Ok(self.read(SPINS_FILE)?.unwrap_or_default())
    }

    fn save_spins(&mut self, newest_first: &[Spin]) -> Result<(), StoreError> {
        self.write(SPINS_FILE, newest_first)
    }
}

/// In-process store holding the serialized documents, for tests and
/// throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    spins: Option<Vec<u8>>,
    strategies: Option<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with raw documents, which need not be valid.
    pub fn with_raw(spins: Option<&str>, strategies: Option<&str>) -> Self {
        Self {
            spins: spins.map(|s| s.as_bytes().to_vec()),
            strategies: strategies.map(|s| s.as_bytes().to_vec()),
        }
    }
}

impl StrategyStore for MemoryStore {
    fn load_strategies(&self) -> Result<Vec<StrategyRecord>, StoreError> {
        Ok(self
            .strategies
            .as_deref()
            .and_then(|b| decode_or_discard(STRATEGIES_FILE, b))
            .unwrap_or_default())
    }

    fn save_strategies(&mut self, records: &[StrategyRecord]) -> Result<(), StoreError> {
        self.strategies = Some(encode(records)?);
        Ok(())
    }

    fn load_spins(&self) -> Result<Vec<Spin>, StoreError> {
        Ok(self
            .spins
            .as_deref()
            .and_then(|b| decode_or_discard(SPINS_FILE, b))
            .unwrap_or_default())
    }

    fn save_spins(&mut self, newest_first: &[Spin]) -> Result<(), StoreError> {
        self.spins = Some(encode(newest_first)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheelwatch_core::{Color, Pattern, Step};

    fn record(id: &str) -> StrategyRecord {
        StrategyRecord::new(
            id.into(),
            "Red".into(),
            Pattern::single(Step::Color(Color::Red)).unwrap(),
            1,
        )
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("data"));
        assert!(store.load_spins().unwrap().is_empty());
        assert!(store.load_strategies().unwrap().is_empty());

        let spins = vec![Spin::new(3).unwrap(), Spin::DOUBLE_ZERO];
        store.save_spins(&spins).unwrap();
        store.save_strategies(&[record("a"), record("b")]).unwrap();

        let reopened = JsonFileStore::new(dir.path().join("data"));
        assert_eq!(reopened.load_spins().unwrap(), spins);
        assert_eq!(reopened.load_strategies().unwrap().len(), 2);
        assert!(!dir.path().join("data").join("spins.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SPINS_FILE), "[1, 2, 99]").unwrap();
        std::fs::write(dir.path().join(STRATEGIES_FILE), "{not json").unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load_spins().unwrap().is_empty());
        assert!(store.load_strategies().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_corrupt_and_valid() {
        let store = MemoryStore::with_raw(Some("[5, 6]"), Some("[{\"id\": 1}]"));
        assert_eq!(store.load_spins().unwrap().len(), 2);
        assert!(store.load_strategies().unwrap().is_empty());

        let mut store = MemoryStore::new();
        store.save_strategies(&[record("x")]).unwrap();
        assert_eq!(store.load_strategies().unwrap()[0].id, "x");
    }
}
