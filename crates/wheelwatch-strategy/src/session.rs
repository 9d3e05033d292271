use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use wheelwatch_core::{Pattern, Spin, SpinStats, SpinStream, TrackerConfig};

use crate::error::TrackerError;
use crate::export::ExportDocument;
use crate::matcher::Matcher;
use crate::record::StrategyRecord;
use crate::registry::{PriorityAlert, QuickBacktest, StrategyRegistry, StreamDelta};
use crate::traits::{SpinSource, StrategyStore};

/// A spin stream, its strategies and the store they persist to.
///
/// Every stream mutation goes through here so the registry always sees the
/// matching [`StreamDelta`]; every mutation is persisted before returning.
pub struct Session<S: StrategyStore> {
    stream: SpinStream,
    registry: StrategyRegistry,
    store: S,
}

impl<S: StrategyStore> Session<S> {
    /// Load persisted spins and strategies. Records are taken as stored.
    pub fn open(store: S, config: TrackerConfig) -> Result<Self, TrackerError> {
        let stream = SpinStream::from_newest_first(store.load_spins()?);
        let records = store.load_strategies()?;
        info!(
            "opened session with {} spins and {} strategies",
            stream.len(),
            records.len()
        );
        Ok(Self {
            stream,
            registry: StrategyRegistry::from_records(records, Matcher::from(config)),
            store,
        })
    }

    #[inline]
    pub fn stream(&self) -> &SpinStream {
        &self.stream
    }

    #[inline]
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn strategies(&self) -> &[StrategyRecord] {
        self.registry.records()
    }

    pub fn stats(&self) -> SpinStats {
        self.stream.stats()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Takes effect from the next stream change; nothing is replayed now.
    pub fn set_tracker_config(&mut self, config: TrackerConfig) {
        self.registry.set_matcher(Matcher::from(config));
    }

    pub fn record_spin(&mut self, value: i64) -> Result<Vec<PriorityAlert>, TrackerError> {
        self.record_spins(&[value])
    }

    /// Append several spins, oldest first. All values are validated before
    /// any is recorded.
    pub fn record_spins(&mut self, values: &[i64]) -> Result<Vec<PriorityAlert>, TrackerError> {
        let spins = values
            .iter()
            .map(|&v| Spin::try_from(v))
            .collect::<Result<Vec<_>, _>>()?;
        for &spin in &spins {
            self.stream.push(spin);
        }
        self.commit(StreamDelta::Appended(spins.len()))
    }

    /// Remove the newest spin.
    pub fn undo(&mut self) -> Result<Option<Spin>, TrackerError> {
        let removed = self.stream.remove_latest();
        if removed.is_some() {
            self.commit(StreamDelta::Removed(1))?;
        }
        Ok(removed)
    }

    pub fn clear_spins(&mut self) -> Result<(), TrackerError> {
        if self.stream.is_empty() {
            return Ok(());
        }
        self.stream.clear();
        info!("spin stream cleared");
        self.commit(StreamDelta::Cleared)?;
        Ok(())
    }

    /// Replace the stream with `values` (newest first). Returns how many
    /// out-of-range values were dropped.
    pub fn replace_spins(&mut self, values: &[i64]) -> Result<usize, TrackerError> {
        let dropped = self.stream.replace(values);
        if dropped > 0 {
            warn!("dropped {dropped} out-of-range spin values");
        }
        self.commit(StreamDelta::Replaced)?;
        Ok(dropped)
    }

    pub fn add_strategy(
        &mut self,
        name: Option<&str>,
        pattern: Pattern,
    ) -> Result<StrategyRecord, TrackerError> {
        let record = self.registry.add(
            Uuid::new_v4().to_string(),
            name,
            pattern,
            Utc::now().timestamp_millis(),
            &self.stream,
        );
        self.persist_strategies()?;
        Ok(record)
    }

    pub fn update_strategy(
        &mut self,
        id: &str,
        name: Option<&str>,
        pattern: Option<Pattern>,
    ) -> Result<StrategyRecord, TrackerError> {
        let record = self.registry.update(id, name, pattern, &self.stream)?;
        self.persist_strategies()?;
        Ok(record)
    }

    pub fn remove_strategy(&mut self, id: &str) -> Result<StrategyRecord, TrackerError> {
        let removed = self.registry.remove(id)?;
        self.persist_strategies()?;
        Ok(removed)
    }

    pub fn toggle_strategy(&mut self, id: &str) -> Result<bool, TrackerError> {
        let active = self.registry.toggle_active(id)?;
        self.persist_strategies()?;
        Ok(active)
    }

    pub fn toggle_alert(&mut self, id: &str) -> Result<bool, TrackerError> {
        let enabled = self.registry.toggle_alert(id)?;
        self.persist_strategies()?;
        Ok(enabled)
    }

    pub fn reset_strategy(&mut self, id: &str) -> Result<(), TrackerError> {
        self.registry.reset_stats(id)?;
        self.persist_strategies()
    }

    pub fn clear_strategies(&mut self) -> Result<(), TrackerError> {
        self.registry.clear();
        self.persist_strategies()
    }

    pub fn find_strategy(&self, key: &str) -> Option<&StrategyRecord> {
        self.registry.find(key)
    }

    pub fn backtest(&self, pattern: &Pattern) -> QuickBacktest {
        self.registry.backtest(pattern, &self.stream)
    }

    pub fn export(&self) -> ExportDocument {
        ExportDocument::new(
            self.stream
                .iter_newest_first()
                .map(|s| i64::from(s.value()))
                .collect(),
            self.registry.records().to_vec(),
        )
    }

    /// Replace spins and strategies from an export. A rejected document
    /// leaves the session untouched.
    pub fn import(&mut self, json: &str) -> Result<(), TrackerError> {
        let doc = ExportDocument::parse(json)?;
        let dropped = self.stream.replace(&doc.results);
        if dropped > 0 {
            warn!("import dropped {dropped} out-of-range spin values");
        }
        self.registry.load(doc.strategies, &self.stream);
        info!(
            "imported {} spins and {} strategies",
            self.stream.len(),
            self.registry.len()
        );
        self.persist_spins()?;
        self.persist_strategies()
    }

    fn commit(&mut self, delta: StreamDelta) -> Result<Vec<PriorityAlert>, TrackerError> {
        let alerts = self.registry.apply(delta, &self.stream);
        self.persist_spins()?;
        self.persist_strategies()?;
        Ok(alerts)
    }

    fn persist_spins(&mut self) -> Result<(), TrackerError> {
        self.store.save_spins(&self.stream.to_newest_first())?;
        Ok(())
    }

    fn persist_strategies(&mut self) -> Result<(), TrackerError> {
        self.store.save_strategies(self.registry.records())?;
        Ok(())
    }
}
