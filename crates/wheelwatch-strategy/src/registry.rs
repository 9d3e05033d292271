use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use wheelwatch_core::{Pattern, Spin};

use crate::error::TrackerError;
use crate::matcher::Matcher;
use crate::record::{StrategyId, StrategyRecord, TrackState};
use crate::traits::SpinSource;

/// What changed in the spin stream since the registry last looked at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDelta {
    /// `k` spins were appended at the newest end.
    Appended(usize),
    /// `n` spins were removed from the newest end.
    Removed(usize),
    /// The stream was emptied.
    Cleared,
    /// The stream was swapped for different contents.
    Replaced,
}

/// Emitted when a strategy with alerts enabled becomes a priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityAlert {
    pub strategy_id: StrategyId,
    pub name: String,
    pub loss_streak: u32,
}

/// Result of replaying a pattern over the current history without saving it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickBacktest {
    pub hits: u32,
    pub losses: u32,
    pub hit_rate: Option<f64>,
    pub longest_loss_streak: u32,
}

/// Owns every strategy record and is the only writer of their performance.
///
/// Records are kept sorted: priorities first, then newest `created_at`.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    records: Vec<StrategyRecord>,
    matcher: Matcher,
}

impl StrategyRegistry {
    pub fn new(matcher: Matcher) -> Self {
        Self {
            records: Vec::new(),
            matcher,
        }
    }

    /// Adopt previously persisted records as they are, without replaying.
    pub fn from_records(records: Vec<StrategyRecord>, matcher: Matcher) -> Self {
        let mut registry = Self { records, matcher };
        registry.sort();
        registry
    }

    #[inline]
    pub fn records(&self) -> &[StrategyRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn matcher(&self) -> Matcher {
        self.matcher
    }

    /// New settings apply from the next stream change on; existing state is
    /// not replayed.
    pub fn set_matcher(&mut self, matcher: Matcher) {
        self.matcher = matcher;
    }

    pub fn get(&self, id: &str) -> Option<&StrategyRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Look up by exact id, then by case-insensitive name, then by id prefix
    /// when that prefix is unambiguous.
    pub fn find(&self, key: &str) -> Option<&StrategyRecord> {
        if let Some(r) = self.get(key) {
            return Some(r);
        }
        if let Some(r) = self
            .records
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(key))
        {
            return Some(r);
        }
        let mut prefixed = self.records.iter().filter(|r| r.id.starts_with(key));
        match (prefixed.next(), prefixed.next()) {
            (Some(r), None) if !key.is_empty() => Some(r),
            _ => None,
        }
    }

    pub fn priorities(&self) -> impl Iterator<Item = &StrategyRecord> {
        self.records.iter().filter(|r| r.state.is_priority)
    }

    /// React to a stream change. Returns alerts for strategies that became
    /// a priority during this change and have alerts enabled.
    pub fn apply<S: SpinSource + ?Sized>(
        &mut self,
        delta: StreamDelta,
        source: &S,
    ) -> Vec<PriorityAlert> {
        debug!("applying {delta:?} to {} strategies", self.records.len());
        let alerts = match delta {
            StreamDelta::Appended(0) => Vec::new(),
            StreamDelta::Appended(k) => self.advance_all(source, k),
            StreamDelta::Removed(_) | StreamDelta::Replaced => {
                self.recompute_all(&source.oldest_first());
                Vec::new()
            }
            StreamDelta::Cleared => {
                self.reset_all();
                Vec::new()
            }
        };
        self.sort();
        alerts
    }

    fn advance_all<S: SpinSource + ?Sized>(&mut self, source: &S, k: usize) -> Vec<PriorityAlert> {
        let fresh = source.newest(k);
        let first_index = (source.spin_count() - fresh.len()) as u32 + 1;
        let matcher = self.matcher;
        let mut alerts = Vec::new();

        for record in self.records.iter_mut().filter(|r| r.active) {
            for (offset, &spin) in fresh.iter().enumerate() {
                let state = std::mem::take(&mut record.state);
                let adv = matcher.advance(&record.pattern, state, spin, first_index + offset as u32);
                record.state = adv.state;
                if adv.newly_priority && record.alert_on_priority {
                    let loss_streak = record.state.loss_run();
                    warn!(
                        "strategy '{}' is now a priority after {} losses",
                        record.name, loss_streak
                    );
                    alerts.push(PriorityAlert {
                        strategy_id: record.id.clone(),
                        name: record.name.clone(),
                        loss_streak,
                    });
                }
            }
        }
        alerts
    }

    /// Replay every active strategy from scratch; inactive ones go back to
    /// the empty baseline.
    pub fn recompute_all(&mut self, oldest_first: &[Spin]) {
        let matcher = self.matcher;
        self.records.par_iter_mut().for_each(|record| {
            record.state = if record.active {
                matcher.recompute(&record.pattern, oldest_first)
            } else {
                TrackState::default()
            };
        });
        debug!(
            "recomputed {} strategies over {} spins",
            self.records.len(),
            oldest_first.len()
        );
    }

    fn reset_all(&mut self) {
        for record in &mut self.records {
            record.reset_performance();
        }
    }

    /// Register a new strategy, replayed over the current history. An
    /// unnamed strategy is named after its pattern.
    pub fn add<S: SpinSource + ?Sized>(
        &mut self,
        id: StrategyId,
        name: Option<&str>,
        pattern: Pattern,
        created_at: i64,
        source: &S,
    ) -> StrategyRecord {
        let name = resolve_name(name, &pattern);
        let mut record = StrategyRecord::new(id, name, pattern, created_at);
        record.state = self.matcher.recompute(&record.pattern, &source.oldest_first());
        info!("added strategy '{}' ({})", record.name, record.id);

        self.records.push(record.clone());
        self.sort();
        record
    }

    /// Change name and/or pattern. A new pattern replays the history, or
    /// resets a paused strategy to the empty baseline.
    pub fn update<S: SpinSource + ?Sized>(
        &mut self,
        id: &str,
        name: Option<&str>,
        pattern: Option<Pattern>,
        source: &S,
    ) -> Result<StrategyRecord, TrackerError> {
        let matcher = self.matcher;
        let record = self.get_mut(id)?;
        if let Some(pattern) = pattern {
            record.pattern = pattern;
            record.state = if record.active {
                matcher.recompute(&record.pattern, &source.oldest_first())
            } else {
                TrackState::default()
            };
        }
        if let Some(name) = name {
            record.name = resolve_name(Some(name), &record.pattern);
        }
        let updated = record.clone();
        self.sort();
        Ok(updated)
    }

    pub fn remove(&mut self, id: &str) -> Result<StrategyRecord, TrackerError> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| TrackerError::UnknownStrategy(id.to_string()))?;
        let removed = self.records.remove(idx);
        info!("removed strategy '{}' ({})", removed.name, removed.id);
        Ok(removed)
    }

    /// Flip the active flag; the performance is left untouched. Returns the
    /// new flag.
    pub fn toggle_active(&mut self, id: &str) -> Result<bool, TrackerError> {
        let record = self.get_mut(id)?;
        record.active = !record.active;
        Ok(record.active)
    }

    pub fn toggle_alert(&mut self, id: &str) -> Result<bool, TrackerError> {
        let record = self.get_mut(id)?;
        record.alert_on_priority = !record.alert_on_priority;
        Ok(record.alert_on_priority)
    }

    pub fn reset_stats(&mut self, id: &str) -> Result<(), TrackerError> {
        self.get_mut(id)?.reset_performance();
        self.sort();
        Ok(())
    }

    /// Drop every strategy.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Swap in a new set of records and replay them over the history.
    pub fn load<S: SpinSource + ?Sized>(&mut self, records: Vec<StrategyRecord>, source: &S) {
        self.records = records;
        self.recompute_all(&source.oldest_first());
        self.sort();
    }

    /// Score a pattern against the current history without registering it.
    pub fn backtest<S: SpinSource + ?Sized>(&self, pattern: &Pattern, source: &S) -> QuickBacktest {
        let state = self.matcher.recompute(pattern, &source.oldest_first());
        QuickBacktest {
            hits: state.hits,
            losses: state.losses,
            hit_rate: state.hit_rate(),
            longest_loss_streak: state.longest_loss_streak,
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut StrategyRecord, TrackerError> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| TrackerError::UnknownStrategy(id.to_string()))
    }

    fn sort(&mut self) {
        self.records.sort_by(|a, b| {
            b.state
                .is_priority
                .cmp(&a.state.is_priority)
                .then(b.created_at.cmp(&a.created_at))
        });
    }
}

fn resolve_name(name: Option<&str>, pattern: &Pattern) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => pattern.label(),
    }
}
