use serde::{Deserialize, Serialize};

use wheelwatch_core::Pattern;

/// Most recent outcomes kept per strategy.
pub const HISTORY_LIMIT: usize = 50;

pub type StrategyId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Hit,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 1-based chronological index of the spin that produced the outcome.
    pub spin: u32,
    pub result: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCheck {
    pub check_at_spin: u32,
}

/// Performance fields of a strategy. Only the matching engine writes these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackState {
    pub hits: u32,
    pub losses: u32,
    /// >0 consecutive aggregate hits, <0 consecutive misses.
    pub current_streak: i32,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,
    /// Newest first, at most [`HISTORY_LIMIT`] entries.
    pub history: Vec<HistoryEntry>,
    /// Consecutive step hits within the pattern; phase for target numbers.
    #[serde(rename = "currentConsecutiveHits")]
    pub cursor: u32,
    pub is_priority: bool,
    pub pending_check: Option<PendingCheck>,
}

impl TrackState {
    pub(crate) fn record(&mut self, spin: u32, result: Outcome) {
        self.history.insert(0, HistoryEntry { spin, result });
        self.history.truncate(HISTORY_LIMIT);
    }

    pub(crate) fn extend_win_streak(&mut self) {
        self.current_streak = if self.current_streak > 0 {
            self.current_streak + 1
        } else {
            1
        };
        self.longest_win_streak = self.longest_win_streak.max(self.current_streak as u32);
    }

    pub(crate) fn extend_loss_streak(&mut self, priority_threshold: u32) {
        self.current_streak = if self.current_streak < 0 {
            self.current_streak - 1
        } else {
            -1
        };
        let run = self.current_streak.unsigned_abs();
        self.longest_loss_streak = self.longest_loss_streak.max(run);
        if run >= priority_threshold {
            self.is_priority = true;
        }
    }

    /// Current loss run, 0 while winning.
    pub fn loss_run(&self) -> u32 {
        if self.current_streak < 0 {
            self.current_streak.unsigned_abs()
        } else {
            0
        }
    }

    /// `hits / (hits + losses)`, `None` before the first outcome.
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.losses;
        (total > 0).then(|| self.hits as f64 / total as f64)
    }
}

/// A named pattern plus its live performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRecord {
    pub id: StrategyId,
    pub name: String,
    #[serde(rename = "sequence")]
    pub pattern: Pattern,
    pub active: bool,
    #[serde(default = "default_true")]
    pub alert_on_priority: bool,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(flatten)]
    pub state: TrackState,
}

fn default_true() -> bool {
    true
}

impl StrategyRecord {
    /// A fresh, active strategy with empty performance.
    pub fn new(id: StrategyId, name: String, pattern: Pattern, created_at: i64) -> Self {
        Self {
            id,
            name,
            pattern,
            active: true,
            alert_on_priority: true,
            created_at,
            state: TrackState::default(),
        }
    }

    /// Back to the empty baseline; identity, pattern and flags are kept.
    pub fn reset_performance(&mut self) {
        self.state = TrackState::default();
    }
}
