//! Per-spin state machine that turns a spin into hit/loss bookkeeping for one
//! strategy.
//!
//! [`Matcher::advance`] is pure: the same pattern, state, spin and index
//! always produce the same result. [`Matcher::recompute`] folds it over a
//! whole history, which is how removals and replacements are handled.

use wheelwatch_core::{Cyclical, Pattern, Spin, Step, TargetNumbers, TrackerConfig, WheelVariant};

use crate::record::{Outcome, PendingCheck, TrackState};

/// Settings every advance is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matcher {
    pub priority_threshold: u32,
    pub wheel: WheelVariant,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::from(TrackerConfig::default())
    }
}

impl From<TrackerConfig> for Matcher {
    fn from(config: TrackerConfig) -> Self {
        Self {
            priority_threshold: config.priority_threshold,
            wheel: config.wheel,
        }
    }
}

/// Result of feeding one spin to one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub state: TrackState,
    /// The strategy crossed into priority on this spin.
    pub newly_priority: bool,
}

impl Matcher {
    pub fn new(priority_threshold: u32, wheel: WheelVariant) -> Self {
        Self {
            priority_threshold,
            wheel,
        }
    }

    #[inline]
    pub fn matches_step(&self, spin: Spin, step: &Step) -> bool {
        step.matches(spin, self.wheel)
    }

    /// Feed the spin at 1-based chronological position `spin_index`.
    pub fn advance(
        &self,
        pattern: &Pattern,
        mut state: TrackState,
        spin: Spin,
        spin_index: u32,
    ) -> Advance {
        let was_priority = state.is_priority;

        match pattern.step_at(state.cursor) {
            Step::Cyclical(c) => self.advance_cyclical(&mut state, c, spin, spin_index),
            Step::TargetNumbers(t) => self.advance_target(&mut state, t, spin, spin_index),
            step => {
                let hit = self.matches_step(spin, step);
                self.advance_standard(&mut state, pattern.len() as u32, hit, spin_index)
            }
        }

        Advance {
            newly_priority: state.is_priority && !was_priority,
            state,
        }
    }

    /// Replay a full history from the empty baseline, oldest spin first.
    pub fn recompute(&self, pattern: &Pattern, oldest_first: &[Spin]) -> TrackState {
        oldest_first
            .iter()
            .enumerate()
            .fold(TrackState::default(), |state, (i, &spin)| {
                self.advance(pattern, state, spin, i as u32 + 1).state
            })
    }

    fn advance_standard(&self, state: &mut TrackState, len: u32, hit: bool, spin_index: u32) {
        if hit {
            state.record(spin_index, Outcome::Hit);
            state.is_priority = false;
            state.cursor = (state.cursor + 1) % len;
            // Only a completed pass through the pattern counts.
            if state.cursor == 0 {
                state.hits += 1;
                state.extend_win_streak();
            }
        } else {
            state.cursor = 0;
            self.register_loss(state, spin_index);
        }
    }

    fn advance_cyclical(&self, state: &mut TrackState, c: &Cyclical, spin: Spin, spin_index: u32) {
        let hit = self.matches_step(spin, &c.target);

        let due = state
            .pending_check
            .is_some_and(|p| p.check_at_spin == spin_index);
        if due {
            if hit {
                self.register_hit(state, spin_index);
                state.pending_check = schedule(spin_index, c.interval);
            } else {
                self.register_loss(state, spin_index);
                state.pending_check = None;
            }
            return;
        }

        if hit && !(c.ignore_subsequent && state.pending_check.is_some()) {
            state.pending_check = schedule(spin_index, c.interval);
        }
    }

    fn advance_target(&self, state: &mut TrackState, t: &TargetNumbers, spin: Spin, spin_index: u32) {
        let is_base = t.base.contains(&spin);

        // Phase 0: waiting for a base number, nothing is judged.
        if state.cursor == 0 {
            if is_base {
                state.cursor = 1;
            }
            return;
        }

        if t.targets.contains(&spin) {
            self.register_hit(state, spin_index);
        } else {
            self.register_loss(state, spin_index);
        }
        state.cursor = u32::from(is_base);
    }

    fn register_hit(&self, state: &mut TrackState, spin_index: u32) {
        state.is_priority = false;
        state.hits += 1;
        state.extend_win_streak();
        state.record(spin_index, Outcome::Hit);
    }

    fn register_loss(&self, state: &mut TrackState, spin_index: u32) {
        state.losses += 1;
        state.extend_loss_streak(self.priority_threshold);
        state.record(spin_index, Outcome::Loss);
    }
}

/// A check past the last representable spin index can never resolve.
fn schedule(spin_index: u32, interval: u32) -> Option<PendingCheck> {
    spin_index
        .checked_add(interval)
        .map(|check_at_spin| PendingCheck { check_at_spin })
}
