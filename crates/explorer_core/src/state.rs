use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::view_model::{PanelViewModel, SourceRowView};
use crate::{ProgressState, SourceId, SourceRegistry, SourceStatus};

/// Failure probability used when none is configured.
pub const DEFAULT_FAILURE_PROBABILITY: f64 = 0.10;

/// Mapping from source id to its current progress.
pub type ProgressSnapshot = BTreeMap<SourceId, ProgressState>;

/// Generation counter identifying one search session.
///
/// Every callback scheduled for a session carries the epoch it was
/// scheduled under; callbacks from an older epoch are dropped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    registry: SourceRegistry,
    /// One entry per registry source, indexed like `registry.list()`.
    entries: Vec<ProgressState>,
    /// Whether the source's start trigger already fired this session.
    triggered: Vec<bool>,
    searching: bool,
    epoch: SessionEpoch,
    failure_probability: f64,
    dirty: bool,
}

impl SearchState {
    pub fn new(registry: SourceRegistry) -> Self {
        let len = registry.len();
        Self {
            registry,
            entries: vec![ProgressState::Idle; len],
            triggered: vec![false; len],
            searching: false,
            epoch: SessionEpoch::default(),
            failure_probability: DEFAULT_FAILURE_PROBABILITY,
            dirty: false,
        }
    }

    /// Sets the probability that a source ends in `error` instead of `complete`.
    /// Values are clamped to `[0, 1]`.
    pub fn with_failure_probability(mut self, probability: f64) -> Self {
        self.failure_probability = if probability.is_nan() {
            DEFAULT_FAILURE_PROBABILITY
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn failure_probability(&self) -> f64 {
        self.failure_probability
    }

    pub fn get(&self, source_id: &str) -> Option<&ProgressState> {
        self.registry
            .index_of(source_id)
            .map(|index| &self.entries[index])
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.registry
            .list()
            .iter()
            .zip(&self.entries)
            .map(|(source, state)| (source.id.clone(), state.clone()))
            .collect()
    }

    /// True when a tick for `source_id` under `epoch` would still be applied.
    pub fn accepts_ticks(&self, epoch: SessionEpoch, source_id: &str) -> bool {
        self.searching
            && epoch == self.epoch
            && matches!(self.get(source_id), Some(ProgressState::Searching { .. }))
    }

    /// True once every source has reached a terminal state in the current session.
    pub fn is_settled(&self) -> bool {
        self.searching && self.entries.iter().all(ProgressState::is_terminal)
    }

    pub fn view(&self) -> PanelViewModel {
        let rows: Vec<SourceRowView> = self
            .registry
            .list()
            .iter()
            .zip(&self.entries)
            .map(|(source, state)| SourceRowView {
                id: source.id.clone(),
                name: source.name.clone(),
                category: source.category,
                status: state.status(),
                progress: state.progress(),
                info: state.info().map(ToOwned::to_owned),
            })
            .collect();
        let count = |status: SourceStatus| rows.iter().filter(|row| row.status == status).count();

        PanelViewModel {
            searching: self.searching,
            epoch: self.epoch,
            completed: count(SourceStatus::Complete),
            failed: count(SourceStatus::Error),
            in_flight: count(SourceStatus::Searching),
            rows,
            dirty: self.dirty,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Opens a new session: every source restarts at `searching` / 0%.
    pub(crate) fn begin_session(&mut self) -> SessionEpoch {
        self.epoch = self.epoch.next();
        self.searching = true;
        self.reset_entries(ProgressState::searching());
        self.mark_dirty();
        self.epoch
    }

    /// Closes the current session: every source returns to `idle`.
    pub(crate) fn end_session(&mut self) -> SessionEpoch {
        let ended = self.epoch;
        self.epoch = self.epoch.next();
        self.searching = false;
        self.reset_entries(ProgressState::Idle);
        self.mark_dirty();
        ended
    }

    /// Marks the source as started. Returns false for stale or duplicate triggers.
    pub(crate) fn apply_trigger(&mut self, epoch: SessionEpoch, source_id: &str) -> bool {
        if !self.searching || epoch != self.epoch {
            return false;
        }
        let Some(index) = self.registry.index_of(source_id) else {
            return false;
        };
        if self.triggered[index] || self.entries[index].is_terminal() {
            return false;
        }
        self.triggered[index] = true;
        self.entries[index] = ProgressState::searching();
        self.mark_dirty();
        true
    }

    /// Applies a tick. Returns the terminal status when the tick settled the source.
    pub(crate) fn apply_tick(
        &mut self,
        epoch: SessionEpoch,
        source_id: &str,
        increment: f64,
        failure_roll: f64,
    ) -> TickResult {
        if !self.accepts_ticks(epoch, source_id) {
            return TickResult::Ignored;
        }
        let Some(index) = self.registry.index_of(source_id) else {
            return TickResult::Ignored;
        };
        if !self.triggered[index] {
            return TickResult::Ignored;
        }
        let failure_probability = self.failure_probability;
        let settled = self.entries[index].advance(increment, failure_roll, failure_probability);
        self.mark_dirty();
        match settled {
            Some(status) => TickResult::Settled(status),
            None => TickResult::Advanced,
        }
    }

    fn reset_entries(&mut self, initial: ProgressState) {
        self.entries = vec![initial; self.registry.len()];
        self.triggered = vec![false; self.registry.len()];
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickResult {
    Ignored,
    Advanced,
    Settled(SourceStatus),
}
