use crate::view_model::HarvestView;
use crate::{
    FeedItemRecord, HarvestConfig, KnownIdentifierSet, MediaCorrelationTable, MediaCorrelator,
    PendingBatch, StallTracker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Running,
    /// Terminal. Nothing is captured or flushed on triggers after this.
    Stopped,
}

/// Everything one harvesting session owns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarvestState {
    pub(crate) config: HarvestConfig,
    pub(crate) session: SessionState,
    pub(crate) known: KnownIdentifierSet,
    pub(crate) batch: PendingBatch,
    pub(crate) correlator: MediaCorrelator,
    pub(crate) stall: StallTracker,
    dirty: bool,
}

impl HarvestState {
    /// Starts a session; `skip_ids` are treated as already handled.
    pub fn new(config: HarvestConfig) -> Self {
        let known = KnownIdentifierSet::with_excluded(config.skip_ids.iter().cloned());
        Self {
            config,
            known,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn is_stopped(&self) -> bool {
        self.session == SessionState::Stopped
    }

    pub fn known(&self) -> &KnownIdentifierSet {
        &self.known
    }

    pub fn pending(&self) -> &[FeedItemRecord] {
        self.batch.records()
    }

    pub fn batch_index(&self) -> u64 {
        self.batch.batch_index()
    }

    pub fn media(&self) -> &MediaCorrelationTable {
        self.correlator.table()
    }

    pub fn stall(&self) -> StallTracker {
        self.stall
    }

    pub fn view(&self) -> HarvestView {
        HarvestView {
            session: self.session,
            batch_index: self.batch.batch_index(),
            pending: self.batch.len(),
            captured_total: self.known.seen_count(),
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
