use crate::SessionState;

/// What a status observer gets after each state change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarvestView {
    pub session: SessionState,
    pub batch_index: u64,
    pub pending: usize,
    pub captured_total: usize,
}
