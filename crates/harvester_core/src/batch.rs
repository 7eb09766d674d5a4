use crate::FeedItemRecord;

/// Records captured since the last successful flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBatch {
    records: Vec<FeedItemRecord>,
    batch_index: u64,
}

impl Default for PendingBatch {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            batch_index: 1,
        }
    }
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next flushed batch will be written under.
    pub fn batch_index(&self) -> u64 {
        self.batch_index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FeedItemRecord] {
        &self.records
    }

    pub fn push(&mut self, record: FeedItemRecord) {
        self.records.push(record);
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut FeedItemRecord> {
        self.records.iter_mut().find(|record| record.id == id)
    }

    /// Drops the first `count` records after the sink accepted them and
    /// advances the batch index.
    pub(crate) fn commit_flush(&mut self, count: usize) {
        let count = count.min(self.records.len());
        self.records.drain(..count);
        self.batch_index += 1;
    }
}
