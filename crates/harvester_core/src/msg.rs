#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A scroll tick advanced the viewport; heights measured around it.
    ScrollAdvanced { height_before: u64, height_after: u64 },
    /// The host issued an outbound request.
    RequestObserved { url: String },
    /// The sink finished a flush started by `Effect::Flush`.
    FlushFinished {
        batch_index: u64,
        flushed: usize,
        outcome: FlushOutcome,
    },
    /// External stop/teardown request.
    StopRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    Written,
    Failed { reason: String },
}
