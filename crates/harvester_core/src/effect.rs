use crate::FeedItemRecord;

/// Side effects the session runtime carries out, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Extra scroll on top of the regular tick advance.
    ScrollBy { distance: u64 },
    /// Hand `records` to the export sink, then report back with
    /// `Msg::FlushFinished`.
    Flush {
        batch_index: u64,
        records: Vec<FeedItemRecord>,
    },
    /// Stop the recurring scroll timer.
    CancelTimer,
    /// Drop the structural-change subscription.
    Unsubscribe,
    /// Let go of any status display.
    ReleaseUi,
}
