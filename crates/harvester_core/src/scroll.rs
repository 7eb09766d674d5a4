/// Consecutive no-growth ticks before the driver jumps further.
pub const STALL_LIMIT: u32 = 3;
/// Multiplier applied to the scroll step for the escalated jump.
pub const ESCALATION_FACTOR: u64 = 3;

/// Tracks ticks that did not grow the scrollable height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StallTracker {
    stalls: u32,
}

impl StallTracker {
    pub fn stalls(&self) -> u32 {
        self.stalls
    }

    /// Records one tick. Returns true when the caller should escalate.
    pub fn record(&mut self, height_before: u64, height_after: u64) -> bool {
        if height_after != height_before {
            self.stalls = 0;
            return false;
        }
        self.stalls += 1;
        if self.stalls >= STALL_LIMIT {
            self.stalls = 0;
            return true;
        }
        false
    }
}
