use serde::{Deserialize, Serialize};

pub const DEFAULT_SCROLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_SCROLL_STEP: u64 = 800;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_ORIGIN: &str = "https://x.com";

/// Options recognized at session start. Every field has a default, so a
/// config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarvestConfig {
    pub scroll_interval_ms: u64,
    pub scroll_step: u64,
    pub batch_size: usize,
    pub stop_at_id: Option<String>,
    pub skip_ids: Vec<String>,
    /// Base used to resolve relative permalinks.
    pub origin: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            scroll_interval_ms: DEFAULT_SCROLL_INTERVAL_MS,
            scroll_step: DEFAULT_SCROLL_STEP,
            batch_size: DEFAULT_BATCH_SIZE,
            stop_at_id: None,
            skip_ids: Vec::new(),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}
