use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One harvested feed item.
///
/// `id` is fixed at capture time. Only `images` and `videos` are ever
/// touched afterwards, and only while the record is still pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItemRecord {
    pub id: String,
    pub author: Option<String>,
    pub text: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub permalink_url: String,
    #[serde(default)]
    pub interactions: Interactions,
    #[serde(default)]
    pub images: BTreeSet<String>,
    #[serde(default)]
    pub videos: BTreeSet<String>,
}

impl FeedItemRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: None,
            text: None,
            timestamp: None,
            permalink_url: String::new(),
            interactions: Interactions::default(),
            images: BTreeSet::new(),
            videos: BTreeSet::new(),
        }
    }

    /// Fills empty media fields from a later capture.
    ///
    /// A field that already holds anything is left alone, so the first
    /// non-empty capture wins. Returns true when a field changed.
    pub fn absorb_media(&mut self, capture: MediaCapture) -> bool {
        let mut changed = false;
        if self.images.is_empty() && !capture.images.is_empty() {
            self.images = capture.images;
            changed = true;
        }
        if self.videos.is_empty() && !capture.videos.is_empty() {
            self.videos = capture.videos;
            changed = true;
        }
        changed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interactions {
    pub replies_count: u64,
    pub reposts_count: u64,
    pub likes_count: u64,
    pub bookmarks_count: u64,
    pub views_count: u64,
}

/// Media found on one item during a single extraction pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaCapture {
    pub images: BTreeSet<String>,
    pub videos: BTreeSet<String>,
}
