#![allow(dead_code)]

use std::collections::BTreeSet;

use harvester_core::{FeedItemRecord, ItemHandle, MediaCapture, MediaCorrelationTable};

/// In-memory stand-in for a rendered feed item.
#[derive(Debug, Clone, Default)]
pub struct FakeItem {
    pub id: Option<String>,
    pub has_timestamp: bool,
    pub images: Vec<String>,
    pub thumbnails: Vec<String>,
    pub direct_videos: Vec<String>,
}

impl FakeItem {
    pub fn new(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            has_timestamp: true,
            ..Self::default()
        }
    }

    pub fn malformed() -> Self {
        Self::default()
    }

    pub fn without_timestamp(id: &str) -> Self {
        Self {
            has_timestamp: false,
            ..Self::new(id)
        }
    }

    pub fn with_image(mut self, url: &str) -> Self {
        self.images.push(url.to_string());
        self
    }

    pub fn with_thumbnail(mut self, url: &str) -> Self {
        self.thumbnails.push(url.to_string());
        self
    }
}

impl ItemHandle for FakeItem {
    fn identifier(&self) -> Option<String> {
        self.id.clone()
    }

    fn extract(&self, id: &str, media: &MediaCorrelationTable) -> Option<FeedItemRecord> {
        if !self.has_timestamp {
            return None;
        }
        let mut record = FeedItemRecord::new(id);
        record.permalink_url = format!("https://x.com/someone/status/{id}");
        let capture = self.extract_media(media);
        record.images = capture.images;
        record.videos = capture.videos;
        Some(record)
    }

    fn extract_media(&self, media: &MediaCorrelationTable) -> MediaCapture {
        let mut videos: BTreeSet<String> = self.direct_videos.iter().cloned().collect();
        videos.extend(media.videos_for_thumbnails(&self.thumbnails));
        MediaCapture {
            images: self.images.iter().cloned().collect(),
            videos,
        }
    }
}

pub fn init_logging() {
    engine_logging::initialize_for_tests();
}

pub fn ids(records: &[FeedItemRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}
