use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

/// Resolved media URLs as they appear in outbound traffic.
static NETWORK_MEDIA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:ext_tw_video|amplify_video)/(\d+)/").expect("static media pattern")
});

/// Poster frames rendered in markup; same id space as `NETWORK_MEDIA`.
static THUMBNAIL_MEDIA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:ext_tw_video_thumb|amplify_video_thumb|tweet_video_thumb)/(\d+)/")
        .expect("static thumbnail pattern")
});

/// Media id embedded in an intercepted request URL, if any.
pub fn network_media_id(url: &str) -> Option<&str> {
    NETWORK_MEDIA
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Media id embedded in a thumbnail URL, if any.
pub fn thumbnail_media_id(url: &str) -> Option<&str> {
    THUMBNAIL_MEDIA
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Anything that wants to see outbound request URLs.
///
/// Implementations must never fail or block; observation is transparent to
/// whoever issued the request.
pub trait SideChannelObserver {
    fn on_request(&mut self, url: &str);
}

/// Media id -> every URL seen for it, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaCorrelationTable {
    entries: HashMap<String, Vec<String>>,
}

impl MediaCorrelationTable {
    /// Returns false when the URL was already recorded for that id.
    pub fn record(&mut self, media_id: &str, url: &str) -> bool {
        let urls = self.entries.entry(media_id.to_string()).or_default();
        if urls.iter().any(|known| known == url) {
            return false;
        }
        urls.push(url.to_string());
        true
    }

    pub fn urls_for(&self, media_id: &str) -> &[String] {
        self.entries
            .get(media_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every URL captured for the ids embedded in `thumbnails`.
    ///
    /// A thumbnail whose id has not shown up in traffic yet contributes
    /// nothing; that is the normal state right after a render.
    pub fn videos_for_thumbnails<'a, I>(&self, thumbnails: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        thumbnails
            .into_iter()
            .filter_map(|thumb| thumbnail_media_id(thumb))
            .flat_map(|id| self.urls_for(id).iter().cloned())
            .collect()
    }
}

/// Feeds matching request URLs into a [`MediaCorrelationTable`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaCorrelator {
    table: MediaCorrelationTable,
}

impl MediaCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &MediaCorrelationTable {
        &self.table
    }

    /// Returns true when the URL added something to the table.
    pub fn observe(&mut self, url: &str) -> bool {
        match network_media_id(url) {
            Some(id) => self.table.record(id, url),
            None => false,
        }
    }
}

impl SideChannelObserver for MediaCorrelator {
    fn on_request(&mut self, url: &str) {
        self.observe(url);
    }
}

#[cfg(test)]
mod tests {
    use super::{network_media_id, thumbnail_media_id};

    #[test]
    fn network_pattern_extracts_media_id() {
        let url = "https://video.twimg.com/ext_tw_video/123456/pu/vid/avc1/720x1280/a.mp4?tag=12";
        assert_eq!(network_media_id(url), Some("123456"));
        assert_eq!(
            network_media_id("https://video.twimg.com/amplify_video/99/vid/x.m3u8"),
            Some("99")
        );
        assert_eq!(network_media_id("https://pbs.twimg.com/media/abc.jpg"), None);
    }

    #[test]
    fn thumbnail_pattern_extracts_media_id() {
        let url = "https://pbs.twimg.com/ext_tw_video_thumb/123456/pu/img/poster.jpg";
        assert_eq!(thumbnail_media_id(url), Some("123456"));
        assert_eq!(
            thumbnail_media_id("https://pbs.twimg.com/amplify_video_thumb/77/img/p.jpg"),
            Some("77")
        );
        assert_eq!(thumbnail_media_id("https://pbs.twimg.com/media/x.jpg"), None);
    }
}
