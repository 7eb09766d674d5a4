use std::collections::BTreeSet;
use std::sync::LazyLock;

use ego_tree::NodeRef;
use harvester_core::{
    FeedItemRecord, Interactions, ItemHandle, MediaCapture, MediaCorrelationTable,
};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Selector};
use url::Url;

use crate::labels::{is_interaction_label, parse_interactions};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

pub(crate) static ITEM: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"article[data-testid="tweet"]"#));
static TIME: LazyLock<Selector> = LazyLock::new(|| selector("time"));
static USER_NAME: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[data-testid="User-Name"]"#));
static TWEET_TEXT: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[data-testid="tweetText"]"#));
static STATUS_LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href*="/status/"]"#));
static LABELLED: LazyLock<Selector> = LazyLock::new(|| selector("[aria-label]"));
static PHOTO_IMG: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[data-testid="tweetPhoto"] img[src]"#));
static BACKGROUND: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[style*="background-image"]"#));
static VIDEO_SRC: LazyLock<Selector> =
    LazyLock::new(|| selector("video[src], video source[src]"));

static BACKGROUND_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*["']?([^"')]+)["']?\s*\)"#).expect("static pattern")
});

const THUMBNAIL_MARKER: &str = "video_thumb";
const CONTENT_IMAGE_MARKER: &str = "/media/";

/// One feed item inside a parsed document or fragment.
#[derive(Debug, Clone, Copy)]
pub struct DomItem<'a> {
    element: ElementRef<'a>,
    origin: &'a Url,
}

impl<'a> DomItem<'a> {
    pub fn new(element: ElementRef<'a>, origin: &'a Url) -> Self {
        Self { element, origin }
    }

    pub fn element(&self) -> ElementRef<'a> {
        self.element
    }

    fn timestamp_element(&self) -> Option<ElementRef<'a>> {
        self.element.select(&TIME).next()
    }

    fn timestamp_link(&self) -> Option<ElementRef<'a>> {
        self.timestamp_element()
            .and_then(|time| link_ancestor(*time))
    }

    fn permalink(&self, id: &str) -> String {
        let links: Vec<Url> = self
            .element
            .select(&STATUS_LINK)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve(self.origin, href))
            .collect();

        let suffix = format!("/{id}");
        if let Some(exact) = links
            .iter()
            .find(|url| url.path().trim_end_matches('/').ends_with(&suffix))
        {
            return exact.to_string();
        }

        let status_segment = format!("/status/{id}");
        if let Some(anchor) = self
            .timestamp_link()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve(self.origin, href))
            .filter(|url| url.path().contains(&status_segment))
        {
            return anchor.to_string();
        }

        // Lowest confidence: some status link, possibly a quoted post's.
        links.first().map(Url::to_string).unwrap_or_default()
    }

    fn author(&self) -> Option<String> {
        self.element.select(&USER_NAME).next().and_then(|name| {
            name.text()
                .map(str::trim)
                .find(|text| !text.is_empty())
                .map(ToOwned::to_owned)
        })
    }

    fn text(&self) -> Option<String> {
        self.element
            .select(&TWEET_TEXT)
            .next()
            .map(|node| {
                let raw: String = node.text().collect();
                raw.split_whitespace().collect::<Vec<_>>().join(" ")
            })
            .filter(|text| !text.is_empty())
    }

    fn interactions(&self) -> Interactions {
        // Only the first qualifying label counts, even if an item has several.
        self.element
            .select(&LABELLED)
            .filter_map(|el| el.value().attr("aria-label"))
            .find(|label| is_interaction_label(label))
            .map(parse_interactions)
            .unwrap_or_default()
    }

    fn raw_media(&self) -> RawMedia {
        let mut media = RawMedia::default();

        let photos = self
            .element
            .select(&PHOTO_IMG)
            .filter_map(|img| img.value().attr("src"))
            .map(|src| src.trim().to_string());
        let backgrounds = self
            .element
            .select(&BACKGROUND)
            .filter_map(|el| el.value().attr("style"))
            .filter_map(background_url);

        for url in photos.chain(backgrounds) {
            if url.contains(THUMBNAIL_MARKER) {
                if !media.thumbnails.contains(&url) {
                    media.thumbnails.push(url);
                }
            } else if url.contains(CONTENT_IMAGE_MARKER) {
                media.images.insert(url);
            }
        }

        media.direct_videos = self
            .element
            .select(&VIDEO_SRC)
            .filter_map(|el| el.value().attr("src"))
            .map(str::trim)
            .filter(|src| !src.is_empty() && !src.starts_with("blob:"))
            .map(ToOwned::to_owned)
            .collect();

        media
    }
}

impl ItemHandle for DomItem<'_> {
    fn identifier(&self) -> Option<String> {
        let href = self.timestamp_link()?.value().attr("href")?;
        status_id(href)
    }

    fn extract(&self, id: &str, media: &MediaCorrelationTable) -> Option<FeedItemRecord> {
        let time = self.timestamp_element()?;
        let capture = self.extract_media(media);
        Some(FeedItemRecord {
            id: id.to_string(),
            author: self.author(),
            text: self.text(),
            timestamp: time
                .value()
                .attr("datetime")
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned),
            permalink_url: self.permalink(id),
            interactions: self.interactions(),
            images: capture.images,
            videos: capture.videos,
        })
    }

    fn extract_media(&self, media: &MediaCorrelationTable) -> MediaCapture {
        let raw = self.raw_media();
        let mut videos = raw.direct_videos;
        videos.extend(media.videos_for_thumbnails(&raw.thumbnails));
        MediaCapture {
            images: raw.images,
            videos,
        }
    }
}

#[derive(Debug, Default)]
struct RawMedia {
    images: BTreeSet<String>,
    direct_videos: BTreeSet<String>,
    thumbnails: Vec<String>,
}

/// Trailing all-digit path segment of a permalink href, query stripped.
pub fn status_id(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        Some(segment.to_string())
    } else {
        None
    }
}

fn link_ancestor(node: NodeRef<'_, Node>) -> Option<ElementRef<'_>> {
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name().eq_ignore_ascii_case("a"))
}

fn resolve(origin: &Url, href: &str) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut url = origin.join(trimmed).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url)
}

fn background_url(style: &str) -> Option<String> {
    BACKGROUND_URL
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{background_url, status_id};

    #[test]
    fn status_id_requires_all_digits() {
        assert_eq!(status_id("/jack/status/20"), Some("20".to_string()));
        assert_eq!(status_id("/jack/status/20?s=46"), Some("20".to_string()));
        assert_eq!(status_id("https://x.com/jack/status/20/"), Some("20".to_string()));
        assert_eq!(status_id("/jack/status/20/analytics"), None);
        assert_eq!(status_id("/jack"), None);
    }

    #[test]
    fn background_url_handles_quotes() {
        assert_eq!(
            background_url(r#"background-image: url("https://pbs.twimg.com/media/a.jpg");"#),
            Some("https://pbs.twimg.com/media/a.jpg".to_string())
        );
        assert_eq!(
            background_url("background-image: url(https://pbs.twimg.com/media/b.jpg)"),
            Some("https://pbs.twimg.com/media/b.jpg".to_string())
        );
        assert_eq!(background_url("color: red"), None);
    }
}
