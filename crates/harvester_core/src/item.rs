use crate::{FeedItemRecord, MediaCapture, MediaCorrelationTable};

/// Opaque handle to one rendered feed item.
///
/// Reconciliation never relies on handle identity, only on the id string the
/// handle derives. Implementations read already-rendered content and never
/// mutate shared state.
pub trait ItemHandle {
    /// Stable all-digit id, or `None` for a render shape we cannot key.
    fn identifier(&self) -> Option<String>;

    /// Full extraction. `None` when a required anchor is missing.
    fn extract(&self, id: &str, media: &MediaCorrelationTable) -> Option<FeedItemRecord>;

    /// Media only, used to enrich a record captured earlier.
    fn extract_media(&self, media: &MediaCorrelationTable) -> MediaCapture;
}

impl<T: ItemHandle + ?Sized> ItemHandle for &T {
    fn identifier(&self) -> Option<String> {
        (**self).identifier()
    }

    fn extract(&self, id: &str, media: &MediaCorrelationTable) -> Option<FeedItemRecord> {
        (**self).extract(id, media)
    }

    fn extract_media(&self, media: &MediaCorrelationTable) -> MediaCapture {
        (**self).extract_media(media)
    }
}
