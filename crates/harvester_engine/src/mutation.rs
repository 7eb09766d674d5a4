use scraper::Html;
use url::Url;

use crate::extract::{DomItem, ITEM};

/// Every feed item in a parsed document or fragment, in document order.
pub fn feed_items<'a>(doc: &'a Html, origin: &'a Url) -> Vec<DomItem<'a>> {
    doc.select(&ITEM)
        .map(|element| DomItem::new(element, origin))
        .collect()
}

/// Outer markup of every feed item in `html`.
///
/// Hosts use this to report which items a change touched.
pub fn item_fragments(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&ITEM).map(|element| element.html()).collect()
}

/// What a structural-change notification resolves to.
#[derive(Debug)]
pub enum Rescope {
    /// Reconcile just these parsed fragments.
    Items(Vec<Html>),
    /// Nothing item-shaped changed; fall back to a full-document scan.
    FullScan,
    /// The listener is unsubscribed; ignore the notification.
    Ignored,
}

/// Subscription to structural changes on the feed container.
#[derive(Debug)]
pub struct MutationListener {
    subscribed: bool,
}

impl Default for MutationListener {
    fn default() -> Self {
        Self { subscribed: true }
    }
}

impl MutationListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Idempotent.
    pub fn unsubscribe(&mut self) {
        self.subscribed = false;
    }

    /// Narrows a notification to the items it touched.
    ///
    /// Each fragment is the markup of the smallest changed ancestor the host
    /// could attribute. Fragments holding no item at all mean the change sat
    /// outside any item, which only a full scan can pick up.
    pub fn rescope(&self, fragments: &[String]) -> Rescope {
        if !self.subscribed {
            return Rescope::Ignored;
        }
        let docs: Vec<Html> = fragments
            .iter()
            .map(|fragment| Html::parse_fragment(fragment))
            .collect();
        let any_item = docs.iter().any(|doc| doc.select(&ITEM).next().is_some());
        if any_item {
            Rescope::Items(docs)
        } else {
            Rescope::FullScan
        }
    }
}
