use std::collections::HashSet;

/// Ids that no longer represent new work.
///
/// Grows only. `seen` holds ids captured this session, `excluded` holds ids
/// the caller already handled before the session started.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KnownIdentifierSet {
    seen: HashSet<String>,
    excluded: HashSet<String>,
}

impl KnownIdentifierSet {
    pub fn with_excluded<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seen: HashSet::new(),
            excluded: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id) || self.excluded.contains(id)
    }

    /// Returns false if the id was already seen.
    pub fn mark_seen(&mut self, id: impl Into<String>) -> bool {
        self.seen.insert(id.into())
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }
}
