use std::collections::HashSet;

use crate::entry::ContentEntry;

/// Ordered, duplicate-free accumulation of content entries.
///
/// Overlapping snapshots re-observe the same rows; the first sighting of a
/// dedup key fixes its position.
#[derive(Debug, Default, Clone)]
pub struct DedupCollector {
    seen: HashSet<String>,
    ordered: Vec<ContentEntry>,
}

impl DedupCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the entry was new.
    pub fn offer(&mut self, entry: ContentEntry) -> bool {
        if self.seen.contains(&entry.dedup_key) {
            return false;
        }
        self.seen.insert(entry.dedup_key.clone());
        self.ordered.push(entry);
        true
    }

    pub fn all(&self) -> &[ContentEntry] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn into_entries(self) -> Vec<ContentEntry> {
        self.ordered
    }
}
