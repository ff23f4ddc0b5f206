use std::sync::Arc;

use tracing::{debug, warn};

use crate::dates;
use crate::driver::{NodeText, ViewDriver};
use crate::entry::RawEntry;

/// Entries visible in one observation, top to bottom.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub entries: Vec<RawEntry>,
    /// Nodes that detached or failed to read.
    pub skipped: usize,
}

/// Reads the currently rendered rows and assigns each a role.
pub struct ListObserver<D> {
    driver: Arc<D>,
}

impl<D> Clone for ListObserver<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
        }
    }
}

impl<D: ViewDriver> ListObserver<D> {
    pub fn new(driver: Arc<D>) -> Self {
        Self { driver }
    }

    /// Never fails: a failed query yields an empty snapshot, an unreadable
    /// node is skipped without affecting its neighbours.
    pub async fn snapshot(&self) -> Snapshot {
        let nodes = match self.driver.query_entries().await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(target: "observer", error = %e, "observer.query.failed");
                return Snapshot::default();
            }
        };

        let mut snapshot = Snapshot::default();
        for node in &nodes {
            match self.driver.read_text(node).await {
                Ok(text) => {
                    if let Some(entry) = assign_role(&text) {
                        snapshot.entries.push(entry);
                    }
                }
                Err(e) => {
                    snapshot.skipped += 1;
                    debug!(target: "observer", error = %e, "observer.entry.skipped");
                }
            }
        }
        debug!(
            target: "observer",
            nodes = nodes.len(),
            entries = snapshot.entries.len(),
            skipped = snapshot.skipped,
            "observer.snapshot"
        );
        snapshot
    }

    /// Number of rendered entry nodes, used as the lazy-load progress signal.
    pub async fn visible_count(&self) -> usize {
        match self.driver.query_entries().await {
            Ok(nodes) => nodes.len(),
            Err(e) => {
                debug!(target: "observer", error = %e, "observer.count.failed");
                0
            }
        }
    }
}

/// Markers are judged on the whole row text; content keeps the innermost
/// display region so quoted replies do not leak into the entry.
pub fn assign_role(text: &NodeText) -> Option<RawEntry> {
    let full = text.full.trim();
    if !full.is_empty() && dates::classify(full).is_date_marker {
        return Some(RawEntry::marker(full));
    }
    let display = text.preferred_display();
    if display.is_empty() {
        return None;
    }
    Some(RawEntry::content(display))
}
