use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("entry unreadable: {0}")]
    Unreadable(String),
    #[error("scroll panel not found: {0}")]
    PanelNotFound(String),
    #[error("driver command failed: {0}")]
    Command(String),
}

/// Text read from one entry node.
///
/// `full` is the node's complete text; `display_regions` are the nested
/// display spans in document order, for rows that carry quoted replies or
/// sender headers alongside the message body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeText {
    pub full: String,
    pub display_regions: Vec<String>,
}

impl NodeText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            full: text.into(),
            display_regions: Vec::new(),
        }
    }

    /// Last non-empty display region, falling back to the full text.
    pub fn preferred_display(&self) -> &str {
        self.display_regions
            .iter()
            .rev()
            .map(|r| r.trim())
            .find(|r| !r.is_empty())
            .unwrap_or_else(|| self.full.trim())
    }
}

/// The virtualized list as the engine sees it.
///
/// Implementations wrap a live rendering surface. Nodes are only valid for
/// the snapshot they were queried in; any of them may detach before it is
/// read.
#[async_trait]
pub trait ViewDriver: Send + Sync {
    type Node: Send + Sync;

    /// Currently rendered entry nodes, top to bottom.
    async fn query_entries(&self) -> Result<Vec<Self::Node>, DriverError>;

    async fn read_text(&self, node: &Self::Node) -> Result<NodeText, DriverError>;

    /// Move the scroll region by `delta_px`; negative moves toward older content.
    async fn scroll_region(&self, delta_px: i64) -> Result<(), DriverError>;

    /// Locate the scrollable panel and give it input focus.
    async fn focus(&self) -> Result<(), DriverError>;
}
