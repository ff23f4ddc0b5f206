use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, Locator};
use rollcall_core::{DriverError, NodeText, ViewDriver};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Message panel candidates, most specific first.
pub(crate) const PANEL_SELECTORS: [&str; 4] = [
    "div[data-testid='conversation-panel-messages']",
    "div[data-testid='conversation-panel-body']",
    "div.copyable-area",
    "div[role='region']",
];

const ROW_SELECTOR: &str = "div[role='row']";
const DISPLAY_SELECTOR: &str = ".selectable-text span";
const SCROLL_SCRIPT: &str = "arguments[0].scrollTop += arguments[1]; return arguments[0].scrollTop;";

fn command(e: fantoccini::error::CmdError) -> DriverError {
    DriverError::Command(e.to_string())
}

/// An open conversation. Rows are read in document order, oldest on top.
pub struct ChatView {
    client: Client,
    panel: RwLock<Option<Element>>,
}

impl ChatView {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            panel: RwLock::new(None),
        }
    }

    async fn locate_panel(&self) -> Result<Element, DriverError> {
        for selector in PANEL_SELECTORS {
            match self.client.find(Locator::Css(selector)).await {
                Ok(panel) => {
                    debug!(target: "browser", %selector, "browser.panel.located");
                    return Ok(panel);
                }
                Err(e) => debug!(target: "browser", %selector, error = %e, "browser.panel.miss"),
            }
        }
        Err(DriverError::PanelNotFound(PANEL_SELECTORS.join(", ")))
    }
}

#[async_trait]
impl ViewDriver for ChatView {
    type Node = Element;

    async fn query_entries(&self) -> Result<Vec<Element>, DriverError> {
        self.client
            .find_all(Locator::Css(ROW_SELECTOR))
            .await
            .map_err(command)
    }

    async fn read_text(&self, node: &Element) -> Result<NodeText, DriverError> {
        let full = node
            .text()
            .await
            .map_err(|e| DriverError::Unreadable(e.to_string()))?;
        let spans = node
            .find_all(Locator::Css(DISPLAY_SELECTOR))
            .await
            .map_err(|e| DriverError::Unreadable(e.to_string()))?;

        let mut display_regions = Vec::with_capacity(spans.len());
        for span in spans {
            // A span can detach between listing and reading; keep the rest.
            if let Ok(text) = span.text().await {
                display_regions.push(text);
            }
        }
        Ok(NodeText {
            full,
            display_regions,
        })
    }

    async fn scroll_region(&self, delta_px: i64) -> Result<(), DriverError> {
        let guard = self.panel.read().await;
        let panel = guard
            .as_ref()
            .ok_or_else(|| DriverError::PanelNotFound("panel not focused".into()))?;
        let element = serde_json::to_value(panel).map_err(|e| DriverError::Command(e.to_string()))?;
        let top = self
            .client
            .execute(SCROLL_SCRIPT, vec![element, json!(delta_px)])
            .await
            .map_err(command)?;
        debug!(target: "browser", delta_px, scroll_top = %top, "browser.panel.scrolled");
        Ok(())
    }

    async fn focus(&self) -> Result<(), DriverError> {
        let panel = self.locate_panel().await?;
        panel.click().await.map_err(command)?;
        *self.panel.write().await = Some(panel);
        info!(target: "browser", "browser.panel.focused");
        Ok(())
    }
}
