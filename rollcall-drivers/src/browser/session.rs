use std::time::Duration;

use anyhow::{anyhow, Result};
use fantoccini::{Client, Locator};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::browser::css_string;
use crate::browser::pacing::Pacing;
use crate::browser::view::{ChatView, PANEL_SELECTORS};

const CHAT_LIST_SELECTORS: [&str; 4] = [
    r#"[data-testid="chat-list"]"#,
    r#"aside[aria-label="Chat list"]"#,
    r#"div[aria-label="Chats"]"#,
    r#"div[role="grid"][aria-label]"#,
];

const LOGIN_POLL: Duration = Duration::from_secs(2);
const PANEL_POLL: Duration = Duration::from_secs(1);

/// The chat web client loaded in the browser.
pub struct ChatSession {
    client: Client,
    pacing: Pacing,
}

impl ChatSession {
    pub fn new(client: Client, pacing: Pacing) -> Self {
        Self { client, pacing }
    }

    async fn any_present(&self, selectors: &[&str]) -> Option<String> {
        for selector in selectors {
            match self.client.find_all(Locator::Css(selector)).await {
                Ok(found) if !found.is_empty() => return Some(selector.to_string()),
                Ok(_) => {}
                Err(e) => debug!(target: "browser", %selector, error = %e, "browser.selector.failed"),
            }
        }
        None
    }

    /// Wait for the chat list to appear, i.e. for a QR login to complete.
    /// Returns `false` when `timeout` elapses first.
    pub async fn wait_until_logged_in(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(selector) = self.any_present(&CHAT_LIST_SELECTORS).await {
                info!(target: "browser", %selector, "browser.login.ready");
                return true;
            }
            if Instant::now() >= deadline {
                warn!(target: "browser", timeout_secs = timeout.as_secs(), "browser.login.timeout");
                return false;
            }
            sleep(LOGIN_POLL).await;
        }
    }

    /// Click the group titled `name` in the chat list and wait for its
    /// message panel.
    pub async fn open_group(&self, name: &str, panel_timeout: Duration) -> Result<ChatView> {
        let selector = format!(r#"span[title="{}"]"#, css_string(name));
        let title = self
            .client
            .find(Locator::Css(&selector))
            .await
            .map_err(|e| anyhow!("group {name:?} not in chat list: {e}"))?;

        self.pacing.random_delay(100, 500).await;
        title.click().await?;

        let deadline = Instant::now() + panel_timeout;
        loop {
            if let Some(panel) = self.any_present(&PANEL_SELECTORS).await {
                info!(target: "browser", group = name, %panel, "browser.group.opened");
                return Ok(ChatView::new(self.client.clone()));
            }
            if Instant::now() >= deadline {
                return Err(anyhow!("message panel for {name:?} did not appear"));
            }
            sleep(PANEL_POLL).await;
        }
    }
}
