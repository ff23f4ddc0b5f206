use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use tracing::info;
use url::Url;

use crate::browser::options::{chrome_capabilities, BrowserOptions};
use crate::browser::pacing::Pacing;
use crate::browser::session::ChatSession;

/// Thin wrapper around a `fantoccini` WebDriver client.
pub struct ChatDriver {
    pub client: Client,
    pub pacing: Pacing,
}

impl ChatDriver {
    /// Connect to a running WebDriver service (Chromedriver by default).
    pub async fn connect(options: BrowserOptions) -> Result<Self> {
        let endpoint = Url::parse(&options.webdriver_url)
            .with_context(|| format!("invalid webdriver url: {}", options.webdriver_url))?;

        let client = ClientBuilder::native()
            .capabilities(chrome_capabilities(&options))
            .connect(endpoint.as_str())
            .await
            .with_context(|| format!("failed to start a browser session at {endpoint}"))?;

        info!(
            target: "browser",
            webdriver = %endpoint,
            headless = options.headless,
            "browser.session.started"
        );
        Ok(Self {
            client,
            pacing: Pacing::new(),
        })
    }

    /// Navigate to `url` and return a [`ChatSession`] on it.
    pub async fn goto(&self, url: &str) -> Result<ChatSession> {
        self.pacing.random_delay(300, 1200).await;
        self.client
            .goto(url)
            .await
            .with_context(|| format!("failed to open {url}"))?;
        Ok(ChatSession::new(self.client.clone(), self.pacing.clone()))
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        info!(target: "browser", "browser.session.closed");
        Ok(())
    }
}
