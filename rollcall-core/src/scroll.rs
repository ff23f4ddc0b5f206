use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::driver::ViewDriver;
use crate::error::ExtractError;
use crate::observer::ListObserver;

#[derive(Debug, Clone)]
pub struct ScrollSettings {
    /// Pixels moved per step.
    pub step_px: i64,
    /// Upper bound on waiting for lazily loaded rows after a step.
    pub settle_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            step_px: 2000,
            settle_timeout: Duration::from_millis(1500),
            poll_interval: Duration::from_millis(200),
        }
    }
}

/// Drives the scroll region and waits for it to settle.
pub struct ScrollController<D> {
    driver: Arc<D>,
    observer: ListObserver<D>,
    poll_interval: Duration,
    focused: bool,
}

impl<D: ViewDriver> ScrollController<D> {
    pub fn new(driver: Arc<D>, poll_interval: Duration) -> Self {
        Self {
            observer: ListObserver::new(Arc::clone(&driver)),
            driver,
            poll_interval,
            focused: false,
        }
    }

    /// Locate and focus the panel. Cached until a scroll step fails.
    pub async fn acquire_focus(&mut self) -> Result<(), ExtractError> {
        if self.focused {
            return Ok(());
        }
        self.driver
            .focus()
            .await
            .map_err(|e| ExtractError::PanelUnavailable(e.to_string()))?;
        self.focused = true;
        info!(target: "scroll", "scroll.focus.acquired");
        Ok(())
    }

    /// Move toward older content.
    pub async fn step_back(&mut self, px: i64) -> Result<(), ExtractError> {
        self.step(-px.abs()).await
    }

    /// Move toward newer content.
    pub async fn step_forward(&mut self, px: i64) -> Result<(), ExtractError> {
        self.step(px.abs()).await
    }

    async fn step(&mut self, delta: i64) -> Result<(), ExtractError> {
        self.acquire_focus().await?;
        if let Err(e) = self.driver.scroll_region(delta).await {
            // The panel may have been re-rendered; find it again next step.
            self.focused = false;
            warn!(target: "scroll", delta, error = %e, "scroll.step.failed");
        } else {
            debug!(target: "scroll", delta, "scroll.step");
        }
        Ok(())
    }

    /// Poll until more rows are rendered than `previous`, or `timeout` elapses.
    ///
    /// Returns whether new rows appeared. Either way the caller proceeds; a
    /// `false` just means the load was slow or there is nothing older.
    pub async fn settle(&self, previous: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let count = self.observer.visible_count().await;
            if count > previous {
                debug!(target: "scroll", previous, count, "scroll.settled");
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                debug!(target: "scroll", previous, "scroll.settle.timeout");
                return false;
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}
