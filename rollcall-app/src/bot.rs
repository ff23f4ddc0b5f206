use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{Local, NaiveDate};
use rollcall_common::{Result, RollcallError, RunMode};
use rollcall_config::{ExtractionConfig, Locale, RollcallConfig, WhatsappConfig};
use rollcall_core::{
    ExtractSettings, Extraction, RangeExtractor, ScrollSettings, WeekdayLocale, classify_message,
};
use rollcall_drivers::{BrowserOptions, ChatDriver, ChatSession, ChatView};
use rollcall_notion::{DatabaseId, NotionClient, StatusUpdater, StoreError, UpdateOutcome};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const OPEN_GROUP_BACKOFF: Duration = Duration::from_secs(5);
const PANEL_TIMEOUT: Duration = Duration::from_secs(20);

/// Per-run knobs resolved from flags and config.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// `None` means the local date at startup.
    pub target: Option<NaiveDate>,
    pub max_steps: usize,
    pub once: bool,
    pub mode: RunMode,
}

pub fn extract_settings(cfg: &ExtractionConfig) -> ExtractSettings {
    ExtractSettings {
        scroll: ScrollSettings {
            step_px: cfg.step_px,
            settle_timeout: Duration::from_millis(cfg.settle_timeout_ms),
            poll_interval: Duration::from_millis(cfg.poll_interval_ms),
        },
        locale: match cfg.locale {
            Locale::Tr => WeekdayLocale::Turkish,
            Locale::En => WeekdayLocale::English,
        },
    }
}

/// Days whose databases may hold a record: the target, then the day before,
/// so late notes for yesterday's session still land.
pub fn lookup_days(target: NaiveDate) -> Vec<NaiveDate> {
    std::iter::once(target).chain(target.pred_opt()).collect()
}

fn store_error(e: StoreError) -> RollcallError {
    RollcallError::Store(e.to_string())
}

/// Start the browser, run the scan loop until `shutdown` fires, then close it.
pub async fn run(cfg: RollcallConfig, settings: BotSettings, shutdown: CancellationToken) -> Result<()> {
    let session_dir = cfg
        .browser
        .resolved_session_path()
        .map_err(|e| RollcallError::Config(format!("session path: {e}")))?;
    let driver = ChatDriver::connect(BrowserOptions {
        webdriver_url: cfg.browser.webdriver_url.clone(),
        headless: cfg.browser.headless,
        session_dir: Some(session_dir),
        window_size: cfg.browser.window_size,
    })
    .await?;

    let outcome = tokio::select! {
        res = drive(&driver, &cfg, &settings, &shutdown) => res,
        _ = shutdown.cancelled() => Ok(()),
    };

    if let Err(e) = driver.close().await {
        warn!(target: "bot", error = %e, "bot.browser.close_failed");
    }
    outcome
}

async fn drive(
    driver: &ChatDriver,
    cfg: &RollcallConfig,
    settings: &BotSettings,
    shutdown: &CancellationToken,
) -> Result<()> {
    let session = driver.goto(&cfg.whatsapp.url).await?;
    let login_timeout = Duration::from_secs(cfg.whatsapp.login_timeout_secs);
    info!(target: "bot", timeout_secs = login_timeout.as_secs(), "bot.login.waiting");
    if !session.wait_until_logged_in(login_timeout).await {
        return Err(RollcallError::Timeout(format!(
            "chat list did not appear within {}s; scan the QR code to log in",
            login_timeout.as_secs()
        )));
    }

    let view = open_group_with_retries(&session, &cfg.whatsapp).await?;

    let target = settings.target.unwrap_or_else(|| Local::now().date_naive());
    let notion = NotionClient::new(cfg.notion.token.as_str(), &cfg.notion.api_base).map_err(store_error)?;
    let databases = notion
        .databases_for_dates(&cfg.notion.parent_page_id, &lookup_days(target))
        .await
        .map_err(store_error)?;
    if databases.is_empty() {
        return Err(store_error(StoreError::DatabaseNotFound(
            target.format("%d.%m.%Y").to_string(),
        )));
    }
    info!(target: "bot", databases = databases.len(), "bot.databases.resolved");

    let mut scanner = Scanner {
        extractor: RangeExtractor::new(Arc::new(view), extract_settings(&cfg.extraction)),
        updater: StatusUpdater::new(notion),
        databases: &databases,
        processed: HashSet::new(),
        target,
        max_steps: settings.max_steps,
        fallback: cfg.extraction.fallback_recent,
        mode: settings.mode,
    };

    let interval = Duration::from_secs(cfg.whatsapp.scan_interval_secs.max(1));
    loop {
        scanner.scan().await;
        if settings.once {
            return Ok(());
        }
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            _ = sleep(interval) => {}
        }
    }
}

async fn open_group_with_retries(session: &ChatSession, cfg: &WhatsappConfig) -> Result<ChatView> {
    let attempts = cfg.open_group_retries.max(1);
    for attempt in 1..=attempts {
        match session.open_group(&cfg.group, PANEL_TIMEOUT).await {
            Ok(view) => {
                info!(target: "bot", group = %cfg.group, attempt, "bot.group.opened");
                return Ok(view);
            }
            Err(e) => {
                warn!(target: "bot", group = %cfg.group, attempt, attempts, error = %e, "bot.group.open_failed");
                if attempt < attempts {
                    sleep(OPEN_GROUP_BACKOFF).await;
                }
            }
        }
    }
    Err(RollcallError::Driver(anyhow!(
        "could not open group '{}' after {attempts} attempts",
        cfg.group
    )))
}

struct Scanner<'a> {
    extractor: RangeExtractor<ChatView>,
    updater: StatusUpdater<NotionClient>,
    databases: &'a [DatabaseId],
    /// Entries already handled; a failed write is dropped so the next scan retries it.
    processed: HashSet<String>,
    target: NaiveDate,
    max_steps: usize,
    fallback: usize,
    mode: RunMode,
}

impl Scanner<'_> {
    async fn scan(&mut self) {
        let extraction = if self.fallback > 0 {
            self.extractor
                .extract_range_or_recent(self.target, self.max_steps, self.fallback)
                .await
        } else {
            self.extractor
                .extract_range(self.target, self.max_steps)
                .await
                .map(Extraction::Range)
        };
        let extraction = match extraction {
            Ok(extraction) => extraction,
            Err(e) => {
                error!(target: "bot", error = %RollcallError::Extraction(e.to_string()), "bot.scan.failed");
                return;
            }
        };

        let steps = match &extraction {
            Extraction::Range(result) => {
                info!(
                    target: "bot",
                    found = result.found,
                    complete = result.complete,
                    entries = result.entries.len(),
                    steps = result.steps,
                    "bot.scan.range"
                );
                result.steps
            }
            Extraction::RecentFallback(entries) => {
                warn!(target: "bot", entries = entries.len(), "bot.scan.fallback");
                self.max_steps
            }
        };

        for text in extraction.entries() {
            if !self.processed.insert(text.clone()) {
                continue;
            }
            self.handle(text).await;
        }

        if let Err(e) = self.extractor.resume_live_view(steps).await {
            warn!(target: "bot", error = %e, "bot.resume.failed");
        }
    }

    async fn handle(&mut self, text: &str) {
        if !self.mode.writes() {
            let classification = classify_message(text);
            info!(
                target: "bot",
                text,
                subject = %classification.subject,
                status = classification.status.map(|s| s.store_label()).unwrap_or("-"),
                "bot.dry_run"
            );
            return;
        }

        match self.updater.apply(text, self.databases).await {
            UpdateOutcome::Failed(reason) => {
                debug!(target: "bot", text, reason = %reason, "bot.entry.retry_next_scan");
                self.processed.remove(text);
            }
            outcome => debug!(target: "bot", text, ?outcome, "bot.entry.done"),
        }
    }
}
