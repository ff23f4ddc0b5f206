#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use rollcall_common::observability::{LogConfig, LogFormat};
use rollcall_core::{DriverError, ExtractSettings, NodeText, ScrollSettings, ViewDriver};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "rollcall-tests",
            log_dir: Some(std::env::temp_dir().join("rollcall-tests")),
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "debug".to_string(),
        };
        rollcall_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Settings small enough that settle timeouts do not slow the suite down.
pub fn fast_settings() -> ExtractSettings {
    ExtractSettings {
        scroll: ScrollSettings {
            step_px: 2000,
            settle_timeout: Duration::from_millis(5),
            poll_interval: Duration::from_millis(1),
        },
        ..ExtractSettings::default()
    }
}

#[derive(Debug, Clone)]
pub enum FakeNode {
    Row(NodeText),
    Detached,
}

pub fn marker(label: &str) -> FakeNode {
    FakeNode::Row(NodeText::plain(label))
}

pub fn msg(text: &str) -> FakeNode {
    FakeNode::Row(NodeText {
        full: format!("{text}\n12:00"),
        display_regions: vec![text.to_string()],
    })
}

/// A message quoting an earlier one; the quote renders as its own region.
pub fn reply(quoted: &str, text: &str) -> FakeNode {
    FakeNode::Row(NodeText {
        full: format!("{quoted}\n{text}\n12:01"),
        display_regions: vec![quoted.to_string(), text.to_string()],
    })
}

/// A chat view that advances through pre-rendered frames.
///
/// Frame 0 is what is rendered before any scrolling. Each backward step
/// shows the next frame, each forward step the previous one; both clamp.
pub struct ScriptedView {
    frames: Vec<Vec<FakeNode>>,
    position: Mutex<usize>,
    panel_present: bool,
    /// Scrolls that succeed before the panel goes stale for good.
    panel_lost_after: Option<usize>,
    pub scrolls: Mutex<Vec<i64>>,
    pub focus_calls: AtomicUsize,
}

impl ScriptedView {
    pub fn new(frames: Vec<Vec<FakeNode>>) -> Self {
        assert!(!frames.is_empty(), "at least one frame");
        Self {
            frames,
            position: Mutex::new(0),
            panel_present: true,
            panel_lost_after: None,
            scrolls: Mutex::new(Vec::new()),
            focus_calls: AtomicUsize::new(0),
        }
    }

    pub fn without_panel(mut self) -> Self {
        self.panel_present = false;
        self
    }

    /// After `scrolls` successful scrolls, scrolling fails and the panel
    /// can no longer be focused.
    pub fn losing_panel_after(mut self, scrolls: usize) -> Self {
        self.panel_lost_after = Some(scrolls);
        self
    }

    fn panel_lost(&self) -> bool {
        self.panel_lost_after
            .is_some_and(|n| self.scrolls.lock().unwrap().len() > n)
    }

    pub fn position(&self) -> usize {
        *self.position.lock().unwrap()
    }

    pub fn scroll_log(&self) -> Vec<i64> {
        self.scrolls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ViewDriver for ScriptedView {
    type Node = FakeNode;

    async fn query_entries(&self) -> Result<Vec<FakeNode>, DriverError> {
        let pos = self.position();
        Ok(self.frames[pos].clone())
    }

    async fn read_text(&self, node: &FakeNode) -> Result<NodeText, DriverError> {
        match node {
            FakeNode::Row(text) => Ok(text.clone()),
            FakeNode::Detached => Err(DriverError::Unreadable("node detached".into())),
        }
    }

    async fn scroll_region(&self, delta_px: i64) -> Result<(), DriverError> {
        self.scrolls.lock().unwrap().push(delta_px);
        if self.panel_lost() {
            return Err(DriverError::Command("stale element reference".into()));
        }
        let mut pos = self.position.lock().unwrap();
        if delta_px < 0 {
            *pos = (*pos + 1).min(self.frames.len() - 1);
        } else {
            *pos = pos.saturating_sub(1);
        }
        Ok(())
    }

    async fn focus(&self) -> Result<(), DriverError> {
        self.focus_calls.fetch_add(1, Ordering::SeqCst);
        if self.panel_present && !self.panel_lost() {
            Ok(())
        } else {
            Err(DriverError::PanelNotFound("conversation panel".into()))
        }
    }
}
