use std::sync::Arc;

use chrono::{Local, NaiveDate, Weekday};
use tracing::{info, warn};

use crate::collector::DedupCollector;
use crate::dates::{AcceptedLabels, WeekdayLocale};
use crate::driver::ViewDriver;
use crate::entry::{ContentEntry, EntryRole};
use crate::error::ExtractError;
use crate::machine::{BoundaryMachine, RangeResult};
use crate::observer::ListObserver;
use crate::scroll::{ScrollController, ScrollSettings};

#[derive(Debug, Clone, Default)]
pub struct ExtractSettings {
    pub scroll: ScrollSettings,
    pub locale: WeekdayLocale,
}

/// What the caller gets from [`RangeExtractor::extract_range_or_recent`].
///
/// The fallback is tagged so it is never mistaken for a bounded range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Range(RangeResult),
    RecentFallback(Vec<String>),
}

impl Extraction {
    pub fn entries(&self) -> &[String] {
        match self {
            Extraction::Range(r) => &r.entries,
            Extraction::RecentFallback(entries) => entries,
        }
    }
}

/// Owns the view for the duration of each call; `&mut self` keeps two
/// extractions from interleaving on the same scroll region.
pub struct RangeExtractor<D> {
    observer: ListObserver<D>,
    scroller: ScrollController<D>,
    settings: ExtractSettings,
    today: Option<NaiveDate>,
}

impl<D: ViewDriver> RangeExtractor<D> {
    pub fn new(driver: Arc<D>, settings: ExtractSettings) -> Self {
        Self {
            observer: ListObserver::new(Arc::clone(&driver)),
            scroller: ScrollController::new(driver, settings.scroll.poll_interval),
            settings,
            today: None,
        }
    }

    /// Pin the date used as "today" when building accepted labels.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Collect the content between the marker for `target` and the next marker.
    pub async fn extract_range(&mut self, target: NaiveDate, max_steps: usize) -> Result<RangeResult, ExtractError> {
        let accepted = AcceptedLabels::for_date(target, self.today(), self.settings.locale);
        self.extract_bounded(accepted, max_steps).await
    }

    /// Same as [`extract_range`](Self::extract_range), opened by a bare weekday marker.
    pub async fn extract_weekday(&mut self, day: Weekday, max_steps: usize) -> Result<RangeResult, ExtractError> {
        let accepted = AcceptedLabels::for_weekday(day, self.settings.locale);
        self.extract_bounded(accepted, max_steps).await
    }

    pub async fn extract_bounded(
        &mut self,
        accepted: AcceptedLabels,
        max_steps: usize,
    ) -> Result<RangeResult, ExtractError> {
        info!(
            target: "extract",
            range = accepted.description(),
            labels = accepted.len(),
            max_steps,
            "extract.start"
        );
        // Fail fast only before the first step.
        self.scroller.acquire_focus().await?;

        let mut machine = BoundaryMachine::new(accepted);
        let mut steps = 0;
        while steps < max_steps {
            let baseline = self.observer.visible_count().await;
            // Losing the panel mid-run ends the walk; what was collected stands.
            if let Err(e) = self.scroller.step_back(self.settings.scroll.step_px).await {
                warn!(target: "extract", steps, error = %e, "extract.panel.lost");
                break;
            }
            steps += 1;
            self.scroller.settle(baseline, self.settings.scroll.settle_timeout).await;

            let snapshot = self.observer.snapshot().await;
            if machine.consume(&snapshot.entries).is_terminal() {
                break;
            }
        }

        let result = machine.finish(steps);
        info!(
            target: "extract",
            found = result.found,
            complete = result.complete,
            entries = result.entries.len(),
            steps = result.steps,
            "extract.done"
        );
        Ok(result)
    }

    /// Up to `limit` most recent distinct content entries currently rendered,
    /// regardless of markers.
    pub async fn recent_content(&self, limit: usize) -> Vec<String> {
        let snapshot = self.observer.snapshot().await;
        let mut collector = DedupCollector::new();
        for entry in snapshot.entries.iter().filter(|e| e.role == EntryRole::Content) {
            if let Some(content) = ContentEntry::from_display(&entry.text) {
                collector.offer(content);
            }
        }
        let entries = collector.into_entries();
        let skip = entries.len().saturating_sub(limit);
        entries.into_iter().skip(skip).map(|e| e.display_text).collect()
    }

    /// Bounded extraction, falling back to the most recent entries when the
    /// target marker is never found.
    pub async fn extract_range_or_recent(
        &mut self,
        target: NaiveDate,
        max_steps: usize,
        limit: usize,
    ) -> Result<Extraction, ExtractError> {
        let result = self.extract_range(target, max_steps).await?;
        if result.found {
            return Ok(Extraction::Range(result));
        }
        let recent = self.recent_content(limit).await;
        warn!(
            target: "extract",
            target_date = %target.format("%d.%m.%Y"),
            recent = recent.len(),
            "extract.fallback.recent"
        );
        Ok(Extraction::RecentFallback(recent))
    }

    /// Scroll forward `steps` times to bring the newest messages back into view.
    pub async fn resume_live_view(&mut self, steps: usize) -> Result<(), ExtractError> {
        for _ in 0..steps {
            self.scroller.step_forward(self.settings.scroll.step_px).await?;
        }
        info!(target: "extract", steps, "extract.resumed");
        Ok(())
    }
}
