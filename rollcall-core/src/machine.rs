//! Boundary state machine.
//!
//! ```text
//! Searching --(accepted marker)--> Collecting --(any other marker)--> Done
//!     |                                 |
//!     +------(budget exhausted)---------+--> Exhausted
//! ```
//!
//! `Done` and `Exhausted` are terminal. Content only reaches the output while
//! collecting, and once a closing marker is seen nothing more is accepted.
//! Only a later day closes the range; markers for earlier days mean the
//! window shows history above the range, and their content is skipped.
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collector::DedupCollector;
use crate::dates::{AcceptedLabels, MarkerOrder};
use crate::entry::{ContentEntry, EntryRole, RawEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Searching,
    Collecting,
    Done,
    Exhausted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Exhausted)
    }
}

/// Outcome of a bounded extraction.
///
/// `found == false` implies `entries` is empty. `found && !complete` is a
/// partial range: the closing marker was never seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeResult {
    pub found: bool,
    pub complete: bool,
    pub entries: Vec<String>,
    pub steps: usize,
}

impl RangeResult {
    pub fn not_found(steps: usize) -> Self {
        Self {
            found: false,
            complete: false,
            entries: Vec::new(),
            steps,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.found && !self.complete
    }
}

pub struct BoundaryMachine {
    phase: Phase,
    opened: bool,
    /// Set while walking rows of an earlier day.
    in_older_history: bool,
    accepted: AcceptedLabels,
    collector: DedupCollector,
}

impl BoundaryMachine {
    pub fn new(accepted: AcceptedLabels) -> Self {
        Self {
            phase: Phase::Searching,
            opened: false,
            in_older_history: false,
            accepted,
            collector: DedupCollector::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn collected(&self) -> &DedupCollector {
        &self.collector
    }

    /// Advance on one entry. Ignored once terminal.
    pub fn feed(&mut self, entry: &RawEntry) -> Phase {
        match (self.phase, entry.role) {
            (Phase::Searching, EntryRole::Marker) => {
                if self.accepted.order(&entry.text) == MarkerOrder::Opening {
                    info!(target: "extract", label = %entry.text, "extract.boundary.opened");
                    self.phase = Phase::Collecting;
                    self.opened = true;
                    self.in_older_history = false;
                }
            }
            (Phase::Collecting, EntryRole::Marker) => match self.accepted.order(&entry.text) {
                // A re-rendered copy of the opening marker is not a boundary.
                MarkerOrder::Opening => self.in_older_history = false,
                MarkerOrder::Older => {
                    if !self.in_older_history {
                        debug!(target: "extract", label = %entry.text, "extract.history.older");
                    }
                    self.in_older_history = true;
                }
                MarkerOrder::Later | MarkerOrder::Unknown => {
                    info!(
                        target: "extract",
                        label = %entry.text,
                        collected = self.collector.len(),
                        "extract.boundary.closed"
                    );
                    self.phase = Phase::Done;
                }
            },
            (Phase::Collecting, EntryRole::Content) if !self.in_older_history => {
                if let Some(content) = ContentEntry::from_display(&entry.text) {
                    self.collector.offer(content);
                }
            }
            _ => {}
        }
        self.phase
    }

    /// Feed a snapshot in order, stopping at the closing marker.
    ///
    /// While collecting, a fresh snapshot also renders the older history
    /// above the range. When it shows the opening marker again, processing
    /// resumes right after it. When the opening marker has already scrolled
    /// out, rows above the first marker belong to an earlier day if that
    /// marker is an earlier day.
    pub fn consume(&mut self, entries: &[RawEntry]) -> Phase {
        let mut start = 0;
        if self.phase == Phase::Collecting {
            let markers = entries.iter().enumerate().filter(|(_, e)| e.role == EntryRole::Marker);
            let mut first = None;
            for (i, entry) in markers {
                let order = self.accepted.order(&entry.text);
                first.get_or_insert(order);
                if order == MarkerOrder::Opening {
                    start = i + 1;
                    break;
                }
            }
            self.in_older_history = start == 0 && first == Some(MarkerOrder::Older);
        }
        for entry in &entries[start..] {
            if self.feed(entry).is_terminal() {
                break;
            }
        }
        self.phase
    }

    /// The step budget ran out. Returns the previous phase.
    pub fn exhaust(&mut self) -> Phase {
        let previous = self.phase;
        if !previous.is_terminal() {
            self.phase = Phase::Exhausted;
        }
        previous
    }

    /// Close out the run.
    pub fn finish(mut self, steps: usize) -> RangeResult {
        self.exhaust();
        let found = self.opened;
        let complete = self.phase == Phase::Done;

        if !found {
            info!(target: "extract", range = self.accepted.description(), steps, "extract.range.not_found");
            return RangeResult::not_found(steps);
        }
        if !complete {
            warn!(
                target: "extract",
                range = self.accepted.description(),
                steps,
                collected = self.collector.len(),
                "extract.range.partial"
            );
        }
        RangeResult {
            found,
            complete,
            entries: self
                .collector
                .into_entries()
                .into_iter()
                .map(|e| e.display_text)
                .collect(),
            steps,
        }
    }
}
