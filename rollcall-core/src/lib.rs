//! Bounded-range extraction over a virtualized, backward-scrolling chat view.
//!
//! The view mixes date markers and content rows. [`RangeExtractor`] scrolls
//! back until the marker for a target day appears, collects every content row
//! up to the next marker, and returns them once each in first-seen order.
//! The view itself is reached only through the [`ViewDriver`] trait.
pub mod classifier;
pub mod collector;
pub mod dates;
pub mod driver;
pub mod entry;
pub mod error;
pub mod extract;
pub mod machine;
pub mod observer;
pub mod scroll;

pub use classifier::{Classification, Status, classify_message};
pub use collector::DedupCollector;
pub use dates::{AcceptedLabels, MarkerOrder, WeekdayLocale};
pub use driver::{DriverError, NodeText, ViewDriver};
pub use entry::{ContentEntry, DateMarker, EntryRole, RawEntry};
pub use error::ExtractError;
pub use extract::{ExtractSettings, Extraction, RangeExtractor};
pub use machine::{BoundaryMachine, Phase, RangeResult};
pub use observer::{ListObserver, Snapshot};
pub use scroll::{ScrollController, ScrollSettings};
