//! Notion-backed status store and the updater that feeds it.
pub mod client;
pub mod error;
pub mod store;
pub mod types;
pub mod updater;

pub use client::{NOTION_VERSION, NotionClient};
pub use error::StoreError;
pub use store::StatusStore;
pub use types::{DatabaseId, RecordId};
pub use updater::{StatusUpdater, UpdateOutcome};
