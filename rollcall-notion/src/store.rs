use async_trait::async_trait;
use rollcall_core::Status;

use crate::error::StoreError;
use crate::types::{DatabaseId, RecordId};

/// Persistent store of per-person attendance records.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// First record in `db` whose name equals or contains `name`, ignoring case.
    async fn find_record_by_name(&self, db: &DatabaseId, name: &str) -> Result<Option<RecordId>, StoreError>;

    /// Write `status` to the record. `Ok(false)` when the schema has no
    /// usable status column.
    async fn set_status(&self, db: &DatabaseId, record: &RecordId, status: Status) -> Result<bool, StoreError>;
}
