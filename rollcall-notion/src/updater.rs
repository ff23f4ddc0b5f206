use rollcall_core::{Status, classify_message};
use tracing::{error, info, warn};

use crate::store::StatusStore;
use crate::types::{DatabaseId, RecordId};

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No status keyword in the text; nothing to write.
    NoStatus,
    /// No database holds a record for the subject.
    NoMatch { subject: String },
    Updated {
        database: DatabaseId,
        record: RecordId,
        status: Status,
    },
    /// The store refused the write (no usable status column).
    Rejected { database: DatabaseId, record: RecordId },
    Failed(String),
}

/// Classifies messages and writes their status to the first matching record.
pub struct StatusUpdater<S> {
    store: S,
}

impl<S: StatusStore> StatusUpdater<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Databases are searched in order; only the first one holding the
    /// subject is written.
    pub async fn apply(&self, text: &str, databases: &[DatabaseId]) -> UpdateOutcome {
        let classification = classify_message(text);
        let Some(status) = classification.status else {
            warn!(target: "updater", text, "updater.no_status");
            return UpdateOutcome::NoStatus;
        };
        let subject = classification.subject;

        for db in databases {
            let record = match self.store.find_record_by_name(db, &subject).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    error!(target: "updater", database = %db, subject = %subject, error = %e, "updater.lookup.failed");
                    return UpdateOutcome::Failed(e.to_string());
                }
            };

            return match self.store.set_status(db, &record, status).await {
                Ok(true) => {
                    info!(
                        target: "updater",
                        subject = %subject,
                        status = status.store_label(),
                        record = %record,
                        "updater.updated"
                    );
                    UpdateOutcome::Updated {
                        database: db.clone(),
                        record,
                        status,
                    }
                }
                Ok(false) => {
                    error!(target: "updater", subject = %subject, record = %record, "updater.rejected");
                    UpdateOutcome::Rejected {
                        database: db.clone(),
                        record,
                    }
                }
                Err(e) => {
                    error!(target: "updater", subject = %subject, record = %record, error = %e, "updater.write.failed");
                    UpdateOutcome::Failed(e.to_string())
                }
            };
        }

        warn!(target: "updater", subject = %subject, databases = databases.len(), "updater.no_match");
        UpdateOutcome::NoMatch { subject }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use async_trait::async_trait;
    use rollcall_http::HttpError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        // (database, lowercase name, record)
        rows: Vec<(&'static str, &'static str, &'static str)>,
        accept_writes: bool,
        fail_lookups: bool,
        writes: Mutex<Vec<(String, String, Status)>>,
    }

    #[async_trait]
    impl StatusStore for FakeStore {
        async fn find_record_by_name(&self, db: &DatabaseId, name: &str) -> Result<Option<RecordId>, StoreError> {
            if self.fail_lookups {
                return Err(StoreError::Http(HttpError::Network("connection reset".into())));
            }
            let needle = name.to_lowercase();
            Ok(self
                .rows
                .iter()
                .find(|(d, n, _)| *d == db.0 && n.contains(&needle))
                .map(|(_, _, r)| RecordId(r.to_string())))
        }

        async fn set_status(&self, db: &DatabaseId, record: &RecordId, status: Status) -> Result<bool, StoreError> {
            self.writes
                .lock()
                .unwrap()
                .push((db.0.clone(), record.0.clone(), status));
            Ok(self.accept_writes)
        }
    }

    fn dbs() -> Vec<DatabaseId> {
        vec![DatabaseId("today".into()), DatabaseId("yesterday".into())]
    }

    #[tokio::test]
    async fn first_database_with_the_subject_wins() {
        let updater = StatusUpdater::new(FakeStore {
            rows: vec![("yesterday", "ayşe demir", "r-2"), ("today", "mehmet", "r-1")],
            accept_writes: true,
            ..FakeStore::default()
        });

        let outcome = updater.apply("Ayşe Demir gidildi", &dbs()).await;

        assert_eq!(
            outcome,
            UpdateOutcome::Updated {
                database: DatabaseId("yesterday".into()),
                record: RecordId("r-2".into()),
                status: Status::Attended,
            }
        );
        let writes = updater.store().writes.lock().unwrap().clone();
        assert_eq!(writes, [("yesterday".to_string(), "r-2".to_string(), Status::Attended)]);
    }

    #[tokio::test]
    async fn texts_without_status_touch_nothing() {
        let updater = StatusUpdater::new(FakeStore::default());
        assert_eq!(updater.apply("günaydın", &dbs()).await, UpdateOutcome::NoStatus);
        assert!(updater.store().writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_subject_is_reported() {
        let updater = StatusUpdater::new(FakeStore::default());
        assert_eq!(
            updater.apply("Veli iptal", &dbs()).await,
            UpdateOutcome::NoMatch { subject: "Veli".into() }
        );
    }

    #[tokio::test]
    async fn refused_and_failed_writes_are_distinguished() {
        let refusing = StatusUpdater::new(FakeStore {
            rows: vec![("today", "veli", "r-9")],
            ..FakeStore::default()
        });
        assert!(matches!(
            refusing.apply("Veli kaldı", &dbs()).await,
            UpdateOutcome::Rejected { .. }
        ));

        let broken = StatusUpdater::new(FakeStore {
            fail_lookups: true,
            ..FakeStore::default()
        });
        assert!(matches!(broken.apply("Veli kaldı", &dbs()).await, UpdateOutcome::Failed(_)));
    }
}
