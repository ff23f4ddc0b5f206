use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rollcall_core::Status;
use rollcall_core::dates::canonical_spellings;
use rollcall_http::{Auth, HttpClient, RequestOpts};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::StatusStore;
use crate::types::{Block, Database, DatabaseId, Page, Paginated, RecordId, status_properties};

pub const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Notion REST client scoped to what attendance tracking needs.
pub struct NotionClient {
    http: HttpClient,
    token: String,
}

/// Index of the first day whose spellings appear in `title`.
fn mentioned_day(title: &str, days: &[[String; 3]]) -> Option<usize> {
    let title = title.trim().to_lowercase();
    days.iter()
        .position(|spellings| spellings.iter().any(|s| title.contains(s.as_str())))
}

impl NotionClient {
    pub fn new(token: impl Into<String>, api_base: &str) -> Result<Self, StoreError> {
        let http = HttpClient::new(api_base)?
            .with_timeout(REQUEST_TIMEOUT)
            .with_retries(3)
            .with_default_header("notion-version", NOTION_VERSION)?;
        debug!(target: "notion", base = %http.base(), "notion.client.ready");
        Ok(Self {
            http,
            token: token.into(),
        })
    }

    fn opts(&self) -> RequestOpts<'_> {
        RequestOpts {
            auth: Some(Auth::Bearer(&self.token)),
            ..Default::default()
        }
    }

    /// All child blocks of a page, following pagination.
    pub async fn list_children(&self, block_id: &str) -> Result<Vec<Block>, StoreError> {
        let path = format!("blocks/{block_id}/children");
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut query = vec![("page_size", Cow::Owned(PAGE_SIZE.to_string()))];
            if let Some(next) = cursor.take() {
                query.push(("start_cursor", Cow::Owned(next)));
            }
            let page: Paginated<Block> = self
                .http
                .get_json(&path, RequestOpts { query: Some(query), ..self.opts() })
                .await?;
            blocks.extend(page.results);
            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        debug!(target: "notion", block_id, count = blocks.len(), "notion.children.listed");
        Ok(blocks)
    }

    /// All rows of a database, following pagination.
    pub async fn query_database(&self, db: &DatabaseId) -> Result<Vec<Page>, StoreError> {
        let path = format!("databases/{db}/query");
        let mut rows = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut body = json!({ "page_size": PAGE_SIZE });
            if let Some(next) = cursor.take() {
                body["start_cursor"] = Value::String(next);
            }
            let page: Paginated<Page> = self.http.post_json(&path, &body, self.opts()).await?;
            rows.extend(page.results);
            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(rows)
    }

    pub async fn retrieve_database(&self, db: &DatabaseId) -> Result<Database, StoreError> {
        Ok(self.http.get_json(&format!("databases/{db}"), self.opts()).await?)
    }

    /// Every attendance database for `dates` under `parent`, ordered by the
    /// position of the matching date in `dates`.
    ///
    /// A child page whose title mentions one of the dates contributes its
    /// inline databases; a child database whose title mentions one is
    /// returned directly.
    pub async fn databases_for_dates(&self, parent: &str, dates: &[NaiveDate]) -> Result<Vec<DatabaseId>, StoreError> {
        let days: Vec<[String; 3]> = dates.iter().map(|d| canonical_spellings(*d)).collect();
        let mut found: Vec<(usize, DatabaseId)> = Vec::new();
        for block in self.list_children(parent).await? {
            match (block.kind.as_str(), &block.child_page, &block.child_database) {
                ("child_page", Some(page), _) => {
                    let Some(day) = mentioned_day(&page.title, &days) else {
                        continue;
                    };
                    let before = found.len();
                    for child in self.list_children(&block.id).await? {
                        if child.kind == "child_database" {
                            info!(target: "notion", title = %page.title, database = %child.id, "notion.database.resolved");
                            found.push((day, DatabaseId(child.id)));
                        }
                    }
                    if found.len() == before {
                        debug!(target: "notion", title = %page.title, "notion.page.without_database");
                    }
                }
                ("child_database", _, Some(database)) => {
                    if let Some(day) = mentioned_day(&database.title, &days) {
                        info!(target: "notion", title = %database.title, database = %block.id, "notion.database.resolved");
                        found.push((day, DatabaseId(block.id.clone())));
                    }
                }
                _ => {}
            }
        }
        found.sort_by_key(|(day, _)| *day);
        let mut ordered: Vec<DatabaseId> = Vec::with_capacity(found.len());
        for (_, db) in found {
            if !ordered.contains(&db) {
                ordered.push(db);
            }
        }
        Ok(ordered)
    }
}

#[async_trait]
impl StatusStore for NotionClient {
    async fn find_record_by_name(&self, db: &DatabaseId, name: &str) -> Result<Option<RecordId>, StoreError> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }
        for row in self.query_database(db).await? {
            let hit = row
                .properties
                .values()
                .filter_map(|p| p.text())
                .any(|text| text.to_lowercase().contains(&needle));
            if hit {
                info!(target: "notion", name, record = %row.id, "notion.record.matched");
                return Ok(Some(RecordId(row.id)));
            }
        }
        Ok(None)
    }

    async fn set_status(&self, db: &DatabaseId, record: &RecordId, status: Status) -> Result<bool, StoreError> {
        let schema = self.retrieve_database(db).await?;
        let Some((column, kind)) = schema.status_column() else {
            warn!(target: "notion", database = %db, "notion.status.no_column");
            return Ok(false);
        };
        let Some(body) = status_properties(column, kind, status) else {
            warn!(target: "notion", database = %db, column, kind, "notion.status.unsupported_column");
            return Ok(false);
        };

        let _: Value = self
            .http
            .patch_json(&format!("pages/{record}"), &body, self.opts())
            .await?;
        info!(
            target: "notion",
            record = %record,
            column,
            value = status.store_label(),
            "notion.status.updated"
        );
        Ok(true)
    }
}
