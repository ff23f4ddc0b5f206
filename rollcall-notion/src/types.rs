//! Subset of the Notion REST payloads the status store reads and writes.
use std::collections::HashMap;
use std::fmt;

use rollcall_core::Status;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a paginated list endpoint.
#[derive(Debug, Deserialize)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Titled {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub child_page: Option<Titled>,
    #[serde(default)]
    pub child_database: Option<Titled>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyValue {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: Vec<RichText>,
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

impl PropertyValue {
    /// Concatenated plain text of a `title` or `rich_text` property.
    pub fn text(&self) -> Option<String> {
        let parts = match self.kind.as_str() {
            "title" => &self.title,
            "rich_text" => &self.rich_text,
            _ => return None,
        };
        Some(parts.iter().map(|t| t.plain_text.as_str()).collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub properties: HashMap<String, PropertySchema>,
}

/// Column names recognised as the status column, compared case-insensitively.
pub const STATUS_COLUMNS: [&str; 5] = ["durum", "status", "state", "gidildi", "gidildi / gidilmedi"];

impl Database {
    /// The status column's name and type, if the schema has one.
    pub fn status_column(&self) -> Option<(&str, &str)> {
        let mut names: Vec<&String> = self.properties.keys().collect();
        names.sort();
        names
            .into_iter()
            .find(|name| STATUS_COLUMNS.contains(&name.trim().to_lowercase().as_str()))
            .map(|name| (name.as_str(), self.properties[name].kind.as_str()))
    }
}

/// `properties` body for a page update, shaped by the column type.
/// `None` for column types that cannot carry a status.
pub fn status_properties(column: &str, kind: &str, status: Status) -> Option<Value> {
    let label = status.store_label();
    let value = match kind {
        "status" => json!({ "status": { "name": label } }),
        "select" => json!({ "select": { "name": label } }),
        "multi_select" => json!({ "multi_select": [{ "name": label }] }),
        "rich_text" => json!({ "rich_text": [{ "text": { "content": label } }] }),
        "checkbox" => json!({ "checkbox": status == Status::Attended }),
        _ => return None,
    };
    let mut properties = Map::new();
    properties.insert(column.to_string(), value);
    Some(json!({ "properties": properties }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_follows_column_type() {
        assert_eq!(
            status_properties("Durum", "select", Status::Cancelled).unwrap(),
            json!({ "properties": { "Durum": { "select": { "name": "Gidilmedi" } } } })
        );
        assert_eq!(
            status_properties("Gidildi", "checkbox", Status::Postponed).unwrap(),
            json!({ "properties": { "Gidildi": { "checkbox": false } } })
        );
        assert_eq!(
            status_properties("Gidildi", "checkbox", Status::Attended).unwrap()["properties"]["Gidildi"]["checkbox"],
            true
        );
        assert!(status_properties("Durum", "number", Status::Attended).is_none());
    }

    #[test]
    fn status_column_is_found_case_insensitively() {
        let db: Database = serde_json::from_value(json!({
            "properties": {
                "İsim": { "type": "title" },
                "DURUM": { "type": "status" }
            }
        }))
        .unwrap();
        assert_eq!(db.status_column(), Some(("DURUM", "status")));

        let none: Database = serde_json::from_value(json!({
            "properties": { "İsim": { "type": "title" } }
        }))
        .unwrap();
        assert_eq!(none.status_column(), None);
    }

    #[test]
    fn title_text_is_concatenated() {
        let value: PropertyValue = serde_json::from_value(json!({
            "type": "title",
            "title": [{ "plain_text": "Ayşe " }, { "plain_text": "Demir" }]
        }))
        .unwrap();
        assert_eq!(value.text().as_deref(), Some("Ayşe Demir"));
    }
}
