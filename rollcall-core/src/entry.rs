use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::dates;

/// Role assigned to a visible row by the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    Marker,
    Content,
}

/// One row as seen in a single snapshot. Not stable across snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub role: EntryRole,
    pub text: String,
}

impl RawEntry {
    pub fn marker(text: impl Into<String>) -> Self {
        Self {
            role: EntryRole::Marker,
            text: text.into(),
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self {
            role: EntryRole::Content,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMarker {
    pub raw_label: String,
    pub normalized_label: String,
}

impl DateMarker {
    /// `None` when `raw` does not have the shape of a date label.
    pub fn parse(raw: &str) -> Option<Self> {
        let class = dates::classify(raw);
        class.is_date_marker.then(|| Self {
            raw_label: raw.trim().to_string(),
            normalized_label: class.normalized,
        })
    }
}

/// A content row that survived cleanup, with the key used for dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentEntry {
    pub dedup_key: String,
    pub display_text: String,
}

impl ContentEntry {
    /// Build from a row's display text. Returns `None` when nothing but
    /// whitespace, quotes or a bare timestamp remains.
    pub fn from_display(text: &str) -> Option<Self> {
        let key = dedup_key(text);
        if key.is_empty() {
            return None;
        }
        Some(Self {
            dedup_key: key,
            display_text: text.trim().to_string(),
        })
    }
}

const QUOTES: &[char] = &['"', '\'', '“', '”', '‘', '’', '«', '»'];

fn timestamp_only() -> &'static Regex {
    static TS: OnceLock<Regex> = OnceLock::new();
    TS.get_or_init(|| {
        Regex::new(r"(?i)^\s*\d{1,2}:\d{2}\s*(?:am|pm|öö|ös)?\s*$").expect("timestamp pattern is valid")
    })
}

/// Trim, strip surrounding quote characters, and drop timestamp artifacts.
///
/// ```
/// use rollcall_core::entry::dedup_key;
///
/// assert_eq!(dedup_key("  \"Ayşe gidildi\" "), "Ayşe gidildi");
/// assert_eq!(dedup_key("14:32"), "");
/// ```
pub fn dedup_key(text: &str) -> String {
    let stripped = text.trim().trim_matches(QUOTES).trim();
    if timestamp_only().is_match(stripped) {
        return String::new();
    }
    stripped.to_string()
}
