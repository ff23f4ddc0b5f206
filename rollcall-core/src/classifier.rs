use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Attendance status carried by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Cancelled,
    Postponed,
    Attended,
}

impl Status {
    /// Option name written to the status store.
    pub fn store_label(self) -> &'static str {
        match self {
            Status::Cancelled => "Gidilmedi",
            Status::Postponed => "Kaldı",
            Status::Attended => "Gidildi",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Message text with every status keyword removed.
    pub subject: String,
    pub status: Option<Status>,
}

// Checked in order; the first hit wins.
const KEYWORDS: [(Status, &[&str]); 3] = [
    (Status::Cancelled, &["iptal"]),
    (Status::Postponed, &["ertelendi", "kaldı"]),
    (Status::Attended, &["gidildi"]),
];

/// Case-insensitive pattern that treats every Turkish `i` variant alike.
fn keyword_pattern(keyword: &str) -> String {
    keyword
        .chars()
        .map(|c| match c {
            'i' | 'ı' => "[iıİI]".to_string(),
            other => regex::escape(&other.to_string()),
        })
        .collect()
}

fn matchers() -> &'static [(Status, Regex)] {
    static MATCHERS: OnceLock<Vec<(Status, Regex)>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        KEYWORDS
            .iter()
            .map(|(status, words)| {
                let alternatives = words.iter().map(|w| keyword_pattern(w)).collect::<Vec<_>>().join("|");
                let re = Regex::new(&format!("(?i)(?:{alternatives})")).expect("keyword pattern is valid");
                (*status, re)
            })
            .collect()
    })
}

/// Split a message into the record name it refers to and its status.
///
/// ```
/// use rollcall_core::classifier::{classify_message, Status};
///
/// let c = classify_message("Ayşe Demir - Gidildi");
/// assert_eq!(c.subject, "Ayşe Demir");
/// assert_eq!(c.status, Some(Status::Attended));
/// ```
pub fn classify_message(text: &str) -> Classification {
    let status = matchers()
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(status, _)| *status);

    let mut subject = text.to_string();
    for (_, re) in matchers() {
        subject = re.replace_all(&subject, " ").into_owned();
    }
    let subject = subject
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | ':' | ',' | '.'))
        .to_string();

    Classification { subject, status }
}
