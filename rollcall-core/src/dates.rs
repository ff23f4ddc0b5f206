//! Date label normalizer.
//!
//! The chat view renders the same calendar day in several spellings
//! (`27.09.2025`, `27/09/2025`, `27.09.2025 Cumartesi`, `BUGÜN`, a bare
//! weekday name for the last week). This module builds the set of spellings
//! accepted for a target day and decides whether a row is a date marker at all.
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::cmp::Ordering;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const TODAY_TOKENS: [&str; 2] = ["bugün", "today"];
const YESTERDAY_TOKENS: [&str; 2] = ["dün", "yesterday"];

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Language of the weekday names appended to (or replacing) numeric dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekdayLocale {
    #[default]
    Turkish,
    English,
}

impl WeekdayLocale {
    pub const ALL: [WeekdayLocale; 2] = [WeekdayLocale::Turkish, WeekdayLocale::English];

    pub fn weekday_name(self, day: Weekday) -> &'static str {
        match self {
            WeekdayLocale::Turkish => match day {
                Weekday::Mon => "pazartesi",
                Weekday::Tue => "salı",
                Weekday::Wed => "çarşamba",
                Weekday::Thu => "perşembe",
                Weekday::Fri => "cuma",
                Weekday::Sat => "cumartesi",
                Weekday::Sun => "pazar",
            },
            WeekdayLocale::English => match day {
                Weekday::Mon => "monday",
                Weekday::Tue => "tuesday",
                Weekday::Wed => "wednesday",
                Weekday::Thu => "thursday",
                Weekday::Fri => "friday",
                Weekday::Sat => "saturday",
                Weekday::Sun => "sunday",
            },
        }
    }
}

/// Result of [`classify`]: whether the text has the shape of a date marker,
/// and its normalized form either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelClass {
    pub is_date_marker: bool,
    pub normalized: String,
}

/// Case-fold, trim and collapse inner whitespace.
///
/// Turkish dotted/dotless `i` are folded together so `SALI` and `Salı`
/// compare equal.
pub fn normalize_label(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\u{307}')
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn marker_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        let weekdays = WeekdayLocale::ALL
            .iter()
            .flat_map(|locale| WEEKDAYS.iter().map(|d| locale.weekday_name(*d)))
            .map(|name| regex::escape(&normalize_label(name)))
            .collect::<Vec<_>>()
            .join("|");
        let tokens = TODAY_TOKENS
            .iter()
            .chain(YESTERDAY_TOKENS.iter())
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r"^(?:\d{{1,2}}[./-]\d{{1,2}}[./-]\d{{2,4}}(?:\s*-?\s*(?:{weekdays}))?|(?:{weekdays})|(?:{tokens}))$"
        );
        Regex::new(&pattern).expect("marker pattern is valid")
    })
}

/// Decide whether `raw` is a date-marker row.
///
/// The whole trimmed text must be the label; a row with extra content is
/// never a marker.
///
/// ```
/// use rollcall_core::dates::classify;
///
/// assert!(classify(" 27.09.2025 ").is_date_marker);
/// assert!(classify("BUGÜN").is_date_marker);
/// assert!(!classify("27.09.2025 toplantı iptal").is_date_marker);
/// ```
pub fn classify(raw: &str) -> LabelClass {
    let normalized = normalize_label(raw);
    LabelClass {
        is_date_marker: marker_shape().is_match(&normalized),
        normalized,
    }
}

/// Every numeric spelling of `date`: `.`, `-` and `/` separators, padded and
/// unpadded day/month, 4- and 2-digit years.
pub fn numeric_spellings(date: NaiveDate) -> Vec<String> {
    let (d, m, y) = (date.day(), date.month(), date.year());
    let days = [format!("{d:02}"), d.to_string()];
    let months = [format!("{m:02}"), m.to_string()];
    let years = [format!("{y:04}"), format!("{:02}", y.rem_euclid(100))];

    let mut out = Vec::new();
    for sep in ['.', '-', '/'] {
        for day in &days {
            for month in &months {
                for year in &years {
                    let s = format!("{day}{sep}{month}{sep}{year}");
                    if !out.contains(&s) {
                        out.push(s);
                    }
                }
            }
        }
    }
    out
}

/// The three zero-padded, 4-digit-year spellings (`27.09.2025`,
/// `27-09-2025`, `27/09/2025`). Safe for substring search in titles, unlike
/// the unpadded forms.
pub fn canonical_spellings(date: NaiveDate) -> [String; 3] {
    let base = date.format("%d.%m.%Y").to_string();
    [base.clone(), base.replace('.', "-"), base.replace('.', "/")]
}

fn numeric_date() -> &'static Regex {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[./-](\d{1,2})[./-](\d{4}|\d{2})\b").expect("numeric date pattern is valid")
    })
}

/// Calendar day a marker label stands for, as rendered on `today`.
///
/// Numeric labels carry their own date (2-digit years are 20xx);
/// today/yesterday tokens and bare weekday names are relative to `today`.
///
/// ```
/// use chrono::NaiveDate;
/// use rollcall_core::dates::marker_date;
///
/// let today = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
/// assert_eq!(marker_date("26.09.25 Cuma", today), NaiveDate::from_ymd_opt(2025, 9, 26));
/// assert_eq!(marker_date("DÜN", today), NaiveDate::from_ymd_opt(2025, 9, 30));
/// assert_eq!(marker_date("Cumartesi", today), NaiveDate::from_ymd_opt(2025, 9, 27));
/// ```
pub fn marker_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let label = normalize_label(raw);
    if let Some(caps) = numeric_date().captures(&label) {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let mut year: i32 = caps[3].parse().ok()?;
        if caps[3].len() == 2 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if TODAY_TOKENS.contains(&label.as_str()) {
        return Some(today);
    }
    if YESTERDAY_TOKENS.contains(&label.as_str()) {
        return today.pred_opt();
    }
    // Chat clients show a bare weekday for the rest of the last week.
    (2..=6)
        .filter_map(|age| today.checked_sub_days(Days::new(age)))
        .find(|day| {
            WeekdayLocale::ALL
                .iter()
                .any(|locale| normalize_label(locale.weekday_name(day.weekday())) == label)
        })
}

/// Where a date marker falls relative to the target range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOrder {
    /// One of the accepted spellings, or another spelling of the target day.
    Opening,
    /// An earlier day: history above the range.
    Older,
    /// A later day: the range is over.
    Later,
    /// No date could be resolved (weekday ranges, unknown spellings).
    Unknown,
}

/// Set of normalized labels accepted as the opening boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedLabels {
    labels: HashSet<String>,
    description: String,
    /// Target day and the day labels were rendered on, when known.
    anchor: Option<(NaiveDate, NaiveDate)>,
}

impl AcceptedLabels {
    /// Labels for a calendar day, evaluated against `today`.
    ///
    /// Today/yesterday tokens are only accepted when `target` actually is
    /// today/yesterday; a bare weekday name only for the rest of the last week.
    pub fn for_date(target: NaiveDate, today: NaiveDate, locale: WeekdayLocale) -> Self {
        let weekday = locale.weekday_name(target.weekday());
        let mut labels: Vec<String> = Vec::new();
        for numeric in numeric_spellings(target) {
            labels.push(format!("{numeric} {weekday}"));
            labels.push(format!("{numeric} - {weekday}"));
            labels.push(numeric);
        }

        if target == today {
            labels.extend(TODAY_TOKENS.iter().map(|t| t.to_string()));
        }
        if today.pred_opt() == Some(target) {
            labels.extend(YESTERDAY_TOKENS.iter().map(|t| t.to_string()));
        }
        let age_days = (today - target).num_days();
        if (2..=6).contains(&age_days) {
            labels.push(weekday.to_string());
        }

        Self {
            anchor: Some((target, today)),
            ..Self::from_labels(labels, target.format("%d.%m.%Y").to_string())
        }
    }

    /// Labels for the weekday-range variant: the bare weekday name.
    pub fn for_weekday(day: Weekday, locale: WeekdayLocale) -> Self {
        let name = locale.weekday_name(day);
        Self::from_labels([name.to_string()], name.to_string())
    }

    pub fn from_labels<I, S>(labels: I, description: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|l| normalize_label(l.as_ref()))
                .filter(|l| !l.is_empty())
                .collect(),
            description: description.into(),
            anchor: None,
        }
    }

    /// Membership test on an already-normalized label.
    pub fn contains(&self, normalized: &str) -> bool {
        self.labels.contains(normalized)
    }

    /// Normalize `raw` and test membership.
    pub fn matches(&self, raw: &str) -> bool {
        self.contains(&normalize_label(raw))
    }

    /// Place the marker `raw` relative to the target day.
    ///
    /// Without a target date (weekday ranges, explicit label sets) anything
    /// outside the accepted set is [`MarkerOrder::Unknown`].
    pub fn order(&self, raw: &str) -> MarkerOrder {
        let normalized = normalize_label(raw);
        if self.contains(&normalized) {
            return MarkerOrder::Opening;
        }
        let Some((target, today)) = self.anchor else {
            return MarkerOrder::Unknown;
        };
        match marker_date(&normalized, today).map(|day| day.cmp(&target)) {
            Some(Ordering::Less) => MarkerOrder::Older,
            Some(Ordering::Equal) => MarkerOrder::Opening,
            Some(Ordering::Greater) => MarkerOrder::Later,
            None => MarkerOrder::Unknown,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
