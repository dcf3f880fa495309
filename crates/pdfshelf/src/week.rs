//! Week bucket identifiers.
//!
//! Weeks start on Monday. New documents always carry the canonical
//! `yyyy-MM-dd` form of their Monday; the legacy free-text forms
//! (`Week N`, `Current Week`, `Next Week`, `Last Week`) are only parsed
//! when reading older metadata.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde::Serialize;

static RE_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static RE_NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Week (\d+)$").unwrap());

pub const CANONICAL_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// A parsed week identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeekId {
    /// `yyyy-MM-dd`, normally the Monday of the week.
    Starting(NaiveDate),
    /// Legacy `Week N`, 1..=53, relative to a reference year.
    Numbered(u32),
    Current,
    Next,
    Last,
    Unrecognized(String),
}

impl WeekId {
    pub fn parse(raw: &str) -> Self {
        if RE_ISO_DATE.is_match(raw) {
            if let Ok(date) = NaiveDate::parse_from_str(raw, CANONICAL_FORMAT) {
                return WeekId::Starting(date);
            }
            return WeekId::Unrecognized(raw.to_string());
        }

        if let Some(caps) = RE_NUMBERED.captures(raw) {
            return match caps[1].parse::<u32>() {
                Ok(n) if (1..=53).contains(&n) => WeekId::Numbered(n),
                _ => WeekId::Unrecognized(raw.to_string()),
            };
        }

        match raw {
            "Current Week" => WeekId::Current,
            "Next Week" => WeekId::Next,
            "Last Week" => WeekId::Last,
            other => WeekId::Unrecognized(other.to_string()),
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, WeekId::Starting(_))
    }

    /// Resolves the Monday..Sunday range of this week.
    ///
    /// `reference` supplies the year for `Week N` and "today" for the
    /// relative forms. Returns `None` for unrecognized text.
    pub fn range(&self, reference: NaiveDate) -> Option<WeekRange> {
        let start = match self {
            WeekId::Starting(date) => monday_of(*date),
            WeekId::Numbered(n) => {
                first_monday_of_year(reference.year())? + Duration::weeks(i64::from(*n) - 1)
            }
            WeekId::Current => monday_of(reference),
            WeekId::Next => monday_of(reference + Duration::weeks(1)),
            WeekId::Last => monday_of(reference - Duration::weeks(1)),
            WeekId::Unrecognized(_) => return None,
        };
        Some(WeekRange::starting(start))
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekId::Starting(date) => write!(f, "{}", date.format(CANONICAL_FORMAT)),
            WeekId::Numbered(n) => write!(f, "Week {}", n),
            WeekId::Current => f.write_str("Current Week"),
            WeekId::Next => f.write_str("Next Week"),
            WeekId::Last => f.write_str("Last Week"),
            WeekId::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// An inclusive Monday..Sunday date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn starting(monday: NaiveDate) -> Self {
        Self {
            start: monday,
            end: monday + Duration::days(6),
        }
    }

    /// The canonical identifier of this week.
    pub fn canonical(&self) -> String {
        self.start.format(CANONICAL_FORMAT).to_string()
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(DISPLAY_FORMAT),
            self.end.format(DISPLAY_FORMAT)
        )
    }
}

pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// First Monday falling on or after January 1st.
fn first_monday_of_year(year: i32) -> Option<NaiveDate> {
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let monday = monday_of(jan_first);
    if monday < jan_first {
        Some(monday + Duration::weeks(1))
    } else {
        Some(monday)
    }
}

/// Formats a week as `dd/MM/yyyy - dd/MM/yyyy`, falling back to the raw
/// text when it cannot be resolved.
pub fn display_range(raw: &str, reference: NaiveDate) -> String {
    match WeekId::parse(raw).range(reference) {
        Some(range) => range.to_string(),
        None => raw.to_string(),
    }
}

/// Converts any recognized week identifier into the canonical Monday date.
/// Legacy forms are resolved against `today`.
pub fn canonicalize(raw: &str, today: NaiveDate) -> Option<String> {
    WeekId::parse(raw.trim())
        .range(today)
        .map(|range| range.canonical())
}

/// A selectable week for the upload form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekOption {
    pub value: String,
    pub label: String,
    #[serde(skip)]
    pub is_current: bool,
}

/// The weeks offered when uploading: two before through two after the
/// current one.
pub fn upload_week_options(today: NaiveDate) -> Vec<WeekOption> {
    (-2i64..=2)
        .map(|offset| {
            let range = WeekRange::starting(monday_of(today + Duration::weeks(offset)));
            WeekOption {
                value: range.canonical(),
                label: range.to_string(),
                is_current: offset == 0,
            }
        })
        .collect()
}
