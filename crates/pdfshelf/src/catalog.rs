//! Read-side queries over a listed collection: admin filters, user search,
//! week filter options and name lookups.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentStatus};
use crate::week::WeekId;

/// Separator between a legacy week text and its upload year in filter keys.
const YEAR_SEPARATOR: &str = "::";

/// Value that selects every week.
pub const ALL_WEEKS: &str = "all";

/// A parsed week filter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeekFilter {
    /// `yyyy-MM-dd`, compared verbatim against the stored week.
    Canonical(String),
    /// `Week N::YYYY`: the legacy text plus the upload year.
    InYear { week: String, year: i32 },
    /// Any other stored text, including the relative forms.
    Text(String),
}

impl WeekFilter {
    /// Parses a filter key. `all` and blank keys select nothing to filter.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        if key.is_empty() || key == ALL_WEEKS {
            return None;
        }

        if let WeekId::Starting(_) = WeekId::parse(key) {
            return Some(WeekFilter::Canonical(key.to_string()));
        }

        if let Some((week, year)) = key.split_once(YEAR_SEPARATOR) {
            if let Ok(year) = year.parse::<i32>() {
                return Some(WeekFilter::InYear {
                    week: week.to_string(),
                    year,
                });
            }
        }

        Some(WeekFilter::Text(key.to_string()))
    }

    /// Returns the key this filter was parsed from.
    pub fn key(&self) -> String {
        match self {
            WeekFilter::Canonical(date) => date.clone(),
            WeekFilter::InYear { week, year } => format!("{}{}{}", week, YEAR_SEPARATOR, year),
            WeekFilter::Text(text) => text.clone(),
        }
    }

    pub fn matches(&self, doc: &Document, today: NaiveDate) -> bool {
        match self {
            WeekFilter::Canonical(date) => doc.week == *date,
            WeekFilter::InYear { week, year } => {
                doc.week == *week && doc.upload_date.year() == *year
            }
            WeekFilter::Text(text) => {
                if doc.week == *text {
                    return true;
                }
                // A relative filter also selects canonical documents of the
                // week it currently points at.
                let filter_week = WeekId::parse(text);
                let relative = matches!(filter_week, WeekId::Current | WeekId::Next | WeekId::Last);
                if !relative || !doc.week_id().is_canonical() {
                    return false;
                }
                filter_week
                    .range(today)
                    .is_some_and(|range| range.canonical() == doc.week)
            }
        }
    }
}

/// The filter key a document is listed under.
pub fn week_filter_key(doc: &Document) -> String {
    match doc.week_id() {
        WeekId::Numbered(_) => format!(
            "{}{}{}",
            doc.week,
            YEAR_SEPARATOR,
            doc.upload_date.year()
        ),
        _ => doc.week.clone(),
    }
}

/// Admin view criteria. Every present criterion must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFilter {
    /// Case-insensitive substring of the original name.
    #[serde(default)]
    pub name: Option<String>,
    /// A week filter key, see [`WeekFilter::parse`].
    #[serde(default)]
    pub week: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    /// Case-insensitive substring of any related person.
    #[serde(default)]
    pub related_person: Option<String>,
}

impl DocumentFilter {
    pub fn matches(&self, doc: &Document, today: NaiveDate) -> bool {
        if let Some(name) = non_blank(&self.name) {
            if !contains_ignore_case(&doc.original_name, name) {
                return false;
            }
        }

        if let Some(status) = self.status {
            if doc.status != status {
                return false;
            }
        }

        if let Some(person) = non_blank(&self.related_person) {
            if !doc
                .persons()
                .iter()
                .any(|p| contains_ignore_case(p, person))
            {
                return false;
            }
        }

        match self.week.as_deref().and_then(WeekFilter::parse) {
            Some(filter) => filter.matches(doc, today),
            None => true,
        }
    }

    pub fn apply<'a>(&self, docs: &'a [Document], today: NaiveDate) -> Vec<&'a Document> {
        docs.iter().filter(|d| self.matches(d, today)).collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// True when `term` occurs, ignoring case, in the original name, the stored
/// name or any related person.
pub fn matches_search(doc: &Document, term: &str) -> bool {
    let term = term.trim();
    contains_ignore_case(&doc.original_name, term)
        || contains_ignore_case(&doc.file_name, term)
        || doc
            .persons()
            .iter()
            .any(|p| contains_ignore_case(p, term))
}

/// User view search. An empty term matches every document.
pub fn search<'a>(docs: &'a [Document], term: &str) -> Vec<&'a Document> {
    docs.iter().filter(|d| matches_search(d, term)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest week first (user view).
    Ascending,
    /// Newest week first (admin view).
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekFilterOption {
    pub value: String,
    pub label: String,
    pub start_date: NaiveDate,
}

/// Distinct week filter options for `docs`, labelled with their date range.
pub fn week_filter_options(
    docs: &[Document],
    today: NaiveDate,
    order: SortOrder,
) -> Vec<WeekFilterOption> {
    let mut seen = HashSet::new();
    let mut options = Vec::new();

    for doc in docs {
        let value = week_filter_key(doc);
        if !seen.insert(value.clone()) {
            continue;
        }

        let (label, start_date) = match doc.week_range(today) {
            Some(range) => (range.to_string(), range.start),
            None => (doc.week.clone(), doc.upload_date.date_naive()),
        };
        options.push(WeekFilterOption {
            value,
            label,
            start_date,
        });
    }

    options.sort_by(|a, b| match order {
        SortOrder::Ascending => a.start_date.cmp(&b.start_date),
        SortOrder::Descending => b.start_date.cmp(&a.start_date),
    });
    options
}

/// The label shown for a document's week.
pub fn week_label(doc: &Document, today: NaiveDate) -> String {
    doc.week_range(today)
        .map(|range| range.to_string())
        .unwrap_or_else(|| doc.week.clone())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatch {
    #[default]
    Exact,
    IgnoreCase,
}

/// First document whose original or stored name equals `name`.
pub fn find_by_name<'a>(docs: &'a [Document], name: &str, mode: NameMatch) -> Option<&'a Document> {
    let eq = |candidate: &str| match mode {
        NameMatch::Exact => candidate == name,
        NameMatch::IgnoreCase => candidate.to_lowercase() == name.to_lowercase(),
    };
    docs.iter()
        .find(|d| eq(&d.original_name) || eq(&d.file_name))
}

/// Maps suggested names onto documents, dropping names that match nothing.
pub fn resolve_suggestions<'a, S: AsRef<str>>(
    docs: &'a [Document],
    names: &[S],
) -> Vec<&'a Document> {
    names
        .iter()
        .filter_map(|name| find_by_name(docs, name.as_ref(), NameMatch::Exact))
        .collect()
}

pub fn is_downloadable(doc: &Document) -> bool {
    doc.is_paid()
}
