//! The document record and its payment status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::week::{WeekId, WeekRange};

/// Download gate of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Paid,
    Due,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Paid => "paid",
            DocumentStatus::Due => "due",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DocumentStatus::Paid => DocumentStatus::Due,
            DocumentStatus::Due => DocumentStatus::Paid,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown document status '{0}', expected 'paid' or 'due'")]
pub struct UnknownStatus(pub String);

impl FromStr for DocumentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(DocumentStatus::Paid),
            "due" => Ok(DocumentStatus::Due),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Metadata record for one uploaded PDF.
///
/// Field order matches the persisted JSON layout so that records written by
/// earlier deployments survive a rewrite unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    /// On-disk name inside the upload directory, `{id}-{sanitized name}`.
    pub file_name: String,
    pub original_name: String,
    /// Canonical `yyyy-MM-dd` Monday, or a legacy free-text week.
    pub week: String,
    pub status: DocumentStatus,
    #[serde(with = "iso_millis")]
    pub upload_date: DateTime<Utc>,
    /// Public path the binary is served under.
    pub path: String,
    pub size: u64,
    /// Absent in records written before the field existed; kept absent on
    /// rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_persons: Option<Vec<String>>,
}

impl Document {
    pub fn is_paid(&self) -> bool {
        self.status == DocumentStatus::Paid
    }

    pub fn persons(&self) -> &[String] {
        self.related_persons.as_deref().unwrap_or_default()
    }

    pub fn week_id(&self) -> WeekId {
        WeekId::parse(&self.week)
    }

    /// Resolves the document's week bucket. `Week N` entries use the upload
    /// year, relative entries use `today`.
    pub fn week_range(&self, today: NaiveDate) -> Option<WeekRange> {
        let week = self.week_id();
        let reference = match week {
            WeekId::Numbered(_) => self.upload_date.date_naive(),
            _ => today,
        };
        week.range(reference)
    }
}

/// Truncates a timestamp to the millisecond precision used on disk.
pub fn upload_timestamp(now: DateTime<Utc>) -> DateTime<Utc> {
    let millis = now.nanosecond() / 1_000_000 * 1_000_000;
    now.with_nanosecond(millis).unwrap_or(now)
}

/// Splits a comma-separated names field, trimming entries and dropping
/// empty ones.
pub fn parse_related_persons(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

mod iso_millis {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
