//! Snapshot persistence.
//!
//! One JSON document per source:
//!
//! ```text
//! {
//!   "timestamp": "2026-01-05T09:30:00Z",
//!   "units": {
//!     "<id>": { "title": "...", "hash": "<sha256 hex>", "last_checked": "...",
//!               "content": "...", "url": "..." }
//!   }
//! }
//! ```
//!
//! `content` is only present when content retention is on. Files written by
//! older tools use `sections` or `pages` instead of `units`, naive
//! timestamps, and per-section `api_type` / `section_id` keys; all are
//! accepted, naive timestamps read as UTC.

pub mod local;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::models::{ContentUnit, Fingerprint, Snapshot};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Load the stored snapshot, `None` when nothing has been written yet.
    ///
    /// A file that exists but does not parse is `AppError::CorruptState`.
    async fn load_snapshot(&self) -> Result<Option<PersistedSnapshot>>;

    /// Replace the stored snapshot atomically.
    async fn save_snapshot(&self, snapshot: &PersistedSnapshot) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// On-disk shape of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedSnapshot {
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(alias = "sections", alias = "pages")]
    pub units: BTreeMap<String, PersistedUnit>,
}

/// On-disk shape of one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedUnit {
    pub title: String,

    pub hash: String,

    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_checked: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Legacy per-section keys; accepted on read, never written.
    #[serde(default, skip_serializing)]
    api_type: IgnoredAny,

    #[serde(default, skip_serializing)]
    section_id: IgnoredAny,
}

impl PersistedSnapshot {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let units = snapshot
            .units
            .iter()
            .map(|(id, unit)| {
                let record = PersistedUnit {
                    title: unit.title.clone(),
                    hash: unit.fingerprint.as_str().to_string(),
                    last_checked: unit.last_checked,
                    content: unit.raw_content.clone(),
                    url: Some(unit.locator.clone()),
                    api_type: IgnoredAny,
                    section_id: IgnoredAny,
                };
                (id.clone(), record)
            })
            .collect();
        Self {
            timestamp: snapshot.taken_at,
            units,
        }
    }

    /// Convert into the domain snapshot. Units stored without a `url` get
    /// their locator from `locate`.
    pub fn into_snapshot(self, locate: impl Fn(&str) -> String) -> Snapshot {
        let units = self.units.into_iter().map(|(id, record)| ContentUnit {
            locator: record.url.unwrap_or_else(|| locate(&id)),
            title: record.title,
            fingerprint: Fingerprint::from_hex(record.hash),
            last_checked: record.last_checked,
            raw_content: record.content,
            id,
        });
        Snapshot::from_units(self.timestamp, units)
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp read as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid timestamp '{raw}'"))
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 11, 3, 8, 15, 0).unwrap();
        assert_eq!(parse_timestamp("2025-11-03T08:15:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-11-03T10:15:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-11-03T08:15:00"), Some(expected));
        assert!(parse_timestamp("2025-11-03T08:15:00.123456").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_legacy_document() {
        let json = r#"{
            "timestamp": "2025-11-03T08:15:00.421337",
            "sections": {
                "spot:general-info": {
                    "title": "General Info",
                    "hash": "abc123",
                    "last_checked": "2025-11-03T08:14:59.000001"
                }
            }
        }"#;

        let persisted: PersistedSnapshot = serde_json::from_str(json).unwrap();
        let snapshot = persisted.into_snapshot(|id| format!("https://docs.example.com/#{id}"));
        let unit = snapshot.get("spot:general-info").unwrap();
        assert_eq!(unit.fingerprint.as_str(), "abc123");
        assert_eq!(unit.locator, "https://docs.example.com/#spot:general-info");
        assert!(unit.raw_content.is_none());
    }

    #[test]
    fn test_unknown_top_level_field_refused() {
        let json = r#"{"timestamp": "2025-11-03T08:15:00Z", "units": {}, "version": 9}"#;
        assert!(serde_json::from_str::<PersistedSnapshot>(json).is_err());
    }

    #[test]
    fn test_missing_hash_refused() {
        let json = r#"{"timestamp": "2025-11-03T08:15:00Z",
                       "units": {"a": {"title": "A", "last_checked": "2025-11-03T08:15:00Z"}}}"#;
        assert!(serde_json::from_str::<PersistedSnapshot>(json).is_err());
    }

    #[test]
    fn test_unknown_unit_field_refused() {
        let json = r#"{"timestamp": "2025-11-03T08:15:00Z",
                       "units": {"a": {"title": "A", "hash": "abc",
                                       "last_checked": "2025-11-03T08:15:00Z",
                                       "etag": "W/1"}}}"#;
        assert!(serde_json::from_str::<PersistedSnapshot>(json).is_err());
    }

    #[test]
    fn test_legacy_page_and_section_keys() {
        let pages = r#"{"timestamp": "2025-11-03T08:15:00",
                        "pages": {"https://bybit-exchange.github.io/docs/v5/intro": {
                            "hash": "abc", "title": "Intro",
                            "last_checked": "2025-11-03T08:15:00"}}}"#;
        let persisted: PersistedSnapshot = serde_json::from_str(pages).unwrap();
        assert_eq!(persisted.units.len(), 1);

        let sections = r#"{"timestamp": "2025-11-03T08:15:00",
                           "sections": {"spot:general-info": {
                               "title": "General Info", "hash": "abc",
                               "api_type": "spot", "section_id": "general-info",
                               "last_checked": "2025-11-03T08:15:00"}}}"#;
        let persisted: PersistedSnapshot = serde_json::from_str(sections).unwrap();
        let written = serde_json::to_string(&persisted).unwrap();
        assert!(!written.contains("api_type"));
        assert!(!written.contains("section_id"));
    }
}
