//! Content unit data structures.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hex-encoded SHA-256 digest of a unit's normalized content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed hex digest.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` characters, for log output.
    pub fn short(&self, len: usize) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(len)
            .map_or(self.0.len(), |(idx, _)| idx);
        &self.0[..end]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit reported by an adapter's discovery pass, before its content is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    /// Stable identifier, unique within a source
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// URL or URL#anchor used for deep links
    pub locator: String,
}

impl UnitDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            locator: locator.into(),
        }
    }
}

/// The smallest trackable piece of a documentation source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// Natural key; the same id across runs is the same unit
    pub id: String,

    /// Descriptive title, not part of change detection
    pub title: String,

    /// URL or URL#anchor
    pub locator: String,

    /// Digest of the normalized content
    pub fingerprint: Fingerprint,

    /// When this unit was last successfully fetched
    pub last_checked: DateTime<Utc>,

    /// Extracted text, only kept when content retention is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
}

impl ContentUnit {
    /// Build a unit from its descriptor and computed fingerprint.
    pub fn from_descriptor(
        descriptor: UnitDescriptor,
        fingerprint: Fingerprint,
        last_checked: DateTime<Utc>,
        raw_content: Option<String>,
    ) -> Self {
        Self {
            id: descriptor.id,
            title: descriptor.title,
            locator: descriptor.locator,
            fingerprint,
            last_checked,
            raw_content,
        }
    }

    /// Format unit for display using a template.
    ///
    /// Supported placeholders: `{id}`, `{title}`, `{locator}`, `{hash}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{id}", &self.id)
            .replace("{title}", &self.title)
            .replace("{locator}", &self.locator)
            .replace("{hash}", self.fingerprint.short(16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_unit() -> ContentUnit {
        ContentUnit::from_descriptor(
            UnitDescriptor::new("auth", "Authentication", "https://docs.example.com/#auth"),
            Fingerprint::from_hex("0123456789abcdef0123456789abcdef"),
            Utc::now(),
            None,
        )
    }

    #[test]
    fn test_format() {
        let unit = sample_unit();
        assert_eq!(
            unit.format("{title} (#{id}) {hash}"),
            "Authentication (#auth) 0123456789abcdef"
        );
    }

    #[test]
    fn test_short_fingerprint_shorter_than_len() {
        let fp = Fingerprint::from_hex("abc");
        assert_eq!(fp.short(16), "abc");
    }
}
