//! Snapshot of all units observed for one source.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::ContentUnit;

/// Full recorded state of a source at one run.
///
/// Units are keyed by id, so ids are unique by construction. A snapshot is
/// never edited after it is written; each run builds a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub units: BTreeMap<String, ContentUnit>,
}

impl Snapshot {
    /// Baseline used when no snapshot has been written yet.
    pub fn empty() -> Self {
        Self {
            taken_at: DateTime::<Utc>::MIN_UTC,
            units: BTreeMap::new(),
        }
    }

    /// Build a snapshot from units, keeping the first occurrence of each id.
    pub fn from_units(taken_at: DateTime<Utc>, units: impl IntoIterator<Item = ContentUnit>) -> Self {
        let mut map = BTreeMap::new();
        for unit in units {
            map.entry(unit.id.clone()).or_insert(unit);
        }
        Self {
            taken_at,
            units: map,
        }
    }

    /// True for the first-run baseline.
    pub fn is_baseline(&self) -> bool {
        self.units.is_empty() && self.taken_at == DateTime::<Utc>::MIN_UTC
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ContentUnit> {
        self.units.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    /// Timestamp for a snapshot replacing this one, never earlier than ours.
    pub fn next_taken_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.max(self.taken_at)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fingerprint, UnitDescriptor};
    use chrono::Duration;

    fn unit(id: &str, title: &str) -> ContentUnit {
        ContentUnit::from_descriptor(
            UnitDescriptor::new(id, title, format!("https://example.com/{id}")),
            Fingerprint::from_hex("00"),
            Utc::now(),
            None,
        )
    }

    #[test]
    fn test_empty_is_baseline() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.is_baseline());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_from_units_keeps_first_duplicate() {
        let snapshot = Snapshot::from_units(Utc::now(), vec![unit("a", "First"), unit("a", "Second")]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("a").map(|u| u.title.as_str()), Some("First"));
    }

    #[test]
    fn test_next_taken_at_is_monotonic() {
        let future = Utc::now() + Duration::hours(1);
        let snapshot = Snapshot::from_units(future, vec![unit("a", "A")]);
        assert_eq!(snapshot.next_taken_at(Utc::now()), future);

        let later = future + Duration::minutes(5);
        assert_eq!(snapshot.next_taken_at(later), later);
    }
}
