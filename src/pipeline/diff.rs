//! Change classification between a stored snapshot and a fresh run.
//!
//! Every id in `previous ∪ current` lands in exactly one of new, modified,
//! unchanged or deleted, except ids whose fetch failed this run: those are
//! reported as skipped and keep their previous entry.

use std::collections::HashSet;

use crate::models::{ChangeSet, ContentUnit, ModifiedUnit, Snapshot};

/// Calculator for change sets between snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct Differ;

impl Differ {
    pub fn new() -> Self {
        Self
    }

    /// Classify `current` (in discovery order) against `previous`.
    ///
    /// `skipped` holds ids discovered this run whose fetch failed. Previous
    /// units with these ids are neither deleted nor modified.
    pub fn compare(
        &self,
        previous: &Snapshot,
        current: &[ContentUnit],
        skipped: &[String],
    ) -> ChangeSet {
        let mut changes = ChangeSet::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(current.len());

        for unit in current {
            if !seen.insert(unit.id.as_str()) {
                log::warn!("Duplicate unit id '{}' ignored", unit.id);
                continue;
            }
            match previous.get(&unit.id) {
                None => changes.new_units.push(unit.clone()),
                // Fingerprint is the only change signal; title is metadata.
                Some(prev) if prev.fingerprint == unit.fingerprint => {
                    changes.unchanged_count += 1
                }
                Some(prev) => changes.modified_units.push(ModifiedUnit {
                    previous: prev.clone(),
                    current: unit.clone(),
                }),
            }
        }

        let skipped: HashSet<&str> = skipped
            .iter()
            .map(String::as_str)
            .filter(|id| !seen.contains(id))
            .collect();

        for (id, prev) in &previous.units {
            if seen.contains(id.as_str()) {
                continue;
            }
            if skipped.contains(id.as_str()) {
                changes.skipped.push(id.clone());
            } else {
                changes.deleted_units.push(prev.clone());
            }
        }

        changes
    }

    /// Snapshot to persist after `compare`: current units plus carried-forward
    /// entries for skipped ids.
    pub fn next_snapshot(
        &self,
        previous: &Snapshot,
        current: Vec<ContentUnit>,
        changes: &ChangeSet,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Snapshot {
        let carried = changes
            .skipped
            .iter()
            .filter_map(|id| previous.get(id).cloned());
        Snapshot::from_units(previous.next_taken_at(now), current.into_iter().chain(carried))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitDescriptor;
    use crate::pipeline::{Normalizer, fingerprint};
    use chrono::{Duration, Utc};

    fn unit(id: &str, title: &str, content: &str) -> ContentUnit {
        let normalized = Normalizer::new().normalize(content);
        ContentUnit::from_descriptor(
            UnitDescriptor::new(id, title, format!("https://docs.example.com/#{id}")),
            fingerprint(&normalized),
            Utc::now(),
            None,
        )
    }

    fn snapshot(units: Vec<ContentUnit>) -> Snapshot {
        Snapshot::from_units(Utc::now(), units)
    }

    fn ids(units: &[ContentUnit]) -> Vec<&str> {
        units.iter().map(|u| u.id.as_str()).collect()
    }

    #[test]
    fn test_no_changes() {
        let units = vec![unit("a", "A", "one"), unit("b", "B", "two")];
        let prev = snapshot(units.clone());

        let changes = Differ::new().compare(&prev, &units, &[]);
        assert!(changes.is_empty());
        assert_eq!(changes.unchanged_count, 2);
    }

    #[test]
    fn test_new_and_deleted() {
        let baseline = snapshot(vec![]);
        let current = vec![unit("auth", "Auth", "A")];
        let changes = Differ::new().compare(&baseline, &current, &[]);
        assert_eq!(ids(&changes.new_units), vec!["auth"]);

        let prev = snapshot(current);
        let changes = Differ::new().compare(&prev, &[], &[]);
        assert_eq!(ids(&changes.deleted_units), vec!["auth"]);
        assert_eq!(changes.deleted_units[0].title, "Auth");
    }

    #[test]
    fn test_modification_captures_both_sides() {
        let prev = snapshot(vec![unit("rate-limits", "Rate Limits", "limit: 10/s")]);
        let current = vec![unit("rate-limits", "Rate Limits", "limit: 20/s")];

        let changes = Differ::new().compare(&prev, &current, &[]);
        assert_eq!(changes.modified_units.len(), 1);
        let m = &changes.modified_units[0];
        assert_ne!(m.previous.fingerprint, m.current.fingerprint);
        assert_eq!(m.previous.fingerprint, unit("x", "", "limit: 10/s").fingerprint);
    }

    #[test]
    fn test_title_only_change_is_unchanged() {
        let prev = snapshot(vec![unit("x", "Old Name", "same text")]);
        let current = vec![unit("x", "New Name", "same  text\n")];

        let changes = Differ::new().compare(&prev, &current, &[]);
        assert!(changes.is_empty());
        assert_eq!(changes.unchanged_count, 1);
    }

    #[test]
    fn test_partition() {
        let prev = snapshot(vec![
            unit("keep", "", "k"),
            unit("edit", "", "e1"),
            unit("gone", "", "g"),
            unit("flaky", "", "f"),
        ]);
        let current = vec![
            unit("new", "", "n"),
            unit("edit", "", "e2"),
            unit("keep", "", "k"),
        ];
        let skipped = vec!["flaky".to_string()];

        let changes = Differ::new().compare(&prev, &current, &skipped);

        let mut all: Vec<&str> = ids(&changes.new_units);
        all.extend(changes.modified_units.iter().map(|m| m.current.id.as_str()));
        all.extend(ids(&changes.deleted_units));
        all.extend(changes.skipped.iter().map(String::as_str));
        assert_eq!(all.len() + changes.unchanged_count, 5);

        let mut sorted = all.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), all.len());

        assert_eq!(ids(&changes.new_units), vec!["new"]);
        assert_eq!(changes.modified_units[0].current.id, "edit");
        assert_eq!(ids(&changes.deleted_units), vec!["gone"]);
        assert_eq!(changes.skipped, vec!["flaky"]);
        assert_eq!(changes.unchanged_count, 1);
    }

    #[test]
    fn test_preserves_discovery_order() {
        let current = vec![unit("z", "", "1"), unit("a", "", "2"), unit("m", "", "3")];
        let changes = Differ::new().compare(&Snapshot::empty(), &current, &[]);
        assert_eq!(ids(&changes.new_units), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_skipped_unknown_id_is_not_reported() {
        let changes = Differ::new().compare(&Snapshot::empty(), &[], &["fresh".to_string()]);
        assert!(changes.skipped.is_empty());
        assert!(changes.is_empty());
    }

    #[test]
    fn test_next_snapshot_carries_skipped_forward() {
        let old = Utc::now() - Duration::days(1);
        let prev = Snapshot::from_units(old, vec![unit("flaky", "Flaky", "f"), unit("gone", "", "g")]);
        let current = vec![unit("new", "", "n")];
        let skipped = vec!["flaky".to_string()];

        let differ = Differ::new();
        let changes = differ.compare(&prev, &current, &skipped);
        let next = differ.next_snapshot(&prev, current, &changes, Utc::now());

        assert!(next.contains("new"));
        assert!(next.contains("flaky"));
        assert!(!next.contains("gone"));
        assert_eq!(next.get("flaky"), prev.get("flaky"));
        assert!(next.taken_at >= prev.taken_at);
    }
}
