//! Classified result of comparing a run against the previous snapshot.

use serde::{Deserialize, Serialize};

use crate::models::{ContentUnit, NotifyPolicy};

/// A unit whose fingerprint differs from the previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedUnit {
    pub previous: ContentUnit,
    pub current: ContentUnit,
}

/// Change classification for one comparison.
///
/// `new_units` and `modified_units` follow discovery order. `deleted_units`
/// carry the previous unit and follow the previous snapshot's id order.
/// `skipped` lists previously known ids whose fetch failed this run; their
/// previous entries are carried forward unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub new_units: Vec<ContentUnit>,
    pub modified_units: Vec<ModifiedUnit>,
    pub deleted_units: Vec<ContentUnit>,
    pub unchanged_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl ChangeSet {
    /// True when there is nothing to report.
    pub fn is_empty(&self) -> bool {
        self.new_units.is_empty() && self.modified_units.is_empty() && self.deleted_units.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.new_units.len() + self.modified_units.len() + self.deleted_units.len()
    }

    /// Copy containing only the categories the policy delivers.
    pub fn filtered(&self, policy: &NotifyPolicy) -> ChangeSet {
        ChangeSet {
            new_units: if policy.on_additions {
                self.new_units.clone()
            } else {
                Vec::new()
            },
            modified_units: if policy.on_modifications {
                self.modified_units.clone()
            } else {
                Vec::new()
            },
            deleted_units: if policy.on_deletions {
                self.deleted_units.clone()
            } else {
                Vec::new()
            },
            unchanged_count: self.unchanged_count,
            skipped: self.skipped.clone(),
        }
    }
}
