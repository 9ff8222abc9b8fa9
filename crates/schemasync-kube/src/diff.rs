//! Change planning for one resource type
//!
//! Compares desired entries against live objects and decides the minimal set
//! of writes. Identity is the object name; change detection relies solely on
//! the source hash:
//! - desired but not live: create
//! - both, desired hash present and different from the live hash: replace
//! - live but not desired: delete
//!
//! An entry without a source hash is created when missing but never replaced.

use schemasync_core::{ResourceEntry, ResourceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resources::ManagedResource;

/// Kind of write a change requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Replace,
    Delete,
}

/// A single planned write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceChange {
    pub kind: ResourceType,
    pub name: String,
    pub change_type: ChangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_hash: Option<String>,
}

impl ResourceChange {
    /// `Kind/name`, for logs and messages
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

/// Planned writes for one resource type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangePlan {
    pub changes: Vec<ResourceChange>,
    /// Desired entries that need no write
    pub unchanged: usize,
}

impl ChangePlan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes of the given type
    pub fn count(&self, change_type: ChangeType) -> usize {
        self.changes
            .iter()
            .filter(|c| c.change_type == change_type)
            .count()
    }
}

/// Whether an existing live object must be replaced
pub fn needs_replace(entry: &ResourceEntry, live: &ManagedResource) -> bool {
    match entry.source_hash.as_deref() {
        None => false,
        Some(hash) => live.source_hash.as_deref() != Some(hash),
    }
}

/// Plan the writes converging `live` to `desired` for one type
///
/// Creates and replaces come first, in name order, followed by deletions.
pub fn plan_changes(
    kind: ResourceType,
    desired: &BTreeMap<String, ResourceEntry>,
    live: &BTreeMap<String, ManagedResource>,
) -> ChangePlan {
    let mut plan = ChangePlan::default();

    for (name, entry) in desired {
        match live.get(name) {
            None => plan.changes.push(ResourceChange {
                kind,
                name: name.clone(),
                change_type: ChangeType::Create,
                desired_hash: entry.source_hash.clone(),
                live_hash: None,
            }),
            Some(current) if needs_replace(entry, current) => plan.changes.push(ResourceChange {
                kind,
                name: name.clone(),
                change_type: ChangeType::Replace,
                desired_hash: entry.source_hash.clone(),
                live_hash: current.source_hash.clone(),
            }),
            Some(_) => plan.unchanged += 1,
        }
    }

    for (name, current) in live {
        if !desired.contains_key(name) {
            plan.changes.push(ResourceChange {
                kind,
                name: name.clone(),
                change_type: ChangeType::Delete,
                desired_hash: None,
                live_hash: current.source_hash.clone(),
            });
        }
    }

    plan
}
