//! Repository snapshots and the desired-state partition

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resource::{RepositorySettings, ResourceEntry, ResourceType};

/// Desired objects of one schema, by type then by name
pub type DesiredState = BTreeMap<ResourceType, BTreeMap<String, ResourceEntry>>;

/// A desired state with an empty map for every manageable type
pub fn empty_desired_state() -> DesiredState {
    ResourceType::manageable()
        .map(|t| (t, BTreeMap::new()))
        .collect()
}

/// One schema's resources and settings at its branch tip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    pub resources: Vec<ResourceEntry>,
    #[serde(default)]
    pub settings: Option<RepositorySettings>,
}

impl RepositorySnapshot {
    pub fn new(resources: Vec<ResourceEntry>, settings: Option<RepositorySettings>) -> Self {
        Self {
            resources,
            settings,
        }
    }

    /// Absent settings count as disabled
    pub fn is_propagation_enabled(&self) -> bool {
        self.settings
            .as_ref()
            .map(RepositorySettings::is_k8s_propagation_enabled)
            .unwrap_or(false)
    }

    /// Partition manageable resources by type and name
    ///
    /// Every manageable type is present in the result, so types with nothing
    /// declared still reconcile (and delete their stale objects). A later
    /// entry with the same type and name replaces an earlier one.
    pub fn desired_state(&self) -> DesiredState {
        let mut state = empty_desired_state();
        for entry in &self.resources {
            if !entry.kind.is_k8s_resource() {
                continue;
            }
            state
                .entry(entry.kind)
                .or_default()
                .insert(entry.name.clone(), entry.clone());
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_desired_state_covers_every_manageable_type() {
        let state = RepositorySnapshot::default().desired_state();
        assert_eq!(state.len(), ResourceType::manageable().count());
        assert!(state.values().all(|m| m.is_empty()));
    }

    #[test]
    fn test_desired_state_skips_unmanageable() {
        let snapshot = RepositorySnapshot::new(
            vec![
                ResourceEntry::hashed(ResourceType::Th2Box, "codec", json!({})),
                ResourceEntry::hashed(ResourceType::Th2Link, "links", json!({})),
                ResourceEntry::new(
                    ResourceType::SettingsFile,
                    "settings",
                    json!({"k8s-propagation": "sync"}),
                ),
            ],
            Some(RepositorySettings::sync()),
        );

        let state = snapshot.desired_state();
        assert!(!state.contains_key(&ResourceType::SettingsFile));
        assert!(state[&ResourceType::Th2Box].contains_key("codec"));
        assert!(state[&ResourceType::Th2Link].contains_key("links"));
    }

    #[test]
    fn test_propagation_gate() {
        let mut snapshot = RepositorySnapshot::default();
        assert!(!snapshot.is_propagation_enabled());

        snapshot.settings = Some(RepositorySettings::default());
        assert!(!snapshot.is_propagation_enabled());

        snapshot.settings = Some(RepositorySettings::sync());
        assert!(snapshot.is_propagation_enabled());
    }
}
