//! Labels and annotations stamped on managed objects

use std::collections::BTreeMap;

/// Standard managed-by label
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Value of the managed-by label
pub const MANAGED_BY: &str = "schemasync";

/// Digest of the source spec that produced the live object.
///
/// Stored as an annotation: a hex SHA-256 is 64 characters, one more than a
/// label value may hold.
pub const SOURCE_HASH_ANNOTATION: &str = "schemasync.io/source-hash";

/// Field manager name for write requests
pub const FIELD_MANAGER: &str = "schemasync";

/// Labels applied to every object the synchronizer writes
pub fn managed_labels() -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY.to_string());
    labels
}

/// Annotations carrying the source hash, if any
pub fn hash_annotations(source_hash: Option<&str>) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::new();
    if let Some(hash) = source_hash {
        annotations.insert(SOURCE_HASH_ANNOTATION.to_string(), hash.to_string());
    }
    annotations
}

/// Read the source hash back from an object's annotations
pub fn source_hash(annotations: Option<&BTreeMap<String, String>>) -> Option<String> {
    annotations
        .and_then(|a| a.get(SOURCE_HASH_ANNOTATION))
        .cloned()
}
