//! Custom resource representations
//!
//! - `CustomResource`: the object the synchronizer writes, built from a desired entry
//! - `ManagedResource`: what the reconciler needs to know about a live object
//! - `ResourceRef`: the minimal descriptor used for deletion

use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use kube::discovery::ApiResource;
use schemasync_core::{API_GROUP, API_VERSION, ResourceEntry, ResourceType, api_version, canonicalize};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{KubeError, Result};
use crate::labels::{hash_annotations, managed_labels, source_hash};

/// Dynamic API description for a resource type
pub fn api_resource(kind: ResourceType) -> ApiResource {
    let gvk = GroupVersionKind::gvk(API_GROUP, API_VERSION, kind.kind());
    ApiResource::from_gvk_with_plural(&gvk, kind.plural())
}

/// Object metadata written by the synchronizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Cluster representation of a desired entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResource {
    pub api_version: String,
    pub kind: ResourceType,
    pub metadata: ObjectMetadata,
    pub spec: Value,
}

impl CustomResource {
    /// Build the object for `entry` in `namespace`
    ///
    /// The spec is canonicalized; the entry's source hash becomes the hash
    /// annotation.
    pub fn from_entry(entry: &ResourceEntry, namespace: &str) -> Self {
        Self {
            api_version: api_version(),
            kind: entry.kind,
            metadata: ObjectMetadata {
                name: entry.name.clone(),
                namespace: Some(namespace.to_string()),
                labels: managed_labels(),
                annotations: hash_annotations(entry.source_hash.as_deref()),
            },
            spec: canonicalize(&entry.spec),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn source_hash(&self) -> Option<&str> {
        self.metadata
            .annotations
            .get(crate::labels::SOURCE_HASH_ANNOTATION)
            .map(String::as_str)
    }

    /// Minimal descriptor of this object
    pub fn to_ref(&self) -> ResourceRef {
        ResourceRef::new(self.kind, self.metadata.name.clone())
    }

    /// Convert to a dynamic object for the Kubernetes API
    pub fn to_dynamic_object(&self) -> DynamicObject {
        let ar = api_resource(self.kind);
        let mut obj = DynamicObject::new(&self.metadata.name, &ar).data(json!({ "spec": self.spec }));
        obj.metadata.namespace = self.metadata.namespace.clone();
        if !self.metadata.labels.is_empty() {
            obj.metadata.labels = Some(self.metadata.labels.clone());
        }
        if !self.metadata.annotations.is_empty() {
            obj.metadata.annotations = Some(self.metadata.annotations.clone());
        }
        obj
    }
}

/// Live object as observed by the reconciler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedResource {
    pub name: String,
    pub kind: ResourceType,
    pub spec: Value,
    /// Hash stamped when this engine last wrote the object; comparison only
    pub source_hash: Option<String>,
}

impl ManagedResource {
    /// Interpret a dynamic object listed for `kind`
    pub fn from_dynamic(kind: ResourceType, obj: &DynamicObject) -> Result<Self> {
        let name = obj
            .metadata
            .name
            .clone()
            .ok_or_else(|| KubeError::InvalidResource(format!("{} without a name", kind)))?;
        Ok(Self {
            name,
            kind,
            spec: obj.data.get("spec").cloned().unwrap_or(Value::Null),
            source_hash: source_hash(obj.metadata.annotations.as_ref()),
        })
    }
}

impl From<&CustomResource> for ManagedResource {
    fn from(resource: &CustomResource) -> Self {
        Self {
            name: resource.metadata.name.clone(),
            kind: resource.kind,
            spec: resource.spec.clone(),
            source_hash: resource.source_hash().map(str::to_string),
        }
    }
}

/// Type and name of an object, all that deletion needs
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceType,
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemasync_core::spec_hash;

    fn entry() -> ResourceEntry {
        ResourceEntry::new(
            ResourceType::Th2Box,
            "codec",
            json!({"port": 8080, "settings": {"enabled": true}}),
        )
        .with_source_hash("h1")
    }

    #[test]
    fn test_api_resource() {
        let ar = api_resource(ResourceType::Th2CoreBox);
        assert_eq!(ar.group, "th2.exactpro.com");
        assert_eq!(ar.version, "v1");
        assert_eq!(ar.api_version, "th2.exactpro.com/v1");
        assert_eq!(ar.kind, "Th2CoreBox");
        assert_eq!(ar.plural, "th2coreboxes");
    }

    #[test]
    fn test_custom_resource_rendering() {
        let resource = CustomResource::from_entry(&entry(), "demo");

        insta::assert_json_snapshot!(resource, @r#"
        {
          "apiVersion": "th2.exactpro.com/v1",
          "kind": "Th2Box",
          "metadata": {
            "name": "codec",
            "namespace": "demo",
            "labels": {
              "app.kubernetes.io/managed-by": "schemasync"
            },
            "annotations": {
              "schemasync.io/source-hash": "h1"
            }
          },
          "spec": {
            "port": "8080",
            "settings": {
              "enabled": "true"
            }
          }
        }
        "#);
    }

    #[test]
    fn test_unhashed_entry_has_no_annotation() {
        let plain = ResourceEntry::new(ResourceType::Th2Link, "links", json!({}));
        let resource = CustomResource::from_entry(&plain, "demo");
        assert_eq!(resource.source_hash(), None);
        assert!(resource.metadata.annotations.is_empty());
    }

    #[test]
    fn test_dynamic_object_roundtrip() {
        let hashed = ResourceEntry::hashed(ResourceType::Th2Box, "codec", json!({"port": 8080}));
        let resource = CustomResource::from_entry(&hashed, "demo");
        let obj = resource.to_dynamic_object();

        assert_eq!(obj.metadata.name.as_deref(), Some("codec"));
        assert_eq!(obj.metadata.namespace.as_deref(), Some("demo"));
        assert_eq!(obj.types.as_ref().map(|t| t.kind.as_str()), Some("Th2Box"));

        let managed = ManagedResource::from_dynamic(ResourceType::Th2Box, &obj).unwrap();
        assert_eq!(managed.name, "codec");
        assert_eq!(managed.spec, json!({"port": "8080"}));
        assert_eq!(managed.source_hash, Some(spec_hash(&json!({"port": 8080}))));
    }

    #[test]
    fn test_resource_ref_display() {
        let r = CustomResource::from_entry(&entry(), "demo").to_ref();
        assert_eq!(r.to_string(), "Th2Box/codec");
    }
}
