//! Resource kinds, desired entries, and schema settings
//!
//! `ResourceType` is a closed table: every kind the repository may hold is
//! listed here together with the attributes the cluster layer needs (kind
//! string, plural name, repository directory) and whether the synchronizer
//! manages it at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::hash::spec_hash;

/// API group of every managed custom resource
pub const API_GROUP: &str = "th2.exactpro.com";

/// API version of every managed custom resource
pub const API_VERSION: &str = "v1";

/// Full `apiVersion` string (`group/version`)
pub fn api_version() -> String {
    format!("{}/{}", API_GROUP, API_VERSION)
}

/// Kind of a resource declared in a schema branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Th2Box,
    Th2CoreBox,
    Th2Estore,
    Th2Mstore,
    Th2Link,
    Th2Dictionary,
    SettingsFile,
}

struct TypeAttributes {
    kind: &'static str,
    plural: &'static str,
    directory: &'static str,
    k8s_resource: bool,
}

impl ResourceType {
    /// Every known resource type, in reconciliation order
    pub const ALL: [ResourceType; 7] = [
        ResourceType::Th2Box,
        ResourceType::Th2CoreBox,
        ResourceType::Th2Estore,
        ResourceType::Th2Mstore,
        ResourceType::Th2Link,
        ResourceType::Th2Dictionary,
        ResourceType::SettingsFile,
    ];

    const fn attributes(self) -> TypeAttributes {
        match self {
            Self::Th2Box => TypeAttributes {
                kind: "Th2Box",
                plural: "th2boxes",
                directory: "boxes",
                k8s_resource: true,
            },
            Self::Th2CoreBox => TypeAttributes {
                kind: "Th2CoreBox",
                plural: "th2coreboxes",
                directory: "core",
                k8s_resource: true,
            },
            Self::Th2Estore => TypeAttributes {
                kind: "Th2Estore",
                plural: "th2estores",
                directory: "core",
                k8s_resource: true,
            },
            Self::Th2Mstore => TypeAttributes {
                kind: "Th2Mstore",
                plural: "th2mstores",
                directory: "core",
                k8s_resource: true,
            },
            Self::Th2Link => TypeAttributes {
                kind: "Th2Link",
                plural: "th2links",
                directory: "links",
                k8s_resource: true,
            },
            Self::Th2Dictionary => TypeAttributes {
                kind: "Th2Dictionary",
                plural: "th2dictionaries",
                directory: "dictionaries",
                k8s_resource: true,
            },
            Self::SettingsFile => TypeAttributes {
                kind: "SettingsFile",
                plural: "",
                directory: "",
                k8s_resource: false,
            },
        }
    }

    /// Kind string as written in documents and cluster objects
    pub const fn kind(self) -> &'static str {
        self.attributes().kind
    }

    /// Lowercase plural used in API paths
    pub const fn plural(self) -> &'static str {
        self.attributes().plural
    }

    /// Directory holding this kind inside a schema checkout (empty for the root)
    pub const fn directory(self) -> &'static str {
        self.attributes().directory
    }

    /// Whether the synchronizer manages this kind in the cluster
    pub const fn is_k8s_resource(self) -> bool {
        self.attributes().k8s_resource
    }

    /// Iterate over the kinds the synchronizer manages
    pub fn manageable() -> impl Iterator<Item = ResourceType> {
        Self::ALL.into_iter().filter(|t| t.is_k8s_resource())
    }

    /// Look up a type by its kind string
    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.kind() == kind)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

impl FromStr for ResourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_kind(s).ok_or_else(|| CoreError::UnknownKind {
            kind: s.to_string(),
        })
    }
}

/// One desired object as declared in a schema branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    pub name: String,
    pub kind: ResourceType,
    #[serde(default)]
    pub spec: Value,
    /// Digest of the canonical spec at commit time. `None` disables
    /// hash-driven updates for this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
}

impl ResourceEntry {
    /// Create an entry without a source hash
    pub fn new(kind: ResourceType, name: impl Into<String>, spec: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            spec,
            source_hash: None,
        }
    }

    /// Create an entry whose source hash is computed from its spec
    pub fn hashed(kind: ResourceType, name: impl Into<String>, spec: Value) -> Self {
        let source_hash = Some(spec_hash(&spec));
        Self {
            name: name.into(),
            kind,
            spec,
            source_hash,
        }
    }

    /// Set an explicit source hash
    pub fn with_source_hash(mut self, hash: impl Into<String>) -> Self {
        self.source_hash = Some(hash.into());
        self
    }

    /// `Kind/name`, for logs and messages
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

/// Whether a schema participates in cluster propagation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropagationMode {
    #[default]
    Off,
    Sync,
}

/// Per-schema settings, declared by a `SettingsFile` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositorySettings {
    #[serde(default)]
    pub k8s_propagation: PropagationMode,
}

impl RepositorySettings {
    /// Settings with propagation enabled
    pub fn sync() -> Self {
        Self {
            k8s_propagation: PropagationMode::Sync,
        }
    }

    pub fn is_k8s_propagation_enabled(&self) -> bool {
        self.k8s_propagation == PropagationMode::Sync
    }

    /// Read settings from a `SettingsFile` spec
    pub fn from_spec(spec: &Value) -> Result<Self> {
        if spec.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(spec.clone()).map_err(|e| CoreError::InvalidSettings {
            message: e.to_string(),
        })
    }
}

/// On-disk shape of a resource file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub kind: String,
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub spec: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
}

impl ResourceDocument {
    /// Parse a single YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Convert to a desired entry, computing its source hash
    pub fn into_entry(self) -> Result<ResourceEntry> {
        let kind = self.kind.parse::<ResourceType>()?;
        let name = self.metadata.name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidResource {
                message: format!("{} document has an empty metadata.name", kind),
            });
        }
        Ok(ResourceEntry::hashed(kind, name, self.spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manageable_excludes_settings() {
        let types: Vec<_> = ResourceType::manageable().collect();
        assert_eq!(types.len(), 6);
        assert!(!types.contains(&ResourceType::SettingsFile));
    }

    #[test]
    fn test_kind_lookup() {
        assert_eq!(ResourceType::from_kind("Th2Link"), Some(ResourceType::Th2Link));
        assert_eq!(ResourceType::from_kind("Deployment"), None);
        assert!(matches!(
            "Deployment".parse::<ResourceType>(),
            Err(CoreError::UnknownKind { kind }) if kind == "Deployment"
        ));
    }

    #[test]
    fn test_type_attributes() {
        assert_eq!(ResourceType::Th2Dictionary.plural(), "th2dictionaries");
        assert_eq!(ResourceType::Th2Estore.directory(), "core");
        assert_eq!(ResourceType::Th2Box.to_string(), "Th2Box");
        assert_eq!(api_version(), "th2.exactpro.com/v1");
    }

    #[test]
    fn test_document_into_entry() {
        let doc = ResourceDocument::from_yaml(
            r#"
apiVersion: th2.exactpro.com/v1
kind: Th2Box
metadata:
  name: codec
spec:
  image-name: codec
  port: 8080
"#,
        )
        .unwrap();

        let entry = doc.into_entry().unwrap();
        assert_eq!(entry.kind, ResourceType::Th2Box);
        assert_eq!(entry.name, "codec");
        assert_eq!(entry.spec["port"], json!(8080));
        assert_eq!(entry.source_hash, Some(spec_hash(&entry.spec)));
    }

    #[test]
    fn test_document_empty_name_rejected() {
        let doc = ResourceDocument::from_yaml("kind: Th2Link\nmetadata:\n  name: ' '\n").unwrap();
        assert!(matches!(doc.into_entry(), Err(CoreError::InvalidResource { .. })));
    }

    #[test]
    fn test_settings_from_spec() {
        let settings = RepositorySettings::from_spec(&json!({"k8s-propagation": "sync"})).unwrap();
        assert!(settings.is_k8s_propagation_enabled());

        let settings = RepositorySettings::from_spec(&json!({"k8s-propagation": "off"})).unwrap();
        assert!(!settings.is_k8s_propagation_enabled());

        let settings = RepositorySettings::from_spec(&Value::Null).unwrap();
        assert!(!settings.is_k8s_propagation_enabled());

        assert!(RepositorySettings::from_spec(&json!({"k8s-propagation": "sometimes"})).is_err());
    }
}
