//! Mock cluster for testing
//!
//! Stores namespaces and custom resources in memory, useful for unit tests
//! without requiring a Kubernetes cluster. Every call is journaled and
//! counted, and individual operations can be made to fail.

use async_trait::async_trait;
use schemasync_core::ResourceType;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use crate::cluster::ClusterService;
use crate::error::{KubeError, Result};
use crate::resources::{CustomResource, ManagedResource, ResourceRef};

type NamespaceObjects = BTreeMap<(ResourceType, String), CustomResource>;

/// Cluster operation, for journaling and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterOperation {
    EnsureNamespace,
    List,
    Create,
    Replace,
    Delete,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCall {
    pub operation: ClusterOperation,
    pub namespace: String,
    pub kind: Option<ResourceType>,
    pub name: Option<String>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct ClusterOperationCounts {
    pub ensures: usize,
    pub lists: usize,
    pub creates: usize,
    pub replaces: usize,
    pub deletes: usize,
}

impl ClusterOperationCounts {
    /// Creates, replaces and deletes together
    pub fn writes(&self) -> usize {
        self.creates + self.replaces + self.deletes
    }
}

#[derive(Debug, Clone)]
struct FailureRule {
    operation: ClusterOperation,
    /// Object name, or namespace for namespace operations; `None` matches all
    target: Option<String>,
}

/// In-memory cluster for testing
#[derive(Clone, Default)]
pub struct MockCluster {
    namespaces: Arc<RwLock<BTreeSet<String>>>,
    /// Storage: namespace -> (kind, name) -> object
    objects: Arc<RwLock<BTreeMap<String, NamespaceObjects>>>,
    failures: Arc<RwLock<Vec<FailureRule>>>,
    calls: Arc<RwLock<Vec<ClusterCall>>>,
    operations: Arc<RwLock<ClusterOperationCounts>>,
}

impl MockCluster {
    /// Create a new empty mock cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a call
    pub fn insert(&self, namespace: &str, resource: CustomResource) {
        self.namespaces
            .write()
            .unwrap()
            .insert(namespace.to_string());
        self.objects
            .write()
            .unwrap()
            .entry(namespace.to_string())
            .or_default()
            .insert((resource.kind, resource.metadata.name.clone()), resource);
    }

    /// Get a stored object
    pub fn get(&self, namespace: &str, kind: ResourceType, name: &str) -> Option<CustomResource> {
        self.objects
            .read()
            .unwrap()
            .get(namespace)
            .and_then(|ns| ns.get(&(kind, name.to_string())))
            .cloned()
    }

    /// Names of stored objects of one type
    pub fn names(&self, namespace: &str, kind: ResourceType) -> Vec<String> {
        self.objects
            .read()
            .unwrap()
            .get(namespace)
            .map(|ns| {
                ns.keys()
                    .filter(|(k, _)| *k == kind)
                    .map(|(_, name)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Count stored objects in a namespace
    pub fn object_count(&self, namespace: &str) -> usize {
        self.objects
            .read()
            .unwrap()
            .get(namespace)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.read().unwrap().contains(namespace)
    }

    /// Make an operation fail, for one target or for all
    pub fn fail(&self, operation: ClusterOperation, target: Option<&str>) {
        self.failures.write().unwrap().push(FailureRule {
            operation,
            target: target.map(str::to_string),
        });
    }

    /// Remove every injected failure
    pub fn clear_failures(&self) {
        self.failures.write().unwrap().clear();
    }

    /// Recorded calls, oldest first
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.calls.read().unwrap().clone()
    }

    /// Recorded write calls (create, replace, delete), oldest first
    pub fn write_calls(&self) -> Vec<ClusterCall> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| {
                matches!(
                    c.operation,
                    ClusterOperation::Create | ClusterOperation::Replace | ClusterOperation::Delete
                )
            })
            .cloned()
            .collect()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> ClusterOperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts and the call journal
    pub fn reset_counts(&self) {
        *self.operations.write().unwrap() = ClusterOperationCounts::default();
        self.calls.write().unwrap().clear();
    }

    fn record(
        &self,
        operation: ClusterOperation,
        namespace: &str,
        kind: Option<ResourceType>,
        name: Option<&str>,
    ) -> Result<()> {
        {
            let mut ops = self.operations.write().unwrap();
            match operation {
                ClusterOperation::EnsureNamespace => ops.ensures += 1,
                ClusterOperation::List => ops.lists += 1,
                ClusterOperation::Create => ops.creates += 1,
                ClusterOperation::Replace => ops.replaces += 1,
                ClusterOperation::Delete => ops.deletes += 1,
            }
        }
        self.calls.write().unwrap().push(ClusterCall {
            operation,
            namespace: namespace.to_string(),
            kind,
            name: name.map(str::to_string),
        });

        let target = name.unwrap_or(namespace);
        let failing = self.failures.read().unwrap().iter().any(|rule| {
            rule.operation == operation && rule.target.as_deref().is_none_or(|t| t == target)
        });
        if failing {
            return Err(KubeError::Rejected {
                operation: format!("{:?}", operation),
                target: target.to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterService for MockCluster {
    async fn ensure_namespace(&self, namespace: &str) -> Result<()> {
        self.record(ClusterOperation::EnsureNamespace, namespace, None, None)?;
        self.namespaces
            .write()
            .unwrap()
            .insert(namespace.to_string());
        Ok(())
    }

    async fn list_resources(
        &self,
        namespace: &str,
        kind: ResourceType,
    ) -> Result<BTreeMap<String, ManagedResource>> {
        self.record(ClusterOperation::List, namespace, Some(kind), None)?;
        let objects = self.objects.read().unwrap();
        Ok(objects
            .get(namespace)
            .map(|ns| {
                ns.values()
                    .filter(|r| r.kind == kind)
                    .map(|r| (r.metadata.name.clone(), ManagedResource::from(r)))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&self, namespace: &str, resource: &CustomResource) -> Result<()> {
        self.record(
            ClusterOperation::Create,
            namespace,
            Some(resource.kind),
            Some(resource.name()),
        )?;
        let mut objects = self.objects.write().unwrap();
        let ns = objects.entry(namespace.to_string()).or_default();
        let key = (resource.kind, resource.metadata.name.clone());
        if ns.contains_key(&key) {
            return Err(KubeError::AlreadyExists {
                kind: resource.kind.to_string(),
                name: resource.metadata.name.clone(),
                namespace: namespace.to_string(),
            });
        }
        ns.insert(key, resource.clone());
        Ok(())
    }

    async fn replace(&self, namespace: &str, resource: &CustomResource) -> Result<()> {
        self.record(
            ClusterOperation::Replace,
            namespace,
            Some(resource.kind),
            Some(resource.name()),
        )?;
        let mut objects = self.objects.write().unwrap();
        let slot = objects
            .get_mut(namespace)
            .and_then(|ns| ns.get_mut(&(resource.kind, resource.metadata.name.clone())))
            .ok_or_else(|| KubeError::NotFound {
                kind: resource.kind.to_string(),
                name: resource.metadata.name.clone(),
                namespace: namespace.to_string(),
            })?;
        *slot = resource.clone();
        Ok(())
    }

    async fn delete(&self, namespace: &str, resource: &ResourceRef) -> Result<()> {
        self.record(
            ClusterOperation::Delete,
            namespace,
            Some(resource.kind),
            Some(&resource.name),
        )?;
        self.objects
            .write()
            .unwrap()
            .get_mut(namespace)
            .and_then(|ns| ns.remove(&(resource.kind, resource.name.clone())))
            .map(|_| ())
            .ok_or_else(|| KubeError::NotFound {
                kind: resource.kind.to_string(),
                name: resource.name.clone(),
                namespace: namespace.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemasync_core::ResourceEntry;
    use serde_json::json;

    fn resource(name: &str, hash: &str) -> CustomResource {
        CustomResource::from_entry(
            &ResourceEntry::new(ResourceType::Th2Box, name, json!({"replicas": 1}))
                .with_source_hash(hash),
            "demo",
        )
    }

    #[tokio::test]
    async fn test_mock_crud() {
        let cluster = MockCluster::new();

        cluster.ensure_namespace("demo").await.unwrap();
        assert!(cluster.has_namespace("demo"));

        cluster.create("demo", &resource("codec", "h1")).await.unwrap();
        let err = cluster.create("demo", &resource("codec", "h1")).await.unwrap_err();
        assert!(err.is_conflict());

        cluster.replace("demo", &resource("codec", "h2")).await.unwrap();
        let live = cluster
            .list_resources("demo", ResourceType::Th2Box)
            .await
            .unwrap();
        assert_eq!(live["codec"].source_hash.as_deref(), Some("h2"));
        assert!(
            cluster
                .list_resources("demo", ResourceType::Th2Link)
                .await
                .unwrap()
                .is_empty()
        );

        let codec = ResourceRef::new(ResourceType::Th2Box, "codec");
        cluster.delete("demo", &codec).await.unwrap();
        assert!(cluster.delete("demo", &codec).await.unwrap_err().is_not_found());
        assert_eq!(cluster.object_count("demo"), 0);
    }

    #[tokio::test]
    async fn test_injected_failure_targets_one_object() {
        let cluster = MockCluster::new();
        cluster.fail(ClusterOperation::Create, Some("bad"));

        assert!(cluster.create("demo", &resource("bad", "h1")).await.is_err());
        assert!(cluster.create("demo", &resource("good", "h1")).await.is_ok());
        assert_eq!(cluster.names("demo", ResourceType::Th2Box), vec!["good".to_string()]);

        cluster.clear_failures();
        assert!(cluster.create("demo", &resource("bad", "h1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_operation_counts() {
        let cluster = MockCluster::new();
        cluster.insert("demo", resource("seeded", "h1"));
        assert_eq!(cluster.operation_counts().writes(), 0);

        cluster.ensure_namespace("demo").await.unwrap();
        let _ = cluster.list_resources("demo", ResourceType::Th2Box).await;
        cluster.create("demo", &resource("codec", "h1")).await.unwrap();
        cluster.replace("demo", &resource("codec", "h2")).await.unwrap();
        cluster
            .delete("demo", &ResourceRef::new(ResourceType::Th2Box, "seeded"))
            .await
            .unwrap();

        let counts = cluster.operation_counts();
        assert_eq!(counts.ensures, 1);
        assert_eq!(counts.lists, 1);
        assert_eq!(counts.creates, 1);
        assert_eq!(counts.replaces, 1);
        assert_eq!(counts.deletes, 1);
        assert_eq!(cluster.write_calls().len(), 3);

        cluster.reset_counts();
        assert_eq!(cluster.operation_counts().writes(), 0);
        assert!(cluster.calls().is_empty());
    }
}
