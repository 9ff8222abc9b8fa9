//! Cluster service interface
//!
//! Every operation is scoped to one namespace, named after the schema being
//! reconciled. API group and version come from the resource type table.

use async_trait::async_trait;
use schemasync_core::ResourceType;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::resources::{CustomResource, ManagedResource, ResourceRef};

/// Namespace and custom-resource operations the reconciler needs
///
/// Implementations must be Send + Sync for use across worker tasks.
#[async_trait]
pub trait ClusterService: Send + Sync {
    /// Create the namespace unless it already exists
    async fn ensure_namespace(&self, namespace: &str) -> Result<()>;

    /// Live objects of one type, keyed by name
    async fn list_resources(
        &self,
        namespace: &str,
        kind: ResourceType,
    ) -> Result<BTreeMap<String, ManagedResource>>;

    /// Create a new object
    async fn create(&self, namespace: &str, resource: &CustomResource) -> Result<()>;

    /// Replace an existing object
    async fn replace(&self, namespace: &str, resource: &CustomResource) -> Result<()>;

    /// Delete an object by type and name
    async fn delete(&self, namespace: &str, resource: &ResourceRef) -> Result<()>;
}

#[async_trait]
impl<T: ClusterService + ?Sized> ClusterService for Arc<T> {
    async fn ensure_namespace(&self, namespace: &str) -> Result<()> {
        (**self).ensure_namespace(namespace).await
    }

    async fn list_resources(
        &self,
        namespace: &str,
        kind: ResourceType,
    ) -> Result<BTreeMap<String, ManagedResource>> {
        (**self).list_resources(namespace, kind).await
    }

    async fn create(&self, namespace: &str, resource: &CustomResource) -> Result<()> {
        (**self).create(namespace, resource).await
    }

    async fn replace(&self, namespace: &str, resource: &CustomResource) -> Result<()> {
        (**self).replace(namespace, resource).await
    }

    async fn delete(&self, namespace: &str, resource: &ResourceRef) -> Result<()> {
        (**self).delete(namespace, resource).await
    }
}
