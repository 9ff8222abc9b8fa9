//! Repository service interface

use async_trait::async_trait;
use schemasync_core::RepositorySnapshot;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;

/// Read access to schema branches
///
/// Implementations must be Send + Sync for use across worker tasks.
#[async_trait]
pub trait RepositoryService: Send + Sync {
    /// Names of every schema branch, including the default branch
    async fn list_schemas(&self) -> Result<BTreeSet<String>>;

    /// Resources and settings of a schema at its branch tip
    async fn snapshot(&self, schema: &str) -> Result<RepositorySnapshot>;
}

#[async_trait]
impl<T: RepositoryService + ?Sized> RepositoryService for Arc<T> {
    async fn list_schemas(&self) -> Result<BTreeSet<String>> {
        (**self).list_schemas().await
    }

    async fn snapshot(&self, schema: &str) -> Result<RepositorySnapshot> {
        (**self).snapshot(schema).await
    }
}
