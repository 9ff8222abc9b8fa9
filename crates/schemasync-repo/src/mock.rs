//! Mock repository for testing
//!
//! Holds snapshots in memory, useful for engine tests without a checkout on
//! disk. Individual schemas (or the listing itself) can be made to fail, and
//! an artificial delay lets tests observe concurrent access.

use async_trait::async_trait;
use schemasync_core::RepositorySnapshot;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{RepoError, Result};
use crate::service::RepositoryService;

/// In-memory repository for testing
#[derive(Clone, Default)]
pub struct MockRepository {
    /// Storage: schema -> snapshot
    schemas: Arc<RwLock<BTreeMap<String, RepositorySnapshot>>>,
    /// Schemas whose snapshot calls fail
    failing: Arc<RwLock<BTreeSet<String>>>,
    fail_listing: Arc<AtomicBool>,
    delay: Arc<RwLock<Option<Duration>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<RepoOperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct RepoOperationCounts {
    pub lists: usize,
    pub snapshots: usize,
    /// Snapshot calls per schema
    pub per_schema: BTreeMap<String, usize>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style schema registration
    pub fn with_schema(self, name: &str, snapshot: RepositorySnapshot) -> Self {
        self.set_snapshot(name, snapshot);
        self
    }

    /// Add or replace a schema's snapshot
    pub fn set_snapshot(&self, name: &str, snapshot: RepositorySnapshot) {
        self.schemas
            .write()
            .unwrap()
            .insert(name.to_string(), snapshot);
    }

    /// Remove a schema entirely
    pub fn remove_schema(&self, name: &str) {
        self.schemas.write().unwrap().remove(name);
    }

    /// Make snapshot calls for `name` fail
    pub fn fail_schema(&self, name: &str) {
        self.failing.write().unwrap().insert(name.to_string());
    }

    /// Let snapshot calls for `name` succeed again
    pub fn recover_schema(&self, name: &str) {
        self.failing.write().unwrap().remove(name);
    }

    /// Make schema listing fail
    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Delay every snapshot call
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write().unwrap() = Some(delay);
    }

    /// Highest number of snapshot calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> RepoOperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Snapshot calls made for one schema
    pub fn snapshot_calls(&self, name: &str) -> usize {
        self.operations
            .read()
            .unwrap()
            .per_schema
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl RepositoryService for MockRepository {
    async fn list_schemas(&self) -> Result<BTreeSet<String>> {
        self.operations.write().unwrap().lists += 1;

        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable {
                message: "branch listing failed".to_string(),
            });
        }
        Ok(self.schemas.read().unwrap().keys().cloned().collect())
    }

    async fn snapshot(&self, schema: &str) -> Result<RepositorySnapshot> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.snapshots += 1;
            *ops.per_schema.entry(schema.to_string()).or_default() += 1;
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.read().unwrap().contains(schema) {
            return Err(RepoError::Unavailable {
                message: format!("snapshot of {} failed", schema),
            });
        }

        self.schemas
            .read()
            .unwrap()
            .get(schema)
            .cloned()
            .ok_or_else(|| RepoError::SchemaNotFound {
                name: schema.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemasync_core::RepositorySettings;

    #[tokio::test]
    async fn test_mock_snapshot_and_counts() {
        let repo = MockRepository::new().with_schema(
            "demo",
            RepositorySnapshot::new(vec![], Some(RepositorySettings::sync())),
        );

        let schemas = repo.list_schemas().await.unwrap();
        assert!(schemas.contains("demo"));

        let snapshot = repo.snapshot("demo").await.unwrap();
        assert!(snapshot.is_propagation_enabled());

        assert!(matches!(
            repo.snapshot("other").await,
            Err(RepoError::SchemaNotFound { .. })
        ));

        let counts = repo.operation_counts();
        assert_eq!(counts.lists, 1);
        assert_eq!(counts.snapshots, 2);
        assert_eq!(repo.snapshot_calls("demo"), 1);
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let repo = MockRepository::new().with_schema("demo", RepositorySnapshot::default());

        repo.fail_schema("demo");
        assert!(matches!(
            repo.snapshot("demo").await,
            Err(RepoError::Unavailable { .. })
        ));
        repo.recover_schema("demo");
        assert!(repo.snapshot("demo").await.is_ok());

        repo.fail_listing(true);
        assert!(repo.list_schemas().await.is_err());
        repo.fail_listing(false);
        assert!(repo.list_schemas().await.is_ok());
    }
}
