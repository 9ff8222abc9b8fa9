//! Reconciliation of one schema branch
//!
//! Reads the branch snapshot, checks that propagation is enabled, and hands
//! the desired state to the namespace reconciler. This is the failure
//! boundary of a schema: every error, panics included, ends here as a logged
//! `BranchOutcome::Failed`.

use futures::FutureExt;
use schemasync_core::ResourceType;
use schemasync_kube::{ChangePlan, ClusterService, NamespaceReconciler, ReconcileSummary};
use schemasync_repo::RepositoryService;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::error::Result;

/// What happened to a schema; for observation only
#[derive(Debug, Clone, PartialEq)]
pub enum BranchOutcome {
    /// No settings, or propagation turned off
    Disabled,
    Synced(ReconcileSummary),
    Failed(String),
}

impl BranchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Reconciles schema branches into their namespaces
pub struct BranchReconciler<R, C>
where
    R: RepositoryService,
    C: ClusterService,
{
    repository: Arc<R>,
    namespaces: NamespaceReconciler<C>,
}

impl<R, C> BranchReconciler<R, C>
where
    R: RepositoryService,
    C: ClusterService,
{
    pub fn new(repository: Arc<R>, cluster: Arc<C>) -> Self {
        Self {
            repository,
            namespaces: NamespaceReconciler::new(cluster),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Reconcile `schema`, logging and swallowing any failure
    pub async fn reconcile(&self, schema: &str) -> BranchOutcome {
        let result = AssertUnwindSafe(self.try_reconcile(schema))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(None)) => BranchOutcome::Disabled,
            Ok(Ok(Some(summary))) => {
                if summary.is_success() {
                    tracing::info!(schema, result = %summary.summary(), "schema synchronized");
                } else {
                    tracing::warn!(schema, result = %summary.summary(), "schema synchronized with failures");
                }
                BranchOutcome::Synced(summary)
            }
            Ok(Err(e)) => {
                tracing::error!(schema, error = %e, "schema synchronization failed");
                BranchOutcome::Failed(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(schema, panic = %message, "schema synchronization panicked");
                BranchOutcome::Failed(format!("panicked: {}", message))
            }
        }
    }

    /// Planned changes for `schema` without writing; `None` when disabled
    pub async fn plan(&self, schema: &str) -> Result<Option<BTreeMap<ResourceType, ChangePlan>>> {
        let snapshot = self.repository.snapshot(schema).await?;
        if !snapshot.is_propagation_enabled() {
            return Ok(None);
        }
        let plans = self
            .namespaces
            .plan(schema, &snapshot.desired_state())
            .await?;
        Ok(Some(plans))
    }

    async fn try_reconcile(&self, schema: &str) -> Result<Option<ReconcileSummary>> {
        let snapshot = self.repository.snapshot(schema).await?;

        match &snapshot.settings {
            None => {
                tracing::info!(schema, "no repository settings, skipping");
                return Ok(None);
            }
            Some(settings) if !settings.is_k8s_propagation_enabled() => {
                tracing::info!(schema, "k8s propagation disabled, skipping");
                return Ok(None);
            }
            Some(_) => {}
        }

        let desired = snapshot.desired_state();
        let summary = self.namespaces.reconcile(schema, &desired).await?;
        Ok(Some(summary))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
