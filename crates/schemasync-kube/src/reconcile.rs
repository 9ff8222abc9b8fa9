//! Namespace reconciliation
//!
//! Brings one schema's namespace in line with its desired state. Listing is
//! done for every manageable type before any write; the writes themselves are
//! isolated so that one failing object never stops the others.

use schemasync_core::{DesiredState, ResourceEntry, ResourceType};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cluster::ClusterService;
use crate::diff::{ChangePlan, ChangeType, ResourceChange, plan_changes};
use crate::error::{KubeError, Result};
use crate::resources::{CustomResource, ResourceRef};

/// Outcome of reconciling one namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileSummary {
    pub schema: String,
    /// `Kind/name` of created objects
    pub created: Vec<String>,
    pub replaced: Vec<String>,
    pub deleted: Vec<String>,
    /// Desired objects already up to date
    pub unchanged: usize,
    /// Objects whose write failed, with the error
    pub failed: Vec<(String, String)>,
}

impl ReconcileSummary {
    fn new(schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            ..Default::default()
        }
    }

    /// Check if all writes succeeded
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.created.len() + self.replaced.len() + self.deleted.len()
    }

    /// Format as human-readable summary
    pub fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(5);
        if !self.created.is_empty() {
            parts.push(format!("{} created", self.created.len()));
        }
        if !self.replaced.is_empty() {
            parts.push(format!("{} replaced", self.replaced.len()));
        }
        if !self.deleted.is_empty() {
            parts.push(format!("{} deleted", self.deleted.len()));
        }
        if self.unchanged > 0 {
            parts.push(format!("{} unchanged", self.unchanged));
        }
        if !self.failed.is_empty() {
            parts.push(format!("{} failed", self.failed.len()));
        }
        if parts.is_empty() {
            "No resources".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Reconciles namespaces against desired state through a `ClusterService`
pub struct NamespaceReconciler<C: ClusterService> {
    cluster: Arc<C>,
}

impl<C: ClusterService> Clone for NamespaceReconciler<C> {
    fn clone(&self) -> Self {
        Self {
            cluster: Arc::clone(&self.cluster),
        }
    }
}

impl<C: ClusterService> NamespaceReconciler<C> {
    pub fn new(cluster: Arc<C>) -> Self {
        Self { cluster }
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    /// Plan every manageable type without writing anything
    ///
    /// The namespace is not created; a missing namespace simply lists empty.
    pub async fn plan(
        &self,
        schema: &str,
        desired: &DesiredState,
    ) -> Result<BTreeMap<ResourceType, ChangePlan>> {
        let empty = BTreeMap::new();
        let mut plans = BTreeMap::new();
        for kind in ResourceType::manageable() {
            let live = self.cluster.list_resources(schema, kind).await?;
            let wanted = desired.get(&kind).unwrap_or(&empty);
            plans.insert(kind, plan_changes(kind, wanted, &live));
        }
        Ok(plans)
    }

    /// Converge the namespace named `schema` to `desired`
    ///
    /// Namespace and listing failures are returned; individual write failures
    /// are logged and collected in the summary.
    pub async fn reconcile(&self, schema: &str, desired: &DesiredState) -> Result<ReconcileSummary> {
        self.cluster.ensure_namespace(schema).await?;
        let plans = self.plan(schema, desired).await?;

        let empty = BTreeMap::new();
        let mut summary = ReconcileSummary::new(schema);
        for (kind, plan) in plans {
            summary.unchanged += plan.unchanged;
            let wanted = desired.get(&kind).unwrap_or(&empty);
            for change in &plan.changes {
                self.apply_change(schema, change, wanted, &mut summary).await;
            }
        }

        tracing::debug!(schema, result = %summary.summary(), "namespace reconciled");
        Ok(summary)
    }

    async fn apply_change(
        &self,
        schema: &str,
        change: &ResourceChange,
        wanted: &BTreeMap<String, ResourceEntry>,
        summary: &mut ReconcileSummary,
    ) {
        let display = change.display_name();
        match self.execute(schema, change, wanted).await {
            Ok(()) => {
                let action = match change.change_type {
                    ChangeType::Create => {
                        summary.created.push(display);
                        "created"
                    }
                    ChangeType::Replace => {
                        summary.replaced.push(display);
                        "replaced"
                    }
                    ChangeType::Delete => {
                        summary.deleted.push(display);
                        "deleted"
                    }
                };
                tracing::info!(schema, kind = %change.kind, name = %change.name, "{}", action);
            }
            Err(e) => {
                tracing::error!(
                    schema,
                    kind = %change.kind,
                    name = %change.name,
                    error = %e,
                    "failed to {:?} resource",
                    change.change_type
                );
                summary.failed.push((display, e.to_string()));
            }
        }
    }

    async fn execute(
        &self,
        schema: &str,
        change: &ResourceChange,
        wanted: &BTreeMap<String, ResourceEntry>,
    ) -> Result<()> {
        match change.change_type {
            ChangeType::Create | ChangeType::Replace => {
                let entry = wanted.get(&change.name).ok_or_else(|| {
                    KubeError::InvalidResource(format!(
                        "{} planned without a desired entry",
                        change.display_name()
                    ))
                })?;
                let resource = CustomResource::from_entry(entry, schema);
                if change.change_type == ChangeType::Create {
                    self.cluster.create(schema, &resource).await
                } else {
                    self.cluster.replace(schema, &resource).await
                }
            }
            ChangeType::Delete => {
                let target = ResourceRef::new(change.kind, change.name.clone());
                self.cluster.delete(schema, &target).await
            }
        }
    }
}
