//! schemasync Kube - Kubernetes integration for schema synchronization
//!
//! This crate provides:
//! - **Cluster Service**: the `ClusterService` interface and its Kubernetes implementation
//!   over dynamic custom-resource APIs
//! - **Mock Cluster**: an in-memory cluster with call journal and failure injection
//! - **Change Planning**: pure hash-gated diff of desired entries against live objects
//! - **Namespace Reconciler**: executes a plan per resource type with per-object
//!   failure isolation

pub mod client;
pub mod cluster;
pub mod diff;
pub mod error;
pub mod labels;
pub mod mock;
pub mod reconcile;
pub mod resources;

pub use client::KubeCluster;
pub use cluster::ClusterService;
pub use diff::{ChangePlan, ChangeType, ResourceChange, needs_replace, plan_changes};
pub use error::{KubeError, Result};
pub use mock::{ClusterCall, ClusterOperation, ClusterOperationCounts, MockCluster};
pub use reconcile::{NamespaceReconciler, ReconcileSummary};
pub use resources::{CustomResource, ManagedResource, ResourceRef, api_resource};
