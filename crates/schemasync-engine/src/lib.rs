//! schemasync Engine - keeps cluster namespaces in line with schema branches
//!
//! This crate provides:
//! - **Sync Job Queue**: deduplicating work queue keyed by schema name
//! - **Branch Reconciler**: snapshot, settings gate and namespace reconciliation
//!   for one schema, never failing its caller
//! - **Sync Orchestrator**: bootstrap sweep over a bounded pool, then
//!   event-driven workers until shutdown

pub mod branch;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod queue;

pub use branch::{BranchOutcome, BranchReconciler};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use orchestrator::{EventFilter, OrchestratorState, SyncOrchestrator};
pub use queue::{JobStatus, SyncJob, SyncJobQueue};
