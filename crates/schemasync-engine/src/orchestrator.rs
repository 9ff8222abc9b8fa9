//! Sync orchestration
//!
//! On start every non-default schema is reconciled once over a bounded pool.
//! Afterwards a fixed set of workers drains the job queue, which is fed by
//! repository update events. Events generated by the engine itself are
//! filtered out so that synchronization never triggers itself.

use futures::StreamExt;
use futures::stream;
use schemasync_core::{EventRouter, EventSubscription, RepositoryUpdateEvent, is_external};
use schemasync_kube::ClusterService;
use schemasync_repo::RepositoryService;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::branch::{BranchOutcome, BranchReconciler};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::queue::SyncJobQueue;

/// Decides which repository events become sync jobs
pub type EventFilter = Arc<dyn Fn(&RepositoryUpdateEvent) -> bool + Send + Sync>;

/// Lifecycle of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Bootstrapping,
    SteadyState,
    Stopped,
}

/// Drives bootstrap and steady-state synchronization
pub struct SyncOrchestrator<R, C>
where
    R: RepositoryService,
    C: ClusterService,
{
    config: EngineConfig,
    branches: Arc<BranchReconciler<R, C>>,
    queue: Arc<SyncJobQueue>,
    router: EventRouter,
    filter: EventFilter,
    state: watch::Sender<OrchestratorState>,
}

impl<R, C> SyncOrchestrator<R, C>
where
    R: RepositoryService + 'static,
    C: ClusterService + 'static,
{
    /// Create an orchestrator; fails on invalid configuration
    pub fn new(
        config: EngineConfig,
        repository: Arc<R>,
        cluster: Arc<C>,
        router: EventRouter,
    ) -> Result<Self> {
        config.validate()?;
        let (state, _) = watch::channel(OrchestratorState::Bootstrapping);
        Ok(Self {
            config,
            branches: Arc::new(BranchReconciler::new(repository, cluster)),
            queue: Arc::new(SyncJobQueue::new()),
            router,
            filter: Arc::new(is_external),
            state,
        })
    }

    /// Replace the event filter (external events only, by default)
    pub fn with_event_filter(
        mut self,
        filter: impl Fn(&RepositoryUpdateEvent) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn queue(&self) -> &Arc<SyncJobQueue> {
        &self.queue
    }

    pub fn branches(&self) -> &BranchReconciler<R, C> {
        &self.branches
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions
    pub fn subscribe_state(&self) -> watch::Receiver<OrchestratorState> {
        self.state.subscribe()
    }

    /// Reconcile every non-default schema once
    ///
    /// A failed listing is logged and yields no outcomes.
    pub async fn bootstrap(&self) -> BTreeMap<String, BranchOutcome> {
        let schemas = match self.branches.repository().list_schemas().await {
            Ok(schemas) => schemas,
            Err(e) => {
                tracing::error!(error = %e, "failed to list schemas, skipping bootstrap");
                return BTreeMap::new();
            }
        };

        let schemas: Vec<String> = schemas
            .into_iter()
            .filter(|s| *s != self.config.default_branch)
            .collect();
        tracing::info!(
            schemas = schemas.len(),
            parallelism = self.config.sync_parallelism,
            "bootstrapping"
        );
        self.sync_schemas(schemas).await
    }

    /// Reconcile the given schemas, at most `syncParallelism` at a time
    pub async fn sync_schemas(
        &self,
        schemas: impl IntoIterator<Item = String>,
    ) -> BTreeMap<String, BranchOutcome> {
        let branches = &self.branches;
        stream::iter(schemas)
            .map(|schema| async move {
                let outcome = branches.reconcile(&schema).await;
                (schema, outcome)
            })
            .buffer_unordered(self.config.sync_parallelism)
            .collect()
            .await
    }

    /// Bootstrap, then process events until `shutdown` turns true
    ///
    /// Returns once every worker and the event task have exited.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        // Subscribe first so that changes made during bootstrap are not missed
        let subscription = self.router.subscribe();

        self.state.send_replace(OrchestratorState::Bootstrapping);
        tokio::select! {
            _ = stopped(&mut shutdown) => {
                tracing::info!("shutdown requested during bootstrap");
                self.state.send_replace(OrchestratorState::Stopped);
                return;
            }
            outcomes = self.bootstrap() => {
                let failed = outcomes.values().filter(|o| o.is_failed()).count();
                tracing::info!(schemas = outcomes.len(), failed, "bootstrap complete");
            }
        }

        let mut tasks: Vec<JoinHandle<()>> = (0..self.config.worker_count)
            .map(|id| self.spawn_worker(id, shutdown.clone()))
            .collect();
        tasks.push(self.spawn_event_task(subscription, shutdown.clone()));

        self.state.send_replace(OrchestratorState::SteadyState);
        tracing::info!(workers = self.config.worker_count, "entering steady state");

        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "sync task ended abnormally");
            }
        }

        self.state.send_replace(OrchestratorState::Stopped);
        tracing::info!("synchronization stopped");
    }

    fn spawn_worker(&self, id: usize, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let branches = Arc::clone(&self.branches);
        let queue = Arc::clone(&self.queue);
        let poll_interval = self.config.poll_interval;
        let idle_backoff = self.config.idle_backoff;

        tokio::spawn(async move {
            tracing::debug!(worker = id, "worker started");
            loop {
                let job = tokio::select! {
                    _ = stopped(&mut shutdown) => break,
                    job = queue.take_job(poll_interval) => job,
                };

                match job {
                    Some(job) => {
                        tracing::debug!(worker = id, schema = %job.schema, "running sync job");
                        branches.reconcile(&job.schema).await;
                        queue.complete_job(&job);
                    }
                    None => {
                        tokio::select! {
                            _ = stopped(&mut shutdown) => break,
                            _ = tokio::time::sleep(idle_backoff) => {}
                        }
                    }
                }
            }
            tracing::debug!(worker = id, "worker stopped");
        })
    }

    fn spawn_event_task(
        &self,
        mut subscription: EventSubscription,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let filter = Arc::clone(&self.filter);
        let default_branch = self.config.default_branch.clone();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = stopped(&mut shutdown) => break,
                    event = subscription.recv() => event,
                };
                let Some(event) = event else {
                    tracing::warn!("event router closed");
                    break;
                };

                if !filter(&event) {
                    tracing::debug!(schema = %event.schema, "ignoring self-generated event");
                    continue;
                }
                if event.schema == default_branch {
                    tracing::debug!(schema = %event.schema, "ignoring default branch event");
                    continue;
                }
                if queue.add_job(&event.schema) {
                    tracing::debug!(schema = %event.schema, "sync job queued");
                }
            }
        })
    }
}

/// Resolves once shutdown is requested or its sender is gone
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
