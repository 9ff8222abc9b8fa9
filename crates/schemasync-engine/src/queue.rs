//! Deduplicating job queue keyed by schema name
//!
//! A schema is tracked at most once: queued, running, or running with a
//! re-run pending. Requests arriving while a schema is queued are absorbed;
//! requests arriving while it runs are remembered and re-queued on completion.
//! A schema is therefore never handed to two workers at the same time.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Tracking state of a schema in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    /// Running, and another run was requested meanwhile
    RunningPending,
}

/// A unit of work: reconcile one schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncJob {
    pub schema: String,
}

impl SyncJob {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    statuses: HashMap<String, JobStatus>,
    order: VecDeque<String>,
}

impl QueueState {
    fn pop(&mut self) -> Option<SyncJob> {
        let schema = self.order.pop_front()?;
        self.statuses.insert(schema.clone(), JobStatus::Running);
        Some(SyncJob { schema })
    }
}

/// Blocking, deduplicating FIFO of sync jobs
#[derive(Debug, Default)]
pub struct SyncJobQueue {
    state: Mutex<QueueState>,
    available: Notify,
}

impl SyncJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request a run for `schema`; never blocks
    ///
    /// Returns `true` when the schema was newly queued.
    pub fn add_job(&self, schema: &str) -> bool {
        let mut state = self.lock();
        match state.statuses.get(schema).copied() {
            None => {
                state.statuses.insert(schema.to_string(), JobStatus::Queued);
                state.order.push_back(schema.to_string());
                drop(state);
                self.available.notify_one();
                true
            }
            Some(JobStatus::Running) => {
                state
                    .statuses
                    .insert(schema.to_string(), JobStatus::RunningPending);
                false
            }
            Some(JobStatus::Queued | JobStatus::RunningPending) => false,
        }
    }

    /// Take the oldest queued job, waiting up to `wait` for one to arrive
    ///
    /// The returned job is marked running until `complete_job` is called.
    pub async fn take_job(&self, wait: Duration) -> Option<SyncJob> {
        let deadline = Instant::now() + wait;
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(job) = self.lock().pop() {
                return Some(job);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.lock().pop();
            }
        }
    }

    /// Mark a taken job finished, re-queueing it if a run was requested meanwhile
    pub fn complete_job(&self, job: &SyncJob) {
        let mut state = self.lock();
        match state.statuses.get(&job.schema).copied() {
            Some(JobStatus::RunningPending) => {
                state
                    .statuses
                    .insert(job.schema.clone(), JobStatus::Queued);
                state.order.push_back(job.schema.clone());
                drop(state);
                self.available.notify_one();
            }
            Some(JobStatus::Running) => {
                state.statuses.remove(&job.schema);
            }
            Some(JobStatus::Queued) | None => {
                tracing::warn!(schema = %job.schema, "completed a job that was not running");
            }
        }
    }

    /// Number of queued jobs, excluding running ones
    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self, schema: &str) -> Option<JobStatus> {
        self.lock().statuses.get(schema).copied()
    }
}
