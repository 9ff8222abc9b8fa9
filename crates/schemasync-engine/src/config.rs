//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{EngineError, Result};

/// Tuning of the synchronization engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Schemas reconciled at once during bootstrap
    pub sync_parallelism: usize,

    /// Persistent workers draining the job queue
    pub worker_count: usize,

    /// Branch excluded from synchronization
    pub default_branch: String,

    /// How long a worker waits for a job before backing off
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Sleep after an empty wait
    #[serde(with = "humantime_serde")]
    pub idle_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sync_parallelism: 3,
            worker_count: 3,
            default_branch: "master".to_string(),
            poll_interval: Duration::from_secs(1),
            idle_backoff: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sync_parallelism == 0 {
            return Err(EngineError::InvalidConfig {
                message: "syncParallelism must be at least 1".to_string(),
            });
        }
        if self.worker_count == 0 {
            return Err(EngineError::InvalidConfig {
                message: "workerCount must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
