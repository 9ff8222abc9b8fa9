//! CLI commands

pub mod diff;
pub mod run;
pub mod schemas;
pub mod sync;

use schemasync_kube::KubeCluster;
use schemasync_repo::FileRepository;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;

/// Open the configured repository
pub fn open_repository(config: &AppConfig) -> Result<Arc<FileRepository>> {
    Ok(Arc::new(FileRepository::new(&config.repository.path)?))
}

/// Connect to the configured cluster
pub async fn connect_cluster(config: &AppConfig) -> Result<Arc<KubeCluster>> {
    let cluster = KubeCluster::with_context(config.kubernetes.context.as_deref()).await?;
    Ok(Arc::new(cluster))
}
