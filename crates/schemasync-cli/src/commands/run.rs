//! Run command - synchronize continuously until interrupted

use schemasync_core::EventRouter;
use schemasync_engine::SyncOrchestrator;
use schemasync_repo::RepositoryWatcher;
use std::sync::Arc;
use tokio::sync::watch;

use super::{connect_cluster, open_repository};
use crate::config::AppConfig;
use crate::error::{CliError, Result};

/// Run the daemon
pub async fn run(config: &AppConfig) -> Result<()> {
    let repository = open_repository(config)?;
    let cluster = connect_cluster(config).await?;
    let router = EventRouter::new();

    let orchestrator = Arc::new(SyncOrchestrator::new(
        config.engine_config(),
        repository.clone(),
        cluster,
        router.clone(),
    )?);

    // Dropping the watcher stops filesystem notifications
    let _watcher = if config.watch_enabled() {
        Some(RepositoryWatcher::start(
            repository.root(),
            &config.repository.default_branch,
            router,
        )?)
    } else {
        tracing::info!("repository watch disabled");
        None
    };

    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.run(shutdown_rx).await })
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("interrupt received, shutting down");
    let _ = shutdown.send(true);

    handle
        .await
        .map_err(|e| CliError::internal(format!("sync task failed: {}", e)))?;
    Ok(())
}
