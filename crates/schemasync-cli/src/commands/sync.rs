//! Sync command - one-shot reconciliation

use schemasync_engine::SyncOrchestrator;
use schemasync_core::EventRouter;
use schemasync_repo::RepositoryService;

use super::{connect_cluster, open_repository};
use crate::config::AppConfig;
use crate::display;
use crate::error::{CliError, Result};

/// Reconcile `schemas`, or every non-default schema when empty
pub async fn run(config: &AppConfig, schemas: &[String]) -> Result<()> {
    let repository = open_repository(config)?;

    let targets: Vec<String> = if schemas.is_empty() {
        repository
            .list_schemas()
            .await?
            .into_iter()
            .filter(|s| *s != config.repository.default_branch)
            .collect()
    } else {
        schemas.to_vec()
    };

    let cluster = connect_cluster(config).await?;
    let orchestrator = SyncOrchestrator::new(
        config.engine_config(),
        repository,
        cluster,
        EventRouter::new(),
    )?;

    let outcomes = orchestrator.sync_schemas(targets).await;
    display::print_outcomes(&outcomes);

    let failed = outcomes.values().filter(|o| o.is_failed()).count();
    if failed > 0 {
        return Err(CliError::SyncFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}
