//! Schemas command - list schema branches and their settings

use console::style;
use schemasync_core::PropagationMode;
use schemasync_repo::RepositoryService;
use serde::Serialize;

use super::open_repository;
use crate::config::AppConfig;
use crate::error::{CliError, Result};

/// One row of the listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    pub name: String,
    pub default_branch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation: Option<PropagationMode>,
    /// Manageable resources declared in the branch
    pub resources: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run the schemas command
pub async fn run(config: &AppConfig, output_json: bool) -> Result<()> {
    let repository = open_repository(config)?;

    let mut rows = Vec::new();
    for name in repository.list_schemas().await? {
        let default_branch = name == config.repository.default_branch;
        let row = match repository.snapshot(&name).await {
            Ok(snapshot) => SchemaInfo {
                propagation: Some(
                    snapshot
                        .settings
                        .as_ref()
                        .map(|s| s.k8s_propagation)
                        .unwrap_or_default(),
                ),
                resources: snapshot
                    .resources
                    .iter()
                    .filter(|r| r.kind.is_k8s_resource())
                    .count(),
                error: None,
                name,
                default_branch,
            },
            Err(e) => SchemaInfo {
                propagation: None,
                resources: 0,
                error: Some(e.to_string()),
                name,
                default_branch,
            },
        };
        rows.push(row);
    }

    if output_json {
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No schemas found in {}", repository.root().display());
        return Ok(());
    }

    println!(
        "{:<30} {:<12} {:<10}",
        style("NAME").bold(),
        style("PROPAGATION").bold(),
        style("RESOURCES").bold()
    );
    for row in rows {
        let propagation = match (&row.error, row.propagation) {
            (Some(_), _) => style("invalid".to_string()).red(),
            _ if row.default_branch => style("default".to_string()).dim(),
            (None, Some(PropagationMode::Sync)) => style("sync".to_string()).green(),
            (None, _) => style("off".to_string()).dim(),
        };
        println!("{:<30} {:<12} {:<10}", row.name, propagation, row.resources);
        if let Some(error) = &row.error {
            println!("  {} {}", style("✗").red(), error);
        }
    }

    Ok(())
}
