//! Diff command - show what a sync would change

use console::style;
use schemasync_engine::BranchReconciler;

use super::{connect_cluster, open_repository};
use crate::config::AppConfig;
use crate::display;
use crate::error::Result;

/// Print the planned changes for `schema` without writing
pub async fn run(config: &AppConfig, schema: &str) -> Result<()> {
    let repository = open_repository(config)?;
    let cluster = connect_cluster(config).await?;
    let branches = BranchReconciler::new(repository, cluster);

    match branches.plan(schema).await? {
        Some(plans) => display::print_plans(schema, &plans),
        None => println!(
            "{} propagation is disabled for {}, nothing would be synchronized",
            style("-").dim(),
            style(schema).bold()
        ),
    }
    Ok(())
}
