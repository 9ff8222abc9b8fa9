//! schemasync CLI - keeps Kubernetes custom resources in sync with schema branches

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod display;
mod error;
mod exit_codes;
mod logging;

use config::AppConfig;
use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "schemasync")]
#[command(version)]
#[command(about = "Keeps Kubernetes custom resources in sync with schema branches", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ~/.config/schemasync/config.yaml)
    #[arg(long, global = true, env = "SCHEMASYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize all schemas, then follow repository changes until interrupted
    Run,

    /// Synchronize schemas once
    Sync {
        /// Schemas to synchronize (default: every schema except the default branch)
        schemas: Vec<String>,
    },

    /// List schemas and their propagation setting
    Schemas {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the changes a sync of a schema would make
    Diff {
        /// Schema name
        schema: String,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();

    if let Err(e) = execute(cli) {
        let code = e.exit_code();
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(code);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init_tracing(&config.logging.level, cli.debug);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::internal(format!("failed to start runtime: {}", e)))?;

    runtime.block_on(async {
        match cli.command {
            Commands::Run => commands::run::run(&config).await,
            Commands::Sync { schemas } => commands::sync::run(&config, &schemas).await,
            Commands::Schemas { json } => commands::schemas::run(&config, json).await,
            Commands::Diff { schema } => commands::diff::run(&config, &schema).await,
        }
    })
}
