//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    #[diagnostic(code(schemasync::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Repository access failed
    #[error("Repository error: {message}")]
    #[diagnostic(code(schemasync::cli::repository))]
    Repository {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Cluster access failed
    #[error("Cluster error: {message}")]
    #[diagnostic(code(schemasync::cli::cluster))]
    Cluster { message: String },

    /// One or more schemas failed to synchronize
    #[error("{failed} of {total} schema(s) failed to synchronize")]
    #[diagnostic(code(schemasync::cli::sync))]
    SyncFailed { failed: usize, total: usize },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(schemasync::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(schemasync::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Repository { .. } => exit_codes::REPOSITORY_ERROR,
            CliError::Cluster { .. } => exit_codes::CLUSTER_ERROR,
            CliError::SyncFailed { .. } => exit_codes::SYNC_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<schemasync_repo::RepoError> for CliError {
    fn from(err: schemasync_repo::RepoError) -> Self {
        use schemasync_repo::RepoError;

        let help = match &err {
            RepoError::SchemaNotFound { .. } => {
                Some("run `schemasync schemas` to list available schemas".to_string())
            }
            RepoError::InvalidConfig { .. } => {
                Some("set repository.path in the configuration file".to_string())
            }
            _ => None,
        };
        CliError::Repository {
            message: err.to_string(),
            help,
        }
    }
}

impl From<schemasync_kube::KubeError> for CliError {
    fn from(err: schemasync_kube::KubeError) -> Self {
        CliError::Cluster {
            message: err.to_string(),
        }
    }
}

impl From<schemasync_engine::EngineError> for CliError {
    fn from(err: schemasync_engine::EngineError) -> Self {
        use schemasync_engine::EngineError;

        match err {
            EngineError::Repository(e) => e.into(),
            EngineError::Cluster(e) => e.into(),
            EngineError::InvalidConfig { message } => CliError::config(message),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
