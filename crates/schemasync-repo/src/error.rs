//! Error types for repository operations

use std::path::PathBuf;
use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error("Invalid repository configuration: {message}")]
    InvalidConfig { message: String },

    // ============ Schema Errors ============
    #[error("Schema not found: {name}")]
    SchemaNotFound { name: String },

    #[error("Invalid schema name: {name}")]
    InvalidSchemaName { name: String },

    #[error("Invalid resource file {path}: {message}")]
    InvalidResource { path: PathBuf, message: String },

    #[error("{kind} file {path} must be placed in {expected}")]
    MisplacedResource {
        path: PathBuf,
        kind: String,
        expected: PathBuf,
    },

    #[error("Duplicate {kind} '{name}' in schema {schema}")]
    DuplicateResource {
        schema: String,
        kind: String,
        name: String,
    },

    /// Injected by the mock repository
    #[error("Repository unavailable: {message}")]
    Unavailable { message: String },

    // ============ Watch Errors ============
    #[error("Watch error: {message}")]
    Watch { message: String },

    // ============ Wrapped Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Core(#[from] schemasync_core::CoreError),
}

impl From<notify::Error> for RepoError {
    fn from(e: notify::Error) -> Self {
        RepoError::Watch {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RepoError>;
