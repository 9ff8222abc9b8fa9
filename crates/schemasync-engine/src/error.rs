//! Engine error types

use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Repository error: {0}")]
    Repository(#[from] schemasync_repo::RepoError),

    #[error("Cluster error: {0}")]
    Cluster(#[from] schemasync_kube::KubeError),

    #[error("Invalid engine configuration: {message}")]
    InvalidConfig { message: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
