//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown resource kind: {kind}")]
    UnknownKind { kind: String },

    #[error("Invalid resource document: {message}")]
    InvalidResource { message: String },

    #[error("Invalid repository settings: {message}")]
    InvalidSettings { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
