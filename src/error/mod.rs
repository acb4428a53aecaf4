//! Unified error handling for the sync tool

use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported provider type: {0}")]
    UnsupportedProvider(String),

    #[error("Keycloak error: {0}")]
    Keycloak(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
