//! Octelium IdP Sync
//!
//! Reads users and groups from an Identity Provider (Keycloak), maps IdP
//! groups onto Octelium groups and renders declarative Octelium manifests.

pub mod cli;
pub mod config;
pub mod error;
pub mod keycloak;
pub mod manifest;
pub mod mapping;
pub mod provider;
pub mod sync;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
