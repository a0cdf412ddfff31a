//! CLI subcommands.

pub mod admin;
pub mod drops;
pub mod products;

use blessed_admin::backend::{BackendClient, BackendError};
use blessed_admin::config::{BackendConfig, ConfigError, DEFAULT_BACKEND_API_URL};
use blessed_admin::services::AuthError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend API call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Reading a file or stdin failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The import file is not valid YAML for the expected shape.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Password hashing failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Invalid input.
    #[error("{0}")]
    Invalid(String),
}

/// Backend client from `BACKEND_API_URL` and `BACKEND_API_TOKEN`.
///
/// # Errors
///
/// Returns `CliError::Config` if the URL or token fail validation.
pub fn backend_from_env() -> Result<BackendClient, CliError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("BACKEND_API_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_API_URL.to_owned());
    let token = std::env::var("BACKEND_API_TOKEN")
        .ok()
        .filter(|v| !v.trim().is_empty());
    if token.is_none() {
        tracing::warn!("BACKEND_API_TOKEN not set, mutations may be rejected");
    }

    let config = BackendConfig::new(&url, token)?;
    tracing::debug!(backend = %config.api_url, "Using backend");
    Ok(BackendClient::new(&config))
}
