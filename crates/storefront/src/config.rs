//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `BACKEND_API_URL` - Backend REST API base (default: production API)
//! - `PAYMENT_SANDBOX` - Send buyers to the sandbox payment page (default: true)
//! - `MEDIA_ORIGIN` - Image CDN origin allowed by the CSP (default: Cloudinary)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use url::Url;

/// Production backend API.
pub const DEFAULT_BACKEND_API_URL: &str = "https://blessed-back-production.up.railway.app/api";

/// Default image CDN origin.
pub const DEFAULT_MEDIA_ORIGIN: &str = "https://res.cloudinary.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Backend API configuration
    pub backend: BackendConfig,
    /// Redirect to the sandbox payment page instead of the live one
    pub payment_sandbox: bool,
    /// Image CDN origin
    pub media_origin: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://api.example.com/api`
    pub api_url: Url,
}

impl BackendConfig {
    /// Parse a backend base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is malformed or not HTTP(S).
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_http_url("BACKEND_API_URL", api_url)?;
        Ok(Self { api_url })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        parse_http_url("STOREFRONT_BASE_URL", &base_url)?;

        let backend = BackendConfig::new(&get_env_or_default(
            "BACKEND_API_URL",
            DEFAULT_BACKEND_API_URL,
        ))?;
        let payment_sandbox = parse_bool("PAYMENT_SANDBOX", true)?;
        let media_origin = get_env_or_default("MEDIA_ORIGIN", DEFAULT_MEDIA_ORIGIN);

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            payment_sandbox,
            media_origin,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default literal.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag (`true/false/1/0/yes/no`).
fn parse_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match get_optional_env(key) {
        None => Ok(default),
        Some(value) => parse_bool_value(&value)
            .ok_or_else(|| ConfigError::InvalidEnvVar(key.to_string(), format!("not a boolean: {value}"))),
    }
}

fn parse_bool_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an absolute HTTP(S) URL.
fn parse_http_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_value() {
        assert_eq!(parse_bool_value("TRUE"), Some(true));
        assert_eq!(parse_bool_value(" 0 "), Some(false));
        assert_eq!(parse_bool_value("maybe"), None);
    }

    #[test]
    fn test_backend_config_rejects_non_http() {
        assert!(BackendConfig::new("ftp://api.test").is_err());
        assert!(BackendConfig::new("not a url").is_err());
        let config = BackendConfig::new("http://127.0.0.1:8080/api").unwrap();
        assert_eq!(config.api_url.path(), "/api");
    }

    #[test]
    fn test_default_backend_url_is_valid() {
        assert!(BackendConfig::new(DEFAULT_BACKEND_API_URL).is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "0.0.0.0".parse().unwrap(),
            port: 3000,
            base_url: "https://blessed.test".to_string(),
            backend: BackendConfig::new(DEFAULT_BACKEND_API_URL).unwrap(),
            payment_sandbox: true,
            media_origin: DEFAULT_MEDIA_ORIGIN.to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3000");
        assert!(config.is_secure());
    }
}
