//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `NEXUSKART_API_BASE_URL` - Backend REST base URL (default: `http://localhost:8085/api`)
//! - `NEXUSKART_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `NEXUSKART_CACHE_TTL_SECS` - Product/image cache TTL (default: 300)
//! - `NEXUSKART_SESSION_PATH` - Session file location (default: `.nexuskart/session.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8085/api";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_CACHE_TTL_SECS: &str = "300";
const DEFAULT_SESSION_PATH: &str = ".nexuskart/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend REST API configuration
    pub api: ApiConfig,
    /// Where the logged-in session and cart are persisted
    pub session_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Upper bound on a single request, connect through body
    pub request_timeout: Duration,
    /// How long product details and images stay cached
    pub cache_ttl: Duration,
}

impl ApiConfig {
    /// Build an API configuration for a base URL with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL cannot be parsed.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("NEXUSKART_API_BASE_URL", base_url)?,
            request_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
        })
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let session_path = PathBuf::from(get_env_or_default(
            "NEXUSKART_SESSION_PATH",
            DEFAULT_SESSION_PATH,
        ));

        Ok(Self {
            api,
            session_path,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(
            "NEXUSKART_API_BASE_URL",
            &get_env_or_default("NEXUSKART_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;
        let request_timeout = get_positive_secs(
            "NEXUSKART_REQUEST_TIMEOUT_SECS",
            &get_env_or_default("NEXUSKART_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        )?;
        let cache_ttl = get_positive_secs(
            "NEXUSKART_CACHE_TTL_SECS",
            &get_env_or_default("NEXUSKART_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
        )?;

        Ok(Self {
            base_url,
            request_timeout,
            cache_ttl,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a base URL, normalizing it to end with a slash so relative joins
/// keep the `/api` prefix.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut normalized = value.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Parse a strictly positive number of seconds.
fn get_positive_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("TEST", "http://localhost:8085/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8085/api/");
        assert_eq!(
            url.join("products").unwrap().as_str(),
            "http://localhost:8085/api/products"
        );
    }

    #[test]
    fn test_parse_base_url_keeps_existing_slash() {
        let url = parse_base_url("TEST", "https://shop.example.com/api/").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/api/");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let err = parse_base_url("TEST", "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "TEST"));
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        assert!(parse_base_url("TEST", "ftp://files.example.com").is_err());
    }

    #[test]
    fn test_positive_secs() {
        assert_eq!(
            get_positive_secs("TEST", "15").unwrap(),
            Duration::from_secs(15)
        );
        assert!(get_positive_secs("TEST", "0").is_err());
        assert!(get_positive_secs("TEST", "-1").is_err());
        assert!(get_positive_secs("TEST", "soon").is_err());
    }

    #[test]
    fn test_with_base_url_defaults() {
        let config = ApiConfig::with_base_url("http://127.0.0.1:9000/api").unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }
}
