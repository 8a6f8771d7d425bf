//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GIFTIFY_CATALOG_URL` - Catalog service base URL (default: `https://localhost:8443`)
//! - `GIFTIFY_CATALOG_TIMEOUT_SECS` - Catalog request timeout in seconds (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (e.g., production, staging)

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Catalog service used when `GIFTIFY_CATALOG_URL` is unset.
pub const DEFAULT_CATALOG_URL: &str = "https://localhost:8443";

const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;

const CATALOG_URL_VAR: &str = "GIFTIFY_CATALOG_URL";

/// Path of the product listing, relative to the catalog base URL.
const PRODUCTS_PATH: [&str; 2] = ["api", "products"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Catalog service configuration
    pub catalog: CatalogConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Catalog service configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog service
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    products_url: Url,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = get_env_or_default(CATALOG_URL_VAR, DEFAULT_CATALOG_URL);
        let timeout_secs = get_env_or_default(
            "GIFTIFY_CATALOG_TIMEOUT_SECS",
            &DEFAULT_CATALOG_TIMEOUT_SECS.to_string(),
        );
        let timeout = parse_timeout("GIFTIFY_CATALOG_TIMEOUT_SECS", &timeout_secs)?;

        let catalog = CatalogConfig::new(&base_url)?.with_timeout(timeout);

        Ok(Self {
            catalog,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl CatalogConfig {
    /// Build catalog configuration for a base URL.
    ///
    /// The base may carry a path prefix (`https://shop.example/gifts/`); the
    /// product listing is resolved beneath it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or is
    /// not an `http`/`https` URL with a host.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url)?;
        let products_url = resolve_products_url(&base_url)?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_CATALOG_TIMEOUT_SECS),
            products_url,
        })
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL of the product listing endpoint.
    #[must_use]
    pub const fn products_url(&self) -> &Url {
        &self.products_url
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a positive timeout in whole seconds.
fn parse_timeout(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "timeout must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse and validate the catalog base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid =
        |reason: String| ConfigError::InvalidEnvVar(CATALOG_URL_VAR.to_string(), reason);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL must have a host".to_string()));
    }
    Ok(url)
}

/// Append the product listing path to the base URL, keeping any prefix.
fn resolve_products_url(base_url: &Url) -> Result<Url, ConfigError> {
    let mut url = base_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| {
            ConfigError::InvalidEnvVar(
                CATALOG_URL_VAR.to_string(),
                "URL cannot be a base".to_string(),
            )
        })?
        .pop_if_empty()
        .extend(PRODUCTS_PATH);
    Ok(url)
}
