//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SOUK_API_BASE_URL` - Base URL of the platform gateway (e.g., `https://shop.example.com`)
//!
//! ## Optional
//! - `SOUK_DATA_DIR` - Directory for durable client state (default: `.souk`)
//! - `SOUK_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `SOUK_SHIPPING_FEE` - Flat shipping fee (default: 5.99)
//! - `SOUK_FREE_SHIPPING_THRESHOLD` - Subtotal at which shipping is waived (default: 50)
//! - `SOUK_CURRENCY` - Payment currency code sent to the payment service (default: eur)
//! - `SOUK_PENDING_PAYMENT_MAX_AGE_SECS` - Maximum age of a persisted
//!   pending-payment record before it is ignored on resume. Unset means a
//!   record is trusted indefinitely, matching the platform's historical
//!   behavior.

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Souk client configuration.
#[derive(Debug, Clone)]
pub struct SoukConfig {
    /// Base URL of the platform gateway. Service paths (`/api/auth`,
    /// `/api/cart`, ...) are resolved against it.
    pub api_base_url: Url,
    /// Directory holding the durable client-side store.
    pub data_dir: PathBuf,
    /// Per-request timeout applied to the HTTP client.
    pub request_timeout: Duration,
    /// Flat shipping fee charged below the free-shipping threshold.
    pub shipping_fee: Decimal,
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Decimal,
    /// Currency code used when initiating payments.
    pub currency: String,
    /// Maximum age of a persisted pending-payment record before resume
    /// ignores it. `None` trusts a record indefinitely.
    pub pending_payment_max_age: Option<Duration>,
}

impl SoukConfig {
    /// Build a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            data_dir: PathBuf::from(".souk"),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            shipping_fee: Decimal::new(599, 2),
            free_shipping_threshold: Decimal::new(50, 0),
            currency: "eur".to_owned(),
            pending_payment_max_age: None,
        }
    }

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

        let api_base_url = get_required_env("SOUK_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SOUK_API_BASE_URL".to_owned(), e.to_string())
            })?;

        let mut config = Self::new(api_base_url);

        config.data_dir = PathBuf::from(get_env_or_default("SOUK_DATA_DIR", ".souk"));
        config.request_timeout = Duration::from_secs(parse_env_or_default(
            "SOUK_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        config.shipping_fee = parse_env_or_default("SOUK_SHIPPING_FEE", config.shipping_fee)?;
        config.free_shipping_threshold = parse_env_or_default(
            "SOUK_FREE_SHIPPING_THRESHOLD",
            config.free_shipping_threshold,
        )?;
        config.currency = get_env_or_default("SOUK_CURRENCY", &config.currency);
        config.pending_payment_max_age = get_optional_env("SOUK_PENDING_PAYMENT_MAX_AGE_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "SOUK_PENDING_PAYMENT_MAX_AGE_SECS".to_owned(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(config)
    }

    /// Base URL for a platform service, e.g. `service_url("auth")`.
    ///
    /// The result carries no trailing slash; endpoint paths are appended by
    /// the API clients.
    #[must_use]
    pub fn service_url(&self, service: &str) -> String {
        let base = self.api_base_url.as_str().trim_end_matches('/');
        format!("{base}/api/{service}")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(default),
    }
}
