//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FUSION_API_BASE_URL` - Deployed web-app URL (`http` or `https`)
//!
//! ## Optional
//! - `FUSION_STORAGE_DIR` - Directory for the file-backed store (default: .fusion)
//! - `FUSION_REQUEST_TIMEOUT_SECS` - Per-request deadline in seconds (default: 10)
//! - `FUSION_CACHE_TTL_SECS` - Lifetime of cached read responses (default: 300)
//! - `FUSION_LANGUAGE` - Overrides the `language` setting
//! - `FUSION_FEED_URL` - Blogger feed to load products from instead of the backend
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::api::ApiOptions;

const API_BASE_URL: &str = "FUSION_API_BASE_URL";
const STORAGE_DIR: &str = "FUSION_STORAGE_DIR";
const REQUEST_TIMEOUT_SECS: &str = "FUSION_REQUEST_TIMEOUT_SECS";
const CACHE_TTL_SECS: &str = "FUSION_CACHE_TTL_SECS";
const LANGUAGE: &str = "FUSION_LANGUAGE";
const FEED_URL: &str = "FUSION_FEED_URL";
const SENTRY_DSN: &str = "SENTRY_DSN";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend endpoint
    pub api_base_url: Url,
    /// Directory holding the cart and wishlist files
    pub storage_dir: PathBuf,
    /// Deadline for each backend call
    pub request_timeout: Duration,
    /// Lifetime of cached settings, products and text map
    pub cache_ttl: Duration,
    /// Language override
    pub language: Option<String>,
    /// Product feed replacing `getProducts`
    pub feed_url: Option<Url>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let api_base_url = parse_http_url(API_BASE_URL, &env.required(API_BASE_URL)?)?;
        let feed_url = env
            .optional(FEED_URL)
            .map(|raw| parse_http_url(FEED_URL, &raw))
            .transpose()?;

        let storage_dir = PathBuf::from(env.or_default(STORAGE_DIR, ".fusion"));

        let request_timeout = Duration::from_secs(env.seconds(REQUEST_TIMEOUT_SECS, 10)?);
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                REQUEST_TIMEOUT_SECS.to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let cache_ttl = Duration::from_secs(env.seconds(CACHE_TTL_SECS, 300)?);

        Ok(Self {
            api_base_url,
            storage_dir,
            request_timeout,
            cache_ttl,
            language: env.optional(LANGUAGE),
            feed_url,
            sentry_dsn: env.optional(SENTRY_DSN),
        })
    }

    /// Client options derived from this configuration.
    #[must_use]
    pub const fn api_options(&self) -> ApiOptions {
        ApiOptions {
            cache_ttl: self.cache_ttl,
            timeout: self.request_timeout,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an `http` or `https` URL.
fn parse_http_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable; blank counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a whole number of seconds with a default value.
    fn seconds(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        self.optional(key).map_or(Ok(default), |v| {
            v.parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[(API_BASE_URL, "https://script.google.com/macros/s/x/exec")]).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from(".fusion"));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.language, None);
        assert_eq!(config.feed_url, None);
        assert_eq!(config.sentry_dsn, None);
        assert_eq!(config.api_options().timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == API_BASE_URL));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = load(&[(API_BASE_URL, "ftp://example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(load(&[(API_BASE_URL, "not a url")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (API_BASE_URL, "http://127.0.0.1:9000/exec"),
            (STORAGE_DIR, "/tmp/fusion"),
            (REQUEST_TIMEOUT_SECS, "3"),
            (CACHE_TTL_SECS, "0"),
            (LANGUAGE, "ar"),
            (SENTRY_DSN, " "),
        ])
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.language.as_deref(), Some("ar"));
        assert_eq!(config.sentry_dsn, None);
    }

    #[test]
    fn test_feed_url() {
        let base = (API_BASE_URL, "https://x.test/exec");
        let config = load(&[base, (FEED_URL, "https://shop.blogspot.com/feeds/posts/default")]).unwrap();
        assert_eq!(
            config.feed_url.as_ref().map(Url::as_str),
            Some("https://shop.blogspot.com/feeds/posts/default")
        );

        let err = load(&[base, (FEED_URL, "file:///tmp/feed.json")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == FEED_URL));
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(load(&[(API_BASE_URL, "https://x.test"), (REQUEST_TIMEOUT_SECS, "soon")]).is_err());
        assert!(load(&[(API_BASE_URL, "https://x.test"), (REQUEST_TIMEOUT_SECS, "0")]).is_err());
    }
}
