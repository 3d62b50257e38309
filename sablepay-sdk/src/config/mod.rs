//! Client configuration for SablePay.
//!
//! A [`ClientConfig`] is supplied once when a client is constructed and is
//! treated as immutable afterwards; share it behind an `Arc`.

mod environment;
mod retry;

pub use environment::{Environment, PRODUCTION_BASE_URL, SANDBOX_BASE_URL};
pub use retry::RetryPolicy;

use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Default interval between two status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default upper bound on status polls per session.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

/// Default timeout for a single HTTP round-trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors produced while validating a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("api key is empty")]
    MissingApiKey,

    #[error("merchant id is not a valid UUID: {0}")]
    InvalidMerchantId(String),

    #[error("base url {0} cannot be used as an API root")]
    InvalidBaseUrl(String),

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(String),
}

/// Immutable configuration shared by the client, the poller, and flows.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Secret API key (`sable_sk_sand_…` or `sable_sk_live_…`).
    pub api_key: String,
    pub merchant_id: Uuid,
    /// API root, always ending in `/` (e.g. `https://api.sablepay.io/api/v1/`).
    pub base_url: Url,
    /// Emit per-request debug logs.
    pub enable_logging: bool,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Create a configuration with default polling and retry settings.
    ///
    /// The base URL is normalized to end with a `/` so that endpoint paths
    /// join below it rather than replacing its last segment.
    pub fn new(
        api_key: impl Into<String>,
        merchant_id: &str,
        base_url: Url,
    ) -> Result<Self, ConfigError> {
        let merchant_id = Uuid::parse_str(merchant_id.trim())
            .map_err(|_| ConfigError::InvalidMerchantId(merchant_id.to_owned()))?;
        let config = Self {
            api_key: api_key.into(),
            merchant_id,
            base_url: normalize_base_url(base_url)?,
            enable_logging: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration whose base URL is derived from the API key's
    /// environment prefix.
    pub fn for_api_key(api_key: impl Into<String>, merchant_id: &str) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        let environment = Environment::detect(&api_key).unwrap_or_default();
        Self::new(api_key, merchant_id, environment.base_url()?)
    }

    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The environment implied by the API key prefix, if recognizable.
    pub fn environment(&self) -> Option<Environment> {
        Environment::detect(&self.api_key)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.base_url.cannot_be_a_base() || !self.base_url.path().ends_with('/') {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        self.retry.validate()
    }
}

fn normalize_base_url(mut url: Url) -> Result<Url, ConfigError> {
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl(url.to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MERCHANT: &str = "79b909ae-b0f1-702b-4a07-b1bcf8e7b7cd";

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::new(
            "sable_sk_sand_abc",
            MERCHANT,
            Url::parse("https://sandbox-api.sablepay.io/api/v1").unwrap(),
        )
        .unwrap();
        assert_eq!(
            config.base_url.as_str(),
            "https://sandbox-api.sablepay.io/api/v1/"
        );
        assert_eq!(
            config.base_url.join("payments").unwrap().as_str(),
            "https://sandbox-api.sablepay.io/api/v1/payments"
        );
    }

    #[test]
    fn test_rejects_invalid_values() {
        let url = Url::parse("https://api.sablepay.io/api/v1/").unwrap();
        assert_eq!(
            ClientConfig::new("  ", MERCHANT, url.clone()).unwrap_err(),
            ConfigError::MissingApiKey
        );
        assert!(matches!(
            ClientConfig::new("key", "not-a-uuid", url.clone()),
            Err(ConfigError::InvalidMerchantId(_))
        ));

        let config = ClientConfig::new("key", MERCHANT, url)
            .unwrap()
            .with_polling(Duration::ZERO, 10);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));
    }

    #[test]
    fn test_for_api_key_picks_environment() {
        let live = ClientConfig::for_api_key("sable_sk_live_xyz", MERCHANT).unwrap();
        assert_eq!(live.environment(), Some(Environment::Production));
        assert_eq!(live.base_url, Environment::Production.base_url().unwrap());

        let sandbox = ClientConfig::for_api_key("sable_sk_sand_xyz", MERCHANT).unwrap();
        assert_eq!(sandbox.base_url, Environment::Sandbox.base_url().unwrap());
        assert_eq!(sandbox.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(sandbox.max_poll_attempts, DEFAULT_MAX_POLL_ATTEMPTS);
    }
}
