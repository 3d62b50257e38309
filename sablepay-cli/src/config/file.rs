//! TOML file configuration structures.
//!
//! These structs directly map to the `sablepay.toml` file format. Every
//! section is optional so credentials can come from the environment alone.

use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub sablepay: SablePayConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Account and transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SablePayConfig {
    /// Secret API key; `SABLEPAY_API_KEY` takes precedence.
    pub api_key: Option<String>,
    /// Merchant UUID; `SABLEPAY_MERCHANT_ID` takes precedence.
    pub merchant_id: Option<String>,
    /// API root. Derived from the API key prefix when absent.
    pub base_url: Option<Url>,
    /// Log every request and response at debug level.
    #[serde(default)]
    pub enable_logging: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SablePayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            merchant_id: None,
            base_url: None,
            enable_logging: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Status polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_interval_ms() -> u64 {
    3_000
}

fn default_max_attempts() -> u32 {
    60
}

/// Backoff for transient request failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_jitter() -> f64 {
    0.2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[sablepay]
api_key = "sable_sk_sand_hKKTWrlP"
merchant_id = "6f1c2b9e-5d1a-4c8e-9a55-0d3f3e2b7c11"
base_url = "https://sandbox-api.sablepay.io/api/v1/"
enable_logging = true

[polling]
interval_ms = 5000
max_attempts = 72

[retry]
max_retries = 0
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.sablepay.api_key.as_deref(),
            Some("sable_sk_sand_hKKTWrlP")
        );
        assert!(config.sablepay.enable_logging);
        assert_eq!(config.sablepay.request_timeout_secs, 30);
        assert_eq!(config.polling.interval_ms, 5000);
        assert_eq!(config.polling.max_attempts, 72);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.retry.base_delay_ms, 500);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.sablepay.api_key.is_none());
        assert_eq!(config.polling.interval_ms, 3000);
        assert_eq!(config.polling.max_attempts, 60);
        assert_eq!(config.retry.multiplier, 2.0);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let toml_str = r#"
[polling]
interval = 5000
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
