//! Configuration module for the `sablepay` binary.
//!
//! Handles loading configuration from a TOML file and applying the
//! command-line / environment overrides on top of it.

pub mod file;

use crate::config::file::{FileConfig, RetryConfig};
use sablepay_sdk::config::{ClientConfig, Environment, RetryPolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("missing {0}: set it in the config file or the environment")]
    MissingValue(&'static str),

    #[error(transparent)]
    InvalidClientConfig(#[from] sablepay_sdk::config::ConfigError),
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub merchant_id: Option<String>,
    pub base_url: Option<Url>,
    pub enable_logging: bool,
}

/// Configuration loader that merges the file with the overrides.
pub struct ConfigLoader {
    config_path: PathBuf,
    /// Whether the path was named explicitly; a missing default file is fine.
    required: bool,
    overrides: Overrides,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, required: bool, overrides: Overrides) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            required,
            overrides,
        }
    }

    /// Load the file (if any), apply overrides, and build a validated
    /// [`ClientConfig`].
    pub fn load(&self) -> Result<ClientConfig, ConfigError> {
        let file_config = self.read_file()?;
        self.build(file_config)
    }

    fn read_file(&self) -> Result<FileConfig, ConfigError> {
        match std::fs::read_to_string(&self.config_path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.required => {
                tracing::debug!(path = ?self.config_path, "No config file, using environment only");
                Ok(FileConfig::default())
            }
            Err(source) => Err(ConfigError::IoError {
                path: self.config_path.clone(),
                source,
            }),
        }
    }

    fn build(&self, file_config: FileConfig) -> Result<ClientConfig, ConfigError> {
        let FileConfig {
            sablepay,
            polling,
            retry,
        } = file_config;

        let api_key = non_blank(self.overrides.api_key.clone())
            .or(non_blank(sablepay.api_key))
            .ok_or(ConfigError::MissingValue("api key (SABLEPAY_API_KEY)"))?;
        let merchant_id = non_blank(self.overrides.merchant_id.clone())
            .or(non_blank(sablepay.merchant_id))
            .ok_or(ConfigError::MissingValue("merchant id (SABLEPAY_MERCHANT_ID)"))?;
        let base_url = match self.overrides.base_url.clone().or(sablepay.base_url) {
            Some(url) => url,
            None => {
                let environment = Environment::detect(&api_key).unwrap_or_else(|| {
                    tracing::warn!("API key prefix not recognized, defaulting to sandbox");
                    Environment::Sandbox
                });
                environment.base_url()?
            }
        };

        let config = ClientConfig::new(api_key, &merchant_id, base_url)?
            .with_logging(self.overrides.enable_logging || sablepay.enable_logging)
            .with_request_timeout(Duration::from_secs(sablepay.request_timeout_secs))
            .with_polling(
                Duration::from_millis(polling.interval_ms),
                polling.max_attempts,
            )
            .with_retry(retry_policy(&retry));
        config.validate()?;
        Ok(config)
    }
}

fn retry_policy(retry: &RetryConfig) -> RetryPolicy {
    RetryPolicy {
        max_retries: retry.max_retries,
        base_delay: Duration::from_millis(retry.base_delay_ms),
        multiplier: retry.multiplier,
        max_delay: Duration::from_millis(retry.max_delay_ms),
        jitter: retry.jitter,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
