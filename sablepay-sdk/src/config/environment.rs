use url::Url;

use super::ConfigError;

/// Base URL of the sandbox API.
pub const SANDBOX_BASE_URL: &str = "https://sandbox-api.sablepay.io/api/v1/";

/// Base URL of the production API.
pub const PRODUCTION_BASE_URL: &str = "https://api.sablepay.io/api/v1/";

/// SablePay deployment an API key belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    const SANDBOX_KEY_PREFIX: &'static str = "sable_sk_sand_";
    const LIVE_KEY_PREFIX: &'static str = "sable_sk_live_";

    /// Detect the environment from an API key prefix.
    pub fn detect(api_key: &str) -> Option<Self> {
        let api_key = api_key.trim();
        if api_key.starts_with(Self::SANDBOX_KEY_PREFIX) {
            Some(Environment::Sandbox)
        } else if api_key.starts_with(Self::LIVE_KEY_PREFIX) {
            Some(Environment::Production)
        } else {
            None
        }
    }

    pub fn base_url_str(self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }

    pub fn base_url(self) -> Result<Url, ConfigError> {
        let raw = self.base_url_str();
        Url::parse(raw).map_err(|_| ConfigError::InvalidBaseUrl(raw.to_owned()))
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Sandbox => write!(f, "sandbox"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(
            Environment::detect("sable_sk_sand_hKKTWrlP"),
            Some(Environment::Sandbox)
        );
        assert_eq!(
            Environment::detect("sable_sk_live_abc"),
            Some(Environment::Production)
        );
        assert_eq!(Environment::detect("sk_test_123"), None);
    }

    #[test]
    fn test_built_in_urls_parse() {
        for environment in [Environment::Sandbox, Environment::Production] {
            let url = environment.base_url().unwrap();
            assert_eq!(url.as_str(), environment.base_url_str());
            assert!(url.as_str().ends_with('/'));
        }
    }
}
