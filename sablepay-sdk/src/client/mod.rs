//! HTTP client for the SablePay API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

mod payments;

pub use payments::PaymentClient;
pub use reqwest::StatusCode;

use std::time::Duration;

use crate::config::ConfigError;
use crate::objects::RequestError;

/// Header carrying the merchant UUID.
pub const MERCHANT_ID_HEADER: &str = "X-Merchant-Id";

/// Header carrying the per-call idempotency key of a creation request.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Retry-after used when a rate-limited response does not state one.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Errors produced by [`PaymentClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request was rejected before or by the server as malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Credentials were rejected (401/403).
    #[error("authentication failed: status {status}, body: {body}")]
    Auth { status: StatusCode, body: String },

    /// Too many requests (429).
    #[error("rate limited, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration, body: String },

    /// The payment id is unknown to the server.
    #[error("payment not found: {payment_id}")]
    NotFound { payment_id: String },

    /// Transport-level failure (DNS, TLS, connection reset, timeout, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server failed (5xx).
    #[error("server error: status {status}, body: {body}")]
    Server { status: StatusCode, body: String },

    /// Any other non-2xx status.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The response was well-formed but violates the API contract.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Auth,
    RateLimit,
    NotFound,
    Network,
    Server,
    /// Unexpected status, undecodable body, or contract violation.
    Protocol,
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Auth => "auth",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Auth { .. } => ErrorKind::Auth,
            ClientError::RateLimited { .. } => ErrorKind::RateLimit,
            ClientError::NotFound { .. } => ErrorKind::NotFound,
            ClientError::Http(e) if e.is_decode() => ErrorKind::Protocol,
            ClientError::Http(_) => ErrorKind::Network,
            ClientError::Server { .. } => ErrorKind::Server,
            ClientError::Api { .. } | ClientError::Json(_) | ClientError::InvalidResponse(_) => {
                ErrorKind::Protocol
            }
            ClientError::Url(_) | ClientError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the client may transparently retry the failed call.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Server)
    }

    /// How long the server asked the caller to wait, for rate-limit errors.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ClientError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// A short message suitable for showing to a cashier or customer.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Auth { .. } => {
                "Authentication failed. Check your API credentials.".to_owned()
            }
            ClientError::RateLimited { retry_after, .. } => format!(
                "Rate limit exceeded. Please try again in {} seconds.",
                retry_after.as_secs()
            ),
            ClientError::NotFound { .. } => "Payment not found".to_owned(),
            ClientError::Http(_) => "Network error. Please check your connection.".to_owned(),
            ClientError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<RequestError> for ClientError {
    fn from(e: RequestError) -> Self {
        ClientError::Validation(e.to_string())
    }
}
