//! Payments API client (point-of-sale front end → SablePay).
//!
//! Every request carries the API key as a bearer token and the merchant id
//! in the `X-Merchant-Id` header.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    ClientError, DEFAULT_RETRY_AFTER, IDEMPOTENCY_KEY_HEADER, MERCHANT_ID_HEADER, StatusCode,
};
use crate::config::ClientConfig;
use crate::objects::payment::RecordError;
use crate::objects::{CreatePaymentResponse, PaymentRecord, PaymentRequest, StatusSnapshot};

/// Typed HTTP client for the SablePay **Payments API**.
///
/// Construct one per configuration and share it by reference or clone; the
/// underlying connection pool is shared between clones.
///
/// Transport failures and 5xx responses are retried according to the
/// configured [`RetryPolicy`](crate::config::RetryPolicy). 4xx responses are
/// never retried.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    http: Client,
    config: Arc<ClientConfig>,
}

impl PaymentClient {
    /// Create a new `PaymentClient` from a validated configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared handle to the configuration.
    pub fn shared_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    /// `POST payments` – create a new payment.
    ///
    /// The request is validated locally first. One idempotency key is
    /// generated per call and reused by every internal retry.
    pub async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRecord, ClientError> {
        request.validate()?;

        let url = self.config.base_url.join("payments")?;
        let idempotency_key = Uuid::new_v4().to_string();

        if self.config.enable_logging {
            debug!(
                amount = %request.amount,
                items = request.items.len(),
                %idempotency_key,
                "Creating payment"
            );
        }

        let resp: CreatePaymentResponse = self
            .send_with_retry("create_payment", None, || {
                self.authorized(self.http.post(url.clone()))
                    .header(IDEMPOTENCY_KEY_HEADER, &idempotency_key)
                    .json(request)
            })
            .await?;

        let record = PaymentRecord::try_from(resp).map_err(|e| match e {
            RecordError::MissingPaymentId => ClientError::Validation(e.to_string()),
            RecordError::TerminalInitialStatus(_) => ClientError::InvalidResponse(e.to_string()),
        })?;

        if self.config.enable_logging {
            debug!(
                payment_id = %record.payment_id,
                status = %record.status,
                "Payment created"
            );
        }

        Ok(record)
    }

    /// `GET payments/{payment_id}` – fetch the current payment status.
    pub async fn get_payment_status(&self, payment_id: &str) -> Result<StatusSnapshot, ClientError> {
        let payment_id = payment_id.trim();
        if payment_id.is_empty() {
            return Err(ClientError::Validation("payment id is empty".into()));
        }

        let url = self
            .config
            .base_url
            .join(&format!("payments/{}", urlencoding::encode(payment_id)))?;

        let snapshot: StatusSnapshot = self
            .send_with_retry("get_payment_status", Some(payment_id), || {
                self.authorized(self.http.get(url.clone()))
            })
            .await?;

        if self.config.enable_logging {
            debug!(%payment_id, status = %snapshot.status, "Fetched payment status");
        }

        Ok(snapshot)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.config.api_key)
            .header(MERCHANT_ID_HEADER, self.config.merchant_id.to_string())
    }

    /// Send the request built by `build`, retrying transient failures.
    ///
    /// Exhausted retries surface the last error.
    async fn send_with_retry<T, F>(
        &self,
        operation: &'static str,
        payment_id: Option<&str>,
        build: F,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let policy = &self.config.retry;
        let mut retry = 0;

        loop {
            let result = match build().send().await {
                Ok(resp) => parse_response(resp, payment_id).await,
                Err(e) => Err(ClientError::Http(e)),
            };

            match result {
                Err(e) if e.is_retryable() && retry < policy.max_retries => {
                    let delay = policy.delay(retry);
                    warn!(
                        operation,
                        attempt = retry + 1,
                        error = %e,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Transient error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                other => return other,
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    retry_after: Option<u64>,
}

impl ApiErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

async fn parse_response<T: DeserializeOwned>(
    resp: Response,
    payment_id: Option<&str>,
) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        let bytes = resp.bytes().await?;
        return serde_json::from_slice(&bytes).map_err(ClientError::Json);
    }
    let retry_after = header_retry_after(resp.headers());
    let body = resp.text().await.unwrap_or_default();
    Err(classify_status(status, body, retry_after, payment_id))
}

fn header_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Map a non-2xx status onto the error taxonomy.
///
/// `payment_id` is set for lookups, where 404 means the id is unknown.
fn classify_status(
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
    payment_id: Option<&str>,
) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth { status, body },
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = retry_after
                .or_else(|| ApiErrorBody::parse(&body).retry_after.map(Duration::from_secs))
                .unwrap_or(DEFAULT_RETRY_AFTER);
            ClientError::RateLimited { retry_after, body }
        }
        StatusCode::NOT_FOUND => match payment_id {
            Some(id) => ClientError::NotFound {
                payment_id: id.to_owned(),
            },
            None => ClientError::Api { status, body },
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let parsed = ApiErrorBody::parse(&body);
            ClientError::Validation(parsed.message.or(parsed.error).unwrap_or(body))
        }
        s if s.is_server_error() => ClientError::Server { status, body },
        _ => ClientError::Api { status, body },
    }
}
