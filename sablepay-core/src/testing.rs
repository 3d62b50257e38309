//! Scripted gateway shared by the polling and flow tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sablepay_sdk::client::{ClientError, StatusCode};
use sablepay_sdk::objects::{PaymentRecord, PaymentRequest, PaymentStatus, StatusSnapshot};

use crate::events::PollItem;
use crate::gateway::PaymentGateway;

/// Replays queued responses; an exhausted script answers with a fresh
/// pending payment.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    creations: Mutex<VecDeque<Result<PaymentRecord, ClientError>>>,
    statuses: Mutex<HashMap<String, VecDeque<PollItem>>>,
    status_calls: Mutex<HashMap<String, u32>>,
    create_calls: AtomicU32,
    requests: Mutex<Vec<PaymentRequest>>,
    latency: Duration,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every status call by `latency` of (virtual) time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn on_create(self, result: Result<PaymentRecord, ClientError>) -> Self {
        self.creations.lock().unwrap().push_back(result);
        self
    }

    pub fn on_status(self, payment_id: &str, results: impl IntoIterator<Item = PollItem>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .entry(payment_id.to_owned())
            .or_default()
            .extend(results);
        self
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<PaymentRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn status_calls(&self, payment_id: &str) -> u32 {
        self.status_calls
            .lock()
            .unwrap()
            .get(payment_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentRecord, ClientError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        let scripted = self.creations.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            let mut record = record(&format!("pay_{n}"));
            record.amount = request.amount;
            Ok(record)
        })
    }

    async fn get_payment_status(&self, payment_id: &str) -> Result<StatusSnapshot, ClientError> {
        *self
            .status_calls
            .lock()
            .unwrap()
            .entry(payment_id.to_owned())
            .or_default() += 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let scripted = self
            .statuses
            .lock()
            .unwrap()
            .get_mut(payment_id)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(snapshot(payment_id, PaymentStatus::Pending)))
    }
}

pub(crate) fn record(payment_id: &str) -> PaymentRecord {
    PaymentRecord {
        payment_id: payment_id.to_owned(),
        amount: Decimal::new(1000, 2),
        business_name: "Corner Cafe".into(),
        payment_link: Some(format!("https://pay.sablepay.io/{payment_id}")),
        created_at: time::OffsetDateTime::UNIX_EPOCH,
        status: PaymentStatus::Pending,
    }
}

pub(crate) fn snapshot(payment_id: &str, status: PaymentStatus) -> StatusSnapshot {
    StatusSnapshot::new(payment_id, status, Decimal::new(1000, 2))
}

pub(crate) fn status(payment_id: &str, status: PaymentStatus) -> PollItem {
    Ok(snapshot(payment_id, status))
}

pub(crate) fn server_error() -> ClientError {
    ClientError::Server {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "upstream unavailable".into(),
    }
}

pub(crate) fn auth_error() -> ClientError {
    ClientError::Auth {
        status: StatusCode::UNAUTHORIZED,
        body: String::new(),
    }
}

pub(crate) fn not_found(payment_id: &str) -> ClientError {
    ClientError::NotFound {
        payment_id: payment_id.to_owned(),
    }
}

pub(crate) fn rate_limited(secs: u64) -> ClientError {
    ClientError::RateLimited {
        retry_after: Duration::from_secs(secs),
        body: String::new(),
    }
}
