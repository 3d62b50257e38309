//! Status polling sessions.
//!
//! A session polls one payment id on a fixed interval until one of:
//! - a terminal status is observed (delivered, then the session stops)
//! - the attempt budget is spent
//! - the consumer cancels or drops the stream
//!
//! Failed polls are delivered as `Err` items and do not end the session;
//! the caller decides which errors are fatal. A rate-limited poll pushes
//! the next attempt out to its retry-after when that exceeds the interval.
//! Sessions share nothing, so any number may run concurrently, including
//! several for the same id.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use sablepay_sdk::client::ClientError;
use sablepay_sdk::objects::PaymentStatus;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cancel::{CancelHandle, cancelled};
use crate::events::{PollItem, PollItemReceiver, PollItemSender, poll_item_channel};
use crate::gateway::PaymentGateway;

// ---------------------------------------------------------------------------
// Public data types
// ---------------------------------------------------------------------------

/// Rejected polling parameters. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
    #[error("payment id must not be empty")]
    EmptyPaymentId,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEnd {
    Terminal(PaymentStatus),
    Exhausted { attempts: u32 },
    Cancelled,
}

// ---------------------------------------------------------------------------
// PollingEngine
// ---------------------------------------------------------------------------

/// Starts polling sessions against a [`PaymentGateway`].
#[derive(Clone)]
pub struct PollingEngine {
    gateway: Arc<dyn PaymentGateway>,
}

impl PollingEngine {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    /// Poll `payment_id` every `interval`, at most `max_attempts` times.
    ///
    /// The first poll happens immediately. `max_attempts == 0` yields an
    /// empty stream that ends as [`PollEnd::Exhausted`] without touching
    /// the network.
    ///
    /// Must be called from within a tokio runtime.
    pub fn poll_status(
        &self,
        payment_id: &str,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<StatusStream, PollError> {
        if interval.is_zero() {
            return Err(PollError::ZeroInterval);
        }
        let payment_id = payment_id.trim();
        if payment_id.is_empty() {
            return Err(PollError::EmptyPaymentId);
        }

        let cancel = CancelHandle::new();
        let (item_tx, item_rx) = poll_item_channel();
        let (end_tx, end_rx) = watch::channel(None);

        let session = PollSession {
            payment_id: payment_id.to_owned(),
            interval,
            max_attempts,
            cancel_rx: cancel.subscribe(),
        };
        let gateway = Arc::clone(&self.gateway);
        tokio::spawn(async move {
            let end = session.run(gateway.as_ref(), &item_tx).await;
            // Publish the end reason before closing the item channel so a
            // consumer that sees the stream end can always read it.
            end_tx.send_replace(Some(end));
            drop(item_tx);
        });

        debug!(
            payment_id,
            interval_ms = millis(interval),
            max_attempts,
            "Polling session started"
        );

        Ok(StatusStream {
            payment_id: payment_id.to_owned(),
            items: item_rx,
            cancel,
            end_rx,
        })
    }
}

// ---------------------------------------------------------------------------
// PollSession
// ---------------------------------------------------------------------------

/// State owned by one background polling task.
struct PollSession {
    payment_id: String,
    interval: Duration,
    max_attempts: u32,
    cancel_rx: watch::Receiver<bool>,
}

impl PollSession {
    fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    async fn run(mut self, gateway: &dyn PaymentGateway, items: &PollItemSender) -> PollEnd {
        let mut attempt = 0;
        while attempt < self.max_attempts {
            if self.is_cancelled() {
                return self.stopped(attempt);
            }
            attempt += 1;

            let result = tokio::select! {
                biased;

                _ = cancelled(&mut self.cancel_rx) => return self.stopped(attempt),
                result = gateway.get_payment_status(&self.payment_id) => result,
            };
            // A response that lands after cancellation is discarded.
            if self.is_cancelled() {
                return self.stopped(attempt);
            }

            let terminal = self.log_result(attempt, &result);
            let retry_after = result.as_ref().err().and_then(ClientError::retry_after);

            tokio::select! {
                biased;

                _ = cancelled(&mut self.cancel_rx) => return self.stopped(attempt),
                sent = items.send(result) => {
                    if sent.is_err() {
                        return self.stopped(attempt);
                    }
                }
            }

            if let Some(status) = terminal {
                info!(
                    payment_id = %self.payment_id,
                    %status,
                    attempt,
                    "Payment reached terminal status"
                );
                return PollEnd::Terminal(status);
            }
            if attempt == self.max_attempts {
                break;
            }

            let wait = self.next_wait(retry_after);
            tokio::select! {
                biased;

                _ = cancelled(&mut self.cancel_rx) => return self.stopped(attempt),
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!(
            payment_id = %self.payment_id,
            attempts = attempt,
            "Polling attempts exhausted without a terminal status"
        );
        PollEnd::Exhausted { attempts: attempt }
    }

    fn log_result(&self, attempt: u32, result: &PollItem) -> Option<PaymentStatus> {
        match result {
            Ok(snapshot) => {
                debug!(
                    payment_id = %self.payment_id,
                    status = %snapshot.status,
                    attempt,
                    "Polled payment status"
                );
                snapshot.is_terminal().then_some(snapshot.status)
            }
            Err(e) => {
                warn!(
                    payment_id = %self.payment_id,
                    attempt,
                    kind = %e.kind(),
                    error = %e,
                    "Status poll failed, will keep polling"
                );
                None
            }
        }
    }

    /// The interval, stretched to honor a rate limit's retry-after.
    fn next_wait(&self, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(retry_after) if retry_after > self.interval => {
                debug!(
                    payment_id = %self.payment_id,
                    retry_after_ms = millis(retry_after),
                    "Rate limited, delaying next poll"
                );
                retry_after
            }
            _ => self.interval,
        }
    }

    fn stopped(&self, attempt: u32) -> PollEnd {
        debug!(payment_id = %self.payment_id, attempt, "Polling session cancelled");
        PollEnd::Cancelled
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// StatusStream
// ---------------------------------------------------------------------------

/// Results of one polling session, in the order they were observed.
///
/// Dropping the stream cancels the session. After [`cancel`](Self::cancel)
/// the stream yields nothing more, including results already buffered.
pub struct StatusStream {
    payment_id: String,
    items: PollItemReceiver,
    cancel: CancelHandle,
    end_rx: watch::Receiver<Option<PollEnd>>,
}

impl StatusStream {
    pub fn payment_id(&self) -> &str {
        &self.payment_id
    }

    /// Stop the session. No network calls are made afterwards.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that cancels this session from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Why the session stopped, or `None` while it is still running.
    pub fn end(&self) -> Option<PollEnd> {
        let recorded = *self.end_rx.borrow();
        match recorded {
            Some(end) => Some(end),
            None if self.is_cancelled() => Some(PollEnd::Cancelled),
            None => None,
        }
    }

    /// Receive the next result, or `None` once the session is over.
    pub async fn next_item(&mut self) -> Option<PollItem> {
        if self.is_cancelled() {
            return None;
        }
        let item = self.items.recv().await;
        if self.is_cancelled() { None } else { item }
    }
}

impl Stream for StatusStream {
    type Item = PollItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.is_cancelled() {
            return Poll::Ready(None);
        }
        self.items.poll_recv(cx)
    }
}

impl Drop for StatusStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for StatusStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusStream")
            .field("payment_id", &self.payment_id)
            .field("cancelled", &self.is_cancelled())
            .field("end", &self.end())
            .finish()
    }
}
