//! The create-then-poll payment flow.
//!
//! A [`PaymentFlow`] drives at most one payment at a time: it creates the
//! payment, publishes the QR payload, polls until a terminal status or the
//! attempt budget runs out, and then publishes exactly one terminal event.
//! Starting a new payment cancels the one in flight.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use rust_decimal::Decimal;
use sablepay_sdk::client::ErrorKind;
use sablepay_sdk::config::{ClientConfig, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use sablepay_sdk::objects::{
    Metadata, PaymentRecord, PaymentRequest, StatusClass, StatusSnapshot,
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::cancel::{CancelHandle, cancelled};
use crate::events::{FlowEvent, FlowEventReceiver, FlowEventSender, FlowOutcome, flow_event_channel};
use crate::gateway::PaymentGateway;
use crate::poller::{PollEnd, PollError, PollingEngine};

// ---------------------------------------------------------------------------
// Public data types
// ---------------------------------------------------------------------------

/// Polling parameters applied to every payment a flow starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSettings {
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl From<&ClientConfig> for FlowSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            max_poll_attempts: config.max_poll_attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("payment flow has been released")]
    Released,
    #[error(transparent)]
    Poll(#[from] PollError),
}

/// Callbacks for front ends that prefer a listener over a channel.
///
/// Driven by [`FlowEvents::drive`]; callbacks run on the caller's task.
pub trait FlowListener {
    fn on_created(&mut self, record: &PaymentRecord, qr_payload: Option<&str>);

    fn on_status_update(&mut self, snapshot: &StatusSnapshot);

    fn on_transient_error(&mut self, attempt: u32, kind: ErrorKind, message: &str) {
        let _ = (attempt, kind, message);
    }

    fn on_terminal(&mut self, outcome: &FlowOutcome);
}

// ---------------------------------------------------------------------------
// PaymentFlow
// ---------------------------------------------------------------------------

enum FlowState {
    Idle,
    Running { generation: u64, cancel: CancelHandle },
    Released,
}

struct FlowInner {
    state: FlowState,
    next_generation: u64,
    payment_id: Option<String>,
}

/// Coordinates one in-flight payment at a time.
///
/// Dropping the flow releases it, which cancels any running payment.
pub struct PaymentFlow {
    gateway: Arc<dyn PaymentGateway>,
    engine: PollingEngine,
    settings: FlowSettings,
    inner: Arc<Mutex<FlowInner>>,
}

impl PaymentFlow {
    pub fn new(gateway: Arc<dyn PaymentGateway>, settings: FlowSettings) -> Self {
        Self {
            engine: PollingEngine::new(Arc::clone(&gateway)),
            gateway,
            settings,
            inner: Arc::new(Mutex::new(FlowInner {
                state: FlowState::Idle,
                next_generation: 0,
                payment_id: None,
            })),
        }
    }

    pub fn settings(&self) -> FlowSettings {
        self.settings
    }

    /// Start a payment for `amount` with optional `metadata`.
    ///
    /// Any payment already in flight is cancelled first and its event
    /// channel closes without a terminal event.
    pub fn start_payment(&self, amount: Decimal, metadata: Metadata) -> Result<FlowEvents, FlowError> {
        self.start_request(PaymentRequest::new(amount).with_all_metadata(metadata))
    }

    /// Start a payment from a fully built request.
    pub fn start_request(&self, request: PaymentRequest) -> Result<FlowEvents, FlowError> {
        if self.settings.poll_interval.is_zero() {
            return Err(PollError::ZeroInterval.into());
        }

        let mut inner = lock(&self.inner);
        match &inner.state {
            FlowState::Released => return Err(FlowError::Released),
            FlowState::Running { generation, cancel } => {
                info!(generation, "Cancelling in-flight payment for a new one");
                cancel.cancel();
            }
            FlowState::Idle => {}
        }

        inner.next_generation += 1;
        let generation = inner.next_generation;
        let cancel = CancelHandle::new();
        let (event_tx, event_rx) = flow_event_channel();

        let run = FlowRun {
            generation,
            gateway: Arc::clone(&self.gateway),
            engine: self.engine.clone(),
            settings: self.settings,
            events: event_tx,
            cancel_rx: cancel.subscribe(),
            inner: Arc::clone(&self.inner),
        };
        tokio::spawn(run.run(request));

        inner.state = FlowState::Running {
            generation,
            cancel: cancel.clone(),
        };
        inner.payment_id = None;
        debug!(generation, "Payment flow started");

        Ok(FlowEvents {
            events: event_rx,
            cancel,
        })
    }

    /// Cancel the payment in flight, if any. The flow can be started again.
    pub fn cancel(&self) {
        let mut inner = lock(&self.inner);
        if let FlowState::Running { generation, cancel } = &inner.state {
            info!(generation, "Payment flow cancelled");
            cancel.cancel();
            inner.state = FlowState::Idle;
        }
    }

    /// Cancel any payment in flight and refuse further starts.
    pub fn release(&self) {
        let mut inner = lock(&self.inner);
        if let FlowState::Running { cancel, .. } = &inner.state {
            cancel.cancel();
        }
        if !matches!(inner.state, FlowState::Released) {
            debug!("Payment flow released");
        }
        inner.state = FlowState::Released;
    }

    /// Id of the most recently created payment, kept after it finishes.
    pub fn current_payment_id(&self) -> Option<String> {
        lock(&self.inner).payment_id.clone()
    }

    pub fn is_active(&self) -> bool {
        matches!(lock(&self.inner).state, FlowState::Running { .. })
    }

    pub fn is_released(&self) -> bool {
        matches!(lock(&self.inner).state, FlowState::Released)
    }
}

impl Drop for PaymentFlow {
    fn drop(&mut self) {
        self.release();
    }
}

/// The state stays usable after a panicking holder; every write is a
/// single assignment.
fn lock(inner: &Mutex<FlowInner>) -> MutexGuard<'_, FlowInner> {
    inner
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// FlowRun
// ---------------------------------------------------------------------------

/// The background task behind one started payment.
struct FlowRun {
    generation: u64,
    gateway: Arc<dyn PaymentGateway>,
    engine: PollingEngine,
    settings: FlowSettings,
    events: FlowEventSender,
    cancel_rx: watch::Receiver<bool>,
    inner: Arc<Mutex<FlowInner>>,
}

impl FlowRun {
    async fn run(mut self, request: PaymentRequest) {
        if let Some(outcome) = self.drive(request).await {
            self.emit(FlowEvent::Terminal(outcome)).await;
        }
        self.finish();
    }

    /// Returns the outcome to publish, or `None` if the run was cancelled.
    async fn drive(&mut self, request: PaymentRequest) -> Option<FlowOutcome> {
        let gateway = Arc::clone(&self.gateway);
        let created = tokio::select! {
            biased;

            _ = cancelled(&mut self.cancel_rx) => return None,
            created = gateway.create_payment(&request) => created,
        };
        if self.is_cancelled() {
            return None;
        }

        let record = match created {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    generation = self.generation,
                    kind = %e.kind(),
                    error = %e,
                    "Payment creation failed"
                );
                return Some(FlowOutcome::creation_failed(&e));
            }
        };
        let payment_id = record.payment_id.clone();
        info!(
            generation = self.generation,
            payment_id = %payment_id,
            amount = %record.amount,
            "Payment created"
        );
        self.record_payment_id(&payment_id);

        let qr_payload = record.qr_payload().map(str::to_owned);
        if qr_payload.is_none() {
            warn!(payment_id = %payment_id, "Created payment has no payment link");
        }
        if !self.emit(FlowEvent::Created { record, qr_payload }).await {
            return None;
        }

        let mut stream = match self.engine.poll_status(
            &payment_id,
            self.settings.poll_interval,
            self.settings.max_poll_attempts,
        ) {
            Ok(stream) => stream,
            Err(e) => {
                error!(payment_id = %payment_id, error = %e, "Could not start polling");
                return Some(FlowOutcome::Aborted {
                    payment_id,
                    kind: ErrorKind::Config,
                    message: e.to_string(),
                });
            }
        };

        let mut attempt = 0;
        loop {
            let item = tokio::select! {
                biased;

                _ = cancelled(&mut self.cancel_rx) => {
                    stream.cancel();
                    return None;
                }
                item = stream.next_item() => item,
            };

            let Some(item) = item else {
                return match stream.end() {
                    Some(PollEnd::Exhausted { attempts }) => {
                        Some(FlowOutcome::TimedOut { payment_id, attempts })
                    }
                    // A terminal status always arrives as an item first.
                    _ => None,
                };
            };
            attempt += 1;

            match item {
                Ok(snapshot) => match snapshot.status.classify() {
                    StatusClass::InProgress => {
                        if !self.emit(FlowEvent::StatusUpdate(snapshot)).await {
                            stream.cancel();
                            return None;
                        }
                    }
                    StatusClass::Completed => return Some(FlowOutcome::Completed(snapshot)),
                    StatusClass::Failed => return Some(FlowOutcome::Failed(snapshot)),
                    StatusClass::Expired => return Some(FlowOutcome::Expired(snapshot)),
                },
                Err(e) if e.kind() == ErrorKind::Auth => {
                    stream.cancel();
                    error!(payment_id = %payment_id, error = %e, "Credentials rejected while polling");
                    return Some(FlowOutcome::Aborted {
                        payment_id,
                        kind: e.kind(),
                        message: e.user_message(),
                    });
                }
                Err(e) => {
                    let event = FlowEvent::TransientError {
                        attempt,
                        kind: e.kind(),
                        message: e.user_message(),
                    };
                    if !self.emit(event).await {
                        stream.cancel();
                        return None;
                    }
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Deliver `event` unless the run was cancelled or nobody listens.
    async fn emit(&mut self, event: FlowEvent) -> bool {
        if self.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;

            _ = cancelled(&mut self.cancel_rx) => false,
            sent = self.events.send(event) => sent.is_ok(),
        }
    }

    fn record_payment_id(&self, payment_id: &str) {
        let mut inner = lock(&self.inner);
        if matches!(inner.state, FlowState::Running { generation, .. } if generation == self.generation)
        {
            inner.payment_id = Some(payment_id.to_owned());
        }
    }

    fn finish(&self) {
        let mut inner = lock(&self.inner);
        if matches!(inner.state, FlowState::Running { generation, .. } if generation == self.generation)
        {
            inner.state = FlowState::Idle;
        }
        debug!(generation = self.generation, "Payment flow finished");
    }
}

// ---------------------------------------------------------------------------
// FlowEvents
// ---------------------------------------------------------------------------

/// Events of one started payment.
///
/// Ends after the terminal event, or early without one when the payment is
/// cancelled or replaced.
#[derive(Debug)]
pub struct FlowEvents {
    events: FlowEventReceiver,
    cancel: CancelHandle,
}

impl FlowEvents {
    pub async fn recv(&mut self) -> Option<FlowEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let event = self.events.recv().await;
        if self.cancel.is_cancelled() { None } else { event }
    }

    /// Cancel just this payment.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Feed every event to `listener` and return the outcome, or `None` if
    /// the payment was cancelled first.
    pub async fn drive<L: FlowListener + ?Sized>(mut self, listener: &mut L) -> Option<FlowOutcome> {
        while let Some(event) = self.recv().await {
            match event {
                FlowEvent::Created { record, qr_payload } => {
                    listener.on_created(&record, qr_payload.as_deref());
                }
                FlowEvent::StatusUpdate(snapshot) => listener.on_status_update(&snapshot),
                FlowEvent::TransientError {
                    attempt,
                    kind,
                    message,
                } => listener.on_transient_error(attempt, kind, &message),
                FlowEvent::Terminal(outcome) => {
                    listener.on_terminal(&outcome);
                    return Some(outcome);
                }
            }
        }
        None
    }
}

impl Stream for FlowEvents {
    type Item = FlowEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.events.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedGateway, auth_error, rate_limited, record, server_error, status};
    use sablepay_sdk::objects::PaymentStatus;

    const INTERVAL: Duration = Duration::from_secs(3);

    fn flow(gateway: &Arc<ScriptedGateway>, max_poll_attempts: u32) -> PaymentFlow {
        PaymentFlow::new(
            gateway.clone(),
            FlowSettings {
                poll_interval: INTERVAL,
                max_poll_attempts,
            },
        )
    }

    fn ten() -> Decimal {
        Decimal::new(1000, 2)
    }

    #[derive(Default)]
    struct Recorder {
        created: Vec<(String, Option<String>)>,
        updates: Vec<PaymentStatus>,
        errors: Vec<(u32, ErrorKind)>,
        terminal: Vec<FlowOutcome>,
    }

    impl FlowListener for Recorder {
        fn on_created(&mut self, record: &PaymentRecord, qr_payload: Option<&str>) {
            self.created
                .push((record.payment_id.clone(), qr_payload.map(str::to_owned)));
        }

        fn on_status_update(&mut self, snapshot: &StatusSnapshot) {
            self.updates.push(snapshot.status);
        }

        fn on_transient_error(&mut self, attempt: u32, kind: ErrorKind, _message: &str) {
            self.errors.push((attempt, kind));
        }

        fn on_terminal(&mut self, outcome: &FlowOutcome) {
            self.terminal.push(outcome.clone());
        }
    }

    async fn collect(mut events: FlowEvents) -> Vec<FlowEvent> {
        let mut all = Vec::new();
        while let Some(event) = events.recv().await {
            all.push(event);
        }
        all
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_pending_updates() {
        let gateway = Arc::new(ScriptedGateway::new().on_status(
            "pay_1",
            [
                status("pay_1", PaymentStatus::Pending),
                status("pay_1", PaymentStatus::Pending),
                status("pay_1", PaymentStatus::Completed),
            ],
        ));
        let flow = flow(&gateway, 60);
        let mut recorder = Recorder::default();

        let events = flow.start_payment(ten(), Metadata::new()).unwrap();
        let outcome = events.drive(&mut recorder).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(
            recorder.created,
            vec![(
                "pay_1".to_owned(),
                Some("https://pay.sablepay.io/pay_1".to_owned())
            )]
        );
        assert_eq!(
            recorder.updates,
            vec![PaymentStatus::Pending, PaymentStatus::Pending]
        );
        assert_eq!(recorder.terminal.len(), 1);
        assert_eq!(gateway.status_calls("pay_1"), 3);
        assert_eq!(flow.current_payment_id().as_deref(), Some("pay_1"));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!flow.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_creation_failure_skips_polling() {
        let gateway = Arc::new(ScriptedGateway::new().on_create(Err(rate_limited(30))));
        let flow = flow(&gateway, 60);

        let events = collect(flow.start_payment(ten(), Metadata::new()).unwrap()).await;

        assert_eq!(
            events,
            vec![FlowEvent::Terminal(FlowOutcome::CreationFailed {
                kind: ErrorKind::RateLimit,
                message: "Rate limit exceeded. Please try again in 30 seconds.".into(),
                retry_after: Some(Duration::from_secs(30)),
            })]
        );
        assert_eq!(gateway.create_calls(), 1);
        assert_eq!(gateway.status_calls("pay_1"), 0);
        assert_eq!(flow.current_payment_id(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_forwarded() {
        let gateway = Arc::new(ScriptedGateway::new().on_status(
            "pay_1",
            [
                Err(server_error()),
                status("pay_1", PaymentStatus::Processing),
                status("pay_1", PaymentStatus::Expired),
            ],
        ));
        let flow = flow(&gateway, 60);
        let mut recorder = Recorder::default();

        let outcome = flow
            .start_payment(ten(), Metadata::new())
            .unwrap()
            .drive(&mut recorder)
            .await
            .unwrap();

        assert!(matches!(outcome, FlowOutcome::Expired(ref s) if s.payment_id == "pay_1"));
        assert_eq!(recorder.errors, vec![(1, ErrorKind::Server)]);
        assert_eq!(recorder.updates, vec![PaymentStatus::Processing]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_ends_flow() {
        let gateway = Arc::new(
            ScriptedGateway::new().on_status("pay_1", [status("pay_1", PaymentStatus::Failed)]),
        );
        let flow = flow(&gateway, 60);

        let events = collect(flow.start_payment(ten(), Metadata::new()).unwrap()).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], FlowEvent::Created { .. }));
        assert!(matches!(
            events[1],
            FlowEvent::Terminal(FlowOutcome::Failed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_attempt_budget() {
        let gateway = Arc::new(ScriptedGateway::new());
        let flow = flow(&gateway, 3);
        let mut recorder = Recorder::default();

        let outcome = flow
            .start_payment(ten(), Metadata::new())
            .unwrap()
            .drive(&mut recorder)
            .await
            .unwrap();

        assert_eq!(recorder.updates.len(), 3);
        assert_eq!(
            outcome,
            FlowOutcome::TimedOut {
                payment_id: "pay_1".into(),
                attempts: 3,
            }
        );
        assert_eq!(gateway.status_calls("pay_1"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_error_aborts_polling() {
        let gateway = Arc::new(ScriptedGateway::new().on_status(
            "pay_1",
            [status("pay_1", PaymentStatus::Pending), Err(auth_error())],
        ));
        let flow = flow(&gateway, 60);

        let events = collect(flow.start_payment(ten(), Metadata::new()).unwrap()).await;

        assert_eq!(
            events.last(),
            Some(&FlowEvent::Terminal(FlowOutcome::Aborted {
                payment_id: "pay_1".into(),
                kind: ErrorKind::Auth,
                message: "Authentication failed. Check your API credentials.".into(),
            }))
        );
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.status_calls("pay_1"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_previous_payment() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .on_create(Ok(record("pay_a")))
                .on_create(Ok(record("pay_b")))
                .on_status("pay_b", [status("pay_b", PaymentStatus::Completed)]),
        );
        let flow = flow(&gateway, 60);

        let mut first = flow.start_payment(ten(), Metadata::new()).unwrap();
        assert!(matches!(first.recv().await, Some(FlowEvent::Created { .. })));
        assert!(matches!(first.recv().await, Some(FlowEvent::StatusUpdate(_))));

        let second = flow.start_payment(ten(), Metadata::new()).unwrap();
        assert!(first.is_cancelled());
        assert_eq!(first.recv().await, None);

        let events = collect(second).await;
        assert!(matches!(
            events.last(),
            Some(FlowEvent::Terminal(FlowOutcome::Completed(s))) if s.payment_id == "pay_b"
        ));
        assert_eq!(flow.current_payment_id().as_deref(), Some("pay_b"));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.status_calls("pay_a"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_returns_flow_to_idle() {
        let gateway = Arc::new(ScriptedGateway::new());
        let flow = flow(&gateway, 60);

        let mut events = flow.start_payment(ten(), Metadata::new()).unwrap();
        assert!(flow.is_active());
        assert!(matches!(events.recv().await, Some(FlowEvent::Created { .. })));

        flow.cancel();
        assert!(!flow.is_active());
        assert_eq!(events.recv().await, None);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(gateway.status_calls("pay_1") <= 1);

        // A cancelled flow can be started again.
        assert!(flow.start_payment(ten(), Metadata::new()).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_before_creation_skips_network() {
        let gateway = Arc::new(ScriptedGateway::new());
        let flow = flow(&gateway, 60);

        let mut events = flow.start_payment(ten(), Metadata::new()).unwrap();
        flow.release();
        assert!(flow.is_released());
        assert_eq!(events.recv().await, None);

        assert_eq!(
            flow.start_payment(ten(), Metadata::new()).unwrap_err(),
            FlowError::Released
        );
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.create_calls(), 0);
        assert_eq!(gateway.status_calls("pay_1"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_while_polling_stops_session() {
        let gateway = Arc::new(ScriptedGateway::new());
        let flow = flow(&gateway, 60);

        let mut events = flow.start_payment(ten(), Metadata::new()).unwrap();
        assert!(matches!(events.recv().await, Some(FlowEvent::Created { .. })));
        assert!(matches!(events.recv().await, Some(FlowEvent::StatusUpdate(_))));

        flow.release();
        assert_eq!(events.recv().await, None);
        assert_eq!(
            flow.start_payment(ten(), Metadata::new()).unwrap_err(),
            FlowError::Released
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.create_calls(), 1);
        assert_eq!(gateway.status_calls("pay_1"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_flow_cancels_payment() {
        let gateway = Arc::new(ScriptedGateway::new());
        let flow = flow(&gateway, 60);

        let mut events = flow.start_payment(ten(), Metadata::new()).unwrap();
        drop(flow);
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_rejected_before_creation() {
        let gateway = Arc::new(ScriptedGateway::new());
        let flow = PaymentFlow::new(
            gateway.clone(),
            FlowSettings {
                poll_interval: Duration::ZERO,
                max_poll_attempts: 60,
            },
        );

        assert_eq!(
            flow.start_payment(ten(), Metadata::new()).unwrap_err(),
            FlowError::Poll(PollError::ZeroInterval)
        );
        assert_eq!(gateway.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_reaches_request() {
        let gateway = Arc::new(ScriptedGateway::new());
        let flow = flow(&gateway, 1);
        let metadata = Metadata::from([("source".to_owned(), "pos".to_owned())]);

        let events = collect(flow.start_payment(ten(), metadata.clone()).unwrap()).await;
        assert!(matches!(
            events.last(),
            Some(FlowEvent::Terminal(FlowOutcome::TimedOut { attempts: 1, .. }))
        ));

        let request = gateway.last_request().unwrap();
        assert_eq!(request.amount, ten());
        assert_eq!(request.metadata, metadata);
    }

    #[test]
    fn test_settings_from_client_config() {
        let config = ClientConfig::for_api_key(
            "sable_sk_live_abc",
            "6f1c2b9e-5d1a-4c8e-9a55-0d3f3e2b7c11",
        )
        .unwrap()
        .with_polling(Duration::from_secs(5), 72);

        assert_eq!(
            FlowSettings::from(&config),
            FlowSettings {
                poll_interval: Duration::from_secs(5),
                max_poll_attempts: 72,
            }
        );
        assert_eq!(FlowSettings::default().max_poll_attempts, 60);
    }
}
