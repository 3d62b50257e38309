//! Event payloads.

use std::fmt;
use std::time::Duration;

use sablepay_sdk::client::{ClientError, ErrorKind};
use sablepay_sdk::objects::{PaymentRecord, StatusSnapshot};

/// One result delivered by a polling session.
pub type PollItem = Result<StatusSnapshot, ClientError>;

/// Something the front end should react to while a payment is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// The server accepted the payment. `qr_payload` is the link to render
    /// as a QR code, when the server supplied one.
    Created {
        record: PaymentRecord,
        qr_payload: Option<String>,
    },
    /// A non-terminal status was observed.
    StatusUpdate(StatusSnapshot),
    /// A poll failed but polling continues.
    TransientError {
        attempt: u32,
        kind: ErrorKind,
        message: String,
    },
    /// The flow is over. Always the last event.
    Terminal(FlowOutcome),
}

impl FlowEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowEvent::Terminal(_))
    }
}

/// How a payment flow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Completed(StatusSnapshot),
    Failed(StatusSnapshot),
    Expired(StatusSnapshot),
    /// The payment could not be created; nothing was polled.
    CreationFailed {
        kind: ErrorKind,
        message: String,
        retry_after: Option<Duration>,
    },
    /// Polling ran out of attempts before a terminal status was seen.
    TimedOut { payment_id: String, attempts: u32 },
    /// Polling hit an error that retrying cannot fix.
    Aborted {
        payment_id: String,
        kind: ErrorKind,
        message: String,
    },
}

impl FlowOutcome {
    pub(crate) fn creation_failed(err: &ClientError) -> Self {
        FlowOutcome::CreationFailed {
            kind: err.kind(),
            message: err.user_message(),
            retry_after: err.retry_after(),
        }
    }

    /// Whether the customer paid.
    pub fn is_success(&self) -> bool {
        matches!(self, FlowOutcome::Completed(_))
    }

    pub fn payment_id(&self) -> Option<&str> {
        match self {
            FlowOutcome::Completed(s) | FlowOutcome::Failed(s) | FlowOutcome::Expired(s) => {
                Some(&s.payment_id)
            }
            FlowOutcome::TimedOut { payment_id, .. } | FlowOutcome::Aborted { payment_id, .. } => {
                Some(payment_id)
            }
            FlowOutcome::CreationFailed { .. } => None,
        }
    }

    /// The final snapshot, for outcomes that carry one.
    pub fn snapshot(&self) -> Option<&StatusSnapshot> {
        match self {
            FlowOutcome::Completed(s) | FlowOutcome::Failed(s) | FlowOutcome::Expired(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowOutcome::Completed(s) => write!(f, "payment {} completed", s.payment_id),
            FlowOutcome::Failed(s) => write!(f, "payment {} failed", s.payment_id),
            FlowOutcome::Expired(s) => write!(f, "payment {} expired", s.payment_id),
            FlowOutcome::CreationFailed { kind, message, .. } => {
                write!(f, "payment creation failed ({kind}): {message}")
            }
            FlowOutcome::TimedOut {
                payment_id,
                attempts,
            } => write!(
                f,
                "payment {payment_id} still pending after {attempts} status checks"
            ),
            FlowOutcome::Aborted {
                payment_id,
                kind,
                message,
            } => write!(f, "polling payment {payment_id} aborted ({kind}): {message}"),
        }
    }
}
