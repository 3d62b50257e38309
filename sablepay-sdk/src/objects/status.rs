//! Payment status state model.
//!
//! Every predicate here is a total function over [`PaymentStatus`]: adding a
//! variant forces every classification to be revisited by the compiler.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Lifecycle status of a payment as reported by the API.
///
/// ```text
/// pending ──► processing ──► completed
///    │             │
///    ├─────────────┴──────► failed
///    └────────────────────► expired
/// ```
///
/// Serialized lowercase; deserialized case-insensitively through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting payment.
    Pending,
    /// A payment was detected and is being confirmed.
    Processing,
    /// Settled.
    Completed,
    /// The payment attempt failed.
    Failed,
    /// The payment window elapsed unpaid.
    Expired,
}

/// Mutually exclusive classification of a [`PaymentStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// `pending` or `processing`.
    InProgress,
    Completed,
    Failed,
    Expired,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Pending,
        PaymentStatus::Processing,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Expired,
    ];

    pub fn classify(self) -> StatusClass {
        match self {
            PaymentStatus::Pending | PaymentStatus::Processing => StatusClass::InProgress,
            PaymentStatus::Completed => StatusClass::Completed,
            PaymentStatus::Failed => StatusClass::Failed,
            PaymentStatus::Expired => StatusClass::Expired,
        }
    }

    /// No further state change is expected once this returns `true`.
    pub fn is_terminal(self) -> bool {
        match self.classify() {
            StatusClass::InProgress => false,
            StatusClass::Completed | StatusClass::Failed | StatusClass::Expired => true,
        }
    }

    pub fn is_completed(self) -> bool {
        self.classify() == StatusClass::Completed
    }

    pub fn is_failed(self) -> bool {
        self.classify() == StatusClass::Failed
    }

    pub fn is_expired(self) -> bool {
        self.classify() == StatusClass::Expired
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

impl<'de> Deserialize<'de> for PaymentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Format an amount for display, e.g. `10` → `"$10.00"`.
///
/// Rounds half away from zero to two decimal places.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    format!("${rounded}")
}
