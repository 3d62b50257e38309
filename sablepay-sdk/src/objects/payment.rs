//! Payment request and response types.
//!
//! Requests are validated locally before any network I/O; responses are
//! converted from their wire shape into owned, immutable records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use super::status::PaymentStatus;

/// Free-form string metadata attached to a payment.
pub type Metadata = BTreeMap<String, String>;

/// A single line item of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentItem {
    pub name: String,
    pub quantity: u32,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl PaymentItem {
    pub fn new(name: impl Into<String>, quantity: u32, price: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
        }
    }

    /// `price * quantity`, or `None` on overflow.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Request payload for creating a new payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<PaymentItem>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

/// Reasons a [`PaymentRequest`] is rejected before it is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("item #{index} has an empty name")]
    EmptyItemName { index: usize },

    #[error("item {name:?} has zero quantity")]
    ZeroQuantity { name: String },

    #[error("item {name:?} has a negative price")]
    NegativePrice { name: String },

    #[error("amount {amount} does not match the item total {items_total}")]
    AmountMismatch {
        amount: Decimal,
        items_total: Decimal,
    },

    #[error("item total overflows")]
    Overflow,
}

impl PaymentRequest {
    /// A request for a plain amount without line items.
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount,
            items: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// A request whose amount is the sum of the item subtotals.
    pub fn from_items(items: Vec<PaymentItem>) -> Result<Self, RequestError> {
        let amount = items_total(&items)?;
        Ok(Self {
            amount,
            items,
            metadata: Metadata::new(),
        })
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_all_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    /// Check the request invariants.
    ///
    /// The amount must be positive and, when items are present, equal to the
    /// sum of their subtotals.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.amount <= Decimal::ZERO {
            return Err(RequestError::NonPositiveAmount(self.amount));
        }
        if self.items.is_empty() {
            return Ok(());
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(RequestError::EmptyItemName { index });
            }
            if item.quantity == 0 {
                return Err(RequestError::ZeroQuantity {
                    name: item.name.clone(),
                });
            }
            if item.price.is_sign_negative() {
                return Err(RequestError::NegativePrice {
                    name: item.name.clone(),
                });
            }
        }
        let items_total = items_total(&self.items)?;
        if items_total != self.amount {
            return Err(RequestError::AmountMismatch {
                amount: self.amount,
                items_total,
            });
        }
        Ok(())
    }
}

fn items_total(items: &[PaymentItem]) -> Result<Decimal, RequestError> {
    items.iter().try_fold(Decimal::ZERO, |acc, item| {
        item.subtotal()
            .and_then(|subtotal| acc.checked_add(subtotal))
            .ok_or(RequestError::Overflow)
    })
}

/// Response body of the "create payment" endpoint, as sent on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    #[serde(default)]
    pub payment_id: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub payment_link: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub status: PaymentStatus,
}

/// Reasons a [`CreatePaymentResponse`] cannot become a [`PaymentRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("server returned no payment id")]
    MissingPaymentId,

    #[error("server returned terminal status {0} for a new payment")]
    TerminalInitialStatus(PaymentStatus),
}

/// A created payment.
///
/// The status is the one observed at creation; later states arrive as new
/// [`StatusSnapshot`]s rather than by mutating the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub payment_id: String,
    pub amount: Decimal,
    pub business_name: String,
    /// URI encoded into the checkout QR code.
    pub payment_link: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub status: PaymentStatus,
}

impl PaymentRecord {
    /// The payload a front end should encode as a QR code, if any.
    pub fn qr_payload(&self) -> Option<&str> {
        self.payment_link
            .as_deref()
            .filter(|link| !link.trim().is_empty())
    }
}

impl TryFrom<CreatePaymentResponse> for PaymentRecord {
    type Error = RecordError;

    fn try_from(resp: CreatePaymentResponse) -> Result<Self, Self::Error> {
        let payment_id = resp
            .payment_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(RecordError::MissingPaymentId)?;
        if resp.status.is_terminal() {
            return Err(RecordError::TerminalInitialStatus(resp.status));
        }
        Ok(Self {
            payment_id,
            amount: resp.amount,
            business_name: resp.business_name,
            payment_link: resp.payment_link,
            created_at: resp.created_at,
            status: resp.status,
        })
    }
}

/// A point-in-time view of a payment's status.
///
/// Every poll produces a fresh snapshot; snapshots are never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    #[serde(default, alias = "txHash")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub paid_token: Option<String>,
    #[serde(default)]
    pub paid_network: Option<String>,
    #[serde(default)]
    pub paid_amount: Option<Decimal>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

impl StatusSnapshot {
    /// A bare snapshot carrying only the required fields.
    pub fn new(payment_id: impl Into<String>, status: PaymentStatus, amount: Decimal) -> Self {
        Self {
            payment_id: payment_id.into(),
            status,
            amount,
            transaction_id: None,
            paid_token: None,
            paid_network: None,
            paid_amount: None,
            created_at: None,
            completed_at: None,
            expires_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether a matching on-chain payment has been observed.
    pub fn has_observed_payment(&self) -> bool {
        self.paid_amount.is_some() || self.paid_token.is_some()
    }
}
