//! SDK for SablePay, a crypto-payment API for point-of-sale checkouts.
//!
//! The crate is split in three parts:
//!
//! - [`objects`]: wire and value types (requests, records, status snapshots)
//!   and the payment status state model.
//! - [`config`]: the immutable client configuration and retry policy.
//! - `client` (behind the `client` feature): the typed HTTP client.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod objects;

#[cfg(feature = "client")]
pub mod client;

pub use objects::{
    PaymentItem, PaymentRecord, PaymentRequest, PaymentStatus, StatusClass, StatusSnapshot,
    format_amount,
};
