//! Payment status polling and the create-then-poll payment flow.
//!
//! - [`gateway`]: the seam between the core and the HTTP client.
//! - [`poller`]: bounded, cancellable status polling sessions.
//! - [`flow`]: one in-flight payment from creation to a terminal outcome.
//! - [`events`]: the typed events a flow publishes to its front end.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod cancel;
pub mod events;
pub mod flow;
pub mod gateway;
pub mod poller;

#[cfg(test)]
mod testing;

pub use cancel::CancelHandle;
pub use events::{FlowEvent, FlowOutcome};
pub use flow::{FlowError, FlowEvents, FlowListener, FlowSettings, PaymentFlow};
pub use gateway::PaymentGateway;
pub use poller::{PollEnd, PollError, PollingEngine, StatusStream};
