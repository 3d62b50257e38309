//! Events a payment flow publishes to its front end.
//!
//! # Event order
//!
//! 1. `Created` once the payment exists on the server
//! 2. zero or more `StatusUpdate` / `TransientError`
//! 3. exactly one `Terminal`
//!
//! A creation failure skips straight to `Terminal`. A cancelled flow stops
//! publishing without a `Terminal` event.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, FlowEventReceiver, FlowEventSender, POLL_CHANNEL_BUFFER,
    PollItemReceiver, PollItemSender, flow_event_channel, poll_item_channel,
};
pub use types::{FlowEvent, FlowOutcome, PollItem};
