//! Channel factories for flow events and poll results.

use super::types::{FlowEvent, PollItem};
use tokio::sync::mpsc;

/// Buffer size for flow event channels.
///
/// A flow emits at most one event per poll tick, so a small buffer is enough
/// to absorb a slow front end.
pub const DEFAULT_CHANNEL_BUFFER: usize = 16;

/// Buffer size for a polling session's result channel.
///
/// Kept at one so the session never runs ahead of its consumer and a
/// cancellation discards at most one undelivered result.
pub const POLL_CHANNEL_BUFFER: usize = 1;

pub type FlowEventSender = mpsc::Sender<FlowEvent>;
pub type FlowEventReceiver = mpsc::Receiver<FlowEvent>;

pub type PollItemSender = mpsc::Sender<PollItem>;
pub type PollItemReceiver = mpsc::Receiver<PollItem>;

/// Create a new flow event channel. One per started flow.
pub fn flow_event_channel() -> (FlowEventSender, FlowEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new poll result channel. One per polling session.
pub fn poll_item_channel() -> (PollItemSender, PollItemReceiver) {
    mpsc::channel(POLL_CHANNEL_BUFFER)
}
