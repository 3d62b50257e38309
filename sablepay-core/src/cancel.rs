//! Shared cancellation flag for polling sessions and payment flows.

use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable, one-way cancellation flag.
///
/// Background tasks hold a [`watch::Receiver`] from [`CancelHandle::subscribe`]
/// and select on `changed()`; any clone of the handle may trip the flag.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Trip the flag. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Resolves once `rx` observes cancellation or every handle is gone.
pub(crate) async fn cancelled(rx: &mut watch::Receiver<bool>) {
    // A closed channel means nobody can cancel or observe any more.
    let _ = rx.wait_for(|cancelled| *cancelled).await;
}
