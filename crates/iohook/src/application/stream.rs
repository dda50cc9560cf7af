//! Async consumption of one category's events.
//!
//! Callbacks run on the engine's hook thread and must return promptly.  An
//! [`EventStream`] moves the work elsewhere: its callback only copies the
//! record into an unbounded `tokio` channel, and an async task awaits
//! [`EventStream::recv`].

use iohook_core::{EventCategory, RawEventRecord};
use tokio::sync::mpsc;

/// Receiving half of a channel-backed subscription.
///
/// Created by [`HookController::stream`](super::controller::HookController::stream).
#[derive(Debug)]
pub struct EventStream {
    category: EventCategory,
    receiver: mpsc::UnboundedReceiver<RawEventRecord>,
}

impl EventStream {
    pub(crate) fn channel(
        category: EventCategory,
    ) -> (mpsc::UnboundedSender<RawEventRecord>, EventStream) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, EventStream { category, receiver })
    }

    /// The category this stream is subscribed to.
    pub fn category(&self) -> EventCategory {
        self.category
    }

    /// Waits for the next record.
    ///
    /// Returns `None` once the subscription is gone (after
    /// [`HookController::stop`](super::controller::HookController::stop) or
    /// when the controller is dropped) and every buffered record was taken.
    pub async fn recv(&mut self) -> Option<RawEventRecord> {
        self.receiver.recv().await
    }

    /// Takes a buffered record without waiting.
    pub fn try_recv(&mut self) -> Option<RawEventRecord> {
        self.receiver.try_recv().ok()
    }
}
