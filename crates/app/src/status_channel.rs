//! In-process status channel backed by a tokio unbounded mpsc channel.
//!
//! The sending half lives on the background execution context; a
//! synchronous UI drains the receiver with `try_recv` on each tick of its
//! own event loop.

use std::time::Duration;

use tokio::sync::mpsc;

use hueflow_domain::status::{StatusEvent, StepStatus};

use crate::ports::StatusSink;

/// [`StatusSink`] that forwards every report as a [`StatusEvent`].
///
/// Sending succeeds even when the receiver is gone (the event is simply
/// dropped).
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, event: StatusEvent) {
        // Fails only once the receiver is dropped, which is fine.
        let _ = self.sender.send(event);
    }
}

impl StatusSink for ChannelSink {
    fn on_progress(&self, fraction: f64) {
        self.forward(StatusEvent::Progress { fraction });
    }

    fn on_wait_tick(&self, remaining: Duration) {
        self.forward(StatusEvent::WaitTick { remaining });
    }

    fn on_step(&self, step: StepStatus) {
        self.forward(StatusEvent::Step(step));
    }
}
