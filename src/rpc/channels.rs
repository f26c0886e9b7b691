//! Inbound queue between the receive path and the dispatch context.
//!
//! Uses an `embassy-sync` bounded MPMC channel so the blocking reader thread
//! can hand frames to the async dispatch task without sharing any other
//! state.
//!
//! ```text
//! ┌──────────────┐  LinkMessage  ┌────────────────┐
//! │ Reader thread│──────────────▶│ Dispatch task  │──▶ Canvas
//! │ (blocking)   │               │ (async)        │
//! └──────────────┘               └────────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::transport::InboundFrame;

/// Channel depth for inbound messages.
pub const QUEUE_DEPTH: usize = 16;

/// Everything the receive path can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMessage {
    /// A decoded data frame for the configured application.
    Frame(InboundFrame),
    /// The transport connected or disconnected.
    Connected(bool),
    /// The byte stream ended; the dispatch loop should return.
    Shutdown,
}

pub struct InboundQueue {
    channel: Channel<CriticalSectionRawMutex, LinkMessage, QUEUE_DEPTH>,
}

impl InboundQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue without waiting.  Returns `false` (and logs) if the queue is
    /// full and the message was dropped.
    pub fn try_push(&self, msg: LinkMessage) -> bool {
        if self.channel.try_send(msg).is_err() {
            warn!("IO: inbound queue full, dropping message");
            return false;
        }
        true
    }

    /// Enqueue, waiting for space.
    pub async fn push(&self, msg: LinkMessage) {
        self.channel.send(msg).await;
    }

    /// Wait for the next message.
    pub async fn next(&self) -> LinkMessage {
        self.channel.receive().await
    }

    pub fn try_next(&self) -> Option<LinkMessage> {
        self.channel.try_receive().ok()
    }
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}
