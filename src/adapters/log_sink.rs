//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every canvas event to the `log`
//! facade.  A UI adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::CanvasEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`CanvasEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &CanvasEvent) {
        match event {
            CanvasEvent::DeviceStarted => info!("DEVICE | application started"),
            CanvasEvent::DeviceStopped => info!("DEVICE | application stopped"),
            CanvasEvent::Completed { transaction_id } => {
                info!("TXN | tid={} ok", transaction_id);
            }
            CanvasEvent::DeviceError {
                transaction_id,
                code,
            } => {
                warn!("TXN | tid={} failed: {}", transaction_id, code);
            }
            CanvasEvent::Orphaned { transaction_id } => {
                warn!("TXN | tid={} not in flight", transaction_id);
            }
            CanvasEvent::Rejected(e) => warn!("FRAME | rejected: {}", e),
            CanvasEvent::ConnectionChanged(connected) => {
                info!(
                    "LINK | {}",
                    if *connected { "connected" } else { "disconnected" }
                );
            }
        }
    }
}
