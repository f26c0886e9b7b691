//! Port traits: the boundary between the canvas core and its observers.
//!
//! ```text
//!   Canvas ──▶ EventSink ──▶ Adapter (log, UI, test recorder)
//! ```

use super::events::CanvasEvent;

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: canvas → logging / UI)
// ───────────────────────────────────────────────────────────────

/// The canvas emits structured [`CanvasEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &CanvasEvent);
}

/// Collects every event, for callers that inspect them afterwards.
impl EventSink for alloc::vec::Vec<CanvasEvent> {
    fn emit(&mut self, event: &CanvasEvent) {
        self.push(*event);
    }
}
