//! Application boundary: what the canvas reports to the outside world.
//!
//! The canvas core emits structured [`events::CanvasEvent`]s through the
//! [`ports::EventSink`] port and never decides where they end up.

pub mod events;
pub mod ports;
