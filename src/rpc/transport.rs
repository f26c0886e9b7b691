//! Transport abstractions.
//!
//! Two layers:
//!
//! - [`Link`]: the structured boundary the gateway talks to: send a
//!   dictionary under a transaction id, acknowledge or reject inbound frames,
//!   start/stop the device application.  The physical link behind it is
//!   opaque.
//! - [`Transport`]: the outbound half of a byte channel.
//!   [`FramedLink`](crate::adapters::framed_link::FramedLink) turns a
//!   `Transport` into a `Link`.

use uuid::Uuid;

use super::dict::Dictionary;
use super::registry::TransactionId;
use crate::error::LinkError;

/// Transport-level frame id of an inbound frame, echoed in ack/nack.
pub type FrameId = u32;

/// Structured, message-oriented link to the device application.
pub trait Link: Send {
    /// Hand `payload` to the device application `app` under `transaction_id`.
    fn send(
        &mut self,
        app: &Uuid,
        transaction_id: TransactionId,
        payload: &Dictionary,
    ) -> Result<(), LinkError>;

    /// Positive-acknowledge an inbound frame.
    fn ack(&mut self, frame_id: FrameId) -> Result<(), LinkError>;

    /// Negative-acknowledge an inbound frame.
    fn nack(&mut self, frame_id: FrameId) -> Result<(), LinkError>;

    /// Ask the device to launch `app`.
    fn start_app(&mut self, app: &Uuid) -> Result<(), LinkError> {
        let _ = app;
        Ok(())
    }

    /// Ask the device to close `app`.
    fn stop_app(&mut self, app: &Uuid) -> Result<(), LinkError> {
        let _ = app;
        Ok(())
    }
}

/// Outbound byte channel (serial, socket, pipe).  Inbound bytes reach the
/// reader thread through `std::io::Read` instead.
pub trait Transport {
    type Error: core::fmt::Debug;

    /// Write some of `data`; returns how many bytes were taken.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Inbound frame as delivered by the transport's receive path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub frame_id: FrameId,
    pub payload: Dictionary,
}

impl InboundFrame {
    pub fn new(frame_id: FrameId, payload: Dictionary) -> Self {
        Self { frame_id, payload }
    }
}
