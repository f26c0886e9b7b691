//! Outbound canvas events.
//!
//! [`Canvas`](crate::canvas::Canvas) emits these through the
//! [`EventSink`](super::ports::EventSink) port after each inbound frame.
//! Adapters on the other side decide what to do with them.

use crate::error::ProtocolError;
use crate::rpc::protocol::ErrorCode;
use crate::rpc::registry::TransactionId;

/// Structured events emitted by the canvas core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasEvent {
    /// The device reported the application as running.
    DeviceStarted,

    /// The device reported the application as closed.
    DeviceStopped,

    /// A transaction completed with status OK.
    Completed { transaction_id: TransactionId },

    /// A transaction completed with status ERR.
    DeviceError {
        transaction_id: TransactionId,
        code: ErrorCode,
    },

    /// A reply arrived for an id that is not in flight.
    Orphaned { transaction_id: TransactionId },

    /// An inbound frame was negative-acknowledged and dropped.
    Rejected(ProtocolError),

    /// The transport connected (`true`) or went away (`false`).
    ConnectionChanged(bool),
}
