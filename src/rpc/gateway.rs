//! Link gateway: outbound sends, inbound demultiplexing.
//!
//! ```text
//!  Resource nodes ──send──▶ ┌─────────────┐ ──Link::send──▶ device
//!                           │ LinkGateway │
//!  Completion::complete ◀── │  registry   │ ◀──on_receive── receive path
//!                           └─────────────┘
//! ```
//!
//! Inbound frames are classified by their status field:
//!
//! | status          | action                                                   |
//! |-----------------|----------------------------------------------------------|
//! | OK / ERR + tid  | ack, remove record, run its completion once              |
//! | OK / ERR no tid | nack, drop ([`ProtocolError::MalformedReply`])           |
//! | STARTED/STOPPED | set the device-running flag, ack                         |
//! | anything else   | nack, drop                                               |
//!
//! There is no reply timeout: a transaction whose reply never arrives keeps
//! the link busy until an operator resends it or the process restarts.
//!
//! The link handle has its own `std::sync::Mutex`.  Transport writes may
//! block, and the critical section behind the registry and the inbound queue
//! must never be held across one.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::{debug, error, info, warn};
use uuid::Uuid;

use super::dict::Dictionary;
use super::protocol::{ErrorCode, Key, Status};
use super::registry::{Registration, TransactionId, TransactionIds, TransactionRegistry};
use super::transport::{FrameId, InboundFrame, Link};
use crate::error::{GatewayError, LinkError, ProtocolError};

// ───────────────────────────────────────────────────────────────
// Completion records
// ───────────────────────────────────────────────────────────────

/// Continuation stored with a transaction and run when its reply arrives.
///
/// Runs on the receive path with no gateway lock held, so it may send.
pub trait Completion: Sized + Send {
    fn complete(self, gateway: &LinkGateway<Self>, reply: &Reply);
}

/// A reply matched to its originating request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub transaction_id: TransactionId,
    pub response: Dictionary,
    pub request: Dictionary,
}

impl Reply {
    pub fn status(&self) -> Option<Status> {
        self.response.uint(Key::Status).and_then(Status::from_u32)
    }

    pub fn is_ok(&self) -> bool {
        self.status() == Some(Status::Ok)
    }

    /// The device error for an ERR reply (`Other(0)` if it sent no code).
    pub fn error_code(&self) -> Option<ErrorCode> {
        if self.status() == Some(Status::Err) {
            Some(ErrorCode::from_u32(
                self.response.uint(Key::ErrorCode).unwrap_or(0),
            ))
        } else {
            None
        }
    }
}

/// What `on_receive` did with an accepted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// A reply matched an in-flight transaction.
    Completed {
        transaction_id: TransactionId,
        error: Option<ErrorCode>,
    },
    /// A well-formed reply for an id that is not (or no longer) in flight.
    Orphaned { transaction_id: TransactionId },
    DeviceStarted,
    DeviceStopped,
}

// ───────────────────────────────────────────────────────────────
// Gateway
// ───────────────────────────────────────────────────────────────

pub struct LinkGateway<C> {
    app: Uuid,
    link: Mutex<Box<dyn Link>>,
    registry: TransactionRegistry<C>,
    device_running: AtomicBool,
    connected: AtomicBool,
}

impl<C: Completion> LinkGateway<C> {
    pub fn new(app: Uuid, link: impl Link + 'static, ids: TransactionIds) -> Self {
        Self {
            app,
            link: Mutex::new(Box::new(link)),
            registry: TransactionRegistry::new(ids),
            device_running: AtomicBool::new(false),
            connected: AtomicBool::new(true),
        }
    }

    pub fn app(&self) -> &Uuid {
        &self.app
    }

    // ── Outbound ──────────────────────────────────────────────

    /// Register a transaction and transmit it.  Does not check busy; callers
    /// that must respect the one-outstanding-transaction contract use
    /// [`send_if_idle`](Self::send_if_idle).
    ///
    /// If the transport refuses the frame the record stays registered (the
    /// link stays busy) so it can be [`resend`](Self::resend).
    pub fn send(
        &self,
        payload: Dictionary,
        callback: Option<C>,
    ) -> Result<TransactionId, GatewayError> {
        let registration = self.registry.register(callback, payload)?;
        self.transmit(registration)
    }

    /// Register and transmit only if nothing is in flight; the busy check
    /// and the registration share one critical section.
    pub fn send_if_idle(
        &self,
        payload: Dictionary,
        callback: Option<C>,
    ) -> Result<TransactionId, GatewayError> {
        let registration = self.registry.register_if_idle(callback, payload)?;
        self.transmit(registration)
    }

    fn transmit(&self, registration: Registration) -> Result<TransactionId, GatewayError> {
        let Registration {
            transaction_id,
            request,
        } = registration;
        debug!("GW: send tid={} ({} fields)", transaction_id, request.len());
        self.with_link(|link| link.send(&self.app, transaction_id, &request))
            .map_err(|e| {
                warn!("GW: transport refused tid={}: {}", transaction_id, e);
                GatewayError::Link(e)
            })?;
        Ok(transaction_id)
    }

    /// Retransmit the stored request of an in-flight transaction.
    pub fn resend(&self, transaction_id: TransactionId) -> Result<(), GatewayError> {
        let request = self
            .registry
            .request(transaction_id)
            .ok_or(GatewayError::UnknownTransaction(transaction_id))?;
        info!("GW: resend tid={}", transaction_id);
        self.with_link(|link| link.send(&self.app, transaction_id, &request))?;
        Ok(())
    }

    // ── Inbound ───────────────────────────────────────────────

    /// Demultiplex one inbound frame.  Rejected frames are
    /// negative-acknowledged and returned as errors; accepted frames are
    /// acknowledged and, for replies, routed to their completion.
    pub fn on_receive(&self, frame: InboundFrame) -> Result<Inbound, ProtocolError> {
        let InboundFrame { frame_id, payload } = frame;

        let Some(raw_status) = payload.uint(Key::Status) else {
            debug!("GW: frame {} without status", frame_id);
            self.nack(frame_id);
            return Err(ProtocolError::MissingStatus);
        };

        match Status::from_u32(raw_status) {
            Some(status @ (Status::Ok | Status::Err)) => {
                let Some(transaction_id) = payload.uint(Key::TransactionId) else {
                    debug!("GW: {:?} reply without transaction id", status);
                    self.nack(frame_id);
                    return Err(ProtocolError::MalformedReply { status });
                };
                self.ack(frame_id);
                Ok(self.complete(transaction_id, payload))
            }
            Some(Status::Started) => {
                self.device_running.store(true, Ordering::Release);
                self.ack(frame_id);
                info!("GW: device application started");
                Ok(Inbound::DeviceStarted)
            }
            Some(Status::Stopped) => {
                self.device_running.store(false, Ordering::Release);
                self.ack(frame_id);
                info!("GW: device application stopped");
                Ok(Inbound::DeviceStopped)
            }
            None => {
                self.nack(frame_id);
                error!("GW: unknown status in reply: {}", raw_status);
                Err(ProtocolError::UnknownStatus(raw_status))
            }
        }
    }

    fn complete(&self, transaction_id: TransactionId, response: Dictionary) -> Inbound {
        let Some(record) = self.registry.lookup_and_remove(transaction_id) else {
            warn!("GW: reply for tid={} not in flight", transaction_id);
            return Inbound::Orphaned { transaction_id };
        };

        let reply = Reply {
            transaction_id,
            response,
            request: record.request,
        };
        let error = reply.error_code();
        if let Some(callback) = record.callback {
            callback.complete(self, &reply);
        }
        Inbound::Completed {
            transaction_id,
            error,
        }
    }

    fn ack(&self, frame_id: FrameId) {
        if let Err(e) = self.with_link(|link| link.ack(frame_id)) {
            warn!("GW: ack of frame {} failed: {}", frame_id, e);
        }
    }

    fn nack(&self, frame_id: FrameId) {
        if let Err(e) = self.with_link(|link| link.nack(frame_id)) {
            warn!("GW: nack of frame {} failed: {}", frame_id, e);
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Ask the device to launch the application this gateway is keyed by.
    pub fn start_app(&self) -> Result<(), GatewayError> {
        self.with_link(|link| link.start_app(&self.app))?;
        Ok(())
    }

    pub fn stop_app(&self) -> Result<(), GatewayError> {
        self.with_link(|link| link.stop_app(&self.app))?;
        Ok(())
    }

    /// Connection notification from the transport.
    pub fn set_connected(&self, connected: bool) {
        let was = self.connected.swap(connected, Ordering::AcqRel);
        if was != connected {
            info!(
                "GW: device {}",
                if connected { "connected" } else { "disconnected" }
            );
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    // ── Queries ───────────────────────────────────────────────

    /// True iff any transaction is in flight (link-wide, not per resource).
    pub fn is_busy(&self) -> bool {
        self.registry.is_busy()
    }

    /// Whether the device reported its application as running.
    pub fn device_running(&self) -> bool {
        self.device_running.load(Ordering::Acquire)
    }

    /// Outstanding transaction ids, for operator inspection before a resend.
    pub fn in_flight(&self) -> Vec<TransactionId> {
        self.registry.ids()
    }

    fn with_link<R>(
        &self,
        f: impl FnOnce(&mut dyn Link) -> Result<R, LinkError>,
    ) -> Result<R, LinkError> {
        // The link holds no gateway state, so a poisoned lock is still usable.
        let mut link = self.link.lock().unwrap_or_else(PoisonError::into_inner);
        f(link.as_mut())
    }
}
