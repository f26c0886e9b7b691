//! Window resource node: the resume/retry state machine.
//!
//! Intents that cannot run yet are parked on the window's pending stack and
//! replayed by [`Window::resume`]:
//!
//! ```text
//!   request_update ─┬─ link busy ───────────▶ defer(Update)
//!                   ├─ unallocated ─────────▶ allocate, defer(Update)
//!                   ├─ a layer syncs ───────▶ defer(Update)
//!                   └─ nothing to sync ─────▶ resume
//!
//!   request_push ───┬─ link busy ───────────▶ defer(Push)
//!                   ├─ unallocated ─────────▶ defer(Push), allocate
//!                   └─ allocated ───────────▶ send PushWindow (no completion)
//!
//!   resume: pop ── None ▶ idle │ Update ▶ request_update │ Push ▶ request_push
//! ```
//!
//! A failed allocation is recorded and nothing is unwound: parked intents
//! stay until a caller retries and the allocation succeeds.

use core::cell::RefCell;

use alloc::sync::Arc;
use alloc::vec::Vec;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, error, info, warn};

use super::layer::{Continuation, Gateway, Layer};
use super::node::{PendingOp, ResourceNode};
use crate::error::{GatewayError, ResourceError};
use crate::rpc::dict::Dictionary;
use crate::rpc::gateway::Reply;
use crate::rpc::protocol::{Key, Method};
use crate::rpc::registry::TransactionId;

pub struct Window {
    node: ResourceNode,
    layers: Mutex<CriticalSectionRawMutex, RefCell<Vec<Arc<dyn Layer>>>>,
}

impl Window {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            node: ResourceNode::new(),
            layers: Mutex::new(RefCell::new(Vec::new())),
        })
    }

    /// Device window id, once allocated.
    pub fn id(&self) -> Option<u32> {
        self.node.handle.get()
    }

    pub fn add_layer(&self, layer: Arc<dyn Layer>) {
        self.layers.lock(|l| l.borrow_mut().push(layer));
    }

    pub fn layer_count(&self) -> usize {
        self.layers.lock(|l| l.borrow().len())
    }

    // ── Intents ───────────────────────────────────────────────

    /// Synchronise every changed layer with the device, one transaction at a
    /// time.  Never blocks; work that cannot start now is deferred.
    pub fn request_update(self: &Arc<Self>, gateway: &Gateway) -> crate::Result<()> {
        Ok(self.update(gateway)?)
    }

    /// Present the window.  The push itself is fire-and-forget.
    pub fn request_push(self: &Arc<Self>, gateway: &Gateway) -> crate::Result<()> {
        Ok(self.present(gateway)?)
    }

    /// Replay the most recently deferred intent, if any.
    pub fn resume(self: &Arc<Self>, gateway: &Gateway) -> crate::Result<()> {
        Ok(self.resume_next(gateway)?)
    }

    /// [`resume`](Self::resume) from a completion, where an error has no
    /// caller to go to.
    pub fn continue_pending(self: &Arc<Self>, gateway: &Gateway) {
        if let Err(e) = self.resume_next(gateway) {
            warn!("WIN[{:?}]: resume failed: {}", self.id(), e);
        }
    }

    fn update(self: &Arc<Self>, gateway: &Gateway) -> Result<(), GatewayError> {
        if gateway.is_busy() {
            self.defer(PendingOp::Update);
            return Ok(());
        }

        if !self.node.handle.is_allocated() {
            let sent = self.allocate(gateway);
            self.defer(PendingOp::Update);
            return absorb_busy(sent);
        }

        // Snapshot so layer sends run without the list lock.
        let layers: Vec<Arc<dyn Layer>> = self.layers.lock(|l| l.borrow().clone());
        for layer in layers {
            if !layer.changed() {
                continue;
            }
            match layer.synchronize(self, gateway) {
                Ok(false) => {}
                sent => {
                    self.defer(PendingOp::Update);
                    return absorb_busy(sent);
                }
            }
        }

        self.resume_next(gateway)
    }

    fn present(self: &Arc<Self>, gateway: &Gateway) -> Result<(), GatewayError> {
        if gateway.is_busy() {
            self.defer(PendingOp::Push);
            return Ok(());
        }

        if !self.node.handle.is_allocated() {
            self.defer(PendingOp::Push);
            return absorb_busy(self.allocate(gateway));
        }

        let mut payload = Dictionary::new();
        payload.insert_uint(Key::MethodId, Method::PushWindow as u32);
        match self.send(gateway, payload, None) {
            Err(e) if e.is_busy() => {
                self.defer(PendingOp::Push);
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    fn resume_next(self: &Arc<Self>, gateway: &Gateway) -> Result<(), GatewayError> {
        match self.node.pending.pop() {
            None => Ok(()),
            Some(PendingOp::Update) => self.update(gateway),
            Some(PendingOp::Push) => self.present(gateway),
        }
    }

    // ── Transport helpers ─────────────────────────────────────

    /// Send `payload` on behalf of this window, stamped with its id.
    ///
    /// An unallocated window starts allocation instead and the payload is
    /// dropped (`Ok(None)`); the caller's own pending intent replays it.
    pub fn send(
        self: &Arc<Self>,
        gateway: &Gateway,
        mut payload: Dictionary,
        continuation: Option<Continuation>,
    ) -> Result<Option<TransactionId>, GatewayError> {
        let Some(id) = self.id() else {
            self.allocate(gateway)?;
            return Ok(None);
        };
        payload.insert_uint(Key::WindowId, id);
        gateway.send_if_idle(payload, continuation).map(Some)
    }

    fn allocate(self: &Arc<Self>, gateway: &Gateway) -> Result<TransactionId, GatewayError> {
        let mut payload = Dictionary::new();
        payload.insert_uint(Key::MethodId, Method::NewWindow as u32);
        let tid = gateway.send_if_idle(payload, Some(Continuation::WindowAllocated(self.clone())))?;
        debug!("WIN: allocation requested (tid={})", tid);
        Ok(tid)
    }

    /// Completion of the allocation request.
    pub(crate) fn allocated(self: &Arc<Self>, gateway: &Gateway, reply: &Reply) {
        if let Some(code) = reply.error_code() {
            error!("WIN: allocation failed: {}", code);
            self.record_error(ResourceError::Device(code));
            return;
        }

        let Some(id) = reply.response.uint(Key::WindowId) else {
            error!("WIN: allocation reply without window id");
            self.record_error(ResourceError::MissingHandle(Key::WindowId));
            return;
        };

        if !self.node.handle.set(id) {
            warn!("WIN[{:?}]: duplicate allocation reply ({})", self.id(), id);
        }
        self.node.clear_failure();
        info!("WIN[{}]: allocated", id);
        self.continue_pending(gateway);
    }

    // ── State ─────────────────────────────────────────────────

    fn defer(&self, op: PendingOp) {
        debug!("WIN[{:?}]: deferring {:?}", self.id(), op);
        self.node.pending.push(op);
    }

    pub fn record_error(&self, err: ResourceError) {
        self.node.record_failure(err);
    }

    pub fn last_error(&self) -> Option<ResourceError> {
        self.node.failure()
    }

    pub fn has_pending(&self) -> bool {
        !self.node.pending.is_empty()
    }

    /// Deferred intents, bottom to top.
    pub fn pending_ops(&self) -> Vec<PendingOp> {
        self.node.pending.snapshot()
    }
}

/// A send refused because the link turned busy counts as deferred.
fn absorb_busy<T>(sent: Result<T, GatewayError>) -> Result<(), GatewayError> {
    match sent {
        Ok(_) => Ok(()),
        Err(e) if e.is_busy() => Ok(()),
        Err(e) => Err(e),
    }
}
