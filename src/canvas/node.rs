//! Per-resource state shared by every device-side object.
//!
//! A resource node is the host proxy for something the device allocated: a
//! [`DeviceHandle`] (unallocated until the device answers) plus a
//! [`PendingStack`] of intents that could not run yet.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicI64, Ordering};

use alloc::vec::Vec;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::error::ResourceError;

// ── Device handle ────────────────────────────────────────────

/// Device-assigned id.  Holds `-1` until allocated; write-once afterwards.
#[derive(Debug)]
pub struct DeviceHandle(AtomicI64);

impl DeviceHandle {
    pub const UNALLOCATED: i64 = -1;

    pub const fn new() -> Self {
        Self(AtomicI64::new(Self::UNALLOCATED))
    }

    pub fn get(&self) -> Option<u32> {
        u32::try_from(self.0.load(Ordering::Acquire)).ok()
    }

    pub fn is_allocated(&self) -> bool {
        self.get().is_some()
    }

    /// Store the device id.  Returns `false` and leaves the handle untouched
    /// if it was already allocated.
    pub fn set(&self, id: u32) -> bool {
        self.0
            .compare_exchange(
                Self::UNALLOCATED,
                i64::from(id),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for DeviceHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ── Pending operations ───────────────────────────────────────

/// Deferred high-level intent.  An empty stack is the idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    /// Synchronise attributes of the node and its children.
    Update,
    /// Present the window on the device.
    Push,
}

/// LIFO of deferred intents.  Duplicates are kept and drained one by one.
pub struct PendingStack {
    ops: Mutex<CriticalSectionRawMutex, RefCell<Vec<PendingOp>>>,
}

impl PendingStack {
    pub const fn new() -> Self {
        Self {
            ops: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    pub fn push(&self, op: PendingOp) {
        self.ops.lock(|ops| ops.borrow_mut().push(op));
    }

    /// Take the most recently pushed intent; `None` means idle.
    pub fn pop(&self) -> Option<PendingOp> {
        self.ops.lock(|ops| ops.borrow_mut().pop())
    }

    pub fn len(&self) -> usize {
        self.ops.lock(|ops| ops.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bottom-to-top copy of the stack.
    pub fn snapshot(&self) -> Vec<PendingOp> {
        self.ops.lock(|ops| ops.borrow().clone())
    }
}

impl Default for PendingStack {
    fn default() -> Self {
        Self::new()
    }
}

// ── Resource node ────────────────────────────────────────────

/// Handle, pending intents and the last recorded failure of one resource.
pub struct ResourceNode {
    pub handle: DeviceHandle,
    pub pending: PendingStack,
    failure: Mutex<CriticalSectionRawMutex, Cell<Option<ResourceError>>>,
}

impl ResourceNode {
    pub const fn new() -> Self {
        Self {
            handle: DeviceHandle::new(),
            pending: PendingStack::new(),
            failure: Mutex::new(Cell::new(None)),
        }
    }

    pub fn record_failure(&self, err: ResourceError) {
        self.failure.lock(|f| f.set(Some(err)));
    }

    pub fn clear_failure(&self) {
        self.failure.lock(|f| f.set(None));
    }

    pub fn failure(&self) -> Option<ResourceError> {
        self.failure.lock(Cell::get)
    }
}

impl Default for ResourceNode {
    fn default() -> Self {
        Self::new()
    }
}
