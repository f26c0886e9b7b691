//! Transaction registry: host-issued ids mapped to pending records.
//!
//! The registry is the single source of truth for "is the link busy": the
//! device accepts one outstanding transaction, so any record in flight makes
//! the whole link busy.
//!
//! Ids come from a [`TransactionIds`] counter owned by the registry (one per
//! gateway rather than a process global), so tests can seed it for
//! deterministic ids.  The counter wraps; if a wrapped id is still in
//! flight the registration is refused with [`RegistryError::IdInUse`].
//! Four billion transactions outstanding at once is not a practical
//! concern, but a stale record that never got its reply can collide.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::dict::Dictionary;
use super::protocol::Key;
use crate::error::RegistryError;

/// Host-local correlation id.
pub type TransactionId = u32;

// ── Id counter ───────────────────────────────────────────────

/// Monotonic, wrapping id source.
pub struct TransactionIds {
    next: AtomicU32,
}

impl TransactionIds {
    /// Counter whose first issued id is `first`.
    pub const fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Counter seeded from process entropy.
    pub fn from_entropy() -> Self {
        Self::starting_at(entropy_seed())
    }

    /// Issue the next id.
    pub fn next_id(&self) -> TransactionId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> TransactionId {
        self.next.load(Ordering::Relaxed)
    }
}

/// Non-cryptographic seed from the std `RandomState` keys.
fn entropy_seed() -> u32 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    RandomState::new().build_hasher().finish() as u32
}

// ── Records ──────────────────────────────────────────────────

/// One in-flight transaction.
#[derive(Debug)]
pub struct TransactionRecord<C> {
    pub transaction_id: TransactionId,
    /// `None` for fire-and-forget sends.
    pub callback: Option<C>,
    /// The request as transmitted, transaction id included.
    pub request: Dictionary,
}

/// Result of a successful registration: the id and the stamped request to
/// hand to the transport.
#[derive(Debug, Clone)]
pub struct Registration {
    pub transaction_id: TransactionId,
    pub request: Dictionary,
}

// ── Registry ─────────────────────────────────────────────────

pub struct TransactionRegistry<C> {
    ids: TransactionIds,
    inflight: Mutex<CriticalSectionRawMutex, RefCell<BTreeMap<TransactionId, TransactionRecord<C>>>>,
}

impl<C> TransactionRegistry<C> {
    pub fn new(ids: TransactionIds) -> Self {
        Self {
            ids,
            inflight: Mutex::new(RefCell::new(BTreeMap::new())),
        }
    }

    /// Allocate an id, stamp it into `request` under [`Key::TransactionId`]
    /// and store the record.  The link becomes busy.
    pub fn register(
        &self,
        callback: Option<C>,
        request: Dictionary,
    ) -> Result<Registration, RegistryError> {
        self.insert(callback, request, false)
    }

    /// Like [`register`](Self::register), but refuses with
    /// [`RegistryError::Busy`] if anything is in flight.  The busy check and
    /// the insert happen under the same lock.
    pub fn register_if_idle(
        &self,
        callback: Option<C>,
        request: Dictionary,
    ) -> Result<Registration, RegistryError> {
        self.insert(callback, request, true)
    }

    fn insert(
        &self,
        callback: Option<C>,
        mut request: Dictionary,
        require_idle: bool,
    ) -> Result<Registration, RegistryError> {
        self.inflight.lock(|cell| {
            let mut map = cell.borrow_mut();
            if require_idle && !map.is_empty() {
                return Err(RegistryError::Busy);
            }

            let transaction_id = self.ids.next_id();
            if map.contains_key(&transaction_id) {
                return Err(RegistryError::IdInUse(transaction_id));
            }

            request.insert_uint(Key::TransactionId, transaction_id);
            map.insert(
                transaction_id,
                TransactionRecord {
                    transaction_id,
                    callback,
                    request: request.clone(),
                },
            );
            Ok(Registration {
                transaction_id,
                request,
            })
        })
    }

    /// Atomically take the record for `id`.  A second call for the same id
    /// returns `None`, so a reply reaches its callback at most once.
    pub fn lookup_and_remove(&self, id: TransactionId) -> Option<TransactionRecord<C>> {
        self.inflight.lock(|cell| cell.borrow_mut().remove(&id))
    }

    /// Copy of the stored request for `id`, if still in flight.
    pub fn request(&self, id: TransactionId) -> Option<Dictionary> {
        self.inflight
            .lock(|cell| cell.borrow().get(&id).map(|r| r.request.clone()))
    }

    /// True iff any transaction is in flight.
    pub fn is_busy(&self) -> bool {
        self.inflight.lock(|cell| !cell.borrow().is_empty())
    }

    pub fn len(&self) -> usize {
        self.inflight.lock(|cell| cell.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        !self.is_busy()
    }

    /// Ids currently in flight, ascending.
    pub fn ids(&self) -> Vec<TransactionId> {
        self.inflight
            .lock(|cell| cell.borrow().keys().copied().collect())
    }
}
