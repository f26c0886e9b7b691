//! Layer capability interface and the continuation records stored with
//! every canvas transaction.
//!
//! A transaction's completion is plain data: which step finished and which
//! resources it concerns.  When the reply arrives the gateway hands the
//! record back and [`Continuation::complete`] routes it.
//!
//! ```text
//!  WindowAllocated ──▶ Window::allocated ──▶ Window::resume
//!  LayerAllocated  ──▶ Layer::allocated  ──▶ Window::resume
//!  AttributesApplied ─▶ Layer::applied   ──▶ Window::resume
//! ```

use alloc::sync::Arc;

use log::warn;

use super::window::Window;
use crate::error::{GatewayError, ResourceError};
use crate::rpc::gateway::{Completion, LinkGateway, Reply};

/// Gateway specialised to canvas continuations.
pub type Gateway = LinkGateway<Continuation>;

/// What a window needs from each of its layers.
pub trait Layer: Send + Sync {
    /// Any attribute differs from what the device last confirmed.
    fn changed(&self) -> bool;

    /// Bring the device in line with this layer: allocate it if needed,
    /// otherwise send the attribute diff.  `Ok(true)` means a transaction is
    /// now outstanding and the window must wait; `Ok(false)` means there was
    /// nothing to do.
    fn synchronize(self: Arc<Self>, window: &Arc<Window>, gateway: &Gateway)
    -> Result<bool, GatewayError>;

    /// Absorb the reply to this layer's allocation request.
    fn allocated(&self, reply: &Reply) -> Result<(), ResourceError>;

    /// Absorb the reply to an attribute diff.
    fn applied(&self, reply: &Reply) -> Result<(), ResourceError>;
}

/// Pending step of a canvas operation, stored in the transaction registry.
pub enum Continuation {
    WindowAllocated(Arc<Window>),
    LayerAllocated {
        window: Arc<Window>,
        layer: Arc<dyn Layer>,
    },
    AttributesApplied {
        window: Arc<Window>,
        layer: Arc<dyn Layer>,
    },
}

impl core::fmt::Debug for Continuation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WindowAllocated(_) => write!(f, "WindowAllocated"),
            Self::LayerAllocated { .. } => write!(f, "LayerAllocated"),
            Self::AttributesApplied { .. } => write!(f, "AttributesApplied"),
        }
    }
}

impl Completion for Continuation {
    fn complete(self, gateway: &Gateway, reply: &Reply) {
        match self {
            Self::WindowAllocated(window) => window.allocated(gateway, reply),
            Self::LayerAllocated { window, layer } => {
                settle(&window, gateway, layer.allocated(reply));
            }
            Self::AttributesApplied { window, layer } => {
                settle(&window, gateway, layer.applied(reply));
            }
        }
    }
}

/// A failed layer step is recorded on its window and stops the chain.
fn settle(window: &Arc<Window>, gateway: &Gateway, outcome: Result<(), ResourceError>) {
    match outcome {
        Ok(()) => window.continue_pending(gateway),
        Err(e) => {
            warn!("WIN[{:?}]: layer step failed: {}", window.id(), e);
            window.record_error(e);
        }
    }
}
