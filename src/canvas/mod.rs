//! Canvas: host proxies for the device's windows and layers.
//!
//! ```text
//! ┌──────────────────────────── Canvas ─────────────────────────────┐
//! │                                                                 │
//! │   Window ──owns──▶ Layer (TextLayer …)                          │
//! │     │  ResourceNode { handle, pending stack, failure }          │
//! │     │                                                           │
//! │     └──send / send_if_idle──▶ Gateway ◀──dispatch── inbound     │
//! │                                 │                               │
//! │            Continuation ◀───────┘ (on reply)                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! After every inbound frame the canvas offers the free link to windows
//! whose intents are still parked (behind another window's transaction or a
//! fire-and-forget push), one resume each, until the link turns busy.

pub mod attributes;
pub mod layer;
pub mod node;
pub mod text_layer;
pub mod window;

use core::cell::RefCell;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::warn;

use crate::app::events::CanvasEvent;
use crate::app::ports::EventSink;
use crate::config::LinkConfig;
use crate::rpc::gateway::Inbound;
use crate::rpc::transport::{InboundFrame, Link};

pub use layer::{Continuation, Gateway, Layer};
pub use node::PendingOp;
pub use text_layer::TextLayer;
pub use window::Window;

pub struct Canvas {
    gateway: Gateway,
    default_font: String,
    windows: Mutex<CriticalSectionRawMutex, RefCell<Vec<Arc<Window>>>>,
}

impl Canvas {
    pub fn new(config: &LinkConfig, link: impl Link + 'static) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            gateway: Gateway::new(config.app_uuid, link, config.ids()),
            default_font: config.default_font.clone(),
            windows: Mutex::new(RefCell::new(Vec::new())),
        })
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// A new, unallocated window tracked by this canvas.
    pub fn create_window(&self) -> Arc<Window> {
        let window = Window::new();
        self.windows.lock(|w| w.borrow_mut().push(window.clone()));
        window
    }

    /// A new text layer using the configured default font.
    pub fn text_layer(&self) -> Arc<TextLayer> {
        TextLayer::new(self.default_font.as_str())
    }

    pub fn windows(&self) -> Vec<Arc<Window>> {
        self.windows.lock(|w| w.borrow().clone())
    }

    // ── Inbound ───────────────────────────────────────────────

    /// Feed one inbound frame through the gateway, report what happened
    /// and hand the link to parked windows if it is free.
    pub fn dispatch(
        &self,
        frame: InboundFrame,
        sink: &mut impl EventSink,
    ) -> crate::Result<Inbound> {
        let outcome = self.gateway.on_receive(frame);
        sink.emit(&match outcome {
            Ok(Inbound::Completed {
                transaction_id,
                error: None,
            }) => CanvasEvent::Completed { transaction_id },
            Ok(Inbound::Completed {
                transaction_id,
                error: Some(code),
            }) => CanvasEvent::DeviceError {
                transaction_id,
                code,
            },
            Ok(Inbound::Orphaned { transaction_id }) => CanvasEvent::Orphaned { transaction_id },
            Ok(Inbound::DeviceStarted) => CanvasEvent::DeviceStarted,
            Ok(Inbound::DeviceStopped) => CanvasEvent::DeviceStopped,
            Err(e) => CanvasEvent::Rejected(e),
        });

        self.resume_idle();
        Ok(outcome?)
    }

    /// Connection notification from the transport.
    pub fn set_connected(&self, connected: bool, sink: &mut impl EventSink) {
        if self.gateway.is_connected() != connected {
            self.gateway.set_connected(connected);
            sink.emit(&CanvasEvent::ConnectionChanged(connected));
        }
    }

    /// Resume windows with parked intents while the link is free.  Windows
    /// with a recorded failure are skipped.  Returns how many were resumed.
    pub fn resume_idle(&self) -> usize {
        let mut resumed = 0;
        for window in self.windows() {
            if self.gateway.is_busy() {
                break;
            }
            if !window.has_pending() || window.last_error().is_some() {
                continue;
            }
            if let Err(e) = window.resume(&self.gateway) {
                warn!("WIN[{:?}]: idle resume failed: {}", window.id(), e);
            }
            resumed += 1;
        }
        resumed
    }
}
