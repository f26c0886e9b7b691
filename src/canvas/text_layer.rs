//! Text layer: a device text layer plus its tracked attributes.

use core::cell::RefCell;

use alloc::string::String;
use alloc::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, warn};

use super::attributes::{Alignment, Color, TextAttributes};
use super::layer::{Continuation, Gateway, Layer};
use super::node::DeviceHandle;
use super::window::Window;
use crate::error::{GatewayError, ResourceError};
use crate::rpc::dict::Dictionary;
use crate::rpc::gateway::Reply;
use crate::rpc::protocol::{Key, Method};

pub struct TextLayer {
    handle: DeviceHandle,
    attributes: Mutex<CriticalSectionRawMutex, RefCell<TextAttributes>>,
}

impl TextLayer {
    pub fn new(font: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            handle: DeviceHandle::new(),
            attributes: Mutex::new(RefCell::new(TextAttributes::new(font))),
        })
    }

    /// Device layer id, once allocated.
    pub fn id(&self) -> Option<u32> {
        self.handle.get()
    }

    // ── Setters ───────────────────────────────────────────────

    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.with(|a| a.text.mark_if_changed(text));
    }

    pub fn set_font(&self, font: impl Into<String>) {
        let font = font.into();
        self.with(|a| a.font.mark_if_changed(font));
    }

    pub fn set_foreground(&self, color: Color) {
        self.with(|a| a.foreground.mark_if_changed(color));
    }

    pub fn set_background(&self, color: Color) {
        self.with(|a| a.background.mark_if_changed(color));
    }

    pub fn set_alignment(&self, alignment: Alignment) {
        self.with(|a| a.alignment.mark_if_changed(alignment));
    }

    // ── Getters ───────────────────────────────────────────────

    pub fn text(&self) -> String {
        self.with(|a| a.text.get().clone())
    }

    pub fn font(&self) -> String {
        self.with(|a| a.font.get().clone())
    }

    pub fn foreground(&self) -> Color {
        self.with(|a| *a.foreground.get())
    }

    pub fn background(&self) -> Color {
        self.with(|a| *a.background.get())
    }

    pub fn alignment(&self) -> Alignment {
        self.with(|a| *a.alignment.get())
    }

    pub fn has_changes(&self) -> bool {
        self.with(|a| a.has_changes())
    }

    /// Copy of the attribute set.
    pub fn attributes(&self) -> TextAttributes {
        self.with(|a| a.clone())
    }

    fn with<R>(&self, f: impl FnOnce(&mut TextAttributes) -> R) -> R {
        self.attributes.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl Layer for TextLayer {
    fn changed(&self) -> bool {
        self.has_changes()
    }

    fn synchronize(
        self: Arc<Self>,
        window: &Arc<Window>,
        gateway: &Gateway,
    ) -> Result<bool, GatewayError> {
        let Some(id) = self.handle.get() else {
            let mut payload = Dictionary::new();
            payload.insert_uint(Key::MethodId, Method::NewTextLayer as u32);
            let continuation = Continuation::LayerAllocated {
                window: window.clone(),
                layer: self,
            };
            window.send(gateway, payload, Some(continuation))?;
            return Ok(true);
        };

        let Some(payload) = self.with(|a| {
            if !a.has_changes() {
                return None;
            }
            let mut payload = Dictionary::new();
            payload.insert_uint(Key::TextLayerId, id);
            payload.insert_uint(Key::MethodId, Method::ApplyAttributes as u32);
            a.write_diff(&mut payload);
            Some(payload)
        }) else {
            return Ok(false);
        };

        debug!("LAYER[{}]: sending {} fields", id, payload.len());
        let continuation = Continuation::AttributesApplied {
            window: window.clone(),
            layer: self,
        };
        window.send(gateway, payload, Some(continuation))?;
        Ok(true)
    }

    fn allocated(&self, reply: &Reply) -> Result<(), ResourceError> {
        if let Some(code) = reply.error_code() {
            return Err(ResourceError::Device(code));
        }
        let id = reply
            .response
            .uint(Key::TextLayerId)
            .ok_or(ResourceError::MissingHandle(Key::TextLayerId))?;
        if !self.handle.set(id) {
            warn!("LAYER[{:?}]: duplicate allocation reply ({})", self.id(), id);
        }
        debug!("LAYER[{}]: allocated", id);
        Ok(())
    }

    fn applied(&self, reply: &Reply) -> Result<(), ResourceError> {
        if let Some(code) = reply.error_code() {
            return Err(ResourceError::Device(code));
        }
        self.with(|a| a.confirm(&reply.response, &reply.request));
        Ok(())
    }
}
