//! Mock link and scripted device for integration tests.
//!
//! [`MockLink`] records every call the gateway makes so tests can assert on
//! the full outbound history.  [`ScriptedDevice`] plays the device: it
//! answers recorded sends the way the canvas application would.

use std::sync::{Arc, Mutex};

use wristlink::app::events::CanvasEvent;
use wristlink::canvas::Canvas;
use wristlink::config::LinkConfig;
use wristlink::error::LinkError;
use wristlink::rpc::dict::Dictionary;
use wristlink::rpc::protocol::{Key, Method, Status};
use wristlink::rpc::registry::TransactionId;
use wristlink::rpc::transport::{FrameId, InboundFrame, Link};
use uuid::Uuid;

// ── Link call record ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum LinkCall {
    Send {
        tid: TransactionId,
        payload: Dictionary,
    },
    Ack(FrameId),
    Nack(FrameId),
    Start,
    Stop,
}

#[derive(Default)]
struct LinkState {
    calls: Vec<LinkCall>,
    fail_sends: bool,
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockLink {
    state: Arc<Mutex<LinkState>>,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LinkCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Every send attempt, in order (failed attempts included).
    pub fn sent(&self) -> Vec<(TransactionId, Dictionary)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LinkCall::Send { tid, payload } => Some((tid, payload)),
                _ => None,
            })
            .collect()
    }

    /// Method ids of every send, in order.
    pub fn methods(&self) -> Vec<Method> {
        self.sent()
            .iter()
            .filter_map(|(_, p)| p.uint(Key::MethodId).and_then(Method::from_u32))
            .collect()
    }

    pub fn last_sent(&self) -> Option<(TransactionId, Dictionary)> {
        self.sent().pop()
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.state.lock().unwrap().fail_sends = fail;
    }

    pub fn nacks(&self) -> Vec<FrameId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LinkCall::Nack(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn acks(&self) -> Vec<FrameId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LinkCall::Ack(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

impl Link for MockLink {
    fn send(
        &mut self,
        _app: &Uuid,
        tid: TransactionId,
        payload: &Dictionary,
    ) -> Result<(), LinkError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(LinkCall::Send {
            tid,
            payload: payload.clone(),
        });
        if s.fail_sends {
            Err(LinkError::Disconnected)
        } else {
            Ok(())
        }
    }

    fn ack(&mut self, frame_id: FrameId) -> Result<(), LinkError> {
        self.state.lock().unwrap().calls.push(LinkCall::Ack(frame_id));
        Ok(())
    }

    fn nack(&mut self, frame_id: FrameId) -> Result<(), LinkError> {
        self.state.lock().unwrap().calls.push(LinkCall::Nack(frame_id));
        Ok(())
    }

    fn start_app(&mut self, _app: &Uuid) -> Result<(), LinkError> {
        self.state.lock().unwrap().calls.push(LinkCall::Start);
        Ok(())
    }

    fn stop_app(&mut self, _app: &Uuid) -> Result<(), LinkError> {
        self.state.lock().unwrap().calls.push(LinkCall::Stop);
        Ok(())
    }
}

// ── ScriptedDevice ────────────────────────────────────────────

/// Plays the device application: allocates ids and echoes attributes.
pub struct ScriptedDevice {
    next_frame: FrameId,
    next_window: u32,
    next_layer: u32,
    answered: usize,
}

#[allow(dead_code)]
impl ScriptedDevice {
    pub fn new() -> Self {
        Self {
            next_frame: 1000,
            next_window: 1,
            next_layer: 10,
            answered: 0,
        }
    }

    /// Wrap a payload in a fresh inbound frame.
    pub fn frame(&mut self, payload: Dictionary) -> InboundFrame {
        let id = self.next_frame;
        self.next_frame += 1;
        InboundFrame::new(id, payload)
    }

    pub fn status(&mut self, status: Status) -> InboundFrame {
        let mut d = Dictionary::new();
        d.insert_uint(Key::Status, status as u32);
        self.frame(d)
    }

    /// OK reply for `tid` with no extra fields.
    pub fn ok(&mut self, tid: TransactionId) -> InboundFrame {
        let mut d = Dictionary::new();
        d.insert_uint(Key::Status, Status::Ok as u32);
        d.insert_uint(Key::TransactionId, tid);
        self.frame(d)
    }

    /// ERR reply for `tid` carrying `code`.
    pub fn err(&mut self, tid: TransactionId, code: u32) -> InboundFrame {
        let mut d = Dictionary::new();
        d.insert_uint(Key::Status, Status::Err as u32);
        d.insert_uint(Key::TransactionId, tid);
        d.insert_uint(Key::ErrorCode, code);
        self.frame(d)
    }

    /// The reply the device application gives to `request`.
    pub fn reply_for(&mut self, tid: TransactionId, request: &Dictionary) -> InboundFrame {
        let mut d = Dictionary::new();
        d.insert_uint(Key::Status, Status::Ok as u32);
        d.insert_uint(Key::TransactionId, tid);
        match request.uint(Key::MethodId).and_then(Method::from_u32) {
            Some(Method::NewWindow) => {
                d.insert_uint(Key::WindowId, self.next_window);
                self.next_window += 1;
            }
            Some(Method::NewTextLayer) => {
                d.insert_uint(Key::TextLayerId, self.next_layer);
                self.next_layer += 1;
            }
            Some(Method::ApplyAttributes) => {
                for key in [
                    Key::ForegroundColor,
                    Key::BackgroundColor,
                    Key::Alignment,
                    Key::Font,
                    Key::Text,
                ] {
                    if let Some(v) = request.get(key) {
                        d.insert_raw(key as u32, v.clone());
                    }
                }
            }
            _ => {}
        }
        self.frame(d)
    }

    /// Reply to the oldest send not yet answered.
    pub fn answer_next(&mut self, link: &MockLink) -> Option<InboundFrame> {
        let sent = link.sent();
        let (tid, request) = sent.get(self.answered)?.clone();
        self.answered += 1;
        Some(self.reply_for(tid, &request))
    }

    /// Skip the oldest unanswered send (simulates a lost reply).
    pub fn drop_next(&mut self) {
        self.answered += 1;
    }
}

// ── Harness helpers ───────────────────────────────────────────

/// Canvas with a deterministic id counter starting at 1.
pub fn canvas() -> (Canvas, MockLink) {
    let link = MockLink::new();
    let config = LinkConfig {
        transaction_id_seed: Some(1),
        ..LinkConfig::default()
    };
    let canvas = Canvas::new(&config, link.clone()).unwrap();
    (canvas, link)
}

/// Let the device answer every send until the link goes quiet.
pub fn run_device(
    canvas: &Canvas,
    link: &MockLink,
    device: &mut ScriptedDevice,
    events: &mut Vec<CanvasEvent>,
) -> usize {
    let mut rounds = 0;
    while let Some(frame) = device.answer_next(link) {
        let _ = canvas.dispatch(frame, events);
        rounds += 1;
        assert!(rounds < 100, "device loop did not settle");
    }
    rounds
}
