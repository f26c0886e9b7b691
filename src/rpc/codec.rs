//! Length-prefix frame codec and the wire envelope for byte transports.
//!
//! Wire format:
//! ```text
//! ┌────────────┬──────────────────────────────┐
//! │ Length (4B)│ postcard `WireFrame` (N B)   │
//! │ LE u32     │                              │
//! └────────────┴──────────────────────────────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete payloads.  A
//! single read may carry part of the header, part of the payload, or several
//! frames back to back; bytes after a completed frame stay buffered for the
//! next call.

use alloc::vec::Vec;

use heapless::Vec as FixedVec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dict::Dictionary;
use super::transport::FrameId;
use crate::error::LinkError;

/// Maximum frame payload size (protects against memory exhaustion).
pub const MAX_FRAME_SIZE: usize = 4096;

/// Frame header size (4-byte little-endian length).
const HEADER_SIZE: usize = 4;

/// Envelope carried inside each frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireFrame {
    /// Application data.  Host → device frames use the transaction id as
    /// `frame_id`; device → host frames use the device's own id.
    Data {
        app: Uuid,
        frame_id: FrameId,
        payload: Dictionary,
    },
    Ack { frame_id: FrameId },
    Nack { frame_id: FrameId },
    Start { app: Uuid },
    Stop { app: Uuid },
}

impl WireFrame {
    pub fn to_bytes(&self) -> Result<Vec<u8>, LinkError> {
        postcard::to_allocvec(self).map_err(|_| LinkError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        postcard::from_bytes(bytes).ok()
    }
}

/// Decoder state machine.
enum DecoderState {
    /// Waiting for header bytes.
    ReadingHeader { collected: usize },
    /// Header received, reading payload.
    ReadingPayload { expected: usize },
}

/// Streaming frame decoder.
pub struct FrameDecoder {
    state: DecoderState,
    limit: usize,
    header_buf: [u8; HEADER_SIZE],
    payload_buf: FixedVec<u8, MAX_FRAME_SIZE>,
    /// Bytes received after the last completed frame.
    pending: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_limit(MAX_FRAME_SIZE)
    }

    /// Decoder that rejects payloads larger than `limit` (capped at
    /// [`MAX_FRAME_SIZE`]).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            state: DecoderState::ReadingHeader { collected: 0 },
            limit: limit.min(MAX_FRAME_SIZE),
            header_buf: [0; HEADER_SIZE],
            payload_buf: FixedVec::new(),
            pending: Vec::new(),
        }
    }

    /// Feed bytes into the decoder.
    ///
    /// Returns `Some(payload)` when a complete frame is available.  Any
    /// bytes beyond that frame are kept; call [`next_frame`](Self::next_frame)
    /// to drain further complete frames before feeding more.
    pub fn feed(&mut self, data: &[u8]) -> Option<Vec<u8>> {
        self.pending.extend_from_slice(data);
        self.next_frame()
    }

    /// Yield the next complete frame from already-buffered bytes.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let mut offset = 0;
        let mut out = None;

        while offset < self.pending.len() && out.is_none() {
            match &mut self.state {
                DecoderState::ReadingHeader { collected } => {
                    let needed = HEADER_SIZE - *collected;
                    let to_copy = needed.min(self.pending.len() - offset);

                    self.header_buf[*collected..*collected + to_copy]
                        .copy_from_slice(&self.pending[offset..offset + to_copy]);

                    *collected += to_copy;
                    offset += to_copy;

                    if *collected == HEADER_SIZE {
                        let expected = u32::from_le_bytes(self.header_buf) as usize;

                        if expected == 0 || expected > self.limit {
                            // Invalid length: resync on the next header.
                            self.state = DecoderState::ReadingHeader { collected: 0 };
                            continue;
                        }

                        self.payload_buf.clear();
                        self.state = DecoderState::ReadingPayload { expected };
                    }
                }

                DecoderState::ReadingPayload { expected } => {
                    let needed = *expected - self.payload_buf.len();
                    let to_copy = needed.min(self.pending.len() - offset);

                    // Capacity is MAX_FRAME_SIZE and expected <= limit.
                    let _ = self
                        .payload_buf
                        .extend_from_slice(&self.pending[offset..offset + to_copy]);
                    offset += to_copy;

                    if self.payload_buf.len() == *expected {
                        self.state = DecoderState::ReadingHeader { collected: 0 };
                        out = Some(self.payload_buf.to_vec());
                    }
                }
            }
        }

        self.pending.drain(..offset);
        out
    }

    /// Reset decoder state (e.g. after a transport reconnect).
    pub fn reset(&mut self) {
        self.state = DecoderState::ReadingHeader { collected: 0 };
        self.payload_buf.clear();
        self.pending.clear();
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a payload into a length-prefixed frame.
///
/// Writes `[LE-u32 length][payload]` into `out_buf`.
/// Returns the total number of bytes written.
pub fn encode_frame(payload: &[u8], out_buf: &mut [u8]) -> Option<usize> {
    let total = HEADER_SIZE + payload.len();
    if total > out_buf.len() || payload.len() > MAX_FRAME_SIZE {
        return None;
    }

    let len_bytes = (payload.len() as u32).to_le_bytes();
    out_buf[..HEADER_SIZE].copy_from_slice(&len_bytes);
    out_buf[HEADER_SIZE..total].copy_from_slice(payload);

    Some(total)
}

/// Serialise and frame a [`WireFrame`], rejecting payloads above `limit`.
pub fn encode_wire_frame(frame: &WireFrame, limit: usize) -> Result<Vec<u8>, LinkError> {
    let payload = frame.to_bytes()?;
    if payload.len() > limit.min(MAX_FRAME_SIZE) {
        return Err(LinkError::FrameTooLarge);
    }
    let mut buf = alloc::vec![0u8; HEADER_SIZE + payload.len()];
    let len = encode_frame(&payload, &mut buf).ok_or(LinkError::FrameTooLarge)?;
    buf.truncate(len);
    Ok(buf)
}
