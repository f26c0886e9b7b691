//! Receive path and dispatch context.
//!
//! Two halves joined by the [`InboundQueue`]:
//!
//! 1. **Reader**: a dedicated thread doing blocking reads on the byte
//!    stream, decoding length-prefixed [`WireFrame`]s and forwarding data
//!    frames as [`LinkMessage::Frame`].
//! 2. **Dispatch**: an async loop run on an `edge_executor::LocalExecutor`
//!    that feeds each message to [`Canvas::dispatch`], so every completion
//!    runs on one context.
//!
//! ```text
//!  ┌──────────────────────┐        ┌──────────────────────────────────┐
//!  │  reader thread       │        │  dispatch thread                 │
//!  │  read ─▶ FrameDecoder│─queue─▶│  block_on(LocalExecutor::run(    │
//!  │        ─▶ WireFrame  │        │      dispatch_loop))             │
//!  └──────────────────────┘        └──────────────────────────────────┘
//! ```

use std::io::{ErrorKind, Read};
use std::thread::JoinHandle;

use log::{debug, info, warn};
use uuid::Uuid;

use super::channels::{InboundQueue, LinkMessage};
use super::codec::{FrameDecoder, WireFrame};
use super::transport::InboundFrame;
use crate::app::ports::EventSink;
use crate::canvas::Canvas;

const READ_BUF_SIZE: usize = 1024;

// ── Frame classification ─────────────────────────────────────

/// Turn one decoded frame payload into a queue message.
///
/// Device acknowledgements of host frames carry no semantics and are only
/// logged.  Data frames for another application are dropped.
pub fn decode_message(bytes: &[u8], app: &Uuid) -> Option<LinkMessage> {
    let Some(frame) = WireFrame::from_bytes(bytes) else {
        warn!("IO: undecodable frame ({} bytes)", bytes.len());
        return None;
    };

    match frame {
        WireFrame::Data {
            app: from,
            frame_id,
            payload,
        } => {
            if from != *app {
                debug!("IO: frame {} for foreign app {}", frame_id, from);
                return None;
            }
            Some(LinkMessage::Frame(InboundFrame::new(frame_id, payload)))
        }
        WireFrame::Ack { frame_id } => {
            debug!("IO: device acked {}", frame_id);
            None
        }
        WireFrame::Nack { frame_id } => {
            debug!("IO: device nacked {}", frame_id);
            None
        }
        WireFrame::Start { .. } | WireFrame::Stop { .. } => {
            debug!("IO: ignoring lifecycle frame from device");
            None
        }
    }
}

// ── Reader ───────────────────────────────────────────────────

/// Blocking read loop.  Returns once the stream ends or fails, after
/// reporting the disconnect and a shutdown to the queue.
pub fn read_frames(
    mut reader: impl Read,
    queue: &InboundQueue,
    app: &Uuid,
    max_frame_size: usize,
) {
    let mut decoder = FrameDecoder::with_limit(max_frame_size);
    let mut buf = [0u8; READ_BUF_SIZE];

    queue.try_push(LinkMessage::Connected(true));

    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                info!("IO: stream closed");
                break;
            }
            Ok(n) => {
                let mut next = decoder.feed(&buf[..n]);
                while let Some(bytes) = next {
                    if let Some(msg) = decode_message(&bytes, app) {
                        futures_lite::future::block_on(queue.push(msg));
                    }
                    next = decoder.next_frame();
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                warn!("IO: read failed: {}", e);
                break;
            }
        }
    }

    futures_lite::future::block_on(async {
        queue.push(LinkMessage::Connected(false)).await;
        queue.push(LinkMessage::Shutdown).await;
    });
}

/// Spawn [`read_frames`] on a dedicated thread.
pub fn spawn_reader(
    reader: impl Read + Send + 'static,
    queue: &'static InboundQueue,
    app: Uuid,
    max_frame_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("wristlink-rx".into())
        .spawn(move || read_frames(reader, queue, &app, max_frame_size))
}

// ── Dispatch ─────────────────────────────────────────────────

/// Drain the queue into the canvas until [`LinkMessage::Shutdown`].
pub async fn dispatch_loop(queue: &InboundQueue, canvas: &Canvas, sink: &mut impl EventSink) {
    loop {
        match queue.next().await {
            LinkMessage::Frame(frame) => {
                // Rejections are already reported through the sink.
                let _ = canvas.dispatch(frame, sink);
            }
            LinkMessage::Connected(connected) => canvas.set_connected(connected, sink),
            LinkMessage::Shutdown => {
                info!("IO: dispatch loop stopping");
                return;
            }
        }
    }
}

/// Run [`dispatch_loop`] to completion on the current thread.
pub fn run_dispatch(queue: &InboundQueue, canvas: &Canvas, sink: &mut impl EventSink) {
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    futures_lite::future::block_on(executor.run(dispatch_loop(queue, canvas, sink)));
}
