//! WristLink host entry point.
//!
//! Speaks the framed link over stdin/stdout and draws a greeting on the
//! device.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  stdin ──▶ reader thread ──▶ InboundQueue ──▶ dispatch loop    │
//! │                                                   │            │
//! │                                                   ▼            │
//! │                      Canvas ◀── Window ◀── TextLayer           │
//! │                        │                                       │
//! │  stdout ◀── FramedLink ◀┘                                      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{info, warn};

use wristlink::adapters::framed_link::FramedLink;
use wristlink::adapters::io_transport::IoTransport;
use wristlink::adapters::log_sink::LogEventSink;
use wristlink::canvas::Canvas;
use wristlink::config::LinkConfig;
use wristlink::rpc::channels::InboundQueue;
use wristlink::rpc::io_task;

static INBOUND: InboundQueue = InboundQueue::new();

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    info!(
        "WristLink starting (app {}, max frame {} B)",
        config.app_uuid, config.max_frame_size
    );

    // ── Link ─────────────────────────────────────────────────
    let link = FramedLink::new(IoTransport::new(std::io::stdout()), config.frame_limit());
    let canvas = Canvas::new(&config, link)?;
    let reader = io_task::spawn_reader(
        std::io::stdin(),
        &INBOUND,
        config.app_uuid,
        config.frame_limit(),
    )
    .context("spawning reader thread")?;

    // ── Scene ────────────────────────────────────────────────
    canvas.gateway().start_app()?;

    let window = canvas.create_window();
    let greeting = canvas.text_layer();
    greeting.set_text("Hello, World!");
    window.add_layer(greeting);

    window.request_update(canvas.gateway())?;
    window.request_push(canvas.gateway())?;

    // ── Dispatch until stdin closes ──────────────────────────
    let mut sink = LogEventSink::new();
    io_task::run_dispatch(&INBOUND, &canvas, &mut sink);

    if reader.join().is_err() {
        warn!("reader thread panicked");
    }

    let outstanding = canvas.gateway().in_flight();
    if !outstanding.is_empty() {
        warn!("exiting with transactions in flight: {:?}", outstanding);
    }
    if let Some(failure) = window.last_error() {
        return Err(wristlink::Error::from(failure)).context("greeting window");
    }
    info!("WristLink stopped (window pending: {:?})", window.pending_ops());
    Ok(())
}

/// Config from the file named by the first argument, else defaults.
fn load_config() -> Result<LinkConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(LinkConfig::default());
    };
    let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    LinkConfig::from_json(&json).with_context(|| format!("parsing {path}"))
}
