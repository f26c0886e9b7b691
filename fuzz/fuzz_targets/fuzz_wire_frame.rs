//! Fuzz target: `WireFrame::from_bytes` and inbound classification
//!
//! Arbitrary payloads must decode to `None` or to a frame that re-encodes,
//! and a decoded data frame must pass through `decode_message` without
//! panicking.
//!
//! cargo fuzz run fuzz_wire_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use wristlink::config::CANVAS_APP_UUID;
use wristlink::rpc::codec::WireFrame;
use wristlink::rpc::io_task::decode_message;

fuzz_target!(|data: &[u8]| {
    if let Some(frame) = WireFrame::from_bytes(data) {
        let bytes = frame.to_bytes().expect("decoded frame must re-encode");
        assert_eq!(WireFrame::from_bytes(&bytes), Some(frame));
    }
    let _ = decode_message(data, &CANVAS_APP_UUID);
});
