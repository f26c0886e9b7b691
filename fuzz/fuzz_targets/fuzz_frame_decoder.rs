//! Fuzz target: `FrameDecoder::feed` / `next_frame`
//!
//! Drives arbitrary byte sequences, split at an arbitrary point, into the
//! streaming frame decoder and asserts that it never panics and never
//! yields an empty or oversized payload.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use wristlink::rpc::codec::{FrameDecoder, MAX_FRAME_SIZE};

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |b| *b as usize).min(data.len());
    let mut decoder = FrameDecoder::new();

    for part in [&data[..split], &data[split..]] {
        let mut next = decoder.feed(part);
        while let Some(payload) = next {
            assert!(payload.len() <= MAX_FRAME_SIZE, "payload exceeds MAX_FRAME_SIZE");
            assert!(!payload.is_empty(), "decoder must not yield empty payload");
            next = decoder.next_frame();
        }
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    let _ = decoder.feed(data);
});
