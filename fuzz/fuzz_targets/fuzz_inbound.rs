//! Fuzz target: `LineDecoder` + `validate_inbound`
//!
//! Drives arbitrary byte sequences through the streaming line decoder and
//! the inbound envelope gates.  Neither may panic, no frame may exceed
//! the size cap, and anything the gates accept must carry a 2xx code.
//!
//! cargo fuzz run fuzz_inbound

#![no_main]

use libfuzzer_sys::fuzz_target;
use petfeeder::sync::codec::{LineDecoder, MAX_FRAME_SIZE};
use petfeeder::sync::message::validate_inbound;

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    // Split the input in two so frames straddle feeds.
    let mid = data.len() / 2;
    for chunk in [&data[..mid], &data[mid..]] {
        decoder.feed(chunk);
        while let Some(frame) = decoder.next_frame() {
            let Ok(frame) = frame else { continue };
            assert!(!frame.is_empty(), "decoder must not yield empty frames");
            assert!(frame.len() <= MAX_FRAME_SIZE, "frame exceeds MAX_FRAME_SIZE");
            if let Ok(msg) = validate_inbound(&frame) {
                assert!((200..300).contains(&msg.code));
            }
        }
    }

    // The whole input as one frame body.
    let _ = validate_inbound(data);
});
