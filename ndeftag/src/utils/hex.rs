// ndeftag/src/utils/hex.rs

//! Lowercase hex rendering for the frame trace log.

use std::fmt::Write;

/// Render a frame as a compact lowercase hex string.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut s, "{b:02x}");
    }
    s
}
