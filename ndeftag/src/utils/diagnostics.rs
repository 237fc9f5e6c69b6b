// ndeftag/src/utils/diagnostics.rs

//! Malformed-response diagnostics channel.
//!
//! Responses with impossible lengths are a field-quality signal worth
//! counting separately from the error that aborts the operation. Every
//! report logs at error level; with the `diagnostics` feature a process-wide
//! counter is kept as well so integrations can export it.

#[cfg(feature = "diagnostics")]
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "diagnostics")]
static MALFORMED_RESPONSES: AtomicU64 = AtomicU64::new(0);

/// Record a malformed response. `context` names the decode site, `len` is the
/// observed byte count.
pub fn report_malformed(context: &str, len: usize) {
    #[cfg(feature = "diagnostics")]
    MALFORMED_RESPONSES.fetch_add(1, Ordering::Relaxed);
    log::error!("malformed response in {}: {} bytes", context, len);
}

/// Total malformed responses observed since process start.
#[cfg(feature = "diagnostics")]
pub fn malformed_count() -> u64 {
    MALFORMED_RESPONSES.load(Ordering::Relaxed)
}
