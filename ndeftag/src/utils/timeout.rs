// ndeftag/src/utils/timeout.rs

use std::time::Duration;

/// How long the host should wait for an answer to the outstanding command
/// before calling `Engine::on_timeout`.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 1000;

pub fn default_response_timeout() -> Duration {
    Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS)
}
