// ndeftag/src/transport/mock.rs

use crate::transport::traits::Transport;
use crate::{Error, Result};

/// Mock transport for unit tests. It records sent payloads and can be told
/// to reject sends.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub sent: Vec<Vec<u8>>,
    /// Number of NAK presence exchanges requested through `isodep_nak`.
    pub nak_count: usize,
    /// Testing hook: number of send calls that should fail with NoBuffer
    pub send_failures: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many subsequent send calls should fail (for tests).
    pub fn set_send_failures(&mut self, n: usize) {
        self.send_failures = n;
    }

    pub fn pop_sent(&mut self) -> Option<Vec<u8>> {
        self.sent.pop()
    }

    /// Remove and return the oldest recorded command.
    pub fn take_first_sent(&mut self) -> Option<Vec<u8>> {
        if self.sent.is_empty() {
            None
        } else {
            Some(self.sent.remove(0))
        }
    }
}

impl Transport for MockTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.send_failures > 0 {
            self.send_failures -= 1;
            return Err(Error::NoBuffer);
        }
        self.sent.push(data.to_vec());
        Ok(())
    }

    fn isodep_nak(&mut self) -> Result<()> {
        if self.send_failures > 0 {
            self.send_failures -= 1;
            return Err(Error::NoBuffer);
        }
        self.nak_count += 1;
        Ok(())
    }
}
