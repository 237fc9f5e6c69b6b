// ndeftag/src/transport/traits.rs

use crate::Result;

/// Transport trait abstracts the activated tag link away from the engine.
///
/// The engine is event-driven: it only pushes commands out through `send`,
/// and the host integration feeds answers back through `Engine::on_data`.
/// A failed `send` is reported synchronously; everything after that arrives
/// as an event.
pub trait Transport {
    /// Queue raw bytes for transmission to the tag. An empty slice requests
    /// an empty I-block (ISO-DEP presence probe).
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Run an ISO-DEP NAK presence exchange. Default implementation falls
    /// back to an empty I-block so transports without NAK support keep
    /// working.
    fn isodep_nak(&mut self) -> Result<()> {
        self.send(&[])
    }
}
