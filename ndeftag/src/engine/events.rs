// ndeftag/src/engine/events.rs

use crate::types::NdefFlags;
use crate::Error;

/// Operation a terminal event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Detect,
    Read,
    Update,
    Format,
    SetReadOnly,
    PresenceCheck,
}

/// Events reported to the host. Every accepted operation produces exactly
/// one terminal event; reads additionally produce one `ReadSegment` per
/// intermediate chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RwEvent {
    /// Detection finished.
    NdefDetected {
        cur_size: u32,
        max_size: u32,
        flags: NdefFlags,
    },
    /// One chunk of NDEF content; more follow.
    ReadSegment { data: Vec<u8> },
    /// Final chunk of NDEF content.
    ReadComplete { data: Vec<u8> },
    /// Update finished.
    UpdateComplete,
    /// Format finished; `max_size` is the provisioned NDEF file size.
    FormatComplete { max_size: u32 },
    /// The tag is now read-only.
    SetReadOnlyComplete,
    /// Presence check verdict.
    PresenceCheck { present: bool },
    /// A response arrived while no operation was running.
    RawFrame { data: Vec<u8> },
    /// A transport error was reported while no operation was running.
    TransportError { status: u8 },
    /// The active operation failed.
    Failed { operation: Operation, error: Error },
}

/// Sink receiving engine events. Chunked read data is moved into the sink.
pub trait EventSink {
    fn on_event(&mut self, event: RwEvent);
}

impl EventSink for Vec<RwEvent> {
    fn on_event(&mut self, event: RwEvent) {
        self.push(event);
    }
}
