// ndeftag/src/lib.rs

//! ndeftag
//!
//! Event-driven NDEF access engine for NFC Forum Type 4 Tags (ISO 7816-4
//! APDUs over ISO-DEP) and Type 5 Tags (ISO 15693 block commands). The
//! engine encodes commands, the host owns the radio: answers, timeouts and
//! link errors are fed back in and results come out as events.

pub mod constants;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod test_support;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the newtypes in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
