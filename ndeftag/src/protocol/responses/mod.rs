// ndeftag/src/protocol/responses/mod.rs

//! Response decoders: status-word trailers, capability containers,
//! discretionary data objects, and ISO 15693 response frames.

pub mod cc;
pub mod ddo;
pub mod status;
pub mod t5t;

pub use cc::{CapabilityContainer, CcParse, NdefFileControl, PartialCc};
pub use status::{desfire_status, split_status, status_word};
