// ndeftag/src/utils/mod.rs

//! Small helpers shared across the crate: hex traces, the response timeout
//! default and the malformed-frame diagnostics channel.

pub mod diagnostics;
pub mod hex;
pub mod timeout;

pub use hex::*;
pub use timeout::*;
