// ndeftag/src/protocol/mod.rs

//! Wire-level protocol: command encoding, response decoding, TLV scanning.

pub mod apdu;
pub mod commands;
pub mod responses;
pub mod tlv;
