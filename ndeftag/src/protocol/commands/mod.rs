// ndeftag/src/protocol/commands/mod.rs

//! Command encoders. Each submodule produces complete wire-ready commands
//! for one family: ISO 7816-4 file selection, binary read, binary update,
//! DESFire provisioning, and ISO 15693 block access.

pub mod desfire;
pub mod read;
pub mod select;
pub mod t5t;
pub mod update;

pub use read::{read_binary, EncodedRead};
pub use select::{select_application, select_file};
pub use update::{update_binary, update_binary_odo, update_cc_to_readonly, update_nlen, OdoChunk};
