// ndeftag/src/error.rs

use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid response length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("command failed: sw=({sw1:#04x}, {sw2:#04x})")]
    Status { sw1: u8, sw2: u8 },

    #[error("tag reported error flags: {flags:#04x}")]
    TagFlags { flags: u8 },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("capability container rejected: {0}")]
    BadCapabilityContainer(String),

    #[error("offset range requires mapping version 3.0, tag reports {version:#04x}")]
    AddressRangeUnsupported { version: u8 },

    #[error("transport error: status {status:#04x}")]
    Transport { status: u8 },

    #[error("transport rejected command: no buffer")]
    NoBuffer,

    #[error("operation timed out")]
    Timeout,

    #[error("session is busy with another operation")]
    Busy,

    #[error("tag is not activated")]
    NotActivated,

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
