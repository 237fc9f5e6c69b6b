// ndeftag/src/protocol/responses/t5t.rs

//! ISO 15693 response decoding: flags byte and the Type 5 capability
//! container.
//!
//! CC layout:
//!
//! ```text
//! CC[0] : magic number (E1h, or E2h when extended commands are mandated)
//! CC[1] : b7-6 major version, b5-4 minor version,
//!         b3-2 read access condition, b1-0 write access condition
//! CC[2] : memory size in units of 8 bytes, 00h if the CC is 8 bytes long
//! CC[3] : feature bits (read multiple blocks, special frame)
//! CC[6-7] : memory size in units of 8 bytes (8-byte CC only)
//! ```

use crate::constants::*;
use crate::{Error, Result};

/// Split an ISO 15693 response into its flags byte and payload, failing on
/// the error-detected flag.
pub fn strip_flags(resp: &[u8]) -> Result<&[u8]> {
    if resp.is_empty() {
        return Err(Error::InvalidLength {
            expected: 1,
            actual: 0,
        });
    }
    let flags = resp[0];
    if flags & I93_FLAG_ERROR_DETECTED != 0 {
        log::debug!("got error flags ({flags:#04x})");
        return Err(Error::TagFlags { flags });
    }
    Ok(&resp[1..])
}

/// First four bytes of the Type 5 capability container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct T5tCcHead {
    pub magic: u8,
    pub access: u8,
    pub mlen_byte: u8,
    pub features: u8,
}

impl T5tCcHead {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < T5T_CC_SHORT_LEN as usize {
            return Err(Error::InvalidLength {
                expected: T5T_CC_SHORT_LEN as usize,
                actual: payload.len(),
            });
        }
        Ok(Self {
            magic: payload[0],
            access: payload[1],
            mlen_byte: payload[2],
            features: payload[3],
        })
    }

    pub fn magic_valid(&self) -> bool {
        self.magic == I93_ICODE_CC_MAGIC_NUMBER || self.magic == I93_ICODE_CC_MAGIC_NUMBER_E2
    }

    /// Tags mandating the extended (16-bit block number) command set.
    pub fn extended_commands(&self) -> bool {
        self.magic == I93_ICODE_CC_MAGIC_NUMBER_E2
    }

    pub fn major_version_supported(&self) -> bool {
        (self.access & I93_VERSION_MAJOR_MASK) <= I93_VERSION_1_X
    }

    pub fn read_access_granted(&self) -> bool {
        self.access & I93_ICODE_CC_READ_ACCESS_MASK == 0
    }

    pub fn write_access_granted(&self) -> bool {
        self.access & I93_ICODE_CC_WRITE_ACCESS_MASK == 0
    }

    pub fn supports_read_multi_block(&self) -> bool {
        self.features & I93_ICODE_CC_MBREAD_MASK != 0
    }

    pub fn needs_special_frame(&self) -> bool {
        self.features & I93_ICODE_CC_IPREAD_MASK != 0
    }

    /// An all-zero MLEN byte means the CC is 8 bytes long with MLEN in
    /// bytes 6 and 7.
    pub fn has_extended_mlen(&self) -> bool {
        self.mlen_byte == 0
    }

    /// T5T area length for a 4-byte CC.
    pub fn short_area_len(&self) -> u32 {
        (self.mlen_byte as u32) << 3
    }
}

/// T5T area length from the MLEN bytes of an 8-byte CC.
pub fn extended_area_len(mlen_hi: u8, mlen_lo: u8) -> u32 {
    ((mlen_lo as u32) + ((mlen_hi as u32) << 8)) << 3
}

/// Map a ReadSingleBlock payload length to the tag's block size.
pub fn block_size_from_response(len: usize) -> Result<u16> {
    match len {
        4 | 8 | 16 | 32 => Ok(len as u16),
        _ => Err(Error::Protocol(format!("unexpected block length {len}"))),
    }
}
