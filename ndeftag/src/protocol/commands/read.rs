// ndeftag/src/protocol/commands/read.rs

use crate::constants::*;
use crate::protocol::apdu::{CommandBuilder, FieldCoding};
use crate::{Error, Result};

/// One encoded ReadBinary step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRead {
    pub apdu: Vec<u8>,
    /// The answer will arrive wrapped in a discretionary data object and
    /// must go through `responses::ddo::unwrap`.
    pub ddo_wrapped: bool,
}

/// Encode the next ReadBinary for a file cursor at `offset` with `remaining`
/// bytes left to read.
///
/// When the remaining span reaches beyond offset 0x7FFF the 2-byte P1 P2
/// offset cannot address it and ReadBinary with an offset data object is
/// used instead, which only mapping version 3.0 tags understand.
pub fn read_binary(
    offset: u32,
    remaining: u32,
    cc_version: u8,
    ext_field_coding: bool,
    max_read_size: u32,
) -> Result<EncodedRead> {
    let mut length = remaining.min(max_read_size);

    if offset + remaining > T4T_MAX_P1P2_OFFSET {
        if cc_version < T4T_VERSION_3_0 {
            log::error!("cannot read above 0x7FFF for MV2.0");
            return Err(Error::AddressRangeUnsupported { version: cc_version });
        }

        let mut b = CommandBuilder::new(T4T_CMD_CLASS, T4T_CMD_INS_READ_BINARY_ODO, 0x00, 0x00);
        b.begin_data(if ext_field_coding {
            FieldCoding::Extended
        } else {
            FieldCoding::Short
        });
        b.u8(0x54).u8(0x03).be24(offset);
        b.end_data()?;

        if length < max_read_size {
            // Last chunk: the DDO tag and length bytes ride along in the
            // answer, so request the maximum the tag can send instead of
            // guessing the BER coding overhead.
            length = 0;
        }
        if ext_field_coding {
            b.le_extended(length as u16);
        } else {
            b.le_short(length);
        }
        Ok(EncodedRead {
            apdu: b.build()?,
            ddo_wrapped: true,
        })
    } else {
        let b = CommandBuilder::new(
            T4T_CMD_CLASS,
            T4T_CMD_INS_READ_BINARY,
            (offset >> 8) as u8,
            offset as u8,
        );
        let mut apdu = b.build()?;

        if ext_field_coding && length > T4T_MAX_LENGTH_LE {
            apdu.push(0x00);
            apdu.extend_from_slice(&(length as u16).to_be_bytes());
        } else {
            // Le=0x00 would mean 256 which not all tags in the field accept,
            // so read 256 bytes in two rounds of at most 255.
            if length == T4T_MAX_LENGTH_LE + 1 {
                length = T4T_MAX_LENGTH_LE;
            }
            apdu.push(length as u8);
        }
        Ok(EncodedRead {
            apdu,
            ddo_wrapped: false,
        })
    }
}
