// ndeftag/src/protocol/commands/update.rs

use crate::constants::*;
use crate::protocol::apdu::{CommandBuilder, FieldCoding};
use crate::{Error, Result};

/// One encoded ODO UpdateBinary step plus how many payload bytes it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdoChunk {
    pub apdu: Vec<u8>,
    pub consumed: usize,
}

/// UpdateBinary with a 2-byte file offset. The caller limits `data` to the
/// short Lc range; 255 bytes is the hard ceiling since Lc=00 is reserved for
/// extended field coding.
pub fn update_binary(offset: u16, data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() || data.len() > T4T_MAX_LENGTH_LC as usize {
        return Err(Error::InvalidLength {
            expected: T4T_MAX_LENGTH_LC as usize,
            actual: data.len(),
        });
    }
    let mut b = CommandBuilder::new(
        T4T_CMD_CLASS,
        T4T_CMD_INS_UPDATE_BINARY,
        (offset >> 8) as u8,
        offset as u8,
    );
    b.begin_data(FieldCoding::Short);
    b.bytes(data);
    b.end_data()?;
    b.build()
}

/// Rewrite the NLEN (2 bytes) or ENLEN (4 bytes) field at file offset 0.
pub fn update_nlen(nlen_size: u8, ndef_len: u32) -> Result<Vec<u8>> {
    let mut b = CommandBuilder::new(T4T_CMD_CLASS, T4T_CMD_INS_UPDATE_BINARY, 0x00, 0x00);
    b.begin_data(FieldCoding::Short);
    if nlen_size == T4T_FILE_LENGTH_SIZE {
        b.be16(ndef_len as u16);
    } else {
        b.bytes(&ndef_len.to_be_bytes());
    }
    b.end_data()?;
    b.build()
}

/// Clear the write-access byte of the capability container, making the tag
/// read-only.
pub fn update_cc_to_readonly() -> Result<Vec<u8>> {
    let offset = T4T_FC_TLV_OFFSET_IN_CC + T4T_FC_WRITE_ACCESS_OFFSET_IN_TLV;
    let mut b = CommandBuilder::new(
        T4T_CMD_CLASS,
        T4T_CMD_INS_UPDATE_BINARY,
        (offset >> 8) as u8,
        offset as u8,
    );
    b.begin_data(FieldCoding::Short);
    b.u8(T4T_FC_NO_WRITE_ACCESS);
    b.end_data()?;
    b.build()
}

const BER_TLV_LENGTH_1_BYTE: u8 = 1;
const BER_TLV_LENGTH_2_BYTES: u8 = 2;
const BER_TLV_LENGTH_3_BYTES: u8 = 3;

/// UpdateBinary with offset and discretionary data objects, for writes whose
/// remaining span reaches beyond offset 0x7FFF. Only mapping version 3.0
/// understands this form.
///
/// The data field is `54 03 <offset:3> 53 <BER length> <payload>` and the
/// chunk size is squeezed so the whole field fits the Lc coding in use.
pub fn update_binary_odo(
    offset: u32,
    remaining_data: &[u8],
    cc_version: u8,
    ext_field_coding: bool,
    max_update_size: u32,
) -> Result<OdoChunk> {
    if cc_version < T4T_VERSION_3_0 {
        log::error!("cannot write above 0x7FFF for MV2.0");
        return Err(Error::AddressRangeUnsupported { version: cc_version });
    }

    let mut length = (remaining_data.len() as u32).min(max_update_size);
    let mut data_length = length;

    let length_size = if length <= 0x7F {
        BER_TLV_LENGTH_1_BYTE
    } else if length + 8 <= 0xFF {
        BER_TLV_LENGTH_2_BYTES
    } else if ext_field_coding {
        if length <= 0xFF {
            BER_TLV_LENGTH_2_BYTES
        } else {
            BER_TLV_LENGTH_3_BYTES
        }
    } else {
        // Only short field coding available: write at most 255 bytes per
        // round, Lc=00 being reserved for extended coding.
        length = 0;
        BER_TLV_LENGTH_2_BYTES
    };

    let data_header = T4T_ODO_DDO_HEADER_MIN_LENGTH + length_size as u32;
    if length == 0 {
        length = T4T_MAX_LENGTH_LC;
        if length <= max_update_size {
            data_length = T4T_MAX_LENGTH_LC - data_header;
        } else {
            length = max_update_size;
            data_length = max_update_size - data_header;
        }
    } else if length + data_header <= max_update_size {
        length += data_header;
    } else {
        length = max_update_size;
        data_length = max_update_size - data_header;
    }

    if data_length > RW_MAX_DATA_PER_WRITE || data_length > 0xFFFF {
        return Err(Error::InvalidLength {
            expected: RW_MAX_DATA_PER_WRITE as usize,
            actual: data_length as usize,
        });
    }

    let mut apdu = vec![T4T_CMD_CLASS, T4T_CMD_INS_UPDATE_BINARY_ODO, 0x00, 0x00];
    if ext_field_coding {
        apdu.push(0x00);
        apdu.extend_from_slice(&(length as u16).to_be_bytes());
    } else {
        apdu.push(length as u8);
    }

    apdu.extend_from_slice(&[0x54, 0x03]);
    apdu.push((offset >> 16) as u8);
    apdu.push((offset >> 8) as u8);
    apdu.push(offset as u8);
    apdu.push(T4T_DDO_TAG);
    match length_size {
        BER_TLV_LENGTH_1_BYTE => apdu.push(data_length as u8),
        BER_TLV_LENGTH_2_BYTES => {
            apdu.push(0x81);
            apdu.push(data_length as u8);
        }
        _ => {
            apdu.push(0x82);
            apdu.extend_from_slice(&(data_length as u16).to_be_bytes());
        }
    }
    apdu.extend_from_slice(&remaining_data[..data_length as usize]);

    Ok(OdoChunk {
        apdu,
        consumed: data_length as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_update_basic() {
        let apdu = update_binary(0x0002, &[0xD1, 0x01, 0x0A]).unwrap();
        assert_eq!(apdu, vec![0x00, 0xD6, 0x00, 0x02, 0x03, 0xD1, 0x01, 0x0A]);
    }

    #[test]
    fn short_update_rejects_over_255() {
        assert!(update_binary(0, &[0u8; 256]).is_err());
        assert!(update_binary(0, &[]).is_err());
    }

    #[test]
    fn nlen_two_bytes() {
        let apdu = update_nlen(T4T_FILE_LENGTH_SIZE, 0x0123).unwrap();
        assert_eq!(apdu, vec![0x00, 0xD6, 0x00, 0x00, 0x02, 0x01, 0x23]);
    }

    #[test]
    fn enlen_four_bytes() {
        let apdu = update_nlen(T4T_EFILE_LENGTH_SIZE, 0x0001_0203).unwrap();
        assert_eq!(apdu, vec![0x00, 0xD6, 0x00, 0x00, 0x04, 0x00, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn cc_readonly_offset() {
        let apdu = update_cc_to_readonly().unwrap();
        assert_eq!(apdu, vec![0x00, 0xD6, 0x00, 0x0E, 0x01, 0xFF]);
    }

    #[test]
    fn odo_update_rejected_below_v30() {
        let err =
            update_binary_odo(0x8000, &[0u8; 16], T4T_VERSION_2_0, false, 255).unwrap_err();
        assert!(matches!(err, Error::AddressRangeUnsupported { version: 0x20 }));
    }

    #[test]
    fn odo_update_small_chunk_one_byte_length() {
        let chunk = update_binary_odo(0x8000, &[0xAB; 16], T4T_VERSION_3_0, false, 255).unwrap();
        assert_eq!(chunk.consumed, 16);
        // Lc = 16 + header(7), data = 5403 offset 53 len payload
        assert_eq!(
            &chunk.apdu[..12],
            &[0x00, 0xD7, 0x00, 0x00, 0x17, 0x54, 0x03, 0x00, 0x80, 0x00, 0x53, 0x10]
        );
        assert_eq!(chunk.apdu.len(), 12 + 16);
    }

    #[test]
    fn odo_update_large_chunk_short_coding_squeezes_to_255() {
        let data = vec![0x5A; 1000];
        let chunk = update_binary_odo(0x8000, &data, T4T_VERSION_3_0, false, 255).unwrap();
        // Lc is 255; payload is 255 minus the 8-byte header.
        assert_eq!(chunk.apdu[4], 0xFF);
        assert_eq!(chunk.consumed, 255 - 8);
        assert_eq!(&chunk.apdu[10..12], &[0x81, 0xF7]);
    }

    #[test]
    fn odo_update_extended_coding_three_byte_ber() {
        let data = vec![0x5A; 0x0400];
        let chunk =
            update_binary_odo(0x8000, &data, T4T_VERSION_3_0, true, 0x0400).unwrap();
        // Extended Lc: 00 hi lo
        assert_eq!(chunk.apdu[4], 0x00);
        assert_eq!(chunk.consumed, 0x0400 - 9);
        assert_eq!(chunk.apdu[12], 0x53);
        assert_eq!(&chunk.apdu[13..16], &[0x82, 0x03, 0xF7]);
    }
}
