// ndeftag/src/protocol/responses/ddo.rs

//! Discretionary data object unwrapping. Answers to ReadBinary with ODO
//! wrap the file content in a BER-TLV `53 <length> <content>`.

use crate::constants::T4T_DDO_TAG;
use crate::{Error, Result};

/// Strip the DDO envelope from a read payload (status word already removed)
/// and return the file content. The declared BER length must match the bytes
/// actually present.
pub fn unwrap(payload: &[u8], max_read_size: u32) -> Result<&[u8]> {
    if payload.len() < 2 {
        return Err(Error::InvalidLength {
            expected: 2,
            actual: payload.len(),
        });
    }
    if payload[0] != T4T_DDO_TAG {
        return Err(Error::Protocol("invalid DDO tag".to_string()));
    }

    let (declared, header) = match payload[1] {
        b1 if b1 <= 0x7F => (b1 as usize, 2),
        0x81 => {
            if payload.len() < 3 {
                return Err(Error::InvalidLength {
                    expected: 3,
                    actual: payload.len(),
                });
            }
            let b2 = payload[2];
            if b2 > 0xFD {
                return Err(Error::Protocol(
                    "invalid DDO content length (1-byte form)".to_string(),
                ));
            }
            (b2 as usize, 3)
        }
        0x82 => {
            if payload.len() < 4 {
                return Err(Error::InvalidLength {
                    expected: 4,
                    actual: payload.len(),
                });
            }
            let declared = u16::from_be_bytes([payload[2], payload[3]]) as usize;
            if declared as u32 > max_read_size.saturating_sub(4) {
                return Err(Error::Protocol(
                    "invalid DDO content length (2-byte form)".to_string(),
                ));
            }
            (declared, 4)
        }
        _ => return Err(Error::Protocol("invalid DDO length coding".to_string())),
    };

    let content = &payload[header..];
    if content.len() != declared {
        return Err(Error::InvalidLength {
            expected: declared,
            actual: content.len(),
        });
    }
    Ok(content)
}
