// ndeftag/src/protocol/responses/cc.rs

//! Capability container parsing and validation for Type 4 tags.
//!
//! The CC file starts with CCLEN, the mapping version, MLe and MLc, followed
//! by the first file-control TLV. Mapping version 3.0 tags may carry an
//! extended file-control TLV instead, whose value field holds a 4-byte
//! maximum file size and sits beyond the first 15 bytes read.

use crate::constants::*;
use crate::types::FileId;
use crate::{Error, Result};

/// File-control TLV content describing the NDEF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdefFileControl {
    pub file_id: FileId,
    pub max_file_size: u32,
    pub read_access: u8,
    pub write_access: u8,
    /// 2 for an NLEN file, 4 for an ENLEN file.
    pub nlen_size: u8,
}

/// Parsed capability container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityContainer {
    pub cclen: u16,
    pub version: u8,
    pub max_le: u16,
    pub max_lc: u16,
    pub ndef: NdefFileControl,
}

/// CC header fields kept aside while the extended TLV tail is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialCc {
    pub cclen: u16,
    pub version: u8,
    pub max_le: u16,
    pub max_lc: u16,
}

/// Outcome of parsing the first 15 CC bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcParse {
    Complete(CapabilityContainer),
    /// The CC carries an extended file-control TLV; its 8-byte value field
    /// must be read from offset 9 before the CC is usable.
    NeedExtendedTail(PartialCc),
}

/// Parse the first 15 bytes of the CC file.
pub fn parse_cc(payload: &[u8]) -> Result<CcParse> {
    if payload.len() < T4T_CC_FILE_MIN_LEN {
        return Err(Error::InvalidLength {
            expected: T4T_CC_FILE_MIN_LEN,
            actual: payload.len(),
        });
    }

    let cclen = u16::from_be_bytes([payload[0], payload[1]]);
    let version = payload[2];
    let max_le = u16::from_be_bytes([payload[3], payload[4]]);
    let max_lc = u16::from_be_bytes([payload[5], payload[6]]);
    let tlv_type = payload[7];
    let tlv_len = payload[8];

    match (tlv_type, tlv_len) {
        (T4T_NDEF_FILE_CONTROL_TYPE, T4T_FILE_CONTROL_LENGTH) => {
            let ndef = NdefFileControl {
                file_id: FileId::new(u16::from_be_bytes([payload[9], payload[10]])),
                max_file_size: u16::from_be_bytes([payload[11], payload[12]]) as u32,
                read_access: payload[13],
                write_access: payload[14],
                nlen_size: T4T_FILE_LENGTH_SIZE,
            };
            Ok(CcParse::Complete(CapabilityContainer {
                cclen,
                version,
                max_le,
                max_lc,
                ndef,
            }))
        }
        (T4T_ENDEF_FILE_CONTROL_TYPE, T4T_ENDEF_FILE_CONTROL_LENGTH) => {
            Ok(CcParse::NeedExtendedTail(PartialCc {
                cclen,
                version,
                max_le,
                max_lc,
            }))
        }
        _ => Err(Error::BadCapabilityContainer(format!(
            "unknown file-control TLV ({tlv_type:#04x}, {tlv_len:#04x})"
        ))),
    }
}

/// Complete a CC from the 8-byte extended file-control TLV value field.
pub fn parse_extended_tail(partial: PartialCc, payload: &[u8]) -> Result<CapabilityContainer> {
    if payload.len() < T4T_ENDEF_FILE_CONTROL_LENGTH as usize {
        return Err(Error::InvalidLength {
            expected: T4T_ENDEF_FILE_CONTROL_LENGTH as usize,
            actual: payload.len(),
        });
    }

    let ndef = NdefFileControl {
        file_id: FileId::new(u16::from_be_bytes([payload[0], payload[1]])),
        max_file_size: u32::from_be_bytes([payload[2], payload[3], payload[4], payload[5]]),
        read_access: payload[6],
        write_access: payload[7],
        nlen_size: T4T_EFILE_LENGTH_SIZE,
    };
    Ok(CapabilityContainer {
        cclen: partial.cclen,
        version: partial.version,
        max_le: partial.max_le,
        max_lc: partial.max_lc,
        ndef,
    })
}

fn major_version(version: u8) -> u8 {
    version >> 4
}

/// Validate a parsed CC against the mapping version the session negotiated.
pub fn validate(cc: &CapabilityContainer, our_version: u8, dta_mode: bool) -> Result<()> {
    if (cc.cclen as usize) < T4T_CC_FILE_MIN_LEN {
        return Err(Error::BadCapabilityContainer(format!(
            "CCLEN ({}) is too short",
            cc.cclen
        )));
    }

    if major_version(cc.version) > major_version(our_version) {
        return Err(Error::BadCapabilityContainer(format!(
            "peer version ({:#04x}) mismatched to ours ({:#04x})",
            cc.version, our_version
        )));
    }

    if cc.max_le < T4T_MIN_MLE {
        return Err(Error::BadCapabilityContainer(format!(
            "MaxLe ({}) is too small",
            cc.max_le
        )));
    }

    if cc.max_lc < 0x0001 || (dta_mode && cc.max_lc < T4T_DTA_MIN_MLC) {
        return Err(Error::BadCapabilityContainer(format!(
            "MaxLc ({}) is too small",
            cc.max_lc
        )));
    }

    let file_id = cc.ndef.file_id.as_u16();
    let reserved = file_id == FileId::CAPABILITY_CONTAINER.as_u16()
        || file_id == 0xE102
        || (file_id == 0x0000
            && (cc.version == T4T_VERSION_2_0 || cc.version == T4T_VERSION_3_0))
        || file_id == 0x3F00
        || file_id == 0x3FFF
        || file_id == 0xFFFF;
    if reserved {
        return Err(Error::BadCapabilityContainer(format!(
            "file id ({file_id:#06x}) is invalid"
        )));
    }

    let size = cc.ndef.max_file_size;
    let size_reserved = (cc.version == T4T_VERSION_2_0 && !(0x0005..=0x7FFF).contains(&size))
        || (cc.version == T4T_VERSION_3_0 && (size < 0x0000_0007 || size == 0xFFFF_FFFF));
    if size_reserved {
        return Err(Error::BadCapabilityContainer(format!(
            "max_file_size ({size}) is reserved"
        )));
    }

    let read = cc.ndef.read_access;
    if (read > T4T_FC_READ_ACCESS && read < T4T_FC_PROP_ACCESS_START)
        || read == T4T_FC_NO_READ_ACCESS
    {
        return Err(Error::BadCapabilityContainer(format!(
            "read access ({read:#04x}) is invalid"
        )));
    }

    let write = cc.ndef.write_access;
    if write > T4T_FC_WRITE_ACCESS && write < T4T_FC_PROP_ACCESS_START {
        return Err(Error::BadCapabilityContainer(format!(
            "write access ({write:#04x}) is invalid"
        )));
    }

    Ok(())
}
