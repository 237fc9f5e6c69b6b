// ndeftag/src/protocol/apdu.rs

use crate::{Error, Result};

/// Lc/Le field coding of a command APDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCoding {
    /// One byte, values 1..=255 (0x00 meaning 256 for Le).
    Short,
    /// Three bytes: 0x00 marker followed by a big-endian u16.
    Extended,
}

/// Byte writer for command APDUs.
///
/// The builder reserves the Lc field when the data section begins and
/// backfills it when the section ends, refusing to finish if the assembled
/// byte count does not fit the declared coding. This keeps every declared
/// length consistent with the bytes actually emitted.
#[derive(Debug)]
pub struct CommandBuilder {
    buf: Vec<u8>,
    lc_pos: Option<(usize, FieldCoding)>,
    data_start: usize,
}

impl CommandBuilder {
    /// Start an APDU with the four header bytes CLA INS P1 P2.
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            buf: vec![cla, ins, p1, p2],
            lc_pos: None,
            data_start: 0,
        }
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn be16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn be24(&mut self, v: u32) -> &mut Self {
        self.buf.push((v >> 16) as u8);
        self.buf.push((v >> 8) as u8);
        self.buf.push(v as u8);
        self
    }

    /// DESFire native byte order for 16-bit values.
    pub fn le16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(v);
        self
    }

    /// Reserve the Lc field; everything written until `end_data` becomes the
    /// command data section.
    pub fn begin_data(&mut self, coding: FieldCoding) -> &mut Self {
        debug_assert!(self.lc_pos.is_none());
        self.lc_pos = Some((self.buf.len(), coding));
        match coding {
            FieldCoding::Short => self.buf.push(0),
            FieldCoding::Extended => self.buf.extend_from_slice(&[0, 0, 0]),
        }
        self.data_start = self.buf.len();
        self
    }

    /// Backfill the reserved Lc field with the assembled data length.
    pub fn end_data(&mut self) -> Result<&mut Self> {
        let (pos, coding) = self.lc_pos.take().ok_or_else(|| {
            Error::Protocol("end_data without begin_data".to_string())
        })?;
        let len = self.buf.len() - self.data_start;
        match coding {
            FieldCoding::Short => {
                if len == 0 || len > 0xFF {
                    return Err(Error::InvalidLength {
                        expected: 0xFF,
                        actual: len,
                    });
                }
                self.buf[pos] = len as u8;
            }
            FieldCoding::Extended => {
                if len == 0 || len > 0xFFFF {
                    return Err(Error::InvalidLength {
                        expected: 0xFFFF,
                        actual: len,
                    });
                }
                self.buf[pos + 1] = (len >> 8) as u8;
                self.buf[pos + 2] = len as u8;
            }
        }
        Ok(self)
    }

    /// Append a one-byte Le field. 256 is encoded as 0x00.
    pub fn le_short(&mut self, le: u32) -> &mut Self {
        self.buf.push(le as u8);
        self
    }

    /// Append a two-byte extended Le field (the 0x00 marker is only present
    /// when there is no data section, which these commands never emit).
    pub fn le_extended(&mut self, le: u16) -> &mut Self {
        self.buf.extend_from_slice(&le.to_be_bytes());
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish the APDU. Fails if a data section was begun but never ended.
    pub fn build(self) -> Result<Vec<u8>> {
        if self.lc_pos.is_some() {
            return Err(Error::Protocol("unterminated data section".to_string()));
        }
        Ok(self.buf)
    }
}
