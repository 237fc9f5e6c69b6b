// ndeftag/src/protocol/tlv.rs

//! Resumable TLV scanner for the Type 5 tag memory area.
//!
//! The NDEF TLV can sit anywhere after the capability container and its
//! header may straddle block boundaries, so the scanner keeps its position
//! in the TLV grammar between block reads. A non-NDEF TLV value that runs
//! past the end of a block is skipped across as many reads as it takes.

use crate::constants::{
    T5T_TLV_LENGTH_3BYTE_MARKER, T5T_TLV_TYPE_NDEF, T5T_TLV_TYPE_NULL, T5T_TLV_TYPE_TERM,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Type,
    Length1,
    Length2,
    Length3,
    Value,
    Done,
}

/// Result of feeding one chunk of tag memory to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// NDEF TLV header fully decoded. `value_offset` is the absolute offset
    /// of the first value byte, right after the length field.
    FoundNdef {
        start_offset: u32,
        value_offset: u32,
        length: u32,
    },
    /// Keep reading; the scanner continues where it stopped.
    NeedMore,
    /// A terminator TLV came before any NDEF TLV; nothing after it is NDEF
    /// data and the scan is over.
    Terminated,
}

/// TLV scanner state machine, persistent across block reads.
#[derive(Debug)]
pub struct TlvScanner {
    state: ScanState,
    tlv_type: u8,
    tlv_length: u32,
    ndef_start_offset: u32,
}

impl Default for TlvScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl TlvScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Type,
            tlv_type: 0,
            tlv_length: 0,
            ndef_start_offset: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Scan one chunk of memory starting at absolute offset `base_offset`.
    /// A terminator TLV ends the scan for good.
    pub fn scan(&mut self, base_offset: u32, data: &[u8]) -> ScanOutcome {
        if self.state == ScanState::Done {
            return ScanOutcome::Terminated;
        }
        let mut xx = 0usize;
        while xx < data.len() {
            let b = data[xx];
            match self.state {
                ScanState::Type => {
                    if b == T5T_TLV_TYPE_NDEF {
                        self.tlv_type = b;
                        self.ndef_start_offset = base_offset + xx as u32;
                        self.state = ScanState::Length1;
                    } else if b == T5T_TLV_TYPE_NULL {
                        // padding byte, no length field
                    } else if b == T5T_TLV_TYPE_TERM {
                        self.state = ScanState::Done;
                        return ScanOutcome::Terminated;
                    } else {
                        // TLVs with an RFU tag are not interpreted
                        self.tlv_type = b;
                        self.state = ScanState::Length1;
                    }
                }
                ScanState::Length1 => {
                    if b == T5T_TLV_LENGTH_3BYTE_MARKER {
                        self.state = ScanState::Length2;
                    } else {
                        self.tlv_length = b as u32;
                        self.state = ScanState::Value;
                        if self.tlv_type == T5T_TLV_TYPE_NDEF {
                            return ScanOutcome::FoundNdef {
                                start_offset: self.ndef_start_offset,
                                value_offset: base_offset + xx as u32 + 1,
                                length: self.tlv_length,
                            };
                        }
                    }
                }
                ScanState::Length2 => {
                    self.tlv_length = b as u32;
                    self.state = ScanState::Length3;
                }
                ScanState::Length3 => {
                    self.tlv_length = (self.tlv_length << 8) + b as u32;
                    self.state = ScanState::Value;
                    if self.tlv_type == T5T_TLV_TYPE_NDEF {
                        return ScanOutcome::FoundNdef {
                            start_offset: self.ndef_start_offset,
                            value_offset: base_offset + xx as u32 + 1,
                            length: self.tlv_length,
                        };
                    }
                }
                ScanState::Done => return ScanOutcome::Terminated,
                ScanState::Value => {
                    if self.tlv_length == 0 {
                        // empty value field, re-inspect this byte as a type
                        self.state = ScanState::Type;
                        continue;
                    }
                    let remaining = data.len() - xx;
                    if self.tlv_length as usize <= remaining {
                        xx += self.tlv_length as usize - 1;
                        self.state = ScanState::Type;
                    } else {
                        // value continues in the next block
                        self.tlv_length -= remaining as u32;
                        break;
                    }
                }
            }
            xx += 1;
        }
        ScanOutcome::NeedMore
    }
}
