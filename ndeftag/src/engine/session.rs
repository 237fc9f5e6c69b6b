// ndeftag/src/engine/session.rs

//! Per-technology session state. One session exists per activated tag; it
//! carries the negotiated parameters, the file cursor of the operation in
//! flight, and the current position in the operation's state machine.

use crate::constants::*;
use crate::engine::events::Operation;
use crate::protocol::responses::cc::{CapabilityContainer, PartialCc};
use crate::protocol::tlv::TlvScanner;
use crate::types::CardType;

/// Command sent and awaiting its answer. The engine keeps at most one; its
/// presence means the response timer is armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub apdu: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Type 4
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DetectSub {
    SelectApp,
    SelectCc,
    ReadCc,
    ReadEndefTail,
    SelectNdef,
    ReadNlen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpdateSub {
    ZeroNlen,
    Data,
    RestoreNlen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadOnlySub {
    SelectCc,
    UpdateCc,
    SelectNdef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormatSub {
    HwVersion,
    SwVersion,
    Uid,
    CreateApp,
    SelectApp,
    CreateCc,
    CreateNdef,
    WriteCc,
    WriteNdef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum T4tState {
    Idle,
    DetectNdef(DetectSub),
    ReadNdef,
    UpdateNdef(UpdateSub),
    SetReadOnly(ReadOnlySub),
    PresenceCheck,
    Format(FormatSub),
}

#[derive(Debug)]
pub(crate) struct T4tSession {
    pub state: T4tState,
    /// Mapping version negotiated with the tag, downgraded to 1.0 when the
    /// version 2.0 application select is refused.
    pub version: u8,
    pub cc: Option<CapabilityContainer>,
    pub partial_cc: Option<PartialCc>,
    pub ndef_detected: bool,
    pub read_only: bool,
    pub ndef_length: u32,
    pub max_read_size: u32,
    pub max_update_size: u32,
    pub ext_field_coding: bool,
    /// The outstanding ReadBinary used the ODO form, so the answer arrives
    /// wrapped in a discretionary data object.
    pub ddo_read: bool,
    pub rw_offset: u32,
    pub rw_length: u32,
    pub update_data: Vec<u8>,
    pub update_pos: usize,
    pub card_type: CardType,
    pub card_size: u16,
}

impl T4tSession {
    pub fn new() -> Self {
        Self {
            state: T4tState::Idle,
            version: T4T_MY_VERSION,
            cc: None,
            partial_cc: None,
            ndef_detected: false,
            read_only: false,
            ndef_length: 0,
            // updated during NDEF detection
            max_read_size: T4T_MAX_LENGTH_LE,
            max_update_size: T4T_MAX_LENGTH_LC,
            ext_field_coding: false,
            ddo_read: false,
            rw_offset: 0,
            rw_length: 0,
            update_data: Vec::new(),
            update_pos: 0,
            card_type: CardType::DesfireEv0,
            card_size: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == T4tState::Idle
    }

    pub fn cc_version(&self) -> u8 {
        self.cc.map(|cc| cc.version).unwrap_or(self.version)
    }

    pub fn nlen_size(&self) -> u8 {
        self.cc
            .map(|cc| cc.ndef.nlen_size)
            .unwrap_or(T4T_FILE_LENGTH_SIZE)
    }

    /// Operation owning the current state, None when idle.
    pub fn current_operation(&self) -> Option<Operation> {
        match self.state {
            T4tState::Idle => None,
            T4tState::DetectNdef(_) => Some(Operation::Detect),
            T4tState::ReadNdef => Some(Operation::Read),
            T4tState::UpdateNdef(_) => Some(Operation::Update),
            T4tState::SetReadOnly(_) => Some(Operation::SetReadOnly),
            T4tState::PresenceCheck => Some(Operation::PresenceCheck),
            T4tState::Format(_) => Some(Operation::Format),
        }
    }

    /// Drop operation state, keeping the negotiated tag parameters.
    pub fn reset_operation(&mut self) {
        self.state = T4tState::Idle;
        self.rw_offset = 0;
        self.rw_length = 0;
        self.update_data = Vec::new();
        self.update_pos = 0;
    }
}

// ---------------------------------------------------------------------------
// Type 5
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum T5tDetectSub {
    WaitCc,
    WaitCcExt,
    SearchTlv,
}

/// Position inside one block of a ranged write. Partial blocks are read,
/// patched and written back; full blocks are written directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockWriteStep {
    ReadBlock,
    WriteBlock,
}

/// Read-only transition: rewrite the CC first, then lock the CC and every
/// block of the data area, one LockBlock per answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum T5tReadOnlySub {
    Cc(BlockWriteStep),
    LockArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum T5tState {
    Idle,
    Detect(T5tDetectSub),
    Read,
    Update(BlockWriteStep),
    SetReadOnly(T5tReadOnlySub),
}

#[derive(Debug)]
pub(crate) struct T5tSession {
    pub state: T5tState,
    pub scanner: TlvScanner,
    /// First 4 CC bytes, kept while the 8-byte CC tail is fetched and for
    /// the read-only rewrite.
    pub cc_head: [u8; 4],
    pub block_size: u16,
    /// Last byte offset of the T5T area (CC included).
    pub area_last_offset: u32,
    pub max_ndef_length: u32,
    pub ndef_length: u32,
    pub ndef_tlv_start_offset: u32,
    /// Absolute offset of the first NDEF message byte.
    pub ndef_value_offset: u32,
    pub ndef_detected: bool,
    pub read_only: bool,
    pub extended_commands: bool,
    pub read_multi_block: bool,
    pub special_frame: bool,
    pub rw_offset: u32,
    /// Bytes left to deliver for reads; the new NDEF message length while
    /// an update is in flight.
    pub rw_length: u32,
    /// Byte ranges a write operation still has to commit, in order. Each
    /// range is an absolute start offset plus its content.
    pub ranges: Vec<(u32, Vec<u8>)>,
    pub range_idx: usize,
    pub range_pos: usize,
    /// Block the lock sweep of the read-only transition is waiting on.
    pub lock_block: u16,
}

impl T5tSession {
    pub fn new() -> Self {
        Self {
            state: T5tState::Idle,
            scanner: TlvScanner::new(),
            cc_head: [0; 4],
            block_size: 0,
            area_last_offset: 0,
            max_ndef_length: 0,
            ndef_length: 0,
            ndef_tlv_start_offset: 0,
            ndef_value_offset: 0,
            ndef_detected: false,
            read_only: false,
            extended_commands: false,
            read_multi_block: false,
            special_frame: false,
            rw_offset: 0,
            rw_length: 0,
            ranges: Vec::new(),
            range_idx: 0,
            range_pos: 0,
            lock_block: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == T5tState::Idle
    }

    pub fn current_operation(&self) -> Option<Operation> {
        match self.state {
            T5tState::Idle => None,
            T5tState::Detect(_) => Some(Operation::Detect),
            T5tState::Read => Some(Operation::Read),
            T5tState::Update(_) => Some(Operation::Update),
            T5tState::SetReadOnly(_) => Some(Operation::SetReadOnly),
        }
    }

    pub fn reset_operation(&mut self) {
        self.state = T5tState::Idle;
        self.rw_offset = 0;
        self.rw_length = 0;
        self.ranges = Vec::new();
        self.range_idx = 0;
        self.range_pos = 0;
        self.lock_block = 0;
    }

    /// Block holding the given byte offset.
    pub fn block_of(&self, offset: u32) -> u16 {
        debug_assert!(self.block_size > 0);
        (offset / self.block_size as u32) as u16
    }
}
