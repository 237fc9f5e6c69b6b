// ndeftag/src/types.rs

use crate::Error;
use std::convert::TryFrom;

/// ISO 7816-4 elementary file identifier (2 bytes, big-endian on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(u16);

impl FileId {
    /// Capability container file of an NDEF application.
    pub const CAPABILITY_CONTAINER: Self = Self(0xE103);

    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl TryFrom<&[u8]> for FileId {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != 2 {
            return Err(Error::InvalidLength {
                expected: 2,
                actual: bytes.len(),
            });
        }
        Ok(Self(u16::from_be_bytes([bytes[0], bytes[1]])))
    }
}

/// Status word trailer of a T4T response (SW1 SW2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord(u16);

impl StatusWord {
    /// Command completed (ISO 7816-4).
    pub const COMPLETED: Self = Self(0x9000);
    /// Command completed (DESFire native wrapping).
    pub const DES_COMPLETED: Self = Self(0x9100);
    /// DESFire duplicate-entity status, returned when the object being
    /// created already exists on the card.
    pub const DES_DUPLICATE: Self = Self(0x91DE);

    pub const fn new(word: u16) -> Self {
        Self(word)
    }

    pub fn from_bytes(sw1: u8, sw2: u8) -> Self {
        Self(u16::from_be_bytes([sw1, sw2]))
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn sw1(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn sw2(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Warning status (SW1 0x62 or 0x63). Some NXP tags answer updates
    /// with a warning while still having committed the write.
    pub fn is_warning(&self) -> bool {
        matches!(self.sw1(), 0x62 | 0x63)
    }
}

/// Tag technology the session was activated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Technology {
    /// ISO-DEP (ISO 14443-4) tag carrying an NDEF application.
    Type4,
    /// ISO 15693 vicinity tag with an NDEF memory area.
    Type5,
}

/// DESFire generation, decided from the GetVersion answer during format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    DesfireEv0,
    DesfireEv1,
}

/// Probe flavor used by the presence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceCheckOption {
    /// Send an empty I-block and wait for any answer.
    EmptyIBlock,
    /// Ask the transport to run an ISO-DEP NAK exchange.
    IsoDepNak,
}

/// NDEF status flags reported by a completed detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NdefFlags(u8);

impl NdefFlags {
    /// Tag speaks an NDEF mapping this engine understands.
    pub const SUPPORTED: Self = Self(0x01);
    /// Tag currently holds a formatted NDEF area.
    pub const FORMATTED: Self = Self(0x02);
    /// Tag could be formatted for NDEF.
    pub const FORMATABLE: Self = Self(0x04);
    /// NDEF area is read-only.
    pub const READ_ONLY: Self = Self(0x08);
    /// Tag can be permanently locked.
    pub const HARD_LOCKABLE: Self = Self(0x10);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for NdefFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for NdefFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
