// ndeftag/src/constants.rs
//! Common protocol constants used across the crate.

// ---------------------------------------------------------------------------
// Type 4 Tag (ISO 7816-4 over ISO-DEP)
// ---------------------------------------------------------------------------

/// Plain APDU class byte
pub const T4T_CMD_CLASS: u8 = 0x00;
/// DESFire wrapped-native class byte
pub const T4T_CMD_DES_CLASS: u8 = 0x90;

/// SELECT instruction
pub const T4T_CMD_INS_SELECT: u8 = 0xA4;
/// ReadBinary instruction (2-byte offset in P1 P2)
pub const T4T_CMD_INS_READ_BINARY: u8 = 0xB0;
/// ReadBinary instruction with offset data object in the data field
pub const T4T_CMD_INS_READ_BINARY_ODO: u8 = 0xB1;
/// UpdateBinary instruction (2-byte offset in P1 P2)
pub const T4T_CMD_INS_UPDATE_BINARY: u8 = 0xD6;
/// UpdateBinary instruction with offset data object in the data field
pub const T4T_CMD_INS_UPDATE_BINARY_ODO: u8 = 0xD7;

/// SELECT P1: select by DF name
pub const T4T_CMD_P1_SELECT_BY_NAME: u8 = 0x04;
/// SELECT P1: select by file identifier
pub const T4T_CMD_P1_SELECT_BY_FILE_ID: u8 = 0x00;
/// SELECT P2 used by mapping version 1.0
pub const T4T_CMD_P2_FIRST_OR_ONLY_00H: u8 = 0x00;
/// SELECT P2 used by mapping versions 2.0 and 3.0
pub const T4T_CMD_P2_FIRST_OR_ONLY_0CH: u8 = 0x0C;

/// NDEF application name for mapping version 1.0
pub const T4T_V10_NDEF_APP_NAME: [u8; 7] = [0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x00];
/// NDEF application name for mapping versions 2.0 and 3.0
pub const T4T_V20_NDEF_APP_NAME: [u8; 7] = [0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01];

/// Mapping version 1.0
pub const T4T_VERSION_1_0: u8 = 0x10;
/// Mapping version 2.0
pub const T4T_VERSION_2_0: u8 = 0x20;
/// Mapping version 3.0
pub const T4T_VERSION_3_0: u8 = 0x30;
/// Highest mapping version this engine speaks
pub const T4T_MY_VERSION: u8 = T4T_VERSION_3_0;

/// Minimum valid capability container length
pub const T4T_CC_FILE_MIN_LEN: usize = 0x0F;
/// Offset of the first file-control TLV inside the CC file
pub const T4T_FC_TLV_OFFSET_IN_CC: u16 = 0x07;
/// Offset of the write-access byte inside a file-control TLV
pub const T4T_FC_WRITE_ACCESS_OFFSET_IN_TLV: u16 = 0x07;

/// NDEF file-control TLV type
pub const T4T_NDEF_FILE_CONTROL_TYPE: u8 = 0x04;
/// NDEF file-control TLV length
pub const T4T_FILE_CONTROL_LENGTH: u8 = 0x06;
/// Extended NDEF file-control TLV type (mapping version 3.0)
pub const T4T_ENDEF_FILE_CONTROL_TYPE: u8 = 0x05;
/// Extended NDEF file-control TLV length (4-byte maximum file size)
pub const T4T_ENDEF_FILE_CONTROL_LENGTH: u8 = 0x08;
/// Offset of the extended file-control TLV value field inside the CC file
pub const T4T_ENDEF_FC_V_FIELD_OFFSET: u16 = 0x09;

/// NLEN field size (mapping versions 1.0 and 2.0)
pub const T4T_FILE_LENGTH_SIZE: u8 = 0x02;
/// ENLEN field size (mapping version 3.0)
pub const T4T_EFILE_LENGTH_SIZE: u8 = 0x04;

/// Read access granted without security
pub const T4T_FC_READ_ACCESS: u8 = 0x00;
/// Write access granted without security
pub const T4T_FC_WRITE_ACCESS: u8 = 0x00;
/// No write access (read-only file)
pub const T4T_FC_NO_WRITE_ACCESS: u8 = 0xFF;
/// No read access
pub const T4T_FC_NO_READ_ACCESS: u8 = 0xFF;
/// First proprietary access-condition value
pub const T4T_FC_PROP_ACCESS_START: u8 = 0x80;

/// Minimum acceptable MLe announced by the CC
pub const T4T_MIN_MLE: u16 = 0x000F;
/// Minimum acceptable MLc in DTA mode
pub const T4T_DTA_MIN_MLC: u16 = 0x000D;

/// Largest length expressible in a short Le/Lc field
pub const T4T_MAX_LENGTH_LE: u32 = 0xFF;
/// Largest length expressible in a short Lc field
pub const T4T_MAX_LENGTH_LC: u32 = 0xFF;
/// Last file offset addressable through P1 P2
pub const T4T_MAX_P1P2_OFFSET: u32 = 0x7FFF;

/// Engine ceiling for a single ReadBinary, regardless of MLe
pub const RW_MAX_DATA_PER_READ: u32 = 0xFFF0;
/// Engine ceiling for a single UpdateBinary, regardless of MLc
pub const RW_MAX_DATA_PER_WRITE: u32 = 0xFFF0;

/// Minimum combined ODO plus DDO header in an UpdateBinary data field
pub const T4T_ODO_DDO_HEADER_MIN_LENGTH: u32 = 0x06;
/// BER tag of the discretionary data object wrapping read payloads
pub const T4T_DDO_TAG: u8 = 0x53;

// ---------------------------------------------------------------------------
// DESFire provisioning (wrapped native commands)
// ---------------------------------------------------------------------------

/// GetVersion, first frame
pub const T4T_CMD_DES_GET_HW_VERSION: u8 = 0x60;
/// Additional-frame instruction and trailer marker
pub const T4T_ADDI_FRAME: u8 = 0xAF;
/// CreateApplication
pub const T4T_CMD_CREATE_AID: u8 = 0xCA;
/// SelectApplication
pub const T4T_CMD_SELECT_APP: u8 = 0x5A;
/// CreateStdDataFile
pub const T4T_CMD_CREATE_DATAFILE: u8 = 0xCD;
/// WriteData
pub const T4T_CMD_DES_WRITE: u8 = 0x3D;

/// DESFire EV0 NDEF application identifier
pub const T4T_DES_EV0_NFC_APP_ID: u32 = 0x0010E1;
/// DESFire EV1 NDEF application identifier
pub const T4T_DES_EV1_NFC_APP_ID: u32 = 0x010000;

/// GetVersion first-frame answer length (7 data bytes plus status)
pub const T4T_DES_GET_VERSION_LEN: usize = 9;
/// EV0 hardware major version
pub const T4T_DESEV0_MAJOR_VERSION: u8 = 0x00;
/// EV0 hardware minor version
pub const T4T_DESEV0_MINOR_VERSION: u8 = 0x2B;
/// EV1 hardware major version lower bound
pub const T4T_DESEV1_MAJOR_VERSION: u8 = 0x01;
/// NDEF file size used on EV0 cards
pub const T4T_DES_EV0_CARD_SIZE: u16 = 0x0EDE;
/// GetVersion storage-size identifier: 2 kB
pub const T4T_SIZE_IDENTIFIER_2K: u8 = 0x16;
/// GetVersion storage-size identifier: 4 kB
pub const T4T_SIZE_IDENTIFIER_4K: u8 = 0x18;
/// GetVersion storage-size identifier: 8 kB
pub const T4T_SIZE_IDENTIFIER_8K: u8 = 0x1A;
/// NDEF file size used on EV1 2 kB cards
pub const T4T_DES_EV1_2K_CARD_SIZE: u16 = 2048;
/// NDEF file size used on EV1 4 kB cards
pub const T4T_DES_EV1_4K_CARD_SIZE: u16 = 4096;
/// NDEF file size used on EV1 8 kB cards
pub const T4T_DES_EV1_8K_CARD_SIZE: u16 = 7680;

// ---------------------------------------------------------------------------
// Type 5 Tag (ISO 15693)
// ---------------------------------------------------------------------------

/// ReadSingleBlock
pub const I93_CMD_READ_SINGLE_BLOCK: u8 = 0x20;
/// WriteSingleBlock
pub const I93_CMD_WRITE_SINGLE_BLOCK: u8 = 0x21;
/// LockBlock
pub const I93_CMD_LOCK_BLOCK: u8 = 0x22;
/// Extended ReadSingleBlock (16-bit block numbers)
pub const I93_CMD_EXT_READ_SINGLE_BLOCK: u8 = 0x30;
/// Extended WriteSingleBlock (16-bit block numbers)
pub const I93_CMD_EXT_WRITE_SINGLE_BLOCK: u8 = 0x31;
/// Extended LockBlock (16-bit block numbers)
pub const I93_CMD_EXT_LOCK_BLOCK: u8 = 0x32;

/// Request flag: high data rate
pub const I93_FLAG_DATA_RATE_HIGH: u8 = 0x02;
/// Request flag: option (special frame writes)
pub const I93_FLAG_OPTION: u8 = 0x40;
/// Response flag: error detected
pub const I93_FLAG_ERROR_DETECTED: u8 = 0x01;

/// CC magic number, 1-byte addressing
pub const I93_ICODE_CC_MAGIC_NUMBER: u8 = 0xE1;
/// CC magic number, tag mandates extended (16-bit) commands
pub const I93_ICODE_CC_MAGIC_NUMBER_E2: u8 = 0xE2;
/// CC byte 1 major version mask
pub const I93_VERSION_MAJOR_MASK: u8 = 0xC0;
/// CC byte 1 major version 1.x
pub const I93_VERSION_1_X: u8 = 0x40;
/// CC byte 1 read-access mask (0b00 grants access)
pub const I93_ICODE_CC_READ_ACCESS_MASK: u8 = 0x0C;
/// CC byte 1 write-access mask (0b00 grants access)
pub const I93_ICODE_CC_WRITE_ACCESS_MASK: u8 = 0x03;
/// CC byte 1 value marking the tag read-only
pub const I93_ICODE_CC_READ_ONLY: u8 = 0x03;
/// CC byte 3: tag supports ReadMultipleBlock
pub const I93_ICODE_CC_MBREAD_MASK: u8 = 0x01;
/// CC byte 3: writes need the option flag (special frame)
pub const I93_ICODE_CC_IPREAD_MASK: u8 = 0x10;

/// NULL TLV
pub const T5T_TLV_TYPE_NULL: u8 = 0x00;
/// NDEF message TLV
pub const T5T_TLV_TYPE_NDEF: u8 = 0x03;
/// Terminator TLV
pub const T5T_TLV_TYPE_TERM: u8 = 0xFE;
/// First length byte announcing a 3-byte length field
pub const T5T_TLV_LENGTH_3BYTE_MARKER: u8 = 0xFF;

/// Short CC size (MLEN in byte 2)
pub const T5T_CC_SHORT_LEN: u32 = 4;
/// Extended CC size (MLEN in bytes 6 and 7)
pub const T5T_CC_EXT_LEN: u32 = 8;
