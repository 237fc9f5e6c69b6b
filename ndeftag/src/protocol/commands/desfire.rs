// ndeftag/src/protocol/commands/desfire.rs

//! DESFire native commands wrapped in ISO 7816-4 APDUs (class 0x90), used to
//! provision an empty card with the NDEF application during format.

use crate::constants::*;
use crate::types::CardType;

fn be24(v: u32) -> [u8; 3] {
    [(v >> 16) as u8, (v >> 8) as u8, v as u8]
}

/// GetVersion, first frame: `90 60 00 00 00`.
pub fn get_hw_version() -> Vec<u8> {
    vec![T4T_CMD_DES_CLASS, T4T_CMD_DES_GET_HW_VERSION, 0x00, 0x00, 0x00]
}

/// GetVersion continuation frame: `90 AF 00 00 00`. Sent twice, first for
/// the software version block and then for the UID block.
pub fn additional_frame() -> Vec<u8> {
    vec![T4T_CMD_DES_CLASS, T4T_ADDI_FRAME, 0x00, 0x00, 0x00]
}

/// CreateApplication for the NDEF AID.
pub fn create_application(card_type: CardType) -> Vec<u8> {
    let mut apdu = vec![T4T_CMD_DES_CLASS, T4T_CMD_CREATE_AID, 0x00, 0x00];
    match card_type {
        CardType::DesfireEv1 => {
            let df_name = T4T_V20_NDEF_APP_NAME;
            apdu.push(0x0E); // Lc
            apdu.extend_from_slice(&be24(T4T_DES_EV1_NFC_APP_ID));
            apdu.extend_from_slice(&[0x0F, 0x21]); // key settings, key count
            apdu.extend_from_slice(&[0x05, 0xE1]); // ISO file id
            apdu.extend_from_slice(&df_name);
            apdu.push(0x00); // Le
        }
        CardType::DesfireEv0 => {
            apdu.push(0x05); // Lc
            apdu.extend_from_slice(&be24(T4T_DES_EV0_NFC_APP_ID));
            apdu.extend_from_slice(&[0x0F, 0x01]); // key settings, key count
            apdu.push(0x00); // Le
        }
    }
    apdu
}

/// SelectApplication by AID.
pub fn select_application(card_type: CardType) -> Vec<u8> {
    let aid = match card_type {
        CardType::DesfireEv1 => T4T_DES_EV1_NFC_APP_ID,
        CardType::DesfireEv0 => T4T_DES_EV0_NFC_APP_ID,
    };
    let mut apdu = vec![T4T_CMD_DES_CLASS, T4T_CMD_SELECT_APP, 0x00, 0x00, 0x03];
    apdu.extend_from_slice(&be24(aid));
    apdu.push(0x00); // Le
    apdu
}

fn create_data_file(card_type: CardType, ev1_ids: [u8; 3], ev0_id: u8, size_le24: [u8; 3]) -> Vec<u8> {
    let mut apdu = vec![T4T_CMD_DES_CLASS, T4T_CMD_CREATE_DATAFILE, 0x00, 0x00];
    match card_type {
        CardType::DesfireEv1 => {
            apdu.push(0x09); // Lc
            apdu.extend_from_slice(&ev1_ids);
        }
        CardType::DesfireEv0 => {
            apdu.push(0x07); // Lc
            apdu.push(ev0_id);
        }
    }
    apdu.push(0x00); // COMM settings
    apdu.extend_from_slice(&[0xEE, 0xEE]); // access rights
    apdu.extend_from_slice(&size_le24);
    apdu.push(0x00); // Le
    apdu
}

/// CreateStdDataFile for the 15-byte capability container file.
pub fn create_cc_file(card_type: CardType) -> Vec<u8> {
    create_data_file(card_type, [0x01, 0x03, 0xE1], 0x03, [0x0F, 0x00, 0x00])
}

/// CreateStdDataFile for the NDEF file, sized to the card.
pub fn create_ndef_file(card_type: CardType, card_size: u16) -> Vec<u8> {
    let size = card_size.to_le_bytes();
    create_data_file(
        card_type,
        [0x02, 0x04, 0xE1],
        0x04,
        [size[0], size[1], 0x00],
    )
}

/// WriteData of the capability container content into the CC file.
pub fn write_cc(card_type: CardType, card_size: u16) -> Vec<u8> {
    let mut cc_bytes: [u8; 15] = [
        0x00, 0x0F, 0x10, 0x00, 0x3B, 0x00, 0x34, 0x04, 0x06, 0xE1, 0x04, 0x04, 0x00, 0x00,
        0x00,
    ];
    let file_id = match card_type {
        CardType::DesfireEv1 => {
            cc_bytes[2] = 0x20;
            cc_bytes[11] = (card_size >> 8) as u8;
            cc_bytes[12] = card_size as u8;
            0x01
        }
        CardType::DesfireEv0 => 0x03,
    };
    let mut apdu = vec![T4T_CMD_DES_CLASS, T4T_CMD_DES_WRITE, 0x00, 0x00, 0x16];
    apdu.push(file_id);
    apdu.extend_from_slice(&[0x00, 0x00, 0x00]); // offset
    apdu.extend_from_slice(&[0x0F, 0x00, 0x00]); // length, DESFire order
    apdu.extend_from_slice(&cc_bytes);
    apdu.push(0x00); // Le
    apdu
}

/// WriteData of a zero NLEN into the NDEF file.
pub fn write_ndef(card_type: CardType) -> Vec<u8> {
    let file_id = match card_type {
        CardType::DesfireEv1 => 0x02,
        CardType::DesfireEv0 => 0x04,
    };
    let mut apdu = vec![T4T_CMD_DES_CLASS, T4T_CMD_DES_WRITE, 0x00, 0x00, 0x09];
    apdu.push(file_id);
    apdu.extend_from_slice(&[0x00, 0x00, 0x00]); // offset
    apdu.extend_from_slice(&[0x02, 0x00, 0x00]); // length, DESFire order
    apdu.extend_from_slice(&[0x00, 0x00]); // NLEN = 0
    apdu.push(0x00); // Le
    apdu
}
