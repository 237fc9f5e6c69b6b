// ndeftag/src/protocol/commands/select.rs

use crate::constants::*;
use crate::protocol::apdu::{CommandBuilder, FieldCoding};
use crate::types::FileId;
use crate::Result;

/// NDEF Tag Application Select.
///
/// ```text
///       CLA INS P1 P2 Lc Data(AID)      Le
/// V1.0: 00  A4  04 00 07 D2760000850100 -
/// V2.0: 00  A4  04 00 07 D2760000850101 00
/// V3.0: 00  A4  04 00 07 D2760000850101 00
/// ```
pub fn select_application(version: u8) -> Result<Vec<u8>> {
    let mut b = CommandBuilder::new(
        T4T_CMD_CLASS,
        T4T_CMD_INS_SELECT,
        T4T_CMD_P1_SELECT_BY_NAME,
        T4T_CMD_P2_FIRST_OR_ONLY_00H,
    );
    b.begin_data(FieldCoding::Short);
    if version == T4T_VERSION_1_0 {
        b.bytes(&T4T_V10_NDEF_APP_NAME);
        b.end_data()?;
    } else {
        b.bytes(&T4T_V20_NDEF_APP_NAME);
        b.end_data()?;
        b.le_short(0);
    }
    b.build()
}

/// Select an elementary file by its 2-byte identifier. Mapping version 1.0
/// uses P2 = 00h, later versions 0Ch.
pub fn select_file(version: u8, file_id: FileId) -> Result<Vec<u8>> {
    let p2 = if version == T4T_VERSION_2_0 || version == T4T_VERSION_3_0 {
        T4T_CMD_P2_FIRST_OR_ONLY_0CH
    } else {
        T4T_CMD_P2_FIRST_OR_ONLY_00H
    };
    let mut b = CommandBuilder::new(T4T_CMD_CLASS, T4T_CMD_INS_SELECT, T4T_CMD_P1_SELECT_BY_FILE_ID, p2);
    b.begin_data(FieldCoding::Short);
    b.bytes(&file_id.to_be_bytes());
    b.end_data()?;
    b.build()
}
