// ndeftag/src/protocol/commands/t5t.rs

//! ISO 15693 block commands. Frames are non-addressed: a request flags
//! byte, the command code, the block number (one byte, or a little-endian
//! u16 for the extended command set), then any block data.

use crate::constants::*;

fn push_block_number(frame: &mut Vec<u8>, block: u16, extended: bool) {
    if extended {
        frame.extend_from_slice(&block.to_le_bytes());
    } else {
        frame.push(block as u8);
    }
}

/// ReadSingleBlock / ExtendedReadSingleBlock.
pub fn read_single_block(block: u16, extended: bool) -> Vec<u8> {
    let cmd = if extended {
        I93_CMD_EXT_READ_SINGLE_BLOCK
    } else {
        I93_CMD_READ_SINGLE_BLOCK
    };
    let mut frame = vec![I93_FLAG_DATA_RATE_HIGH, cmd];
    push_block_number(&mut frame, block, extended);
    frame
}

/// WriteSingleBlock / ExtendedWriteSingleBlock. `special_frame` raises the
/// option flag for tags whose CC requests it.
pub fn write_single_block(block: u16, data: &[u8], extended: bool, special_frame: bool) -> Vec<u8> {
    let cmd = if extended {
        I93_CMD_EXT_WRITE_SINGLE_BLOCK
    } else {
        I93_CMD_WRITE_SINGLE_BLOCK
    };
    let mut flags = I93_FLAG_DATA_RATE_HIGH;
    if special_frame {
        flags |= I93_FLAG_OPTION;
    }
    let mut frame = vec![flags, cmd];
    push_block_number(&mut frame, block, extended);
    frame.extend_from_slice(data);
    frame
}

/// LockBlock / ExtendedLockBlock.
pub fn lock_block(block: u16, extended: bool, special_frame: bool) -> Vec<u8> {
    let cmd = if extended {
        I93_CMD_EXT_LOCK_BLOCK
    } else {
        I93_CMD_LOCK_BLOCK
    };
    let mut flags = I93_FLAG_DATA_RATE_HIGH;
    if special_frame {
        flags |= I93_FLAG_OPTION;
    }
    let mut frame = vec![flags, cmd];
    push_block_number(&mut frame, block, extended);
    frame
}
