// ndeftag/src/protocol/responses/status.rs

use crate::types::StatusWord;
use crate::{Error, Result};

/// Extract the SW1 SW2 trailer from a T4T response.
pub fn status_word(resp: &[u8]) -> Result<StatusWord> {
    if resp.len() < 2 {
        return Err(Error::InvalidLength {
            expected: 2,
            actual: resp.len(),
        });
    }
    Ok(StatusWord::from_bytes(resp[resp.len() - 2], resp[resp.len() - 1]))
}

/// Split a response into payload and status word.
pub fn split_status(resp: &[u8]) -> Result<(&[u8], StatusWord)> {
    let sw = status_word(resp)?;
    Ok((&resp[..resp.len() - 2], sw))
}

/// Check a DESFire wrapped response for its native success status. The
/// duplicate status is tolerated when `accept_duplicate` is set: the entity
/// being created already exists, which is as good as created.
pub fn desfire_status(resp: &[u8], accept_duplicate: bool) -> Result<&[u8]> {
    let (payload, sw) = split_status(resp)?;
    if sw == StatusWord::DES_COMPLETED || (accept_duplicate && sw == StatusWord::DES_DUPLICATE) {
        Ok(payload)
    } else {
        Err(Error::Status {
            sw1: sw.sw1(),
            sw2: sw.sw2(),
        })
    }
}
