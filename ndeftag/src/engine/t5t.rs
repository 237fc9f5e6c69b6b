// ndeftag/src/engine/t5t.rs

//! Type 5 Tag state machines over ISO 15693 block commands.
//!
//! Detection reads block 0, validates the capability container and then
//! walks the data area with the resumable TLV scanner until the NDEF TLV
//! header is decoded. Writes go through a shared ranged-write loop that
//! reads, patches and rewrites partial blocks, so the length field, the
//! message body and the terminator all use the same machinery.

use crate::constants::*;
use crate::engine::events::{Operation, RwEvent};
use crate::engine::session::{
    BlockWriteStep, T5tDetectSub, T5tReadOnlySub, T5tSession, T5tState,
};
use crate::engine::Ctx;
use crate::protocol::commands::t5t::{lock_block, read_single_block, write_single_block};
use crate::protocol::responses::t5t::{
    block_size_from_response, extended_area_len, strip_flags, T5tCcHead,
};
use crate::protocol::tlv::ScanOutcome;
use crate::types::NdefFlags;
use crate::utils::diagnostics;
use crate::{Error, Result};

// ---------------------------------------------------------------------------
// Operation entry points
// ---------------------------------------------------------------------------

pub(crate) fn detect(s: &mut T5tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    s.scanner.reset();
    s.ndef_detected = false;
    // Block 0 is always requested with the 1-byte command set; the CC magic
    // tells us whether the tag mandates extended commands from then on.
    ctx.send(read_single_block(0, false))?;
    s.state = T5tState::Detect(T5tDetectSub::WaitCc);
    Ok(())
}

pub(crate) fn read(s: &mut T5tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    if !s.ndef_detected {
        return Err(Error::Protocol("NDEF detection has not completed".to_string()));
    }
    if s.ndef_length == 0 {
        ctx.emit(RwEvent::ReadComplete { data: Vec::new() });
        return Ok(());
    }
    s.rw_offset = s.ndef_value_offset;
    s.rw_length = s.ndef_length;
    ctx.send(read_single_block(s.block_of(s.rw_offset), s.extended_commands))?;
    s.state = T5tState::Read;
    Ok(())
}

pub(crate) fn update(s: &mut T5tSession, ctx: &mut Ctx<'_>, data: Vec<u8>) -> Result<()> {
    if !s.ndef_detected {
        return Err(Error::Protocol("NDEF detection has not completed".to_string()));
    }
    if s.read_only {
        return Err(Error::UnsupportedOperation("tag is read-only".to_string()));
    }

    let new_len = data.len() as u32;
    let len_off = s.ndef_tlv_start_offset + 1;
    let len_bytes: Vec<u8> = if new_len >= T5T_TLV_LENGTH_3BYTE_MARKER as u32 {
        vec![
            T5T_TLV_LENGTH_3BYTE_MARKER,
            (new_len >> 8) as u8,
            new_len as u8,
        ]
    } else {
        vec![new_len as u8]
    };
    let value_off = len_off + len_bytes.len() as u32;
    if new_len > 0 && value_off + new_len - 1 > s.area_last_offset {
        return Err(Error::InvalidLength {
            expected: (s.area_last_offset + 1).saturating_sub(value_off) as usize,
            actual: data.len(),
        });
    }

    // Length goes to zero first so a reader never sees a torn message, then
    // the body (with a terminator when it fits), then the real length.
    let mut ranges = vec![(len_off, vec![0x00])];
    if data.is_empty() {
        if value_off <= s.area_last_offset {
            ranges.push((value_off, vec![T5T_TLV_TYPE_TERM]));
        }
    } else {
        let mut body = data;
        if value_off + new_len <= s.area_last_offset {
            body.push(T5T_TLV_TYPE_TERM);
        }
        ranges.push((value_off, body));
        ranges.push((len_off, len_bytes));
    }

    s.ranges = ranges;
    s.range_idx = 0;
    s.range_pos = 0;
    s.rw_length = new_len;
    s.state = T5tState::Update(BlockWriteStep::WriteBlock);
    continue_ranged_write(s, ctx)
}

pub(crate) fn set_read_only(s: &mut T5tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    if !s.ndef_detected {
        return Err(Error::Protocol("NDEF detection has not completed".to_string()));
    }
    if s.read_only {
        ctx.emit(RwEvent::SetReadOnlyComplete);
        return Ok(());
    }
    let patched = s.cc_head[1] | I93_ICODE_CC_READ_ONLY;
    s.ranges = vec![(1, vec![patched])];
    s.range_idx = 0;
    s.range_pos = 0;
    s.state = T5tState::SetReadOnly(T5tReadOnlySub::Cc(BlockWriteStep::ReadBlock));
    continue_ranged_write(s, ctx)
}

// ---------------------------------------------------------------------------
// Response dispatch
// ---------------------------------------------------------------------------

pub(crate) fn on_response(s: &mut T5tSession, ctx: &mut Ctx<'_>, resp: &[u8]) {
    if s.state == T5tState::Idle {
        ctx.emit(RwEvent::RawFrame {
            data: resp.to_vec(),
        });
        return;
    }

    if resp.is_empty() {
        diagnostics::report_malformed("t5t response", 0);
        fail(
            s,
            ctx,
            Error::InvalidLength {
                expected: 1,
                actual: 0,
            },
        );
        return;
    }

    let step = match s.state {
        T5tState::Detect(sub) => sm_detect(s, ctx, sub, resp),
        T5tState::Read => sm_read(s, ctx, resp),
        T5tState::Update(step) | T5tState::SetReadOnly(T5tReadOnlySub::Cc(step)) => {
            sm_block_write(s, ctx, step, resp)
        }
        T5tState::SetReadOnly(T5tReadOnlySub::LockArea) => sm_lock_area(s, ctx, resp),
        T5tState::Idle => Ok(()),
    };
    if let Err(e) = step {
        fail(s, ctx, e);
    }
}

pub(crate) fn fail(s: &mut T5tSession, ctx: &mut Ctx<'_>, error: Error) {
    let op = s.current_operation();
    s.reset_operation();
    ctx.cancel_timer();
    match op {
        Some(Operation::Detect) => {
            s.ndef_detected = false;
            log::debug!("NDEF detection failed: {error}");
            ctx.emit(RwEvent::Failed {
                operation: Operation::Detect,
                error,
            });
        }
        Some(operation) => {
            log::debug!("{operation:?} failed: {error}");
            ctx.emit(RwEvent::Failed { operation, error });
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

fn sm_detect(s: &mut T5tSession, ctx: &mut Ctx<'_>, sub: T5tDetectSub, resp: &[u8]) -> Result<()> {
    let payload = strip_flags(resp)?;
    match sub {
        T5tDetectSub::WaitCc => {
            s.block_size = block_size_from_response(payload.len())?;
            let head = T5tCcHead::parse(payload)?;
            if !head.magic_valid() {
                return Err(Error::BadCapabilityContainer(format!(
                    "bad magic number {:#04x}",
                    head.magic
                )));
            }
            if !head.major_version_supported() {
                return Err(Error::BadCapabilityContainer(format!(
                    "unsupported mapping version (access byte {:#04x})",
                    head.access
                )));
            }
            if !head.read_access_granted() {
                return Err(Error::BadCapabilityContainer(
                    "read access denied".to_string(),
                ));
            }

            s.cc_head.copy_from_slice(&payload[..4]);
            s.extended_commands = head.extended_commands();
            s.read_multi_block = head.supports_read_multi_block();
            s.special_frame = head.needs_special_frame();
            s.read_only = !head.write_access_granted();
            log::debug!(
                "T5T CC: block_size={} ext_cmds={} mbread={} special_frame={}",
                s.block_size,
                s.extended_commands,
                s.read_multi_block,
                s.special_frame
            );

            if head.has_extended_mlen() {
                if s.block_size as u32 >= T5T_CC_EXT_LEN {
                    let area = extended_area_len(payload[6], payload[7]);
                    begin_tlv_search(s, ctx, T5T_CC_EXT_LEN, area, payload)
                } else {
                    // MLEN sits in CC bytes 6 and 7, which is the next block
                    // on a 4-byte-block tag.
                    ctx.send(read_single_block(1, s.extended_commands))?;
                    s.state = T5tState::Detect(T5tDetectSub::WaitCcExt);
                    Ok(())
                }
            } else {
                begin_tlv_search(s, ctx, T5T_CC_SHORT_LEN, head.short_area_len(), payload)
            }
        }
        T5tDetectSub::WaitCcExt => {
            if payload.len() != s.block_size as usize {
                diagnostics::report_malformed("t5t block", payload.len());
                return Err(Error::InvalidLength {
                    expected: s.block_size as usize,
                    actual: payload.len(),
                });
            }
            let area = extended_area_len(payload[2], payload[3]);
            if area == 0 {
                return Err(Error::BadCapabilityContainer("MLEN is zero".to_string()));
            }
            s.area_last_offset = T5T_CC_EXT_LEN + area - 1;
            s.rw_offset = T5T_CC_EXT_LEN;
            ctx.send(read_single_block(s.block_of(s.rw_offset), s.extended_commands))?;
            s.state = T5tState::Detect(T5tDetectSub::SearchTlv);
            Ok(())
        }
        T5tDetectSub::SearchTlv => {
            if payload.len() != s.block_size as usize {
                diagnostics::report_malformed("t5t block", payload.len());
                return Err(Error::InvalidLength {
                    expected: s.block_size as usize,
                    actual: payload.len(),
                });
            }
            match s.scanner.scan(s.rw_offset, payload) {
                ScanOutcome::FoundNdef {
                    start_offset,
                    value_offset,
                    length,
                } => finish_detect(s, ctx, start_offset, value_offset, length),
                ScanOutcome::Terminated => Err(Error::Protocol(
                    "no NDEF TLV in the data area".to_string(),
                )),
                ScanOutcome::NeedMore => {
                    s.rw_offset += payload.len() as u32;
                    if s.rw_offset > s.area_last_offset {
                        return Err(Error::Protocol(
                            "no NDEF TLV in the data area".to_string(),
                        ));
                    }
                    ctx.send(read_single_block(s.block_of(s.rw_offset), s.extended_commands))
                }
            }
        }
    }
}

/// Start the TLV walk right after the CC, scanning whatever of block 0 is
/// left before moving on to the next blocks.
fn begin_tlv_search(
    s: &mut T5tSession,
    ctx: &mut Ctx<'_>,
    cc_len: u32,
    area_len: u32,
    block0: &[u8],
) -> Result<()> {
    if area_len == 0 {
        return Err(Error::BadCapabilityContainer("MLEN is zero".to_string()));
    }
    s.area_last_offset = cc_len + area_len - 1;

    if (cc_len as usize) < block0.len() {
        match s.scanner.scan(cc_len, &block0[cc_len as usize..]) {
            ScanOutcome::FoundNdef {
                start_offset,
                value_offset,
                length,
            } => return finish_detect(s, ctx, start_offset, value_offset, length),
            ScanOutcome::Terminated => {
                return Err(Error::Protocol("no NDEF TLV in the data area".to_string()));
            }
            ScanOutcome::NeedMore => {}
        }
    }

    s.rw_offset = block0.len() as u32;
    if s.rw_offset > s.area_last_offset {
        return Err(Error::Protocol("no NDEF TLV in the data area".to_string()));
    }
    ctx.send(read_single_block(s.block_of(s.rw_offset), s.extended_commands))?;
    s.state = T5tState::Detect(T5tDetectSub::SearchTlv);
    Ok(())
}

fn finish_detect(
    s: &mut T5tSession,
    ctx: &mut Ctx<'_>,
    start_offset: u32,
    value_offset: u32,
    length: u32,
) -> Result<()> {
    if value_offset + length > s.area_last_offset + 1 {
        return Err(Error::Protocol(format!(
            "NDEF TLV (length {length}) overflows the data area"
        )));
    }

    s.ndef_tlv_start_offset = start_offset;
    s.ndef_value_offset = value_offset;
    s.ndef_length = length;
    s.max_ndef_length = s.area_last_offset + 1 - value_offset;
    s.ndef_detected = true;

    let mut flags = NdefFlags::SUPPORTED | NdefFlags::FORMATTED;
    if s.read_only {
        flags |= NdefFlags::READ_ONLY;
    }
    let (cur_size, max_size) = (length, s.max_ndef_length);
    s.reset_operation();
    ctx.emit(RwEvent::NdefDetected {
        cur_size,
        max_size,
        flags,
    });
    Ok(())
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

fn sm_read(s: &mut T5tSession, ctx: &mut Ctx<'_>, resp: &[u8]) -> Result<()> {
    let payload = strip_flags(resp)?;
    if payload.len() != s.block_size as usize {
        diagnostics::report_malformed("t5t block", payload.len());
        return Err(Error::InvalidLength {
            expected: s.block_size as usize,
            actual: payload.len(),
        });
    }

    let skip = (s.rw_offset % s.block_size as u32) as usize;
    let n = (payload.len() - skip).min(s.rw_length as usize);
    let data = payload[skip..skip + n].to_vec();
    s.rw_offset += n as u32;
    s.rw_length -= n as u32;

    if s.rw_length == 0 {
        s.reset_operation();
        ctx.emit(RwEvent::ReadComplete { data });
        Ok(())
    } else {
        ctx.emit(RwEvent::ReadSegment { data });
        ctx.send(read_single_block(s.block_of(s.rw_offset), s.extended_commands))
    }
}

// ---------------------------------------------------------------------------
// Ranged writes (update and the read-only transition)
// ---------------------------------------------------------------------------

/// Cursor of the ranged write: absolute offset of the next byte to commit
/// and how many bytes of the current range fit in its block.
fn write_cursor(s: &T5tSession) -> Result<(u32, usize)> {
    let (start, content) = s
        .ranges
        .get(s.range_idx)
        .ok_or_else(|| Error::Protocol("write plan exhausted".to_string()))?;
    let cursor = start + s.range_pos as u32;
    let in_block = (cursor % s.block_size as u32) as usize;
    let n = (s.block_size as usize - in_block).min(content.len() - s.range_pos);
    Ok((cursor, n))
}

fn set_write_step(s: &mut T5tSession, step: BlockWriteStep) {
    s.state = match s.state {
        T5tState::SetReadOnly(_) => T5tState::SetReadOnly(T5tReadOnlySub::Cc(step)),
        _ => T5tState::Update(step),
    };
}

fn continue_ranged_write(s: &mut T5tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    loop {
        if s.range_idx >= s.ranges.len() {
            return finish_write(s, ctx);
        }
        if s.range_pos >= s.ranges[s.range_idx].1.len() {
            s.range_idx += 1;
            s.range_pos = 0;
            continue;
        }

        let (cursor, n) = write_cursor(s)?;
        let block = s.block_of(cursor);
        let in_block = (cursor % s.block_size as u32) as usize;
        if in_block == 0 && n == s.block_size as usize {
            let content = &s.ranges[s.range_idx].1;
            let frame = write_single_block(
                block,
                &content[s.range_pos..s.range_pos + n],
                s.extended_commands,
                s.special_frame,
            );
            ctx.send(frame)?;
            set_write_step(s, BlockWriteStep::WriteBlock);
        } else {
            // Partial block: fetch it first, patch, write back.
            ctx.send(read_single_block(block, s.extended_commands))?;
            set_write_step(s, BlockWriteStep::ReadBlock);
        }
        return Ok(());
    }
}

fn sm_block_write(
    s: &mut T5tSession,
    ctx: &mut Ctx<'_>,
    step: BlockWriteStep,
    resp: &[u8],
) -> Result<()> {
    let payload = strip_flags(resp)?;
    match step {
        BlockWriteStep::ReadBlock => {
            if payload.len() != s.block_size as usize {
                diagnostics::report_malformed("t5t block", payload.len());
                return Err(Error::InvalidLength {
                    expected: s.block_size as usize,
                    actual: payload.len(),
                });
            }
            let (cursor, n) = write_cursor(s)?;
            let block = s.block_of(cursor);
            let in_block = (cursor % s.block_size as u32) as usize;

            let mut image = payload.to_vec();
            let content = &s.ranges[s.range_idx].1;
            image[in_block..in_block + n]
                .copy_from_slice(&content[s.range_pos..s.range_pos + n]);
            let frame = write_single_block(block, &image, s.extended_commands, s.special_frame);
            ctx.send(frame)?;
            set_write_step(s, BlockWriteStep::WriteBlock);
            Ok(())
        }
        BlockWriteStep::WriteBlock => {
            let (_, n) = write_cursor(s)?;
            s.range_pos += n;
            continue_ranged_write(s, ctx)
        }
    }
}

fn sm_lock_area(s: &mut T5tSession, ctx: &mut Ctx<'_>, resp: &[u8]) -> Result<()> {
    strip_flags(resp)?;
    if s.lock_block < s.block_of(s.area_last_offset) {
        s.lock_block += 1;
        ctx.send(lock_block(s.lock_block, s.extended_commands, s.special_frame))
    } else {
        s.read_only = true;
        s.reset_operation();
        ctx.emit(RwEvent::SetReadOnlyComplete);
        Ok(())
    }
}

fn finish_write(s: &mut T5tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    match s.state {
        T5tState::SetReadOnly(_) => {
            // The CC rewrite is committed; lock the CC block and every block
            // of the data area, one LockBlock per answer.
            s.cc_head[1] |= I93_ICODE_CC_READ_ONLY;
            s.lock_block = 0;
            ctx.send(lock_block(0, s.extended_commands, s.special_frame))?;
            s.state = T5tState::SetReadOnly(T5tReadOnlySub::LockArea);
        }
        _ => {
            s.ndef_length = s.rw_length;
            s.ndef_value_offset = s.ndef_tlv_start_offset
                + 1
                + if s.ndef_length >= T5T_TLV_LENGTH_3BYTE_MARKER as u32 {
                    3
                } else {
                    1
                };
            s.reset_operation();
            ctx.emit(RwEvent::UpdateComplete);
        }
    }
    Ok(())
}
