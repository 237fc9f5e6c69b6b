// ndeftag/src/engine/t4t.rs

//! Type 4 Tag state machines: NDEF detection, chunked read and update,
//! DESFire formatting, the read-only transition and the presence check.
//!
//! Every handler encodes the next command through `protocol::commands` and
//! hands it to the transport; the answer comes back through `on_response`.
//! Errors bubble up to `fail`, which routes them to the terminal event of
//! the operation in flight.

use crate::constants::*;
use crate::engine::events::{Operation, RwEvent};
use crate::engine::session::{
    DetectSub, FormatSub, PendingCommand, ReadOnlySub, T4tSession, T4tState, UpdateSub,
};
use crate::engine::Ctx;
use crate::protocol::commands::{
    desfire, read_binary, select_application, select_file, update_binary, update_binary_odo,
    update_cc_to_readonly, update_nlen,
};
use crate::protocol::responses::cc::{self, parse_cc, parse_extended_tail, CapabilityContainer, CcParse};
use crate::protocol::responses::{ddo, desfire_status, split_status};
use crate::types::{CardType, FileId, NdefFlags, PresenceCheckOption, StatusWord};
use crate::utils::diagnostics;
use crate::{Error, Result};

fn status_err(sw: StatusWord) -> Error {
    Error::Status {
        sw1: sw.sw1(),
        sw2: sw.sw2(),
    }
}

fn require_ok(sw: StatusWord) -> Result<()> {
    if sw == StatusWord::COMPLETED {
        Ok(())
    } else {
        Err(status_err(sw))
    }
}

/// Updates succeed on a warning status too: some tags in the field report
/// SW1 62h/63h while still committing the write.
fn require_ok_or_warning(sw: StatusWord) -> Result<()> {
    if sw == StatusWord::COMPLETED || sw.is_warning() {
        Ok(())
    } else {
        Err(status_err(sw))
    }
}

// ---------------------------------------------------------------------------
// Operation entry points
// ---------------------------------------------------------------------------

pub(crate) fn detect(s: &mut T4tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    if s.ndef_detected {
        // The NDEF application is still selected from the previous pass.
        let apdu = select_file(s.version, FileId::CAPABILITY_CONTAINER)?;
        ctx.send(apdu)?;
        s.state = T4tState::DetectNdef(DetectSub::SelectCc);
    } else {
        let apdu = select_application(s.version)?;
        ctx.send(apdu)?;
        s.state = T4tState::DetectNdef(DetectSub::SelectApp);
    }
    Ok(())
}

pub(crate) fn read(s: &mut T4tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    if !s.ndef_detected {
        return Err(Error::Protocol("NDEF detection has not completed".to_string()));
    }
    if s.ndef_length == 0 {
        ctx.emit(RwEvent::ReadComplete { data: Vec::new() });
        return Ok(());
    }
    s.rw_offset = s.nlen_size() as u32;
    s.rw_length = s.ndef_length;
    send_read_chunk(s, ctx)?;
    s.state = T4tState::ReadNdef;
    Ok(())
}

pub(crate) fn update(s: &mut T4tSession, ctx: &mut Ctx<'_>, data: Vec<u8>) -> Result<()> {
    if !s.ndef_detected {
        return Err(Error::Protocol("NDEF detection has not completed".to_string()));
    }
    if s.read_only {
        return Err(Error::UnsupportedOperation("tag is read-only".to_string()));
    }
    let cc = s
        .cc
        .ok_or_else(|| Error::Protocol("no capability container".to_string()))?;
    let capacity = cc.ndef.max_file_size - s.nlen_size() as u32;
    if data.len() as u32 > capacity {
        return Err(Error::InvalidLength {
            expected: capacity as usize,
            actual: data.len(),
        });
    }

    // Zero the length first so a tear mid-write never exposes a half
    // message to a reader.
    let apdu = update_nlen(s.nlen_size(), 0)?;
    ctx.send(apdu)?;
    s.rw_offset = s.nlen_size() as u32;
    s.update_pos = 0;
    s.state = if data.is_empty() {
        T4tState::UpdateNdef(UpdateSub::RestoreNlen)
    } else {
        T4tState::UpdateNdef(UpdateSub::ZeroNlen)
    };
    s.update_data = data;
    Ok(())
}

pub(crate) fn format(s: &mut T4tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    ctx.send(desfire::get_hw_version())?;
    s.state = T4tState::Format(FormatSub::HwVersion);
    Ok(())
}

pub(crate) fn set_read_only(s: &mut T4tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    if !s.ndef_detected {
        return Err(Error::Protocol("NDEF detection has not completed".to_string()));
    }
    if s.read_only {
        ctx.emit(RwEvent::SetReadOnlyComplete);
        return Ok(());
    }
    let apdu = select_file(s.version, FileId::CAPABILITY_CONTAINER)?;
    ctx.send(apdu)?;
    s.state = T4tState::SetReadOnly(ReadOnlySub::SelectCc);
    Ok(())
}

pub(crate) fn presence_check(
    s: &mut T4tSession,
    ctx: &mut Ctx<'_>,
    option: PresenceCheckOption,
) -> Result<()> {
    match option {
        PresenceCheckOption::EmptyIBlock => ctx.send(Vec::new())?,
        PresenceCheckOption::IsoDepNak => {
            ctx.transport.isodep_nak()?;
            *ctx.pending = Some(PendingCommand { apdu: Vec::new() });
        }
    }
    s.state = T4tState::PresenceCheck;
    Ok(())
}

// ---------------------------------------------------------------------------
// Response dispatch
// ---------------------------------------------------------------------------

pub(crate) fn on_response(s: &mut T4tSession, ctx: &mut Ctx<'_>, resp: &[u8]) {
    match s.state {
        T4tState::Idle => {
            ctx.emit(RwEvent::RawFrame {
                data: resp.to_vec(),
            });
            return;
        }
        T4tState::PresenceCheck => {
            // Any answer at all proves the tag is still in the field.
            s.reset_operation();
            ctx.emit(RwEvent::PresenceCheck { present: true });
            return;
        }
        _ => {}
    }

    if resp.len() < 2 {
        diagnostics::report_malformed("t4t response", resp.len());
        fail(
            s,
            ctx,
            Error::InvalidLength {
                expected: 2,
                actual: resp.len(),
            },
        );
        return;
    }

    let step = match s.state {
        T4tState::DetectNdef(sub) => sm_detect(s, ctx, sub, resp),
        T4tState::ReadNdef => sm_read(s, ctx, resp),
        T4tState::UpdateNdef(sub) => sm_update(s, ctx, sub, resp),
        T4tState::SetReadOnly(sub) => sm_set_readonly(s, ctx, sub, resp),
        T4tState::Format(sub) => sm_format(s, ctx, sub, resp),
        T4tState::Idle | T4tState::PresenceCheck => Ok(()),
    };
    if let Err(e) = step {
        fail(s, ctx, e);
    }
}

/// Abort the operation in flight and report its terminal event.
pub(crate) fn fail(s: &mut T4tSession, ctx: &mut Ctx<'_>, error: Error) {
    let op = s.current_operation();
    s.reset_operation();
    ctx.cancel_timer();
    match op {
        Some(Operation::PresenceCheck) => ctx.emit(RwEvent::PresenceCheck { present: false }),
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

fn sm_detect(s: &mut T4tSession, ctx: &mut Ctx<'_>, sub: DetectSub, resp: &[u8]) -> Result<()> {
    let (payload, sw) = split_status(resp)?;
    match sub {
        DetectSub::SelectApp => {
            if sw != StatusWord::COMPLETED {
                if s.version != T4T_VERSION_1_0 {
                    // No version 2.0 application on the tag, retry with the
                    // mapping version 1.0 name.
                    log::debug!("application select failed (sw {:#06x}), retrying MV1.0", sw.as_u16());
                    s.version = T4T_VERSION_1_0;
                    let apdu = select_application(s.version)?;
                    return ctx.send(apdu);
                }
                return Err(status_err(sw));
            }
            let apdu = select_file(s.version, FileId::CAPABILITY_CONTAINER)?;
            ctx.send(apdu)?;
            s.state = T4tState::DetectNdef(DetectSub::SelectCc);
            Ok(())
        }
        DetectSub::SelectCc => {
            require_ok(sw)?;
            let enc = read_binary(
                0,
                T4T_CC_FILE_MIN_LEN as u32,
                s.cc_version(),
                s.ext_field_coding,
                s.max_read_size,
            )?;
            ctx.send(enc.apdu)?;
            s.state = T4tState::DetectNdef(DetectSub::ReadCc);
            Ok(())
        }
        DetectSub::ReadCc => {
            require_ok(sw)?;
            if payload.len() < T4T_CC_FILE_MIN_LEN {
                diagnostics::report_malformed("capability container", payload.len());
                return Err(Error::InvalidLength {
                    expected: T4T_CC_FILE_MIN_LEN,
                    actual: payload.len(),
                });
            }
            match parse_cc(payload)? {
                CcParse::Complete(parsed) => accept_cc(s, ctx, parsed),
                CcParse::NeedExtendedTail(partial) => {
                    s.partial_cc = Some(partial);
                    let enc = read_binary(
                        T4T_ENDEF_FC_V_FIELD_OFFSET as u32,
                        T4T_ENDEF_FILE_CONTROL_LENGTH as u32,
                        s.cc_version(),
                        s.ext_field_coding,
                        s.max_read_size,
                    )?;
                    ctx.send(enc.apdu)?;
                    s.state = T4tState::DetectNdef(DetectSub::ReadEndefTail);
                    Ok(())
                }
            }
        }
        DetectSub::ReadEndefTail => {
            require_ok(sw)?;
            let partial = s
                .partial_cc
                .take()
                .ok_or_else(|| Error::Protocol("no pending capability container".to_string()))?;
            if payload.len() != T4T_ENDEF_FILE_CONTROL_LENGTH as usize {
                diagnostics::report_malformed("extended file-control TLV", payload.len());
                return Err(Error::InvalidLength {
                    expected: T4T_ENDEF_FILE_CONTROL_LENGTH as usize,
                    actual: payload.len(),
                });
            }
            let parsed = parse_extended_tail(partial, payload)?;
            accept_cc(s, ctx, parsed)
        }
        DetectSub::SelectNdef => {
            require_ok(sw)?;
            let enc = read_binary(
                0,
                s.nlen_size() as u32,
                s.cc_version(),
                s.ext_field_coding,
                s.max_read_size,
            )?;
            ctx.send(enc.apdu)?;
            s.state = T4tState::DetectNdef(DetectSub::ReadNlen);
            Ok(())
        }
        DetectSub::ReadNlen => {
            require_ok(sw)?;
            let nlen_size = s.nlen_size() as usize;
            if payload.len() != nlen_size {
                diagnostics::report_malformed("NLEN field", payload.len());
                return Err(Error::InvalidLength {
                    expected: nlen_size,
                    actual: payload.len(),
                });
            }
            let nlen = if nlen_size == T4T_FILE_LENGTH_SIZE as usize {
                u16::from_be_bytes([payload[0], payload[1]]) as u32
            } else {
                u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]])
            };
            let cc = s
                .cc
                .ok_or_else(|| Error::Protocol("no capability container".to_string()))?;
            let max_size = cc.ndef.max_file_size - nlen_size as u32;
            if nlen > max_size {
                return Err(Error::Protocol(format!(
                    "NLEN ({nlen}) exceeds the file capacity ({max_size})"
                )));
            }

            s.ndef_length = nlen;
            s.ndef_detected = true;
            s.read_only = cc.ndef.write_access == T4T_FC_NO_WRITE_ACCESS;
            let mut flags = NdefFlags::SUPPORTED | NdefFlags::FORMATTED;
            if cc.ndef.write_access != T4T_FC_WRITE_ACCESS {
                flags |= NdefFlags::READ_ONLY;
            }
            s.reset_operation();
            ctx.emit(RwEvent::NdefDetected {
                cur_size: nlen,
                max_size,
                flags,
            });
            Ok(())
        }
    }
}

fn accept_cc(s: &mut T4tSession, ctx: &mut Ctx<'_>, parsed: CapabilityContainer) -> Result<()> {
    cc::validate(&parsed, s.version, ctx.dta_mode)?;

    s.max_read_size = (parsed.max_le as u32).min(RW_MAX_DATA_PER_READ);
    s.max_update_size = (parsed.max_lc as u32).min(RW_MAX_DATA_PER_WRITE);
    if s.max_read_size > T4T_MAX_LENGTH_LE + 1 || s.max_update_size > T4T_MAX_LENGTH_LC {
        s.ext_field_coding = true;
    }

    let apdu = select_file(s.version, parsed.ndef.file_id)?;
    s.cc = Some(parsed);
    ctx.send(apdu)?;
    s.state = T4tState::DetectNdef(DetectSub::SelectNdef);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

fn send_read_chunk(s: &mut T4tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    let enc = read_binary(
        s.rw_offset,
        s.rw_length,
        s.cc_version(),
        s.ext_field_coding,
        s.max_read_size,
    )?;
    s.ddo_read = enc.ddo_wrapped;
    ctx.send(enc.apdu)
}

fn sm_read(s: &mut T4tSession, ctx: &mut Ctx<'_>, resp: &[u8]) -> Result<()> {
    let (payload, sw) = split_status(resp)?;
    require_ok(sw)?;

    let content: &[u8] = if s.ddo_read {
        ddo::unwrap(payload, s.max_read_size)?
    } else {
        payload
    };
    let n = content.len() as u32;
    if n == 0 || n > s.rw_length {
        return Err(Error::InvalidLength {
            expected: s.rw_length as usize,
            actual: content.len(),
        });
    }

    let data = content.to_vec();
    s.rw_offset += n;
    s.rw_length -= n;
    if s.rw_length == 0 {
        s.reset_operation();
        ctx.emit(RwEvent::ReadComplete { data });
        Ok(())
    } else {
        ctx.emit(RwEvent::ReadSegment { data });
        send_read_chunk(s, ctx)
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

fn send_update_chunk(s: &mut T4tSession, ctx: &mut Ctx<'_>) -> Result<()> {
    let remaining = s.update_data.len() - s.update_pos;
    if remaining == 0 {
        let apdu = update_nlen(s.nlen_size(), s.update_data.len() as u32)?;
        ctx.send(apdu)?;
        s.state = T4tState::UpdateNdef(UpdateSub::RestoreNlen);
        return Ok(());
    }

    if s.rw_offset + remaining as u32 > T4T_MAX_P1P2_OFFSET {
        let chunk = update_binary_odo(
            s.rw_offset,
            &s.update_data[s.update_pos..],
            s.cc_version(),
            s.ext_field_coding,
            s.max_update_size,
        )?;
        let consumed = chunk.consumed;
        ctx.send(chunk.apdu)?;
        s.update_pos += consumed;
        s.rw_offset += consumed as u32;
    } else {
        let n = remaining
            .min(s.max_update_size as usize)
            .min(T4T_MAX_LENGTH_LC as usize);
        let apdu = update_binary(s.rw_offset as u16, &s.update_data[s.update_pos..s.update_pos + n])?;
        ctx.send(apdu)?;
        s.update_pos += n;
        s.rw_offset += n as u32;
    }
    s.state = T4tState::UpdateNdef(UpdateSub::Data);
    Ok(())
}

fn sm_update(s: &mut T4tSession, ctx: &mut Ctx<'_>, sub: UpdateSub, resp: &[u8]) -> Result<()> {
    let (_, sw) = split_status(resp)?;
    require_ok_or_warning(sw)?;
    match sub {
        UpdateSub::ZeroNlen | UpdateSub::Data => send_update_chunk(s, ctx),
        UpdateSub::RestoreNlen => {
            s.ndef_length = s.update_data.len() as u32;
            s.reset_operation();
            ctx.emit(RwEvent::UpdateComplete);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Read-only transition
// ---------------------------------------------------------------------------

fn sm_set_readonly(
    s: &mut T4tSession,
    ctx: &mut Ctx<'_>,
    sub: ReadOnlySub,
    resp: &[u8],
) -> Result<()> {
    let (_, sw) = split_status(resp)?;
    match sub {
        ReadOnlySub::SelectCc => {
            require_ok(sw)?;
            ctx.send(update_cc_to_readonly()?)?;
            s.state = T4tState::SetReadOnly(ReadOnlySub::UpdateCc);
            Ok(())
        }
        ReadOnlySub::UpdateCc => {
            require_ok_or_warning(sw)?;
            let cc = s
                .cc
                .ok_or_else(|| Error::Protocol("no capability container".to_string()))?;
            // Reselect the NDEF file so a later read or update starts from
            // a known selection.
            let apdu = select_file(s.version, cc.ndef.file_id)?;
            ctx.send(apdu)?;
            s.state = T4tState::SetReadOnly(ReadOnlySub::SelectNdef);
            Ok(())
        }
        ReadOnlySub::SelectNdef => {
            require_ok(sw)?;
            s.read_only = true;
            if let Some(cc) = s.cc.as_mut() {
                cc.ndef.write_access = T4T_FC_NO_WRITE_ACCESS;
            }
            s.reset_operation();
            ctx.emit(RwEvent::SetReadOnlyComplete);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// DESFire format
// ---------------------------------------------------------------------------

fn require_additional_frame(sw: StatusWord) -> Result<()> {
    if sw.sw1() == 0x91 && sw.sw2() == T4T_ADDI_FRAME {
        Ok(())
    } else {
        Err(status_err(sw))
    }
}

fn sm_format(s: &mut T4tSession, ctx: &mut Ctx<'_>, sub: FormatSub, resp: &[u8]) -> Result<()> {
    match sub {
        FormatSub::HwVersion => {
            let (payload, sw) = split_status(resp)?;
            require_additional_frame(sw)?;
            if resp.len() != T4T_DES_GET_VERSION_LEN {
                diagnostics::report_malformed("desfire version frame", resp.len());
                return Err(Error::InvalidLength {
                    expected: T4T_DES_GET_VERSION_LEN,
                    actual: resp.len(),
                });
            }

            let major = payload[3];
            let minor = payload[4];
            if major == T4T_DESEV0_MAJOR_VERSION && minor == T4T_DESEV0_MINOR_VERSION {
                s.card_type = CardType::DesfireEv0;
                s.card_size = T4T_DES_EV0_CARD_SIZE;
            } else if major >= T4T_DESEV1_MAJOR_VERSION {
                s.card_type = CardType::DesfireEv1;
                s.card_size = match payload[5] {
                    T4T_SIZE_IDENTIFIER_2K => T4T_DES_EV1_2K_CARD_SIZE,
                    T4T_SIZE_IDENTIFIER_4K => T4T_DES_EV1_4K_CARD_SIZE,
                    T4T_SIZE_IDENTIFIER_8K => T4T_DES_EV1_8K_CARD_SIZE,
                    other => {
                        return Err(Error::UnsupportedOperation(format!(
                            "unknown DESFire storage size {other:#04x}"
                        )))
                    }
                };
            } else {
                return Err(Error::UnsupportedOperation(
                    "tag is not a formatable DESFire card".to_string(),
                ));
            }

            ctx.send(desfire::additional_frame())?;
            s.state = T4tState::Format(FormatSub::SwVersion);
            Ok(())
        }
        FormatSub::SwVersion => {
            let (_, sw) = split_status(resp)?;
            require_additional_frame(sw)?;
            ctx.send(desfire::additional_frame())?;
            s.state = T4tState::Format(FormatSub::Uid);
            Ok(())
        }
        FormatSub::Uid => {
            desfire_status(resp, false)?;
            ctx.send(desfire::create_application(s.card_type))?;
            s.state = T4tState::Format(FormatSub::CreateApp);
            Ok(())
        }
        FormatSub::CreateApp => {
            // A leftover application from an earlier, aborted format is as
            // good as a fresh one.
            desfire_status(resp, true)?;
            ctx.send(desfire::select_application(s.card_type))?;
            s.state = T4tState::Format(FormatSub::SelectApp);
            Ok(())
        }
        FormatSub::SelectApp => {
            desfire_status(resp, false)?;
            ctx.send(desfire::create_cc_file(s.card_type))?;
            s.state = T4tState::Format(FormatSub::CreateCc);
            Ok(())
        }
        FormatSub::CreateCc => {
            desfire_status(resp, true)?;
            ctx.send(desfire::create_ndef_file(s.card_type, s.card_size))?;
            s.state = T4tState::Format(FormatSub::CreateNdef);
            Ok(())
        }
        FormatSub::CreateNdef => {
            desfire_status(resp, true)?;
            ctx.send(desfire::write_cc(s.card_type, s.card_size))?;
            s.state = T4tState::Format(FormatSub::WriteCc);
            Ok(())
        }
        FormatSub::WriteCc => {
            desfire_status(resp, false)?;
            ctx.send(desfire::write_ndef(s.card_type))?;
            s.state = T4tState::Format(FormatSub::WriteNdef);
            Ok(())
        }
        FormatSub::WriteNdef => {
            desfire_status(resp, false)?;
            let max_size = s.card_size as u32;
            // The tag layout changed under the session, force a re-detect.
            s.ndef_detected = false;
            s.reset_operation();
            ctx.emit(RwEvent::FormatComplete { max_size });
            Ok(())
        }
    }
}
