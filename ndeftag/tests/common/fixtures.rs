// fixtures.rs — canned capability containers and detection walkthroughs

#![allow(dead_code)]

use ndeftag::prelude::*;
use ndeftag::test_support::{mock_engine, t5t_frame, with_status_ok};
use ndeftag::transport::mock::MockTransport;

pub type TestEngine = Engine<MockTransport, Vec<RwEvent>>;

/// Route engine logs through the test harness. Repeated calls are fine.
fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn t4t_engine() -> TestEngine {
    init_test_logging();
    mock_engine(Technology::Type4)
}

pub fn t5t_engine() -> TestEngine {
    init_test_logging();
    mock_engine(Technology::Type5)
}

pub fn ok(payload: &[u8]) -> Vec<u8> {
    with_status_ok(payload)
}

/// Mapping version 2.0 capability container describing an NDEF file E104
/// of 0x0EDE bytes with free read access.
pub fn cc_v20(max_le: u16, max_lc: u16, write_access: u8) -> Vec<u8> {
    vec![
        0x00,
        0x0F, // CCLEN
        0x20, // mapping version
        (max_le >> 8) as u8,
        max_le as u8,
        (max_lc >> 8) as u8,
        max_lc as u8,
        0x04,
        0x06, // NDEF file-control TLV
        0xE1,
        0x04, // file id
        0x0E,
        0xDE, // max file size
        0x00,
        write_access,
    ]
}

/// Mapping version 3.0 CC head announcing an extended file-control TLV
/// whose value field still has to be read from offset 9.
pub fn cc_v30_endef_head(max_le: u16, max_lc: u16) -> Vec<u8> {
    vec![
        0x00,
        0x17, // CCLEN
        0x30, // mapping version
        (max_le >> 8) as u8,
        max_le as u8,
        (max_lc >> 8) as u8,
        max_lc as u8,
        0x05,
        0x08, // extended NDEF file-control TLV
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
    ]
}

/// The 8-byte value field of the extended file-control TLV.
pub fn cc_v30_endef_tail(max_file_size: u32) -> Vec<u8> {
    let size = max_file_size.to_be_bytes();
    vec![0xE1, 0x04, size[0], size[1], size[2], size[3], 0x00, 0x00]
}

/// Drive a Type 4 detection to completion: the CC content and the length
/// field bytes come from the caller, everything else answers 9000.
pub fn detect_t4t(e: &mut TestEngine, cc: &[u8], nlen: &[u8]) {
    e.detect_ndef().unwrap();
    e.on_data(&ok(&[])); // select application
    e.on_data(&ok(&[])); // select CC file
    e.on_data(&ok(cc));
    e.on_data(&ok(&[])); // select NDEF file
    e.on_data(&ok(nlen));
}

/// Drive a Type 4 detection through the two-step extended CC read.
pub fn detect_t4t_endef(e: &mut TestEngine, head: &[u8], tail: &[u8], enlen: &[u8]) {
    e.detect_ndef().unwrap();
    e.on_data(&ok(&[])); // select application
    e.on_data(&ok(&[])); // select CC file
    e.on_data(&ok(head));
    e.on_data(&ok(tail));
    e.on_data(&ok(&[])); // select NDEF file
    e.on_data(&ok(enlen));
}

/// Drive a Type 5 detection on a 4-byte-block tag: CC in block 0, the NDEF
/// TLV at the start of block 1.
pub fn detect_t5t(e: &mut TestEngine, cc_block0: &[u8; 4], block1: &[u8; 4]) {
    e.detect_ndef().unwrap();
    e.on_data(&t5t_frame(cc_block0));
    e.on_data(&t5t_frame(block1));
}

/// Drain the recorded events.
pub fn take_events(e: &mut TestEngine) -> Vec<RwEvent> {
    std::mem::take(e.sink_mut())
}

/// Drain the recorded commands.
pub fn take_sent(e: &mut TestEngine) -> Vec<Vec<u8>> {
    std::mem::take(&mut e.transport_mut().sent)
}
