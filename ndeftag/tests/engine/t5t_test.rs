#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{detect_t5t, t5t_engine, take_events};
use ndeftag::prelude::*;
use ndeftag::test_support::t5t_frame;

#[test]
fn extended_cc_spread_over_two_blocks() {
    let mut e = t5t_engine();
    e.detect_ndef().unwrap();
    assert_eq!(e.transport_mut().sent[0], vec![0x02, 0x20, 0x00]);

    // MLEN byte zero: the CC is 8 bytes long and its MLEN sits in bytes 6
    // and 7, which is the next block on a 4-byte-block tag.
    e.on_data(&t5t_frame(&[0xE1, 0x40, 0x00, 0x00]));
    assert_eq!(e.transport_mut().sent[1], vec![0x02, 0x20, 0x01]);

    // MLEN [0x00, 0x04] describes a 32-byte area after the 8-byte CC.
    e.on_data(&t5t_frame(&[0x00, 0x00, 0x00, 0x04]));
    assert_eq!(e.transport_mut().sent[2], vec![0x02, 0x20, 0x02]);

    e.on_data(&t5t_frame(&[0x03, 0x05, 0x11, 0x22]));
    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::NdefDetected {
            cur_size: 5,
            max_size: 30,
            flags: NdefFlags::SUPPORTED | NdefFlags::FORMATTED,
        }]
    );
}

#[test]
fn tlv_header_split_across_blocks() {
    let mut e = t5t_engine();
    e.detect_ndef().unwrap();
    e.on_data(&t5t_frame(&[0xE1, 0x40, 0x04, 0x00]));

    // NULL TLV, then an NDEF TLV whose 3-byte length field runs into the
    // next block.
    e.on_data(&t5t_frame(&[0x00, 0x03, 0xFF, 0x00]));
    assert_eq!(e.transport_mut().sent[2], vec![0x02, 0x20, 0x02]);
    e.on_data(&t5t_frame(&[0x10, 0x00, 0x01, 0x02]));

    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::NdefDetected {
            cur_size: 16,
            max_size: 27,
            flags: NdefFlags::SUPPORTED | NdefFlags::FORMATTED,
        }]
    );

    // The value starts mid-block, right after the length field.
    let msg: Vec<u8> = (0..16).collect();
    e.read_ndef().unwrap();
    assert_eq!(e.transport_mut().sent[3], vec![0x02, 0x20, 0x02]);
    e.on_data(&t5t_frame(&[0x10, msg[0], msg[1], msg[2]]));
    e.on_data(&t5t_frame(&[msg[3], msg[4], msg[5], msg[6]]));
    e.on_data(&t5t_frame(&[msg[7], msg[8], msg[9], msg[10]]));
    e.on_data(&t5t_frame(&[msg[11], msg[12], msg[13], msg[14]]));
    e.on_data(&t5t_frame(&[msg[15], 0xFE, 0x00, 0x00]));

    let mut data = Vec::new();
    let events = take_events(&mut e);
    for event in &events {
        match event {
            RwEvent::ReadSegment { data: d } => data.extend_from_slice(d),
            RwEvent::ReadComplete { data: d } => data.extend_from_slice(d),
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(data, msg);
    assert!(matches!(events.last(), Some(RwEvent::ReadComplete { .. })));
    assert!(!e.is_busy());
}

#[test]
fn update_rewrites_the_length_last() {
    let mut e = t5t_engine();
    detect_t5t(&mut e, &[0xE1, 0x40, 0x04, 0x00], &[0x03, 0x02, 0xAB, 0xCD]);
    take_events(&mut e);

    e.update_ndef(vec![0x11, 0x22, 0x33]).unwrap();

    // Zero the length byte first: block 1 is fetched, patched, rewritten.
    assert_eq!(e.transport_mut().sent[2], vec![0x02, 0x20, 0x01]);
    e.on_data(&t5t_frame(&[0x03, 0x02, 0xAB, 0xCD]));
    assert_eq!(
        e.transport_mut().sent[3],
        vec![0x02, 0x21, 0x01, 0x03, 0x00, 0xAB, 0xCD]
    );
    e.on_data(&t5t_frame(&[]));

    // Body bytes sharing block 1 with the TLV header.
    assert_eq!(e.transport_mut().sent[4], vec![0x02, 0x20, 0x01]);
    e.on_data(&t5t_frame(&[0x03, 0x00, 0xAB, 0xCD]));
    assert_eq!(
        e.transport_mut().sent[5],
        vec![0x02, 0x21, 0x01, 0x03, 0x00, 0x11, 0x22]
    );
    e.on_data(&t5t_frame(&[]));

    // Body tail plus the terminator TLV in block 2.
    assert_eq!(e.transport_mut().sent[6], vec![0x02, 0x20, 0x02]);
    e.on_data(&t5t_frame(&[0x00, 0x00, 0x00, 0x00]));
    assert_eq!(
        e.transport_mut().sent[7],
        vec![0x02, 0x21, 0x02, 0x33, 0xFE, 0x00, 0x00]
    );
    e.on_data(&t5t_frame(&[]));

    // The real length goes in only after the body is on the tag.
    assert_eq!(e.transport_mut().sent[8], vec![0x02, 0x20, 0x01]);
    e.on_data(&t5t_frame(&[0x03, 0x00, 0x11, 0x22]));
    assert_eq!(
        e.transport_mut().sent[9],
        vec![0x02, 0x21, 0x01, 0x03, 0x03, 0x11, 0x22]
    );
    e.on_data(&t5t_frame(&[]));

    assert_eq!(take_events(&mut e), vec![RwEvent::UpdateComplete]);
    assert!(!e.is_busy());

    // Read the message back through the updated session state.
    e.read_ndef().unwrap();
    assert_eq!(e.transport_mut().sent[10], vec![0x02, 0x20, 0x01]);
    e.on_data(&t5t_frame(&[0x03, 0x03, 0x11, 0x22]));
    assert_eq!(e.transport_mut().sent[11], vec![0x02, 0x20, 0x02]);
    e.on_data(&t5t_frame(&[0x33, 0xFE, 0x00, 0x00]));
    assert_eq!(
        take_events(&mut e),
        vec![
            RwEvent::ReadSegment { data: vec![0x11, 0x22] },
            RwEvent::ReadComplete { data: vec![0x33] },
        ]
    );
}

#[test]
fn set_read_only_patches_the_cc_then_locks_the_area() {
    let mut e = t5t_engine();
    detect_t5t(&mut e, &[0xE1, 0x40, 0x04, 0x00], &[0x03, 0x02, 0xAB, 0xCD]);
    take_events(&mut e);

    e.set_read_only().unwrap();
    assert_eq!(e.transport_mut().sent[2], vec![0x02, 0x20, 0x00]);
    e.on_data(&t5t_frame(&[0xE1, 0x40, 0x04, 0x00]));
    assert_eq!(
        e.transport_mut().sent[3],
        vec![0x02, 0x21, 0x00, 0xE1, 0x43, 0x04, 0x00]
    );

    // The CC write is followed by a LockBlock sweep over the CC block and
    // the whole 32-byte area: blocks 0 to 8, one frame per answer.
    for block in 0u8..=8 {
        e.on_data(&t5t_frame(&[]));
        assert_eq!(
            e.transport_mut().sent[4 + block as usize],
            vec![0x02, 0x22, block]
        );
    }
    e.on_data(&t5t_frame(&[]));
    assert_eq!(e.transport_mut().sent.len(), 13);

    assert_eq!(take_events(&mut e), vec![RwEvent::SetReadOnlyComplete]);
    assert!(matches!(
        e.update_ndef(vec![0x00]),
        Err(Error::UnsupportedOperation(_))
    ));

    // Repeating the transition is a no-op.
    e.set_read_only().unwrap();
    assert_eq!(e.transport_mut().sent.len(), 13);
    assert_eq!(take_events(&mut e), vec![RwEvent::SetReadOnlyComplete]);
}

#[test]
fn write_protected_cc_reported_read_only() {
    let mut e = t5t_engine();
    detect_t5t(&mut e, &[0xE1, 0x43, 0x04, 0x00], &[0x03, 0x02, 0xAB, 0xCD]);
    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::NdefDetected {
            cur_size: 2,
            max_size: 30,
            flags: NdefFlags::SUPPORTED | NdefFlags::FORMATTED | NdefFlags::READ_ONLY,
        }]
    );
    assert!(matches!(
        e.update_ndef(vec![0x00]),
        Err(Error::UnsupportedOperation(_))
    ));
}

#[test]
fn error_flags_fail_the_detection() {
    let mut e = t5t_engine();
    e.detect_ndef().unwrap();
    e.on_data(&[0x01, 0x0F]);
    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::Failed {
            operation: Operation::Detect,
            error: Error::TagFlags { flags: 0x01 },
        }]
    );
    assert!(!e.is_busy());
}

#[test]
fn terminator_before_ndef_fails_the_detection() {
    let mut e = t5t_engine();
    e.detect_ndef().unwrap();
    e.on_data(&t5t_frame(&[0xE1, 0x40, 0x04, 0x00]));

    // A terminator TLV ends the area; the NDEF TLV behind it is dead data
    // and must not be read.
    e.on_data(&t5t_frame(&[0xFE, 0x03, 0x02, 0xAB]));
    assert!(matches!(
        take_events(&mut e).as_slice(),
        [RwEvent::Failed {
            operation: Operation::Detect,
            error: Error::Protocol(_),
        }]
    ));
    assert_eq!(e.transport_mut().sent.len(), 2);
    assert!(!e.is_busy());
}

#[test]
fn missing_ndef_tlv_fails_the_detection() {
    let mut e = t5t_engine();
    e.detect_ndef().unwrap();
    e.on_data(&t5t_frame(&[0xE1, 0x40, 0x04, 0x00]));

    // A 32-byte area of NULL TLVs holds no NDEF message.
    for _ in 0..2000 {
        if !e.is_busy() {
            break;
        }
        e.on_data(&t5t_frame(&[0x00, 0x00, 0x00, 0x00]));
    }

    assert!(matches!(
        take_events(&mut e).as_slice(),
        [RwEvent::Failed {
            operation: Operation::Detect,
            error: Error::Protocol(_),
        }]
    ));
    // One read per block: the CC plus eight data blocks.
    assert_eq!(e.transport_mut().sent.len(), 9);
}
