#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{
    cc_v20, cc_v30_endef_head, cc_v30_endef_tail, detect_t4t, detect_t4t_endef, ok, t4t_engine,
    take_events,
};
use ndeftag::prelude::*;

#[test]
fn chunked_read_emits_segments_then_complete() {
    let mut e = t4t_engine();
    // MLe 0x3B caps each ReadBinary at 59 bytes; the 100-byte message
    // takes two rounds.
    detect_t4t(&mut e, &cc_v20(0x3B, 0x34, 0x00), &[0x00, 0x64]);
    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::NdefDetected {
            cur_size: 100,
            max_size: 0x0EDE - 2,
            flags: NdefFlags::SUPPORTED | NdefFlags::FORMATTED,
        }]
    );

    e.read_ndef().unwrap();
    assert_eq!(
        e.transport_mut().sent[5],
        vec![0x00, 0xB0, 0x00, 0x02, 0x3B]
    );
    e.on_data(&ok(&[0x11; 59]));
    assert_eq!(
        e.transport_mut().sent[6],
        vec![0x00, 0xB0, 0x00, 0x3D, 0x29]
    );
    e.on_data(&ok(&[0x22; 41]));

    assert_eq!(
        take_events(&mut e),
        vec![
            RwEvent::ReadSegment { data: vec![0x11; 59] },
            RwEvent::ReadComplete { data: vec![0x22; 41] },
        ]
    );
    assert!(!e.is_busy());
}

#[test]
fn chunked_update_zeroes_then_restores_nlen() {
    let mut e = t4t_engine();
    // MLc 0x34 caps each UpdateBinary at 52 payload bytes.
    detect_t4t(&mut e, &cc_v20(0x3B, 0x34, 0x00), &[0x00, 0x00]);
    take_events(&mut e);

    e.update_ndef(vec![0x5A; 100]).unwrap();
    assert_eq!(
        e.transport_mut().sent[5],
        vec![0x00, 0xD6, 0x00, 0x00, 0x02, 0x00, 0x00]
    );

    e.on_data(&[0x90, 0x00]);
    let mut first = vec![0x00, 0xD6, 0x00, 0x02, 0x34];
    first.extend_from_slice(&[0x5A; 52]);
    assert_eq!(e.transport_mut().sent[6], first);

    // A warning status still commits the write on tags in the field.
    e.on_data(&[0x63, 0x00]);
    let mut second = vec![0x00, 0xD6, 0x00, 0x36, 0x30];
    second.extend_from_slice(&[0x5A; 48]);
    assert_eq!(e.transport_mut().sent[7], second);

    e.on_data(&[0x90, 0x00]);
    assert_eq!(
        e.transport_mut().sent[8],
        vec![0x00, 0xD6, 0x00, 0x00, 0x02, 0x00, 0x64]
    );
    e.on_data(&[0x90, 0x00]);

    assert_eq!(take_events(&mut e), vec![RwEvent::UpdateComplete]);
    assert!(!e.is_busy());

    // The session tracks the new length without a fresh detection.
    e.read_ndef().unwrap();
    assert_eq!(
        e.transport_mut().sent.last().unwrap(),
        &vec![0x00, 0xB0, 0x00, 0x02, 0x3B]
    );
}

#[test]
fn empty_update_only_rewrites_the_length() {
    let mut e = t4t_engine();
    detect_t4t(&mut e, &cc_v20(0x3B, 0x34, 0x00), &[0x00, 0x05]);
    take_events(&mut e);

    e.update_ndef(Vec::new()).unwrap();
    assert_eq!(e.transport_mut().sent.len(), 6);
    assert_eq!(
        e.transport_mut().sent[5],
        vec![0x00, 0xD6, 0x00, 0x00, 0x02, 0x00, 0x00]
    );
    e.on_data(&[0x90, 0x00]);
    assert_eq!(take_events(&mut e), vec![RwEvent::UpdateComplete]);

    // Reading back the empty message needs no exchange at all.
    e.read_ndef().unwrap();
    assert_eq!(e.transport_mut().sent.len(), 6);
    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::ReadComplete { data: Vec::new() }]
    );
}

#[test]
fn update_refused_when_read_only() {
    let mut e = t4t_engine();
    detect_t4t(&mut e, &cc_v20(0x3B, 0x34, 0xFF), &[0x00, 0x05]);
    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::NdefDetected {
            cur_size: 5,
            max_size: 0x0EDE - 2,
            flags: NdefFlags::SUPPORTED | NdefFlags::FORMATTED | NdefFlags::READ_ONLY,
        }]
    );
    assert!(matches!(
        e.update_ndef(vec![0x00]),
        Err(Error::UnsupportedOperation(_))
    ));
    assert!(!e.is_busy());
}

#[test]
fn update_larger_than_the_file_rejected() {
    let mut e = t4t_engine();
    detect_t4t(&mut e, &cc_v20(0x3B, 0x34, 0x00), &[0x00, 0x00]);
    take_events(&mut e);

    // Capacity is max_file_size minus the 2-byte NLEN field.
    assert!(matches!(
        e.update_ndef(vec![0x00; 0x0EDD]),
        Err(Error::InvalidLength { expected: 0x0EDC, actual: 0x0EDD })
    ));
    assert!(!e.is_busy());
    assert_eq!(e.transport_mut().sent.len(), 5);
}

#[test]
fn set_read_only_patches_cc_and_reselects_ndef() {
    let mut e = t4t_engine();
    detect_t4t(&mut e, &cc_v20(0x3B, 0x34, 0x00), &[0x00, 0x05]);
    take_events(&mut e);

    e.set_read_only().unwrap();
    assert_eq!(
        e.transport_mut().sent[5],
        vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0xE1, 0x03]
    );
    e.on_data(&ok(&[]));
    assert_eq!(
        e.transport_mut().sent[6],
        vec![0x00, 0xD6, 0x00, 0x0E, 0x01, 0xFF]
    );
    e.on_data(&[0x63, 0x00]); // warning tolerated on the CC write
    assert_eq!(
        e.transport_mut().sent[7],
        vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0xE1, 0x04]
    );
    e.on_data(&ok(&[]));
    assert_eq!(take_events(&mut e), vec![RwEvent::SetReadOnlyComplete]);

    // A second transition completes without touching the tag.
    e.set_read_only().unwrap();
    assert_eq!(e.transport_mut().sent.len(), 8);
    assert_eq!(take_events(&mut e), vec![RwEvent::SetReadOnlyComplete]);

    assert!(matches!(
        e.update_ndef(vec![0x00]),
        Err(Error::UnsupportedOperation(_))
    ));
}

#[test]
fn extended_cc_detect_reads_the_tlv_tail() {
    let mut e = t4t_engine();
    detect_t4t_endef(
        &mut e,
        &cc_v30_endef_head(0x3B, 0x34),
        &cc_v30_endef_tail(0x0001_0000),
        &[0x00, 0x00, 0x00, 0x05],
    );

    let sent = &e.transport_mut().sent;
    assert_eq!(sent[2], vec![0x00, 0xB0, 0x00, 0x00, 0x0F]);
    // The 8-byte value field of the extended file-control TLV sits at
    // offset 9 of the CC file.
    assert_eq!(sent[3], vec![0x00, 0xB0, 0x00, 0x09, 0x08]);
    assert_eq!(sent[4], vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0xE1, 0x04]);
    // ENLEN is four bytes.
    assert_eq!(sent[5], vec![0x00, 0xB0, 0x00, 0x00, 0x04]);

    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::NdefDetected {
            cur_size: 5,
            max_size: 0x0001_0000 - 4,
            flags: NdefFlags::SUPPORTED | NdefFlags::FORMATTED,
        }]
    );
}

#[test]
fn update_beyond_the_p1p2_range_uses_data_objects() {
    let mut e = t4t_engine();
    detect_t4t_endef(
        &mut e,
        &cc_v30_endef_head(0x3B, 0x34),
        &cc_v30_endef_tail(0x0001_0000),
        &[0x00, 0x00, 0x00, 0x00],
    );
    take_events(&mut e);

    e.update_ndef(vec![0xA5; 0x8000]).unwrap();
    assert_eq!(
        e.transport_mut().sent.last().unwrap(),
        &vec![0x00, 0xD6, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00]
    );

    // The write span crosses offset 0x7FFF, so the data rides in an ODO
    // UpdateBinary. MLc 0x34 leaves 45 payload bytes after the 7-byte
    // offset and length objects.
    e.on_data(&[0x90, 0x00]);
    let first = e.transport_mut().sent.last().unwrap().clone();
    assert_eq!(
        &first[..12],
        &[0x00, 0xD7, 0x00, 0x00, 0x34, 0x54, 0x03, 0x00, 0x00, 0x04, 0x53, 0x2D]
    );
    assert_eq!(first.len(), 12 + 45);

    for _ in 0..2000 {
        if !e.is_busy() {
            break;
        }
        e.on_data(&[0x90, 0x00]);
    }
    assert!(!e.is_busy());
    assert_eq!(
        e.transport_mut().sent.last().unwrap(),
        &vec![0x00, 0xD6, 0x00, 0x00, 0x04, 0x00, 0x00, 0x80, 0x00]
    );
    assert_eq!(take_events(&mut e).last(), Some(&RwEvent::UpdateComplete));
}

#[test]
fn presence_check_empty_iblock_answered() {
    let mut e = t4t_engine();
    e.presence_check(PresenceCheckOption::EmptyIBlock).unwrap();
    assert_eq!(e.transport_mut().sent, vec![Vec::<u8>::new()]);

    // Any answer at all proves presence, even a bare control byte.
    e.on_data(&[0xA2]);
    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::PresenceCheck { present: true }]
    );
    assert!(!e.is_busy());
}

#[test]
fn detect_failure_after_both_application_names() {
    let mut e = t4t_engine();
    e.detect_ndef().unwrap();
    e.on_data(&[0x6A, 0x82]); // no version 2.0 application
    e.on_data(&[0x6A, 0x82]); // no version 1.0 application either

    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::Failed {
            operation: Operation::Detect,
            error: Error::Status { sw1: 0x6A, sw2: 0x82 },
        }]
    );
    assert!(!e.is_busy());
    // Reads are refused until a detection succeeds.
    assert!(matches!(e.read_ndef(), Err(Error::Protocol(_))));
}
