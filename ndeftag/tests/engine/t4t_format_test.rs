#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{t4t_engine, take_events};
use ndeftag::prelude::*;

const DES_OK: [u8; 2] = [0x91, 0x00];
const DES_MORE: [u8; 2] = [0x91, 0xAF];
const DES_DUPLICATE: [u8; 2] = [0x91, 0xDE];

/// GetVersion hardware frame: 7 payload bytes with the major and minor
/// version and the storage size identifier at offsets 3 to 5.
fn hw_version(major: u8, minor: u8, size_id: u8) -> Vec<u8> {
    vec![0x04, 0x01, 0x01, major, minor, size_id, 0x05, 0x91, 0xAF]
}

#[test]
fn format_provisions_an_ev1_card() {
    let mut e = t4t_engine();
    e.format_ndef().unwrap();

    e.on_data(&hw_version(0x01, 0x00, 0x16)); // EV1, 2K
    e.on_data(&DES_MORE); // software version frame
    e.on_data(&DES_OK); // UID frame
    e.on_data(&DES_DUPLICATE); // application left over from an aborted run
    e.on_data(&DES_OK); // select application
    e.on_data(&DES_DUPLICATE); // CC file already present
    e.on_data(&DES_DUPLICATE); // NDEF file already present
    e.on_data(&DES_OK); // write CC
    e.on_data(&DES_OK); // write NDEF

    let sent = &e.transport_mut().sent;
    assert_eq!(sent.len(), 9);
    assert_eq!(sent[0], vec![0x90, 0x60, 0x00, 0x00, 0x00]);
    assert_eq!(sent[1], vec![0x90, 0xAF, 0x00, 0x00, 0x00]);
    assert_eq!(sent[2], vec![0x90, 0xAF, 0x00, 0x00, 0x00]);
    assert_eq!(
        sent[3],
        hex::decode("90CA00000E0100000F2105E1D276000085010100").unwrap()
    );
    assert_eq!(sent[4], hex::decode("905A00000301000000").unwrap());
    assert_eq!(
        sent[5],
        hex::decode("90CD0000090103E100EEEE0F000000").unwrap()
    );
    assert_eq!(
        sent[6],
        hex::decode("90CD0000090204E100EEEE00080000").unwrap()
    );
    // CC content carries the EV1 mapping version and the card size.
    assert_eq!(sent[7].len(), 28);
    assert_eq!(sent[7][5], 0x01);
    assert_eq!(sent[7][14], 0x20);
    assert_eq!(&sent[7][23..25], &[0x08, 0x00]);
    assert_eq!(
        sent[8],
        vec![0x90, 0x3D, 0x00, 0x00, 0x09, 0x02, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00]
    );

    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::FormatComplete { max_size: 2048 }]
    );
    assert!(!e.is_busy());
}

#[test]
fn format_provisions_an_ev0_card() {
    let mut e = t4t_engine();
    e.format_ndef().unwrap();

    e.on_data(&hw_version(0x00, 0x2B, 0x12));
    e.on_data(&DES_MORE);
    e.on_data(&DES_OK);
    e.on_data(&DES_OK); // create application
    e.on_data(&DES_OK); // select application
    e.on_data(&DES_OK); // create CC file
    e.on_data(&DES_OK); // create NDEF file
    e.on_data(&DES_OK); // write CC
    e.on_data(&DES_OK); // write NDEF

    let sent = &e.transport_mut().sent;
    assert_eq!(
        sent[3],
        vec![0x90, 0xCA, 0x00, 0x00, 0x05, 0x00, 0x10, 0xE1, 0x0F, 0x01, 0x00]
    );
    assert_eq!(
        sent[4],
        vec![0x90, 0x5A, 0x00, 0x00, 0x03, 0x00, 0x10, 0xE1, 0x00]
    );
    assert_eq!(
        sent[6],
        vec![0x90, 0xCD, 0x00, 0x00, 0x07, 0x04, 0x00, 0xEE, 0xEE, 0xDE, 0x0E, 0x00, 0x00]
    );
    assert_eq!(sent[7][5], 0x03);

    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::FormatComplete { max_size: 0x0EDE }]
    );
}

#[test]
fn format_rejects_unknown_storage_size() {
    let mut e = t4t_engine();
    e.format_ndef().unwrap();
    e.on_data(&hw_version(0x01, 0x00, 0x20));
    assert_eq!(e.transport_mut().sent.len(), 1);
    assert!(matches!(
        take_events(&mut e).as_slice(),
        [RwEvent::Failed {
            operation: Operation::Format,
            error: Error::UnsupportedOperation(_),
        }]
    ));
    assert!(!e.is_busy());
}

#[test]
fn format_fails_on_a_native_error_status() {
    let mut e = t4t_engine();
    e.format_ndef().unwrap();
    e.on_data(&hw_version(0x01, 0x04, 0x18)); // EV1, 4K
    e.on_data(&DES_MORE);
    e.on_data(&DES_OK);
    e.on_data(&DES_OK);
    e.on_data(&[0x91, 0xAE]); // authentication error on select

    assert_eq!(
        take_events(&mut e),
        vec![RwEvent::Failed {
            operation: Operation::Format,
            error: Error::Status { sw1: 0x91, sw2: 0xAE },
        }]
    );
    assert!(!e.is_busy());
}
