//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize common engine and response setup so tests across
//! the crate and tests/ directory can reuse the same logic.
#![allow(dead_code)]

use crate::engine::events::RwEvent;
use crate::engine::Engine;
use crate::transport::mock::MockTransport;
use crate::types::Technology;

/// Build an engine over a MockTransport with a Vec sink, activated for the
/// given technology.
#[doc(hidden)]
pub fn mock_engine(technology: Technology) -> Engine<MockTransport, Vec<RwEvent>> {
    let mut engine = Engine::new(MockTransport::new(), Vec::new());
    engine.activate(technology);
    engine
}

/// Append a COMPLETED status word trailer to a response payload.
#[doc(hidden)]
pub fn with_status_ok(payload: &[u8]) -> Vec<u8> {
    with_status(payload, 0x90, 0x00)
}

/// Append an arbitrary status word trailer to a response payload.
#[doc(hidden)]
pub fn with_status(payload: &[u8], sw1: u8, sw2: u8) -> Vec<u8> {
    let mut resp = payload.to_vec();
    resp.push(sw1);
    resp.push(sw2);
    resp
}

/// Prefix a successful ISO 15693 response flags byte.
#[doc(hidden)]
pub fn t5t_frame(payload: &[u8]) -> Vec<u8> {
    let mut resp = vec![0x00];
    resp.extend_from_slice(payload);
    resp
}
