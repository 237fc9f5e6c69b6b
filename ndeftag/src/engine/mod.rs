// ndeftag/src/engine/mod.rs

//! Event-driven NDEF access engine.
//!
//! The engine owns no I/O loop: the host integration activates it for a
//! tag technology, starts an operation, and feeds it tag answers through
//! [`Engine::on_data`], timer expiry through [`Engine::on_timeout`] and
//! link errors through [`Engine::on_transport_error`]. Progress and results
//! come back as [`RwEvent`]s on the sink. At most one command is in flight
//! at a time; while one is, the engine is busy and new operations are
//! refused.

pub mod events;
pub(crate) mod session;
mod t4t;
mod t5t;

use std::time::Duration;

use crate::engine::events::{EventSink, RwEvent};
use crate::engine::session::{PendingCommand, T4tSession, T5tSession};
use crate::transport::Transport;
use crate::types::{PresenceCheckOption, Technology};
use crate::utils;
use crate::{Error, Result};

/// Borrow bundle handed to the state machines: the transport to push
/// commands out, the sink for events, and the outstanding-command slot
/// whose occupancy doubles as the response timer.
pub(crate) struct Ctx<'a> {
    pub transport: &'a mut dyn Transport,
    pub sink: &'a mut dyn EventSink,
    pub pending: &'a mut Option<PendingCommand>,
    pub dta_mode: bool,
}

impl Ctx<'_> {
    /// Push one command to the tag and arm the response timer.
    pub fn send(&mut self, apdu: Vec<u8>) -> Result<()> {
        log::trace!("tx {}", utils::bytes_to_hex(&apdu));
        self.transport.send(&apdu)?;
        *self.pending = Some(PendingCommand { apdu });
        Ok(())
    }

    pub fn emit(&mut self, event: RwEvent) {
        self.sink.on_event(event);
    }

    pub fn cancel_timer(&mut self) {
        *self.pending = None;
    }
}

/// NDEF tag access engine for one activated tag.
pub struct Engine<T: Transport, S: EventSink> {
    transport: T,
    sink: S,
    technology: Option<Technology>,
    t4t: T4tSession,
    t5t: T5tSession,
    pending: Option<PendingCommand>,
    dta_mode: bool,
}

impl<T: Transport, S: EventSink> Engine<T, S> {
    pub fn new(transport: T, sink: S) -> Self {
        Self {
            transport,
            sink,
            technology: None,
            t4t: T4tSession::new(),
            t5t: T5tSession::new(),
            pending: None,
            dta_mode: false,
        }
    }

    /// Device-test-application mode tightens a few capability container
    /// checks during detection.
    pub fn set_dta_mode(&mut self, on: bool) {
        self.dta_mode = on;
    }

    /// Bind the engine to a freshly activated tag. Any state from a
    /// previous tag is dropped.
    pub fn activate(&mut self, technology: Technology) {
        self.t4t = T4tSession::new();
        self.t5t = T5tSession::new();
        self.pending = None;
        self.technology = Some(technology);
    }

    /// The tag left the field or the link was torn down. Cancels whatever
    /// was in flight without emitting events.
    pub fn on_deactivated(&mut self) {
        self.pending = None;
        self.technology = None;
        self.t4t = T4tSession::new();
        self.t5t = T5tSession::new();
    }

    pub fn technology(&self) -> Option<Technology> {
        self.technology
    }

    pub fn is_activated(&self) -> bool {
        self.technology.is_some()
    }

    /// A command is outstanding or an operation is mid-flight.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || !self.t4t.is_idle() || !self.t5t.is_idle()
    }

    /// How long the host should wait for an answer to the outstanding
    /// command before calling [`Engine::on_timeout`].
    pub fn response_timeout(&self) -> Duration {
        utils::timeout::default_response_timeout()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn ensure_ready(&self) -> Result<Technology> {
        let tech = self.technology.ok_or(Error::NotActivated)?;
        if self.is_busy() {
            return Err(Error::Busy);
        }
        Ok(tech)
    }

    fn parts(&mut self) -> (&mut T4tSession, &mut T5tSession, Ctx<'_>) {
        (
            &mut self.t4t,
            &mut self.t5t,
            Ctx {
                transport: &mut self.transport,
                sink: &mut self.sink,
                pending: &mut self.pending,
                dta_mode: self.dta_mode,
            },
        )
    }

    /// An operation entry that failed synchronously leaves no state behind;
    /// the error goes back to the caller instead of the sink.
    fn recover_entry(&mut self, r: Result<()>) -> Result<()> {
        if r.is_err() {
            self.t4t.reset_operation();
            self.t5t.reset_operation();
            self.pending = None;
        }
        r
    }

    // -- operations ---------------------------------------------------------

    /// Look for an NDEF area on the tag. Ends with `NdefDetected` or
    /// `Failed`.
    pub fn detect_ndef(&mut self) -> Result<()> {
        let tech = self.ensure_ready()?;
        let (t4t, t5t, mut ctx) = self.parts();
        let r = match tech {
            Technology::Type4 => t4t::detect(t4t, &mut ctx),
            Technology::Type5 => t5t::detect(t5t, &mut ctx),
        };
        self.recover_entry(r)
    }

    /// Stream the NDEF message out. Each intermediate chunk arrives as
    /// `ReadSegment`, the final one as `ReadComplete`.
    pub fn read_ndef(&mut self) -> Result<()> {
        let tech = self.ensure_ready()?;
        let (t4t, t5t, mut ctx) = self.parts();
        let r = match tech {
            Technology::Type4 => t4t::read(t4t, &mut ctx),
            Technology::Type5 => t5t::read(t5t, &mut ctx),
        };
        self.recover_entry(r)
    }

    /// Replace the NDEF message. Ends with `UpdateComplete` or `Failed`.
    pub fn update_ndef(&mut self, data: Vec<u8>) -> Result<()> {
        let tech = self.ensure_ready()?;
        let (t4t, t5t, mut ctx) = self.parts();
        let r = match tech {
            Technology::Type4 => t4t::update(t4t, &mut ctx, data),
            Technology::Type5 => t5t::update(t5t, &mut ctx, data),
        };
        self.recover_entry(r)
    }

    /// Provision a blank DESFire card with the NDEF application. Only
    /// defined for Type 4 tags.
    pub fn format_ndef(&mut self) -> Result<()> {
        let tech = self.ensure_ready()?;
        if tech != Technology::Type4 {
            return Err(Error::UnsupportedOperation(
                "format is only defined for ISO-DEP tags".to_string(),
            ));
        }
        let (t4t, _, mut ctx) = self.parts();
        let r = t4t::format(t4t, &mut ctx);
        self.recover_entry(r)
    }

    /// Make the tag permanently read-only. Ends with `SetReadOnlyComplete`
    /// or `Failed`.
    pub fn set_read_only(&mut self) -> Result<()> {
        let tech = self.ensure_ready()?;
        let (t4t, t5t, mut ctx) = self.parts();
        let r = match tech {
            Technology::Type4 => t4t::set_read_only(t4t, &mut ctx),
            Technology::Type5 => t5t::set_read_only(t5t, &mut ctx),
        };
        self.recover_entry(r)
    }

    /// Probe whether the tag is still in the field. Always produces exactly
    /// one `PresenceCheck` event: a busy engine answers immediately since an
    /// exchange in flight proves presence, and with no activated tag the
    /// answer is `present: false`.
    pub fn presence_check(&mut self, option: PresenceCheckOption) -> Result<()> {
        let Some(tech) = self.technology else {
            self.sink.on_event(RwEvent::PresenceCheck { present: false });
            return Ok(());
        };
        if tech != Technology::Type4 {
            return Err(Error::UnsupportedOperation(
                "presence check is only defined for ISO-DEP tags".to_string(),
            ));
        }
        if self.is_busy() {
            self.sink.on_event(RwEvent::PresenceCheck { present: true });
            return Ok(());
        }
        let (t4t, _, mut ctx) = self.parts();
        let r = t4t::presence_check(t4t, &mut ctx, option);
        self.recover_entry(r)
    }

    // -- host callbacks -----------------------------------------------------

    /// Feed one answer from the tag into the engine.
    pub fn on_data(&mut self, resp: &[u8]) {
        let Some(tech) = self.technology else {
            log::debug!("dropping {} bytes received without an active tag", resp.len());
            return;
        };
        log::trace!("rx {}", utils::bytes_to_hex(resp));
        let (t4t, t5t, mut ctx) = self.parts();
        ctx.cancel_timer();
        match tech {
            Technology::Type4 => t4t::on_response(t4t, &mut ctx, resp),
            Technology::Type5 => t5t::on_response(t5t, &mut ctx, resp),
        }
    }

    /// The response timer for the outstanding command expired.
    pub fn on_timeout(&mut self) {
        let Some(tech) = self.technology else { return };
        let Some(pending) = &self.pending else { return };
        log::warn!(
            "no answer to {} within the timeout",
            utils::bytes_to_hex(&pending.apdu)
        );
        let (t4t, t5t, mut ctx) = self.parts();
        match tech {
            Technology::Type4 => t4t::fail(t4t, &mut ctx, Error::Timeout),
            Technology::Type5 => t5t::fail(t5t, &mut ctx, Error::Timeout),
        }
    }

    /// The link below reported an error outside a response.
    pub fn on_transport_error(&mut self, status: u8) {
        let Some(tech) = self.technology else { return };
        if self.is_busy() {
            let (t4t, t5t, mut ctx) = self.parts();
            match tech {
                Technology::Type4 => t4t::fail(t4t, &mut ctx, Error::Transport { status }),
                Technology::Type5 => t5t::fail(t5t, &mut ctx, Error::Transport { status }),
            }
        } else {
            self.sink.on_event(RwEvent::TransportError { status });
        }
    }
}
