//! Multi-port event wait.

use crate::error::{check, Result, SerialError};
use crate::ffi::{sp_event_set, NativeApi};
use crate::handle::Owned;
use crate::port::{Events, SerialPort};
use std::fmt;
use tracing::trace;

/// A set of (port, events) registrations waited on with one call.
///
/// Registrations hold no reference to the port, so the borrow checker does
/// not keep a registered port alive or open. Closing or releasing one leaves
/// a dangling registration behind, and the set must not be waited on after
/// that. Releasing the set does not affect the ports.
pub struct EventSet<N: NativeApi> {
    handle: Owned<sp_event_set, N>,
    registrations: usize,
}

impl<N: NativeApi> EventSet<N> {
    /// Allocate an empty set.
    pub fn new(native: N) -> Result<Self> {
        let handle = Owned::acquire(native, |n, out| unsafe { n.new_event_set(out) })?;
        Ok(Self {
            handle,
            registrations: 0,
        })
    }

    /// Register interest in `events` on an open port.
    pub fn add(&mut self, port: &SerialPort<N>, events: Events) -> Result<()> {
        let set = self.handle.get()?.as_ptr();
        let raw_port = port.as_raw()?;
        if !port.is_open() {
            return Err(SerialError::argument(format!(
                "{} must be open to wait on its events",
                port.label()
            )));
        }
        if events.is_empty() {
            return Err(SerialError::argument("no events selected"));
        }

        let native = self.handle.native();
        let ret = unsafe { native.add_port_events(set, raw_port, events.bits()) };
        check(native, ret)?;
        self.registrations += 1;
        trace!(port = port.label(), ?events, "registered port events");
        Ok(())
    }

    /// Block until a registered event fires or `timeout_ms` elapses
    /// (0 waits indefinitely).
    ///
    /// Returns `Ok(())` in both cases. Poll each port afterwards, e.g. with
    /// [`SerialPort::input_waiting`], to find out which one is ready.
    ///
    /// # Concurrency
    ///
    /// The wait borrows none of the registered ports. A port can therefore be
    /// moved to another thread and closed or released there while this call
    /// is blocked. That is unsupported: on Unix the descriptor being polled is
    /// closed underneath the wait, and may be reused by an unrelated file
    /// before the wait notices. Use the timeout to bound the wait, and tear
    /// ports down only after it has returned and the set has been released.
    pub fn wait(&self, timeout_ms: u32) -> Result<()> {
        let set = self.handle.get()?.as_ptr();
        let native = self.handle.native();
        let ret = unsafe { native.wait(set, timeout_ms) };
        check(native, ret)?;
        Ok(())
    }

    /// Number of registrations made so far.
    pub fn len(&self) -> usize {
        self.registrations
    }

    pub fn is_empty(&self) -> bool {
        self.registrations == 0
    }

    /// Free the native set. Registered ports are left untouched.
    pub fn release(&mut self) {
        self.handle.release();
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_released()
    }
}

impl<N: NativeApi> fmt::Debug for EventSet<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSet")
            .field("handle", &self.handle)
            .field("registrations", &self.registrations)
            .finish()
    }
}
