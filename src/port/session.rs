//! Port session facade.
//!
//! [`SerialPort`] owns one native port handle and tracks whether it is open.
//! The tracked state is informational: I/O on a port that is not open is
//! passed through and rejected by the library itself, surfacing as
//! [`SerialError::Argument`].

use super::config::PortConfig;
use super::info::copy_string;
use super::types::{
    to_c_int, Buffers, Cts, Dsr, Dtr, FlowControl, Mode, NativeEnum, Parity, Rts, Signals, XonXoff,
};
use crate::error::{check, Result, SerialError};
use crate::ffi::{sp_port, NativeApi};
use crate::handle::Owned;
use crate::settings::SerialSettings;
use serde::Serialize;
use std::ffi::{c_int, c_void, CString};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;
use tracing::{debug, trace, warn};

/// Lifecycle state of a [`SerialPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PortState {
    /// Handle obtained, never opened.
    Located,
    /// Open with the given access mode.
    Open(Mode),
    /// Closed after having been open; may be reopened.
    Closed,
    /// Native handle freed. Terminal.
    Released,
}

/// A serial port session.
///
/// Created by lookup ([`by_name`](Self::by_name)), enumeration
/// ([`list_ports`]) or [`try_clone`](Self::try_clone). Releasing the port,
/// explicitly or on drop, frees the native handle exactly once. Releasing
/// does not close the port; call [`close`](Self::close) first.
///
/// Blocking calls block the calling thread until they complete or time out.
/// A `SerialPort` is `Send` but not `Sync`, and its blocking reads and writes
/// hold `&mut self`, so no other thread can close or release the port while
/// one of them is running. [`EventSet::wait`] borrows no port, however: see
/// its documentation before moving a registered port to another thread.
///
/// Ports compare, hash and display by their OS name.
///
/// [`EventSet::wait`]: crate::EventSet::wait
pub struct SerialPort<N: NativeApi> {
    handle: Owned<sp_port, N>,
    label: String,
    state: PortState,
}

impl<N: NativeApi> SerialPort<N> {
    /// Look up a port by its OS-specific name.
    ///
    /// Succeeds for any name; whether the device exists is only checked
    /// when the port is opened.
    pub fn by_name(native: N, name: &str) -> Result<Self> {
        let c_name = CString::new(name)
            .map_err(|_| SerialError::argument("port name contains a NUL byte"))?;
        // SAFETY: `c_name` outlives the call; `out` is owned by `acquire`.
        let handle = Owned::acquire(native, |n, out| unsafe {
            n.get_port_by_name(c_name.as_ptr(), out)
        })?;
        debug!(port = name, "located serial port");
        Ok(Self::from_handle(handle, name.to_string()))
    }

    fn from_handle(handle: Owned<sp_port, N>, label: String) -> Self {
        Self {
            handle,
            label,
            state: PortState::Located,
        }
    }

    /// Look up a port by name or alias, open it and apply the line settings
    /// of `settings` in one bulk call.
    ///
    /// If the settings cannot be applied the port is closed again before the
    /// error is returned.
    pub fn open_with_settings(
        native: N,
        settings: &SerialSettings,
        name: &str,
        mode: Mode,
    ) -> Result<Self>
    where
        N: Clone,
    {
        let config = PortConfig::from_settings(native.clone(), settings)?;
        let mut port = Self::by_name(native, &settings.resolve_port(name))?;
        port.open(mode)?;
        if let Err(e) = port.set_config(&config) {
            if let Err(close_err) = port.close() {
                warn!(
                    port = %port.label,
                    error = %close_err,
                    "failed to close port after configuration error"
                );
            }
            return Err(e);
        }
        debug!(port = %port.label, line = %settings.line_format(), "applied settings profile");
        Ok(port)
    }

    /// Duplicate the port into an independent handle with its own lifetime.
    /// The copy starts out [`PortState::Located`].
    pub fn try_clone(&self) -> Result<Self>
    where
        N: Clone,
    {
        let port = self.as_raw()?;
        let handle = Owned::acquire(self.native().clone(), |n, out| unsafe {
            n.copy_port(port, out)
        })?;
        trace!(port = %self.label, "copied serial port");
        Ok(Self::from_handle(handle, self.label.clone()))
    }

    /// The raw native pointer, for calls this crate does not wrap.
    pub fn as_raw(&self) -> Result<*mut sp_port> {
        Ok(self.handle.get()?.as_ptr())
    }

    pub(crate) fn native(&self) -> &N {
        self.handle.native()
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> PortState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PortState::Open(_))
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_released()
    }

    /// Run a native call returning an `sp_return` code against the port.
    fn call<F>(&self, f: F) -> Result<usize>
    where
        F: FnOnce(&N, *mut sp_port) -> c_int,
    {
        let port = self.as_raw()?;
        let native = self.native();
        let ret = f(native, port);
        check(native, ret)
    }

    /// Open the port. Reopening a closed port is allowed.
    pub fn open(&mut self, mode: Mode) -> Result<()> {
        self.call(|n, p| unsafe { n.open(p, mode.bits()) })?;
        self.state = PortState::Open(mode);
        debug!(port = %self.label, ?mode, "opened serial port");
        Ok(())
    }

    /// Close the port. Closing a port that is not open fails with
    /// [`SerialError::Argument`].
    pub fn close(&mut self) -> Result<()> {
        self.call(|n, p| unsafe { n.close(p) })?;
        self.state = PortState::Closed;
        debug!(port = %self.label, "closed serial port");
        Ok(())
    }

    /// Free the native handle. A no-op after the first call; later calls on
    /// this port fail with [`SerialError::Disposed`].
    pub fn release(&mut self) {
        if self.handle.is_released() {
            return;
        }
        if self.is_open() {
            warn!(port = %self.label, "releasing serial port that is still open");
        }
        self.handle.release();
        self.state = PortState::Released;
    }

    // Configuration

    /// Read the current settings of an open port.
    pub fn config(&self) -> Result<PortConfig<N>>
    where
        N: Clone,
    {
        let port = self.as_raw()?;
        let config = PortConfig::new(self.native().clone())?;
        let raw = config.as_ptr()?;
        let native = self.native();
        let ret = unsafe { native.get_config(port, raw) };
        check(native, ret)?;
        Ok(config)
    }

    /// Apply every set field of `config` in one call.
    pub fn set_config(&mut self, config: &PortConfig<N>) -> Result<()> {
        let raw = config.as_ptr()?;
        self.call(|n, p| unsafe { n.set_config(p, raw) })?;
        trace!(port = %self.label, "applied port config");
        Ok(())
    }

    /// Read the applied settings into a temporary config and pick one field.
    /// An unset field on an applied port means the library could not
    /// represent the OS state.
    fn applied<T, F>(&self, field: F) -> Result<T>
    where
        N: Clone,
        F: FnOnce(&PortConfig<N>) -> Result<Option<T>>,
    {
        let config = self.config()?;
        field(&config)?.ok_or(SerialError::Unsupported)
    }

    pub fn baudrate(&self) -> Result<u32>
    where
        N: Clone,
    {
        self.applied(PortConfig::baudrate)
    }

    pub fn set_baudrate(&mut self, baudrate: u32) -> Result<()> {
        let value = to_c_int("baud rate", baudrate)?;
        self.call(|n, p| unsafe { n.set_baudrate(p, value) })?;
        Ok(())
    }

    pub fn bits(&self) -> Result<u8>
    where
        N: Clone,
    {
        self.applied(PortConfig::bits)
    }

    pub fn set_bits(&mut self, bits: u8) -> Result<()> {
        self.call(|n, p| unsafe { n.set_bits(p, c_int::from(bits)) })?;
        Ok(())
    }

    pub fn parity(&self) -> Result<Parity>
    where
        N: Clone,
    {
        self.applied(PortConfig::parity)
    }

    pub fn set_parity(&mut self, parity: Parity) -> Result<()> {
        self.call(|n, p| unsafe { n.set_parity(p, parity.to_native()) })?;
        Ok(())
    }

    pub fn stopbits(&self) -> Result<u8>
    where
        N: Clone,
    {
        self.applied(PortConfig::stopbits)
    }

    pub fn set_stopbits(&mut self, stopbits: u8) -> Result<()> {
        self.call(|n, p| unsafe { n.set_stopbits(p, c_int::from(stopbits)) })?;
        Ok(())
    }

    pub fn rts(&self) -> Result<Rts>
    where
        N: Clone,
    {
        self.applied(PortConfig::rts)
    }

    pub fn set_rts(&mut self, rts: Rts) -> Result<()> {
        self.call(|n, p| unsafe { n.set_rts(p, rts.to_native()) })?;
        Ok(())
    }

    pub fn cts(&self) -> Result<Cts>
    where
        N: Clone,
    {
        self.applied(PortConfig::cts)
    }

    pub fn set_cts(&mut self, cts: Cts) -> Result<()> {
        self.call(|n, p| unsafe { n.set_cts(p, cts.to_native()) })?;
        Ok(())
    }

    pub fn dtr(&self) -> Result<Dtr>
    where
        N: Clone,
    {
        self.applied(PortConfig::dtr)
    }

    pub fn set_dtr(&mut self, dtr: Dtr) -> Result<()> {
        self.call(|n, p| unsafe { n.set_dtr(p, dtr.to_native()) })?;
        Ok(())
    }

    pub fn dsr(&self) -> Result<Dsr>
    where
        N: Clone,
    {
        self.applied(PortConfig::dsr)
    }

    pub fn set_dsr(&mut self, dsr: Dsr) -> Result<()> {
        self.call(|n, p| unsafe { n.set_dsr(p, dsr.to_native()) })?;
        Ok(())
    }

    pub fn xon_xoff(&self) -> Result<XonXoff>
    where
        N: Clone,
    {
        self.applied(PortConfig::xon_xoff)
    }

    pub fn set_xon_xoff(&mut self, xon_xoff: XonXoff) -> Result<()> {
        self.call(|n, p| unsafe { n.set_xon_xoff(p, xon_xoff.to_native()) })?;
        Ok(())
    }

    /// Apply a flow control preset to all control lines at once.
    pub fn set_flowcontrol(&mut self, flowcontrol: FlowControl) -> Result<()> {
        self.call(|n, p| unsafe { n.set_flowcontrol(p, flowcontrol.to_native()) })?;
        Ok(())
    }

    // Data transfer

    /// Read up to `buf.len()` bytes, waiting at most `timeout_ms`
    /// milliseconds (0 waits until the buffer is full).
    ///
    /// Returns fewer bytes than requested only if the timeout elapsed.
    pub fn blocking_read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
        let (data, len) = (buf.as_mut_ptr().cast::<c_void>(), buf.len());
        self.call(|n, p| unsafe { n.blocking_read(p, data, len, timeout_ms) })
    }

    /// Read whatever arrives first: returns as soon as at least one byte is
    /// available, or 0 once `timeout_ms` elapses (0 waits indefinitely).
    pub fn blocking_read_next(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
        let (data, len) = (buf.as_mut_ptr().cast::<c_void>(), buf.len());
        self.call(|n, p| unsafe { n.blocking_read_next(p, data, len, timeout_ms) })
    }

    /// Read the bytes already buffered, without waiting.
    pub fn nonblocking_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let (data, len) = (buf.as_mut_ptr().cast::<c_void>(), buf.len());
        self.call(|n, p| unsafe { n.nonblocking_read(p, data, len) })
    }

    /// Write all of `buf`, waiting at most `timeout_ms` milliseconds
    /// (0 waits until everything is queued).
    pub fn blocking_write(&mut self, buf: &[u8], timeout_ms: u32) -> Result<usize> {
        let (data, len) = (buf.as_ptr().cast::<c_void>(), buf.len());
        self.call(|n, p| unsafe { n.blocking_write(p, data, len, timeout_ms) })
    }

    /// Queue as much of `buf` as fits without waiting.
    pub fn nonblocking_write(&mut self, buf: &[u8]) -> Result<usize> {
        let (data, len) = (buf.as_ptr().cast::<c_void>(), buf.len());
        self.call(|n, p| unsafe { n.nonblocking_write(p, data, len) })
    }

    /// Bytes received but not yet read.
    pub fn input_waiting(&self) -> Result<usize> {
        self.call(|n, p| unsafe { n.input_waiting(p) })
    }

    /// Bytes queued but not yet transmitted.
    pub fn output_waiting(&self) -> Result<usize> {
        self.call(|n, p| unsafe { n.output_waiting(p) })
    }

    /// Discard buffered data.
    pub fn flush(&mut self, buffers: Buffers) -> Result<()> {
        self.call(|n, p| unsafe { n.flush(p, buffers.bits()) })?;
        Ok(())
    }

    /// Block until all queued output has been transmitted.
    pub fn drain(&mut self) -> Result<()> {
        self.call(|n, p| unsafe { n.drain(p) })?;
        Ok(())
    }

    // Signals

    /// Status of the input control lines.
    pub fn signals(&self) -> Result<Signals> {
        let mut mask: c_int = 0;
        let out: *mut c_int = &mut mask;
        self.call(|n, p| unsafe { n.get_signals(p, out) })?;
        Ok(Signals::from_bits_truncate(mask))
    }

    /// Put the line into the break state. It stays there until
    /// [`end_break`](Self::end_break).
    pub fn start_break(&mut self) -> Result<()> {
        self.call(|n, p| unsafe { n.start_break(p) })?;
        Ok(())
    }

    pub fn end_break(&mut self) -> Result<()> {
        self.call(|n, p| unsafe { n.end_break(p) })?;
        Ok(())
    }
}

impl<N: NativeApi> Drop for SerialPort<N> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<N: NativeApi> PartialEq for SerialPort<N> {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl<N: NativeApi> Eq for SerialPort<N> {}

impl<N: NativeApi> Hash for SerialPort<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}

impl<N: NativeApi> fmt::Display for SerialPort<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl<N: NativeApi> fmt::Debug for SerialPort<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialPort")
            .field("name", &self.label)
            .field("state", &self.state)
            .field("released", &self.handle.is_released())
            .finish()
    }
}

/// Frees a native port list on every exit path.
struct PortList<'a, N: NativeApi> {
    native: &'a N,
    list: *mut *mut sp_port,
}

impl<N: NativeApi> Drop for PortList<'_, N> {
    fn drop(&mut self) {
        // SAFETY: `list` came from a successful `sp_list_ports` and is freed
        // only here.
        unsafe { self.native.free_port_list(self.list) };
    }
}

/// Enumerate the serial ports present on the system.
///
/// Each entry is copied into an independently owned [`SerialPort`]; the
/// native list itself is always freed before returning.
pub fn list_ports<N: NativeApi + Clone>(native: N) -> Result<Vec<SerialPort<N>>> {
    let mut raw: *mut *mut sp_port = ptr::null_mut();
    let ret = unsafe { native.list_ports(&mut raw) };
    check(&native, ret)?;
    if raw.is_null() {
        return Err(SerialError::argument("port enumeration returned no list"));
    }
    let list = PortList {
        native: &native,
        list: raw,
    };

    let mut ports = Vec::new();
    loop {
        // SAFETY: the list is NULL-terminated and stays alive until `list`
        // is dropped.
        let entry = unsafe { *list.list.add(ports.len()) };
        if entry.is_null() {
            break;
        }
        let handle = Owned::acquire(native.clone(), |n, out| unsafe { n.copy_port(entry, out) })?;
        let name = unsafe { copy_string(native.get_port_name(entry)) }.unwrap_or_default();
        ports.push(SerialPort::from_handle(handle, name));
    }
    drop(list);

    debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::{Fault, MockDevice, MockNative, SP_ERR_MEM};
    use pretty_assertions::assert_eq;

    fn loopback() -> MockNative {
        MockNative::new().with_device(MockDevice::native("/dev/ttyS0").with_loopback())
    }

    #[test]
    fn test_state_transitions() {
        let mut port = SerialPort::by_name(loopback(), "/dev/ttyS0").unwrap();
        assert_eq!(port.state(), PortState::Located);

        port.open(Mode::READ_WRITE).unwrap();
        assert_eq!(port.state(), PortState::Open(Mode::READ_WRITE));

        port.close().unwrap();
        assert_eq!(port.state(), PortState::Closed);

        port.open(Mode::READ).unwrap();
        assert_eq!(port.state(), PortState::Open(Mode::READ));
    }

    #[test]
    fn test_failed_open_keeps_state() {
        let native = MockNative::new();
        let mut port = SerialPort::by_name(native.clone(), "/dev/ttyACM9").unwrap();

        let err = port.open(Mode::READ).unwrap_err();
        assert_eq!(
            err,
            SerialError::Os {
                code: 2,
                message: "No such file or directory".to_string()
            }
        );
        assert_eq!(port.state(), PortState::Located);
        assert_eq!(native.outstanding_error_messages(), 0);
    }

    #[test]
    fn test_close_twice_is_argument_error() {
        let mut port = SerialPort::by_name(loopback(), "/dev/ttyS0").unwrap();
        port.open(Mode::READ_WRITE).unwrap();
        port.close().unwrap();

        assert!(matches!(port.close(), Err(SerialError::Argument(_))));
        assert_eq!(port.state(), PortState::Closed);
    }

    #[test]
    fn test_io_before_open_is_rejected_natively() {
        let native = loopback();
        let mut port = SerialPort::by_name(native.clone(), "/dev/ttyS0").unwrap();

        let mut buf = [0u8; 4];
        assert!(matches!(
            port.nonblocking_read(&mut buf),
            Err(SerialError::Argument(_))
        ));
        assert_eq!(native.call_count("sp_nonblocking_read"), 1);
    }

    #[test]
    fn test_name_with_nul_is_rejected() {
        let native = MockNative::new();
        let err = SerialPort::by_name(native.clone(), "COM1\0").unwrap_err();
        assert!(matches!(err, SerialError::Argument(_)));
        assert!(native.calls().is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let native = loopback();
        let mut original = SerialPort::by_name(native.clone(), "/dev/ttyS0").unwrap();
        original.open(Mode::READ_WRITE).unwrap();

        let mut copy = original.try_clone().unwrap();
        assert_eq!(copy.state(), PortState::Located);
        assert_eq!(copy.name().unwrap(), "/dev/ttyS0");
        assert_eq!(native.live_ports(), 2);

        copy.release();
        assert_eq!(native.live_ports(), 1);
        assert_eq!(original.input_waiting().unwrap(), 0);
    }

    #[test]
    fn test_release_does_not_close() {
        let native = loopback();
        let mut port = SerialPort::by_name(native.clone(), "/dev/ttyS0").unwrap();
        port.open(Mode::READ_WRITE).unwrap();

        port.release();
        port.release();
        drop(port);

        assert_eq!(native.call_count("sp_close"), 0);
        assert_eq!(native.call_count("sp_free_port"), 1);
    }

    #[test]
    fn test_released_port_reports_no_live_state() {
        let mut port = SerialPort::by_name(loopback(), "/dev/ttyS0").unwrap();
        port.open(Mode::READ_WRITE).unwrap();

        port.release();

        assert_eq!(port.state(), PortState::Released);
        assert!(!port.is_open());
        assert!(port.is_released());
        assert_eq!(port.close(), Err(SerialError::Disposed("serial port")));
        assert_eq!(port.state(), PortState::Released);
    }

    #[test]
    fn test_ports_compare_by_name() {
        use std::collections::HashSet;

        let native = MockNative::new()
            .with_device(MockDevice::native("/dev/ttyS0"))
            .with_device(MockDevice::native("/dev/ttyS1"));
        let listed = list_ports(native.clone()).unwrap();
        let looked_up = SerialPort::by_name(native.clone(), "/dev/ttyS1").unwrap();
        let copy = looked_up.try_clone().unwrap();

        assert_eq!(listed[1], looked_up);
        assert_ne!(listed[0], looked_up);
        assert_eq!(copy, looked_up);
        assert_eq!(looked_up.to_string(), "/dev/ttyS1");

        let unique: HashSet<&SerialPort<MockNative>> =
            listed.iter().chain([&looked_up, &copy]).collect();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_open_with_settings_resolves_alias() {
        let native = loopback();
        let mut settings = SerialSettings {
            default_baud: 19_200,
            data_bits: 7,
            parity: Parity::Even,
            stop_bits: 2,
            ..SerialSettings::default()
        };
        settings
            .port_aliases
            .insert("console".to_string(), "/dev/ttyS0".to_string());

        let port =
            SerialPort::open_with_settings(native.clone(), &settings, "console", Mode::READ_WRITE)
                .unwrap();

        assert_eq!(port.name().unwrap(), "/dev/ttyS0");
        assert_eq!(port.state(), PortState::Open(Mode::READ_WRITE));
        assert_eq!(port.baudrate().unwrap(), 19_200);
        assert_eq!(port.bits().unwrap(), 7);
        assert_eq!(port.parity().unwrap(), Parity::Even);
        assert_eq!(port.stopbits().unwrap(), 2);
        assert_eq!(native.live_configs(), 0);
    }

    #[test]
    fn test_open_with_settings_closes_port_on_config_failure() {
        let native = loopback();
        native.fail_next("sp_set_config", Fault::os(5, "Input/output error"));

        let err = SerialPort::open_with_settings(
            native.clone(),
            &SerialSettings::default(),
            "/dev/ttyS0",
            Mode::READ_WRITE,
        )
        .unwrap_err();

        assert_eq!(
            err,
            SerialError::Os {
                code: 5,
                message: "Input/output error".to_string()
            }
        );
        assert_eq!(native.call_count("sp_close"), 1);
        assert_eq!(native.live_ports(), 0);
        assert_eq!(native.live_configs(), 0);
    }

    #[test]
    fn test_direct_setters_reach_device() {
        let native = loopback();
        let mut port = SerialPort::by_name(native.clone(), "/dev/ttyS0").unwrap();
        port.open(Mode::READ_WRITE).unwrap();

        port.set_baudrate(57_600).unwrap();
        port.set_parity(Parity::Odd).unwrap();
        port.set_flowcontrol(FlowControl::DtrDsr).unwrap();

        assert_eq!(port.baudrate().unwrap(), 57_600);
        assert_eq!(port.parity().unwrap(), Parity::Odd);
        assert_eq!(port.dtr().unwrap(), Dtr::FlowControl);
        assert_eq!(port.dsr().unwrap(), Dsr::FlowControl);
        assert_eq!(native.line_settings("/dev/ttyS0").unwrap().baudrate, 57_600);
    }

    #[test]
    fn test_invalid_data_bits_rejected() {
        let mut port = SerialPort::by_name(loopback(), "/dev/ttyS0").unwrap();
        port.open(Mode::READ_WRITE).unwrap();
        assert!(matches!(port.set_bits(3), Err(SerialError::Argument(_))));
        assert_eq!(port.bits().unwrap(), 8);
    }

    #[test]
    fn test_direct_getter_frees_temporary_config() {
        let native = loopback();
        let mut port = SerialPort::by_name(native.clone(), "/dev/ttyS0").unwrap();
        port.open(Mode::READ_WRITE).unwrap();

        assert_eq!(port.stopbits().unwrap(), 1);
        assert_eq!(native.live_configs(), 0);
    }

    #[test]
    fn test_read_next_returns_early() {
        let native = loopback();
        let mut port = SerialPort::by_name(native.clone(), "/dev/ttyS0").unwrap();
        port.open(Mode::READ_WRITE).unwrap();
        native.push_rx("/dev/ttyS0", b"ok");

        let mut buf = [0u8; 16];
        let n = port.blocking_read_next(&mut buf, 0).unwrap();
        assert_eq!(&buf[..n], b"ok");
    }

    #[test]
    fn test_blocking_read_times_out_with_short_count() {
        let native = loopback();
        let mut port = SerialPort::by_name(native.clone(), "/dev/ttyS0").unwrap();
        port.open(Mode::READ_WRITE).unwrap();
        native.push_rx("/dev/ttyS0", b"abc");

        let mut buf = [0u8; 8];
        assert_eq!(port.blocking_read(&mut buf, 50).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn test_flush_and_waiting_counts() {
        let native = loopback();
        let mut port = SerialPort::by_name(native.clone(), "/dev/ttyS0").unwrap();
        port.open(Mode::READ_WRITE).unwrap();

        port.nonblocking_write(b"12345").unwrap();
        assert_eq!(port.input_waiting().unwrap(), 5);
        assert_eq!(port.output_waiting().unwrap(), 0);

        port.flush(Buffers::BOTH).unwrap();
        assert_eq!(port.input_waiting().unwrap(), 0);
        port.drain().unwrap();
    }

    #[test]
    fn test_signals_and_break() {
        let native = MockNative::new().with_device(
            MockDevice::native("COM2").with_signals(Signals::CTS | Signals::DSR),
        );
        let mut port = SerialPort::by_name(native.clone(), "COM2").unwrap();
        port.open(Mode::READ_WRITE).unwrap();

        assert_eq!(port.signals().unwrap(), Signals::CTS | Signals::DSR);

        port.start_break().unwrap();
        assert!(native.break_active("COM2"));
        port.end_break().unwrap();
        assert!(!native.break_active("COM2"));
    }

    #[test]
    fn test_list_ports_copies_and_frees_list() {
        let native = MockNative::new()
            .with_device(MockDevice::native("/dev/ttyS0"))
            .with_device(MockDevice::native("/dev/ttyS1"));

        let ports = list_ports(native.clone()).unwrap();
        let names: Vec<String> = ports.iter().map(|p| p.name().unwrap()).collect();

        assert_eq!(names, vec!["/dev/ttyS0", "/dev/ttyS1"]);
        assert_eq!(native.live_port_lists(), 0);
        assert_eq!(native.live_ports(), 2);

        drop(ports);
        assert_eq!(native.live_ports(), 0);
    }

    #[test]
    fn test_list_ports_frees_list_when_copy_fails() {
        let native = MockNative::new()
            .with_device(MockDevice::native("/dev/ttyS0"))
            .with_device(MockDevice::native("/dev/ttyS1"));
        native.fail_next("sp_copy_port", Fault::Return(SP_ERR_MEM));

        assert_eq!(list_ports(native.clone()).unwrap_err(), SerialError::ResourceExhausted);
        assert_eq!(native.live_port_lists(), 0);
        assert_eq!(native.live_ports(), 0);
        assert_eq!(native.invalid_frees(), 0);
    }
}
