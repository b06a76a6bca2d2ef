//! Native call surface.
//!
//! Declares the opaque libserialport structures, the integer constants of the
//! C ABI, and the [`NativeApi`] trait through which every native call is made.
//! The trait lets the real library ([`Libserialport`], behind the
//! `libserialport` feature) and the instrumented fake ([`MockNative`]) be used
//! interchangeably by the safe wrappers.

#![allow(non_camel_case_types)]

#[cfg(feature = "libserialport")]
pub mod libserialport;
pub mod mock;

#[cfg(feature = "libserialport")]
pub use libserialport::Libserialport;
pub use mock::{Fault, MockDevice, MockNative};

use std::ffi::{c_char, c_int, c_uint, c_void};
use std::marker::{PhantomData, PhantomPinned};

/// Opaque `struct sp_port`.
#[repr(C)]
pub struct sp_port {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Opaque `struct sp_port_config`.
#[repr(C)]
pub struct sp_port_config {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Opaque `struct sp_event_set`. Only ever handled by pointer.
#[repr(C)]
pub struct sp_event_set {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

// enum sp_return
pub const SP_OK: c_int = 0;
pub const SP_ERR_ARG: c_int = -1;
pub const SP_ERR_FAIL: c_int = -2;
pub const SP_ERR_MEM: c_int = -3;
pub const SP_ERR_SUPP: c_int = -4;

// enum sp_mode
pub const SP_MODE_READ: c_int = 1;
pub const SP_MODE_WRITE: c_int = 2;
pub const SP_MODE_READ_WRITE: c_int = 3;

// enum sp_event
pub const SP_EVENT_RX_READY: c_int = 1;
pub const SP_EVENT_TX_READY: c_int = 2;
pub const SP_EVENT_ERROR: c_int = 4;

// enum sp_buffer
pub const SP_BUF_INPUT: c_int = 1;
pub const SP_BUF_OUTPUT: c_int = 2;
pub const SP_BUF_BOTH: c_int = 3;

// enum sp_parity
pub const SP_PARITY_INVALID: c_int = -1;
pub const SP_PARITY_NONE: c_int = 0;
pub const SP_PARITY_ODD: c_int = 1;
pub const SP_PARITY_EVEN: c_int = 2;
pub const SP_PARITY_MARK: c_int = 3;
pub const SP_PARITY_SPACE: c_int = 4;

// enum sp_rts
pub const SP_RTS_INVALID: c_int = -1;
pub const SP_RTS_OFF: c_int = 0;
pub const SP_RTS_ON: c_int = 1;
pub const SP_RTS_FLOW_CONTROL: c_int = 2;

// enum sp_cts
pub const SP_CTS_INVALID: c_int = -1;
pub const SP_CTS_IGNORE: c_int = 0;
pub const SP_CTS_FLOW_CONTROL: c_int = 1;

// enum sp_dtr
pub const SP_DTR_INVALID: c_int = -1;
pub const SP_DTR_OFF: c_int = 0;
pub const SP_DTR_ON: c_int = 1;
pub const SP_DTR_FLOW_CONTROL: c_int = 2;

// enum sp_dsr
pub const SP_DSR_INVALID: c_int = -1;
pub const SP_DSR_IGNORE: c_int = 0;
pub const SP_DSR_FLOW_CONTROL: c_int = 1;

// enum sp_xonxoff
pub const SP_XONXOFF_INVALID: c_int = -1;
pub const SP_XONXOFF_DISABLED: c_int = 0;
pub const SP_XONXOFF_IN: c_int = 1;
pub const SP_XONXOFF_OUT: c_int = 2;
pub const SP_XONXOFF_INOUT: c_int = 3;

// enum sp_flowcontrol
pub const SP_FLOWCONTROL_NONE: c_int = 0;
pub const SP_FLOWCONTROL_XONXOFF: c_int = 1;
pub const SP_FLOWCONTROL_RTSCTS: c_int = 2;
pub const SP_FLOWCONTROL_DTRDSR: c_int = 3;

// enum sp_signal
pub const SP_SIG_CTS: c_int = 1;
pub const SP_SIG_DSR: c_int = 2;
pub const SP_SIG_DCD: c_int = 4;
pub const SP_SIG_RI: c_int = 8;

// enum sp_transport
pub const SP_TRANSPORT_NATIVE: c_int = 0;
pub const SP_TRANSPORT_USB: c_int = 1;
pub const SP_TRANSPORT_BLUETOOTH: c_int = 2;

/// Sentinel used for integer config fields (baud rate, bits, stop bits)
/// that should be left unchanged when a config is applied.
pub const SP_CONFIG_UNSET: c_int = -1;

/// Platform handle written by `sp_get_port_handle`.
#[cfg(unix)]
pub type OsHandle = std::os::fd::RawFd;
/// Platform handle written by `sp_get_port_handle`.
#[cfg(windows)]
pub type OsHandle = std::os::windows::io::RawHandle;

/// The libserialport C ABI, one method per entry point.
///
/// Methods mirror the C signatures exactly: allocation calls write through an
/// out-pointer and return an `sp_return` code, I/O calls return a byte count
/// or a negative code, and string getters return pointers owned by the port
/// structure.
///
/// # Safety
///
/// Implementors must honour the libserialport contract: on any negative
/// return an allocation call leaves its out-pointer null, the last-error
/// record queried by [`last_error_code`](Self::last_error_code) and
/// [`last_error_message`](Self::last_error_message) reflects the most recent
/// failing call on the calling thread, and strings returned from port getters
/// stay valid until that port is freed.
///
/// Callers of every method must pass pointers previously produced by the same
/// backend and not yet freed, and buffers valid for `count` bytes.
#[allow(clippy::missing_safety_doc)]
pub unsafe trait NativeApi: std::fmt::Debug {
    // Port enumeration
    unsafe fn get_port_by_name(&self, portname: *const c_char, port_ptr: *mut *mut sp_port)
        -> c_int;
    unsafe fn free_port(&self, port: *mut sp_port);
    unsafe fn list_ports(&self, list_ptr: *mut *mut *mut sp_port) -> c_int;
    unsafe fn copy_port(&self, port: *const sp_port, copy_ptr: *mut *mut sp_port) -> c_int;
    unsafe fn free_port_list(&self, ports: *mut *mut sp_port);

    // Opening, closing and querying ports
    unsafe fn open(&self, port: *mut sp_port, flags: c_int) -> c_int;
    unsafe fn close(&self, port: *mut sp_port) -> c_int;
    unsafe fn get_port_name(&self, port: *const sp_port) -> *const c_char;
    unsafe fn get_port_description(&self, port: *const sp_port) -> *const c_char;
    unsafe fn get_port_transport(&self, port: *const sp_port) -> c_int;
    unsafe fn get_port_usb_bus_address(
        &self,
        port: *const sp_port,
        usb_bus: *mut c_int,
        usb_address: *mut c_int,
    ) -> c_int;
    unsafe fn get_port_usb_vid_pid(
        &self,
        port: *const sp_port,
        usb_vid: *mut c_int,
        usb_pid: *mut c_int,
    ) -> c_int;
    unsafe fn get_port_usb_manufacturer(&self, port: *const sp_port) -> *const c_char;
    unsafe fn get_port_usb_product(&self, port: *const sp_port) -> *const c_char;
    unsafe fn get_port_usb_serial(&self, port: *const sp_port) -> *const c_char;
    unsafe fn get_port_bluetooth_address(&self, port: *const sp_port) -> *const c_char;
    unsafe fn get_port_handle(&self, port: *const sp_port, result_ptr: *mut c_void) -> c_int;

    // Configuration
    unsafe fn new_config(&self, config_ptr: *mut *mut sp_port_config) -> c_int;
    unsafe fn free_config(&self, config: *mut sp_port_config);
    unsafe fn get_config(&self, port: *mut sp_port, config: *mut sp_port_config) -> c_int;
    unsafe fn set_config(&self, port: *mut sp_port, config: *const sp_port_config) -> c_int;
    unsafe fn set_baudrate(&self, port: *mut sp_port, baudrate: c_int) -> c_int;
    unsafe fn get_config_baudrate(&self, config: *const sp_port_config, baudrate_ptr: *mut c_int)
        -> c_int;
    unsafe fn set_config_baudrate(&self, config: *mut sp_port_config, baudrate: c_int) -> c_int;
    unsafe fn set_bits(&self, port: *mut sp_port, bits: c_int) -> c_int;
    unsafe fn get_config_bits(&self, config: *const sp_port_config, bits_ptr: *mut c_int) -> c_int;
    unsafe fn set_config_bits(&self, config: *mut sp_port_config, bits: c_int) -> c_int;
    unsafe fn set_parity(&self, port: *mut sp_port, parity: c_int) -> c_int;
    unsafe fn get_config_parity(&self, config: *const sp_port_config, parity_ptr: *mut c_int)
        -> c_int;
    unsafe fn set_config_parity(&self, config: *mut sp_port_config, parity: c_int) -> c_int;
    unsafe fn set_stopbits(&self, port: *mut sp_port, stopbits: c_int) -> c_int;
    unsafe fn get_config_stopbits(&self, config: *const sp_port_config, stopbits_ptr: *mut c_int)
        -> c_int;
    unsafe fn set_config_stopbits(&self, config: *mut sp_port_config, stopbits: c_int) -> c_int;
    unsafe fn set_rts(&self, port: *mut sp_port, rts: c_int) -> c_int;
    unsafe fn get_config_rts(&self, config: *const sp_port_config, rts_ptr: *mut c_int) -> c_int;
    unsafe fn set_config_rts(&self, config: *mut sp_port_config, rts: c_int) -> c_int;
    unsafe fn set_cts(&self, port: *mut sp_port, cts: c_int) -> c_int;
    unsafe fn get_config_cts(&self, config: *const sp_port_config, cts_ptr: *mut c_int) -> c_int;
    unsafe fn set_config_cts(&self, config: *mut sp_port_config, cts: c_int) -> c_int;
    unsafe fn set_dtr(&self, port: *mut sp_port, dtr: c_int) -> c_int;
    unsafe fn get_config_dtr(&self, config: *const sp_port_config, dtr_ptr: *mut c_int) -> c_int;
    unsafe fn set_config_dtr(&self, config: *mut sp_port_config, dtr: c_int) -> c_int;
    unsafe fn set_dsr(&self, port: *mut sp_port, dsr: c_int) -> c_int;
    unsafe fn get_config_dsr(&self, config: *const sp_port_config, dsr_ptr: *mut c_int) -> c_int;
    unsafe fn set_config_dsr(&self, config: *mut sp_port_config, dsr: c_int) -> c_int;
    unsafe fn set_xon_xoff(&self, port: *mut sp_port, xon_xoff: c_int) -> c_int;
    unsafe fn get_config_xon_xoff(&self, config: *const sp_port_config, xon_xoff_ptr: *mut c_int)
        -> c_int;
    unsafe fn set_config_xon_xoff(&self, config: *mut sp_port_config, xon_xoff: c_int) -> c_int;
    unsafe fn set_config_flowcontrol(&self, config: *mut sp_port_config, flowcontrol: c_int)
        -> c_int;
    unsafe fn set_flowcontrol(&self, port: *mut sp_port, flowcontrol: c_int) -> c_int;

    // Reading, writing and flushing data
    unsafe fn blocking_read(
        &self,
        port: *mut sp_port,
        buf: *mut c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int;
    unsafe fn blocking_read_next(
        &self,
        port: *mut sp_port,
        buf: *mut c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int;
    unsafe fn nonblocking_read(&self, port: *mut sp_port, buf: *mut c_void, count: usize) -> c_int;
    unsafe fn blocking_write(
        &self,
        port: *mut sp_port,
        buf: *const c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int;
    unsafe fn nonblocking_write(&self, port: *mut sp_port, buf: *const c_void, count: usize)
        -> c_int;
    unsafe fn input_waiting(&self, port: *mut sp_port) -> c_int;
    unsafe fn output_waiting(&self, port: *mut sp_port) -> c_int;
    unsafe fn flush(&self, port: *mut sp_port, buffers: c_int) -> c_int;
    unsafe fn drain(&self, port: *mut sp_port) -> c_int;

    // Waiting for events
    unsafe fn new_event_set(&self, result_ptr: *mut *mut sp_event_set) -> c_int;
    unsafe fn add_port_events(
        &self,
        event_set: *mut sp_event_set,
        port: *const sp_port,
        mask: c_int,
    ) -> c_int;
    unsafe fn wait(&self, event_set: *mut sp_event_set, timeout_ms: c_uint) -> c_int;
    unsafe fn free_event_set(&self, event_set: *mut sp_event_set);

    // Signals
    unsafe fn get_signals(&self, port: *mut sp_port, signal_mask: *mut c_int) -> c_int;
    unsafe fn start_break(&self, port: *mut sp_port) -> c_int;
    unsafe fn end_break(&self, port: *mut sp_port) -> c_int;

    // Errors
    unsafe fn last_error_code(&self) -> c_int;
    unsafe fn last_error_message(&self) -> *mut c_char;
    unsafe fn free_error_message(&self, message: *mut c_char);

    // Versions
    unsafe fn get_major_package_version(&self) -> c_int;
    unsafe fn get_minor_package_version(&self) -> c_int;
    unsafe fn get_micro_package_version(&self) -> c_int;
    unsafe fn get_package_version_string(&self) -> *const c_char;
    unsafe fn get_current_lib_version(&self) -> c_int;
    unsafe fn get_revision_lib_version(&self) -> c_int;
    unsafe fn get_age_lib_version(&self) -> c_int;
    unsafe fn get_lib_version_string(&self) -> *const c_char;
}
