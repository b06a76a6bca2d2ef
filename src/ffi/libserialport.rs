//! The real libserialport backend.
//!
//! Links against the system `libserialport` and forwards every
//! [`NativeApi`] method to the matching C entry point. Library discovery is
//! left to the platform linker.

use super::{sp_event_set, sp_port, sp_port_config, NativeApi};
use std::ffi::{c_char, c_int, c_uint, c_void};

#[link(name = "serialport")]
extern "C" {
    fn sp_get_port_by_name(portname: *const c_char, port_ptr: *mut *mut sp_port) -> c_int;
    fn sp_free_port(port: *mut sp_port);
    fn sp_list_ports(list_ptr: *mut *mut *mut sp_port) -> c_int;
    fn sp_copy_port(port: *const sp_port, copy_ptr: *mut *mut sp_port) -> c_int;
    fn sp_free_port_list(ports: *mut *mut sp_port);
    fn sp_open(port: *mut sp_port, flags: c_int) -> c_int;
    fn sp_close(port: *mut sp_port) -> c_int;
    fn sp_get_port_name(port: *const sp_port) -> *const c_char;
    fn sp_get_port_description(port: *const sp_port) -> *const c_char;
    fn sp_get_port_transport(port: *const sp_port) -> c_int;
    fn sp_get_port_usb_bus_address(
        port: *const sp_port,
        usb_bus: *mut c_int,
        usb_address: *mut c_int,
    ) -> c_int;
    fn sp_get_port_usb_vid_pid(
        port: *const sp_port,
        usb_vid: *mut c_int,
        usb_pid: *mut c_int,
    ) -> c_int;
    fn sp_get_port_usb_manufacturer(port: *const sp_port) -> *const c_char;
    fn sp_get_port_usb_product(port: *const sp_port) -> *const c_char;
    fn sp_get_port_usb_serial(port: *const sp_port) -> *const c_char;
    fn sp_get_port_bluetooth_address(port: *const sp_port) -> *const c_char;
    fn sp_get_port_handle(port: *const sp_port, result_ptr: *mut c_void) -> c_int;
    fn sp_new_config(config_ptr: *mut *mut sp_port_config) -> c_int;
    fn sp_free_config(config: *mut sp_port_config);
    fn sp_get_config(port: *mut sp_port, config: *mut sp_port_config) -> c_int;
    fn sp_set_config(port: *mut sp_port, config: *const sp_port_config) -> c_int;
    fn sp_set_baudrate(port: *mut sp_port, baudrate: c_int) -> c_int;
    fn sp_get_config_baudrate(config: *const sp_port_config, baudrate_ptr: *mut c_int) -> c_int;
    fn sp_set_config_baudrate(config: *mut sp_port_config, baudrate: c_int) -> c_int;
    fn sp_set_bits(port: *mut sp_port, bits: c_int) -> c_int;
    fn sp_get_config_bits(config: *const sp_port_config, bits_ptr: *mut c_int) -> c_int;
    fn sp_set_config_bits(config: *mut sp_port_config, bits: c_int) -> c_int;
    fn sp_set_parity(port: *mut sp_port, parity: c_int) -> c_int;
    fn sp_get_config_parity(config: *const sp_port_config, parity_ptr: *mut c_int) -> c_int;
    fn sp_set_config_parity(config: *mut sp_port_config, parity: c_int) -> c_int;
    fn sp_set_stopbits(port: *mut sp_port, stopbits: c_int) -> c_int;
    fn sp_get_config_stopbits(config: *const sp_port_config, stopbits_ptr: *mut c_int) -> c_int;
    fn sp_set_config_stopbits(config: *mut sp_port_config, stopbits: c_int) -> c_int;
    fn sp_set_rts(port: *mut sp_port, rts: c_int) -> c_int;
    fn sp_get_config_rts(config: *const sp_port_config, rts_ptr: *mut c_int) -> c_int;
    fn sp_set_config_rts(config: *mut sp_port_config, rts: c_int) -> c_int;
    fn sp_set_cts(port: *mut sp_port, cts: c_int) -> c_int;
    fn sp_get_config_cts(config: *const sp_port_config, cts_ptr: *mut c_int) -> c_int;
    fn sp_set_config_cts(config: *mut sp_port_config, cts: c_int) -> c_int;
    fn sp_set_dtr(port: *mut sp_port, dtr: c_int) -> c_int;
    fn sp_get_config_dtr(config: *const sp_port_config, dtr_ptr: *mut c_int) -> c_int;
    fn sp_set_config_dtr(config: *mut sp_port_config, dtr: c_int) -> c_int;
    fn sp_set_dsr(port: *mut sp_port, dsr: c_int) -> c_int;
    fn sp_get_config_dsr(config: *const sp_port_config, dsr_ptr: *mut c_int) -> c_int;
    fn sp_set_config_dsr(config: *mut sp_port_config, dsr: c_int) -> c_int;
    fn sp_set_xon_xoff(port: *mut sp_port, xon_xoff: c_int) -> c_int;
    fn sp_get_config_xon_xoff(config: *const sp_port_config, xon_xoff_ptr: *mut c_int) -> c_int;
    fn sp_set_config_xon_xoff(config: *mut sp_port_config, xon_xoff: c_int) -> c_int;
    fn sp_set_config_flowcontrol(config: *mut sp_port_config, flowcontrol: c_int) -> c_int;
    fn sp_set_flowcontrol(port: *mut sp_port, flowcontrol: c_int) -> c_int;
    fn sp_blocking_read(
        port: *mut sp_port,
        buf: *mut c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int;
    fn sp_blocking_read_next(
        port: *mut sp_port,
        buf: *mut c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int;
    fn sp_nonblocking_read(port: *mut sp_port, buf: *mut c_void, count: usize) -> c_int;
    fn sp_blocking_write(
        port: *mut sp_port,
        buf: *const c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int;
    fn sp_nonblocking_write(port: *mut sp_port, buf: *const c_void, count: usize) -> c_int;
    fn sp_input_waiting(port: *mut sp_port) -> c_int;
    fn sp_output_waiting(port: *mut sp_port) -> c_int;
    fn sp_flush(port: *mut sp_port, buffers: c_int) -> c_int;
    fn sp_drain(port: *mut sp_port) -> c_int;
    fn sp_new_event_set(result_ptr: *mut *mut sp_event_set) -> c_int;
    fn sp_add_port_events(event_set: *mut sp_event_set, port: *const sp_port, mask: c_int) -> c_int;
    fn sp_wait(event_set: *mut sp_event_set, timeout_ms: c_uint) -> c_int;
    fn sp_free_event_set(event_set: *mut sp_event_set);
    fn sp_get_signals(port: *mut sp_port, signal_mask: *mut c_int) -> c_int;
    fn sp_start_break(port: *mut sp_port) -> c_int;
    fn sp_end_break(port: *mut sp_port) -> c_int;
    fn sp_last_error_code() -> c_int;
    fn sp_last_error_message() -> *mut c_char;
    fn sp_free_error_message(message: *mut c_char);
    fn sp_get_major_package_version() -> c_int;
    fn sp_get_minor_package_version() -> c_int;
    fn sp_get_micro_package_version() -> c_int;
    fn sp_get_package_version_string() -> *const c_char;
    fn sp_get_current_lib_version() -> c_int;
    fn sp_get_revision_lib_version() -> c_int;
    fn sp_get_age_lib_version() -> c_int;
    fn sp_get_lib_version_string() -> *const c_char;
}

/// Zero-sized handle to the system libserialport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Libserialport;

// SAFETY: forwards straight to libserialport, whose contract is the one
// documented on `NativeApi`.
unsafe impl NativeApi for Libserialport {
    unsafe fn get_port_by_name(
        &self,
        portname: *const c_char,
        port_ptr: *mut *mut sp_port,
    ) -> c_int {
        sp_get_port_by_name(portname, port_ptr)
    }

    unsafe fn free_port(&self, port: *mut sp_port) {
        sp_free_port(port)
    }

    unsafe fn list_ports(&self, list_ptr: *mut *mut *mut sp_port) -> c_int {
        sp_list_ports(list_ptr)
    }

    unsafe fn copy_port(&self, port: *const sp_port, copy_ptr: *mut *mut sp_port) -> c_int {
        sp_copy_port(port, copy_ptr)
    }

    unsafe fn free_port_list(&self, ports: *mut *mut sp_port) {
        sp_free_port_list(ports)
    }

    unsafe fn open(&self, port: *mut sp_port, flags: c_int) -> c_int {
        sp_open(port, flags)
    }

    unsafe fn close(&self, port: *mut sp_port) -> c_int {
        sp_close(port)
    }

    unsafe fn get_port_name(&self, port: *const sp_port) -> *const c_char {
        sp_get_port_name(port)
    }

    unsafe fn get_port_description(&self, port: *const sp_port) -> *const c_char {
        sp_get_port_description(port)
    }

    unsafe fn get_port_transport(&self, port: *const sp_port) -> c_int {
        sp_get_port_transport(port)
    }

    unsafe fn get_port_usb_bus_address(
        &self,
        port: *const sp_port,
        usb_bus: *mut c_int,
        usb_address: *mut c_int,
    ) -> c_int {
        sp_get_port_usb_bus_address(port, usb_bus, usb_address)
    }

    unsafe fn get_port_usb_vid_pid(
        &self,
        port: *const sp_port,
        usb_vid: *mut c_int,
        usb_pid: *mut c_int,
    ) -> c_int {
        sp_get_port_usb_vid_pid(port, usb_vid, usb_pid)
    }

    unsafe fn get_port_usb_manufacturer(&self, port: *const sp_port) -> *const c_char {
        sp_get_port_usb_manufacturer(port)
    }

    unsafe fn get_port_usb_product(&self, port: *const sp_port) -> *const c_char {
        sp_get_port_usb_product(port)
    }

    unsafe fn get_port_usb_serial(&self, port: *const sp_port) -> *const c_char {
        sp_get_port_usb_serial(port)
    }

    unsafe fn get_port_bluetooth_address(&self, port: *const sp_port) -> *const c_char {
        sp_get_port_bluetooth_address(port)
    }

    unsafe fn get_port_handle(&self, port: *const sp_port, result_ptr: *mut c_void) -> c_int {
        sp_get_port_handle(port, result_ptr)
    }

    unsafe fn new_config(&self, config_ptr: *mut *mut sp_port_config) -> c_int {
        sp_new_config(config_ptr)
    }

    unsafe fn free_config(&self, config: *mut sp_port_config) {
        sp_free_config(config)
    }

    unsafe fn get_config(&self, port: *mut sp_port, config: *mut sp_port_config) -> c_int {
        sp_get_config(port, config)
    }

    unsafe fn set_config(&self, port: *mut sp_port, config: *const sp_port_config) -> c_int {
        sp_set_config(port, config)
    }

    unsafe fn set_baudrate(&self, port: *mut sp_port, baudrate: c_int) -> c_int {
        sp_set_baudrate(port, baudrate)
    }

    unsafe fn get_config_baudrate(
        &self,
        config: *const sp_port_config,
        baudrate_ptr: *mut c_int,
    ) -> c_int {
        sp_get_config_baudrate(config, baudrate_ptr)
    }

    unsafe fn set_config_baudrate(&self, config: *mut sp_port_config, baudrate: c_int) -> c_int {
        sp_set_config_baudrate(config, baudrate)
    }

    unsafe fn set_bits(&self, port: *mut sp_port, bits: c_int) -> c_int {
        sp_set_bits(port, bits)
    }

    unsafe fn get_config_bits(&self, config: *const sp_port_config, bits_ptr: *mut c_int) -> c_int {
        sp_get_config_bits(config, bits_ptr)
    }

    unsafe fn set_config_bits(&self, config: *mut sp_port_config, bits: c_int) -> c_int {
        sp_set_config_bits(config, bits)
    }

    unsafe fn set_parity(&self, port: *mut sp_port, parity: c_int) -> c_int {
        sp_set_parity(port, parity)
    }

    unsafe fn get_config_parity(
        &self,
        config: *const sp_port_config,
        parity_ptr: *mut c_int,
    ) -> c_int {
        sp_get_config_parity(config, parity_ptr)
    }

    unsafe fn set_config_parity(&self, config: *mut sp_port_config, parity: c_int) -> c_int {
        sp_set_config_parity(config, parity)
    }

    unsafe fn set_stopbits(&self, port: *mut sp_port, stopbits: c_int) -> c_int {
        sp_set_stopbits(port, stopbits)
    }

    unsafe fn get_config_stopbits(
        &self,
        config: *const sp_port_config,
        stopbits_ptr: *mut c_int,
    ) -> c_int {
        sp_get_config_stopbits(config, stopbits_ptr)
    }

    unsafe fn set_config_stopbits(&self, config: *mut sp_port_config, stopbits: c_int) -> c_int {
        sp_set_config_stopbits(config, stopbits)
    }

    unsafe fn set_rts(&self, port: *mut sp_port, rts: c_int) -> c_int {
        sp_set_rts(port, rts)
    }

    unsafe fn get_config_rts(&self, config: *const sp_port_config, rts_ptr: *mut c_int) -> c_int {
        sp_get_config_rts(config, rts_ptr)
    }

    unsafe fn set_config_rts(&self, config: *mut sp_port_config, rts: c_int) -> c_int {
        sp_set_config_rts(config, rts)
    }

    unsafe fn set_cts(&self, port: *mut sp_port, cts: c_int) -> c_int {
        sp_set_cts(port, cts)
    }

    unsafe fn get_config_cts(&self, config: *const sp_port_config, cts_ptr: *mut c_int) -> c_int {
        sp_get_config_cts(config, cts_ptr)
    }

    unsafe fn set_config_cts(&self, config: *mut sp_port_config, cts: c_int) -> c_int {
        sp_set_config_cts(config, cts)
    }

    unsafe fn set_dtr(&self, port: *mut sp_port, dtr: c_int) -> c_int {
        sp_set_dtr(port, dtr)
    }

    unsafe fn get_config_dtr(&self, config: *const sp_port_config, dtr_ptr: *mut c_int) -> c_int {
        sp_get_config_dtr(config, dtr_ptr)
    }

    unsafe fn set_config_dtr(&self, config: *mut sp_port_config, dtr: c_int) -> c_int {
        sp_set_config_dtr(config, dtr)
    }

    unsafe fn set_dsr(&self, port: *mut sp_port, dsr: c_int) -> c_int {
        sp_set_dsr(port, dsr)
    }

    unsafe fn get_config_dsr(&self, config: *const sp_port_config, dsr_ptr: *mut c_int) -> c_int {
        sp_get_config_dsr(config, dsr_ptr)
    }

    unsafe fn set_config_dsr(&self, config: *mut sp_port_config, dsr: c_int) -> c_int {
        sp_set_config_dsr(config, dsr)
    }

    unsafe fn set_xon_xoff(&self, port: *mut sp_port, xon_xoff: c_int) -> c_int {
        sp_set_xon_xoff(port, xon_xoff)
    }

    unsafe fn get_config_xon_xoff(
        &self,
        config: *const sp_port_config,
        xon_xoff_ptr: *mut c_int,
    ) -> c_int {
        sp_get_config_xon_xoff(config, xon_xoff_ptr)
    }

    unsafe fn set_config_xon_xoff(&self, config: *mut sp_port_config, xon_xoff: c_int) -> c_int {
        sp_set_config_xon_xoff(config, xon_xoff)
    }

    unsafe fn set_config_flowcontrol(
        &self,
        config: *mut sp_port_config,
        flowcontrol: c_int,
    ) -> c_int {
        sp_set_config_flowcontrol(config, flowcontrol)
    }

    unsafe fn set_flowcontrol(&self, port: *mut sp_port, flowcontrol: c_int) -> c_int {
        sp_set_flowcontrol(port, flowcontrol)
    }

    unsafe fn blocking_read(
        &self,
        port: *mut sp_port,
        buf: *mut c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int {
        sp_blocking_read(port, buf, count, timeout_ms)
    }

    unsafe fn blocking_read_next(
        &self,
        port: *mut sp_port,
        buf: *mut c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int {
        sp_blocking_read_next(port, buf, count, timeout_ms)
    }

    unsafe fn nonblocking_read(&self, port: *mut sp_port, buf: *mut c_void, count: usize) -> c_int {
        sp_nonblocking_read(port, buf, count)
    }

    unsafe fn blocking_write(
        &self,
        port: *mut sp_port,
        buf: *const c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int {
        sp_blocking_write(port, buf, count, timeout_ms)
    }

    unsafe fn nonblocking_write(
        &self,
        port: *mut sp_port,
        buf: *const c_void,
        count: usize,
    ) -> c_int {
        sp_nonblocking_write(port, buf, count)
    }

    unsafe fn input_waiting(&self, port: *mut sp_port) -> c_int {
        sp_input_waiting(port)
    }

    unsafe fn output_waiting(&self, port: *mut sp_port) -> c_int {
        sp_output_waiting(port)
    }

    unsafe fn flush(&self, port: *mut sp_port, buffers: c_int) -> c_int {
        sp_flush(port, buffers)
    }

    unsafe fn drain(&self, port: *mut sp_port) -> c_int {
        sp_drain(port)
    }

    unsafe fn new_event_set(&self, result_ptr: *mut *mut sp_event_set) -> c_int {
        sp_new_event_set(result_ptr)
    }

    unsafe fn add_port_events(
        &self,
        event_set: *mut sp_event_set,
        port: *const sp_port,
        mask: c_int,
    ) -> c_int {
        sp_add_port_events(event_set, port, mask)
    }

    unsafe fn wait(&self, event_set: *mut sp_event_set, timeout_ms: c_uint) -> c_int {
        sp_wait(event_set, timeout_ms)
    }

    unsafe fn free_event_set(&self, event_set: *mut sp_event_set) {
        sp_free_event_set(event_set)
    }

    unsafe fn get_signals(&self, port: *mut sp_port, signal_mask: *mut c_int) -> c_int {
        sp_get_signals(port, signal_mask)
    }

    unsafe fn start_break(&self, port: *mut sp_port) -> c_int {
        sp_start_break(port)
    }

    unsafe fn end_break(&self, port: *mut sp_port) -> c_int {
        sp_end_break(port)
    }

    unsafe fn last_error_code(&self) -> c_int {
        sp_last_error_code()
    }

    unsafe fn last_error_message(&self) -> *mut c_char {
        sp_last_error_message()
    }

    unsafe fn free_error_message(&self, message: *mut c_char) {
        sp_free_error_message(message)
    }

    unsafe fn get_major_package_version(&self) -> c_int {
        sp_get_major_package_version()
    }

    unsafe fn get_minor_package_version(&self) -> c_int {
        sp_get_minor_package_version()
    }

    unsafe fn get_micro_package_version(&self) -> c_int {
        sp_get_micro_package_version()
    }

    unsafe fn get_package_version_string(&self) -> *const c_char {
        sp_get_package_version_string()
    }

    unsafe fn get_current_lib_version(&self) -> c_int {
        sp_get_current_lib_version()
    }

    unsafe fn get_revision_lib_version(&self) -> c_int {
        sp_get_revision_lib_version()
    }

    unsafe fn get_age_lib_version(&self) -> c_int {
        sp_get_age_lib_version()
    }

    unsafe fn get_lib_version_string(&self) -> *const c_char {
        sp_get_lib_version_string()
    }
}
