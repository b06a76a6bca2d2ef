//! Shared test utilities.
//!
//! Builders for simulated devices and assertions over the fake backend's
//! bookkeeping.

#![allow(dead_code)]

use libserialport_bind::ffi::{MockDevice, MockNative};
use libserialport_bind::{Mode, Parity, SerialPort};

/// Line settings grid exercised by the configuration round-trip tests:
/// (baud, data bits, parity, stop bits).
pub const LINE_GRID: [(u32, u8, Parity, u8); 3] = [
    (9600, 8, Parity::None, 1),
    (115_200, 8, Parity::None, 1),
    (9600, 7, Parity::Even, 2),
];

/// A fake library with one device whose TX is wired to its own RX.
pub fn loopback_native(name: &str) -> MockNative {
    MockNative::new().with_device(MockDevice::native(name).with_loopback())
}

/// A fake library with two devices joined by a null-modem cable.
pub fn null_modem_native(a: &str, b: &str) -> MockNative {
    let native = MockNative::new()
        .with_device(MockDevice::native(a))
        .with_device(MockDevice::native(b));
    native.connect(a, b);
    native
}

/// Look up and open a port read+write.
pub fn open_port(native: &MockNative, name: &str) -> SerialPort<MockNative> {
    let mut port = SerialPort::by_name(native.clone(), name).expect("port lookup failed");
    port.open(Mode::READ_WRITE).expect("port open failed");
    port
}

/// Assert every native structure and error message has been freed exactly
/// once.
pub fn assert_no_leaks(native: &MockNative) {
    assert_eq!(native.live_ports(), 0, "leaked port handles");
    assert_eq!(native.live_configs(), 0, "leaked port configs");
    assert_eq!(native.live_event_sets(), 0, "leaked event sets");
    assert_eq!(native.live_port_lists(), 0, "leaked port lists");
    assert_eq!(native.outstanding_error_messages(), 0, "leaked error messages");
    assert_eq!(native.invalid_frees(), 0, "double or invalid frees");
}
