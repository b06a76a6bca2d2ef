//! Event multiplexer tests.

mod common;

use common::{assert_no_leaks, null_modem_native, open_port};
use libserialport_bind::{EventSet, Events, SerialError};
use pretty_assertions::assert_eq;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_idle_ports_wait_full_timeout() {
    // Arrange
    let native = null_modem_native("COM1", "COM2");
    let a = open_port(&native, "COM1");
    let b = open_port(&native, "COM2");
    let mut set = EventSet::new(native.clone()).unwrap();
    set.add(&a, Events::RX_READY).unwrap();
    set.add(&b, Events::RX_READY).unwrap();

    // Act
    let start = Instant::now();
    let result = set.wait(3000);
    let elapsed = start.elapsed();

    // Assert
    assert_eq!(result, Ok(()));
    assert!(elapsed >= Duration::from_millis(3000), "woke early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(4500), "woke late: {elapsed:?}");
    assert_eq!(a.input_waiting().unwrap(), 0);
    assert_eq!(b.input_waiting().unwrap(), 0);
}

#[test]
fn test_wait_wakes_when_peer_writes() {
    let native = null_modem_native("COM1", "COM2");
    let a = open_port(&native, "COM1");
    let mut b = open_port(&native, "COM2");
    let mut set = EventSet::new(native.clone()).unwrap();
    set.add(&a, Events::RX_READY).unwrap();

    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        b.blocking_write(b"wake", 1000).unwrap();
        b
    });

    let start = Instant::now();
    set.wait(0).unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));

    // The wait does not say which port fired; poll to find out.
    assert_eq!(a.input_waiting().unwrap(), 4);
    drop(writer.join().unwrap());
}

#[test]
fn test_tx_ready_fires_immediately_on_writable_port() {
    let native = null_modem_native("COM1", "COM2");
    let a = open_port(&native, "COM1");
    let mut set = EventSet::new(native.clone()).unwrap();
    set.add(&a, Events::TX_READY).unwrap();

    let start = Instant::now();
    set.wait(2000).unwrap();
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[test]
fn test_registration_needs_events() {
    let native = null_modem_native("COM1", "COM2");
    let a = open_port(&native, "COM1");
    let mut set = EventSet::new(native.clone()).unwrap();

    assert!(matches!(
        set.add(&a, Events::empty()),
        Err(SerialError::Argument(_))
    ));
    assert!(set.is_empty());
}

#[test]
fn test_releasing_set_keeps_ports_open() {
    let native = null_modem_native("COM1", "COM2");
    let mut a = open_port(&native, "COM1");
    let mut set = EventSet::new(native.clone()).unwrap();
    set.add(&a, Events::RX_READY | Events::ERROR).unwrap();

    drop(set);

    assert!(a.is_open());
    assert_eq!(a.nonblocking_write(b"ok").unwrap(), 2);
    a.close().unwrap();
    drop(a);
    assert_no_leaks(&native);
}

#[test]
fn test_closing_port_does_not_touch_set() {
    let native = null_modem_native("COM1", "COM2");
    let mut a = open_port(&native, "COM1");
    let mut set = EventSet::new(native.clone()).unwrap();
    set.add(&a, Events::RX_READY).unwrap();
    native.clear_calls();

    a.close().unwrap();

    assert_eq!(native.calls(), vec!["sp_close"]);
    assert_eq!(set.len(), 1);
}

#[test]
fn test_port_torn_down_elsewhere_cuts_wait_short() {
    // Unsupported usage: the wait borrows no port, so nothing stops another
    // thread from closing one. The fake reports the dead descriptor.
    let native = null_modem_native("COM1", "COM2");
    let mut a = open_port(&native, "COM1");
    let mut set = EventSet::new(native.clone()).unwrap();
    set.add(&a, Events::RX_READY).unwrap();

    let closer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        a.close().unwrap();
        a.release();
    });

    let result = set.wait(0);
    closer.join().unwrap();

    assert_eq!(
        result,
        Err(SerialError::Os {
            code: 9,
            message: "Bad file descriptor".to_string()
        })
    );
    drop(set);
    assert_no_leaks(&native);
}
