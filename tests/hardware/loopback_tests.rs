//! Tests requiring wiring: TX jumpered to RX on `TEST_PORT`
//! (`TEST_LOOPBACK=1`), or a null-modem cable to `TEST_PEER_PORT`.

use super::utils::{assert_duration_within, PortTestFixture};
use crate::skip_without_hardware;
use libserialport_bind::ffi::Libserialport;
use libserialport_bind::{EventSet, Events, Mode, SerialPort};
use std::time::{Duration, Instant};

#[test]
#[ignore]
fn test_loopback_hello() {
    let mut fixture: PortTestFixture = skip_without_hardware!();
    if !fixture.config.loopback_enabled {
        println!("⏭️  Skipping: TEST_LOOPBACK not set to 1");
        return;
    }

    let written = fixture.port.blocking_write(b"Hello!", 1000).unwrap();
    let mut buf = [0u8; 6];
    let read = fixture.port.blocking_read(&mut buf, 1000).unwrap();

    assert_eq!(written, 6);
    assert_eq!(read, 6);
    assert_eq!(&buf, b"Hello!");
}

#[test]
#[ignore]
fn test_idle_event_wait_times_out() {
    let fixture: PortTestFixture = skip_without_hardware!();
    let Some(peer_name) = fixture.config.peer_port.clone() else {
        println!("⏭️  Skipping: TEST_PEER_PORT not set");
        return;
    };

    let mut peer = SerialPort::by_name(Libserialport, &peer_name).unwrap();
    peer.open(Mode::READ_WRITE).unwrap();

    let mut set = EventSet::new(Libserialport).unwrap();
    set.add(&fixture.port, Events::RX_READY).unwrap();
    set.add(&peer, Events::RX_READY).unwrap();

    let start = Instant::now();
    set.wait(3000).unwrap();
    assert_duration_within(
        start.elapsed(),
        Duration::from_millis(3000),
        Duration::from_millis(500),
        "idle wait",
    );
    assert_eq!(fixture.port.input_waiting().unwrap(), 0);
    assert_eq!(peer.input_waiting().unwrap(), 0);

    drop(set);
    peer.close().unwrap();
}

#[test]
#[ignore]
fn test_null_modem_event_wake() {
    let mut fixture: PortTestFixture = skip_without_hardware!();
    let Some(peer_name) = fixture.config.peer_port.clone() else {
        println!("⏭️  Skipping: TEST_PEER_PORT not set");
        return;
    };

    let mut peer = SerialPort::by_name(Libserialport, &peer_name).unwrap();
    peer.open(Mode::READ_WRITE).unwrap();
    peer.set_baudrate(fixture.config.baud_rate).unwrap();

    let mut set = EventSet::new(Libserialport).unwrap();
    set.add(&peer, Events::RX_READY).unwrap();

    let timeout = fixture.timeout_ms();
    fixture.port.blocking_write(b"wake", timeout).unwrap();
    fixture.port.drain().unwrap();
    set.wait(timeout).unwrap();

    let mut buf = [0u8; 4];
    assert_eq!(peer.blocking_read(&mut buf, timeout).unwrap(), 4);
    assert_eq!(&buf, b"wake");

    drop(set);
    peer.close().unwrap();
}
