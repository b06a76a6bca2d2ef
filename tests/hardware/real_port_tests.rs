//! Tests requiring an actual serial port (no wiring needed).
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0   # or COM3
//! export TEST_BAUD=115200         # optional
//! cargo test --features hardware-tests -- --ignored
//! ```

use super::utils::{print_available_ports, PortTestFixture, TimingHelper};
use crate::common::LINE_GRID;
use crate::skip_without_hardware;
use libserialport_bind::ffi::Libserialport;
use libserialport_bind::{
    lib_version, lib_version_string, list_ports, package_version, package_version_string,
    PortConfig, PortState, SerialError,
};

#[test]
#[ignore]
fn test_enumerate_ports() {
    print_available_ports();
    let ports = list_ports(Libserialport).expect("enumeration failed");
    for port in &ports {
        assert!(!port.name().expect("port without name").is_empty());
    }
}

#[test]
#[ignore]
fn test_library_versions() {
    let package = package_version(&Libserialport);
    let lib = lib_version(&Libserialport);
    println!("libserialport {} (ABI {})", package, lib);

    assert_eq!(package.to_string(), package_version_string(&Libserialport));
    assert_eq!(lib.to_string(), lib_version_string(&Libserialport));
}

#[test]
#[ignore]
fn test_real_port_open_close() {
    let mut fixture: PortTestFixture = skip_without_hardware!();
    let timing = TimingHelper::new("open/close");

    assert_eq!(fixture.port.name().unwrap(), fixture.config.port_name);
    println!("Port info: {}", fixture.port.info().unwrap());

    fixture.port.close().unwrap();
    assert_eq!(fixture.port.state(), PortState::Closed);
    assert!(matches!(fixture.port.close(), Err(SerialError::Argument(_))));

    timing.finish();
}

#[test]
#[ignore]
fn test_real_port_config_round_trip() {
    let mut fixture: PortTestFixture = skip_without_hardware!();

    for (baud, bits, parity, stop) in LINE_GRID {
        let mut config = PortConfig::new(Libserialport).unwrap();
        config.set_baudrate(baud).unwrap();
        config.set_bits(bits).unwrap();
        config.set_parity(parity).unwrap();
        config.set_stopbits(stop).unwrap();
        fixture.port.set_config(&config).unwrap();

        assert_eq!(fixture.port.baudrate().unwrap(), baud);
        assert_eq!(fixture.port.bits().unwrap(), bits);
        assert_eq!(fixture.port.parity().unwrap(), parity);
        assert_eq!(fixture.port.stopbits().unwrap(), stop);

        fixture.port.set_baudrate(baud).unwrap();
        fixture.port.set_bits(bits).unwrap();
        fixture.port.set_parity(parity).unwrap();
        fixture.port.set_stopbits(stop).unwrap();

        let read_back = fixture.port.config().unwrap();
        assert_eq!(read_back.baudrate().unwrap(), Some(baud));
        assert_eq!(read_back.bits().unwrap(), Some(bits));
        assert_eq!(read_back.parity().unwrap(), Some(parity));
        assert_eq!(read_back.stopbits().unwrap(), Some(stop));
    }
}

#[test]
#[ignore]
fn test_real_port_break_and_signals() {
    let mut fixture: PortTestFixture = skip_without_hardware!();

    println!("Signals: {:?}", fixture.port.signals().unwrap());
    fixture.port.start_break().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(20));
    fixture.port.end_break().unwrap();
}
