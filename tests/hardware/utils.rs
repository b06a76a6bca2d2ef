//! Utility functions for hardware testing.
//!
//! Provides test setup from settings/environment, fixtures and timing
//! helpers.

use libserialport_bind::ffi::Libserialport;
use libserialport_bind::settings::{SettingsLoader, TestingSettings};
use libserialport_bind::{list_ports, Buffers, Mode, SerialPort};
use std::time::{Duration, Instant};

/// Test port configuration resolved from settings and environment.
pub struct TestPortConfig {
    pub port_name: String,
    pub peer_port: Option<String>,
    pub baud_rate: u32,
    pub loopback_enabled: bool,
    pub timeout_ms: u32,
}

impl TestPortConfig {
    /// Read the `[testing]` section, honouring `TEST_PORT`, `TEST_PEER_PORT`,
    /// `TEST_BAUD` and `TEST_LOOPBACK`.
    pub fn from_env() -> Option<Self> {
        let testing: TestingSettings = SettingsLoader::with_defaults().into_settings().testing;
        Some(TestPortConfig {
            port_name: testing.port?,
            peer_port: testing.peer_port,
            baud_rate: testing.baud,
            loopback_enabled: testing.loopback_enabled,
            timeout_ms: testing.timeout_ms,
        })
    }
}

/// Print available ports for debugging.
pub fn print_available_ports() {
    let ports = match list_ports(Libserialport) {
        Ok(ports) => ports,
        Err(e) => {
            println!("Port enumeration failed: {}", e);
            return;
        }
    };

    if ports.is_empty() {
        println!("No serial ports detected on this system");
        return;
    }

    println!("Available serial ports ({}):", ports.len());
    for (idx, port) in ports.iter().enumerate() {
        match port.info() {
            Ok(info) => println!("  {}. {} ({:?})", idx + 1, info, info.transport),
            Err(e) => println!("  {}. <unreadable: {}>", idx + 1, e),
        }
    }
}

/// Timing helper for measuring operation duration.
pub struct TimingHelper {
    start: Instant,
    name: String,
}

impl TimingHelper {
    pub fn new(name: &str) -> Self {
        println!("⏱️  Starting: {}", name);
        TimingHelper {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        println!("✅ Completed: {} in {:?}", self.name, elapsed);
        elapsed
    }
}

/// An opened, flushed port at the configured baud rate.
pub struct PortTestFixture {
    pub port: SerialPort<Libserialport>,
    pub config: TestPortConfig,
}

impl PortTestFixture {
    pub fn setup() -> Option<Self> {
        let config = TestPortConfig::from_env()?;
        println!(
            "Setting up test fixture for {} at {} baud",
            config.port_name, config.baud_rate
        );

        let mut port = SerialPort::by_name(Libserialport, &config.port_name).ok()?;
        if let Err(e) = port.open(Mode::READ_WRITE) {
            println!("Failed to open port: {}", e);
            return None;
        }
        port.set_baudrate(config.baud_rate).ok()?;
        port.flush(Buffers::BOTH).ok()?;

        Some(PortTestFixture { port, config })
    }

    pub fn timeout_ms(&self) -> u32 {
        self.config.timeout_ms
    }
}

impl Drop for PortTestFixture {
    fn drop(&mut self) {
        if self.port.is_open() {
            let _ = self.port.close();
        }
    }
}

/// Skip test with a clear message if hardware is not available.
#[macro_export]
macro_rules! skip_without_hardware {
    () => {
        match $crate::hardware::utils::PortTestFixture::setup() {
            Some(fixture) => fixture,
            None => {
                println!("⏭️  Skipping: TEST_PORT not set or port unavailable");
                println!("   Set TEST_PORT=COM3 (or /dev/ttyUSB0) to run hardware tests");
                return;
            }
        }
    };
}

/// Assert that duration is within expected range.
pub fn assert_duration_within(
    actual: Duration,
    expected: Duration,
    tolerance: Duration,
    message: &str,
) {
    let lower = expected.saturating_sub(tolerance);
    let upper = expected + tolerance;

    assert!(
        actual >= lower && actual <= upper,
        "{}: expected {:?} ± {:?}, got {:?}",
        message,
        expected,
        tolerance,
        actual
    );
}
