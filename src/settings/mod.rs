//! TOML settings with environment variable overrides.
//!
//! # Settings Resolution
//!
//! Settings are loaded from the following locations (in order of priority):
//!
//! 1. `LSP_BIND_CONFIG` environment variable (explicit path)
//! 2. `./libserialport-bind.toml` (current directory)
//! 3. `settings.toml` in the platform config directory
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `LSP_BIND_<SECTION>_<KEY>`:
//! - `LSP_BIND_SERIAL_DEFAULT_BAUD=115200`
//! - `LSP_BIND_SERIAL_PARITY=even`
//! - `LSP_BIND_TESTING_PORT=/dev/ttyUSB0`
//!
//! Legacy variables `TEST_PORT`, `TEST_PEER_PORT`, `TEST_BAUD` and
//! `TEST_LOOPBACK` configure the hardware tests.
//!
//! # Example
//!
//! ```no_run
//! use libserialport_bind::settings::SettingsLoader;
//!
//! let loader = SettingsLoader::load()?;
//! let serial = &loader.settings().serial;
//! println!("Default line: {}", serial.line_format());
//! # Ok::<(), libserialport_bind::settings::SettingsError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{SettingsError, SettingsResult};
pub use loader::{
    apply_env_overrides, default_settings_dir, default_settings_path, resolve_settings_path,
    SettingsLoader,
};
pub use schema::{LogFormat, LoggingSettings, SerialSettings, Settings, TestingSettings};
