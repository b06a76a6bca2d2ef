//! Safe bindings over the libserialport C ABI.
//!
//! Every native structure (port, port config, event set) is owned by exactly
//! one wrapper and freed exactly once, explicitly via `release()` or on drop.
//! Every native call is checked on the spot, and OS failures carry the code
//! and message the library reported for that call.
//!
//! # Modules
//!
//! - `ffi`: Native call surface, the real backend and the instrumented fake
//! - `error`: Error taxonomy and result-code translation
//! - `port`: Port session facade, metadata and detachable configs
//! - `event`: Multi-port event wait
//! - `version`: Library version queries
//! - `settings`: TOML settings with environment overrides
//! - `logging`: `tracing` subscriber setup
//!
//! # Backends
//!
//! Wrappers are generic over [`ffi::NativeApi`]. Enable the `libserialport`
//! feature for [`ffi::Libserialport`], which links the system library; use
//! [`ffi::MockNative`] to run without hardware.

pub mod error;
pub mod event;
pub mod ffi;
mod handle;
pub mod logging;
pub mod port;
pub mod settings;
pub mod version;

// Re-export commonly used types for convenience
pub use error::{Result, SerialError};
pub use event::EventSet;
pub use port::{
    list_ports, Buffers, Cts, Dsr, Dtr, Events, FlowControl, Mode, Parity, PortConfig, PortInfo,
    PortState, Rts, SerialPort, Signals, Transport, UsbInfo, XonXoff,
};
pub use version::{
    lib_version, lib_version_string, package_version, package_version_string, LibVersion,
    PackageVersion,
};
