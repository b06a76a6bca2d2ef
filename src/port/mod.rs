//! Serial port wrappers.
//!
//! [`SerialPort`] is the session facade over one native port handle;
//! [`PortConfig`] is a detachable settings bundle that can be read from one
//! port and applied to others.

mod config;
mod info;
mod session;
mod types;

pub use config::PortConfig;
pub use info::{PortInfo, UsbInfo};
pub use session::{list_ports, PortState, SerialPort};
pub use types::{
    Buffers, Cts, Dsr, Dtr, Events, FlowControl, Mode, Parity, Rts, Signals, Transport, XonXoff,
};

pub(crate) use info::copy_string;
pub(crate) use types::{to_c_int, NativeEnum};
