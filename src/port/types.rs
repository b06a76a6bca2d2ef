//! Typed views of the libserialport enums and flag sets.
//!
//! Flag enums (`sp_mode`, `sp_event`, `sp_buffer`, `sp_signal`) become
//! `bitflags` sets; closed enums (`sp_parity`, `sp_rts`, ...) become Rust
//! enums. The `*_INVALID` sentinels never appear here: inside a
//! [`PortConfig`](super::PortConfig) they are `None`, meaning "leave unchanged".

use crate::error::{Result, SerialError};
use crate::ffi::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::ffi::c_int;
use std::fmt;

bitflags! {
    /// Access mode used when opening a port.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Mode: c_int {
        const READ = SP_MODE_READ;
        const WRITE = SP_MODE_WRITE;
        const READ_WRITE = SP_MODE_READ_WRITE;
    }
}

bitflags! {
    /// Events a port can be waited on for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Events: c_int {
        const RX_READY = SP_EVENT_RX_READY;
        const TX_READY = SP_EVENT_TX_READY;
        const ERROR = SP_EVENT_ERROR;
    }
}

bitflags! {
    /// Port buffers selected for flushing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Buffers: c_int {
        const INPUT = SP_BUF_INPUT;
        const OUTPUT = SP_BUF_OUTPUT;
        const BOTH = SP_BUF_BOTH;
    }
}

bitflags! {
    /// Input control-line status.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Signals: c_int {
        const CTS = SP_SIG_CTS;
        const DSR = SP_SIG_DSR;
        const DCD = SP_SIG_DCD;
        const RI = SP_SIG_RI;
    }
}

/// Maps a native integer onto a closed enum, with `*_INVALID` as `None`.
pub(crate) trait NativeEnum: Sized + Copy {
    fn to_native(self) -> c_int;

    fn from_native(value: c_int) -> Option<Self>;

    /// Decode a value read from a config object, where -1 means "unset".
    fn from_config(value: c_int) -> Result<Option<Self>> {
        if value < 0 {
            return Ok(None);
        }
        Self::from_native(value)
            .map(Some)
            .ok_or(SerialError::UnknownCode(value))
    }

    fn option_to_native(value: Option<Self>) -> c_int {
        value.map_or(-1, Self::to_native)
    }
}

macro_rules! native_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:path),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl NativeEnum for $name {
            fn to_native(self) -> c_int {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            fn from_native(value: c_int) -> Option<Self> {
                match value {
                    $(v if v == $value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

native_enum! {
    /// Parity checking mode.
    Parity {
        None = SP_PARITY_NONE,
        Odd = SP_PARITY_ODD,
        Even = SP_PARITY_EVEN,
        Mark = SP_PARITY_MARK,
        Space = SP_PARITY_SPACE,
    }
}

native_enum! {
    /// RTS pin behaviour.
    Rts {
        Off = SP_RTS_OFF,
        On = SP_RTS_ON,
        FlowControl = SP_RTS_FLOW_CONTROL,
    }
}

native_enum! {
    /// CTS pin behaviour.
    Cts {
        Ignore = SP_CTS_IGNORE,
        FlowControl = SP_CTS_FLOW_CONTROL,
    }
}

native_enum! {
    /// DTR pin behaviour.
    Dtr {
        Off = SP_DTR_OFF,
        On = SP_DTR_ON,
        FlowControl = SP_DTR_FLOW_CONTROL,
    }
}

native_enum! {
    /// DSR pin behaviour.
    Dsr {
        Ignore = SP_DSR_IGNORE,
        FlowControl = SP_DSR_FLOW_CONTROL,
    }
}

native_enum! {
    /// XON/XOFF flow control behaviour.
    XonXoff {
        Disabled = SP_XONXOFF_DISABLED,
        /// Enabled for input only.
        In = SP_XONXOFF_IN,
        /// Enabled for output only.
        Out = SP_XONXOFF_OUT,
        InOut = SP_XONXOFF_INOUT,
    }
}

native_enum! {
    /// Standard flow control presets. Setting one adjusts the RTS, CTS, DTR,
    /// DSR and XON/XOFF behaviours together.
    FlowControl {
        None = SP_FLOWCONTROL_NONE,
        XonXoff = SP_FLOWCONTROL_XONXOFF,
        RtsCts = SP_FLOWCONTROL_RTSCTS,
        DtrDsr = SP_FLOWCONTROL_DTRDSR,
    }
}

native_enum! {
    /// Connection category of a port.
    Transport {
        /// Native platform serial port.
        Native = SP_TRANSPORT_NATIVE,
        /// USB serial adapter.
        Usb = SP_TRANSPORT_USB,
        /// Bluetooth serial adapter.
        Bluetooth = SP_TRANSPORT_BLUETOOTH,
    }
}

impl Default for Parity {
    fn default() -> Self {
        Self::None
    }
}

impl Default for FlowControl {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::None => "N",
            Self::Odd => "O",
            Self::Even => "E",
            Self::Mark => "M",
            Self::Space => "S",
        };
        f.write_str(letter)
    }
}

/// Convert a caller-supplied integer setting to the native `int`.
pub(crate) fn to_c_int(name: &str, value: u32) -> Result<c_int> {
    c_int::try_from(value)
        .map_err(|_| SerialError::argument(format!("{name} {value} is out of range")))
}
