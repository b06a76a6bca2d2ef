//! Port metadata queries.

use super::session::SerialPort;
use super::types::{NativeEnum, Transport};
use crate::error::{check, Result, SerialError};
use crate::ffi::{NativeApi, OsHandle};
use serde::{Deserialize, Serialize};
use std::ffi::{c_char, c_int, CStr};
use std::fmt;
use std::mem::MaybeUninit;

/// USB descriptor details of a USB serial adapter. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbInfo {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub bus: Option<u8>,
    pub address: Option<u8>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

impl UsbInfo {
    /// `VID:PID` in lowercase hex, e.g. `0403:6001`.
    pub fn vid_pid(&self) -> Option<String> {
        Some(format!(
            "{:04x}:{:04x}",
            self.vendor_id?, self.product_id?
        ))
    }
}

/// Snapshot of everything the library reports about a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub name: String,
    pub description: Option<String>,
    pub transport: Transport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usb: Option<UsbInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bluetooth_address: Option<String>,
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(description) = &self.description {
            write!(f, " ({description})")?;
        }
        if let Some(id) = self.usb.as_ref().and_then(UsbInfo::vid_pid) {
            write!(f, " [{id}]")?;
        }
        Ok(())
    }
}

/// Copy a string owned by a native structure.
///
/// # Safety
/// `raw` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
pub(crate) unsafe fn copy_string(raw: *const c_char) -> Option<String> {
    if raw.is_null() {
        None
    } else {
        Some(CStr::from_ptr(raw).to_string_lossy().into_owned())
    }
}

/// Map `Unsupported` to an absent value.
fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(SerialError::Unsupported) => Ok(None),
        Err(e) => Err(e),
    }
}

impl<N: NativeApi> SerialPort<N> {
    fn string_query<F>(&self, query: F) -> Result<Option<String>>
    where
        F: FnOnce(&N, *const crate::ffi::sp_port) -> *const c_char,
    {
        let port = self.as_raw()?;
        let native = self.native();
        // SAFETY: the string belongs to `port`, which outlives this copy.
        Ok(unsafe { copy_string(query(native, port)) })
    }

    fn int_pair<F>(&self, query: F) -> Result<(c_int, c_int)>
    where
        F: FnOnce(&N, *const crate::ffi::sp_port, *mut c_int, *mut c_int) -> c_int,
    {
        let port = self.as_raw()?;
        let native = self.native();
        let (mut a, mut b): (c_int, c_int) = (0, 0);
        let ret = query(native, port, &mut a, &mut b);
        check(native, ret)?;
        Ok((a, b))
    }

    /// The OS-specific port name, e.g. `/dev/ttyUSB0` or `COM3`.
    pub fn name(&self) -> Result<String> {
        self.string_query(|n, p| unsafe { n.get_port_name(p) })?
            .ok_or_else(|| SerialError::argument("port has no name"))
    }

    /// Human-readable description, if the OS provides one.
    pub fn description(&self) -> Result<Option<String>> {
        self.string_query(|n, p| unsafe { n.get_port_description(p) })
    }

    pub fn transport(&self) -> Result<Transport> {
        let port = self.as_raw()?;
        let value = unsafe { self.native().get_port_transport(port) };
        Transport::from_native(value).ok_or(SerialError::UnknownCode(value))
    }

    /// USB descriptor details. `None` unless the port is a USB adapter.
    pub fn usb_info(&self) -> Result<Option<UsbInfo>> {
        if self.transport()? != Transport::Usb {
            return Ok(None);
        }

        let ids = optional(self.int_pair(|n, p, vid, pid| unsafe {
            n.get_port_usb_vid_pid(p, vid, pid)
        }))?;
        let location = optional(self.int_pair(|n, p, bus, address| unsafe {
            n.get_port_usb_bus_address(p, bus, address)
        }))?;

        Ok(Some(UsbInfo {
            vendor_id: ids.and_then(|(vid, _)| u16::try_from(vid).ok()),
            product_id: ids.and_then(|(_, pid)| u16::try_from(pid).ok()),
            bus: location.and_then(|(bus, _)| u8::try_from(bus).ok()),
            address: location.and_then(|(_, address)| u8::try_from(address).ok()),
            manufacturer: self.string_query(|n, p| unsafe { n.get_port_usb_manufacturer(p) })?,
            product: self.string_query(|n, p| unsafe { n.get_port_usb_product(p) })?,
            serial_number: self.string_query(|n, p| unsafe { n.get_port_usb_serial(p) })?,
        }))
    }

    /// MAC address of a Bluetooth adapter, if known.
    pub fn bluetooth_address(&self) -> Result<Option<String>> {
        if self.transport()? != Transport::Bluetooth {
            return Ok(None);
        }
        self.string_query(|n, p| unsafe { n.get_port_bluetooth_address(p) })
    }

    /// Gather all metadata into one serialisable snapshot.
    pub fn info(&self) -> Result<PortInfo> {
        Ok(PortInfo {
            name: self.name()?,
            description: self.description()?,
            transport: self.transport()?,
            usb: self.usb_info()?,
            bluetooth_address: self.bluetooth_address()?,
        })
    }

    /// The OS file descriptor (Unix) or `HANDLE` (Windows) of an open port.
    ///
    /// The library reports an invalid handle (`-1`) for a port that is not
    /// open; that surfaces as [`SerialError::Argument`]. The handle stays
    /// owned by the port and must not be closed directly.
    pub fn os_handle(&self) -> Result<OsHandle> {
        let port = self.as_raw()?;
        let native = self.native();
        let mut handle = MaybeUninit::<OsHandle>::zeroed();
        let ret = unsafe { native.get_port_handle(port, handle.as_mut_ptr().cast()) };
        check(native, ret)?;
        // SAFETY: zero is a valid bit pattern for both handle types, and the
        // library wrote the real value on success.
        let handle = unsafe { handle.assume_init() };
        if !is_valid_handle(handle) {
            return Err(SerialError::argument(format!(
                "{} has no OS handle; it is not open",
                self.label()
            )));
        }
        Ok(handle)
    }
}

#[cfg(unix)]
fn is_valid_handle(handle: OsHandle) -> bool {
    handle >= 0
}

#[cfg(windows)]
fn is_valid_handle(handle: OsHandle) -> bool {
    // INVALID_HANDLE_VALUE is -1 cast to a pointer.
    !handle.is_null() && handle as isize != -1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::{MockDevice, MockNative};
    use crate::port::Mode;
    use pretty_assertions::assert_eq;

    fn ftdi() -> UsbInfo {
        UsbInfo {
            vendor_id: Some(0x0403),
            product_id: Some(0x6001),
            bus: None,
            address: None,
            manufacturer: Some("FTDI".to_string()),
            product: Some("FT232R USB UART".to_string()),
            serial_number: None,
        }
    }

    #[test]
    fn test_native_port_metadata() {
        let native = MockNative::new()
            .with_device(MockDevice::native("/dev/ttyS0").with_description("ttyS0"));
        let port = SerialPort::by_name(native, "/dev/ttyS0").unwrap();

        assert_eq!(port.name().unwrap(), "/dev/ttyS0");
        assert_eq!(port.description().unwrap().as_deref(), Some("ttyS0"));
        assert_eq!(port.transport().unwrap(), Transport::Native);
        assert_eq!(port.usb_info().unwrap(), None);
        assert_eq!(port.bluetooth_address().unwrap(), None);
    }

    #[test]
    fn test_usb_metadata_with_missing_fields() {
        let native = MockNative::new().with_device(MockDevice::usb("/dev/ttyUSB0", ftdi()));
        let port = SerialPort::by_name(native, "/dev/ttyUSB0").unwrap();

        // Bus/address unavailable is reported as absent, not as an error.
        assert_eq!(port.usb_info().unwrap(), Some(ftdi()));
    }

    #[test]
    fn test_bluetooth_address_may_be_absent() {
        let native = MockNative::new()
            .with_device(MockDevice::bluetooth("/dev/rfcomm0", Some("00:11:22:33:44:55")))
            .with_device(MockDevice::bluetooth("/dev/rfcomm1", None));

        let known = SerialPort::by_name(native.clone(), "/dev/rfcomm0").unwrap();
        let unknown = SerialPort::by_name(native, "/dev/rfcomm1").unwrap();

        assert_eq!(
            known.bluetooth_address().unwrap().as_deref(),
            Some("00:11:22:33:44:55")
        );
        assert_eq!(unknown.bluetooth_address().unwrap(), None);
    }

    #[test]
    fn test_info_snapshot_serializes() {
        let native = MockNative::new().with_device(
            MockDevice::usb("COM7", ftdi()).with_description("USB Serial Port (COM7)"),
        );
        let port = SerialPort::by_name(native, "COM7").unwrap();
        let info = port.info().unwrap();

        assert_eq!(info.to_string(), "COM7 (USB Serial Port (COM7)) [0403:6001]");

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["transport"], "usb");
        assert_eq!(json["usb"]["vendor_id"], 0x0403);
        assert!(json.get("bluetooth_address").is_none());
    }

    #[test]
    fn test_os_handle_of_open_port() {
        let native = MockNative::new().with_device(MockDevice::native("COM1"));
        let mut port = SerialPort::by_name(native, "COM1").unwrap();
        port.open(Mode::READ).unwrap();

        #[cfg(unix)]
        assert!(port.os_handle().unwrap() >= 0);
        #[cfg(windows)]
        assert!(!port.os_handle().unwrap().is_null());
    }

    #[test]
    fn test_os_handle_of_closed_port_is_rejected() {
        let native = MockNative::new().with_device(MockDevice::native("COM1"));
        let mut port = SerialPort::by_name(native.clone(), "COM1").unwrap();

        assert!(matches!(port.os_handle(), Err(SerialError::Argument(_))));

        port.open(Mode::READ_WRITE).unwrap();
        port.close().unwrap();
        assert!(matches!(port.os_handle(), Err(SerialError::Argument(_))));
        assert_eq!(native.call_count("sp_get_port_handle"), 2);
    }

    #[test]
    fn test_vid_pid_requires_both_ids() {
        assert_eq!(ftdi().vid_pid().as_deref(), Some("0403:6001"));
        let partial = UsbInfo {
            product_id: None,
            ..ftdi()
        };
        assert_eq!(partial.vid_pid(), None);
    }
}
