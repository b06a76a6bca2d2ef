//! Instrumented in-memory libserialport.
//!
//! `MockNative` implements [`NativeApi`] without touching any hardware. It
//! keeps a registry of simulated devices and of every structure it has handed
//! out, so tests can:
//! - Count native calls, including frees
//! - Inject return codes and OS failures into the next call of a given name
//! - Observe the per-thread last-error record the way libserialport keeps it
//! - Wire devices as loopbacks or null-modem pairs and inspect traffic
//!
//! Pointers returned by the fake are opaque tokens. They are never
//! dereferenced; the fake looks them up in its own tables.
//!
//! # Example
//! ```
//! use libserialport_bind::ffi::{MockDevice, MockNative};
//! use libserialport_bind::{Mode, SerialPort};
//!
//! let native = MockNative::new().with_device(MockDevice::native("/dev/ttyS0").with_loopback());
//! let mut port = SerialPort::by_name(native.clone(), "/dev/ttyS0")?;
//! port.open(Mode::READ_WRITE)?;
//!
//! assert_eq!(port.blocking_write(b"ping", 1000)?, 4);
//! let mut buf = [0u8; 4];
//! assert_eq!(port.blocking_read(&mut buf, 1000)?, 4);
//! assert_eq!(&buf, b"ping");
//!
//! port.close()?;
//! port.release();
//! assert_eq!(native.call_count("sp_free_port"), 1);
//! # Ok::<(), libserialport_bind::SerialError>(())
//! ```

use super::*;
use crate::port::{NativeEnum, Signals, Transport, UsbInfo};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::ffi::{CStr, CString};
use std::ptr;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(2);
const SUCCESS_MESSAGE: &str = "Success";

const ENOENT: c_int = 2;
const EBADF: c_int = 9;
const EBUSY: c_int = 16;

const PACKAGE_VERSION: (c_int, c_int, c_int) = (0, 1, 2);
const PACKAGE_VERSION_STRING: &[u8] = b"0.1.2\0";
const LIB_VERSION: (c_int, c_int, c_int) = (1, 0, 1);
const LIB_VERSION_STRING: &[u8] = b"1:0:1\0";

/// A failure to inject into the next call of a given name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Skip the call and return this value instead.
    Return(c_int),
    /// Fail with `SP_ERR_FAIL`, recording this OS error for the calling thread.
    Os { code: c_int, message: String },
}

impl Fault {
    /// Create an OS failure.
    pub fn os(code: c_int, message: impl Into<String>) -> Self {
        Self::Os {
            code,
            message: message.into(),
        }
    }
}

/// Description of a simulated serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockDevice {
    pub name: String,
    pub description: Option<String>,
    pub transport: Transport,
    pub usb: Option<UsbInfo>,
    pub bluetooth_address: Option<String>,
    /// Bytes written to the device are received back on it.
    pub loopback: bool,
    /// Control-line status reported by `sp_get_signals`.
    pub signals: Signals,
}

impl MockDevice {
    /// A native platform port.
    pub fn native(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            transport: Transport::Native,
            usb: None,
            bluetooth_address: None,
            loopback: false,
            signals: Signals::empty(),
        }
    }

    /// A USB serial adapter.
    pub fn usb(name: impl Into<String>, usb: UsbInfo) -> Self {
        Self {
            transport: Transport::Usb,
            usb: Some(usb),
            ..Self::native(name)
        }
    }

    /// A Bluetooth serial adapter.
    pub fn bluetooth(name: impl Into<String>, address: Option<&str>) -> Self {
        Self {
            transport: Transport::Bluetooth,
            bluetooth_address: address.map(str::to_string),
            ..Self::native(name)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_loopback(mut self) -> Self {
        self.loopback = true;
        self
    }

    pub fn with_signals(mut self, signals: Signals) -> Self {
        self.signals = signals;
        self
    }
}

/// Raw line settings as libserialport stores them; -1 means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baudrate: c_int,
    pub bits: c_int,
    pub parity: c_int,
    pub stopbits: c_int,
    pub rts: c_int,
    pub cts: c_int,
    pub dtr: c_int,
    pub dsr: c_int,
    pub xon_xoff: c_int,
}

impl LineSettings {
    /// A freshly allocated config: every field left unchanged.
    fn unset() -> Self {
        Self {
            baudrate: SP_CONFIG_UNSET,
            bits: SP_CONFIG_UNSET,
            parity: SP_PARITY_INVALID,
            stopbits: SP_CONFIG_UNSET,
            rts: SP_RTS_INVALID,
            cts: SP_CTS_INVALID,
            dtr: SP_DTR_INVALID,
            dsr: SP_DSR_INVALID,
            xon_xoff: SP_XONXOFF_INVALID,
        }
    }

    /// Power-on state of a simulated device: 9600 8N1, no flow control.
    fn device_default() -> Self {
        Self {
            baudrate: 9600,
            bits: 8,
            parity: SP_PARITY_NONE,
            stopbits: 1,
            rts: SP_RTS_ON,
            cts: SP_CTS_IGNORE,
            dtr: SP_DTR_ON,
            dsr: SP_DSR_IGNORE,
            xon_xoff: SP_XONXOFF_DISABLED,
        }
    }

    fn validate(&self) -> bool {
        let baud_ok = self.baudrate == SP_CONFIG_UNSET || self.baudrate > 0;
        let bits_ok = self.bits == SP_CONFIG_UNSET || (5..=8).contains(&self.bits);
        let stop_ok = self.stopbits == SP_CONFIG_UNSET || (1..=2).contains(&self.stopbits);
        baud_ok && bits_ok && stop_ok
    }

    /// Copy every set field of `other` into `self`.
    fn merge(&mut self, other: &LineSettings) {
        let pairs = [
            (&mut self.baudrate, other.baudrate),
            (&mut self.bits, other.bits),
            (&mut self.parity, other.parity),
            (&mut self.stopbits, other.stopbits),
            (&mut self.rts, other.rts),
            (&mut self.cts, other.cts),
            (&mut self.dtr, other.dtr),
            (&mut self.dsr, other.dsr),
            (&mut self.xon_xoff, other.xon_xoff),
        ];
        for (field, value) in pairs {
            if value >= 0 {
                *field = value;
            }
        }
    }

    fn apply_flowcontrol(&mut self, flowcontrol: c_int) {
        self.xon_xoff = if flowcontrol == SP_FLOWCONTROL_XONXOFF {
            SP_XONXOFF_INOUT
        } else {
            SP_XONXOFF_DISABLED
        };

        if flowcontrol == SP_FLOWCONTROL_RTSCTS {
            self.rts = SP_RTS_FLOW_CONTROL;
            self.cts = SP_CTS_FLOW_CONTROL;
        } else {
            if self.rts == SP_RTS_FLOW_CONTROL {
                self.rts = SP_RTS_ON;
            }
            self.cts = SP_CTS_IGNORE;
        }

        if flowcontrol == SP_FLOWCONTROL_DTRDSR {
            self.dtr = SP_DTR_FLOW_CONTROL;
            self.dsr = SP_DSR_FLOW_CONTROL;
        } else {
            if self.dtr == SP_DTR_FLOW_CONTROL {
                self.dtr = SP_DTR_ON;
            }
            self.dsr = SP_DSR_IGNORE;
        }
    }
}

#[derive(Debug)]
struct DeviceState {
    profile: MockDevice,
    settings: LineSettings,
    rx: VecDeque<u8>,
    tx_log: Vec<u8>,
    peer: Option<String>,
    break_active: bool,
}

impl DeviceState {
    fn new(profile: MockDevice) -> Self {
        Self {
            profile,
            settings: LineSettings::device_default(),
            rx: VecDeque::new(),
            tx_log: Vec::new(),
            peer: None,
            break_active: false,
        }
    }
}

/// Strings owned by one port structure, valid until it is freed.
#[derive(Debug, Default)]
struct PortStrings {
    name: CString,
    description: Option<CString>,
    manufacturer: Option<CString>,
    product: Option<CString>,
    serial: Option<CString>,
    bluetooth_address: Option<CString>,
}

fn c_string(value: &str) -> CString {
    CString::new(value).unwrap_or_default()
}

#[derive(Debug)]
struct PortEntry {
    device: String,
    mode: Option<c_int>,
    fd: c_int,
    strings: PortStrings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadPolicy {
    /// Wait until the whole request is satisfied or the timeout elapses.
    Full,
    /// Return as soon as at least one byte has arrived.
    Next,
    /// Return immediately with whatever is buffered.
    Immediate,
}

#[derive(Debug, Default)]
struct MockState {
    devices: HashMap<String, DeviceState>,
    ports: HashMap<usize, PortEntry>,
    configs: HashMap<usize, LineSettings>,
    event_sets: HashMap<usize, Vec<(usize, c_int)>>,
    lists: HashMap<usize, Box<[usize]>>,
    next_id: usize,
    next_fd: c_int,
    calls: Vec<&'static str>,
    faults: HashMap<&'static str, VecDeque<Fault>>,
    last_errors: HashMap<ThreadId, (c_int, String)>,
    outstanding_messages: usize,
    invalid_frees: usize,
}

impl MockState {
    /// Record a call, refresh the thread's error record, and apply any
    /// injected fault. `Some` means the call must return that value.
    fn begin(&mut self, call: &'static str) -> Option<c_int> {
        self.calls.push(call);
        match self.faults.get_mut(call).and_then(VecDeque::pop_front) {
            Some(Fault::Os { code, message }) => {
                self.record(code, message);
                Some(SP_ERR_FAIL)
            }
            Some(Fault::Return(ret)) => {
                self.record(0, SUCCESS_MESSAGE.to_string());
                Some(ret)
            }
            None => {
                self.record(0, SUCCESS_MESSAGE.to_string());
                None
            }
        }
    }

    fn record(&mut self, code: c_int, message: String) {
        self.last_errors
            .insert(thread::current().id(), (code, message));
    }

    fn fail(&mut self, code: c_int, message: &str) -> c_int {
        self.record(code, message.to_string());
        SP_ERR_FAIL
    }

    fn alloc_id(&mut self) -> usize {
        self.next_id += 1;
        0x1000 + self.next_id * 0x10
    }

    fn new_port(&mut self, device: &str) -> usize {
        let strings = match self.devices.get(device) {
            Some(state) => {
                let profile = &state.profile;
                let usb = profile.usb.as_ref();
                PortStrings {
                    name: c_string(&profile.name),
                    description: profile.description.as_deref().map(c_string),
                    manufacturer: usb.and_then(|u| u.manufacturer.as_deref()).map(c_string),
                    product: usb.and_then(|u| u.product.as_deref()).map(c_string),
                    serial: usb.and_then(|u| u.serial_number.as_deref()).map(c_string),
                    bluetooth_address: profile.bluetooth_address.as_deref().map(c_string),
                }
            }
            None => PortStrings {
                name: c_string(device),
                ..Default::default()
            },
        };
        let id = self.alloc_id();
        self.ports.insert(
            id,
            PortEntry {
                device: device.to_string(),
                mode: None,
                fd: -1,
                strings,
            },
        );
        id
    }

    fn entry(&self, port: *const sp_port) -> Result<&PortEntry, c_int> {
        self.ports.get(&(port as usize)).ok_or(SP_ERR_ARG)
    }

    fn entry_mut(&mut self, port: *const sp_port) -> Result<&mut PortEntry, c_int> {
        self.ports.get_mut(&(port as usize)).ok_or(SP_ERR_ARG)
    }

    /// The device behind an open port, with the port's access mode.
    fn open_device(&mut self, port: *const sp_port) -> Result<(&mut DeviceState, c_int), c_int> {
        let entry = self.ports.get(&(port as usize)).ok_or(SP_ERR_ARG)?;
        let mode = entry.mode.ok_or(SP_ERR_ARG)?;
        let device = self.devices.get_mut(&entry.device).ok_or(SP_ERR_ARG)?;
        Ok((device, mode))
    }

    fn device(&self, port: *const sp_port) -> Result<&DeviceState, c_int> {
        let entry = self.entry(port)?;
        self.devices.get(&entry.device).ok_or(SP_ERR_ARG)
    }

    fn config(&mut self, config: *const sp_port_config) -> Result<&mut LineSettings, c_int> {
        self.configs.get_mut(&(config as usize)).ok_or(SP_ERR_ARG)
    }

    fn apply(&mut self, port: *mut sp_port, requested: LineSettings) -> Result<c_int, c_int> {
        if !requested.validate() {
            return Err(SP_ERR_ARG);
        }
        let (device, _) = self.open_device(port)?;
        device.settings.merge(&requested);
        Ok(SP_OK)
    }

    fn transmit(&mut self, port: *mut sp_port, data: &[u8]) -> Result<c_int, c_int> {
        let (_, mode) = self.open_device(port)?;
        if mode & SP_MODE_WRITE == 0 {
            return Err(self.fail(EBADF, "Bad file descriptor"));
        }
        let (device, _) = self.open_device(port)?;
        device.tx_log.extend_from_slice(data);
        let target = if device.profile.loopback {
            Some(device.profile.name.clone())
        } else {
            device.peer.clone()
        };
        if let Some(target) = target.and_then(|name| self.devices.get_mut(&name)) {
            target.rx.extend(data);
        }
        Ok(c_int::try_from(data.len()).unwrap_or(c_int::MAX))
    }

    /// Move up to `count` buffered bytes into `buf` starting at `offset`.
    unsafe fn receive(
        &mut self,
        port: *mut sp_port,
        buf: *mut u8,
        offset: usize,
        count: usize,
    ) -> Result<usize, c_int> {
        let (_, mode) = self.open_device(port)?;
        if mode & SP_MODE_READ == 0 {
            return Err(self.fail(EBADF, "Bad file descriptor"));
        }
        let (device, _) = self.open_device(port)?;
        let mut done = offset;
        while done < count {
            match device.rx.pop_front() {
                Some(byte) => {
                    *buf.add(done) = byte;
                    done += 1;
                }
                None => break,
            }
        }
        Ok(done)
    }

    /// Whether any registration in the set is ready.
    fn events_ready(&mut self, event_set: *mut sp_event_set) -> Result<bool, c_int> {
        let registrations = self
            .event_sets
            .get(&(event_set as usize))
            .ok_or(SP_ERR_ARG)?
            .clone();
        for (port, mask) in registrations {
            let open = self
                .ports
                .get(&port)
                .and_then(|entry| entry.mode.map(|mode| (mode, entry.device.clone())));
            let Some((mode, device)) = open else {
                return Err(self.fail(EBADF, "Bad file descriptor"));
            };
            let rx_pending = self.devices.get(&device).is_some_and(|d| !d.rx.is_empty());
            if mask & SP_EVENT_RX_READY != 0 && rx_pending {
                return Ok(true);
            }
            if mask & SP_EVENT_TX_READY != 0 && mode & SP_MODE_WRITE != 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Instrumented fake of the libserialport C ABI.
///
/// Cloning yields another handle to the same simulated library, so a test
/// can keep one clone for inspection while the wrappers own the others.
#[derive(Clone, Default)]
pub struct MockNative {
    state: Arc<Mutex<MockState>>,
}

impl MockNative {
    /// Create an empty fake with no devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`add_device`](Self::add_device).
    pub fn with_device(self, device: MockDevice) -> Self {
        self.add_device(device);
        self
    }

    /// Register a simulated device. Replaces any device of the same name.
    pub fn add_device(&self, device: MockDevice) {
        let mut state = self.state.lock();
        state
            .devices
            .insert(device.name.clone(), DeviceState::new(device));
    }

    /// Wire two devices as a null-modem pair: bytes written on one are
    /// received on the other.
    pub fn connect(&self, a: &str, b: &str) {
        let mut state = self.state.lock();
        if let Some(device) = state.devices.get_mut(a) {
            device.peer = Some(b.to_string());
        }
        if let Some(device) = state.devices.get_mut(b) {
            device.peer = Some(a.to_string());
        }
    }

    /// Inject a fault into the next call of `call` (e.g. `"sp_open"`).
    /// Faults queue up and are consumed in order.
    pub fn fail_next(&self, call: &'static str, fault: Fault) {
        let mut state = self.state.lock();
        state.faults.entry(call).or_default().push_back(fault);
    }

    /// Overwrite the calling thread's last-error record directly.
    pub fn set_last_error(&self, fault: Fault) {
        let mut state = self.state.lock();
        match fault {
            Fault::Os { code, message } => state.record(code, message),
            Fault::Return(_) => state.record(0, SUCCESS_MESSAGE.to_string()),
        }
    }

    /// Every native call made so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    /// How many times `call` has been made.
    pub fn call_count(&self, call: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn live_ports(&self) -> usize {
        self.state.lock().ports.len()
    }

    pub fn live_configs(&self) -> usize {
        self.state.lock().configs.len()
    }

    pub fn live_event_sets(&self) -> usize {
        self.state.lock().event_sets.len()
    }

    pub fn live_port_lists(&self) -> usize {
        self.state.lock().lists.len()
    }

    /// Frees of pointers the fake never handed out, or had already freed.
    pub fn invalid_frees(&self) -> usize {
        self.state.lock().invalid_frees
    }

    /// Error messages handed out but not yet released.
    pub fn outstanding_error_messages(&self) -> usize {
        self.state.lock().outstanding_messages
    }

    /// Simulate bytes arriving on a device.
    pub fn push_rx(&self, device: &str, data: &[u8]) {
        let mut state = self.state.lock();
        if let Some(device) = state.devices.get_mut(device) {
            device.rx.extend(data);
        }
    }

    /// Every byte written to a device so far.
    pub fn transmitted(&self, device: &str) -> Vec<u8> {
        let state = self.state.lock();
        state
            .devices
            .get(device)
            .map(|d| d.tx_log.clone())
            .unwrap_or_default()
    }

    /// The settings currently applied to a device.
    pub fn line_settings(&self, device: &str) -> Option<LineSettings> {
        self.state.lock().devices.get(device).map(|d| d.settings)
    }

    pub fn set_signals(&self, device: &str, signals: Signals) {
        let mut state = self.state.lock();
        if let Some(device) = state.devices.get_mut(device) {
            device.profile.signals = signals;
        }
    }

    pub fn break_active(&self, device: &str) -> bool {
        let state = self.state.lock();
        state.devices.get(device).is_some_and(|d| d.break_active)
    }

    /// Run a call that returns an `sp_return` code.
    fn call<F>(&self, name: &'static str, f: F) -> c_int
    where
        F: FnOnce(&mut MockState) -> Result<c_int, c_int>,
    {
        let mut state = self.state.lock();
        if let Some(ret) = state.begin(name) {
            return ret;
        }
        match f(&mut state) {
            Ok(ret) | Err(ret) => ret,
        }
    }

    /// Run a call that returns a pointer or nothing; faults do not apply.
    fn query<T, F>(&self, name: &'static str, f: F) -> T
    where
        F: FnOnce(&mut MockState) -> T,
    {
        let mut state = self.state.lock();
        let _ = state.begin(name);
        f(&mut state)
    }

    fn port_string<F>(&self, name: &'static str, port: *const sp_port, pick: F) -> *const c_char
    where
        F: FnOnce(&PortStrings) -> Option<&CString>,
    {
        self.query(name, |state| {
            state
                .entry(port)
                .ok()
                .and_then(|entry| pick(&entry.strings))
                .map_or(ptr::null(), |s| s.as_ptr())
        })
    }

    unsafe fn config_get<F>(
        &self,
        name: &'static str,
        config: *const sp_port_config,
        out: *mut c_int,
        field: F,
    ) -> c_int
    where
        F: FnOnce(&LineSettings) -> c_int,
    {
        self.call(name, |state| {
            if out.is_null() {
                return Err(SP_ERR_ARG);
            }
            let settings = state.config(config)?;
            *out = field(settings);
            Ok(SP_OK)
        })
    }

    fn config_set<F>(
        &self,
        name: &'static str,
        config: *mut sp_port_config,
        value: c_int,
        max: c_int,
        field: F,
    ) -> c_int
    where
        F: FnOnce(&mut LineSettings, c_int),
    {
        self.call(name, |state| {
            if value < -1 || value > max {
                return Err(SP_ERR_ARG);
            }
            let settings = state.config(config)?;
            field(settings, value);
            Ok(SP_OK)
        })
    }

    fn port_set(&self, name: &'static str, port: *mut sp_port, requested: LineSettings) -> c_int {
        self.call(name, |state| state.apply(port, requested))
    }

    unsafe fn read_bytes(
        &self,
        name: &'static str,
        port: *mut sp_port,
        buf: *mut c_void,
        count: usize,
        timeout_ms: Option<c_uint>,
        policy: ReadPolicy,
    ) -> c_int {
        {
            let mut state = self.state.lock();
            if let Some(ret) = state.begin(name) {
                return ret;
            }
        }
        if buf.is_null() && count > 0 {
            return SP_ERR_ARG;
        }
        let deadline = timeout_ms
            .filter(|ms| *ms > 0)
            .map(|ms| Instant::now() + Duration::from_millis(u64::from(ms)));
        let mut done = 0usize;
        loop {
            {
                let mut state = self.state.lock();
                done = match state.receive(port, buf.cast(), done, count) {
                    Ok(done) => done,
                    Err(ret) => return ret,
                };
            }
            let finished = done == count
                || policy == ReadPolicy::Immediate
                || (policy == ReadPolicy::Next && done > 0)
                || deadline.is_some_and(|d| Instant::now() >= d);
            if finished {
                return c_int::try_from(done).unwrap_or(c_int::MAX);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    unsafe fn write_bytes(
        &self,
        name: &'static str,
        port: *mut sp_port,
        buf: *const c_void,
        count: usize,
    ) -> c_int {
        self.call(name, |state| {
            if buf.is_null() && count > 0 {
                return Err(SP_ERR_ARG);
            }
            let data = if count == 0 {
                &[][..]
            } else {
                std::slice::from_raw_parts(buf.cast::<u8>(), count)
            };
            state.transmit(port, data)
        })
    }
}

impl std::fmt::Debug for MockNative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockNative")
            .field("devices", &state.devices.len())
            .field("live_ports", &state.ports.len())
            .field("calls", &state.calls.len())
            .finish()
    }
}

// SAFETY: out-pointers are nulled on every allocation failure, error records
// are keyed by thread, and port strings live in the port entry until it is
// freed.
unsafe impl NativeApi for MockNative {
    unsafe fn get_port_by_name(
        &self,
        portname: *const c_char,
        port_ptr: *mut *mut sp_port,
    ) -> c_int {
        if !port_ptr.is_null() {
            *port_ptr = ptr::null_mut();
        }
        self.call("sp_get_port_by_name", |state| {
            if portname.is_null() || port_ptr.is_null() {
                return Err(SP_ERR_ARG);
            }
            let name = CStr::from_ptr(portname).to_string_lossy().into_owned();
            let id = state.new_port(&name);
            *port_ptr = id as *mut sp_port;
            Ok(SP_OK)
        })
    }

    unsafe fn free_port(&self, port: *mut sp_port) {
        self.query("sp_free_port", |state| {
            if state.ports.remove(&(port as usize)).is_none() {
                state.invalid_frees += 1;
            }
        })
    }

    unsafe fn list_ports(&self, list_ptr: *mut *mut *mut sp_port) -> c_int {
        if !list_ptr.is_null() {
            *list_ptr = ptr::null_mut();
        }
        self.call("sp_list_ports", |state| {
            if list_ptr.is_null() {
                return Err(SP_ERR_ARG);
            }
            let mut names: Vec<String> = state.devices.keys().cloned().collect();
            names.sort();
            let mut entries: Vec<usize> = names.iter().map(|n| state.new_port(n)).collect();
            entries.push(0);
            let mut list = entries.into_boxed_slice();
            let head = list.as_mut_ptr();
            state.lists.insert(head as usize, list);
            *list_ptr = head.cast::<*mut sp_port>();
            Ok(SP_OK)
        })
    }

    unsafe fn copy_port(&self, port: *const sp_port, copy_ptr: *mut *mut sp_port) -> c_int {
        if !copy_ptr.is_null() {
            *copy_ptr = ptr::null_mut();
        }
        self.call("sp_copy_port", |state| {
            if copy_ptr.is_null() {
                return Err(SP_ERR_ARG);
            }
            let device = state.entry(port)?.device.clone();
            let id = state.new_port(&device);
            *copy_ptr = id as *mut sp_port;
            Ok(SP_OK)
        })
    }

    unsafe fn free_port_list(&self, ports: *mut *mut sp_port) {
        self.query("sp_free_port_list", |state| {
            match state.lists.remove(&(ports as usize)) {
                Some(list) => {
                    for id in list.iter().take_while(|id| **id != 0) {
                        state.ports.remove(id);
                    }
                }
                None => state.invalid_frees += 1,
            }
        })
    }

    unsafe fn open(&self, port: *mut sp_port, flags: c_int) -> c_int {
        self.call("sp_open", |state| {
            if !(SP_MODE_READ..=SP_MODE_READ_WRITE).contains(&flags) {
                return Err(SP_ERR_ARG);
            }
            let (mode, device) = {
                let entry = state.entry(port)?;
                (entry.mode, entry.device.clone())
            };
            if mode.is_some() {
                return Err(state.fail(EBUSY, "Device or resource busy"));
            }
            if !state.devices.contains_key(&device) {
                return Err(state.fail(ENOENT, "No such file or directory"));
            }
            state.next_fd += 1;
            let fd = 2 + state.next_fd;
            let entry = state.entry_mut(port)?;
            entry.mode = Some(flags);
            entry.fd = fd;
            Ok(SP_OK)
        })
    }

    unsafe fn close(&self, port: *mut sp_port) -> c_int {
        self.call("sp_close", |state| {
            let entry = state.entry_mut(port)?;
            if entry.mode.take().is_none() {
                return Err(SP_ERR_ARG);
            }
            entry.fd = -1;
            Ok(SP_OK)
        })
    }

    unsafe fn get_port_name(&self, port: *const sp_port) -> *const c_char {
        self.port_string("sp_get_port_name", port, |s| Some(&s.name))
    }

    unsafe fn get_port_description(&self, port: *const sp_port) -> *const c_char {
        self.port_string("sp_get_port_description", port, |s| {
            s.description.as_ref()
        })
    }

    unsafe fn get_port_transport(&self, port: *const sp_port) -> c_int {
        self.query("sp_get_port_transport", |state| {
            state
                .device(port)
                .map_or(SP_TRANSPORT_NATIVE, |d| d.profile.transport.to_native())
        })
    }

    unsafe fn get_port_usb_bus_address(
        &self,
        port: *const sp_port,
        usb_bus: *mut c_int,
        usb_address: *mut c_int,
    ) -> c_int {
        self.call("sp_get_port_usb_bus_address", |state| {
            let usb = state.device(port)?.profile.usb.clone().ok_or(SP_ERR_ARG)?;
            let (Some(bus), Some(address)) = (usb.bus, usb.address) else {
                return Err(SP_ERR_SUPP);
            };
            if !usb_bus.is_null() {
                *usb_bus = c_int::from(bus);
            }
            if !usb_address.is_null() {
                *usb_address = c_int::from(address);
            }
            Ok(SP_OK)
        })
    }

    unsafe fn get_port_usb_vid_pid(
        &self,
        port: *const sp_port,
        usb_vid: *mut c_int,
        usb_pid: *mut c_int,
    ) -> c_int {
        self.call("sp_get_port_usb_vid_pid", |state| {
            let usb = state.device(port)?.profile.usb.clone().ok_or(SP_ERR_ARG)?;
            let (Some(vid), Some(pid)) = (usb.vendor_id, usb.product_id) else {
                return Err(SP_ERR_SUPP);
            };
            if !usb_vid.is_null() {
                *usb_vid = c_int::from(vid);
            }
            if !usb_pid.is_null() {
                *usb_pid = c_int::from(pid);
            }
            Ok(SP_OK)
        })
    }

    unsafe fn get_port_usb_manufacturer(&self, port: *const sp_port) -> *const c_char {
        self.port_string("sp_get_port_usb_manufacturer", port, |s| {
            s.manufacturer.as_ref()
        })
    }

    unsafe fn get_port_usb_product(&self, port: *const sp_port) -> *const c_char {
        self.port_string("sp_get_port_usb_product", port, |s| s.product.as_ref())
    }

    unsafe fn get_port_usb_serial(&self, port: *const sp_port) -> *const c_char {
        self.port_string("sp_get_port_usb_serial", port, |s| s.serial.as_ref())
    }

    unsafe fn get_port_bluetooth_address(&self, port: *const sp_port) -> *const c_char {
        self.port_string("sp_get_port_bluetooth_address", port, |s| {
            s.bluetooth_address.as_ref()
        })
    }

    unsafe fn get_port_handle(&self, port: *const sp_port, result_ptr: *mut c_void) -> c_int {
        self.call("sp_get_port_handle", |state| {
            if result_ptr.is_null() {
                return Err(SP_ERR_ARG);
            }
            let fd = state.entry(port)?.fd;
            #[cfg(unix)]
            {
                *result_ptr.cast::<OsHandle>() = fd;
            }
            #[cfg(windows)]
            {
                *result_ptr.cast::<OsHandle>() = fd as isize as OsHandle;
            }
            Ok(SP_OK)
        })
    }

    unsafe fn new_config(&self, config_ptr: *mut *mut sp_port_config) -> c_int {
        if !config_ptr.is_null() {
            *config_ptr = ptr::null_mut();
        }
        self.call("sp_new_config", |state| {
            if config_ptr.is_null() {
                return Err(SP_ERR_ARG);
            }
            let id = state.alloc_id();
            state.configs.insert(id, LineSettings::unset());
            *config_ptr = id as *mut sp_port_config;
            Ok(SP_OK)
        })
    }

    unsafe fn free_config(&self, config: *mut sp_port_config) {
        self.query("sp_free_config", |state| {
            if state.configs.remove(&(config as usize)).is_none() {
                state.invalid_frees += 1;
            }
        })
    }

    unsafe fn get_config(&self, port: *mut sp_port, config: *mut sp_port_config) -> c_int {
        self.call("sp_get_config", |state| {
            let (device, _) = state.open_device(port)?;
            let current = device.settings;
            *state.config(config)? = current;
            Ok(SP_OK)
        })
    }

    unsafe fn set_config(&self, port: *mut sp_port, config: *const sp_port_config) -> c_int {
        self.call("sp_set_config", |state| {
            let requested = *state.config(config)?;
            state.apply(port, requested)
        })
    }

    unsafe fn set_baudrate(&self, port: *mut sp_port, baudrate: c_int) -> c_int {
        let requested = LineSettings {
            baudrate,
            ..LineSettings::unset()
        };
        self.port_set("sp_set_baudrate", port, requested)
    }

    unsafe fn get_config_baudrate(
        &self,
        config: *const sp_port_config,
        baudrate_ptr: *mut c_int,
    ) -> c_int {
        self.config_get("sp_get_config_baudrate", config, baudrate_ptr, |s| s.baudrate)
    }

    unsafe fn set_config_baudrate(&self, config: *mut sp_port_config, baudrate: c_int) -> c_int {
        self.config_set("sp_set_config_baudrate", config, baudrate, c_int::MAX, |s, v| {
            s.baudrate = v
        })
    }

    unsafe fn set_bits(&self, port: *mut sp_port, bits: c_int) -> c_int {
        let requested = LineSettings {
            bits,
            ..LineSettings::unset()
        };
        self.port_set("sp_set_bits", port, requested)
    }

    unsafe fn get_config_bits(&self, config: *const sp_port_config, bits_ptr: *mut c_int) -> c_int {
        self.config_get("sp_get_config_bits", config, bits_ptr, |s| s.bits)
    }

    unsafe fn set_config_bits(&self, config: *mut sp_port_config, bits: c_int) -> c_int {
        self.config_set("sp_set_config_bits", config, bits, c_int::MAX, |s, v| s.bits = v)
    }

    unsafe fn set_parity(&self, port: *mut sp_port, parity: c_int) -> c_int {
        let requested = LineSettings {
            parity,
            ..LineSettings::unset()
        };
        self.port_set("sp_set_parity", port, requested)
    }

    unsafe fn get_config_parity(
        &self,
        config: *const sp_port_config,
        parity_ptr: *mut c_int,
    ) -> c_int {
        self.config_get("sp_get_config_parity", config, parity_ptr, |s| s.parity)
    }

    unsafe fn set_config_parity(&self, config: *mut sp_port_config, parity: c_int) -> c_int {
        self.config_set("sp_set_config_parity", config, parity, SP_PARITY_SPACE, |s, v| {
            s.parity = v
        })
    }

    unsafe fn set_stopbits(&self, port: *mut sp_port, stopbits: c_int) -> c_int {
        let requested = LineSettings {
            stopbits,
            ..LineSettings::unset()
        };
        self.port_set("sp_set_stopbits", port, requested)
    }

    unsafe fn get_config_stopbits(
        &self,
        config: *const sp_port_config,
        stopbits_ptr: *mut c_int,
    ) -> c_int {
        self.config_get("sp_get_config_stopbits", config, stopbits_ptr, |s| s.stopbits)
    }

    unsafe fn set_config_stopbits(&self, config: *mut sp_port_config, stopbits: c_int) -> c_int {
        self.config_set("sp_set_config_stopbits", config, stopbits, c_int::MAX, |s, v| {
            s.stopbits = v
        })
    }

    unsafe fn set_rts(&self, port: *mut sp_port, rts: c_int) -> c_int {
        let requested = LineSettings {
            rts,
            ..LineSettings::unset()
        };
        self.port_set("sp_set_rts", port, requested)
    }

    unsafe fn get_config_rts(&self, config: *const sp_port_config, rts_ptr: *mut c_int) -> c_int {
        self.config_get("sp_get_config_rts", config, rts_ptr, |s| s.rts)
    }

    unsafe fn set_config_rts(&self, config: *mut sp_port_config, rts: c_int) -> c_int {
        self.config_set("sp_set_config_rts", config, rts, SP_RTS_FLOW_CONTROL, |s, v| {
            s.rts = v
        })
    }

    unsafe fn set_cts(&self, port: *mut sp_port, cts: c_int) -> c_int {
        let requested = LineSettings {
            cts,
            ..LineSettings::unset()
        };
        self.port_set("sp_set_cts", port, requested)
    }

    unsafe fn get_config_cts(&self, config: *const sp_port_config, cts_ptr: *mut c_int) -> c_int {
        self.config_get("sp_get_config_cts", config, cts_ptr, |s| s.cts)
    }

    unsafe fn set_config_cts(&self, config: *mut sp_port_config, cts: c_int) -> c_int {
        self.config_set("sp_set_config_cts", config, cts, SP_CTS_FLOW_CONTROL, |s, v| {
            s.cts = v
        })
    }

    unsafe fn set_dtr(&self, port: *mut sp_port, dtr: c_int) -> c_int {
        let requested = LineSettings {
            dtr,
            ..LineSettings::unset()
        };
        self.port_set("sp_set_dtr", port, requested)
    }

    unsafe fn get_config_dtr(&self, config: *const sp_port_config, dtr_ptr: *mut c_int) -> c_int {
        self.config_get("sp_get_config_dtr", config, dtr_ptr, |s| s.dtr)
    }

    unsafe fn set_config_dtr(&self, config: *mut sp_port_config, dtr: c_int) -> c_int {
        self.config_set("sp_set_config_dtr", config, dtr, SP_DTR_FLOW_CONTROL, |s, v| {
            s.dtr = v
        })
    }

    unsafe fn set_dsr(&self, port: *mut sp_port, dsr: c_int) -> c_int {
        let requested = LineSettings {
            dsr,
            ..LineSettings::unset()
        };
        self.port_set("sp_set_dsr", port, requested)
    }

    unsafe fn get_config_dsr(&self, config: *const sp_port_config, dsr_ptr: *mut c_int) -> c_int {
        self.config_get("sp_get_config_dsr", config, dsr_ptr, |s| s.dsr)
    }

    unsafe fn set_config_dsr(&self, config: *mut sp_port_config, dsr: c_int) -> c_int {
        self.config_set("sp_set_config_dsr", config, dsr, SP_DSR_FLOW_CONTROL, |s, v| {
            s.dsr = v
        })
    }

    unsafe fn set_xon_xoff(&self, port: *mut sp_port, xon_xoff: c_int) -> c_int {
        let requested = LineSettings {
            xon_xoff,
            ..LineSettings::unset()
        };
        self.port_set("sp_set_xon_xoff", port, requested)
    }

    unsafe fn get_config_xon_xoff(
        &self,
        config: *const sp_port_config,
        xon_xoff_ptr: *mut c_int,
    ) -> c_int {
        self.config_get("sp_get_config_xon_xoff", config, xon_xoff_ptr, |s| s.xon_xoff)
    }

    unsafe fn set_config_xon_xoff(&self, config: *mut sp_port_config, xon_xoff: c_int) -> c_int {
        self.config_set("sp_set_config_xon_xoff", config, xon_xoff, SP_XONXOFF_INOUT, |s, v| {
            s.xon_xoff = v
        })
    }

    unsafe fn set_config_flowcontrol(
        &self,
        config: *mut sp_port_config,
        flowcontrol: c_int,
    ) -> c_int {
        self.call("sp_set_config_flowcontrol", |state| {
            if !(SP_FLOWCONTROL_NONE..=SP_FLOWCONTROL_DTRDSR).contains(&flowcontrol) {
                return Err(SP_ERR_ARG);
            }
            state.config(config)?.apply_flowcontrol(flowcontrol);
            Ok(SP_OK)
        })
    }

    unsafe fn set_flowcontrol(&self, port: *mut sp_port, flowcontrol: c_int) -> c_int {
        self.call("sp_set_flowcontrol", |state| {
            if !(SP_FLOWCONTROL_NONE..=SP_FLOWCONTROL_DTRDSR).contains(&flowcontrol) {
                return Err(SP_ERR_ARG);
            }
            let (device, _) = state.open_device(port)?;
            device.settings.apply_flowcontrol(flowcontrol);
            Ok(SP_OK)
        })
    }

    unsafe fn blocking_read(
        &self,
        port: *mut sp_port,
        buf: *mut c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int {
        self.read_bytes("sp_blocking_read", port, buf, count, Some(timeout_ms), ReadPolicy::Full)
    }

    unsafe fn blocking_read_next(
        &self,
        port: *mut sp_port,
        buf: *mut c_void,
        count: usize,
        timeout_ms: c_uint,
    ) -> c_int {
        self.read_bytes("sp_blocking_read_next", port, buf, count, Some(timeout_ms), ReadPolicy::Next)
    }

    unsafe fn nonblocking_read(&self, port: *mut sp_port, buf: *mut c_void, count: usize) -> c_int {
        self.read_bytes("sp_nonblocking_read", port, buf, count, None, ReadPolicy::Immediate)
    }

    unsafe fn blocking_write(
        &self,
        port: *mut sp_port,
        buf: *const c_void,
        count: usize,
        _timeout_ms: c_uint,
    ) -> c_int {
        self.write_bytes("sp_blocking_write", port, buf, count)
    }

    unsafe fn nonblocking_write(
        &self,
        port: *mut sp_port,
        buf: *const c_void,
        count: usize,
    ) -> c_int {
        self.write_bytes("sp_nonblocking_write", port, buf, count)
    }

    unsafe fn input_waiting(&self, port: *mut sp_port) -> c_int {
        self.call("sp_input_waiting", |state| {
            let (device, _) = state.open_device(port)?;
            Ok(c_int::try_from(device.rx.len()).unwrap_or(c_int::MAX))
        })
    }

    unsafe fn output_waiting(&self, port: *mut sp_port) -> c_int {
        self.call("sp_output_waiting", |state| {
            state.open_device(port)?;
            Ok(0)
        })
    }

    unsafe fn flush(&self, port: *mut sp_port, buffers: c_int) -> c_int {
        self.call("sp_flush", |state| {
            if !(SP_BUF_INPUT..=SP_BUF_BOTH).contains(&buffers) {
                return Err(SP_ERR_ARG);
            }
            let (device, _) = state.open_device(port)?;
            if buffers & SP_BUF_INPUT != 0 {
                device.rx.clear();
            }
            Ok(SP_OK)
        })
    }

    unsafe fn drain(&self, port: *mut sp_port) -> c_int {
        self.call("sp_drain", |state| {
            state.open_device(port)?;
            Ok(SP_OK)
        })
    }

    unsafe fn new_event_set(&self, result_ptr: *mut *mut sp_event_set) -> c_int {
        if !result_ptr.is_null() {
            *result_ptr = ptr::null_mut();
        }
        self.call("sp_new_event_set", |state| {
            if result_ptr.is_null() {
                return Err(SP_ERR_ARG);
            }
            let id = state.alloc_id();
            state.event_sets.insert(id, Vec::new());
            *result_ptr = id as *mut sp_event_set;
            Ok(SP_OK)
        })
    }

    unsafe fn add_port_events(
        &self,
        event_set: *mut sp_event_set,
        port: *const sp_port,
        mask: c_int,
    ) -> c_int {
        self.call("sp_add_port_events", |state| {
            let all = SP_EVENT_RX_READY | SP_EVENT_TX_READY | SP_EVENT_ERROR;
            if mask == 0 || mask & !all != 0 {
                return Err(SP_ERR_ARG);
            }
            if state.entry(port)?.mode.is_none() {
                return Err(SP_ERR_ARG);
            }
            state
                .event_sets
                .get_mut(&(event_set as usize))
                .ok_or(SP_ERR_ARG)?
                .push((port as usize, mask));
            Ok(SP_OK)
        })
    }

    unsafe fn wait(&self, event_set: *mut sp_event_set, timeout_ms: c_uint) -> c_int {
        {
            let mut state = self.state.lock();
            if let Some(ret) = state.begin("sp_wait") {
                return ret;
            }
        }
        let deadline = (timeout_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(u64::from(timeout_ms)));
        loop {
            {
                let mut state = self.state.lock();
                match state.events_ready(event_set) {
                    Ok(true) => return SP_OK,
                    Ok(false) => {}
                    Err(ret) => return ret,
                }
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return SP_OK;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    unsafe fn free_event_set(&self, event_set: *mut sp_event_set) {
        self.query("sp_free_event_set", |state| {
            if state.event_sets.remove(&(event_set as usize)).is_none() {
                state.invalid_frees += 1;
            }
        })
    }

    unsafe fn get_signals(&self, port: *mut sp_port, signal_mask: *mut c_int) -> c_int {
        self.call("sp_get_signals", |state| {
            if signal_mask.is_null() {
                return Err(SP_ERR_ARG);
            }
            let (device, _) = state.open_device(port)?;
            *signal_mask = device.profile.signals.bits();
            Ok(SP_OK)
        })
    }

    unsafe fn start_break(&self, port: *mut sp_port) -> c_int {
        self.call("sp_start_break", |state| {
            state.open_device(port)?.0.break_active = true;
            Ok(SP_OK)
        })
    }

    unsafe fn end_break(&self, port: *mut sp_port) -> c_int {
        self.call("sp_end_break", |state| {
            state.open_device(port)?.0.break_active = false;
            Ok(SP_OK)
        })
    }

    unsafe fn last_error_code(&self) -> c_int {
        let mut state = self.state.lock();
        state.calls.push("sp_last_error_code");
        state
            .last_errors
            .get(&thread::current().id())
            .map_or(0, |(code, _)| *code)
    }

    unsafe fn last_error_message(&self) -> *mut c_char {
        let mut state = self.state.lock();
        state.calls.push("sp_last_error_message");
        let message = state
            .last_errors
            .get(&thread::current().id())
            .map_or(SUCCESS_MESSAGE, |(_, message)| message.as_str());
        let raw = c_string(message).into_raw();
        state.outstanding_messages += 1;
        raw
    }

    unsafe fn free_error_message(&self, message: *mut c_char) {
        let mut state = self.state.lock();
        state.calls.push("sp_free_error_message");
        if message.is_null() {
            return;
        }
        drop(CString::from_raw(message));
        state.outstanding_messages = state.outstanding_messages.saturating_sub(1);
    }

    unsafe fn get_major_package_version(&self) -> c_int {
        self.query("sp_get_major_package_version", |_| PACKAGE_VERSION.0)
    }

    unsafe fn get_minor_package_version(&self) -> c_int {
        self.query("sp_get_minor_package_version", |_| PACKAGE_VERSION.1)
    }

    unsafe fn get_micro_package_version(&self) -> c_int {
        self.query("sp_get_micro_package_version", |_| PACKAGE_VERSION.2)
    }

    unsafe fn get_package_version_string(&self) -> *const c_char {
        self.query("sp_get_package_version_string", |_| {
            PACKAGE_VERSION_STRING.as_ptr().cast()
        })
    }

    unsafe fn get_current_lib_version(&self) -> c_int {
        self.query("sp_get_current_lib_version", |_| LIB_VERSION.0)
    }

    unsafe fn get_revision_lib_version(&self) -> c_int {
        self.query("sp_get_revision_lib_version", |_| LIB_VERSION.1)
    }

    unsafe fn get_age_lib_version(&self) -> c_int {
        self.query("sp_get_age_lib_version", |_| LIB_VERSION.2)
    }

    unsafe fn get_lib_version_string(&self) -> *const c_char {
        self.query("sp_get_lib_version_string", |_| LIB_VERSION_STRING.as_ptr().cast())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_raw(native: &MockNative, name: &str) -> *mut sp_port {
        let name = CString::new(name).unwrap();
        let mut port = ptr::null_mut();
        unsafe {
            assert_eq!(native.get_port_by_name(name.as_ptr(), &mut port), SP_OK);
            assert_eq!(native.open(port, SP_MODE_READ_WRITE), SP_OK);
        }
        port
    }

    #[test]
    fn test_injected_fault_is_consumed_once() {
        let native = MockNative::new().with_device(MockDevice::native("COM1"));
        let port = open_raw(&native, "COM1");
        native.fail_next("sp_drain", Fault::Return(SP_ERR_SUPP));

        unsafe {
            assert_eq!(native.drain(port), SP_ERR_SUPP);
            assert_eq!(native.drain(port), SP_OK);
        }
    }

    #[test]
    fn test_open_missing_device_sets_os_error() {
        let native = MockNative::new();
        let name = CString::new("/dev/ttyNOPE").unwrap();
        let mut port = ptr::null_mut();
        unsafe {
            assert_eq!(native.get_port_by_name(name.as_ptr(), &mut port), SP_OK);
            assert_eq!(native.open(port, SP_MODE_READ), SP_ERR_FAIL);
            assert_eq!(native.last_error_code(), ENOENT);
            native.free_port(port);
        }
        assert_eq!(native.live_ports(), 0);
    }

    #[test]
    fn test_any_call_overwrites_error_record() {
        let native = MockNative::new();
        native.set_last_error(Fault::os(13, "Permission denied"));
        unsafe {
            native.get_major_package_version();
            assert_eq!(native.last_error_code(), 0);
        }
    }

    #[test]
    fn test_error_record_is_per_thread() {
        let native = MockNative::new();
        native.set_last_error(Fault::os(5, "Input/output error"));

        let other = native.clone();
        thread::spawn(move || other.set_last_error(Fault::os(22, "Invalid argument")))
            .join()
            .unwrap();

        assert_eq!(unsafe { native.last_error_code() }, 5);
    }

    #[test]
    fn test_null_modem_pair() {
        let native = MockNative::new()
            .with_device(MockDevice::native("A"))
            .with_device(MockDevice::native("B"));
        native.connect("A", "B");
        let a = open_raw(&native, "A");
        let b = open_raw(&native, "B");

        unsafe {
            assert_eq!(native.blocking_write(a, b"xyz".as_ptr().cast(), 3, 0), 3);
            assert_eq!(native.input_waiting(b), 3);
            assert_eq!(native.input_waiting(a), 0);
        }
        assert_eq!(native.transmitted("A"), b"xyz");
    }

    #[test]
    fn test_flowcontrol_preset_updates_lines() {
        let mut settings = LineSettings::device_default();
        settings.apply_flowcontrol(SP_FLOWCONTROL_RTSCTS);
        assert_eq!(settings.rts, SP_RTS_FLOW_CONTROL);
        assert_eq!(settings.cts, SP_CTS_FLOW_CONTROL);
        assert_eq!(settings.xon_xoff, SP_XONXOFF_DISABLED);

        settings.apply_flowcontrol(SP_FLOWCONTROL_NONE);
        assert_eq!(settings.rts, SP_RTS_ON);
        assert_eq!(settings.cts, SP_CTS_IGNORE);
    }

    #[test]
    fn test_double_free_is_counted() {
        let native = MockNative::new();
        let mut config = ptr::null_mut();
        unsafe {
            assert_eq!(native.new_config(&mut config), SP_OK);
            native.free_config(config);
            native.free_config(config);
        }
        assert_eq!(native.invalid_frees(), 1);
    }
}
