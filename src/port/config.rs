//! Detachable port configuration.

use super::types::{to_c_int, Cts, Dsr, Dtr, FlowControl, NativeEnum, Parity, Rts, XonXoff};
use crate::error::{check, Result, SerialError};
use crate::ffi::{sp_port_config, NativeApi, SP_CONFIG_UNSET};
use crate::handle::Owned;
use crate::settings::SerialSettings;
use std::ffi::c_int;
use std::fmt;

/// A settings bundle independent of any port.
///
/// Every field starts unset (`None`), which tells the library to leave the
/// corresponding port setting unchanged when the config is applied. A config
/// can be filled from one port with [`SerialPort::config`] and applied to any
/// number of ports with [`SerialPort::set_config`].
///
/// [`SerialPort::config`]: super::SerialPort::config
/// [`SerialPort::set_config`]: super::SerialPort::set_config
pub struct PortConfig<N: NativeApi> {
    handle: Owned<sp_port_config, N>,
}

impl<N: NativeApi> PortConfig<N> {
    /// Allocate an empty config.
    pub fn new(native: N) -> Result<Self> {
        // SAFETY: `out` is a valid out-pointer owned by `Owned::acquire`.
        let handle = Owned::acquire(native, |n, out| unsafe { n.new_config(out) })?;
        Ok(Self { handle })
    }

    /// Allocate a config carrying the line settings of a profile.
    pub fn from_settings(native: N, settings: &SerialSettings) -> Result<Self> {
        let mut config = Self::new(native)?;
        config.set_flowcontrol(settings.flow_control)?;
        config.set_baudrate(settings.default_baud)?;
        config.set_bits(settings.data_bits)?;
        config.set_parity(settings.parity)?;
        config.set_stopbits(settings.stop_bits)?;
        Ok(config)
    }

    pub(crate) fn as_ptr(&self) -> Result<*mut sp_port_config> {
        Ok(self.handle.get()?.as_ptr())
    }

    fn read<F>(&self, get: F) -> Result<c_int>
    where
        F: FnOnce(&N, *const sp_port_config, *mut c_int) -> c_int,
    {
        let config = self.as_ptr()?;
        let native = self.handle.native();
        let mut value: c_int = SP_CONFIG_UNSET;
        let ret = get(native, config, &mut value);
        check(native, ret)?;
        Ok(value)
    }

    fn write<F>(&mut self, value: c_int, set: F) -> Result<()>
    where
        F: FnOnce(&N, *mut sp_port_config, c_int) -> c_int,
    {
        let config = self.as_ptr()?;
        let native = self.handle.native();
        let ret = set(native, config, value);
        check(native, ret)?;
        Ok(())
    }

    fn read_enum<T: NativeEnum, F>(&self, get: F) -> Result<Option<T>>
    where
        F: FnOnce(&N, *const sp_port_config, *mut c_int) -> c_int,
    {
        T::from_config(self.read(get)?)
    }

    /// Baud rate, or `None` if unset.
    pub fn baudrate(&self) -> Result<Option<u32>> {
        let value = self.read(|n, c, out| unsafe { n.get_config_baudrate(c, out) })?;
        Ok(u32::try_from(value).ok())
    }

    pub fn set_baudrate(&mut self, baudrate: impl Into<Option<u32>>) -> Result<()> {
        let value = optional_int("baud rate", baudrate.into())?;
        self.write(value, |n, c, v| unsafe { n.set_config_baudrate(c, v) })
    }

    /// Data bits, or `None` if unset.
    pub fn bits(&self) -> Result<Option<u8>> {
        let value = self.read(|n, c, out| unsafe { n.get_config_bits(c, out) })?;
        small_int("data bits", value)
    }

    pub fn set_bits(&mut self, bits: impl Into<Option<u8>>) -> Result<()> {
        let value = optional_int("data bits", bits.into().map(u32::from))?;
        self.write(value, |n, c, v| unsafe { n.set_config_bits(c, v) })
    }

    pub fn parity(&self) -> Result<Option<Parity>> {
        self.read_enum(|n, c, out| unsafe { n.get_config_parity(c, out) })
    }

    pub fn set_parity(&mut self, parity: impl Into<Option<Parity>>) -> Result<()> {
        let value = Parity::option_to_native(parity.into());
        self.write(value, |n, c, v| unsafe { n.set_config_parity(c, v) })
    }

    /// Stop bits, or `None` if unset.
    pub fn stopbits(&self) -> Result<Option<u8>> {
        let value = self.read(|n, c, out| unsafe { n.get_config_stopbits(c, out) })?;
        small_int("stop bits", value)
    }

    pub fn set_stopbits(&mut self, stopbits: impl Into<Option<u8>>) -> Result<()> {
        let value = optional_int("stop bits", stopbits.into().map(u32::from))?;
        self.write(value, |n, c, v| unsafe { n.set_config_stopbits(c, v) })
    }

    pub fn rts(&self) -> Result<Option<Rts>> {
        self.read_enum(|n, c, out| unsafe { n.get_config_rts(c, out) })
    }

    pub fn set_rts(&mut self, rts: impl Into<Option<Rts>>) -> Result<()> {
        let value = Rts::option_to_native(rts.into());
        self.write(value, |n, c, v| unsafe { n.set_config_rts(c, v) })
    }

    pub fn cts(&self) -> Result<Option<Cts>> {
        self.read_enum(|n, c, out| unsafe { n.get_config_cts(c, out) })
    }

    pub fn set_cts(&mut self, cts: impl Into<Option<Cts>>) -> Result<()> {
        let value = Cts::option_to_native(cts.into());
        self.write(value, |n, c, v| unsafe { n.set_config_cts(c, v) })
    }

    pub fn dtr(&self) -> Result<Option<Dtr>> {
        self.read_enum(|n, c, out| unsafe { n.get_config_dtr(c, out) })
    }

    pub fn set_dtr(&mut self, dtr: impl Into<Option<Dtr>>) -> Result<()> {
        let value = Dtr::option_to_native(dtr.into());
        self.write(value, |n, c, v| unsafe { n.set_config_dtr(c, v) })
    }

    pub fn dsr(&self) -> Result<Option<Dsr>> {
        self.read_enum(|n, c, out| unsafe { n.get_config_dsr(c, out) })
    }

    pub fn set_dsr(&mut self, dsr: impl Into<Option<Dsr>>) -> Result<()> {
        let value = Dsr::option_to_native(dsr.into());
        self.write(value, |n, c, v| unsafe { n.set_config_dsr(c, v) })
    }

    pub fn xon_xoff(&self) -> Result<Option<XonXoff>> {
        self.read_enum(|n, c, out| unsafe { n.get_config_xon_xoff(c, out) })
    }

    pub fn set_xon_xoff(&mut self, xon_xoff: impl Into<Option<XonXoff>>) -> Result<()> {
        let value = XonXoff::option_to_native(xon_xoff.into());
        self.write(value, |n, c, v| unsafe { n.set_config_xon_xoff(c, v) })
    }

    /// Apply a flow control preset to the RTS, CTS, DTR, DSR and XON/XOFF
    /// fields. Write-only: the library has no matching getter.
    pub fn set_flowcontrol(&mut self, flowcontrol: FlowControl) -> Result<()> {
        self.write(flowcontrol.to_native(), |n, c, v| unsafe {
            n.set_config_flowcontrol(c, v)
        })
    }

    /// Free the native config. Later calls fail with `Disposed`.
    pub fn release(&mut self) {
        self.handle.release();
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_released()
    }
}

impl<N: NativeApi> fmt::Debug for PortConfig<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortConfig")
            .field("handle", &self.handle)
            .finish()
    }
}

fn optional_int(name: &str, value: Option<u32>) -> Result<c_int> {
    value.map_or(Ok(SP_CONFIG_UNSET), |v| to_c_int(name, v))
}

fn small_int(name: &str, value: c_int) -> Result<Option<u8>> {
    if value < 0 {
        return Ok(None);
    }
    u8::try_from(value)
        .map(Some)
        .map_err(|_| SerialError::argument(format!("{name} {value} is out of range")))
}
