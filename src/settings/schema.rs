//! Settings schema definitions.
//!
//! Every section has defaults, so a settings file only needs the keys it
//! changes.

use crate::port::{FlowControl, Parity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root settings structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default line settings and port aliases
    pub serial: SerialSettings,
    /// Hardware testing
    pub testing: TestingSettings,
    /// Log output
    pub logging: LoggingSettings,
}

/// Serial line profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub default_baud: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    pub flow_control: FlowControl,
    /// Friendly names mapped to OS port names, resolved by
    /// `SerialPort::open_with_settings`
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            default_baud: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            flow_control: FlowControl::None,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialSettings {
    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Short line format, e.g. `9600 8N1`.
    pub fn line_format(&self) -> String {
        format!(
            "{} {}{}{}",
            self.default_baud, self.data_bits, self.parity, self.stop_bits
        )
    }
}

/// Hardware testing section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingSettings {
    /// Port under test
    pub port: Option<String>,
    /// Second port wired to `port` with a null-modem cable
    pub peer_port: Option<String>,
    pub baud: u32,
    /// Whether TX is jumpered to RX on `port`
    pub loopback_enabled: bool,
    pub timeout_ms: u32,
}

impl Default for TestingSettings {
    fn default() -> Self {
        Self {
            port: None,
            peer_port: None,
            baud: 115_200,
            loopback_enabled: false,
            timeout_ms: 2000,
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    pub format: LogFormat,
    /// Log file path (stderr when unset)
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}
