//! Settings loader with file resolution and environment override support.

use super::error::{SettingsError, SettingsResult};
use super::schema::{LogFormat, Settings};
use directories::ProjectDirs;
use serde::de::IntoDeserializer;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "LSP_BIND";

/// Settings file name looked up in the working directory
const SETTINGS_FILE_NAME: &str = "libserialport-bind.toml";

/// Environment variable for an explicit settings path
const SETTINGS_PATH_ENV: &str = "LSP_BIND_CONFIG";

/// Settings loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    /// Resolved settings file path (if any)
    pub settings_path: Option<PathBuf>,
    /// The loaded settings
    pub settings: Settings,
}

impl SettingsLoader {
    /// Load settings using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `LSP_BIND_CONFIG` environment variable (explicit path)
    /// 2. `./libserialport-bind.toml` (current directory)
    /// 3. `settings.toml` in the platform config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override values read from the file.
    pub fn load() -> SettingsResult<Self> {
        let settings_path = resolve_settings_path();

        let mut settings = match settings_path {
            Some(ref path) => load_from_file(path)?,
            None => Settings::default(),
        };
        apply_env_overrides(&mut settings)?;

        Ok(Self {
            settings_path,
            settings,
        })
    }

    /// Load settings from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut settings = load_from_file(&path)?;
        apply_env_overrides(&mut settings)?;

        Ok(Self {
            settings_path: Some(path),
            settings,
        })
    }

    /// Create a loader with default settings (no file).
    ///
    /// Malformed environment overrides are ignored here; use
    /// [`load`](Self::load) to have them reported.
    pub fn with_defaults() -> Self {
        let mut settings = Settings::default();
        if let Err(e) = apply_env_overrides(&mut settings) {
            debug!(error = %e, "ignoring environment override");
        }

        Self {
            settings_path: None,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Save the current settings to the file they were loaded from.
    pub fn save(&self) -> SettingsResult<()> {
        let path = self.settings_path.as_ref().ok_or_else(|| {
            SettingsError::MissingRequired("No settings file path set".to_string())
        })?;

        save_to_file(&self.settings, path)
    }

    /// Save the current settings to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> SettingsResult<()> {
        save_to_file(&self.settings, path.as_ref())
    }

    /// Reload settings from file (if path is set).
    pub fn reload(&mut self) -> SettingsResult<()> {
        if let Some(ref path) = self.settings_path {
            self.settings = load_from_file(path)?;
            apply_env_overrides(&mut self.settings)?;
        }
        Ok(())
    }
}

/// Resolve the settings file path using standard locations.
pub fn resolve_settings_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_settings = PathBuf::from(SETTINGS_FILE_NAME);
    if cwd_settings.exists() {
        return Some(cwd_settings);
    }

    default_settings_path().filter(|path| path.exists())
}

/// Platform config directory for this crate, e.g. `~/.config/libserialport-bind`.
pub fn default_settings_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "libserialport-bind").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default settings file path for creating new settings files.
pub fn default_settings_path() -> Option<PathBuf> {
    default_settings_dir().map(|dir| dir.join("settings.toml"))
}

fn load_from_file(path: &Path) -> SettingsResult<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let settings = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded settings");
    Ok(settings)
}

fn save_to_file(settings: &Settings, path: &Path) -> SettingsResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SettingsError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|e| SettingsError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// First set variable among `names`, with the name it came from.
fn env_var(names: &[String]) -> Option<(String, String)> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().map(|v| (name.clone(), v)))
}

fn prefixed(key: &str) -> String {
    format!("{ENV_PREFIX}_{key}")
}

fn env_number<T: FromStr>(key: &str, legacy: Option<&str>) -> SettingsResult<Option<T>> {
    let mut names = vec![prefixed(key)];
    names.extend(legacy.map(str::to_string));
    match env_var(&names) {
        Some((name, value)) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SettingsError::env_parse(name, format!("Invalid number '{value}'"))),
        None => Ok(None),
    }
}

/// Parse a variable as one of the snake_case names a settings file uses.
fn env_enum<T: for<'de> Deserialize<'de>>(key: &str) -> SettingsResult<Option<T>> {
    let name = prefixed(key);
    let Ok(value) = std::env::var(&name) else {
        return Ok(None);
    };
    let normalized = value.trim().to_lowercase();
    T::deserialize(normalized.as_str().into_deserializer())
        .map(Some)
        .map_err(|e: serde::de::value::Error| SettingsError::env_parse(name, e.to_string()))
}

fn env_flag(names: &[String]) -> Option<bool> {
    env_var(names).map(|(_, v)| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Apply environment variable overrides to the settings.
///
/// Variables follow the pattern `LSP_BIND_<SECTION>_<KEY>`, for example
/// `LSP_BIND_SERIAL_DEFAULT_BAUD=115200`. The legacy `TEST_PORT`,
/// `TEST_PEER_PORT`, `TEST_BAUD` and `TEST_LOOPBACK` variables are honoured
/// for the testing section.
pub fn apply_env_overrides(settings: &mut Settings) -> SettingsResult<()> {
    let serial = &mut settings.serial;
    if let Some(baud) = env_number("SERIAL_DEFAULT_BAUD", None)? {
        serial.default_baud = baud;
    }
    if let Some(bits) = env_number("SERIAL_DATA_BITS", None)? {
        serial.data_bits = bits;
    }
    if let Some(stop) = env_number("SERIAL_STOP_BITS", None)? {
        serial.stop_bits = stop;
    }
    if let Some(parity) = env_enum("SERIAL_PARITY")? {
        serial.parity = parity;
    }
    if let Some(flow) = env_enum("SERIAL_FLOW_CONTROL")? {
        serial.flow_control = flow;
    }

    let testing = &mut settings.testing;
    if let Some((_, port)) = env_var(&[prefixed("TESTING_PORT"), "TEST_PORT".to_string()]) {
        testing.port = Some(port);
    }
    if let Some((_, port)) = env_var(&[prefixed("TESTING_PEER_PORT"), "TEST_PEER_PORT".to_string()])
    {
        testing.peer_port = Some(port);
    }
    if let Some(baud) = env_number("TESTING_BAUD", Some("TEST_BAUD"))? {
        testing.baud = baud;
    }
    if let Some(timeout) = env_number("TESTING_TIMEOUT_MS", None)? {
        testing.timeout_ms = timeout;
    }
    if let Some(loopback) = env_flag(&[
        prefixed("TESTING_LOOPBACK_ENABLED"),
        "TEST_LOOPBACK".to_string(),
    ]) {
        testing.loopback_enabled = loopback;
    }

    if let Ok(level) = std::env::var(prefixed("LOGGING_LEVEL")) {
        settings.logging.level = level;
    }
    if let Some(format) = env_enum::<LogFormat>("LOGGING_FORMAT")? {
        settings.logging.format = format;
    }

    Ok(())
}
