//! Log output setup.
//!
//! The library itself only emits `tracing` events. Applications and test
//! harnesses that want to see them call [`init`] once at startup.

use crate::settings::{LogFormat, LoggingSettings, SettingsError, SettingsResult};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `settings.level`. Returns `false` if a
/// global subscriber was already installed, in which case nothing changes.
pub fn init(settings: &LoggingSettings) -> SettingsResult<bool> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let writer = match &settings.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| SettingsError::WriteError {
                    path: path.clone(),
                    source: e,
                })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(settings.file.is_none());

    let installed = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    Ok(installed.is_ok())
}
