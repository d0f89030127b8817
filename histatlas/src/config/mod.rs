//! Configuration file handling.
//!
//! Settings live in an INI file, by default at
//! `<config dir>/histatlas/config.ini`:
//!
//! ```ini
//! [data]
//! base_url = https://maps.example/periods
//! manifest = /usr/share/histatlas/periods.json
//! extension = .geojson
//!
//! [cache]
//! capacity = 25
//! device_memory_gb = 8
//!
//! [transform]
//! precision = 4
//! tolerance = 0.0001
//! size_threshold = 500000
//!
//! [fetch]
//! mode = delegated
//! timeout_secs = 30
//! worker_timeout_secs = 30
//!
//! [preload]
//! enabled = true
//! delay_ms = 100
//! ```
//!
//! A missing file or key means the default applies. Values that are present
//! but cannot be parsed are errors.

mod file;

pub use file::{
    CacheSettings, ConfigFile, DataSettings, FetchSettings, PreloadSettings,
};

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the application's configuration directory.
pub const CONFIG_DIR_NAME: &str = "histatlas";

/// Name of the configuration file inside it.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("{section}.{key} is not set")]
    MissingValue { section: String, key: String },

    #[error("could not determine the user configuration directory")]
    NoConfigDir,
}

/// Directory holding the configuration file.
pub fn config_directory() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME))
}

/// Default path of the configuration file.
///
/// Falls back to the current directory when the platform has no
/// configuration directory.
pub fn config_file_path() -> PathBuf {
    config_directory()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE_NAME)
}

/// Format a byte count for display (e.g. `1.5 MB`).
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_path_name() {
        let path = config_file_path();
        assert!(path.ends_with("config.ini"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            section: "cache".to_string(),
            key: "capacity".to_string(),
            value: "lots".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value 'lots' for cache.capacity");
    }
}
