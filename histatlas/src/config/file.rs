//! The INI-backed configuration file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use tracing::debug;

use super::{config_file_path, ensure_parent, ConfigError};
use crate::cache::CacheCapacity;
use crate::fetch::{
    ChannelMode, FetchConfig, DEFAULT_EXTENSION, DEFAULT_HTTP_TIMEOUT, DEFAULT_WORKER_TIMEOUT,
};
use crate::loader::{LoaderConfig, DEFAULT_PRELOAD_DELAY};
use crate::transform::{TransformConfig, MAX_PRECISION_DIGITS};

/// `[data]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    /// Location the period files are fetched from.
    pub base_url: Option<String>,
    /// JSON manifest listing the periods.
    pub manifest: Option<PathBuf>,
    pub extension: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            manifest: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSettings {
    /// Explicit entry count; clamped to the supported range.
    pub capacity: Option<usize>,
    /// Device memory hint used when no capacity is given.
    pub device_memory_gb: Option<f64>,
}

impl CacheSettings {
    pub fn capacity(&self) -> CacheCapacity {
        match self.capacity {
            Some(entries) => CacheCapacity::clamped(entries),
            None => CacheCapacity::from_device_memory(self.device_memory_gb),
        }
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub mode: ChannelMode,
    pub timeout: Duration,
    pub worker_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            mode: ChannelMode::Delegated,
            timeout: DEFAULT_HTTP_TIMEOUT,
            worker_timeout: DEFAULT_WORKER_TIMEOUT,
        }
    }
}

/// `[preload]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadSettings {
    pub enabled: bool,
    pub delay: Duration,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: DEFAULT_PRELOAD_DELAY,
        }
    }
}

/// All settings from the configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub data: DataSettings,
    pub cache: CacheSettings,
    pub transform: TransformConfig,
    pub fetch: FetchSettings,
    pub preload: PreloadSettings,
}

impl ConfigFile {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let reader = SectionReader { ini };

        config.data.base_url = reader.string("data", "base_url");
        config.data.manifest = reader.string("data", "manifest").map(PathBuf::from);
        if let Some(extension) = ini.get_from(Some("data"), "extension") {
            config.data.extension = extension.trim().to_string();
        }

        config.cache.capacity = reader.parse("cache", "capacity")?;
        config.cache.device_memory_gb = reader.parse("cache", "device_memory_gb")?;

        if let Some(digits) = reader.parse::<u32>("transform", "precision")? {
            if digits > MAX_PRECISION_DIGITS {
                return Err(reader.invalid("transform", "precision"));
            }
            config.transform.precision_digits = digits;
        }
        if let Some(tolerance) = reader.parse::<f64>("transform", "tolerance")? {
            if tolerance < 0.0 {
                return Err(reader.invalid("transform", "tolerance"));
            }
            config.transform.simplification_tolerance = tolerance;
        }
        if let Some(threshold) = reader.parse("transform", "size_threshold")? {
            config.transform.size_threshold = threshold;
        }

        if let Some(mode) = reader.string("fetch", "mode") {
            config.fetch.mode = match mode.to_lowercase().as_str() {
                "delegated" | "worker" => ChannelMode::Delegated,
                "direct" => ChannelMode::Direct,
                _ => return Err(reader.invalid("fetch", "mode")),
            };
        }
        if let Some(secs) = reader.parse::<u64>("fetch", "timeout_secs")? {
            config.fetch.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = reader.parse::<u64>("fetch", "worker_timeout_secs")? {
            // A zero timeout fails every delegated request without falling back.
            if secs == 0 {
                return Err(reader.invalid("fetch", "worker_timeout_secs"));
            }
            config.fetch.worker_timeout = Duration::from_secs(secs);
        }

        if let Some(enabled) = reader.parse("preload", "enabled")? {
            config.preload.enabled = enabled;
        }
        if let Some(ms) = reader.parse::<u64>("preload", "delay_ms")? {
            config.preload.delay = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Write to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        ensure_parent(path)?;
        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        let mut set = |section: &str, key: &str, value: String| {
            ini.set_to(Some(section), key.to_string(), value);
        };

        if let Some(base_url) = &self.data.base_url {
            set("data", "base_url", base_url.clone());
        }
        if let Some(manifest) = &self.data.manifest {
            set("data", "manifest", manifest.display().to_string());
        }
        set("data", "extension", self.data.extension.clone());

        if let Some(capacity) = self.cache.capacity {
            set("cache", "capacity", capacity.to_string());
        }
        if let Some(memory) = self.cache.device_memory_gb {
            set("cache", "device_memory_gb", memory.to_string());
        }

        set("transform", "precision", self.transform.precision_digits.to_string());
        set(
            "transform",
            "tolerance",
            self.transform.simplification_tolerance.to_string(),
        );
        set(
            "transform",
            "size_threshold",
            self.transform.size_threshold.to_string(),
        );

        set("fetch", "mode", self.fetch.mode.to_string());
        set("fetch", "timeout_secs", self.fetch.timeout.as_secs().to_string());
        set(
            "fetch",
            "worker_timeout_secs",
            self.fetch.worker_timeout.as_secs().to_string(),
        );

        set("preload", "enabled", self.preload.enabled.to_string());
        set("preload", "delay_ms", self.preload.delay.as_millis().to_string());

        ini
    }

    /// Loader settings derived from the `[cache]` and `[preload]` sections.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::default()
            .with_capacity(self.cache.capacity())
            .with_preload(self.preload.enabled)
            .with_preload_delay(self.preload.delay)
    }

    pub fn transform_config(&self) -> TransformConfig {
        self.transform.clone()
    }

    /// Fetch settings. Requires `data.base_url`.
    pub fn fetch_config(&self) -> Result<FetchConfig, ConfigError> {
        let base_url = self
            .data
            .base_url
            .clone()
            .ok_or_else(|| ConfigError::MissingValue {
                section: "data".to_string(),
                key: "base_url".to_string(),
            })?;
        Ok(FetchConfig::new(base_url)
            .with_extension(self.data.extension.clone())
            .with_mode(self.fetch.mode)
            .with_http_timeout(self.fetch.timeout)
            .with_worker_timeout(self.fetch.worker_timeout))
    }
}

/// Typed access to `section.key` values.
struct SectionReader<'a> {
    ini: &'a Ini,
}

impl SectionReader<'_> {
    /// Non-empty trimmed value.
    fn string(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get_from(Some(section), key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn parse<T: FromStr>(&self, section: &str, key: &str) -> Result<Option<T>, ConfigError> {
        match self.string(section, key) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| self.invalid(section, key)),
            None => Ok(None),
        }
    }

    fn invalid(&self, section: &str, key: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: self
                .ini
                .get_from(Some(section), key)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[data]
base_url = https://maps.example/periods
manifest = /srv/periods.json

[cache]
capacity = 50

[transform]
precision = 3
tolerance = 0.001

[fetch]
mode = direct
timeout_secs = 10

[preload]
enabled = false
delay_ms = 250
"#;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.data.extension, ".geojson");
        assert_eq!(config.cache.capacity().get(), 25);
        assert_eq!(config.fetch.mode, ChannelMode::Delegated);
        assert!(config.preload.enabled);
    }

    #[test]
    fn test_parse_sample() {
        let config = ConfigFile::parse(SAMPLE).unwrap();
        assert_eq!(
            config.data.base_url.as_deref(),
            Some("https://maps.example/periods")
        );
        assert_eq!(config.data.manifest, Some(PathBuf::from("/srv/periods.json")));
        // Explicit capacities are clamped.
        assert_eq!(config.cache.capacity().get(), 35);
        assert_eq!(config.transform.precision_digits, 3);
        assert_eq!(config.transform.simplification_tolerance, 0.001);
        assert_eq!(config.transform.size_threshold, 500_000);
        assert_eq!(config.fetch.mode, ChannelMode::Direct);
        assert_eq!(config.fetch.timeout, Duration::from_secs(10));
        assert_eq!(config.fetch.worker_timeout, Duration::from_secs(30));
        assert!(!config.preload.enabled);
        assert_eq!(config.preload.delay, Duration::from_millis(250));
    }

    #[test]
    fn test_device_memory_hint() {
        let config = ConfigFile::parse("[cache]\ndevice_memory_gb = 1.5\n").unwrap();
        assert_eq!(config.cache.capacity().get(), 10);

        let config = ConfigFile::parse("[cache]\ndevice_memory_gb = 16\n").unwrap();
        assert_eq!(config.cache.capacity().get(), 25);
    }

    #[test]
    fn test_invalid_values() {
        let err = ConfigFile::parse("[cache]\ncapacity = many\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "capacity"));

        let err = ConfigFile::parse("[fetch]\nmode = carrier-pigeon\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "mode"));

        let err = ConfigFile::parse("[transform]\ntolerance = -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_precision_bounded() {
        let config = ConfigFile::parse("[transform]\nprecision = 15\n").unwrap();
        assert_eq!(config.transform.precision_digits, 15);

        let err = ConfigFile::parse("[transform]\nprecision = 400\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "precision"));

        let err = ConfigFile::parse("[transform]\nprecision = 4294967296\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "precision"));
    }

    #[test]
    fn test_zero_worker_timeout_rejected() {
        let err = ConfigFile::parse("[fetch]\nworker_timeout_secs = 0\n").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "worker_timeout_secs")
        );

        let config = ConfigFile::parse("[fetch]\nworker_timeout_secs = 5\n").unwrap();
        assert_eq!(config.fetch.worker_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_fetch_config_requires_base_url() {
        let err = ConfigFile::default().fetch_config().unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue { .. }));

        let config = ConfigFile::parse(SAMPLE).unwrap();
        let fetch = config.fetch_config().unwrap();
        assert_eq!(fetch.base_url, "https://maps.example/periods");
        assert_eq!(fetch.mode, ChannelMode::Direct);
        assert_eq!(fetch.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_loader_config() {
        let config = ConfigFile::parse(SAMPLE).unwrap();
        let loader = config.loader_config();
        assert_eq!(loader.capacity.get(), 35);
        assert!(!loader.preload_enabled);
        assert_eq!(loader.preload_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let original = ConfigFile::parse(SAMPLE).unwrap();
        original.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, original);
    }
}
