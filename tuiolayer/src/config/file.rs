//! INI configuration file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use super::config_file_path;
use super::keys::ConfigKey;
use crate::logging::LoggingConfig;
use crate::mapper::{MapperConfig, SurfaceKind};
use crate::session::{SessionConfig, VariantFilter, DEFAULT_PORT};

/// Errors from loading, saving or editing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// `[connection]`
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub port: u16,
    pub startup_delay_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            startup_delay_ms: 0,
        }
    }
}

/// `[filter]`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSettings {
    pub ignore_cursors: bool,
    pub ignore_objects: bool,
    pub ignore_blobs: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            ignore_cursors: false,
            ignore_objects: true,
            ignore_blobs: false,
        }
    }
}

/// `[broker]`
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerSettings {
    pub forward: bool,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self { forward: true }
    }
}

/// `[mapper]`
#[derive(Debug, Clone, PartialEq)]
pub struct MapperSettings {
    pub surface: SurfaceKind,
    pub width: f32,
    pub height: f32,
    pub flip_y: bool,
    pub screen_width: u32,
    pub screen_height: u32,
    pub track_objects: bool,
    pub track_blobs: bool,
}

impl Default for MapperSettings {
    fn default() -> Self {
        let defaults = MapperConfig::default();
        Self {
            surface: defaults.surface,
            width: defaults.width,
            height: defaults.height,
            flip_y: defaults.flip_y,
            screen_width: defaults.screen_width,
            screen_height: defaults.screen_height,
            track_objects: defaults.track_objects,
            track_blobs: defaults.track_blobs,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    /// Directory for the log file. `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// Parsed contents of `config.ini`.
///
/// Missing sections and keys take their defaults, so an empty or missing
/// file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub connection: ConnectionSettings,
    pub filter: FilterSettings,
    pub broker: BrokerSettings,
    pub mapper: MapperSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        debug!(path = %path.display(), "Config file saved");
        Ok(())
    }

    /// Render as INI text.
    pub fn to_ini_string(&self) -> Result<String, ConfigError> {
        let mut buf = Vec::new();
        self.to_ini().write_to(&mut buf)?;
        String::from_utf8(buf).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini
    }

    // =========================================================================
    // Component configs
    // =========================================================================

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.connection.port)
            .with_filter(VariantFilter {
                ignore_cursors: self.filter.ignore_cursors,
                ignore_objects: self.filter.ignore_objects,
                ignore_blobs: self.filter.ignore_blobs,
            })
            .with_forward_to_broker(self.broker.forward)
            .with_startup_delay(Duration::from_millis(self.connection.startup_delay_ms))
    }

    pub fn mapper_config(&self) -> MapperConfig {
        let m = &self.mapper;
        MapperConfig {
            surface: m.surface,
            width: m.width,
            height: m.height,
            flip_y: m.flip_y,
            screen_width: m.screen_width,
            screen_height: m.screen_height,
            track_objects: m.track_objects,
            track_blobs: m.track_blobs,
            ..Default::default()
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        let config = LoggingConfig::default().with_level(&self.logging.level);
        match &self.logging.directory {
            Some(dir) => config.with_directory(dir.clone()),
            None => config,
        }
    }
}
