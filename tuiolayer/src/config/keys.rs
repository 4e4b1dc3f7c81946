//! Addressable configuration keys for `config get|set|list`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{ConfigError, ConfigFile};
use crate::mapper::SurfaceKind;

/// Every key in `config.ini`, addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    ConnectionPort,
    ConnectionStartupDelayMs,

    FilterIgnoreCursors,
    FilterIgnoreObjects,
    FilterIgnoreBlobs,

    BrokerForward,

    MapperSurface,
    MapperWidth,
    MapperHeight,
    MapperFlipY,
    MapperScreenWidth,
    MapperScreenHeight,
    MapperTrackObjects,
    MapperTrackBlobs,

    LoggingLevel,
    LoggingDirectory,
}

const ALL_KEYS: [ConfigKey; 16] = [
    ConfigKey::ConnectionPort,
    ConfigKey::ConnectionStartupDelayMs,
    ConfigKey::FilterIgnoreCursors,
    ConfigKey::FilterIgnoreObjects,
    ConfigKey::FilterIgnoreBlobs,
    ConfigKey::BrokerForward,
    ConfigKey::MapperSurface,
    ConfigKey::MapperWidth,
    ConfigKey::MapperHeight,
    ConfigKey::MapperFlipY,
    ConfigKey::MapperScreenWidth,
    ConfigKey::MapperScreenHeight,
    ConfigKey::MapperTrackObjects,
    ConfigKey::MapperTrackBlobs,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingDirectory,
];

impl ConfigKey {
    /// All keys, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::ConnectionPort | ConfigKey::ConnectionStartupDelayMs => "connection",
            ConfigKey::FilterIgnoreCursors
            | ConfigKey::FilterIgnoreObjects
            | ConfigKey::FilterIgnoreBlobs => "filter",
            ConfigKey::BrokerForward => "broker",
            ConfigKey::MapperSurface
            | ConfigKey::MapperWidth
            | ConfigKey::MapperHeight
            | ConfigKey::MapperFlipY
            | ConfigKey::MapperScreenWidth
            | ConfigKey::MapperScreenHeight
            | ConfigKey::MapperTrackObjects
            | ConfigKey::MapperTrackBlobs => "mapper",
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::ConnectionPort => "port",
            ConfigKey::ConnectionStartupDelayMs => "startup_delay_ms",
            ConfigKey::FilterIgnoreCursors => "ignore_cursors",
            ConfigKey::FilterIgnoreObjects => "ignore_objects",
            ConfigKey::FilterIgnoreBlobs => "ignore_blobs",
            ConfigKey::BrokerForward => "forward",
            ConfigKey::MapperSurface => "surface",
            ConfigKey::MapperWidth => "width",
            ConfigKey::MapperHeight => "height",
            ConfigKey::MapperFlipY => "flip_y",
            ConfigKey::MapperScreenWidth => "screen_width",
            ConfigKey::MapperScreenHeight => "screen_height",
            ConfigKey::MapperTrackObjects => "track_objects",
            ConfigKey::MapperTrackBlobs => "track_blobs",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as it would be written to the file. Empty means unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ConnectionPort => config.connection.port.to_string(),
            ConfigKey::ConnectionStartupDelayMs => config.connection.startup_delay_ms.to_string(),
            ConfigKey::FilterIgnoreCursors => config.filter.ignore_cursors.to_string(),
            ConfigKey::FilterIgnoreObjects => config.filter.ignore_objects.to_string(),
            ConfigKey::FilterIgnoreBlobs => config.filter.ignore_blobs.to_string(),
            ConfigKey::BrokerForward => config.broker.forward.to_string(),
            ConfigKey::MapperSurface => config.mapper.surface.to_string(),
            ConfigKey::MapperWidth => config.mapper.width.to_string(),
            ConfigKey::MapperHeight => config.mapper.height.to_string(),
            ConfigKey::MapperFlipY => config.mapper.flip_y.to_string(),
            ConfigKey::MapperScreenWidth => config.mapper.screen_width.to_string(),
            ConfigKey::MapperScreenHeight => config.mapper.screen_height.to_string(),
            ConfigKey::MapperTrackObjects => config.mapper.track_objects.to_string(),
            ConfigKey::MapperTrackBlobs => config.mapper.track_blobs.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse `value` and store it. The config is untouched on error.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::ConnectionPort => {
                let port: u16 = self.parse(value)?;
                if port == 0 {
                    return Err(self.invalid(value, "port must be non-zero"));
                }
                config.connection.port = port;
            }
            ConfigKey::ConnectionStartupDelayMs => {
                config.connection.startup_delay_ms = self.parse(value)?;
            }
            ConfigKey::FilterIgnoreCursors => config.filter.ignore_cursors = self.parse_bool(value)?,
            ConfigKey::FilterIgnoreObjects => config.filter.ignore_objects = self.parse_bool(value)?,
            ConfigKey::FilterIgnoreBlobs => config.filter.ignore_blobs = self.parse_bool(value)?,
            ConfigKey::BrokerForward => config.broker.forward = self.parse_bool(value)?,
            ConfigKey::MapperSurface => {
                config.mapper.surface = value
                    .parse::<SurfaceKind>()
                    .map_err(|e| self.invalid(value, &e.to_string()))?;
            }
            ConfigKey::MapperWidth => config.mapper.width = self.parse_extent(value)?,
            ConfigKey::MapperHeight => config.mapper.height = self.parse_extent(value)?,
            ConfigKey::MapperFlipY => config.mapper.flip_y = self.parse_bool(value)?,
            ConfigKey::MapperScreenWidth => config.mapper.screen_width = self.parse(value)?,
            ConfigKey::MapperScreenHeight => config.mapper.screen_height = self.parse(value)?,
            ConfigKey::MapperTrackObjects => config.mapper.track_objects = self.parse_bool(value)?,
            ConfigKey::MapperTrackBlobs => config.mapper.track_blobs = self.parse_bool(value)?,
            ConfigKey::LoggingLevel => {
                let level = value
                    .parse::<tracing::Level>()
                    .map_err(|_| self.invalid(value, "expected a log level such as info"))?;
                config.logging.level = level.as_str().to_ascii_lowercase();
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        value
            .parse::<T>()
            .map_err(|e| self.invalid(value, &e.to_string()))
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn parse_extent(&self, value: &str) -> Result<f32, ConfigError> {
        let extent: f32 = self.parse(value)?;
        if !extent.is_finite() || extent <= 0.0 {
            return Err(self.invalid(value, "must be a positive number"));
        }
        Ok(extent)
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}
