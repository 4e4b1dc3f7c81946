//! Configuration file support.
//!
//! Settings live in `~/.tuiolayer/config.ini`:
//!
//! ```ini
//! [connection]
//! port = 3333
//! startup_delay_ms = 0
//!
//! [filter]
//! ignore_cursors = false
//! ignore_objects = true
//! ignore_blobs = false
//!
//! [broker]
//! forward = true
//!
//! [mapper]
//! surface = plane
//! width = 1
//! height = 1
//! flip_y = false
//! screen_width = 1920
//! screen_height = 1080
//! track_objects = false
//! track_blobs = false
//!
//! [logging]
//! level = info
//! directory = /path/to/logs
//! ```
//!
//! Every key is optional. [`ConfigKey`] addresses individual keys as
//! `section.key` for the CLI.

mod file;
mod keys;

pub use file::{
    BrokerSettings, ConfigError, ConfigFile, ConnectionSettings, FilterSettings, LoggingSettings,
    MapperSettings,
};
pub use keys::ConfigKey;

use std::path::PathBuf;

/// Name of the per-user configuration directory.
pub const CONFIG_DIR_NAME: &str = ".tuiolayer";

/// Name of the configuration file inside [`config_dir`].
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// `~/.tuiolayer`, or `./.tuiolayer` when no home directory is known.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Default configuration file path.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}
