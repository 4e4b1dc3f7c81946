//! Application error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::session::SessionError;

/// Errors that can occur during application lifecycle.
#[derive(Debug, Error)]
pub enum AppError {
    /// A session failed to connect.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Two sessions were configured on the same port.
    #[error("Port {0} is configured for more than one session")]
    DuplicatePort(u16),
}
