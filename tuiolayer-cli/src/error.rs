//! CLI error type.

use thiserror::Error;
use tuiolayer::app::AppError;
use tuiolayer::config::ConfigError;
use tuiolayer::logging::LoggingError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid or missing configuration, with a user-facing message.
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// The Ctrl+C handler could not be installed.
    #[error("Failed to set signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
