//! Init command - initialize configuration file.

use tuiolayer::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// Keeps any existing settings and fills in the rest with defaults.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let existed = path.exists();

    let config = ConfigFile::load()?;
    config.save()?;

    if existed {
        println!("Updated configuration file: {}", path.display());
    } else {
        println!("Created configuration file: {}", path.display());
    }
    println!();
    println!("Listening port: {}", config.connection.port);
    println!("Mapper surface: {}", config.mapper.surface);
    println!();
    println!("Edit this file or use 'tuiolayer config set' to customize settings.");
    Ok(())
}
