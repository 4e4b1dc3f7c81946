//! TuioLayer CLI - Command-line interface
//!
//! Manages the configuration file and runs the tracking bridge against a
//! scripted tracker.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "tuiolayer", version, about = "Bridge TUIO tracking events into a frame loop")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the configuration file with default settings
    Init,

    /// View or change configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run the bridge against a simulated tracker and print mapped positions
    Simulate {
        /// Stop after this many ticks
        #[arg(long, default_value_t = 600)]
        ticks: u64,

        /// Milliseconds between ticks
        #[arg(long, default_value_t = 16)]
        tick_ms: u64,

        /// Number of cursors to swipe across the surface
        #[arg(long, default_value_t = 2)]
        cursors: usize,

        /// Port to connect on (overrides connection.port)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config { command } => commands::config::run(command),
        Commands::Simulate {
            ticks,
            tick_ms,
            cursors,
            port,
        } => commands::simulate::run(SimulateArgs {
            ticks,
            tick_ms,
            cursors,
            port,
        }),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
