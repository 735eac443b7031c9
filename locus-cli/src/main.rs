//! Locus CLI - Command-line interface
//!
//! Replays scripted location streams through the request coordinator and
//! exposes the library's helpers (status strings, address formatting,
//! interface descriptors, configuration).

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use locus::config::ConfigFile;

use commands::address::FormatAddressArgs;
use commands::config::ConfigCommands;
use commands::inspect::InspectArgs;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "locus")]
#[command(version = locus::VERSION)]
#[command(about = "Accuracy and timeout bounded location requests", long_about = None)]
struct Cli {
    /// Use this config file instead of ~/.locus/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines location script against one request
    Simulate(SimulateArgs),

    /// Print the human-readable text of every finish status
    StatusStrings,

    /// Format a JSON address mapping as a localized address
    FormatAddress(FormatAddressArgs),

    /// Query the interface descriptors
    Inspect(InspectArgs),

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    let _log_guard = locus::logging::init(&config.logging)?;
    debug!(version = locus::VERSION, "locus starting");

    match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args, &config),
        Commands::StatusStrings => commands::status::run(),
        Commands::FormatAddress(args) => commands::address::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Config { command } => commands::config::run(command, &config, cli.config),
    }
}
