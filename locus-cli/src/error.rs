//! CLI error type.

use thiserror::Error;

use locus::config::ConfigError;
use locus::logging::LoggingError;

/// Errors surfaced to the user by `locus` subcommands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be read or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging could not be set up.
    #[error("{0}")]
    Logging(#[from] LoggingError),

    /// A simulation script line could not be understood.
    #[error("Script line {line}: {message}")]
    Script { line: usize, message: String },

    /// Address input was not a JSON object of strings.
    #[error("Invalid address mapping: {0}")]
    Address(#[from] serde_json::Error),

    /// Unknown interface name passed to `inspect`.
    #[error("Unknown protocol '{0}'. Use 'locus inspect' to list protocols.")]
    UnknownProtocol(String),

    /// Reading input or building the runtime failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}
