//! Subcommand implementations.

pub mod address;
pub mod config;
pub mod inspect;
pub mod simulate;
pub mod status;

use std::io::Read;
use std::path::Path;

use crate::error::CliError;

/// Read a whole input file, or stdin when `path` is `None` or `-`.
pub fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}
