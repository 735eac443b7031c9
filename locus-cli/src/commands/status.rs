//! `locus status-strings`

use locus::{FinishStatus, LocationRequest};

use crate::error::CliError;

/// Print every finish status next to its display text.
pub fn run() -> Result<(), CliError> {
    for line in status_table() {
        println!("{}", line);
    }
    Ok(())
}

fn status_table() -> Vec<String> {
    FinishStatus::ALL
        .iter()
        .map(|status| {
            format!(
                "{:<22} {}",
                format!("{:?}", status),
                LocationRequest::string_for_finish_status(*status)
            )
        })
        .collect()
}
