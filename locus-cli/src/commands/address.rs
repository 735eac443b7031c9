//! `locus format-address`

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use locus::address::{format_with_style, full_address_from_dictionary};
use locus::{AddressComponents, AddressStyle};

use super::read_input;
use crate::error::CliError;

/// Arguments for `format-address`.
#[derive(Debug, Args)]
pub struct FormatAddressArgs {
    /// JSON file holding an address mapping (stdin when omitted or `-`)
    file: Option<PathBuf>,

    /// Force a layout instead of deriving it from CountryCode
    #[arg(long, value_enum)]
    style: Option<StyleArg>,
}

/// Address layout selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StyleArg {
    /// Street / City State ZIP / Country
    NorthAmerican,
    /// Street / City / ZIP / Country
    British,
    /// ZIP / State City / Street / Country
    EastAsian,
    /// Street / ZIP City / Country
    Continental,
}

impl From<StyleArg> for AddressStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::NorthAmerican => AddressStyle::NorthAmerican,
            StyleArg::British => AddressStyle::British,
            StyleArg::EastAsian => AddressStyle::EastAsian,
            StyleArg::Continental => AddressStyle::Continental,
        }
    }
}

/// Format an address mapping read from a file or stdin.
pub fn run(args: FormatAddressArgs) -> Result<(), CliError> {
    let input = read_input(args.file.as_deref())?;
    println!("{}", format_address(&input, args.style)?);
    Ok(())
}

fn format_address(json: &str, style: Option<StyleArg>) -> Result<String, CliError> {
    let address: AddressComponents = serde_json::from_str(json)?;
    Ok(match style {
        Some(style) => format_with_style(&address, style.into()),
        None => full_address_from_dictionary(&address),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUNICH: &str = r#"{
        "Street": "Marienplatz 8",
        "City": "München",
        "ZIP": "80331",
        "Country": "Germany",
        "CountryCode": "DE"
    }"#;

    #[test]
    fn test_style_from_country_code() {
        assert_eq!(
            format_address(MUNICH, None).unwrap(),
            "Marienplatz 8\n80331 München\nGermany"
        );
    }

    #[test]
    fn test_forced_style() {
        assert_eq!(
            format_address(MUNICH, Some(StyleArg::British)).unwrap(),
            "Marienplatz 8\nMünchen\n80331\nGermany"
        );
    }

    #[test]
    fn test_rejects_non_string_values() {
        let err = format_address(r#"{"ZIP": 80331}"#, None).unwrap_err();
        assert!(matches!(err, CliError::Address(_)));
    }
}
