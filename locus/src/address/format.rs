//! Localized single-string address formatting.
//!
//! The line layout follows the postal convention of the address's country:
//!
//! | Style         | Layout                                 | Countries        |
//! |---------------|----------------------------------------|------------------|
//! | NorthAmerican | Street / City State ZIP / Country      | US, CA, AU       |
//! | British       | Street / City / ZIP / Country          | GB, IE           |
//! | EastAsian     | ZIP / State City / Street / Country    | JP, CN, KR, TW   |
//! | Continental   | Street / ZIP City / Country            | everything else  |
//!
//! Missing fields are skipped and lines left empty are dropped.

use super::{keys, AddressComponents};

/// Postal line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStyle {
    /// City, state and postal code share a line after the street.
    NorthAmerican,
    /// City and postal code on separate lines.
    British,
    /// Largest unit first, street last.
    EastAsian,
    /// Postal code before city.
    Continental,
}

impl AddressStyle {
    /// Layout used for an ISO country code. Unknown codes get `Continental`.
    pub fn for_country_code(code: Option<&str>) -> Self {
        match code.map(str::to_uppercase).as_deref() {
            Some("US" | "CA" | "AU") => AddressStyle::NorthAmerican,
            Some("GB" | "IE") => AddressStyle::British,
            Some("JP" | "CN" | "KR" | "TW") => AddressStyle::EastAsian,
            _ => AddressStyle::Continental,
        }
    }
}

/// Format an address mapping into one localized, newline-separated string.
///
/// Pure: the same mapping always yields the same string.
pub fn full_address_from_dictionary(address: &AddressComponents) -> String {
    let style = AddressStyle::for_country_code(address.country_code().as_deref());
    format_with_style(address, style)
}

/// Format an address mapping using an explicit layout.
pub fn format_with_style(address: &AddressComponents, style: AddressStyle) -> String {
    let street = address.field(keys::STREET);
    let city = address.field(keys::CITY);
    let state = address.field(keys::STATE);
    let zip = address.field(keys::ZIP);
    let country = address.field(keys::COUNTRY);

    let lines: Vec<String> = match style {
        AddressStyle::NorthAmerican => vec![
            join(&[street]),
            join(&[city, state, zip]),
            join(&[country]),
        ],
        AddressStyle::British => vec![
            join(&[street]),
            join(&[city]),
            join(&[zip]),
            join(&[country]),
        ],
        AddressStyle::EastAsian => vec![
            join(&[zip]),
            join(&[state, city]),
            join(&[street]),
            join(&[country]),
        ],
        AddressStyle::Continental => vec![
            join(&[street]),
            join(&[zip, city]),
            join(&[country]),
        ],
    };

    lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn join(parts: &[Option<&str>]) -> String {
    parts.iter().flatten().copied().collect::<Vec<_>>().join(" ")
}
