//! Address components and formatting.
//!
//! Reverse geocoding produces an [`AddressComponents`] mapping keyed by
//! address field name (see [`keys`]). [`full_address_from_dictionary`] turns
//! such a mapping into one localized, multi-line string.

mod format;

pub use format::{format_with_style, full_address_from_dictionary, AddressStyle};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known address field names.
pub mod keys {
    /// Name of the place (building, landmark).
    pub const NAME: &str = "Name";
    /// Street and house number.
    pub const STREET: &str = "Street";
    /// Neighbourhood or district.
    pub const SUB_LOCALITY: &str = "SubLocality";
    /// City or town.
    pub const CITY: &str = "City";
    /// County or equivalent.
    pub const SUB_ADMINISTRATIVE_AREA: &str = "SubAdministrativeArea";
    /// State or province.
    pub const STATE: &str = "State";
    /// Postal code.
    pub const ZIP: &str = "ZIP";
    /// Country name.
    pub const COUNTRY: &str = "Country";
    /// ISO 3166-1 alpha-2 country code.
    pub const COUNTRY_CODE: &str = "CountryCode";
}

/// Address fields keyed by field name.
///
/// Ordered by key so that serialization and iteration are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressComponents(BTreeMap<String, String>);

impl AddressComponents {
    /// Empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`AddressComponents::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Value of a field, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of a field with surrounding whitespace removed, if non-empty.
    pub(crate) fn field(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Country code, upper-cased.
    pub fn country_code(&self) -> Option<String> {
        self.field(keys::COUNTRY_CODE).map(str::to_uppercase)
    }
}

impl<K, V> FromIterator<(K, V)> for AddressComponents
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
