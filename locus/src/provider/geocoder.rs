//! Table-backed geocoder.

use super::{BoxFuture, GeocodeError, Geocoder};
use crate::address::AddressComponents;
use crate::location::Coordinate;

/// Default match tolerance in degrees (roughly 1 km at the equator).
pub const DEFAULT_TOLERANCE_DEG: f64 = 0.01;

/// Geocoder answering from a fixed table of known places.
///
/// A query matches every entry whose latitude and longitude are both within
/// the tolerance of the queried coordinate, in insertion order.
#[derive(Debug, Clone)]
pub struct StaticGeocoder {
    entries: Vec<(Coordinate, AddressComponents)>,
    tolerance_deg: f64,
}

impl Default for StaticGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticGeocoder {
    /// Empty table with the default tolerance.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            tolerance_deg: DEFAULT_TOLERANCE_DEG,
        }
    }

    /// Set the match tolerance in degrees.
    pub fn with_tolerance(mut self, tolerance_deg: f64) -> Self {
        self.tolerance_deg = tolerance_deg;
        self
    }

    /// Add a known place.
    pub fn with_entry(mut self, coordinate: Coordinate, address: AddressComponents) -> Self {
        self.insert(coordinate, address);
        self
    }

    /// Add a known place.
    pub fn insert(&mut self, coordinate: Coordinate, address: AddressComponents) {
        self.entries.push((coordinate, address));
    }

    fn lookup(&self, query: Coordinate) -> Vec<AddressComponents> {
        self.entries
            .iter()
            .filter(|(at, _)| {
                (at.latitude - query.latitude).abs() <= self.tolerance_deg
                    && (at.longitude - query.longitude).abs() <= self.tolerance_deg
            })
            .map(|(_, address)| address.clone())
            .collect()
    }
}

impl Geocoder for StaticGeocoder {
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<Vec<AddressComponents>, GeocodeError>> {
        let matches = self.lookup(coordinate);
        Box::pin(async move { Ok(matches) })
    }
}
