//! Coordinates and readings.

use std::fmt;
use std::time::{Duration, Instant};

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within their WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Reading> for Coordinate {
    fn from(reading: Reading) -> Self {
        reading.coordinate
    }
}

impl From<&Reading> for Coordinate {
    fn from(reading: &Reading) -> Self {
        reading.coordinate
    }
}

/// One sample from the location stream.
///
/// Mirrors what a platform location fix carries. Only `coordinate`,
/// `horizontal_accuracy` and `timestamp` take part in request evaluation;
/// the remaining fields are passed through to callers untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Position of the fix.
    pub coordinate: Coordinate,
    /// Radius of uncertainty in metres. Negative means the fix is invalid.
    pub horizontal_accuracy: f64,
    /// Altitude above sea level in metres, when known.
    pub altitude: Option<f64>,
    /// Altitude uncertainty in metres, when known.
    pub vertical_accuracy: Option<f64>,
    /// Ground speed in metres per second, when known.
    pub speed: Option<f64>,
    /// Course over ground in degrees (0 = north), when known.
    pub course: Option<f64>,
    /// When the fix was taken.
    pub timestamp: Instant,
}

impl Reading {
    /// Create a reading taken now.
    pub fn new(coordinate: Coordinate, horizontal_accuracy: f64) -> Self {
        Self::with_timestamp(coordinate, horizontal_accuracy, super::now())
    }

    /// Create a reading with an explicit timestamp.
    pub fn with_timestamp(
        coordinate: Coordinate,
        horizontal_accuracy: f64,
        timestamp: Instant,
    ) -> Self {
        Self {
            coordinate,
            horizontal_accuracy,
            altitude: None,
            vertical_accuracy: None,
            speed: None,
            course: None,
            timestamp,
        }
    }

    /// Attach altitude information.
    pub fn with_altitude(mut self, altitude: f64, vertical_accuracy: f64) -> Self {
        self.altitude = Some(altitude);
        self.vertical_accuracy = Some(vertical_accuracy);
        self
    }

    /// Attach speed and course information.
    pub fn with_motion(mut self, speed: f64, course: f64) -> Self {
        self.speed = Some(speed);
        self.course = Some(course);
        self
    }

    /// Whether the platform considers this fix usable.
    ///
    /// A negative or non-finite accuracy marks an invalid fix, as does a
    /// coordinate outside WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.horizontal_accuracy.is_finite()
            && self.horizontal_accuracy >= 0.0
            && self.coordinate.is_valid()
    }

    /// How old this reading is at `now`. Readings stamped in the future are age zero.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.timestamp)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ±{:.0}m", self.coordinate, self.horizontal_accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(53.55, 9.99).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_negative_accuracy_is_invalid() {
        let reading = Reading::new(Coordinate::new(1.0, 2.0), -1.0);
        assert!(!reading.is_valid());

        let reading = Reading::new(Coordinate::new(1.0, 2.0), 0.0);
        assert!(reading.is_valid());
    }

    #[test]
    fn test_age_saturates_for_future_timestamps() {
        let now = Instant::now();
        let reading = Reading::with_timestamp(
            Coordinate::new(0.0, 0.0),
            5.0,
            now + Duration::from_secs(3),
        );
        assert_eq!(reading.age(now), Duration::ZERO);

        let old = Reading::with_timestamp(Coordinate::new(0.0, 0.0), 5.0, now);
        assert_eq!(old.age(now + Duration::from_secs(7)), Duration::from_secs(7));
    }

    #[test]
    fn test_builders_attach_optional_fields() {
        let reading = Reading::new(Coordinate::new(0.0, 0.0), 5.0)
            .with_altitude(120.0, 8.0)
            .with_motion(3.5, 270.0);
        assert_eq!(reading.altitude, Some(120.0));
        assert_eq!(reading.vertical_accuracy, Some(8.0));
        assert_eq!(reading.speed, Some(3.5));
        assert_eq!(reading.course, Some(270.0));
    }

    #[test]
    fn test_display() {
        let reading = Reading::new(Coordinate::new(53.5, 9.75), 12.4);
        assert_eq!(reading.to_string(), "53.500000, 9.750000 ±12m");
    }
}
