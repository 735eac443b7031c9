//! Host platform boundary.
//!
//! The coordinator never talks to positioning hardware directly. It drives a
//! [`LocationProvider`] (start/stop the shared stream, query and prompt for
//! authorization) and consumes the [`ProviderEvent`]s the provider pushes into
//! the channel it was started with. Reverse geocoding goes through a separate
//! [`Geocoder`].
//!
//! # Dyn Compatibility
//!
//! Both traits are used as `Arc<dyn ...>`. The async geocoding method
//! therefore returns a boxed future rather than using `async fn`.

mod geocoder;
mod simulated;

pub use geocoder::StaticGeocoder;
pub use simulated::SimulatedProvider;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::address::AddressComponents;
use crate::location::{AuthorizationStatus, Coordinate, LocationError, Reading};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Channel a provider pushes its events into.
pub type EventSender = mpsc::UnboundedSender<ProviderEvent>;

/// Something the platform reported on the shared location stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// One or more new readings, oldest first.
    Readings(Vec<Reading>),
    /// The authorization state changed.
    AuthorizationChanged(AuthorizationStatus),
    /// The platform failed to produce a position.
    Failed(LocationError),
}

/// The host platform's location service.
///
/// Implementations must not call back into the coordinator synchronously from
/// these methods; events are delivered only through the [`EventSender`].
pub trait LocationProvider: Send + Sync {
    /// Begin delivering events on `events` until [`LocationProvider::stop_updates`].
    fn start_updates(&self, events: EventSender) -> Result<(), LocationError>;

    /// Stop delivering events and release the sender.
    fn stop_updates(&self);

    /// Current authorization state.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Ask the user for permission. The answer arrives as
    /// [`ProviderEvent::AuthorizationChanged`].
    fn request_authorization(&self) {}

    /// Hint the accuracy, in metres, the most demanding active request wants.
    fn set_desired_accuracy(&self, _meters: f64) {}
}

/// Reverse geocoding failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// The coordinate resolved to no address.
    #[error("No address found for {0}")]
    NoResult(Coordinate),

    /// The coordinate is outside WGS84 ranges.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(Coordinate),

    /// The geocoding service failed.
    #[error("Geocoder unavailable: {0}")]
    Unavailable(String),

    /// The center was built without a geocoder.
    #[error("No geocoder configured")]
    NotConfigured,
}

/// Reverse geocoding service.
pub trait Geocoder: Send + Sync {
    /// Resolve a coordinate to candidate addresses, best match first.
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> BoxFuture<'_, Result<Vec<AddressComponents>, GeocodeError>>;
}
