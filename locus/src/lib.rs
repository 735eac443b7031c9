//! Locus - accuracy and timeout bounded location requests.
//!
//! This library multiplexes any number of positioning requests onto a single
//! shared location stream supplied by a host platform. Each request carries its
//! own accuracy and timeout constraints and is evaluated independently against
//! every reading the platform delivers.
//!
//! # Architecture
//!
//! ```text
//! LocationProvider ──► ProviderEvent ──► LocationCenter (driver task)
//!  (host platform)       (mpsc)             │
//!                                           ├──► RequestQueue ──► new-best callbacks
//!                                           │                └──► finish callbacks
//!                                           └──► start/stop + accuracy hint
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use locus::{Decision, LocationCenter, LocationRequest, SimulatedProvider};
//!
//! let provider = Arc::new(SimulatedProvider::new());
//! let center = LocationCenter::new(provider);
//!
//! let request = LocationRequest::new()
//!     .with_desired_accuracy(10.0)
//!     .with_min_accuracy(100.0)
//!     .with_timeout(Duration::from_secs(30))
//!     .on_new_best_location(|reading| {
//!         println!("candidate: {}", reading);
//!         Decision::Continue
//!     })
//!     .on_finish(|status, _error| println!("finished: {}", status));
//!
//! let handle = center.process_request(request);
//! let status = handle.finished().await;
//! ```

pub mod address;
pub mod center;
pub mod config;
pub mod introspect;
pub mod location;
pub mod logging;
pub mod provider;
pub mod request;

pub use address::{full_address_from_dictionary, AddressComponents, AddressStyle};
pub use center::{CenterError, LocationCenter, LocationCenterBuilder, WeakLocationCenter};
pub use config::{CenterConfig, ConfigFile, RequestDefaults};
pub use location::{AuthorizationStatus, Coordinate, LocationError, Reading};
pub use provider::{
    GeocodeError, Geocoder, LocationProvider, ProviderEvent, SimulatedProvider, StaticGeocoder,
};
pub use request::{
    string_for_finish_status, Decision, FinishStatus, LocationObserver, LocationRequest,
    RequestHandle, RequestId,
};

/// Crate version, as reported by the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
