//! Location value types shared with the host platform.
//!
//! Everything in this module describes what the platform hands us: readings,
//! authorization state, and positioning failures. No geodesy happens here;
//! accuracy filtering is a plain comparison of the platform-reported radius.

mod authorization;
mod error;
mod reading;

pub use authorization::{AuthorizationStatus, ParseAuthorizationError};
pub use error::LocationError;
pub use reading::{Coordinate, Reading};

use std::time::Instant;

/// Current instant on the Tokio clock.
///
/// Readings and request deadlines are both stamped through this so that a
/// paused test runtime sees a consistent timeline.
pub(crate) fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}
