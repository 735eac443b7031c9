//! Observers of raw provider events.
//!
//! An observer sees every provider event delivered while its request is
//! active, before the coordinator evaluates the request. Observers are held
//! weakly: the coordinator never keeps one alive, and dropped observers are
//! pruned on the next forward.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use tracing::warn;

use crate::location::{AuthorizationStatus, LocationError, Reading};

/// Receives raw provider events for observation only.
///
/// All methods default to doing nothing; nothing an observer does influences
/// how the coordinator evaluates requests.
pub trait LocationObserver: Send + Sync {
    /// A batch of readings arrived.
    fn on_readings(&self, _readings: &[Reading]) {}

    /// The platform authorization state changed.
    fn on_authorization_changed(&self, _status: AuthorizationStatus) {}

    /// The platform reported a positioning failure.
    fn on_error(&self, _error: &LocationError) {}
}

/// Weakly held observers of one request.
#[derive(Default)]
pub(crate) struct ObserverList {
    observers: Vec<Weak<dyn LocationObserver>>,
}

impl ObserverList {
    pub(crate) fn push<O: LocationObserver + 'static>(&mut self, observer: &Arc<O>) {
        let weak: Weak<O> = Arc::downgrade(observer);
        let weak: Weak<dyn LocationObserver> = weak;
        self.observers.push(weak);
    }

    /// Call `f` on every live observer, dropping the dead ones.
    ///
    /// An observer that panics is dropped as well.
    pub(crate) fn forward(&mut self, mut f: impl FnMut(&dyn LocationObserver)) {
        self.observers.retain(|weak| match weak.upgrade() {
            Some(observer) => {
                let delivered =
                    panic::catch_unwind(AssertUnwindSafe(|| f(observer.as_ref()))).is_ok();
                if !delivered {
                    warn!("Location observer panicked, removing it");
                }
                delivered
            }
            None => false,
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("registered", &self.len())
            .finish()
    }
}
