//! Location requests.
//!
//! A [`LocationRequest`] describes one positioning job: how fresh and how
//! accurate a reading has to be, how long to keep trying, and what to call
//! along the way. Requests are configured by the caller and then handed to
//! [`crate::LocationCenter::process_request`], which takes ownership; a request
//! can therefore only ever be submitted once and its callbacks cannot be
//! swapped after submission.
//!
//! Constraints left unset are filled in from the center's
//! [`crate::RequestDefaults`] at submission time.

mod handle;
mod observer;
mod status;

pub use handle::{RequestHandle, RequestId};
pub use observer::LocationObserver;
pub(crate) use observer::ObserverList;
pub use status::{string_for_finish_status, Decision, FinishStatus};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::location::{LocationError, Reading};

/// Called with every reading that passes the request's freshness and
/// minimum-accuracy filters.
pub type NewBestLocationCallback = Box<dyn FnMut(&Reading) -> Decision + Send>;

/// Called exactly once when the request reaches a terminal status.
pub type FinishCallback = Box<dyn FnOnce(FinishStatus, Option<LocationError>) + Send>;

/// One positioning request.
pub struct LocationRequest {
    pub(crate) time_relevance: Option<Duration>,
    pub(crate) desired_accuracy: Option<f64>,
    pub(crate) min_accuracy: Option<f64>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) new_best_location: Option<NewBestLocationCallback>,
    pub(crate) finish: Option<FinishCallback>,
    pub(crate) observers: ObserverList,
    pub(crate) handle: RequestHandle,
}

impl LocationRequest {
    /// Create a request with no callbacks and every constraint unset.
    pub fn new() -> Self {
        Self {
            time_relevance: None,
            desired_accuracy: None,
            min_accuracy: None,
            timeout: None,
            new_best_location: None,
            finish: None,
            observers: ObserverList::default(),
            handle: RequestHandle::new(),
        }
    }

    /// Factory alias for [`LocationRequest::new`].
    pub fn request() -> Self {
        Self::new()
    }

    /// Human-readable text for a finish status.
    pub fn string_for_finish_status(status: FinishStatus) -> &'static str {
        string_for_finish_status(status)
    }

    /// Maximum age of a reading that may still be reported.
    pub fn with_time_relevance(mut self, time_relevance: Duration) -> Self {
        self.time_relevance = Some(time_relevance);
        self
    }

    /// Accuracy in metres at which the request finishes successfully.
    ///
    /// NaN, infinite or negative values are replaced by the center's default
    /// at submission.
    pub fn with_desired_accuracy(mut self, meters: f64) -> Self {
        self.desired_accuracy = Some(meters);
        self
    }

    /// Coarsest accuracy in metres that is still reported to the caller.
    ///
    /// Invalid values are handled as for [`LocationRequest::with_desired_accuracy`].
    pub fn with_min_accuracy(mut self, meters: f64) -> Self {
        self.min_accuracy = Some(meters);
        self
    }

    /// How long after submission the request gives up with `TimedOut`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builder form of [`LocationRequest::set_new_best_location_callback`].
    pub fn on_new_best_location<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Reading) -> Decision + Send + 'static,
    {
        self.set_new_best_location_callback(callback);
        self
    }

    /// Builder form of [`LocationRequest::set_finish_callback`].
    pub fn on_finish<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(FinishStatus, Option<LocationError>) + Send + 'static,
    {
        self.set_finish_callback(callback);
        self
    }

    /// Register (or replace) the "new best location" callback.
    ///
    /// Returning [`Decision::Finish`] ends the request with `ReachedAccuracy`.
    pub fn set_new_best_location_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&Reading) -> Decision + Send + 'static,
    {
        self.new_best_location = Some(Box::new(callback));
    }

    /// Register (or replace) the finish callback.
    pub fn set_finish_callback<F>(&mut self, callback: F)
    where
        F: FnOnce(FinishStatus, Option<LocationError>) + Send + 'static,
    {
        self.finish = Some(Box::new(callback));
    }

    /// Register an observer for raw provider events.
    ///
    /// Only a weak reference is kept.
    pub fn add_observer<O: LocationObserver + 'static>(&mut self, observer: &Arc<O>) {
        self.observers.push(observer);
    }

    /// Builder form of [`LocationRequest::add_observer`].
    pub fn with_observer<O: LocationObserver + 'static>(mut self, observer: &Arc<O>) -> Self {
        self.add_observer(observer);
        self
    }

    /// A handle that stays valid after the request has been submitted.
    pub fn handle(&self) -> RequestHandle {
        self.handle.clone()
    }

    /// Identifier of this request.
    pub fn id(&self) -> RequestId {
        self.handle.id()
    }

    /// Cancel the request.
    ///
    /// Before submission this makes the request finish with `Canceled` as
    /// soon as it is submitted.
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Configured freshness bound, if set.
    pub fn time_relevance(&self) -> Option<Duration> {
        self.time_relevance
    }

    /// Configured desired accuracy, if set.
    pub fn desired_accuracy(&self) -> Option<f64> {
        self.desired_accuracy
    }

    /// Configured minimum accuracy, if set.
    pub fn min_accuracy(&self) -> Option<f64> {
        self.min_accuracy
    }

    /// Configured timeout, if set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationRequest")
            .field("id", &self.handle.id())
            .field("time_relevance", &self.time_relevance)
            .field("desired_accuracy", &self.desired_accuracy)
            .field("min_accuracy", &self.min_accuracy)
            .field("timeout", &self.timeout)
            .field("has_new_best_location", &self.new_best_location.is_some())
            .field("has_finish", &self.finish.is_some())
            .field("observers", &self.observers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Coordinate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new_request_is_unconfigured() {
        let request = LocationRequest::request();
        assert!(request.time_relevance().is_none());
        assert!(request.desired_accuracy().is_none());
        assert!(request.min_accuracy().is_none());
        assert!(request.timeout().is_none());
        assert!(request.new_best_location.is_none());
        assert!(request.finish.is_none());
    }

    #[test]
    fn test_builder_sets_constraints() {
        let request = LocationRequest::new()
            .with_time_relevance(Duration::from_secs(5))
            .with_desired_accuracy(10.0)
            .with_min_accuracy(100.0)
            .with_timeout(Duration::from_secs(30));
        assert_eq!(request.time_relevance(), Some(Duration::from_secs(5)));
        assert_eq!(request.desired_accuracy(), Some(10.0));
        assert_eq!(request.min_accuracy(), Some(100.0));
        assert_eq!(request.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_callback_can_be_replaced_before_submission() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut request = LocationRequest::new();
        let counter = Arc::clone(&first);
        request.set_new_best_location_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Decision::Continue
        });
        let counter = Arc::clone(&second);
        request.set_new_best_location_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Decision::Finish
        });

        let reading = Reading::new(Coordinate::new(0.0, 0.0), 5.0);
        let callback = request.new_best_location.as_mut().unwrap();
        assert_eq!(callback(&reading), Decision::Finish);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_before_submission_marks_handle() {
        let request = LocationRequest::new();
        let handle = request.handle();
        request.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(handle.id(), request.id());
    }

    #[test]
    fn test_string_for_finish_status_alias() {
        assert_eq!(
            LocationRequest::string_for_finish_status(FinishStatus::TimedOut),
            "Timed out"
        );
    }
}
