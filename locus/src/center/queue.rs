//! Per-request evaluation engine.
//!
//! Pure and synchronous: given the set of active requests and one provider
//! event at an explicit instant, decide which callbacks fire and which
//! requests terminate. The center owns locking, timers and the stream.
//!
//! Evaluation order for one request and one reading:
//!
//! ```text
//! cancelled? ──yes──► Canceled
//! deadline reached? ──yes──► TimedOut
//! reading older than time_relevance? ──yes──► skip reading
//! invalid or coarser than min_accuracy? ──yes──► skip reading
//! new_best_location(reading) == Finish? ──yes──► ReachedAccuracy
//! accuracy <= desired_accuracy? ──yes──► ReachedAccuracy
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::config::RequestDefaults;
use crate::location::{now, AuthorizationStatus, LocationError, Reading};
use crate::request::{
    Decision, FinishCallback, FinishStatus, LocationRequest, NewBestLocationCallback,
    ObserverList, RequestHandle, RequestId,
};

/// Error message carried by a request whose new-best callback panicked.
pub(crate) const CALLBACK_PANICKED: &str = "new best location callback panicked";

/// Request constraints with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Constraints {
    pub time_relevance: Duration,
    pub desired_accuracy: f64,
    pub min_accuracy: f64,
    pub timeout: Duration,
}

impl Constraints {
    fn resolve(request: &LocationRequest, defaults: &RequestDefaults) -> Self {
        Self {
            time_relevance: request.time_relevance.unwrap_or(defaults.time_relevance),
            desired_accuracy: resolve_meters(
                request,
                "desired_accuracy",
                request.desired_accuracy,
                defaults.desired_accuracy,
            ),
            min_accuracy: resolve_meters(
                request,
                "min_accuracy",
                request.min_accuracy,
                defaults.min_accuracy,
            ),
            timeout: request.timeout.unwrap_or(defaults.timeout),
        }
    }
}

/// NaN, infinite and negative accuracies fall back to the default.
fn resolve_meters(
    request: &LocationRequest,
    field: &'static str,
    value: Option<f64>,
    default: f64,
) -> f64 {
    match value {
        Some(meters) if meters.is_finite() && meters >= 0.0 => meters,
        Some(meters) => {
            warn!(
                request_id = request.id().get(),
                field,
                meters,
                default,
                "Ignoring invalid accuracy, using default"
            );
            default
        }
        None => default,
    }
}

/// Why and how a request ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Termination {
    pub status: FinishStatus,
    pub error: Option<LocationError>,
}

impl Termination {
    pub(crate) fn new(status: FinishStatus) -> Self {
        Self {
            status,
            error: None,
        }
    }

    fn with_error(status: FinishStatus, error: LocationError) -> Self {
        Self {
            status,
            error: Some(error),
        }
    }
}

/// A submitted request being evaluated.
pub(crate) struct ActiveRequest {
    handle: RequestHandle,
    constraints: Constraints,
    started_at: Instant,
    /// `None` when the timeout is too large to represent.
    deadline: Option<Instant>,
    new_best_location: Option<NewBestLocationCallback>,
    finish: Option<FinishCallback>,
    observers: ObserverList,
    accepted: usize,
    best: Option<Reading>,
}

impl ActiveRequest {
    pub(crate) fn new(request: LocationRequest, defaults: &RequestDefaults, now: Instant) -> Self {
        let constraints = Constraints::resolve(&request, defaults);
        let LocationRequest {
            new_best_location,
            finish,
            observers,
            handle,
            ..
        } = request;
        Self {
            handle,
            constraints,
            started_at: now,
            deadline: now.checked_add(constraints.timeout),
            new_best_location,
            finish,
            observers,
            accepted: 0,
            best: None,
        }
    }

    pub(crate) fn id(&self) -> RequestId {
        self.handle.id()
    }

    pub(crate) fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Readings reported to the caller so far.
    pub(crate) fn accepted(&self) -> usize {
        self.accepted
    }

    /// Most accurate reading reported so far.
    pub(crate) fn best(&self) -> Option<&Reading> {
        self.best.as_ref()
    }

    /// Cancellation and deadline checks, independent of any reading.
    pub(crate) fn check_lifecycle(&self, now: Instant) -> Option<Termination> {
        if self.handle.is_cancelled() {
            return Some(Termination::new(FinishStatus::Canceled));
        }
        match self.deadline {
            Some(deadline) if now >= deadline => Some(Termination::new(FinishStatus::TimedOut)),
            _ => None,
        }
    }

    /// Evaluate one reading against this request.
    pub(crate) fn evaluate_reading(&mut self, reading: &Reading, now: Instant) -> Option<Termination> {
        if let Some(termination) = self.check_lifecycle(now) {
            return Some(termination);
        }

        let age = reading.age(now);
        if age > self.constraints.time_relevance {
            trace!(
                request_id = self.id().get(),
                age_ms = age.as_millis() as u64,
                "Reading too old for request"
            );
            return None;
        }

        let accuracy = reading.horizontal_accuracy;
        if !reading.is_valid() || accuracy > self.constraints.min_accuracy {
            trace!(
                request_id = self.id().get(),
                accuracy,
                min_accuracy = self.constraints.min_accuracy,
                "Reading not accurate enough to report"
            );
            return None;
        }

        self.accepted += 1;
        if self
            .best
            .map_or(true, |best| accuracy < best.horizontal_accuracy)
        {
            self.best = Some(*reading);
        }

        if let Some(callback) = self.new_best_location.as_mut() {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(reading))) {
                Ok(Decision::Finish) => {
                    debug!(request_id = self.id().get(), "Caller finished request");
                    return Some(Termination::new(FinishStatus::ReachedAccuracy));
                }
                Ok(Decision::Continue) => {}
                Err(_) => {
                    warn!(
                        request_id = self.id().get(),
                        "New best location callback panicked"
                    );
                    return Some(Termination::with_error(
                        FinishStatus::Error,
                        LocationError::Other(CALLBACK_PANICKED.to_string()),
                    ));
                }
            }
        }

        if accuracy <= self.constraints.desired_accuracy {
            return Some(Termination::new(FinishStatus::ReachedAccuracy));
        }

        None
    }

    /// React to a platform positioning failure.
    fn evaluate_error(&self, error: &LocationError) -> Option<Termination> {
        if error.is_denied() {
            return Some(Termination::with_error(
                FinishStatus::NotProperlyAuthorized,
                error.clone(),
            ));
        }
        if self.accepted == 0 {
            return Some(Termination::with_error(FinishStatus::Error, error.clone()));
        }
        debug!(
            request_id = self.id().get(),
            accepted = self.accepted,
            error = %error,
            "Ignoring positioning error, request already has readings"
        );
        None
    }

    /// Invoke the finish callback and mark the handle. Consumes the request,
    /// so no further callback can ever be invoked for it.
    pub(crate) fn finish(mut self, termination: Termination) {
        let Termination { status, error } = termination;
        debug!(
            request_id = self.id().get(),
            status = %status,
            accepted = self.accepted(),
            best_accuracy = self.best().map(|r| r.horizontal_accuracy),
            elapsed_ms = now()
                .saturating_duration_since(self.started_at)
                .as_millis() as u64,
            "Request finished"
        );
        if let Some(finish) = self.finish.take() {
            if panic::catch_unwind(AssertUnwindSafe(|| finish(status, error))).is_err() {
                warn!(request_id = self.id().get(), "Finish callback panicked");
            }
        }
        self.handle.mark_finished(status);
    }
}

impl fmt::Debug for ActiveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRequest")
            .field("id", &self.id())
            .field("constraints", &self.constraints)
            .field("deadline", &self.deadline)
            .field("accepted", &self.accepted)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

/// A request that reached a terminal status but whose finish callback has
/// not been invoked yet.
#[derive(Debug)]
pub(crate) struct Completion {
    request: ActiveRequest,
    termination: Termination,
}

impl Completion {
    /// Invoke the finish callback.
    pub(crate) fn deliver(self) {
        self.request.finish(self.termination);
    }
}

/// The set of active requests.
#[derive(Debug, Default)]
pub(crate) struct RequestQueue {
    requests: Vec<ActiveRequest>,
}

impl RequestQueue {
    pub(crate) fn insert(&mut self, request: ActiveRequest) {
        self.requests.push(request);
    }

    pub(crate) fn len(&self) -> usize {
        self.requests.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Move every request from `other` into this queue.
    pub(crate) fn absorb(&mut self, other: RequestQueue) {
        self.requests.extend(other.requests);
    }

    /// Earliest deadline among active requests.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.requests.iter().filter_map(ActiveRequest::deadline).min()
    }

    /// Finest desired accuracy among active requests.
    pub(crate) fn finest_desired_accuracy(&self) -> Option<f64> {
        self.requests
            .iter()
            .map(|r| r.constraints().desired_accuracy)
            .reduce(f64::min)
    }

    /// Deliver a batch of readings to every request.
    pub(crate) fn on_readings(&mut self, readings: &[Reading], now: Instant) -> Vec<Completion> {
        self.evaluate_each(now, |request| {
            request.observers.forward(|o| o.on_readings(readings));
            readings
                .iter()
                .find_map(|reading| request.evaluate_reading(reading, now))
        })
    }

    /// Apply an authorization change. Refusal finishes every request.
    pub(crate) fn on_authorization(
        &mut self,
        status: AuthorizationStatus,
        now: Instant,
    ) -> Vec<Completion> {
        self.evaluate_each(now, |request| {
            request
                .observers
                .forward(|o| o.on_authorization_changed(status));
            status
                .is_refused()
                .then(|| Termination::new(FinishStatus::NotProperlyAuthorized))
        })
    }

    /// Apply a platform positioning failure.
    pub(crate) fn on_error(&mut self, error: &LocationError, now: Instant) -> Vec<Completion> {
        self.evaluate_each(now, |request| {
            request.observers.forward(|o| o.on_error(error));
            request.evaluate_error(error)
        })
    }

    /// Cancellation and deadline sweep with no provider event.
    pub(crate) fn sweep(&mut self, now: Instant) -> Vec<Completion> {
        self.evaluate_each(now, |_| None)
    }

    /// Terminate every request with the same status.
    pub(crate) fn finish_all(
        &mut self,
        status: FinishStatus,
        error: Option<LocationError>,
    ) -> Vec<Completion> {
        self.requests
            .drain(..)
            .map(|request| Completion {
                request,
                termination: Termination {
                    status,
                    error: error.clone(),
                },
            })
            .collect()
    }

    /// Run lifecycle checks, then `evaluate` on every still-live request.
    fn evaluate_each(
        &mut self,
        now: Instant,
        mut evaluate: impl FnMut(&mut ActiveRequest) -> Option<Termination>,
    ) -> Vec<Completion> {
        let mut completed = Vec::new();
        let mut remaining = Vec::with_capacity(self.requests.len());

        for mut request in self.requests.drain(..) {
            let outcome = request
                .check_lifecycle(now)
                .or_else(|| evaluate(&mut request));
            match outcome {
                Some(termination) => completed.push(Completion {
                    request,
                    termination,
                }),
                None => remaining.push(request),
            }
        }

        self.requests = remaining;
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Coordinate;
    use crate::request::LocationObserver;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    fn defaults() -> RequestDefaults {
        RequestDefaults::default()
    }

    fn reading(accuracy: f64, at: Instant) -> Reading {
        Reading::with_timestamp(Coordinate::new(53.55, 9.99), accuracy, at)
    }

    /// Request with min 100m, desired 10m, timeout 30s that logs every callback.
    fn logged_request(log: &Log) -> LocationRequest {
        let best = Arc::clone(log);
        let finish = Arc::clone(log);
        LocationRequest::new()
            .with_min_accuracy(100.0)
            .with_desired_accuracy(10.0)
            .with_timeout(Duration::from_secs(30))
            .with_time_relevance(Duration::from_secs(5))
            .on_new_best_location(move |r| {
                best.lock().push(format!("best {}", r.horizontal_accuracy));
                Decision::Continue
            })
            .on_finish(move |status, _| finish.lock().push(format!("finish {:?}", status)))
    }

    fn deliver_all(completions: Vec<Completion>) {
        for completion in completions {
            completion.deliver();
        }
    }

    #[test]
    fn test_unset_constraints_use_defaults() {
        let defaults = defaults().with_desired_accuracy(42.0);
        let request = LocationRequest::new().with_min_accuracy(7.0);
        let active = ActiveRequest::new(request, &defaults, Instant::now());
        assert_eq!(active.constraints().desired_accuracy, 42.0);
        assert_eq!(active.constraints().min_accuracy, 7.0);
        assert_eq!(active.constraints().timeout, defaults.timeout);
    }

    #[test]
    fn test_invalid_accuracies_fall_back_to_defaults() {
        let request = LocationRequest::new()
            .with_min_accuracy(f64::NAN)
            .with_desired_accuracy(-5.0);
        let active = ActiveRequest::new(request, &defaults(), Instant::now());
        assert_eq!(active.constraints().min_accuracy, 1000.0);
        assert_eq!(active.constraints().desired_accuracy, 10.0);

        let t0 = Instant::now();
        let request = LocationRequest::new()
            .with_min_accuracy(f64::INFINITY)
            .with_desired_accuracy(1.0);
        let mut queue = RequestQueue::default();
        queue.insert(ActiveRequest::new(request, &defaults(), t0));
        assert!(queue.on_readings(&[reading(5000.0, t0)], t0).is_empty());
        assert_eq!(queue.requests[0].accepted(), 0);
    }

    #[test]
    fn test_reading_between_min_and_desired_reports_without_finishing() {
        let log = Log::default();
        let t0 = Instant::now();
        let mut queue = RequestQueue::default();
        queue.insert(ActiveRequest::new(logged_request(&log), &defaults(), t0));

        let t1 = t0 + Duration::from_secs(1);
        let done = queue.on_readings(&[reading(50.0, t1)], t1);
        assert!(done.is_empty());
        assert_eq!(queue.len(), 1);

        let t2 = t0 + Duration::from_secs(2);
        let done = queue.on_readings(&[reading(8.0, t2)], t2);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].termination.status, FinishStatus::ReachedAccuracy);
        deliver_all(done);

        assert!(queue.is_empty());
        assert_eq!(
            *log.lock(),
            vec!["best 50", "best 8", "finish ReachedAccuracy"]
        );
    }

    #[test]
    fn test_coarse_and_stale_readings_are_not_reported() {
        let log = Log::default();
        let t0 = Instant::now();
        let mut queue = RequestQueue::default();
        queue.insert(ActiveRequest::new(logged_request(&log), &defaults(), t0));

        let now = t0 + Duration::from_secs(10);
        let coarse = reading(150.0, now);
        let stale = reading(5.0, now - Duration::from_secs(6));
        let invalid = reading(-1.0, now);

        let done = queue.on_readings(&[coarse, stale, invalid], now);
        assert!(done.is_empty());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_callback_can_finish_early() {
        let t0 = Instant::now();
        let request = LocationRequest::new()
            .with_min_accuracy(100.0)
            .with_desired_accuracy(1.0)
            .on_new_best_location(|_| Decision::Finish);
        let mut queue = RequestQueue::default();
        queue.insert(ActiveRequest::new(request, &defaults(), t0));

        let done = queue.on_readings(&[reading(80.0, t0)], t0);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].termination.status, FinishStatus::ReachedAccuracy);
    }

    #[test]
    fn test_batch_stops_at_first_terminal_reading() {
        let log = Log::default();
        let t0 = Instant::now();
        let mut queue = RequestQueue::default();
        queue.insert(ActiveRequest::new(logged_request(&log), &defaults(), t0));

        let done = queue.on_readings(&[reading(9.0, t0), reading(3.0, t0)], t0);
        deliver_all(done);
        assert_eq!(*log.lock(), vec!["best 9", "finish ReachedAccuracy"]);
    }

    #[test]
    fn test_deadline_wins_over_late_accurate_reading() {
        let log = Log::default();
        let t0 = Instant::now();
        let mut queue = RequestQueue::default();
        queue.insert(ActiveRequest::new(logged_request(&log), &defaults(), t0));

        let late = t0 + Duration::from_secs(30);
        let done = queue.on_readings(&[reading(1.0, late)], late);
        assert_eq!(done[0].termination.status, FinishStatus::TimedOut);
        deliver_all(done);
        assert_eq!(*log.lock(), vec!["finish TimedOut"]);
    }

    #[test]
    fn test_sweep_times_out_and_cancels() {
        let t0 = Instant::now();
        let mut queue = RequestQueue::default();

        let patient = LocationRequest::new().with_timeout(Duration::from_secs(60));
        let cancelled = LocationRequest::new().with_timeout(Duration::from_secs(60));
        let hasty = LocationRequest::new().with_timeout(Duration::from_secs(5));
        let cancelled_handle = cancelled.handle();
        let hasty_id = hasty.id();

        queue.insert(ActiveRequest::new(patient, &defaults(), t0));
        queue.insert(ActiveRequest::new(cancelled, &defaults(), t0));
        queue.insert(ActiveRequest::new(hasty, &defaults(), t0));
        assert_eq!(queue.next_deadline(), Some(t0 + Duration::from_secs(5)));

        assert!(queue.sweep(t0 + Duration::from_secs(1)).is_empty());

        cancelled_handle.cancel();
        let done = queue.sweep(t0 + Duration::from_secs(5));
        let statuses: Vec<_> = done
            .iter()
            .map(|c| (c.request.id(), c.termination.status))
            .collect();
        assert_eq!(statuses.len(), 2);
        assert!(statuses.contains(&(cancelled_handle.id(), FinishStatus::Canceled)));
        assert!(statuses.contains(&(hasty_id, FinishStatus::TimedOut)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_no_callbacks_after_cancel_observed() {
        let log = Log::default();
        let t0 = Instant::now();
        let request = logged_request(&log);
        let handle = request.handle();
        let mut queue = RequestQueue::default();
        queue.insert(ActiveRequest::new(request, &defaults(), t0));

        handle.cancel();
        let done = queue.on_readings(&[reading(50.0, t0)], t0);
        deliver_all(done);
        assert_eq!(*log.lock(), vec!["finish Canceled"]);
        assert_eq!(handle.status(), Some(FinishStatus::Canceled));
    }

    #[test]
    fn test_refused_authorization_finishes_everything() {
        let t0 = Instant::now();
        let mut queue = RequestQueue::default();
        for _ in 0..3 {
            queue.insert(ActiveRequest::new(LocationRequest::new(), &defaults(), t0));
        }

        assert!(queue
            .on_authorization(AuthorizationStatus::AuthorizedAlways, t0)
            .is_empty());
        let done = queue.on_authorization(AuthorizationStatus::Restricted, t0);
        assert_eq!(done.len(), 3);
        assert!(done
            .iter()
            .all(|c| c.termination.status == FinishStatus::NotProperlyAuthorized));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_error_only_finishes_requests_without_readings() {
        let t0 = Instant::now();
        let mut queue = RequestQueue::default();
        let fresh = LocationRequest::new().with_min_accuracy(100.0);
        let served = LocationRequest::new()
            .with_min_accuracy(100.0)
            .with_desired_accuracy(1.0);
        let fresh_id = fresh.id();
        queue.insert(ActiveRequest::new(served, &defaults(), t0));
        // `fresh` is submitted after the reading, so it has accepted nothing.
        assert!(queue.on_readings(&[reading(40.0, t0)], t0).is_empty());
        queue.insert(ActiveRequest::new(fresh, &defaults(), t0));

        let done = queue.on_error(&LocationError::LocationUnknown, t0);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].request.id(), fresh_id);
        assert_eq!(done[0].termination.status, FinishStatus::Error);
        assert_eq!(
            done[0].termination.error,
            Some(LocationError::LocationUnknown)
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_denied_error_is_authorization_failure() {
        let t0 = Instant::now();
        let mut queue = RequestQueue::default();
        queue.insert(ActiveRequest::new(LocationRequest::new(), &defaults(), t0));
        let done = queue.on_error(&LocationError::Denied, t0);
        assert_eq!(done[0].termination.status, FinishStatus::NotProperlyAuthorized);
    }

    #[test]
    fn test_best_tracks_most_accurate_reported_reading() {
        let t0 = Instant::now();
        let request = LocationRequest::new()
            .with_min_accuracy(100.0)
            .with_desired_accuracy(1.0);
        let mut active = ActiveRequest::new(request, &defaults(), t0);
        for accuracy in [80.0, 20.0, 60.0] {
            assert!(active.evaluate_reading(&reading(accuracy, t0), t0).is_none());
        }
        assert_eq!(active.accepted(), 3);
        assert_eq!(active.best().map(|r| r.horizontal_accuracy), Some(20.0));
    }

    #[test]
    fn test_finest_desired_accuracy() {
        let t0 = Instant::now();
        let mut queue = RequestQueue::default();
        assert_eq!(queue.finest_desired_accuracy(), None);
        for accuracy in [50.0, 5.0, 20.0] {
            let request = LocationRequest::new().with_desired_accuracy(accuracy);
            queue.insert(ActiveRequest::new(request, &defaults(), t0));
        }
        assert_eq!(queue.finest_desired_accuracy(), Some(5.0));
    }

    #[test]
    fn test_panicking_callback_finishes_with_error() {
        let t0 = Instant::now();
        let panicking = LocationRequest::new()
            .with_min_accuracy(100.0)
            .with_desired_accuracy(1.0)
            .on_new_best_location(|_| panic!("callback failure"));
        let bystander = LocationRequest::new()
            .with_min_accuracy(100.0)
            .with_desired_accuracy(1.0);
        let panicking_id = panicking.id();
        let mut queue = RequestQueue::default();
        queue.insert(ActiveRequest::new(panicking, &defaults(), t0));
        queue.insert(ActiveRequest::new(bystander, &defaults(), t0));

        let done = queue.on_readings(&[reading(50.0, t0)], t0);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].request.id(), panicking_id);
        assert_eq!(done[0].termination.status, FinishStatus::Error);
        assert_eq!(
            done[0].termination.error,
            Some(LocationError::Other(CALLBACK_PANICKED.to_string()))
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.requests[0].accepted(), 1);
    }

    #[test]
    fn test_panicking_finish_callback_still_marks_handle() {
        let request = LocationRequest::new().on_finish(|_, _| panic!("finish failure"));
        let handle = request.handle();
        let active = ActiveRequest::new(request, &defaults(), Instant::now());

        active.finish(Termination::new(FinishStatus::Canceled));
        assert_eq!(handle.status(), Some(FinishStatus::Canceled));
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<&'static str>>,
    }

    impl LocationObserver for Recorder {
        fn on_readings(&self, _readings: &[Reading]) {
            self.events.lock().push("readings");
        }
        fn on_authorization_changed(&self, _status: AuthorizationStatus) {
            self.events.lock().push("authorization");
        }
        fn on_error(&self, _error: &LocationError) {
            self.events.lock().push("error");
        }
    }

    #[test]
    fn test_observers_see_raw_events_while_active() {
        let t0 = Instant::now();
        let recorder = Arc::new(Recorder::default());
        let request = LocationRequest::new()
            .with_min_accuracy(100.0)
            .with_desired_accuracy(1.0)
            .with_observer(&recorder);
        let mut queue = RequestQueue::default();
        queue.insert(ActiveRequest::new(request, &defaults(), t0));

        // Rejected readings are still forwarded.
        assert!(queue.on_readings(&[reading(500.0, t0)], t0).is_empty());
        assert!(queue
            .on_authorization(AuthorizationStatus::AuthorizedAlways, t0)
            .is_empty());
        assert!(queue.on_readings(&[reading(50.0, t0)], t0).is_empty());
        deliver_all(queue.on_error(&LocationError::Denied, t0));

        // Terminal: nothing more is forwarded.
        assert!(queue.on_readings(&[reading(1.0, t0)], t0).is_empty());
        assert_eq!(
            *recorder.events.lock(),
            vec!["readings", "authorization", "readings", "error"]
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whatever readings arrive, each request finishes at most once and
            /// only with a status consistent with its constraints.
            #[test]
            fn test_finish_at_most_once(
                accuracies in proptest::collection::vec(0.0..500.0_f64, 0..40),
                desired in 1.0..50.0_f64,
                min in 50.0..400.0_f64,
            ) {
                let finishes = Arc::new(Mutex::new(Vec::new()));
                let reported = Arc::new(Mutex::new(Vec::new()));
                let t0 = Instant::now();

                let f = Arc::clone(&finishes);
                let r = Arc::clone(&reported);
                let request = LocationRequest::new()
                    .with_desired_accuracy(desired)
                    .with_min_accuracy(min)
                    .with_timeout(Duration::from_secs(3600))
                    .on_new_best_location(move |reading| {
                        r.lock().push(reading.horizontal_accuracy);
                        Decision::Continue
                    })
                    .on_finish(move |status, _| f.lock().push(status));

                let mut queue = RequestQueue::default();
                queue.insert(ActiveRequest::new(request, &defaults(), t0));

                for (i, accuracy) in accuracies.iter().enumerate() {
                    let now = t0 + Duration::from_millis(i as u64);
                    deliver_all(queue.on_readings(&[reading(*accuracy, now)], now));
                }

                let finishes = finishes.lock().clone();
                let reported = reported.lock().clone();
                prop_assert!(finishes.len() <= 1);
                prop_assert!(reported.iter().all(|a| *a <= min));

                match accuracies.iter().position(|a| *a <= desired) {
                    Some(_) => {
                        prop_assert_eq!(finishes, vec![FinishStatus::ReachedAccuracy]);
                        prop_assert!(queue.is_empty());
                        prop_assert!(reported.last().map_or(false, |a| *a <= desired));
                    }
                    None => {
                        prop_assert!(finishes.is_empty());
                        prop_assert_eq!(queue.len(), 1);
                    }
                }
            }
        }
    }
}
