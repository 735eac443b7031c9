//! The location request coordinator.
//!
//! A [`LocationCenter`] multiplexes any number of [`LocationRequest`]s onto the
//! single location stream of a [`LocationProvider`]. The stream runs exactly
//! while at least one request is active.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         LocationCenter                           │
//! │                                                                  │
//! │  process_request ──► ┌──────────────┐                            │
//! │                      │ Auth / Cancel│──► refused ──► finish now  │
//! │                      └──────┬───────┘                            │
//! │                             ▼                                    │
//! │                      ┌──────────────┐     start/stop + hint      │
//! │                      │ RequestQueue │◄──────────────► Provider   │
//! │                      └──────┬───────┘                   │        │
//! │                             ▲                           │ events │
//! │                             │                           ▼        │
//! │                      ┌──────┴───────┐◄──── mpsc ◄───────┘        │
//! │                      │ Driver task  │◄──── Notify (submit/cancel)│
//! │                      └──────────────┘◄──── next deadline timer   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The driver takes the active requests out of the shared state before
//! evaluating them, so callbacks run without any lock held and may submit
//! or cancel requests themselves.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use locus::{LocationCenter, LocationRequest, SimulatedProvider};
//!
//! let provider = Arc::new(SimulatedProvider::new());
//! let center = LocationCenter::new(provider.clone());
//!
//! let handle = center.process_request(LocationRequest::new().with_desired_accuracy(10.0));
//! provider.deliver(reading);
//! assert_eq!(handle.finished().await, FinishStatus::ReachedAccuracy);
//! ```

mod queue;

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Instant;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::address::AddressComponents;
use crate::config::CenterConfig;
use crate::location::{now, AuthorizationStatus, Coordinate};
use crate::provider::{EventSender, GeocodeError, Geocoder, LocationProvider, ProviderEvent};
use crate::request::{FinishStatus, LocationRequest, RequestHandle};

use queue::{ActiveRequest, Completion, RequestQueue, Termination};

static SHARED: OnceLock<LocationCenter> = OnceLock::new();

/// Errors from the process-wide center registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CenterError {
    /// No center has been installed yet.
    #[error("No shared location center installed")]
    NotInstalled,

    /// A center was already installed.
    #[error("A shared location center is already installed")]
    AlreadyInstalled,
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`LocationCenter`].
pub struct LocationCenterBuilder {
    provider: Arc<dyn LocationProvider>,
    geocoder: Option<Arc<dyn Geocoder>>,
    config: CenterConfig,
}

impl LocationCenterBuilder {
    /// Set the configuration.
    pub fn with_config(mut self, config: CenterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the reverse geocoder used by [`LocationCenter::address_dict_for_location`].
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Build the center and spawn its driver task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> LocationCenter {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(CenterInner {
            provider: self.provider,
            geocoder: self.geocoder,
            config: self.config,
            state: Mutex::new(CenterState::default()),
            wake: Arc::new(Notify::new()),
            shutdown: CancellationToken::new(),
            events_tx,
            driver: Mutex::new(None),
        });

        let driver = tokio::spawn(drive(
            Arc::downgrade(&inner),
            events_rx,
            Arc::clone(&inner.wake),
            inner.shutdown.clone(),
        ));
        *inner.driver.lock() = Some(driver);

        info!(
            accuracy_hint = inner.config.accuracy_hint,
            geocoder = inner.geocoder.is_some(),
            "Location center started"
        );
        LocationCenter { inner }
    }
}

impl fmt::Debug for LocationCenterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationCenterBuilder")
            .field("geocoder", &self.geocoder.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// LocationCenter
// =============================================================================

/// Coordinator for location requests sharing one provider stream.
///
/// Cheap to clone; clones share the same state. When the last clone is
/// dropped the stream is stopped and remaining requests finish with
/// `Canceled`.
///
/// An active request owns its callbacks, so a callback that captures a
/// `LocationCenter` keeps the center alive until that request finishes.
/// Callbacks that submit follow-up requests should capture a
/// [`WeakLocationCenter`] from [`LocationCenter::downgrade`] instead.
#[derive(Clone)]
pub struct LocationCenter {
    inner: Arc<CenterInner>,
}

/// Non-owning reference to a [`LocationCenter`].
#[derive(Clone, Debug)]
pub struct WeakLocationCenter {
    inner: Weak<CenterInner>,
}

impl WeakLocationCenter {
    /// The center, if it is still alive.
    pub fn upgrade(&self) -> Option<LocationCenter> {
        self.inner.upgrade().map(|inner| LocationCenter { inner })
    }
}

impl LocationCenter {
    /// Start a center with default configuration and no geocoder.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self::builder(provider).start()
    }

    /// Builder for a center driving `provider`.
    pub fn builder(provider: Arc<dyn LocationProvider>) -> LocationCenterBuilder {
        LocationCenterBuilder {
            provider,
            geocoder: None,
            config: CenterConfig::default(),
        }
    }

    /// A reference that does not keep the center alive.
    pub fn downgrade(&self) -> WeakLocationCenter {
        WeakLocationCenter {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Make `center` the process-wide instance returned by [`LocationCenter::shared`].
    pub fn install_shared(center: LocationCenter) -> Result<(), CenterError> {
        SHARED.set(center).map_err(|_| CenterError::AlreadyInstalled)
    }

    /// The process-wide instance, if one was installed.
    pub fn shared() -> Result<LocationCenter, CenterError> {
        SHARED.get().cloned().ok_or(CenterError::NotInstalled)
    }

    /// The process-wide instance, created with `init` on first access.
    pub fn shared_or_init(init: impl FnOnce() -> LocationCenter) -> LocationCenter {
        SHARED.get_or_init(init).clone()
    }

    /// Submit a request.
    ///
    /// The request starts its timeout now and the provider stream is started
    /// if it is not already running. If the request was cancelled before
    /// submission, or location access is refused, it finishes before this
    /// returns.
    pub fn process_request(&self, request: LocationRequest) -> RequestHandle {
        let handle = request.handle();
        self.inner.submit(request);
        handle
    }

    /// Reverse geocode a reading or coordinate into address components.
    ///
    /// Resolves to the best candidate. No candidates is
    /// [`GeocodeError::NoResult`].
    pub async fn address_dict_for_location(
        &self,
        location: impl Into<Coordinate>,
    ) -> Result<AddressComponents, GeocodeError> {
        let coordinate = location.into();
        if !coordinate.is_valid() {
            return Err(GeocodeError::InvalidCoordinate(coordinate));
        }
        let geocoder = self
            .inner
            .geocoder
            .as_ref()
            .ok_or(GeocodeError::NotConfigured)?;

        let candidates = geocoder.reverse_geocode(coordinate).await?;
        debug!(
            coordinate = %coordinate,
            candidates = candidates.len(),
            "Reverse geocode completed"
        );
        candidates
            .into_iter()
            .next()
            .ok_or(GeocodeError::NoResult(coordinate))
    }

    /// Format address components into one localized string.
    pub fn full_address_from_dictionary(address: &AddressComponents) -> String {
        crate::address::full_address_from_dictionary(address)
    }

    /// Number of requests that have not finished.
    pub fn active_requests(&self) -> usize {
        let state = self.inner.state.lock();
        state.queue.len() + state.in_flight
    }

    /// Whether the provider stream is running.
    pub fn is_updating(&self) -> bool {
        self.inner.state.lock().updating
    }

    /// Stop the driver, stop the stream, and finish every active request
    /// with `Canceled`. Requests submitted afterwards finish immediately with
    /// `Canceled`.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let driver = self.inner.driver.lock().take();
        if let Some(driver) = driver {
            if let Err(e) = driver.await {
                warn!(error = %e, "Location driver task failed");
            }
        }

        let completions = {
            let mut state = self.inner.state.lock();
            let completions = state.queue.finish_all(FinishStatus::Canceled, None);
            self.inner.stop_stream(&mut state);
            completions
        };
        deliver(completions);
        info!("Location center shut down");
    }
}

impl fmt::Debug for LocationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationCenter")
            .field("active_requests", &self.active_requests())
            .field("updating", &self.is_updating())
            .finish()
    }
}

// =============================================================================
// Shared state
// =============================================================================

#[derive(Debug, Default)]
struct CenterState {
    queue: RequestQueue,
    /// Requests taken out of `queue` by the driver for evaluation.
    in_flight: usize,
    updating: bool,
    /// Last accuracy hint passed to the provider.
    hinted: Option<f64>,
}

struct CenterInner {
    provider: Arc<dyn LocationProvider>,
    geocoder: Option<Arc<dyn Geocoder>>,
    config: CenterConfig,
    state: Mutex<CenterState>,
    wake: Arc<Notify>,
    shutdown: CancellationToken,
    events_tx: EventSender,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl CenterInner {
    fn submit(&self, request: LocationRequest) {
        request.handle.attach(Arc::clone(&self.wake));
        let active = ActiveRequest::new(request, &self.config.defaults, now());
        let request_id = active.id().get();

        if self.shutdown.is_cancelled() || request_is_cancelled(&active) {
            debug!(request_id, "Request cancelled before submission");
            active.finish(Termination::new(FinishStatus::Canceled));
            return;
        }

        let authorization = self.provider.authorization_status();
        if authorization.is_refused() {
            info!(request_id, authorization = %authorization, "Location access refused");
            active.finish(Termination::new(FinishStatus::NotProperlyAuthorized));
            return;
        }

        let completions = {
            let mut state = self.state.lock();
            state.queue.insert(active);
            debug!(
                request_id,
                active = state.queue.len() + state.in_flight,
                "Request submitted"
            );
            self.sync_stream(&mut state)
        };

        if completions.is_empty() && authorization == AuthorizationStatus::NotDetermined {
            debug!(request_id, "Requesting location authorization");
            self.provider.request_authorization();
        }
        deliver(completions);
        self.wake.notify_one();
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.state.lock().queue.next_deadline()
    }

    fn handle_event(&self, event: ProviderEvent) {
        let now = now();
        let mut batch = self.take_queue();
        let completions = match &event {
            ProviderEvent::Readings(readings) => {
                trace!(count = readings.len(), active = batch.len(), "Readings received");
                batch.on_readings(readings, now)
            }
            ProviderEvent::AuthorizationChanged(status) => {
                info!(authorization = %status, "Authorization changed");
                batch.on_authorization(*status, now)
            }
            ProviderEvent::Failed(error) => {
                warn!(error = %error, active = batch.len(), "Location provider failed");
                batch.on_error(error, now)
            }
        };
        self.settle(batch, completions);
    }

    fn sweep(&self) {
        let mut batch = self.take_queue();
        let completions = batch.sweep(now());
        self.settle(batch, completions);
    }

    fn take_queue(&self) -> RequestQueue {
        let mut state = self.state.lock();
        let batch = std::mem::take(&mut state.queue);
        state.in_flight = batch.len();
        batch
    }

    /// Put evaluated requests back, resync the stream, then run finish
    /// callbacks with the lock released.
    fn settle(&self, batch: RequestQueue, mut completions: Vec<Completion>) {
        {
            let mut state = self.state.lock();
            state.in_flight = 0;
            state.queue.absorb(batch);
            completions.extend(self.sync_stream(&mut state));
        }
        deliver(completions);
    }

    /// Bring the stream in line with the active set.
    ///
    /// Returns the requests failed by a provider start error.
    fn sync_stream(&self, state: &mut CenterState) -> Vec<Completion> {
        if state.queue.is_empty() {
            self.stop_stream(state);
            return Vec::new();
        }

        if self.config.accuracy_hint {
            if let Some(meters) = state.queue.finest_desired_accuracy() {
                if state.hinted != Some(meters) {
                    debug!(meters, "Updating provider accuracy hint");
                    self.provider.set_desired_accuracy(meters);
                    state.hinted = Some(meters);
                }
            }
        }

        if state.updating {
            return Vec::new();
        }
        match self.provider.start_updates(self.events_tx.clone()) {
            Ok(()) => {
                state.updating = true;
                info!(active = state.queue.len(), "Location updates started");
                Vec::new()
            }
            Err(error) => {
                warn!(error = %error, "Failed to start location updates");
                state.hinted = None;
                state
                    .queue
                    .finish_all(FinishStatus::Error, Some(error))
            }
        }
    }

    fn stop_stream(&self, state: &mut CenterState) {
        if state.updating {
            self.provider.stop_updates();
            state.updating = false;
            info!("Location updates stopped");
        }
        state.hinted = None;
    }
}

impl Drop for CenterInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
        let state = self.state.get_mut();
        let completions = state.queue.finish_all(FinishStatus::Canceled, None);
        if state.updating {
            self.provider.stop_updates();
            state.updating = false;
        }
        deliver(completions);
        debug!("Location center dropped");
    }
}

fn request_is_cancelled(active: &ActiveRequest) -> bool {
    matches!(
        active.check_lifecycle(now()),
        Some(Termination {
            status: FinishStatus::Canceled,
            ..
        })
    )
}

fn deliver(completions: Vec<Completion>) {
    for completion in completions {
        completion.deliver();
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Evaluate provider events, cancellations and deadlines until shutdown.
///
/// Holds the center weakly so that dropping the last [`LocationCenter`]
/// tears everything down.
async fn drive(
    center: Weak<CenterInner>,
    mut events: mpsc::UnboundedReceiver<ProviderEvent>,
    wake: Arc<Notify>,
    shutdown: CancellationToken,
) {
    debug!("Location driver started");

    loop {
        let deadline = match center.upgrade() {
            Some(inner) => inner.next_deadline(),
            None => break,
        };

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            event = events.recv() => {
                let Some(event) = event else { break };
                match center.upgrade() {
                    Some(inner) => inner.handle_event(event),
                    None => break,
                }
            }

            // Submission or cancellation
            _ = wake.notified() => {
                match center.upgrade() {
                    Some(inner) => inner.sweep(),
                    None => break,
                }
            }

            _ = sleep_until(deadline) => {
                match center.upgrade() {
                    Some(inner) => inner.sweep(),
                    None => break,
                }
            }
        }
    }

    debug!("Location driver stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
