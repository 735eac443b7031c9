//! In-process location provider driven by the caller.
//!
//! Used by the test suite and by `locus simulate` to replay a scripted
//! location stream. It behaves like a platform service: events are only
//! delivered while updates are running, and an authorization prompt is
//! answered asynchronously once updates start.

use parking_lot::Mutex;

use super::{EventSender, LocationProvider, ProviderEvent};
use crate::location::{AuthorizationStatus, LocationError, Reading};

#[derive(Debug)]
struct SimulatedState {
    events: Option<EventSender>,
    authorization: AuthorizationStatus,
    /// What the user answers when prompted.
    prompt_answer: AuthorizationStatus,
    /// Answer waiting to be delivered once updates start.
    pending_answer: Option<AuthorizationStatus>,
    next_start_error: Option<LocationError>,
    desired_accuracy: Option<f64>,
    starts: usize,
    stops: usize,
    prompts: usize,
}

/// Location provider whose events are injected by the caller.
#[derive(Debug)]
pub struct SimulatedProvider {
    state: Mutex<SimulatedState>,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProvider {
    /// Provider that is already authorized while in use.
    pub fn new() -> Self {
        Self::with_authorization(AuthorizationStatus::AuthorizedWhenInUse)
    }

    /// Provider starting in the given authorization state.
    pub fn with_authorization(authorization: AuthorizationStatus) -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                events: None,
                authorization,
                prompt_answer: AuthorizationStatus::AuthorizedWhenInUse,
                pending_answer: None,
                next_start_error: None,
                desired_accuracy: None,
                starts: 0,
                stops: 0,
                prompts: 0,
            }),
        }
    }

    /// Set what the simulated user answers to an authorization prompt.
    pub fn answer_prompt_with(self, answer: AuthorizationStatus) -> Self {
        self.state.lock().prompt_answer = answer;
        self
    }

    /// Make the next `start_updates` call fail with `error`.
    pub fn fail_next_start(&self, error: LocationError) {
        self.state.lock().next_start_error = Some(error);
    }

    /// Whether updates are currently running.
    pub fn is_updating(&self) -> bool {
        self.state.lock().events.is_some()
    }

    /// Number of successful `start_updates` calls.
    pub fn start_count(&self) -> usize {
        self.state.lock().starts
    }

    /// Number of `stop_updates` calls that stopped a running stream.
    pub fn stop_count(&self) -> usize {
        self.state.lock().stops
    }

    /// Number of authorization prompts shown.
    pub fn prompt_count(&self) -> usize {
        self.state.lock().prompts
    }

    /// Last accuracy hint received.
    pub fn desired_accuracy(&self) -> Option<f64> {
        self.state.lock().desired_accuracy
    }

    /// Deliver a single reading. Returns false if updates are not running.
    pub fn deliver(&self, reading: Reading) -> bool {
        self.emit(ProviderEvent::Readings(vec![reading]))
    }

    /// Deliver a batch of readings, oldest first.
    pub fn deliver_batch(&self, readings: Vec<Reading>) -> bool {
        self.emit(ProviderEvent::Readings(readings))
    }

    /// Report a positioning failure.
    pub fn fail(&self, error: LocationError) -> bool {
        self.emit(ProviderEvent::Failed(error))
    }

    /// Change the authorization state, notifying the stream if it is running.
    pub fn set_authorization(&self, status: AuthorizationStatus) -> bool {
        let mut state = self.state.lock();
        state.authorization = status;
        match &state.events {
            Some(events) => events
                .send(ProviderEvent::AuthorizationChanged(status))
                .is_ok(),
            None => false,
        }
    }

    fn emit(&self, event: ProviderEvent) -> bool {
        let state = self.state.lock();
        match &state.events {
            Some(events) => events.send(event).is_ok(),
            None => false,
        }
    }
}

impl LocationProvider for SimulatedProvider {
    fn start_updates(&self, events: EventSender) -> Result<(), LocationError> {
        let mut state = self.state.lock();
        if let Some(error) = state.next_start_error.take() {
            return Err(error);
        }
        if let Some(answer) = state.pending_answer.take() {
            state.authorization = answer;
            // Receiver gone means nobody is listening; nothing to report.
            let _ = events.send(ProviderEvent::AuthorizationChanged(answer));
        }
        state.events = Some(events);
        state.starts += 1;
        Ok(())
    }

    fn stop_updates(&self) {
        let mut state = self.state.lock();
        if state.events.take().is_some() {
            state.stops += 1;
        }
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        self.state.lock().authorization
    }

    fn request_authorization(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.prompts += 1;
        if state.authorization == AuthorizationStatus::NotDetermined {
            let answer = state.prompt_answer;
            match &state.events {
                Some(events) => {
                    state.authorization = answer;
                    let _ = events.send(ProviderEvent::AuthorizationChanged(answer));
                }
                None => state.pending_answer = Some(answer),
            }
        }
    }

    fn set_desired_accuracy(&self, meters: f64) {
        self.state.lock().desired_accuracy = Some(meters);
    }
}
