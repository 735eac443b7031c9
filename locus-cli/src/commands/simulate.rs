//! `locus simulate`
//!
//! Replays a JSON-lines script through a [`SimulatedProvider`] against a single
//! request and prints every reported reading and the finish status.
//!
//! Script lines, one JSON object each (`at_ms` is measured from submission):
//!
//! ```text
//! {"at_ms": 1000, "event": "reading", "lat": 53.55, "lon": 9.99, "accuracy": 50}
//! {"at_ms": 1500, "event": "reading", "lat": 53.55, "lon": 9.99, "accuracy": 8, "age_ms": 200}
//! {"at_ms": 2000, "event": "authorization", "status": "denied"}
//! {"at_ms": 2500, "event": "error", "kind": "network", "message": "offline"}
//! {"at_ms": 3000, "event": "cancel"}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use locus::config::ConfigFile;
use locus::{
    AuthorizationStatus, Coordinate, Decision, FinishStatus, LocationCenter, LocationError,
    LocationRequest, Reading, RequestDefaults, SimulatedProvider,
};

use super::read_input;
use crate::error::CliError;

/// Arguments for `simulate`.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Script file (stdin when omitted or `-`)
    script: Option<PathBuf>,

    /// Accuracy in metres that finishes the request
    #[arg(long)]
    desired_accuracy: Option<f64>,

    /// Coarsest accuracy in metres that is still reported
    #[arg(long)]
    min_accuracy: Option<f64>,

    /// Seconds before the request gives up
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Maximum age in seconds of a reported reading
    #[arg(long)]
    time_relevance_secs: Option<u64>,

    /// Authorization state at startup
    #[arg(long, default_value = "when_in_use")]
    authorization: AuthorizationStatus,

    /// Answer given when the user is prompted for authorization
    #[arg(long, default_value = "when_in_use")]
    prompt_answer: AuthorizationStatus,

    /// Print JSON lines instead of text
    #[arg(long)]
    json: bool,
}

// =============================================================================
// Script
// =============================================================================

/// One timed script entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptLine {
    /// Milliseconds after submission.
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: ScriptEvent,
}

/// What happens at a script entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// The provider delivers a reading.
    Reading {
        lat: f64,
        lon: f64,
        accuracy: f64,
        /// How old the fix already is when delivered.
        #[serde(default)]
        age_ms: u64,
    },
    /// The authorization state changes.
    Authorization { status: String },
    /// The provider reports a failure.
    Error {
        kind: ErrorKind,
        #[serde(default)]
        message: String,
    },
    /// The caller cancels the request.
    Cancel,
}

/// Scripted provider failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unknown,
    Denied,
    Network,
    Unavailable,
    Other,
}

impl ErrorKind {
    fn into_error(self, message: String) -> LocationError {
        match self {
            ErrorKind::Unknown => LocationError::LocationUnknown,
            ErrorKind::Denied => LocationError::Denied,
            ErrorKind::Network => LocationError::Network(message),
            ErrorKind::Unavailable => LocationError::ProviderUnavailable(message),
            ErrorKind::Other => LocationError::Other(message),
        }
    }
}

/// Parse a script, validating authorization names up front.
pub fn parse_script(input: &str) -> Result<Vec<ScriptLine>, CliError> {
    let mut lines = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let script_error = |message: String| CliError::Script {
            line: index + 1,
            message,
        };
        let line: ScriptLine = serde_json::from_str(raw).map_err(|e| script_error(e.to_string()))?;
        if let ScriptEvent::Authorization { status } = &line.event {
            status
                .parse::<AuthorizationStatus>()
                .map_err(|e| script_error(e.to_string()))?;
        }
        lines.push(line);
    }
    Ok(lines)
}

// =============================================================================
// Replay
// =============================================================================

/// Options for one replay.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub defaults: RequestDefaults,
    pub desired_accuracy: Option<f64>,
    pub min_accuracy: Option<f64>,
    pub timeout: Option<Duration>,
    pub time_relevance: Option<Duration>,
    pub authorization: AuthorizationStatus,
    pub prompt_answer: AuthorizationStatus,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            defaults: RequestDefaults::default(),
            desired_accuracy: None,
            min_accuracy: None,
            timeout: None,
            time_relevance: None,
            authorization: AuthorizationStatus::AuthorizedWhenInUse,
            prompt_answer: AuthorizationStatus::AuthorizedWhenInUse,
        }
    }
}

/// Something the request reported during a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// The new-best-location callback fired.
    Reading {
        at_ms: u64,
        lat: f64,
        lon: f64,
        accuracy: f64,
    },
    /// The finish callback fired.
    Finished {
        at_ms: u64,
        status: &'static str,
        error: Option<String>,
    },
}

enum Update {
    Reading(Reading, Duration),
    Finished(FinishStatus, Option<LocationError>, Duration),
}

/// Replay `script` against one request and collect what it reported.
pub async fn replay(
    script: &[ScriptLine],
    options: &ReplayOptions,
) -> (FinishStatus, Vec<ReplayEvent>) {
    let provider = Arc::new(
        SimulatedProvider::with_authorization(options.authorization)
            .answer_prompt_with(options.prompt_answer),
    );
    let config = locus::CenterConfig::default().with_defaults(options.defaults.clone());
    let center = LocationCenter::builder(provider.clone())
        .with_config(config)
        .start();

    let started = Instant::now();
    let (updates_tx, mut updates_rx) = mpsc::unbounded_channel();
    let request = build_request(options, started, updates_tx);
    let handle = center.process_request(request);
    info!(request_id = %handle.id(), lines = script.len(), "Replaying script");

    for line in script {
        if handle.is_finished() {
            debug!(at_ms = line.at_ms, "Request finished, skipping remaining script");
            break;
        }
        tokio::time::sleep_until(started + Duration::from_millis(line.at_ms)).await;
        apply(&line.event, &provider, &handle);
    }

    let status = handle.finished().await;
    center.shutdown().await;

    let mut events = Vec::new();
    while let Ok(update) = updates_rx.try_recv() {
        events.push(match update {
            Update::Reading(reading, at) => ReplayEvent::Reading {
                at_ms: at.as_millis() as u64,
                lat: reading.coordinate.latitude,
                lon: reading.coordinate.longitude,
                accuracy: reading.horizontal_accuracy,
            },
            Update::Finished(status, error, at) => ReplayEvent::Finished {
                at_ms: at.as_millis() as u64,
                status: status.as_str(),
                error: error.map(|e| e.to_string()),
            },
        });
    }
    (status, events)
}

fn build_request(
    options: &ReplayOptions,
    started: Instant,
    updates: mpsc::UnboundedSender<Update>,
) -> LocationRequest {
    let mut request = LocationRequest::new();
    if let Some(meters) = options.desired_accuracy {
        request = request.with_desired_accuracy(meters);
    }
    if let Some(meters) = options.min_accuracy {
        request = request.with_min_accuracy(meters);
    }
    if let Some(timeout) = options.timeout {
        request = request.with_timeout(timeout);
    }
    if let Some(time_relevance) = options.time_relevance {
        request = request.with_time_relevance(time_relevance);
    }

    let best = updates.clone();
    request
        .on_new_best_location(move |reading| {
            let _ = best.send(Update::Reading(*reading, started.elapsed()));
            Decision::Continue
        })
        .on_finish(move |status, error| {
            let _ = updates.send(Update::Finished(status, error, started.elapsed()));
        })
}

fn apply(event: &ScriptEvent, provider: &SimulatedProvider, handle: &locus::RequestHandle) {
    match event {
        ScriptEvent::Reading {
            lat,
            lon,
            accuracy,
            age_ms,
        } => {
            let now = Instant::now().into_std();
            let taken = now
                .checked_sub(Duration::from_millis(*age_ms))
                .unwrap_or(now);
            let reading = Reading::with_timestamp(Coordinate::new(*lat, *lon), *accuracy, taken);
            provider.deliver(reading);
        }
        ScriptEvent::Authorization { status } => {
            // Names were validated when the script was parsed.
            if let Ok(status) = status.parse() {
                provider.set_authorization(status);
            }
        }
        ScriptEvent::Error { kind, message } => {
            provider.fail(kind.into_error(message.clone()));
        }
        ScriptEvent::Cancel => handle.cancel(),
    }
}

// =============================================================================
// Command
// =============================================================================

/// Run the simulate command.
pub fn run(args: SimulateArgs, config: &ConfigFile) -> Result<(), CliError> {
    let script = parse_script(&read_input(args.script.as_deref())?)?;
    let options = ReplayOptions {
        defaults: config.request.clone(),
        desired_accuracy: args.desired_accuracy,
        min_accuracy: args.min_accuracy,
        timeout: args.timeout_secs.map(Duration::from_secs),
        time_relevance: args.time_relevance_secs.map(Duration::from_secs),
        authorization: args.authorization,
        prompt_answer: args.prompt_answer,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let (status, events) = runtime.block_on(replay(&script, &options));

    for event in &events {
        if args.json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("{}", describe(event));
        }
    }
    debug!(status = %status, "Simulation complete");
    Ok(())
}

fn describe(event: &ReplayEvent) -> String {
    match event {
        ReplayEvent::Reading {
            at_ms,
            lat,
            lon,
            accuracy,
        } => format!(
            "[{:>7} ms] reading {} ±{:.0}m",
            at_ms,
            Coordinate::new(*lat, *lon),
            accuracy
        ),
        ReplayEvent::Finished {
            at_ms,
            status,
            error: Some(error),
        } => format!("[{:>7} ms] finished: {} ({})", at_ms, status, error),
        ReplayEvent::Finished {
            at_ms,
            status,
            error: None,
        } => format!("[{:>7} ms] finished: {}", at_ms, status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ReplayOptions {
        ReplayOptions {
            desired_accuracy: Some(10.0),
            min_accuracy: Some(100.0),
            timeout: Some(Duration::from_secs(30)),
            ..ReplayOptions::default()
        }
    }

    #[test]
    fn test_parse_script() {
        let script = parse_script(
            r#"
            # warm-up
            {"at_ms": 1000, "event": "reading", "lat": 53.55, "lon": 9.99, "accuracy": 50}
            {"event": "error", "kind": "network", "message": "offline"}
            {"at_ms": 3000, "event": "cancel"}
            "#,
        )
        .unwrap();

        assert_eq!(script.len(), 3);
        assert_eq!(
            script[0].event,
            ScriptEvent::Reading {
                lat: 53.55,
                lon: 9.99,
                accuracy: 50.0,
                age_ms: 0
            }
        );
        assert_eq!(script[1].at_ms, 0);
        assert_eq!(script[2].event, ScriptEvent::Cancel);
    }

    #[test]
    fn test_parse_script_reports_line_numbers() {
        let err = parse_script("{\"event\": \"cancel\"}\n{\"event\": \"teleport\"}").unwrap_err();
        assert!(matches!(err, CliError::Script { line: 2, .. }));

        let err =
            parse_script(r#"{"event": "authorization", "status": "maybe"}"#).unwrap_err();
        assert!(matches!(err, CliError::Script { line: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_reaches_accuracy() {
        let script = parse_script(
            r#"{"at_ms": 1000, "event": "reading", "lat": 53.55, "lon": 9.99, "accuracy": 50}
               {"at_ms": 2000, "event": "reading", "lat": 53.55, "lon": 9.99, "accuracy": 8}
               {"at_ms": 3000, "event": "reading", "lat": 53.55, "lon": 9.99, "accuracy": 2}"#,
        )
        .unwrap();

        let (status, events) = replay(&script, &options()).await;
        assert_eq!(status, FinishStatus::ReachedAccuracy);
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            ReplayEvent::Reading { accuracy, .. } if accuracy == 50.0
        ));
        assert!(matches!(
            &events[2],
            ReplayEvent::Finished { status: "Reached desired accuracy", error: None, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_times_out_after_script_ends() {
        let script = parse_script(
            r#"{"at_ms": 500, "event": "reading", "lat": 0.0, "lon": 0.0, "accuracy": 500}"#,
        )
        .unwrap();

        let (status, events) = replay(&script, &options()).await;
        assert_eq!(status, FinishStatus::TimedOut);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ReplayEvent::Finished { at_ms, .. } if at_ms >= 30_000
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_error_and_denial() {
        let script = parse_script(
            r#"{"at_ms": 100, "event": "error", "kind": "unknown"}"#,
        )
        .unwrap();
        let (status, events) = replay(&script, &options()).await;
        assert_eq!(status, FinishStatus::Error);
        assert!(matches!(
            &events[0],
            ReplayEvent::Finished { error: Some(e), .. } if e == "Location currently unknown"
        ));

        let script = parse_script(
            r#"{"at_ms": 100, "event": "authorization", "status": "denied"}"#,
        )
        .unwrap();
        let (status, _) = replay(&script, &options()).await;
        assert_eq!(status, FinishStatus::NotProperlyAuthorized);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_cancel() {
        let script = parse_script(r#"{"at_ms": 100, "event": "cancel"}"#).unwrap();
        let (status, _) = replay(&script, &options()).await;
        assert_eq!(status, FinishStatus::Canceled);
    }

    #[test]
    fn test_describe() {
        let event = ReplayEvent::Finished {
            at_ms: 2000,
            status: "Timed out",
            error: None,
        };
        assert_eq!(describe(&event), "[   2000 ms] finished: Timed out");

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"finished","at_ms":2000,"status":"Timed out","error":null}"#
        );
    }
}
