//! Progress notifications
//!
//! The scraper reports its lifecycle to an external sink as an ordered stream
//! of events. Delivery is best-effort: a failing sink never affects a fetch.

use serde::Serialize;
use std::sync::Mutex;

/// Error type a sink may return; it is always discarded by [`notify`]
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Lifecycle event emitted while scraping a URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Processing of a caller URL began
    Start { url: String },

    /// A GET attempt is about to be sent
    FetchAttempt { url: String, attempt: u32 },

    /// A response was received and decoded
    Fetched { url: String, status: u16 },

    /// An attempt failed and another will follow after `wait_secs`
    FetchRetry {
        url: String,
        attempt: u32,
        wait_secs: f64,
        error: String,
    },

    /// The last attempt failed
    FetchFailed {
        url: String,
        attempt: u32,
        error: String,
    },

    /// The URL's processing gave up because the fetch failed
    FetchFailedFinal { url: String, error: String },

    /// The body was recognized as JSON
    FoundJson { url: String },

    /// Processing of a caller URL finished successfully
    Done { url: String },
}

impl ProgressEvent {
    /// Returns the event's type tag as it appears in serialized form
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::FetchAttempt { .. } => "fetch_attempt",
            Self::Fetched { .. } => "fetched",
            Self::FetchRetry { .. } => "fetch_retry",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::FetchFailedFinal { .. } => "fetch_failed_final",
            Self::FoundJson { .. } => "found_json",
            Self::Done { .. } => "done",
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    /// Handles one event; errors are swallowed by the caller
    fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError>;
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) -> Result<(), SinkError> + Send + Sync,
{
    fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError> {
        self(event)
    }
}

/// Delivers an event to a sink, discarding any sink failure
pub fn notify(sink: &dyn ProgressSink, event: ProgressEvent) {
    if let Err(e) = sink.emit(&event) {
        tracing::debug!("Progress sink rejected {} event: {}", event.kind(), e);
    }
}

/// Sink that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: &ProgressEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Sink that writes events to the tracing subscriber as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError> {
        let rendered = serde_json::to_string(event)?;
        tracing::debug!(target: "sumi_scrape::progress", "{}", rendered);
        Ok(())
    }
}

/// Sink that keeps every event in memory, in arrival order
#[derive(Debug, Default)]
pub struct ProgressRecorder {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressRecorder {
    /// Creates an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the type tags of all recorded events
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(ProgressEvent::kind).collect()
    }

    /// Counts recorded events with the given type tag
    pub fn count(&self, kind: &str) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

impl ProgressSink for ProgressRecorder {
    fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
        Ok(())
    }
}
