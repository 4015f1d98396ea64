// ABOUTME: Telemetry sink boundary for lifecycle and operation events
// ABOUTME: Fire-and-forget emission; sinks must never block or fail the caller

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A single emitted event: name, numeric measurements, string metadata.
#[derive(Debug, Clone)]
pub struct TelemetryEvent {
    pub name: String,
    pub measurements: HashMap<String, f64>,
    pub metadata: HashMap<String, String>,
    pub at: DateTime<Utc>,
}

impl TelemetryEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            measurements: HashMap::new(),
            metadata: HashMap::new(),
            at: Utc::now(),
        }
    }

    pub fn measurement(mut self, key: impl Into<String>, value: f64) -> Self {
        self.measurements.insert(key.into(), value);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Destination for events. Emission is fire-and-forget: implementations
/// must return immediately and swallow their own failures.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: TelemetryEvent);
}

/// Cloneable handle to a sink
#[derive(Clone)]
pub struct SinkHandle {
    sink: Arc<dyn TelemetrySink>,
}

impl SinkHandle {
    pub fn new<S: TelemetrySink + 'static>(sink: S) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    pub fn emit(&self, event: TelemetryEvent) {
        self.sink.emit(event);
    }
}

impl std::fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkHandle").finish()
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn emit(&self, _event: TelemetryEvent) {}
}

/// Logs events through tracing at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn emit(&self, event: TelemetryEvent) {
        tracing::debug!(
            event = %event.name,
            measurements = ?event.measurements,
            metadata = ?event.metadata,
            "telemetry"
        );
    }
}

/// Forwards events onto a bounded channel. Overflow drops the event
/// rather than blocking the emitting operation.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<TelemetryEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TelemetryEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelSink {
    fn emit(&self, event: TelemetryEvent) {
        if self.tx.try_send(event).is_err() {
            tracing::debug!("telemetry channel full or closed, dropping event");
        }
    }
}
