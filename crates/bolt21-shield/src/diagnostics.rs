//! Security diagnostics
//!
//! Screenshot observations go to the in-process `tracing` target
//! [`SECURITY_TARGET`] only. Nothing is printed to stdout or written to a
//! shared system log that other apps could read.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::warn;

/// Tracing target for security events
pub const SECURITY_TARGET: &str = "bolt21::security";

/// A screenshot was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenshotEvent {
    /// When the notification was handled
    pub at: DateTime<Utc>,
}

impl ScreenshotEvent {
    /// Event stamped with the current time
    pub fn now() -> Self {
        Self { at: Utc::now() }
    }
}

/// Sink for security-relevant observations
pub trait SecurityDiagnostics: Send + Sync {
    /// Record a screenshot
    fn screenshot_detected(&self, event: &ScreenshotEvent);
}

/// Emits security events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl SecurityDiagnostics for TracingDiagnostics {
    fn screenshot_detected(&self, event: &ScreenshotEvent) {
        warn!(
            target: SECURITY_TARGET,
            event = "screenshot_detected",
            at = %event.at.to_rfc3339(),
            "Screenshot detected - sensitive data may have been captured"
        );
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<ScreenshotEvent>>,
}

impl RecordingDiagnostics {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> Vec<ScreenshotEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events
    pub fn count(&self) -> usize {
        self.events.lock().len()
    }
}

impl SecurityDiagnostics for RecordingDiagnostics {
    fn screenshot_detected(&self, event: &ScreenshotEvent) {
        self.events.lock().push(*event);
    }
}
