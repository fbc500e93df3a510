use std::sync::Mutex;

use tracing::error;

/// Receives one line per failed token request.
pub trait ErrorReporter: Send + Sync {
    fn error(&self, message: &str);
}

/// Drops every report. Default when no reporter is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn error(&self, _message: &str) {}
}

/// Forwards reports to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn error(&self, message: &str) {
        error!("{}", message);
    }
}

/// Keeps reports in memory, mostly useful in tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl ErrorReporter for RecordingReporter {
    fn error(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_owned());
        }
    }
}
